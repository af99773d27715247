//! Portable export/import files for the synonym memory.
//!
//! JSON is the lossless format. CSV and Excel flatten the list fields into
//! `"; "`-joined cells, one row per product.

use std::ffi::OsStr;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use rust_xlsxwriter::Workbook;
use rust_xlsxwriter::XlsxError;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use super::key::ProductKey;
use super::persistence::SNAPSHOT_VERSION;
use super::store::ProductStore;
use super::types::ProductRecord;
use crate::error::MemoryError;
use crate::error::Result;

pub const TABULAR_COLUMNS: [&str; 7] = [
    "Clave",
    "Alias",
    "Descripción",
    "Sinónimos",
    "Palabras Clave",
    "Fecha Creación",
    "Veces Usado",
];

const EXCEL_SHEET_NAME: &str = "Base de Datos Sinónimos";
const LIST_JOINER: &str = "; ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
    Excel,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }

    pub fn default_file_name(self) -> String {
        format!("risolu_synonym_database.{}", self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "excel",
        };
        f.write_str(value)
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            other => Err(format!("unsupported export format `{other}`")),
        }
    }
}

/// Layout of a file handed to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Json,
    Csv,
}

impl ImportKind {
    /// `.csv` files import as CSV, everything else as JSON. Workbooks are
    /// rejected up front since only their exported CSV/JSON can be read back.
    pub fn for_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("csv") => Ok(ImportKind::Csv),
            Some("xlsx") | Some("xls") => Err(MemoryError::ImportFormat(
                "spreadsheet imports are not supported; export the memory as json or csv"
                    .to_string(),
            )),
            _ => Ok(ImportKind::Json),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportMetadata {
    export_date: DateTime<Utc>,
    total_products: usize,
    version: &'static str,
    format: String,
}

#[derive(Serialize)]
struct ExportedProduct<'a> {
    key: &'a ProductKey,
    #[serde(flatten)]
    record: &'a ProductRecord,
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    metadata: ExportMetadata,
    products: Vec<ExportedProduct<'a>>,
}

pub fn render_export(store: &ProductStore, format: ExportFormat) -> Result<Vec<u8>> {
    match format {
        ExportFormat::Json => render_json(store),
        ExportFormat::Csv => render_csv(store),
        ExportFormat::Excel => render_excel(store).map_err(|err| MemoryError::Export {
            format,
            message: err.to_string(),
        }),
    }
}

fn render_json(store: &ProductStore) -> Result<Vec<u8>> {
    let document = ExportDocument {
        metadata: ExportMetadata {
            export_date: Utc::now(),
            total_products: store.size(),
            version: SNAPSHOT_VERSION,
            format: ExportFormat::Json.to_string(),
        },
        products: store
            .entries()
            .map(|(key, record)| ExportedProduct { key, record })
            .collect(),
    };
    Ok(serde_json::to_vec_pretty(&document)?)
}

fn tabular_row(key: &ProductKey, record: &ProductRecord) -> [String; 7] {
    [
        key.to_string(),
        record.alias.clone(),
        record.description.clone(),
        record.synonyms.join(LIST_JOINER),
        record.keywords.join(LIST_JOINER),
        record
            .created_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        record.usage_count.to_string(),
    ]
}

fn render_csv(store: &ProductStore) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(TABULAR_COLUMNS)?;
    for (key, record) in store.entries() {
        writer.write_record(tabular_row(key, record))?;
    }
    writer
        .into_inner()
        .map_err(|err| MemoryError::Io(err.into_error()))
}

fn render_excel(store: &ProductStore) -> std::result::Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(EXCEL_SHEET_NAME)?;
    for (col, title) in TABULAR_COLUMNS.iter().enumerate() {
        worksheet.write_string(0, col as u16, *title)?;
    }
    for (idx, (key, record)) in store.entries().enumerate() {
        let row = idx as u32 + 1;
        let cells = tabular_row(key, record);
        for (col, cell) in cells.iter().take(6).enumerate() {
            worksheet.write_string(row, col as u16, cell.as_str())?;
        }
        worksheet.write_number(row, 6, record.usage_count as f64)?;
    }
    workbook.save_to_buffer()
}

/// Parses an import file into the records it would apply.
///
/// A wrong top-level shape fails the whole file. Inside a valid file each
/// product missing its key, alias or description is skipped.
pub fn parse_import(bytes: &[u8], kind: ImportKind) -> Result<Vec<(ProductKey, ProductRecord)>> {
    match kind {
        ImportKind::Json => parse_json_import(bytes),
        ImportKind::Csv => parse_csv_import(bytes),
    }
}

fn parse_json_import(bytes: &[u8]) -> Result<Vec<(ProductKey, ProductRecord)>> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|err| MemoryError::ImportFormat(format!("file is not valid JSON: {err}")))?;
    let Some(products) = document.get("products").and_then(Value::as_array) else {
        return Err(MemoryError::ImportFormat(
            "expected a top-level `products` array".to_string(),
        ));
    };
    Ok(products
        .iter()
        .filter_map(Value::as_object)
        .filter_map(json_product)
        .collect())
}

fn json_product(object: &Map<String, Value>) -> Option<(ProductKey, ProductRecord)> {
    let key = object.get("key").and_then(Value::as_str)?;
    if key.is_empty() {
        return None;
    }
    let alias = text_field(object.get("alias")?)?;
    let description = text_field(object.get("description")?)?;
    let created_at = object
        .get("createdAt")
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now);
    let usage_count = object
        .get("usageCount")
        .and_then(Value::as_f64)
        .filter(|count| *count >= 1.0)
        .map_or(1, |count| count as u64);
    Some((
        ProductKey::from_raw(key),
        ProductRecord {
            alias,
            description,
            synonyms: string_list(object.get("synonyms")),
            keywords: string_list(object.get("keywords")),
            created_at,
            usage_count,
        }
        .normalised(),
    ))
}

fn text_field(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Null => Some(String::new()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|timestamp| timestamp.with_timezone(&Utc))
}

fn parse_csv_import(bytes: &[u8]) -> Result<Vec<(ProductKey, ProductRecord)>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(|err| MemoryError::ImportFormat(format!("unreadable CSV header: {err}")))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim_start_matches('\u{feff}').trim() == name)
    };
    let (Some(key_col), Some(alias_col), Some(description_col)) = (
        column(TABULAR_COLUMNS[0]),
        column(TABULAR_COLUMNS[1]),
        column(TABULAR_COLUMNS[2]),
    ) else {
        return Err(MemoryError::ImportFormat(format!(
            "CSV header must include `{}`, `{}` and `{}`",
            TABULAR_COLUMNS[0], TABULAR_COLUMNS[1], TABULAR_COLUMNS[2]
        )));
    };
    let synonyms_col = column(TABULAR_COLUMNS[3]);
    let keywords_col = column(TABULAR_COLUMNS[4]);
    let created_col = column(TABULAR_COLUMNS[5]);
    let usage_col = column(TABULAR_COLUMNS[6]);

    let mut parsed = Vec::new();
    for row in reader.records() {
        let Ok(row) = row else { continue };
        let cell = |idx: Option<usize>| idx.and_then(|idx| row.get(idx));
        let (Some(key), Some(alias), Some(description)) = (
            cell(Some(key_col)),
            cell(Some(alias_col)),
            cell(Some(description_col)),
        ) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        parsed.push((
            ProductKey::from_raw(key),
            ProductRecord {
                alias: alias.to_string(),
                description: description.to_string(),
                synonyms: split_list(cell(synonyms_col)),
                keywords: split_list(cell(keywords_col)),
                created_at: cell(created_col)
                    .and_then(parse_timestamp)
                    .unwrap_or_else(Utc::now),
                usage_count: cell(usage_col)
                    .and_then(|raw| raw.trim().parse::<u64>().ok())
                    .filter(|count| *count >= 1)
                    .unwrap_or(1),
            }
            .normalised(),
        ));
    }
    Ok(parsed)
}

fn split_list(cell: Option<&str>) -> Vec<String> {
    cell.map(|raw| {
        raw.split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
