//! Memory-first enrichment of single products and whole CSV catalogs.

use std::io;

use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::error::MemoryError;
use crate::error::Result;
use crate::generator::SynonymGenerator;
use crate::memory::LookupResult;
use crate::memory::MemoryEngine;

pub const SYNONYMS_COLUMN: &str = "Sinónimos";
pub const KEYWORDS_COLUMN: &str = "Palabras Clave";
const CELL_JOINER: &str = ", ";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum SynonymOrigin {
    Exact,
    Similar {
        similarity: f64,
        matched_alias: String,
        matched_description: String,
    },
    Generated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedProduct {
    pub alias: String,
    pub description: String,
    pub synonyms: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub origin: SynonymOrigin,
}

/// Answers from memory when possible; otherwise generates and commits the
/// result so the next occurrence of the product is an exact hit.
pub fn enrich_product(
    engine: &mut MemoryEngine,
    generator: &dyn SynonymGenerator,
    alias: &str,
    description: &str,
) -> EnrichedProduct {
    let (synonyms, keywords, origin) = match engine.lookup(alias, description) {
        LookupResult::Exact {
            synonyms, keywords, ..
        } => (synonyms, keywords, SynonymOrigin::Exact),
        LookupResult::Similar {
            synonyms,
            keywords,
            similarity,
            matched_alias,
            matched_description,
            ..
        } => (
            synonyms,
            keywords,
            SynonymOrigin::Similar {
                similarity,
                matched_alias,
                matched_description,
            },
        ),
        LookupResult::Miss => {
            let generated = generator.generate(alias, description);
            let key = engine.commit(
                alias,
                description,
                generated.synonyms.clone(),
                generated.keywords.clone(),
            );
            debug!(key = %key, "generated synonyms for new product");
            (
                generated.synonyms,
                generated.keywords,
                SynonymOrigin::Generated,
            )
        }
    };
    EnrichedProduct {
        alias: alias.to_string(),
        description: description.to_string(),
        synonyms,
        keywords,
        origin,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogColumns {
    pub alias: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentSummary {
    pub exact: usize,
    pub similar: usize,
    pub generated: usize,
    pub skipped: usize,
}

/// Input rows with the synonym and keyword columns appended.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedCatalog {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub summary: EnrichmentSummary,
}

impl EnrichedCatalog {
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Enriches every row of a CSV catalog. Rows whose alias and description
/// are both blank pass through with empty enrichment cells. Short rows are
/// padded to the header width; a row wider than the header is an error.
pub fn enrich_catalog<R: io::Read>(
    engine: &mut MemoryEngine,
    generator: &dyn SynonymGenerator,
    reader: R,
    columns: &CatalogColumns,
) -> Result<EnrichedCatalog> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim_start_matches('\u{feff}').to_string())
        .collect();
    let position = |name: &str| {
        headers
            .iter()
            .position(|header| header.trim() == name.trim())
            .ok_or_else(|| MemoryError::MissingColumn(name.to_string()))
    };
    let alias_col = position(&columns.alias)?;
    let description_col = position(&columns.description)?;
    let width = headers.len();
    headers.push(SYNONYMS_COLUMN.to_string());
    headers.push(KEYWORDS_COLUMN.to_string());

    let mut summary = EnrichmentSummary::default();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.len() > width {
            return Err(MemoryError::RaggedRow {
                line: record.position().map_or(0, csv::Position::line),
                cells: record.len(),
                columns: width,
            });
        }
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        row.resize(width, String::new());
        let alias = row[alias_col].trim().to_string();
        let description = row[description_col].trim().to_string();
        if alias.is_empty() && description.is_empty() {
            summary.skipped += 1;
            row.extend([String::new(), String::new()]);
            rows.push(row);
            continue;
        }
        let enriched = enrich_product(engine, generator, &alias, &description);
        match enriched.origin {
            SynonymOrigin::Exact => summary.exact += 1,
            SynonymOrigin::Similar { .. } => summary.similar += 1,
            SynonymOrigin::Generated => summary.generated += 1,
        }
        row.push(enriched.synonyms.join(CELL_JOINER));
        row.push(enriched.keywords.join(CELL_JOINER));
        rows.push(row);
    }
    info!(
        exact = summary.exact,
        similar = summary.similar,
        generated = summary.generated,
        skipped = summary.skipped,
        "catalog enriched"
    );
    Ok(EnrichedCatalog {
        headers,
        rows,
        summary,
    })
}
