//! Fallback synonym generation for products the memory has never seen.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use indexmap::IndexSet;
use regex_lite::Regex;
use serde::Serialize;

use crate::error::MemoryError;
use crate::error::Result;
use crate::memory::fold_accent;

const MEASUREMENT_PATTERN: &str = r"(?i)\d+(?:\.\d+)?\s*(?:mm|cm|m|in|ft|kg|g|lb|hp|rpm|v|a|w)\b";
const CATALOG_CODE_PATTERN: &str = r"(?i)RSL-([A-Z]{3})-(\d{3})";
const MODEL_CODE_PATTERN: &str = r"(?i)[A-Z0-9]{2,}[-_]?[A-Z0-9]{2,}";

const TECHNICAL_TERMS: &[&str] = &[
    "industrial",
    "mecánico",
    "eléctrico",
    "hidráulico",
    "neumático",
    "manual",
    "automático",
    "digital",
    "analógico",
    "electrónico",
    "inoxidable",
    "galvanizado",
    "cromado",
    "anodizado",
    "templado",
    "resistente",
    "duradero",
    "preciso",
    "ajustable",
    "regulable",
    "pesado",
    "liviano",
    "compacto",
    "portátil",
    "fijo",
    "móvil",
    "profesional",
    "comercial",
    "doméstico",
    "militar",
    "especial",
];

/// Term table used when no dictionary file is given.
const INDUSTRIAL_DICTIONARY: &str = include_str!("industrial_synonyms.json");

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeneratedSynonyms {
    pub synonyms: Vec<String>,
    pub keywords: Vec<String>,
}

/// Produces synonyms and keywords for a product on a memory miss.
pub trait SynonymGenerator {
    fn generate(&self, alias: &str, description: &str) -> GeneratedSynonyms;
}

/// Dictionary-driven generator.
///
/// Each dictionary term found anywhere in `alias + description` contributes
/// its synonyms. Description words longer than three characters are added
/// both as written and accent-folded. Keywords come from technical terms,
/// measurements and product codes.
pub struct DictionaryGenerator {
    dictionary: IndexMap<String, Vec<String>>,
    measurement: Regex,
    catalog_code: Regex,
    model_code: Regex,
}

impl DictionaryGenerator {
    pub fn new(dictionary: IndexMap<String, Vec<String>>) -> Result<Self> {
        let dictionary = dictionary
            .into_iter()
            .map(|(term, synonyms)| (term.trim().to_lowercase(), synonyms))
            .filter(|(term, _)| !term.is_empty())
            .collect();
        Ok(Self {
            dictionary,
            measurement: compile(MEASUREMENT_PATTERN)?,
            catalog_code: compile(CATALOG_CODE_PATTERN)?,
            model_code: compile(MODEL_CODE_PATTERN)?,
        })
    }

    /// Reads a JSON object mapping each term to its synonym list.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
            .map_err(|err| MemoryError::Config(format!("{}: {err}", path.display())))
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let dictionary: IndexMap<String, Vec<String>> = serde_json::from_str(raw)?;
        Self::new(dictionary)
    }

    /// Generator over the bundled industrial automation term table.
    pub fn industrial() -> Result<Self> {
        Self::from_json_str(INDUSTRIAL_DICTIONARY)
    }

    pub fn len(&self) -> usize {
        self.dictionary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dictionary.is_empty()
    }

    fn synonyms(&self, alias: &str, description: &str) -> Vec<String> {
        let text = format!("{alias} {description}").to_lowercase();
        let mut synonyms = IndexSet::new();
        for (term, values) in &self.dictionary {
            if text.contains(term.as_str()) {
                synonyms.extend(values.iter().filter(|value| *value != term).cloned());
            }
        }
        for word in description_words(description) {
            let folded: String = word.chars().map(fold_accent).collect();
            synonyms.insert(word);
            synonyms.insert(folded);
        }
        synonyms
            .into_iter()
            .filter(|synonym| synonym.chars().count() > 1)
            .collect()
    }

    fn keywords(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        let mut keywords = IndexSet::new();
        for term in TECHNICAL_TERMS {
            if lowered.contains(term) {
                keywords.insert((*term).to_string());
            }
        }
        for found in self.measurement.find_iter(text) {
            keywords.insert(found.as_str().to_lowercase());
        }
        for caps in self.catalog_code.captures_iter(text) {
            if let Some(code) = caps.get(0) {
                keywords.insert(code.as_str().to_uppercase());
            }
            for part in [caps.get(1), caps.get(2)].into_iter().flatten() {
                keywords.insert(part.as_str().to_uppercase());
            }
        }
        for found in self.model_code.find_iter(text) {
            let code = found.as_str();
            if code.chars().any(|ch| ch.is_ascii_digit()) {
                keywords.insert(code.to_uppercase());
            }
        }
        keywords.into_iter().collect()
    }
}

impl SynonymGenerator for DictionaryGenerator {
    fn generate(&self, alias: &str, description: &str) -> GeneratedSynonyms {
        GeneratedSynonyms {
            synonyms: self.synonyms(alias, description),
            keywords: self.keywords(&format!("{alias} {description}")),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|err| MemoryError::Config(format!("bad pattern {pattern}: {err}")))
}

fn description_words(description: &str) -> Vec<String> {
    description
        .to_lowercase()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch == '_' || ch.is_whitespace() {
                ch
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .filter(|word| word.chars().count() > 3)
        .map(str::to_string)
        .collect()
}
