use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Cached enrichment for one distinct product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default = "default_usage_count")]
    pub usage_count: u64,
}

impl ProductRecord {
    pub fn new(
        alias: impl Into<String>,
        description: impl Into<String>,
        synonyms: Vec<String>,
        keywords: Vec<String>,
    ) -> Self {
        Self {
            alias: alias.into(),
            description: description.into(),
            synonyms: dedup_preserving_order(synonyms),
            keywords,
            created_at: Utc::now(),
            usage_count: 1,
        }
    }

    /// Restores the record invariants on data read from outside: synonyms
    /// deduplicated in order and a usage count of at least one.
    pub fn normalised(mut self) -> Self {
        self.synonyms = dedup_preserving_order(self.synonyms);
        self.usage_count = self.usage_count.max(1);
        self
    }
}

const fn default_usage_count() -> u64 {
    1
}

pub(crate) fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::with_capacity(values.len());
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}

/// Outcome of a memory lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LookupResult {
    Exact {
        synonyms: Vec<String>,
        keywords: Vec<String>,
        usage_count: u64,
    },
    Similar {
        synonyms: Vec<String>,
        keywords: Vec<String>,
        similarity: f64,
        matched_alias: String,
        matched_description: String,
        usage_count: u64,
    },
    Miss,
}

impl LookupResult {
    pub fn is_hit(&self) -> bool {
        !matches!(self, LookupResult::Miss)
    }

    pub fn synonyms(&self) -> Option<&[String]> {
        match self {
            LookupResult::Exact { synonyms, .. } | LookupResult::Similar { synonyms, .. } => {
                Some(synonyms)
            }
            LookupResult::Miss => None,
        }
    }

    pub fn keywords(&self) -> Option<&[String]> {
        match self {
            LookupResult::Exact { keywords, .. } | LookupResult::Similar { keywords, .. } => {
                Some(keywords)
            }
            LookupResult::Miss => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageSummary {
    pub alias: String,
    pub description: String,
    pub usage_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoryStats {
    pub total_products: usize,
    pub unique_aliases: usize,
    pub total_synonyms: usize,
    pub most_used: Vec<UsageSummary>,
    pub memory_size_bytes: u64,
}
