//! Synonym memory: a keyed cache of enrichment results that answers exact
//! and fuzzy lookups and persists itself after every change.

mod key;
mod persistence;
mod settings;
mod similarity;
mod snapshot;
mod storage;
mod store;
mod types;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use tracing::info;

pub use key::KEY_SEPARATOR;
pub use key::ProductKey;
pub use key::derive_key;
pub use persistence::MemoryPersistence;
pub use persistence::PersistedSnapshot;
pub use persistence::SNAPSHOT_KEY;
pub use persistence::SNAPSHOT_VERSION;
pub use settings::DEFAULT_SIMILARITY_THRESHOLD;
pub use settings::MemorySettingsManager;
pub use settings::THRESHOLD_KEY;
pub use similarity::similarity;
pub use snapshot::ExportFormat;
pub use snapshot::ImportKind;
pub use snapshot::TABULAR_COLUMNS;
pub use snapshot::parse_import;
pub use snapshot::render_export;
pub use storage::FileStorage;
pub use storage::KeyValueStorage;
pub use storage::MemoryStorage;
pub use store::ProductStore;
pub use types::LookupResult;
pub use types::MemoryStats;
pub use types::ProductRecord;
pub use types::UsageSummary;

pub(crate) use similarity::fold_accent;

use crate::config::Config;
use crate::error::Result;

const MOST_USED_LIMIT: usize = 5;

/// Owns the product store and keeps it in step with durable storage.
pub struct MemoryEngine {
    store: ProductStore,
    persistence: MemoryPersistence,
    settings: MemorySettingsManager,
}

impl MemoryEngine {
    /// Loads the persisted snapshot and threshold from `storage`. Unreadable
    /// state starts the engine empty rather than failing.
    pub fn init(storage: Arc<dyn KeyValueStorage>, default_threshold: f64) -> Self {
        let mut persistence = MemoryPersistence::new(Arc::clone(&storage));
        let store = persistence.load();
        let settings = MemorySettingsManager::load(storage, default_threshold);
        info!(
            products = store.size(),
            threshold = settings.similarity_threshold(),
            "synonym memory ready"
        );
        Self {
            store,
            persistence,
            settings,
        }
    }

    /// File-backed engine rooted at the configured memory directory.
    pub fn open(config: &Config) -> Self {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::new(&config.memory_dir));
        Self::init(storage, config.similarity_threshold)
    }

    pub fn store(&self) -> &ProductStore {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.store.size()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.settings.similarity_threshold()
    }

    pub fn set_similarity_threshold(&mut self, value: f64) -> bool {
        self.settings.set_similarity_threshold(value)
    }

    /// Exact key match first, then the best fuzzy candidate at or above the
    /// threshold. Any hit bumps the matched record's usage count and is
    /// persisted before returning.
    pub fn lookup(&mut self, alias: &str, description: &str) -> LookupResult {
        let key = derive_key(Some(alias), Some(description));
        if let Some(record) = self.store.get_mut(&key) {
            record.usage_count = record.usage_count.saturating_add(1);
            let result = LookupResult::Exact {
                synonyms: record.synonyms.clone(),
                keywords: record.keywords.clone(),
                usage_count: record.usage_count,
            };
            debug!(key = %key, "exact memory hit");
            self.persist();
            return result;
        }

        let threshold = self.settings.similarity_threshold();
        let Some((matched_key, score)) = self.best_similar(alias, description, threshold) else {
            debug!(key = %key, threshold, "memory miss");
            return LookupResult::Miss;
        };
        let Some(record) = self.store.get_mut(&matched_key) else {
            return LookupResult::Miss;
        };
        record.usage_count = record.usage_count.saturating_add(1);
        let result = LookupResult::Similar {
            synonyms: record.synonyms.clone(),
            keywords: record.keywords.clone(),
            similarity: score,
            matched_alias: record.alias.clone(),
            matched_description: record.description.clone(),
            usage_count: record.usage_count,
        };
        debug!(key = %key, matched = %matched_key, similarity = score, "similar memory hit");
        self.persist();
        result
    }

    /// Linear scan in insertion order. Only a strictly better score replaces
    /// the running candidate, so the earliest record wins ties, and a score
    /// of zero never qualifies.
    fn best_similar(
        &self,
        alias: &str,
        description: &str,
        threshold: f64,
    ) -> Option<(ProductKey, f64)> {
        let mut best: Option<(&ProductKey, f64)> = None;
        for (key, record) in self.store.entries() {
            let alias_score = similarity(Some(alias), Some(&record.alias));
            let description_score = similarity(Some(description), Some(&record.description));
            let score = (alias_score + description_score) / 2.0;
            let best_score = best.map_or(0.0, |(_, score)| score);
            if score > best_score && score >= threshold {
                best = Some((key, score));
            }
        }
        best.map(|(key, score)| (key.clone(), score))
    }

    /// Stores a freshly generated result. Re-committing an existing key
    /// keeps its creation time and increments its usage count.
    pub fn commit(
        &mut self,
        alias: &str,
        description: &str,
        synonyms: Vec<String>,
        keywords: Vec<String>,
    ) -> ProductKey {
        let key = derive_key(Some(alias), Some(description));
        let mut record = ProductRecord::new(alias, description, synonyms, keywords);
        if let Some(prior) = self.store.get(&key) {
            record.created_at = prior.created_at;
            record.usage_count = prior.usage_count.saturating_add(1);
        }
        debug!(
            key = %key,
            synonyms = record.synonyms.len(),
            usage = record.usage_count,
            "committing product to memory"
        );
        self.store.set(key.clone(), record);
        self.persist();
        key
    }

    /// Empties the store and drops the durable snapshot.
    pub fn clear(&mut self) -> bool {
        let removed = self.store.size();
        self.store.clear();
        let ok = self.persistence.remove();
        info!(removed, "synonym memory cleared");
        ok
    }

    pub fn stats(&self) -> MemoryStats {
        let unique_aliases = self
            .store
            .records()
            .map(|record| record.alias.as_str())
            .collect::<HashSet<_>>()
            .len();
        let total_synonyms = self
            .store
            .records()
            .map(|record| record.synonyms.len())
            .sum();
        let mut most_used: Vec<&ProductRecord> = self.store.records().collect();
        most_used.sort_by_key(|record| std::cmp::Reverse(record.usage_count));
        most_used.truncate(MOST_USED_LIMIT);
        MemoryStats {
            total_products: self.store.size(),
            unique_aliases,
            total_synonyms,
            most_used: most_used
                .into_iter()
                .map(|record| UsageSummary {
                    alias: record.alias.clone(),
                    description: record.description.clone(),
                    usage_count: record.usage_count,
                })
                .collect(),
            memory_size_bytes: self.persistence.encoded_size(&self.store),
        }
    }

    pub fn render_export(&self, format: ExportFormat) -> Result<Vec<u8>> {
        render_export(&self.store, format)
    }

    /// Writes the export file to `dest`, creating parent directories.
    pub async fn export_snapshot(&self, format: ExportFormat, dest: &Path) -> Result<()> {
        let bytes = self.render_export(format)?;
        if let Some(parent) = dest.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, &bytes).await?;
        info!(
            format = %format,
            path = %dest.display(),
            products = self.store.size(),
            "synonym memory exported"
        );
        Ok(())
    }

    /// Merges every valid product in `bytes` into the store, overwriting
    /// records that share a key. A malformed file changes nothing.
    pub fn import_bytes(&mut self, bytes: &[u8], kind: ImportKind) -> Result<usize> {
        let parsed = parse_import(bytes, kind)?;
        let imported = parsed.len();
        for (key, record) in parsed {
            self.store.set(key, record);
        }
        self.persist();
        info!(imported, total = self.store.size(), "synonym memory imported");
        Ok(imported)
    }

    pub async fn import_snapshot(&mut self, path: &Path) -> Result<usize> {
        let kind = ImportKind::for_path(path)?;
        let bytes = tokio::fs::read(path).await?;
        self.import_bytes(&bytes, kind)
    }

    /// Persists the current store; `false` when the write was rejected.
    pub fn flush(&self) -> bool {
        self.persist()
    }

    /// Final flush before the engine goes away.
    pub fn dispose(self) -> bool {
        self.persist()
    }

    fn persist(&self) -> bool {
        self.persistence.save(&self.store)
    }
}
