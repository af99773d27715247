use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::key::ProductKey;
use super::storage::KeyValueStorage;
use super::store::ProductStore;
use super::types::ProductRecord;
use crate::error::MemoryError;
use crate::error::Result;

pub const SNAPSHOT_KEY: &str = "risolusSynonymMemory";
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Whole-store blob written to the snapshot slot after every mutation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    #[serde(default)]
    pub synonyms: Vec<(String, Value)>,
    pub products: Vec<(ProductKey, ProductRecord)>,
    pub last_updated: DateTime<Utc>,
    pub version: String,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    synonyms: &'a [(String, Value)],
    products: Vec<(&'a ProductKey, &'a ProductRecord)>,
    #[serde(rename = "lastUpdated")]
    last_updated: DateTime<Utc>,
    version: &'static str,
}

/// Reads and writes the product store through a [`KeyValueStorage`] slot.
///
/// Failures never propagate: a rejected write is logged and reported as
/// `false`, an unreadable snapshot loads as an empty store.
pub struct MemoryPersistence {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    legacy_synonyms: Vec<(String, Value)>,
}

impl MemoryPersistence {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_key(storage, SNAPSHOT_KEY)
    }

    pub fn with_key(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            legacy_synonyms: Vec::new(),
        }
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn load(&mut self) -> ProductStore {
        match self.try_load() {
            Ok(Some(snapshot)) => {
                debug!(
                    key = %self.key,
                    products = snapshot.products.len(),
                    "loaded synonym memory"
                );
                self.legacy_synonyms = snapshot.synonyms;
                snapshot
                    .products
                    .into_iter()
                    .map(|(key, record)| (key, record.normalised()))
                    .collect()
            }
            Ok(None) => {
                self.legacy_synonyms.clear();
                ProductStore::new()
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "discarding unreadable synonym memory");
                self.legacy_synonyms.clear();
                ProductStore::new()
            }
        }
    }

    pub fn save(&self, store: &ProductStore) -> bool {
        match self.try_save(store) {
            Ok(()) => true,
            Err(err) => {
                warn!(
                    key = %self.key,
                    products = store.size(),
                    error = %err,
                    "synonym memory not persisted; keeping in-memory copy"
                );
                false
            }
        }
    }

    /// Drops the durable snapshot entirely.
    pub fn remove(&mut self) -> bool {
        self.legacy_synonyms.clear();
        match self.storage.remove_item(&self.key) {
            Ok(()) => {
                info!(key = %self.key, "synonym memory removed from storage");
                true
            }
            Err(err) => {
                warn!(key = %self.key, error = %err, "failed to remove synonym memory");
                false
            }
        }
    }

    /// Byte length of the serialized `{synonyms, products}` pair.
    pub fn encoded_size(&self, store: &ProductStore) -> u64 {
        #[derive(Serialize)]
        struct Footprint<'a> {
            synonyms: &'a [(String, Value)],
            products: Vec<(&'a ProductKey, &'a ProductRecord)>,
        }
        serde_json::to_vec(&Footprint {
            synonyms: &self.legacy_synonyms,
            products: store.entries().collect(),
        })
        .map(|bytes| bytes.len() as u64)
        .unwrap_or_default()
    }

    fn try_load(&self) -> Result<Option<PersistedSnapshot>> {
        let raw = self
            .storage
            .get_item(&self.key)
            .map_err(|source| MemoryError::PersistenceRead {
                key: self.key.clone(),
                source,
            })?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let snapshot = serde_json::from_str::<PersistedSnapshot>(&raw)
            .map_err(|err| MemoryError::MalformedSnapshot(err.to_string()))?;
        Ok(Some(snapshot))
    }

    fn try_save(&self, store: &ProductStore) -> Result<()> {
        let snapshot = SnapshotRef {
            synonyms: &self.legacy_synonyms,
            products: store.entries().collect(),
            last_updated: Utc::now(),
            version: SNAPSHOT_VERSION,
        };
        let raw = serde_json::to_string(&snapshot)?;
        self.storage
            .set_item(&self.key, &raw)
            .map_err(|source| MemoryError::PersistenceWrite {
                key: self.key.clone(),
                source,
            })
    }
}
