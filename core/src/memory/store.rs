use indexmap::IndexMap;

use super::key::ProductKey;
use super::types::ProductRecord;

/// In-memory map of canonical key to product record.
///
/// Iteration follows insertion order; overwriting an existing key keeps its
/// original position. The store does no validation of its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductStore {
    records: IndexMap<ProductKey, ProductRecord>,
}

impl ProductStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ProductKey) -> Option<&ProductRecord> {
        self.records.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &ProductKey) -> Option<&mut ProductRecord> {
        self.records.get_mut(key)
    }

    /// Inserts or replaces; returns the record previously stored under `key`.
    pub fn set(&mut self, key: ProductKey, record: ProductRecord) -> Option<ProductRecord> {
        self.records.insert(key, record)
    }

    pub fn has(&self, key: &ProductKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&ProductKey, &ProductRecord)> + '_ {
        self.records.iter()
    }

    pub fn records(&self) -> impl Iterator<Item = &ProductRecord> + '_ {
        self.records.values()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<(ProductKey, ProductRecord)> for ProductStore {
    fn from_iter<I: IntoIterator<Item = (ProductKey, ProductRecord)>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
