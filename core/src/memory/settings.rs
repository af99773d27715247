use std::sync::Arc;

use tracing::info;
use tracing::warn;

use super::storage::KeyValueStorage;

pub const THRESHOLD_KEY: &str = "risolusimilarityThreshold";
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.70;

/// Fuzzy-match threshold, persisted in its own slot next to the snapshot.
pub struct MemorySettingsManager {
    storage: Arc<dyn KeyValueStorage>,
    similarity_threshold: f64,
}

impl MemorySettingsManager {
    /// Reads the persisted threshold, falling back to `default_threshold`
    /// when the slot is empty or unreadable.
    pub fn load(storage: Arc<dyn KeyValueStorage>, default_threshold: f64) -> Self {
        let fallback = clamp_threshold(default_threshold);
        let similarity_threshold = match storage.get_item(THRESHOLD_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => clamp_threshold(value),
                _ => {
                    warn!(value = %raw, "ignoring unparsable similarity threshold");
                    fallback
                }
            },
            Ok(None) => fallback,
            Err(err) => {
                warn!(error = %err, "failed to read similarity threshold");
                fallback
            }
        };
        Self {
            storage,
            similarity_threshold,
        }
    }

    pub fn similarity_threshold(&self) -> f64 {
        self.similarity_threshold
    }

    /// Applies the new threshold for subsequent lookups and persists it.
    /// The in-memory value changes even when the write is rejected.
    pub fn set_similarity_threshold(&mut self, value: f64) -> bool {
        let value = if value.is_finite() {
            clamp_threshold(value)
        } else {
            self.similarity_threshold
        };
        self.similarity_threshold = value;
        match self.storage.set_item(THRESHOLD_KEY, &value.to_string()) {
            Ok(()) => {
                info!(threshold = value, "similarity threshold updated");
                true
            }
            Err(err) => {
                warn!(error = %err, "similarity threshold not persisted");
                false
            }
        }
    }
}

fn clamp_threshold(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
