#![allow(clippy::expect_used)]
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use risolu_core::MemoryEngine;
use risolu_core::memory::DEFAULT_SIMILARITY_THRESHOLD;
use risolu_core::memory::FileStorage;
use risolu_core::memory::KeyValueStorage;
use risolu_core::memory::MemoryStorage;
use tempfile::TempDir;

/// Engine over shared storage that can be reopened to simulate a restart.
pub struct TestMemory {
    storage: Arc<dyn KeyValueStorage>,
    threshold: f64,
    _dir: Option<TempDir>,
}

impl TestMemory {
    pub fn in_memory() -> Self {
        Self {
            storage: Arc::new(MemoryStorage::new()),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            _dir: None,
        }
    }

    /// Storage that rejects any write pushing it past `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            storage: Arc::new(MemoryStorage::with_quota(quota_bytes)),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            _dir: None,
        }
    }

    pub fn on_disk() -> Self {
        let dir = TempDir::new().expect("create temp memory dir");
        Self {
            storage: Arc::new(FileStorage::new(dir.path().join("memory"))),
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
            _dir: Some(dir),
        }
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn storage(&self) -> Arc<dyn KeyValueStorage> {
        Arc::clone(&self.storage)
    }

    pub fn open(&self) -> MemoryEngine {
        MemoryEngine::init(self.storage(), self.threshold)
    }
}

/// Product catalog used across the suite, as (alias, description, synonyms).
pub fn hardware_catalog() -> Vec<(&'static str, &'static str, Vec<String>)> {
    vec![
        (
            "RSL-MTR-001",
            "Martillo de bola 16oz",
            vec!["hammer".to_string(), "mazo".to_string()],
        ),
        (
            "Llave inglesa",
            "Llave ajustable 10 pulgadas",
            vec!["wrench".to_string(), "perico".to_string()],
        ),
        (
            "PLC-100",
            "Controlador lógico programable",
            vec!["controlador".to_string(), "allen bradley".to_string()],
        ),
    ]
}

pub fn seed(engine: &mut MemoryEngine) {
    for (alias, description, synonyms) in hardware_catalog() {
        engine.commit(alias, description, synonyms, Vec::new());
    }
}

pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}

pub fn products_json(products: serde_json::Value) -> String {
    serde_json::json!({
        "metadata": {"version": "1.0", "format": "json"},
        "products": products,
    })
    .to_string()
}
