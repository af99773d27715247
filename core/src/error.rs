use std::io;

use thiserror::Error;

use crate::memory::ExportFormat;

pub type Result<T> = std::result::Result<T, MemoryError>;

#[derive(Debug, Error)]
pub enum MemoryError {
    /// The durable slot rejected a write (quota, permissions, full disk).
    #[error("failed to write memory slot `{key}`: {source}")]
    PersistenceWrite {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to read memory slot `{key}`: {source}")]
    PersistenceRead {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed memory snapshot: {0}")]
    MalformedSnapshot(String),

    /// The import file does not have the expected top-level shape. Nothing
    /// was applied to the store.
    #[error("invalid import file: {0}")]
    ImportFormat(String),

    #[error("failed to encode {format} export: {message}")]
    Export {
        format: ExportFormat,
        message: String,
    },

    #[error("catalog has no column named `{0}`")]
    MissingColumn(String),

    /// A catalog row has more cells than the header names.
    #[error("catalog line {line} has {cells} cells but the header has {columns}")]
    RaggedRow {
        line: u64,
        cells: usize,
        columns: usize,
    },

    #[error("invalid config: {0}")]
    Config(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
