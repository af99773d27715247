//! Root of the `risolu-core` library.
//!
//! The synonym memory lives in [`memory`]; [`enrich`] is the caller that
//! decides when the external [`generator`] runs.

pub mod config;
pub mod enrich;
pub mod error;
pub mod generator;
pub mod memory;

pub use config::Config;
pub use error::MemoryError;
pub use memory::MemoryEngine;
