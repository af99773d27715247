use std::fs;
use std::io;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::error::MemoryError;
use crate::error::Result;
use crate::memory::DEFAULT_SIMILARITY_THRESHOLD;

pub const RISOLU_HOME_ENV: &str = "RISOLU_HOME";
pub const CONFIG_TOML_FILE: &str = "config.toml";
const DEFAULT_HOME_DIR: &str = ".risolu";
const DEFAULT_MEMORY_DIR: &str = "memory";

/// On-disk shape of `$RISOLU_HOME/config.toml`. Every field is optional.
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct ConfigToml {
    pub memory: Option<MemoryToml>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct MemoryToml {
    /// Relative paths resolve against the home directory.
    pub storage_dir: Option<PathBuf>,
    /// Used until a threshold has been persisted with `memory threshold`.
    /// Values above 1 are read as percentages.
    pub similarity_threshold: Option<f64>,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub risolu_home: PathBuf,
    pub memory_dir: PathBuf,
    pub similarity_threshold: f64,
}

impl Config {
    /// Resolves the home directory (explicit override, then `RISOLU_HOME`,
    /// then `~/.risolu`) and reads its config file.
    pub fn load(home_override: Option<PathBuf>) -> Result<Self> {
        let home = match home_override {
            Some(home) => home,
            None => find_risolu_home()?,
        };
        Self::load_from_home(home)
    }

    /// A missing config file yields defaults; an unparsable one is an error.
    pub fn load_from_home(risolu_home: PathBuf) -> Result<Self> {
        let path = risolu_home.join(CONFIG_TOML_FILE);
        let toml = match fs::read_to_string(&path) {
            Ok(raw) => toml::from_str::<ConfigToml>(&raw)
                .map_err(|err| MemoryError::Config(format!("{}: {err}", path.display())))?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => ConfigToml::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self::from_toml(toml, risolu_home))
    }

    pub fn from_toml(toml: ConfigToml, risolu_home: PathBuf) -> Self {
        let memory = toml.memory.unwrap_or_default();
        let memory_dir = match memory.storage_dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => risolu_home.join(dir),
            None => risolu_home.join(DEFAULT_MEMORY_DIR),
        };
        let similarity_threshold = memory
            .similarity_threshold
            .map(normalise_threshold)
            .unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);
        Self {
            risolu_home,
            memory_dir,
            similarity_threshold,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.risolu_home.join(CONFIG_TOML_FILE)
    }
}

/// `RISOLU_HOME` when set and non-empty, otherwise `~/.risolu`. The
/// directory is not required to exist.
pub fn find_risolu_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(RISOLU_HOME_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_HOME_DIR))
        .ok_or_else(|| MemoryError::Config("could not determine the home directory".to_string()))
}

/// Reads values above 1 as percentages and clamps the result to `0..=1`.
pub fn normalise_threshold(value: f64) -> f64 {
    if !value.is_finite() {
        return DEFAULT_SIMILARITY_THRESHOLD;
    }
    let value = if value > 1.0 { value / 100.0 } else { value };
    value.clamp(0.0, 1.0)
}
