//! Configuration loading for survey conversion
//!
//! Settings are resolved in priority order:
//! 1. Command-line arguments (applied by the binary on top of the loaded config)
//! 2. TOML config file (explicit path, `./survey-v1.toml`, or user config dir)
//! 3. Built-in defaults
//!
//! A missing config file is not an error: defaults are used.

use crate::transform::TransformKind;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "survey-v1.toml";

/// Converter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConverterConfig {
    /// Base folder holding one sub-folder per study
    ///
    /// Default: `output`
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,

    /// Walk nested folders below `surveys/`
    #[serde(default)]
    pub recursive: bool,

    /// Skip inputs whose `.v1.json` output already exists
    #[serde(default)]
    pub skip_existing: bool,

    /// Transform applied to each survey
    #[serde(default)]
    pub transform: TransformKind,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            recursive: false,
            skip_existing: false,
            transform: TransformKind::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_output_root() -> PathBuf {
    PathBuf::from("output")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ConverterConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration from an explicit file; the file must exist
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        toml::from_str(&content).map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load configuration, falling back to defaults when no file is found
    ///
    /// An explicit path is required to exist. Without one, the working
    /// directory and then the user config directory are searched.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match locate_config_file() {
            Some(path) => {
                tracing::debug!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Folder holding the surveys of one study
    pub fn surveys_dir(&self, study: &str) -> PathBuf {
        self.output_root.join(study).join("surveys")
    }
}

/// Find the first existing config file in the search order
fn locate_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|d| d.join("survey-v1").join("config.toml"))
        .filter(|p| p.is_file())
}
