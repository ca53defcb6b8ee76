//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration lives in a small TOML file. Everything in it has a
//! built-in default, so a missing or unreadable file only produces a warning.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "SENTIPREP_ROOT_FOLDER";

/// Environment variable pointing at an explicit TOML file
pub const CONFIG_FILE_ENV: &str = "SENTIPREP_CONFIG";

/// File name of the metadata store inside the root folder
pub const DATABASE_FILE: &str = "sentiprep.db";

/// Directory name of the object store inside the root folder
pub const OBJECTS_DIR: &str = "objects";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the metadata store and object store
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Enable the language detector when it is compiled in
    #[serde(default = "default_true")]
    pub language_detection: bool,

    /// Column validation behavior
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Object paths of the default keyword resources
    #[serde(default)]
    pub keywords: KeywordConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// What to do with validation rules that reference a column the table lacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingColumnPolicy {
    /// Treat the rule as a no-op
    #[default]
    Skip,
    /// Abort the cleaning run with an input error
    Fail,
}

/// Column validation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default)]
    pub missing_columns: MissingColumnPolicy,
}

/// Default keyword resource locations in the object store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    #[serde(default = "default_positives_path")]
    pub positives: String,
    #[serde(default = "default_negatives_path")]
    pub negatives: String,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_positives_path() -> String {
    "keywords/positives.txt".to_string()
}

fn default_negatives_path() -> String {
    "keywords/negatives.txt".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            positives: default_positives_path(),
            negatives: default_negatives_path(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            bind_address: default_bind_address(),
            port: default_port(),
            logging: LoggingConfig::default(),
            language_detection: true,
            validation: ValidationConfig::default(),
            keywords: KeywordConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Read configuration from an explicit file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Load configuration with graceful degradation
    ///
    /// Explicit path (or `SENTIPREP_CONFIG`) first, then the platform config
    /// file. Any failure falls back to defaults with a warning.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let env_path = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);
        let candidate = explicit
            .map(Path::to_path_buf)
            .or(env_path)
            .or_else(default_config_file);

        let Some(path) = candidate else {
            warn!("No config file location available, using built-in defaults");
            return Self::default();
        };

        if !path.exists() {
            info!("Config file {} not found, using built-in defaults", path.display());
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{}; using built-in defaults", e);
                Self::default()
            }
        }
    }
}

/// Platform location of the TOML file (`~/.config/sentiprep/config.toml` on Linux)
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sentiprep").join("config.toml"))
}

/// Get OS-dependent default root folder path
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("sentiprep"))
        .unwrap_or_else(|| PathBuf::from("./sentiprep_data"))
}

/// Root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.root_folder {
        return path.clone();
    }

    default_root_folder()
}

/// Create the root folder and its object store directory if missing
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root.join(OBJECTS_DIR))?;
    Ok(())
}
