//! Configuration loading and root folder resolution
//!
//! The root folder holds everything the service owns on disk: the SQLite
//! database, the template directory and the generated-report output
//! directory. Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`TENDER_ROOT`)
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime; runtime-tunable settings
/// live in the database `settings` table instead.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Root folder for database, templates and outputs (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP bind address
    #[serde(default = "default_host")]
    pub host: String,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            port: default_port(),
            host: default_host(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_port() -> u16 {
    5780
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load bootstrap TOML config from the platform config directory.
///
/// Returns the built-in defaults when no config file exists; a file that
/// exists but does not parse is a hard error so typos are not silently
/// ignored.
pub fn load_toml_config() -> Result<TomlConfig> {
    let path = match config_file_path() {
        Some(p) if p.exists() => p,
        _ => return Ok(TomlConfig::default()),
    };

    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
}

/// Platform config file location: `<config_dir>/tender-works/config.toml`
fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tender-works").join("config.toml"))
}

/// Resolve the root folder with the 4-tier priority order.
pub fn resolve_root_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var("TENDER_ROOT") {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(root) = &config.root_folder {
        return root.clone();
    }

    default_root_folder()
}

/// OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("tender-works"))
        .unwrap_or_else(|| PathBuf::from("./tender_data"))
}

/// Well-known paths under the root folder
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub root: PathBuf,
}

impl DataPaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn database_path(&self) -> PathBuf {
        self.root.join("tender.db")
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.root.join("templates")
    }

    pub fn outputs_dir(&self) -> PathBuf {
        self.root.join("outputs")
    }

    /// Create root, templates and outputs directories if missing
    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.templates_dir())?;
        std::fs::create_dir_all(self.outputs_dir())?;
        Ok(())
    }
}
