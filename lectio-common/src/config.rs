//! Bootstrap configuration and root folder resolution
//!
//! Settings sources, highest priority first:
//! 1. Command-line arguments (applied by the binary on top of [`TomlConfig`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Built-in defaults
//!
//! A missing or unreadable TOML file is never fatal: a warning is logged and
//! the built-in defaults are used.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "LECTIO_ROOT_FOLDER";

/// Environment variable naming the TOML config file
pub const CONFIG_FILE_ENV: &str = "LECTIO_CONFIG";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "lectio.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// SQLite database file; defaults to `<root>/lectio.db`
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Root folder holding the database
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Interface to bind the HTTP server to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub chat: ChatConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Language-model provider settings for the chat relay
#[derive(Debug, Clone, Deserialize)]
pub struct ChatConfig {
    /// Base URL of an OpenAI-compatible API
    #[serde(default = "default_chat_base_url")]
    pub base_url: String,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl ChatConfig {
    /// API key from the configured environment variable, if set and non-empty
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5780
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_chat_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    200
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: default_chat_base_url(),
            model: default_chat_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            api_key_env: default_api_key_env(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            root_folder: None,
            bind: default_bind(),
            port: default_port(),
            logging: LoggingConfig::default(),
            chat: ChatConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load a TOML file, failing if it is missing or malformed
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load the TOML file if present, otherwise fall back to defaults
    ///
    /// `explicit` (from the command line) wins over `LECTIO_CONFIG`, which
    /// wins over the platform config location.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let (config, source) = Self::load_with_source(explicit);
        source.log();
        config
    }

    /// Like [`TomlConfig::load_or_default`] but without logging, returning
    /// where the settings came from
    ///
    /// Binaries call this before the tracing subscriber exists and log the
    /// [`ConfigSource`] once it does.
    pub fn load_with_source(explicit: Option<&Path>) -> (Self, ConfigSource) {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from))
            .or_else(default_config_file);

        let Some(path) = path else {
            return (Self::default(), ConfigSource::NoConfigDir);
        };

        if !path.exists() {
            return (Self::default(), ConfigSource::Missing(path));
        }

        match Self::load(&path) {
            Ok(config) => (config, ConfigSource::File(path)),
            Err(e) => {
                let reason = e.to_string();
                (Self::default(), ConfigSource::Invalid { path, reason })
            }
        }
    }

    /// Database file: explicit TOML path, else `<root>/lectio.db`
    pub fn database_path(&self, root_folder: &Path) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| root_folder.join(DATABASE_FILE_NAME))
    }
}

/// Where [`TomlConfig::load_with_source`] found its settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from this file
    File(PathBuf),
    /// No file at this path; built-in defaults
    Missing(PathBuf),
    /// File present but unreadable or malformed; built-in defaults
    Invalid { path: PathBuf, reason: String },
    /// No platform config directory; built-in defaults
    NoConfigDir,
}

impl ConfigSource {
    pub fn is_default(&self) -> bool {
        !matches!(self, ConfigSource::File(_))
    }

    /// Report the outcome; every fallback to defaults is a warning
    pub fn log(&self) {
        match self {
            ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
            ConfigSource::Missing(path) => warn!(
                "Config file {} not found; using built-in defaults",
                path.display()
            ),
            ConfigSource::Invalid { path, reason } => warn!(
                "Failed to load {}: {}; using built-in defaults",
                path.display(),
                reason
            ),
            ConfigSource::NoConfigDir => {
                warn!("No config directory available; using built-in defaults")
            }
        }
    }
}

/// Root folder resolution: CLI argument, then `LECTIO_ROOT_FOLDER`, then the
/// TOML `root_folder` key, then the OS data directory
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

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lectio"))
        .unwrap_or_else(|| PathBuf::from("./lectio_data"))
}

/// Platform config file location (`<config dir>/lectio/config.toml`)
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("lectio").join("config.toml"))
}
