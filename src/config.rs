//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides, and
//! bootstraps `tracing` from the logging section.

use crate::coach::GeminiConfig;
use serde::Deserialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub coach: CoachConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ledger persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_file_name")]
    pub file_name: String,
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("nutrino").to_string_lossy().to_string())
        .unwrap_or_else(|| "./nutrino_data".to_string())
}

fn default_file_name() -> String {
    "user_data.json".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_name: default_file_name(),
        }
    }
}

impl LedgerConfig {
    /// Full path of the ledger document
    pub fn ledger_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.file_name)
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins; empty allows any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Largest accepted request body (photo uploads arrive base64-encoded)
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8085
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_upload() -> usize {
    10 * 1024 * 1024 // 10 MB
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            request_timeout_secs: default_request_timeout(),
            max_upload_bytes: default_max_upload(),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// AI coach configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CoachConfig {
    /// Gemini API key; without one the coach answers offline
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_coach_model")]
    pub model: String,

    #[serde(default = "default_coach_url")]
    pub base_url: String,

    #[serde(default = "default_coach_timeout")]
    pub request_timeout_secs: u64,
}

fn default_coach_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_coach_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_coach_timeout() -> u64 {
    60
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_coach_model(),
            base_url: default_coach_url(),
            request_timeout_secs: default_coach_timeout(),
        }
    }
}

impl From<&CoachConfig> for GeminiConfig {
    fn from(config: &CoachConfig) -> Self {
        GeminiConfig {
            api_key: config.api_key.clone().filter(|key| !key.trim().is_empty()),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            request_timeout_secs: config.request_timeout_secs,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Filter used when `RUST_LOG` is not set
    pub fn default_filter(&self) -> String {
        format!("nutrino={},tower_http=info", self.level)
    }

    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }

    /// Install the global `tracing` subscriber
    ///
    /// `RUST_LOG` takes precedence over `level`.
    pub fn init_tracing(&self) -> Result<(), ConfigError> {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_filter()));

        let writer = match &self.file {
            Some(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| ConfigError::Io {
                        path: PathBuf::from(path),
                        error: e.to_string(),
                    })?;
                BoxMakeWriter::new(Mutex::new(file))
            }
            None => BoxMakeWriter::new(std::io::stdout),
        };

        let fmt_layer = if self.is_json() {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_ansi(self.file.is_none())
                .with_writer(writer)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| ConfigError::Logging(e.to_string()))
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// Config files that exist but fail to load are skipped. Their errors are
    /// returned alongside the config so they can be logged once tracing is up.
    pub fn load_default() -> (Self, Vec<ConfigError>) {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("nutrino").join("config.toml")),
            Some(PathBuf::from("/etc/nutrino/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths)
    }

    /// Load the first of `paths` that exists and parses, else env-only defaults
    fn load_first(paths: &[PathBuf]) -> (Self, Vec<ConfigError>) {
        let mut errors = Vec::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_with_env(path) {
                Ok(config) => return (config, errors),
                Err(e) => errors.push(e),
            }
        }

        (Self::from_env(), errors)
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Ledger overrides
        if let Some(data_dir) = var("NUTRINO_DATA_DIR") {
            self.ledger.data_dir = data_dir;
        }
        if let Some(file_name) = var("NUTRINO_LEDGER_FILE") {
            self.ledger.file_name = file_name;
        }

        // API overrides
        if let Some(host) = var("NUTRINO_API_HOST") {
            self.api.host = host;
        }
        if let Some(port) = var("NUTRINO_API_PORT") {
            match port.parse() {
                Ok(p) => self.api.port = p,
                Err(_) => tracing::warn!("Ignoring invalid NUTRINO_API_PORT {:?}", port),
            }
        }

        // Coach overrides
        if let Some(key) = var("GEMINI_API_KEY") {
            self.coach.api_key = Some(key);
        }
        if let Some(model) = var("NUTRINO_COACH_MODEL") {
            self.coach.model = model;
        }

        // Logging overrides
        if let Some(level) = var("NUTRINO_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = var("NUTRINO_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Failed to initialise logging: {0}")]
    Logging(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Nutrino Configuration
#
# Environment variables override these settings:
# - NUTRINO_DATA_DIR
# - NUTRINO_LEDGER_FILE
# - NUTRINO_API_HOST
# - NUTRINO_API_PORT
# - GEMINI_API_KEY
# - NUTRINO_COACH_MODEL
# - NUTRINO_LOG_LEVEL
# - NUTRINO_LOG_FORMAT

[ledger]
# Directory holding the ledger document
data_dir = "~/.local/share/nutrino"

# Ledger document file name
file_name = "user_data.json"

[api]
# API server host
host = "127.0.0.1"

# API server port
port = 8085

# Allowed CORS origins (empty allows any origin)
cors_origins = []

# Request timeout in seconds
request_timeout_secs = 30

# Largest accepted request body, photo uploads included (bytes)
max_upload_bytes = 10485760

[coach]
# Gemini API key (prefer the GEMINI_API_KEY environment variable)
# api_key = ""

# Model used for every coach call
model = "gemini-2.5-flash"

# Gemini API root
base_url = "https://generativelanguage.googleapis.com/v1beta"

# Request timeout in seconds
request_timeout_secs = 60

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/nutrino/nutrino.log"
"#
    .to_string()
}
