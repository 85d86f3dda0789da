use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "ministral:latest";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_HISTORY_MESSAGES: usize = 10;
pub const DEFAULT_MAX_REFERENCE_CHARS: usize = 3000;
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "http://localhost:8080",
];

const CONFIG_FILE_PATH: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value {value:?} for {key}")]
    InvalidEnv { key: String, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub model: String,
    /// Upper bound on a whole streaming call, connection included.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub max_history_messages: usize,
    /// Per-section cap on injected reference material, in characters.
    pub max_reference_chars: usize,
    pub resources_dir: Option<PathBuf>,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            max_history_messages: DEFAULT_MAX_HISTORY_MESSAGES,
            max_reference_chars: DEFAULT_MAX_REFERENCE_CHARS,
            resources_dir: None,
            server: ServerConfig::default(),
        }
    }
}

/// `~/.sentinel`, or a directory under the temp dir when no home is known.
pub fn sentinel_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".sentinel")
}

pub fn config_json_path() -> PathBuf {
    sentinel_dir().join("config.json")
}

impl Config {
    /// Defaults, then `~/.sentinel/config.json` or `./config.toml`, then environment.
    pub fn load() -> Result<Self, ConfigError> {
        let json_path = config_json_path();
        let mut config = if json_path.exists() {
            Self::from_file(&json_path)?
        } else if Path::new(CONFIG_FILE_PATH).exists() {
            Self::from_file(Path::new(CONFIG_FILE_PATH))?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`Config::load`] but with an explicit file instead of the lookup.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a file as JSON when it ends in `.json`, TOML otherwise.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let parsed = if is_json {
            serde_json::from_str::<Config>(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str::<Config>(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup("OLLAMA_BASE_URL") {
            self.backend.base_url = base_url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.backend.model = model;
        }
        if let Some(value) = lookup("BACKEND_TIMEOUT_SECS") {
            self.backend.timeout_secs = parse_env("BACKEND_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("BACKEND_CONNECT_TIMEOUT_SECS") {
            self.backend.connect_timeout_secs = parse_env("BACKEND_CONNECT_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("MAX_HISTORY_MESSAGES") {
            self.max_history_messages = parse_env("MAX_HISTORY_MESSAGES", &value)?;
        }
        if let Some(value) = lookup("MAX_FILE_CONTENT_LENGTH") {
            self.max_reference_chars = parse_env("MAX_FILE_CONTENT_LENGTH", &value)?;
        }
        if let Some(dir) = lookup("SENTINEL_RESOURCES_DIR") {
            self.resources_dir = if dir.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(dir))
            };
        }
        if let Some(host) = lookup("SENTINEL_HOST") {
            self.server.host = host;
        }
        if let Some(value) = lookup("SENTINEL_PORT") {
            self.server.port = parse_env("SENTINEL_PORT", &value)?;
        }
        if let Some(origins) = lookup("SENTINEL_CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_history_messages == 0 {
            return Err(ConfigError::Invalid(
                "max_history_messages must be at least 1".to_string(),
            ));
        }
        if self.backend.model.trim().is_empty() {
            return Err(ConfigError::Invalid("backend.model must not be empty".to_string()));
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "backend.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}
