//! Application configuration.
//!
//! Values come from an optional JSON file named by `TRIP_CHAT_CONFIG_PATH`
//! and from `TRIP_CHAT_*` environment variables. Environment values win.
//!
//! ```json
//! {
//!   "base_url": "http://localhost:8000",
//!   "access_token": "<bearer token>",
//!   "session_id": "<existing session>",
//!   "timeout_sec": 120,
//!   "max_retries": 2,
//!   "headers": { "x-client": "trip-chat" }
//! }
//! ```
//!
//! Every field is optional. Unknown fields are rejected and `timeout_sec`
//! must be > 0 when provided. `headers` are sent with every request and can
//! only be set from the file.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use agent_stream::url::DEFAULT_BASE_URL;
use agent_stream::ChatApiConfig;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_CONFIG_PATH: &str = "TRIP_CHAT_CONFIG_PATH";
pub const ENV_BASE_URL: &str = "TRIP_CHAT_BASE_URL";
pub const ENV_ACCESS_TOKEN: &str = "TRIP_CHAT_ACCESS_TOKEN";
pub const ENV_SESSION_ID: &str = "TRIP_CHAT_SESSION_ID";
pub const ENV_TIMEOUT_SEC: &str = "TRIP_CHAT_TIMEOUT_SEC";
pub const ENV_MAX_RETRIES: &str = "TRIP_CHAT_MAX_RETRIES";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    base_url: Option<String>,
    access_token: Option<String>,
    session_id: Option<String>,
    timeout_sec: Option<u64>,
    max_retries: Option<u32>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    pub session_id: Option<String>,
    pub timeout: Option<Duration>,
    pub max_retries: u32,
    pub headers: BTreeMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            session_id: None,
            timeout: None,
            max_retries: 0,
            headers: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load the config file (when `TRIP_CHAT_CONFIG_PATH` is set) and apply
    /// environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = match env_string_opt(ENV_CONFIG_PATH) {
            Some(path) => read_file(Path::new(&path))?,
            None => FileConfig::default(),
        };
        resolve(file, env_string_opt)
    }

    /// Load a config file without consulting the environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        resolve(read_file(path)?, |_| None)
    }

    pub fn api_config(&self) -> ChatApiConfig {
        let mut config = ChatApiConfig::new(self.base_url.clone())
            .with_max_retries(self.max_retries)
            .with_headers(self.headers.clone());
        if let Some(timeout) = self.timeout {
            config = config.with_timeout(timeout);
        }
        config
    }
}

fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve(
    file: FileConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig, ConfigError> {
    let mut config = AppConfig::default();

    if let Some(base_url) = lookup(ENV_BASE_URL).or(file.base_url) {
        config.base_url = base_url.trim().to_string();
    }
    config.access_token = lookup(ENV_ACCESS_TOKEN).or(file.access_token).and_then(non_blank);
    config.session_id = lookup(ENV_SESSION_ID).or(file.session_id).and_then(non_blank);

    let timeout_sec = match lookup(ENV_TIMEOUT_SEC) {
        Some(raw) => Some(parse_number::<u64>(ENV_TIMEOUT_SEC, &raw)?),
        None => file.timeout_sec,
    };
    if let Some(seconds) = timeout_sec {
        if seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_sec",
                value: seconds.to_string(),
                reason: "must be > 0",
            });
        }
        config.timeout = Some(Duration::from_secs(seconds));
    }

    config.headers = file.headers;
    config.max_retries = match lookup(ENV_MAX_RETRIES) {
        Some(raw) => parse_number(ENV_MAX_RETRIES, &raw)?,
        None => file.max_retries.unwrap_or(0),
    };

    Ok(config)
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason: "expected a non-negative integer",
    })
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.trim().to_string())
    }
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(non_blank)
}
