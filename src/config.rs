use std::{env, path::PathBuf, time::Duration};

use crate::error::ConfigError;

/// Fallback API address used when running locally without `API_URL`.
pub const LOCAL_API_URL: &str = "http://localhost:3000";

/// Default file backing the persistent key/value store.
pub const DEFAULT_STORAGE_PATH: &str = ".portal-storage.json";

/// ClientConfig
///
/// Holds the client's entire configuration state. It is loaded once at startup and
/// cloned into the `Portal` context, so every component sees the same API address and
/// storage location for the lifetime of the process.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    // Base URL of the remote API, without a trailing slash.
    pub api_url: String,
    // Location of the JSON file that stands in for browser local storage.
    pub storage_path: PathBuf,
    // Optional per-request timeout. None means requests may wait indefinitely.
    pub request_timeout: Option<Duration>,
    // Runtime environment marker. Selects log format and fail-fast rules.
    pub env: Env,
}

/// Env
///
/// Defines the runtime context: a developer machine talking to a local API, or a
/// deployed client pointed at the production API.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for ClientConfig {
    /// Provides a local configuration that never touches the environment, used for
    /// test scaffolding.
    fn default() -> Self {
        Self {
            api_url: LOCAL_API_URL.to_string(),
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            request_timeout: None,
            env: Env::Local,
        }
    }
}

impl ClientConfig {
    /// load
    ///
    /// Reads every parameter from environment variables. Production requires an explicit
    /// `API_URL`; a missing value is reported instead of silently pointing the client at
    /// localhost.
    ///
    /// # Errors
    /// Returns `ConfigError::Missing` when a variable required for the current environment
    /// is unset, and `ConfigError::Invalid` when a value cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let api_url = match env {
            Env::Production => env::var("API_URL").map_err(|_| ConfigError::Missing("API_URL"))?,
            Env::Local => env::var("API_URL").unwrap_or_else(|_| LOCAL_API_URL.to_string()),
        };

        let storage_path = env::var("STORAGE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORAGE_PATH));

        let request_timeout = match env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::Invalid {
                    key: "REQUEST_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            storage_path,
            request_timeout,
            env,
        })
    }
}
