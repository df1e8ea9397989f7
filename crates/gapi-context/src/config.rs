//! Configuration for the client stack.

use crate::logging::{LogConfig, LogFormat};
use crate::{ConfigError, ConfigResult};
use gapi_bootstrap::{
    BootstrapOptions, ClientOptions, DEFAULT_MODULE_TIMEOUT_MS, DEFAULT_READY_TIMEOUT_MS,
    DEFAULT_SCRIPT_URL,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Discovery document for the Sheets v4 API.
pub const DEFAULT_DISCOVERY_DOC: &str = "https://sheets.googleapis.com/$discovery/rest?version=v4";

/// Read-only spreadsheets scope.
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

pub const ENV_CLIENT_ID: &str = "GAPI_CLIENT_ID";
pub const ENV_API_KEY: &str = "GAPI_API_KEY";
pub const ENV_SCRIPT_URL: &str = "GAPI_SCRIPT_URL";
pub const ENV_LOG_LEVEL: &str = "GAPI_LOG_LEVEL";

/// Client stack configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Location of the library script.
    #[serde(default = "default_script_url")]
    pub script_url: String,
    /// How long to wait for the library global.
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
    /// How long the library may take to load a module.
    #[serde(default = "default_module_timeout_ms")]
    pub module_timeout_ms: u64,
    #[serde(default = "default_client")]
    pub client: ClientOptions,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_script_url() -> String {
    DEFAULT_SCRIPT_URL.to_string()
}

fn default_ready_timeout_ms() -> u64 {
    DEFAULT_READY_TIMEOUT_MS
}

fn default_module_timeout_ms() -> u64 {
    DEFAULT_MODULE_TIMEOUT_MS
}

fn default_client() -> ClientOptions {
    ClientOptions {
        client_id: String::new(),
        api_key: String::new(),
        discovery_docs: vec![DEFAULT_DISCOVERY_DOC.to_string()],
        scopes: vec![DEFAULT_SCOPE.to_string()],
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            script_url: default_script_url(),
            ready_timeout_ms: DEFAULT_READY_TIMEOUT_MS,
            module_timeout_ms: DEFAULT_MODULE_TIMEOUT_MS,
            client: default_client(),
        }
    }
}

impl Config {
    /// Create a new Config with default values, then override from environment.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.load_from_env();
        config
    }

    /// Load configuration from `path` if it exists, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let mut config = if path.exists() {
            Self::load_from_file(path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn load_from_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(client_id) = get(ENV_CLIENT_ID) {
            self.client.client_id = client_id;
        }
        if let Some(api_key) = get(ENV_API_KEY) {
            self.client.api_key = api_key;
        }
        if let Some(script_url) = get(ENV_SCRIPT_URL) {
            self.script_url = script_url;
        }
        if let Some(log_level) = get(ENV_LOG_LEVEL) {
            self.log_level = log_level;
        }
    }

    /// Get the script URL as a parsed URL.
    pub fn script_url(&self) -> ConfigResult<Url> {
        Url::parse(&self.script_url).map_err(ConfigError::from)
    }

    /// Check that credentials are present and every URL parses.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.client.client_id.trim().is_empty() {
            return Err(ConfigError::Missing("client.client_id"));
        }
        if self.client.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("client.api_key"));
        }

        self.script_url()?;
        for doc in &self.client.discovery_docs {
            Url::parse(doc)?;
        }
        Ok(())
    }

    pub fn bootstrap_options(&self) -> BootstrapOptions {
        BootstrapOptions {
            script_url: self.script_url.clone(),
            ready_timeout: Duration::from_millis(self.ready_timeout_ms),
            module_timeout: Duration::from_millis(self.module_timeout_ms),
            client: self.client.clone(),
        }
    }

    pub fn log_config(&self) -> LogConfig {
        LogConfig {
            default_level: self.log_level.clone(),
            format: self.log_format,
            ..Default::default()
        }
    }
}
