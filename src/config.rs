//! Configuration management for PPLX
//!
//! This module handles loading, parsing, validating, and saving
//! configuration from the YAML file, environment variables, and CLI overrides.
//! Precedence, lowest first: built-in defaults, config file, environment,
//! command-line flags.

use crate::cli::Cli;
use crate::error::{PplxError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory under the user's home holding config and sessions
const APP_DIR: &str = ".pplx";

/// Default chat completions endpoint
pub const DEFAULT_API_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";

/// Main configuration structure for PPLX
///
/// Top-level fields mirror the request parameters sent with every turn.
/// The API key is read from the file or environment but never written back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Perplexity API key
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Model for new conversations
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum completion tokens, 0 leaves it to the model
    #[serde(default)]
    pub max_tokens: u32,

    /// Sampling temperature, in [0, 2)
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Nucleus sampling threshold, in [0, 1]
    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// Retrieved context size (low, medium, high)
    #[serde(default = "default_search_context_size")]
    pub search_context_size: String,

    /// Search mode (web, academic)
    #[serde(default = "default_search_mode")]
    pub search_mode: String,

    /// Reasoning effort for reasoning models (low, medium, high)
    #[serde(default = "default_reasoning_effort")]
    pub reasoning_effort: String,

    /// HTTP client settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Session storage settings
    #[serde(default)]
    pub session: SessionConfig,
}

fn default_model() -> String {
    "sonar".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_top_p() -> f64 {
    0.9
}

fn default_search_context_size() -> String {
    "low".to_string()
}

fn default_search_mode() -> String {
    "web".to_string()
}

fn default_reasoning_effort() -> String {
    "medium".to_string()
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Chat completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Per-request timeout
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Retries after a failed transport attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff unit; attempt `n` waits `(n + 1) * retry_delay_ms`
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_endpoint() -> String {
    DEFAULT_API_ENDPOINT.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding one JSON file per conversation
    #[serde(default = "default_sessions_dir")]
    pub directory: PathBuf,

    /// Trailing messages sent as context on each turn
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    /// Sessions shown by `session list` without `-l`
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
}

fn default_context_window() -> usize {
    crate::context::DEFAULT_CONTEXT_WINDOW
}

fn default_list_limit() -> usize {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            directory: default_sessions_dir(),
            context_window: default_context_window(),
            list_limit: default_list_limit(),
        }
    }
}

/// `~/.pplx`, or `.pplx` relative to the working directory when no home exists
pub fn app_dir() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from(APP_DIR))
}

/// `~/.pplx/config.yaml`
pub fn default_config_path() -> PathBuf {
    app_dir().join("config.yaml")
}

/// `~/.pplx/sessions`
pub fn default_sessions_dir() -> PathBuf {
    app_dir().join("sessions")
}

impl Config {
    /// Load configuration from file, environment, and CLI
    ///
    /// Reads `--config` if given, otherwise `~/.pplx/config.yaml`. A missing
    /// default file is not an error.
    ///
    /// # Arguments
    ///
    /// * `cli` - Parsed command line, for path and overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(cli: &Cli) -> Result<Self> {
        let path = match &cli.config {
            Some(path) => PathBuf::from(path),
            None => default_config_path(),
        };

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            if cli.config.is_some() {
                tracing::warn!("Config file not found at {}, using defaults", path.display());
            } else {
                tracing::debug!("No config file at {}, using defaults", path.display());
            }
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PplxError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_yaml::from_str(&contents).map_err(|e| {
            PplxError::Config(format!(
                "Failed to parse config {}: {}",
                path.display(),
                e
            ))
            .into()
        })
    }

    fn apply_env_vars(&mut self) {
        if let Some(api_key) = non_empty_env("PPLX_API_KEY") {
            self.api_key = Some(api_key);
        }

        if let Some(model) = non_empty_env("PPLX_MODEL") {
            self.model = model;
        }

        if let Some(dir) = non_empty_env("PPLX_SESSIONS_DIR") {
            self.session.directory = PathBuf::from(dir);
        }

        if let Some(endpoint) = non_empty_env("PPLX_API_ENDPOINT") {
            self.api.endpoint = endpoint;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &Cli) {
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }

        if let Some(dir) = &cli.sessions_dir {
            self.session.directory = dir.clone();
        }

        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// Ensures all configuration values are within acceptable ranges.
    /// The API key is checked separately by [`Config::require_api_key`].
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(PplxError::Config("model cannot be empty".to_string()).into());
        }

        if !(0.0..2.0).contains(&self.temperature) {
            return Err(PplxError::Config("temperature must be between 0 and 2".to_string()).into());
        }

        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(PplxError::Config("top_p must be between 0 and 1".to_string()).into());
        }

        if self.session.context_window == 0 {
            return Err(PplxError::Config(
                "session.context_window must be greater than 0".to_string(),
            )
            .into());
        }

        if self.api.timeout_seconds == 0 {
            return Err(
                PplxError::Config("api.timeout_seconds must be greater than 0".to_string()).into(),
            );
        }

        if self.api.max_retries > 10 {
            return Err(PplxError::Config(
                "api.max_retries must be less than or equal to 10".to_string(),
            )
            .into());
        }

        Ok(())
    }

    /// The API key, or a configuration error explaining how to set it
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(PplxError::Config(
                "API key is required. Set PPLX_API_KEY environment variable or add api_key to ~/.pplx/config.yaml"
                    .to_string(),
            )
            .into()),
        }
    }

    /// Write non-secret settings to `path`, creating its directory
    ///
    /// The API key is never written.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PplxError::io("creating config directory", parent, e))?;
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml).map_err(|e| PplxError::io("writing config file", path, e))?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: 0,
            temperature: default_temperature(),
            top_p: default_top_p(),
            search_context_size: default_search_context_size(),
            search_mode: default_search_mode(),
            reasoning_effort: default_reasoning_effort(),
            api: ApiConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: [&str; 4] = [
        "PPLX_API_KEY",
        "PPLX_MODEL",
        "PPLX_SESSIONS_DIR",
        "PPLX_API_ENDPOINT",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, "sonar");
        assert_eq!(config.max_tokens, 0);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.top_p, 0.9);
        assert_eq!(config.search_context_size, "low");
        assert_eq!(config.search_mode, "web");
        assert_eq!(config.reasoning_effort, "medium");
        assert_eq!(config.api.endpoint, DEFAULT_API_ENDPOINT);
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.api.max_retries, 3);
        assert_eq!(config.session.context_window, 20);
        assert!(config.session.directory.ends_with(".pplx/sessions"));
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_temperature_range() {
        let mut config = Config::default();
        config.temperature = 2.0;
        assert!(config.validate().is_err());
        config.temperature = -0.1;
        assert!(config.validate().is_err());
        config.temperature = 1.99;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_top_p_range() {
        let mut config = Config::default();
        config.top_p = 1.0;
        assert!(config.validate().is_ok());
        config.top_p = 1.01;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_context_window() {
        let mut config = Config::default();
        config.session.context_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_max_retries_too_large() {
        let mut config = Config::default();
        config.api.max_retries = 11;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_api_key() {
        let mut config = Config::default();
        assert!(config.require_api_key().is_err());
        config.api_key = Some("  ".to_string());
        assert!(config.require_api_key().is_err());
        config.api_key = Some("pplx-abc".to_string());
        assert_eq!(config.require_api_key().unwrap(), "pplx-abc");
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
api_key: pplx-test
model: sonar-pro
max_tokens: 512
temperature: 0.7
search_mode: academic
api:
  timeout_seconds: 60
session:
  directory: /tmp/pplx-sessions
  context_window: 8
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.api_key.as_deref(), Some("pplx-test"));
        assert_eq!(config.model, "sonar-pro");
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.top_p, 0.9);
        assert_eq!(config.search_mode, "academic");
        assert_eq!(config.api.timeout_seconds, 60);
        assert_eq!(config.api.max_retries, 3);
        assert_eq!(config.session.directory, PathBuf::from("/tmp/pplx-sessions"));
        assert_eq!(config.session.context_window, 8);
        assert_eq!(config.session.list_limit, 10);
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        clear_env();
        let cli = Cli {
            config: Some("nonexistent.yaml".to_string()),
            ..Cli::default()
        };

        let config = Config::load(&cli).unwrap();
        assert_eq!(config.model, "sonar");
    }

    #[test]
    #[serial]
    fn test_load_invalid_yaml_is_error() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "model: [unclosed").unwrap();
        let cli = Cli {
            config: Some(path.to_string_lossy().into_owned()),
            ..Cli::default()
        };

        let err = Config::load(&cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PplxError>(),
            Some(PplxError::Config(_))
        ));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_and_cli_overrides_env() {
        clear_env();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "model: from-file\napi_key: file-key\n").unwrap();

        std::env::set_var("PPLX_API_KEY", "env-key");
        std::env::set_var("PPLX_MODEL", "from-env");
        std::env::set_var("PPLX_SESSIONS_DIR", "/tmp/env-sessions");
        std::env::set_var("PPLX_API_ENDPOINT", "http://localhost:9999/chat");

        let cli = Cli {
            config: Some(path.to_string_lossy().into_owned()),
            model: Some("from-cli".to_string()),
            ..Cli::default()
        };
        let config = Config::load(&cli).unwrap();
        clear_env();

        assert_eq!(config.api_key.as_deref(), Some("env-key"));
        assert_eq!(config.model, "from-cli");
        assert_eq!(config.session.directory, PathBuf::from("/tmp/env-sessions"));
        assert_eq!(config.api.endpoint, "http://localhost:9999/chat");
    }

    #[test]
    #[serial]
    fn test_empty_env_var_is_ignored() {
        clear_env();
        std::env::set_var("PPLX_MODEL", "");
        let cli = Cli {
            config: Some("nonexistent.yaml".to_string()),
            ..Cli::default()
        };
        let config = Config::load(&cli).unwrap();
        clear_env();
        assert_eq!(config.model, "sonar");
    }

    #[test]
    fn test_save_never_writes_api_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let config = Config {
            api_key: Some("secret".to_string()),
            model: "sonar-pro".to_string(),
            ..Config::default()
        };

        config.save(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("secret"));
        assert!(!written.contains("api_key"));

        let reloaded: Config = serde_yaml::from_str(&written).unwrap();
        assert_eq!(reloaded.model, "sonar-pro");
        assert!(reloaded.api_key.is_none());
    }
}
