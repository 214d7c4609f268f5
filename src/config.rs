//! Configuration management for chatline
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChatlineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for chatline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the chat backend lives and how to talk to it
    #[serde(default)]
    pub backend: BackendConfig,
    /// Session list pagination and scrolling
    #[serde(default)]
    pub sessions: SessionsConfig,
    /// Interactive chat settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the chat backend, without a trailing path
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout applied by the HTTP client (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_user_agent() -> String {
    format!("chatline/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

/// Session list configuration
///
/// Scroll distances are measured in abstract units. The terminal browser
/// converts rows to units with `line_height`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Number of sessions requested per page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Remaining distance to the bottom below which the next page loads
    #[serde(default = "default_scroll_threshold")]
    pub scroll_threshold: f64,

    /// Units per terminal row
    #[serde(default = "default_line_height")]
    pub line_height: f64,

    /// Rows shown at once by the session browser
    #[serde(default = "default_viewport_lines")]
    pub viewport_lines: usize,
}

fn default_page_size() -> usize {
    10
}

fn default_scroll_threshold() -> f64 {
    200.0
}

fn default_line_height() -> f64 {
    20.0
}

fn default_viewport_lines() -> usize {
    20
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            scroll_threshold: default_scroll_threshold(),
            line_height: default_line_height(),
            viewport_lines: default_viewport_lines(),
        }
    }
}

/// Largest page size the backend is asked for
pub const MAX_PAGE_SIZE: usize = 100;

impl SessionsConfig {
    /// Page size for one command: the override if given, else the configured
    /// value
    ///
    /// # Errors
    ///
    /// Returns `ChatlineError::Config` if the result is outside
    /// `1..=MAX_PAGE_SIZE`
    pub fn effective_page_size(&self, page_size: Option<usize>) -> Result<usize> {
        let size = page_size.unwrap_or(self.page_size);
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(ChatlineError::Config(format!(
                "sessions.page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, size
            ))
            .into());
        }
        Ok(size)
    }
}

/// Interactive chat configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Readline history file; defaults to the platform data directory
    #[serde(default)]
    pub history_file: Option<PathBuf>,
}

impl ChatConfig {
    /// Resolve the readline history path, if one can be determined
    pub fn history_path(&self) -> Option<PathBuf> {
        self.history_file.clone().or_else(|| {
            directories::ProjectDirs::from("", "", "chatline")
                .map(|dirs| dirs.data_dir().join("history.txt"))
        })
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatlineError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatlineError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("CHATLINE_BASE_URL") {
            self.backend.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("CHATLINE_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.backend.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid CHATLINE_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(page_size) = std::env::var("CHATLINE_PAGE_SIZE") {
            match page_size.parse::<usize>() {
                Ok(v) => {
                    self.sessions.page_size = v;
                    tracing::debug!(page_size = v, "Env override: CHATLINE_PAGE_SIZE");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for CHATLINE_PAGE_SIZE: {}", page_size);
                }
            }
        }

        if let Ok(threshold) = std::env::var("CHATLINE_SCROLL_THRESHOLD") {
            match threshold.parse::<f64>() {
                Ok(v) => {
                    self.sessions.scroll_threshold = v;
                    tracing::debug!(threshold = v, "Env override: CHATLINE_SCROLL_THRESHOLD");
                }
                Err(_) => {
                    tracing::warn!("Invalid value for CHATLINE_SCROLL_THRESHOLD: {}", threshold);
                }
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(base_url) = &cli.base_url {
            tracing::debug!("Base URL override from CLI: {}", base_url);
            self.backend.base_url = base_url.clone();
        }
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns a `ChatlineError::Config` naming the first invalid field
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.backend.base_url).map_err(|e| {
            ChatlineError::Config(format!(
                "backend.base_url is not a valid URL ({}): {}",
                self.backend.base_url, e
            ))
        })?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(ChatlineError::Config(format!(
                "backend.base_url must use http or https, got: {}",
                parsed.scheme()
            ))
            .into());
        }

        if self.backend.timeout_seconds == 0 {
            return Err(ChatlineError::Config(
                "backend.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        self.sessions.effective_page_size(None)?;

        if !self.sessions.scroll_threshold.is_finite() || self.sessions.scroll_threshold < 0.0 {
            return Err(ChatlineError::Config(
                "sessions.scroll_threshold must be a non-negative number".to_string(),
            )
            .into());
        }

        if !self.sessions.line_height.is_finite() || self.sessions.line_height <= 0.0 {
            return Err(ChatlineError::Config(
                "sessions.line_height must be greater than 0".to_string(),
            )
            .into());
        }

        if self.sessions.viewport_lines == 0 {
            return Err(ChatlineError::Config(
                "sessions.viewport_lines must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "CHATLINE_BASE_URL",
            "CHATLINE_TIMEOUT_SECONDS",
            "CHATLINE_PAGE_SIZE",
            "CHATLINE_SCROLL_THRESHOLD",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.sessions.page_size, 10);
        assert_eq!(config.sessions.scroll_threshold, 200.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_page_size() {
        let mut config = Config::default();
        config.sessions.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_page_size_too_large() {
        let mut config = Config::default();
        config.sessions.page_size = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_page_size_override_checked_against_range() {
        let sessions = SessionsConfig::default();
        assert_eq!(sessions.effective_page_size(None).unwrap(), 10);
        assert_eq!(sessions.effective_page_size(Some(100)).unwrap(), 100);
        let err = sessions.effective_page_size(Some(500)).unwrap_err();
        assert!(err.to_string().contains("between 1 and 100"));
        assert!(sessions.effective_page_size(Some(0)).is_err());
    }

    #[test]
    fn test_config_validation_bad_url() {
        let mut config = Config::default();
        config.backend.base_url = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("backend.base_url"));

        config.backend.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.backend.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_negative_threshold() {
        let mut config = Config::default();
        config.sessions.scroll_threshold = -1.0;
        assert!(config.validate().is_err());
        config.sessions.scroll_threshold = 0.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
backend:
  base_url: http://localhost:9000
  timeout_seconds: 5
sessions:
  page_size: 25
  viewport_lines: 30
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.backend.base_url, "http://localhost:9000");
        assert_eq!(config.backend.timeout_seconds, 5);
        assert_eq!(config.sessions.page_size, 25);
        assert_eq!(config.sessions.viewport_lines, 30);
        assert_eq!(config.sessions.scroll_threshold, 200.0);
        assert!(config.chat.history_file.is_none());
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        clear_env();
        let cli = Cli::try_parse_from(["chatline", "sessions"]).unwrap();
        let config = Config::load("/nonexistent/chatline.yaml", &cli).unwrap();
        assert_eq!(config.sessions.page_size, 10);
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("CHATLINE_BASE_URL", "http://backend:8080");
        std::env::set_var("CHATLINE_PAGE_SIZE", "20");
        std::env::set_var("CHATLINE_SCROLL_THRESHOLD", "not-a-number");

        let cli = Cli::try_parse_from(["chatline", "sessions"]).unwrap();
        let config = Config::load("/nonexistent/chatline.yaml", &cli).unwrap();
        clear_env();

        assert_eq!(config.backend.base_url, "http://backend:8080");
        assert_eq!(config.sessions.page_size, 20);
        assert_eq!(config.sessions.scroll_threshold, 200.0);
    }

    #[test]
    #[serial]
    fn test_cli_base_url_wins_over_env() {
        clear_env();
        std::env::set_var("CHATLINE_BASE_URL", "http://from-env:1");

        let cli = Cli::try_parse_from([
            "chatline",
            "--base-url",
            "http://from-cli:2",
            "sessions",
        ])
        .unwrap();
        let config = Config::load("/nonexistent/chatline.yaml", &cli).unwrap();
        clear_env();

        assert_eq!(config.backend.base_url, "http://from-cli:2");
    }

    #[test]
    fn test_history_path_prefers_explicit_file() {
        let chat = ChatConfig {
            history_file: Some(PathBuf::from("/tmp/h.txt")),
        };
        assert_eq!(chat.history_path(), Some(PathBuf::from("/tmp/h.txt")));
    }
}
