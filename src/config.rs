//! Application Configuration
//!
//! This module provides configuration management for the application,
//! supporting YAML configuration files with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use log::{info, warn};

use crate::error::SyncError;
use crate::remote::config::RemoteBackend;

/// Environment variable naming an alternative configuration file
pub const CONFIG_PATH_ENV: &str = "CONTENT_SYNC_CONFIG";

/// Environment variable overriding the configured remote backend
pub const REMOTE_BACKEND_ENV: &str = "REMOTE_BACKEND";

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Remote content store configuration
    pub remote: RemoteConfig,
    /// Destination layout inside the remote repository
    pub layout: LayoutConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Number of worker threads
    pub workers: usize,
    /// Maximum payload size in bytes
    pub max_payload_size: usize,
}

/// Remote content store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Remote backend type
    pub backend: RemoteBackend,
    /// Base URL of the hosting REST API
    pub api_base_url: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Branch every read and write targets
    pub branch: String,
    /// Name of the environment variable holding the access token
    pub token_env: String,
    /// User-Agent sent with every API request
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Repository-relative destination layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Directory holding the image slots
    pub images_dir: String,
    /// Directory holding the song slots
    pub songs_dir: String,
    /// Path of the metadata document
    pub metadata_path: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Path to log configuration file
    pub config_file: String,
}

/// Immutable connection settings resolved once at startup
#[derive(Clone, PartialEq)]
pub struct RemoteSettings {
    pub api_base_url: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub token: Option<String>,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for RemoteSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSettings")
            .field("api_base_url", &self.api_base_url)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// How a configuration was assembled
///
/// `AppConfig::load` runs before any logger exists, so it records what happened
/// here and the caller reports it once logging is initialized.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigSource {
    pub path: PathBuf,
    /// Whether the file existed, defaults are used otherwise
    pub found: bool,
    /// Value of `REMOTE_BACKEND` if set, with its parse result
    pub backend_override: Option<Result<RemoteBackend, String>>,
}

impl ConfigSource {
    pub fn log(&self) {
        if self.found {
            info!("Loaded configuration from {}", self.path.display());
        } else {
            warn!("Config file {} not found, using defaults", self.path.display());
        }
        match &self.backend_override {
            Some(Ok(backend)) => info!("Using remote backend from environment: {:?}", backend),
            Some(Err(e)) => warn!("Invalid remote backend in environment: {}. Keeping configured backend.", e),
            None => {}
        }
    }
}

impl AppConfig {
    /// Load configuration from file, use defaults if not found
    ///
    /// Nothing is logged; report the returned source after logging is set up.
    pub fn load() -> Result<(Self, ConfigSource), SyncError> {
        let path = PathBuf::from(env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string()));
        let (mut config, found) = Self::read(&path)?;
        let backend_override = config.apply_env_overrides();
        Ok((config, ConfigSource { path, found, backend_override }))
    }

    /// Load configuration from a specific file, use defaults if it does not exist
    pub fn load_from(config_path: impl AsRef<Path>) -> Result<Self, SyncError> {
        let path = config_path.as_ref();
        let (config, found) = Self::read(path)?;
        ConfigSource { path: path.to_path_buf(), found, backend_override: None }.log();
        Ok(config)
    }

    fn read(config_path: &Path) -> Result<(Self, bool), SyncError> {
        if !config_path.exists() {
            return Ok((Self::default(), false));
        }
        let content = fs::read_to_string(config_path)
            .map_err(|e| SyncError::Config(format!("cannot read {}: {}", config_path.display(), e)))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .map_err(|e| SyncError::Config(format!("cannot parse {}: {}", config_path.display(), e)))?;
        Ok((config, true))
    }

    fn apply_env_overrides(&mut self) -> Option<Result<RemoteBackend, String>> {
        let backend_str = env::var(REMOTE_BACKEND_ENV).ok()?;
        let parsed = backend_str.parse::<RemoteBackend>();
        if let Ok(backend) = parsed {
            self.remote.backend = backend;
        }
        Some(parsed)
    }

    /// Resolve the remote settings, reading the access token from the environment
    pub fn remote_settings(&self) -> Result<RemoteSettings, SyncError> {
        let token = env::var(&self.remote.token_env).ok().filter(|t| !t.trim().is_empty());
        if token.is_none() && self.remote.backend == RemoteBackend::GitHub {
            return Err(SyncError::Config(format!(
                "environment variable {} must hold an access token for the GitHub backend",
                self.remote.token_env
            )));
        }

        Ok(RemoteSettings {
            api_base_url: self.remote.api_base_url.trim_end_matches('/').to_string(),
            owner: self.remote.owner.clone(),
            repo: self.remote.repo.clone(),
            branch: self.remote.branch.clone(),
            token,
            user_agent: self.remote.user_agent.clone(),
            timeout_secs: self.remote.timeout_secs,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 9710,
                workers: 2,
                max_payload_size: 104857600, // 100MB
            },
            remote: RemoteConfig {
                backend: RemoteBackend::GitHub,
                api_base_url: "https://api.github.com".to_string(),
                owner: "10Unknownboy".to_string(),
                repo: "love-os-ogg".to_string(),
                branch: "main".to_string(),
                token_env: "GITHUB_PAT".to_string(),
                user_agent: format!("content-sync/{}", env!("CARGO_PKG_VERSION")),
                timeout_secs: 30,
            },
            layout: LayoutConfig {
                images_dir: "public/files/database/images".to_string(),
                songs_dir: "public/files/database/songs".to_string(),
                metadata_path: "public/files/database/data.json".to_string(),
            },
            logging: LoggingConfig {
                config_file: "server_log.yaml".to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load_from("/nonexistent/content-sync.yaml").unwrap();
        assert_eq!(config.remote.branch, "main");
        assert_eq!(config.layout.metadata_path, "public/files/database/data.json");
        assert_eq!(config.remote.backend, RemoteBackend::GitHub);
    }

    #[test]
    fn test_load_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut config = AppConfig::default();
        config.remote.repo = "other-site".to_string();
        config.remote.backend = RemoteBackend::Mock;
        config.server.port = 8088;
        write!(file, "{}", serde_yaml::to_string(&config).unwrap()).unwrap();

        let loaded = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(loaded.remote.repo, "other-site");
        assert_eq!(loaded.remote.backend, RemoteBackend::Mock);
        assert_eq!(loaded.server.port, 8088);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "server: [not, a, map").unwrap();
        let result = AppConfig::load_from(file.path());
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_backend_env_override() {
        env::set_var(REMOTE_BACKEND_ENV, "MOCK");
        let mut config = AppConfig::default();
        assert_eq!(config.apply_env_overrides(), Some(Ok(RemoteBackend::Mock)));
        assert_eq!(config.remote.backend, RemoteBackend::Mock);

        env::set_var(REMOTE_BACKEND_ENV, "ftp");
        let mut config = AppConfig::default();
        assert!(matches!(config.apply_env_overrides(), Some(Err(_))));
        assert_eq!(config.remote.backend, RemoteBackend::GitHub);

        env::remove_var(REMOTE_BACKEND_ENV);
        assert_eq!(AppConfig::default().apply_env_overrides(), None);
    }

    #[test]
    #[serial]
    fn test_load_reports_source_instead_of_logging() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_yaml::to_string(&AppConfig::default()).unwrap()).unwrap();
        env::set_var(CONFIG_PATH_ENV, file.path());
        env::set_var(REMOTE_BACKEND_ENV, "mock");

        let (config, source) = AppConfig::load().unwrap();
        assert_eq!(config.remote.backend, RemoteBackend::Mock);
        assert_eq!(source.path, file.path());
        assert!(source.found);
        assert_eq!(source.backend_override, Some(Ok(RemoteBackend::Mock)));

        env::set_var(CONFIG_PATH_ENV, "/nonexistent/content-sync.yaml");
        env::remove_var(REMOTE_BACKEND_ENV);
        let (_, source) = AppConfig::load().unwrap();
        assert!(!source.found);
        assert_eq!(source.backend_override, None);
        env::remove_var(CONFIG_PATH_ENV);
    }

    #[test]
    #[serial]
    fn test_github_backend_requires_token() {
        let mut config = AppConfig::default();
        config.remote.token_env = "CONTENT_SYNC_TEST_TOKEN".to_string();
        env::remove_var("CONTENT_SYNC_TEST_TOKEN");
        assert!(matches!(config.remote_settings(), Err(SyncError::Config(_))));

        env::set_var("CONTENT_SYNC_TEST_TOKEN", "ghp_secret");
        let settings = config.remote_settings().unwrap();
        assert_eq!(settings.token.as_deref(), Some("ghp_secret"));
        assert!(!format!("{:?}", settings).contains("ghp_secret"));
        env::remove_var("CONTENT_SYNC_TEST_TOKEN");

        config.remote.backend = RemoteBackend::Mock;
        assert!(config.remote_settings().unwrap().token.is_none());
    }
}
