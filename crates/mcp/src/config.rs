// Shared configuration: command line, environment and the optional TOML file

use serde::{Deserialize, Serialize};
use speckle_core::{GeometryConfig, SerializerConfig};
use speckle_sdk::{TokenConnector, DEFAULT_SERVER_URL};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SPECKLE_TOKEN environment variable is required")]
    MissingToken,

    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Connection options shared by both binaries
#[derive(clap::Args, Debug, Clone)]
pub struct SpeckleArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "speckle.toml")]
    pub config: PathBuf,

    /// Speckle personal access token
    #[arg(long, env = "SPECKLE_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Speckle server URL
    #[arg(long, env = "SPECKLE_SERVER")]
    pub server: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub speckle: SpeckleConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeckleConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Never read from the file; comes from `--token` or `SPECKLE_TOKEN`
    #[serde(skip)]
    pub token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SpeckleConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Size and depth bounds applied by the tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default)]
    pub serializer: SerializerConfig,

    #[serde(default)]
    pub geometry: GeometryConfig,

    /// Page size used when a listing tool is called without `limit`
    #[serde(default = "default_list_limit")]
    pub default_list_limit: u32,
}

fn default_list_limit() -> u32 {
    20
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            serializer: SerializerConfig::default(),
            geometry: GeometryConfig::default(),
            default_list_limit: default_list_limit(),
        }
    }
}

impl Settings {
    /// Load the TOML file at `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Configuration file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the file named by `args`, then apply the token and server overrides.
    /// Fails when no token is available from any source.
    pub fn from_args(args: &SpeckleArgs) -> Result<Self, ConfigError> {
        let mut settings = Self::load(&args.config)?;
        settings.speckle.token = args.token.clone().filter(|t| !t.trim().is_empty());
        if let Some(server) = args.server.as_ref().filter(|s| !s.trim().is_empty()) {
            settings.speckle.server_url = server.clone();
        }

        settings.token()?;
        Ok(settings)
    }

    pub fn token(&self) -> Result<&str, ConfigError> {
        self.speckle.token.as_deref().ok_or(ConfigError::MissingToken)
    }

    pub fn connector(&self) -> Result<TokenConnector, ConfigError> {
        Ok(TokenConnector::new(self.speckle.server_url.clone(), self.token()?)
            .timeout(Duration::from_secs(self.speckle.timeout_secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(config: PathBuf, token: Option<&str>, server: Option<&str>) -> SpeckleArgs {
        SpeckleArgs {
            config,
            token: token.map(String::from),
            server: server.map(String::from),
        }
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let settings = Settings::load(&temp_dir.path().join("speckle.toml")).unwrap();

        assert_eq!(settings.speckle.server_url, DEFAULT_SERVER_URL);
        assert_eq!(settings.limits.serializer.max_depth, 2);
        assert_eq!(settings.limits.serializer.truncation_width, 5);
        assert_eq!(settings.limits.geometry.max_results, 100);
        assert_eq!(settings.limits.default_list_limit, 20);
    }

    #[test]
    fn test_partial_limits_keep_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("speckle.toml");
        std::fs::write(
            &path,
            "[speckle]\nserver_url = \"https://speckle.example.com\"\n\n[limits.serializer]\nmax_depth = 4\n\n[limits.geometry]\nmax_results = 10\n",
        )
        .unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.speckle.server_url, "https://speckle.example.com");
        assert_eq!(settings.speckle.timeout_secs, 30);
        assert_eq!(settings.limits.serializer.max_depth, 4);
        assert_eq!(settings.limits.serializer.truncation_width, 5);
        assert_eq!(settings.limits.geometry.max_results, 10);
        assert_eq!(settings.limits.geometry.max_depth, 10);
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("speckle.toml");
        std::fs::write(&path, "[limits\nmax_depth = ").unwrap();

        assert!(matches!(Settings::load(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_token_is_required() {
        let temp_dir = TempDir::new().unwrap();
        let config = temp_dir.path().join("speckle.toml");

        let err = Settings::from_args(&args(config.clone(), None, None)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
        assert_eq!(err.to_string(), "SPECKLE_TOKEN environment variable is required");

        let err = Settings::from_args(&args(config, Some("  "), None)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn test_command_line_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("speckle.toml");
        std::fs::write(&path, "[speckle]\nserver_url = \"https://from-file.example.com\"\n").unwrap();

        let settings =
            Settings::from_args(&args(path, Some("tok"), Some("https://from-cli.example.com")))
                .unwrap();
        assert_eq!(settings.speckle.server_url, "https://from-cli.example.com");
        assert_eq!(settings.token().unwrap(), "tok");
    }
}
