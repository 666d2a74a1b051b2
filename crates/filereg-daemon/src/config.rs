//! Configuration file management.

use std::fmt;
use std::path::{Path, PathBuf};

use filereg_crypto::shared_secret::ServerSecret;
use serde::{Deserialize, Serialize};

/// Environment variable overriding the configured shared secret.
pub const SECRET_ENV: &str = "FILEREG_SECRET_KEY";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "FILEREG_DATA_DIR";

/// Complete daemon configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Shared-secret authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
}

/// Authentication configuration.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Shared secret used to verify `_user` tokens. Must be non-empty.
    #[serde(default)]
    pub secret_key: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from the default config file location.
    ///
    /// Falls back to defaults if the file does not exist. The secret may be
    /// overridden from the environment.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            Self::default()
        };
        if let Ok(secret) = std::env::var(SECRET_ENV) {
            config.auth.secret_key = secret;
        }
        Ok(config)
    }

    /// Parse a config file.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// The configured shared secret. An empty secret is a startup error.
    pub fn server_secret(&self) -> anyhow::Result<ServerSecret> {
        ServerSecret::new(self.auth.secret_key.clone()).map_err(|e| {
            anyhow::anyhow!("{e}; set [auth] secret_key or {SECRET_ENV}")
        })
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.storage.data_dir.is_empty() {
            Self::default_data_dir()
        } else {
            PathBuf::from(&self.storage.data_dir)
        }
    }

    /// Get the config file path.
    fn config_path() -> PathBuf {
        Self::default_data_dir().join("config.toml")
    }

    /// Platform-specific default data directory.
    fn default_data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        #[cfg(target_os = "macos")]
        {
            dirs_fallback("Library/Application Support/filereg")
        }
        #[cfg(not(target_os = "macos"))]
        {
            dirs_fallback(".filereg")
        }
    }
}

/// Fallback home directory resolution.
fn dirs_fallback(subpath: &str) -> PathBuf {
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(subpath))
        .unwrap_or_else(|_| PathBuf::from("/tmp/filereg"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8000");
        assert_eq!(config.logging.log_level, "info");
        assert!(config.auth.secret_key.is_empty());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(DaemonConfig::default().server_secret().is_err());
    }

    #[test]
    fn test_parse_partial_file() {
        let config: DaemonConfig = toml::from_str(
            r#"
            [auth]
            secret_key = "gubbish"

            [storage]
            data_dir = "/var/lib/filereg"
            "#,
        )
        .expect("parse");
        assert_eq!(config.data_dir(), PathBuf::from("/var/lib/filereg"));
        assert_eq!(config.server.listen_addr, "127.0.0.1:8000");
        assert!(config.server_secret().is_ok());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let mut config = DaemonConfig::default();
        config.auth.secret_key = "gubbish".to_string();
        assert!(!format!("{config:?}").contains("gubbish"));
    }

    #[test]
    fn test_config_serialization() {
        let config = DaemonConfig::default();
        let toml_str = toml::to_string(&config).expect("serialize");
        let _parsed: DaemonConfig = toml::from_str(&toml_str).expect("parse");
    }
}
