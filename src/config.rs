//! Configuration management for Pulsecore
//!
//! Loads settings from TOML file at ~/.pulsecore/config.toml

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Session database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server port (default: 5003)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Server host (default: 0.0.0.0 - all interfaces)
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    5003
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Session database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file holding the sessions table, relative to the working directory
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

fn default_database_path() -> PathBuf {
    PathBuf::from("sessions.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            path: default_database_path(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = expand_path(path.as_ref());

        if !expanded_path.exists() {
            return Err(CoreError::Config(format!(
                "Configuration file not found: {}",
                expanded_path.display()
            )));
        }

        let content = std::fs::read_to_string(&expanded_path)?;
        let config: Config = toml::from_str(&content)?;

        Ok(config)
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|p| p.join(".pulsecore").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from(".pulsecore/config.toml"))
    }

    /// Get the database path, expanding ~ if present
    pub fn database_path(&self) -> PathBuf {
        expand_path(&self.database.path)
    }

    /// Get the server socket address
    pub fn server_addr(&self) -> SocketAddr {
        use std::net::ToSocketAddrs;

        format!("{}:{}", self.server.host, self.server.port)
            .to_socket_addrs()
            .ok()
            .and_then(|mut addrs| addrs.next())
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], self.server.port)))
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("PULSECORE_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PULSECORE_SERVER_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PULSECORE_SERVER_PORT: {}", port),
            }
        }
        if let Ok(path) = std::env::var("PULSECORE_DATABASE_PATH") {
            self.database.path = PathBuf::from(path);
        }
    }

    /// Create a default configuration file at the given path
    pub fn create_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let content = r#"# Pulsecore Configuration

[server]
# Port to listen on (default: 5003)
port = 5003

# Host to bind to
# "0.0.0.0" = all interfaces (default)
# "127.0.0.1" = localhost only
host = "0.0.0.0"

[database]
# SQLite file holding open sessions
path = "sessions.db"
"#;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;

        Ok(())
    }
}

/// Expand ~ to home directory in paths
pub fn expand_path(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5003);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.path, PathBuf::from("sessions.db"));
        assert_eq!(config.server_addr(), SocketAddr::from(([0, 0, 0, 0], 5003)));
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[server]
port = 9000
host = "127.0.0.1"

[database]
path = "/var/lib/pulsecore/sessions.db"
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/var/lib/pulsecore/sessions.db")
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.database.path, PathBuf::from("sessions.db"));
    }

    #[test]
    fn test_create_default_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::create_default(&path).unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.server.port, 5003);
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_default_path_is_config_toml() {
        let path = Config::default_path();
        assert!(path.ends_with(Path::new(".pulsecore").join("config.toml")));
    }

    #[test]
    fn test_expand_path_leaves_plain_paths() {
        assert_eq!(
            expand_path(Path::new("data/sessions.db")),
            PathBuf::from("data/sessions.db")
        );
    }
}
