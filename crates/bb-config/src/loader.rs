//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError, StoreBackend};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "bankbook.toml",
    "./config/config.toml",
    "/etc/bankbook/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        self.apply_env_overrides(&mut config);
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file(&self) -> Option<PathBuf> {
        // Explicit path wins
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Ok(path) = env::var("BANKBOOK_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        for path in CONFIG_PATHS {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&self, config: &mut AppConfig) {
        // HTTP
        if let Ok(val) = env::var("BANKBOOK_HTTP_PORT") {
            if let Ok(port) = val.parse() {
                config.http.port = port;
            }
        }
        if let Ok(val) = env::var("BANKBOOK_HTTP_HOST") {
            config.http.host = val;
        }
        if let Ok(val) = env::var("BANKBOOK_CORS_ORIGINS") {
            config.http.cors_origins = val.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Store backend
        if let Ok(val) = env::var("BANKBOOK_STORE_BACKEND") {
            match val.to_lowercase().as_str() {
                "mongo" => config.store.backend = StoreBackend::Mongo,
                "mysql" => config.store.backend = StoreBackend::Mysql,
                "memory" => config.store.backend = StoreBackend::Memory,
                _ => {}
            }
        }

        // MongoDB
        if let Ok(val) = env::var("BANKBOOK_MONGODB_URI") {
            config.mongodb.uri = val;
        }
        if let Ok(val) = env::var("BANKBOOK_MONGODB_DATABASE") {
            config.mongodb.database = val;
        }

        // MySQL
        if let Ok(val) = env::var("BANKBOOK_MYSQL_URL") {
            config.mysql.url = val;
        }
        if let Ok(val) = env::var("BANKBOOK_MYSQL_MAX_CONNECTIONS") {
            if let Ok(n) = val.parse() {
                config.mysql.max_connections = n;
            }
        }

        // General
        if let Ok(val) = env::var("BANKBOOK_DEV_MODE") {
            config.dev_mode = val.parse().unwrap_or(false);
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
