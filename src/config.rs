use crate::constants::*;
use crate::error::{AcademyError, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub admin: AdminConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file used when built with the `db` feature.
    pub database_path: PathBuf,
    /// Root of the public upload tree; course files go to `<root>/courses/<slug>/`.
    pub upload_root: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
    pub session_secret: String,
    pub session_max_age_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            upload_root: PathBuf::from(DEFAULT_UPLOAD_ROOT),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "admin".to_string(),
            session_secret: "change-me".to_string(),
            session_max_age_secs: DEFAULT_SESSION_MAX_AGE_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

impl Config {
    /// Loads `config.toml` when present, then applies environment overrides.
    pub fn load() -> Result<Self> {
        let path = env::var("ACADEMY_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = if Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            debug!("No config file at {}, using defaults", path);
            Self::default()
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            AcademyError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Overrides fields from variables such as `PORT` or `ADMIN_PASSWORD`.
    /// The lookup is injected so tests do not touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| AcademyError::Config(format!("PORT is not a valid port: {port}")))?;
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.storage.database_path = PathBuf::from(path);
        }
        if let Some(root) = lookup("UPLOAD_ROOT") {
            self.storage.upload_root = PathBuf::from(root);
        }
        if let Some(username) = lookup("ADMIN_USERNAME") {
            self.admin.username = username;
        }
        if let Some(password) = lookup("ADMIN_PASSWORD") {
            self.admin.password = password;
        }
        if let Some(secret) = lookup("SESSION_SECRET") {
            self.admin.session_secret = secret;
        }
        if let Some(dir) = lookup("LOG_DIR") {
            self.logging.directory = PathBuf::from(dir);
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
