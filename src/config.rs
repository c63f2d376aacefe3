//! Application configuration management.
//!
//! Two layers:
//!
//! - [`Settings`]: process-level knobs read from environment variables with
//!   `envy` (after loading an optional `.env` file with `dotenvy`).
//! - [`AppConfig`]: the persisted JSON configuration file holding storage
//!   credentials and the application secret. It is read once at startup; a
//!   missing or malformed file aborts the process before any request is served.

use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;
use std::path::{Path, PathBuf};

/// Process settings loaded from environment variables.
///
/// # Environment Variables
///
/// - `CONFIG_PATH` (optional): path to the JSON config file, defaults to `config/config.json`
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3000
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_config_path")]
    pub config_path: PathBuf,

    #[serde(default = "default_port")]
    pub server_port: u16,
}

fn default_config_path() -> PathBuf {
    PathBuf::from("config/config.json")
}

/// Default port if SERVER_PORT environment variable is not set.
fn default_port() -> u16 {
    3000
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// Attempts to load a `.env` file first (does nothing if not found).
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();

        envy::from_env::<Settings>()
    }
}

/// Contents of the JSON configuration file.
///
/// ```json
/// {
///   "host": "localhost",
///   "base": "cursos",
///   "usuario": "api",
///   "password": "secret",
///   "clave_credenciales": "change-me",
///   "base_path": "api"
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database host
    pub host: String,

    /// Database name
    pub base: String,

    pub usuario: String,

    pub password: String,

    #[serde(default = "default_db_port")]
    pub puerto: u16,

    /// Application secret keying the client credential derivation.
    ///
    /// Changing it invalidates every issued credential pair.
    pub clave_credenciales: String,

    /// Path segment under which the API is mounted (`/{base_path}/cursos`)
    #[serde(default = "default_base_path")]
    pub base_path: String,

    /// Root directory of student photos
    #[serde(default = "default_fotos_dir")]
    pub fotos_dir: PathBuf,

    /// Append-only photo access log
    #[serde(default = "default_log_accesos")]
    pub log_accesos: PathBuf,

    #[serde(default = "default_max_conexiones")]
    pub max_conexiones: u32,
}

fn default_db_port() -> u16 {
    5432
}

fn default_base_path() -> String {
    "api".to_string()
}

fn default_fotos_dir() -> PathBuf {
    PathBuf::from("fotos")
}

fn default_log_accesos() -> PathBuf {
    PathBuf::from("logs/acceso_fotos.log")
}

fn default_max_conexiones() -> u32 {
    5
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration file {path:?} could not be read: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("configuration file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("configuration value {0} is invalid")]
    Invalid(&'static str),
}

impl AppConfig {
    /// Read and parse the configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = serde_json::from_str(raw)?;

        if config.clave_credenciales.trim().is_empty() {
            return Err(ConfigError::Invalid("clave_credenciales"));
        }
        if config.base_path.is_empty() || config.base_path.contains('/') {
            return Err(ConfigError::Invalid("base_path"));
        }

        Ok(config)
    }

    /// Connection options for the PostgreSQL pool.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.puerto)
            .username(&self.usuario)
            .password(&self.password)
            .database(&self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "host": "db",
        "base": "cursos",
        "usuario": "api",
        "password": "pw",
        "clave_credenciales": "sal"
    }"#;

    #[test]
    fn defaults_apply() {
        let config = AppConfig::from_json(MINIMAL).unwrap();
        assert_eq!(config.puerto, 5432);
        assert_eq!(config.base_path, "api");
        assert_eq!(config.fotos_dir, PathBuf::from("fotos"));
        assert_eq!(config.max_conexiones, 5);
    }

    #[test]
    fn malformed_and_invalid_files_are_rejected() {
        assert!(matches!(
            AppConfig::from_json("{not json"),
            Err(ConfigError::Malformed(_))
        ));
        assert!(matches!(
            AppConfig::from_json(r#"{"host": "db"}"#),
            Err(ConfigError::Malformed(_))
        ));

        let blank_secret = MINIMAL.replace("\"sal\"", "\"  \"");
        assert!(matches!(
            AppConfig::from_json(&blank_secret),
            Err(ConfigError::Invalid("clave_credenciales"))
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = AppConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }
}
