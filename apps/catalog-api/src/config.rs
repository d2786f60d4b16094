use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_or_default, server::ServerConfig};
use database::postgres::PostgresConfig;
use std::str::FromStr;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Where catalog records live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

impl FromStr for StorageKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(ConfigError::ParseError {
                key: "CATALOG_STORAGE".to_string(),
                details: format!("unknown storage '{}', expected 'postgres' or 'memory'", other),
            }),
        }
    }
}

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    /// `None` when running on the in-memory repository
    pub database: Option<PostgresConfig>,
    pub server: ServerConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080

        let database = match env_or_default("CATALOG_STORAGE", "postgres").parse::<StorageKind>()? {
            StorageKind::Postgres => Some(PostgresConfig::from_env()?), // DATABASE_URL required
            StorageKind::Memory => None,
        };

        Ok(Self {
            app: app_info!(),
            database,
            server,
            environment,
        })
    }
}
