use anyhow::{Context, anyhow};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt_secret: String,
    pub log_filter: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl Settings {
    /// Loads `.env` (if present) and reads the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {raw}"))?,
            None => 10,
        };
        let port = match lookup("APP_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("APP_PORT is not a valid port: {raw}"))?,
            None => 8080,
        };

        Ok(Self {
            database: DatabaseSettings {
                url: required("DATABASE_URL")?,
                max_connections,
            },
            application: ApplicationSettings {
                host: lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
                port,
            },
            jwt_secret: required("JWT_SECRET")?,
            log_filter: lookup("LOG_FILTER").unwrap_or_else(|| "info,sqlx=warn".to_string()),
        })
    }
}
