use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub cors_allowed_origin: String,
    pub fetch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port: u16 = match get("PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got {raw:?}"))?,
            None => 8080,
        };

        let fetch_timeout_secs: u64 = match get("SHIORI_FETCH_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| {
                    format!("SHIORI_FETCH_TIMEOUT_SECS must be whole seconds, got {raw:?}")
                })?,
            None => 10,
        };

        let cors_allowed_origin = get("CORS_ALLOWED_ORIGIN").unwrap_or_else(|| {
            warn!(
                "CORS_ALLOWED_ORIGIN is not set; allowing {} (local development only)",
                DEFAULT_CORS_ORIGIN
            );
            DEFAULT_CORS_ORIGIN.to_string()
        });

        Ok(Self {
            host: get("SHIORI_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: get("SHIORI_DB_PATH").unwrap_or_else(|| "shiori.db".into()).into(),
            cors_allowed_origin,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
        })
    }
}
