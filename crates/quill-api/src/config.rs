use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "dev-secret-change-me", "secret"];

/// Signing material and validity window for credentials.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            token_ttl: chrono::Duration::days(7),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub auth: AuthConfig,
}

impl Config {
    /// Reads `QUILL_*` variables. Call after `.env` has been loaded.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("QUILL_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("QUILL_JWT_SECRET is unset or still a placeholder");
        }

        let host = std::env::var("QUILL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("QUILL_PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .context("QUILL_PORT is not a port number")?;
        let db_path: PathBuf = std::env::var("QUILL_DB_PATH")
            .unwrap_or_else(|_| "quill.db".into())
            .into();
        let ttl_days: i64 = std::env::var("QUILL_TOKEN_TTL_DAYS")
            .ok()
            .map(|v| v.parse())
            .transpose()
            .context("QUILL_TOKEN_TTL_DAYS is not a whole number")?
            .unwrap_or(7);
        if ttl_days <= 0 {
            bail!("QUILL_TOKEN_TTL_DAYS must be positive");
        }

        Ok(Self {
            host,
            port,
            db_path,
            auth: AuthConfig {
                jwt_secret,
                token_ttl: chrono::Duration::days(ttl_days),
            },
        })
    }
}
