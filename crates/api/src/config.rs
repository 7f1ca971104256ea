use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use axum::http::HeaderValue;
use canopy_core::search::SearchStrategy;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Time allowed for background tasks to drain on shutdown (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Public base URL used to build share links.
    pub site_url: String,
    /// Backup mirror root, when the mirror is enabled.
    pub backup_path: Option<PathBuf>,
    /// Default search strategy.
    pub search_strategy: SearchStrategy,
    /// Share access queue capacity. `0` records inline.
    pub share_access_queue: usize,
    /// Take the client IP from `X-Forwarded-For` / `X-Real-IP`.
    pub trust_proxy_headers: bool,
    /// JWT validation settings.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                 |
    /// |-------------------------|-------------------------|
    /// | `HOST`                  | `0.0.0.0`               |
    /// | `PORT`                  | `3000`                  |
    /// | `CORS_ORIGINS`          | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                    |
    /// | `SITE_URL`              | `http://localhost:3000` |
    /// | `WIKI_BACKUP_ENABLED`   | `false`                 |
    /// | `WIKI_BACKUP_PATH`      | `./backup`              |
    /// | `WIKI_SEARCH_STRATEGY`  | `substring`             |
    /// | `SHARE_ACCESS_QUEUE`    | `0`                     |
    /// | `TRUST_PROXY_HEADERS`   | `false`                 |
    pub fn from_env() -> anyhow::Result<Self> {
        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        for origin in &cors_origins {
            HeaderValue::from_str(origin)
                .with_context(|| format!("CORS_ORIGINS contains an invalid origin '{origin}'"))?;
        }

        let backup_path = parse_bool(&env_or("WIKI_BACKUP_ENABLED", "false"))
            .context("WIKI_BACKUP_ENABLED must be true or false")?
            .then(|| PathBuf::from(env_or("WIKI_BACKUP_PATH", "./backup")));

        Ok(Self {
            host: env_or("HOST", "0.0.0.0"),
            port: parse_env("PORT", "3000")?,
            cors_origins,
            request_timeout_secs: parse_env("REQUEST_TIMEOUT_SECS", "30")?,
            shutdown_timeout_secs: parse_env("SHUTDOWN_TIMEOUT_SECS", "30")?,
            site_url: env_or("SITE_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            backup_path,
            search_strategy: parse_env("WIKI_SEARCH_STRATEGY", "substring")?,
            share_access_queue: parse_env("SHARE_ACCESS_QUEUE", "0")?,
            trust_proxy_headers: parse_bool(&env_or("TRUST_PROXY_HEADERS", "false"))
                .context("TRUST_PROXY_HEADERS must be true or false")?,
            jwt: JwtConfig::from_env()?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse `key` (or `default`) into `T`, naming the variable on failure.
fn parse_env<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = env_or(key, default);
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value '{raw}'"))
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("unrecognized boolean '{other}'"),
    }
}
