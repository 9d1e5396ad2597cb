//! Runtime configuration read from the environment.
//!
//! Two groups of settings live here:
//!
//! - [`DatabaseSettings`]: the `POSTGRES_*` / `DB_*` variables shared with the
//!   database container, composed into a connection URL unless `DATABASE_URL`
//!   overrides it.
//! - [`ServerConfig`]: bind address, static asset directories and page size.

use std::net::SocketAddr;
use std::path::PathBuf;

use url::Url;

use crate::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

/// Connection parameters shared with the `db` container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub name: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            name: "b2b_wallet_db".to_string(),
            user: "b2b_user".to_string(),
            password: "b2b_password".to_string(),
            host: "db".to_string(),
            port: 5432,
        }
    }
}

impl DatabaseSettings {
    /// Read `POSTGRES_DB`, `POSTGRES_USER`, `POSTGRES_PASSWORD`, `DB_HOST` and
    /// `DB_PORT`, falling back to the compose defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: env_or("POSTGRES_DB", defaults.name),
            user: env_or("POSTGRES_USER", defaults.user),
            password: env_or("POSTGRES_PASSWORD", defaults.password),
            host: env_or("DB_HOST", defaults.host),
            port: std::env::var("DB_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(defaults.port),
        }
    }

    /// Compose a `postgres://` URL. Credentials are percent-encoded.
    pub fn url(&self) -> Result<String, String> {
        let mut url = Url::parse("postgres://localhost")
            .map_err(|e| format!("Invalid base database URL: {}", e))?;
        url.set_host(Some(&self.host))
            .map_err(|e| format!("Invalid DB_HOST '{}': {}", self.host, e))?;
        url.set_port(Some(self.port))
            .map_err(|_| format!("Invalid DB_PORT '{}'", self.port))?;
        url.set_username(&self.user)
            .map_err(|_| format!("Invalid POSTGRES_USER '{}'", self.user))?;
        url.set_password(Some(&self.password))
            .map_err(|_| "Invalid POSTGRES_PASSWORD".to_string())?;
        url.set_path(&self.name);
        Ok(url.to_string())
    }
}

/// Whether the environment points at a Postgres database at all.
pub fn database_configured() -> bool {
    ["DATABASE_URL", "PG_DATABASE_URL", "POSTGRES_DB"]
        .iter()
        .any(|name| std::env::var(name).is_ok())
}

/// Resolve the database URL: `DATABASE_URL`, then `PG_DATABASE_URL`, then the
/// URL composed from [`DatabaseSettings::from_env`].
pub fn database_url_from_env() -> Result<String, String> {
    if let Ok(url) = std::env::var("DATABASE_URL").or_else(|_| std::env::var("PG_DATABASE_URL")) {
        return Ok(url);
    }
    DatabaseSettings::from_env().url()
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Directory served under `/static` and populated by `collectstatic`
    pub static_root: PathBuf,
    /// Directory `collectstatic` copies from
    pub static_source: PathBuf,
    pub page_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            static_root: PathBuf::from("staticfiles"),
            static_source: PathBuf::from("static"),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Read `HOST`, `PORT`, `STATIC_ROOT`, `STATIC_SOURCE_DIR` and `PAGE_SIZE`.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let host = env_or("HOST", defaults.bind.ip().to_string());
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("Invalid PORT '{}': {}", raw, e))?,
            Err(_) => defaults.bind.port(),
        };
        let bind: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid HOST '{}': {}", host, e))?;

        let page_size = std::env::var("PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v >= 1)
            .map(|v| v.min(MAX_PAGE_SIZE))
            .unwrap_or(defaults.page_size);

        Ok(Self {
            bind,
            static_root: std::env::var("STATIC_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_root),
            static_source: std::env::var("STATIC_SOURCE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_source),
            page_size,
        })
    }
}

fn env_or(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_default_url() {
        let url = DatabaseSettings::default().url().unwrap();
        assert_eq!(url, "postgres://b2b_user:b2b_password@db:5432/b2b_wallet_db");
    }

    #[test]
    fn test_url_encodes_credentials() {
        let settings = DatabaseSettings {
            password: "p@ss/word".to_string(),
            ..Default::default()
        };
        let url = settings.url().unwrap();
        assert!(url.contains("p%40ss%2Fword@db:5432"), "{}", url);
    }

    #[test]
    fn test_server_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind.port(), 8000);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.static_root, PathBuf::from("staticfiles"));
    }
}
