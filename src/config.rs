use std::str::FromStr;

use anyhow::Context;

/// Which [`crate::users::UserStore`] backend the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => anyhow::bail!("unknown USER_STORE {other:?}, expected postgres or memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let store = match var("USER_STORE") {
            Some(v) => v.parse()?,
            None => StoreBackend::Postgres,
        };

        let database_url = var("DATABASE_URL");
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when USER_STORE=postgres");
        }

        let max_connections = var("DB_MAX_CONNECTIONS")
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);
        let host = var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match var("APP_PORT") {
            Some(v) => v.parse().with_context(|| format!("invalid APP_PORT {v:?}"))?,
            None => 8080,
        };

        Ok(Self {
            store,
            database_url,
            max_connections,
            host,
            port,
        })
    }

    /// In-memory configuration used by tests and local runs without a database.
    pub fn memory() -> Self {
        Self {
            store: StoreBackend::Memory,
            database_url: None,
            max_connections: 10,
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_to_postgres_and_requires_database_url() {
        let err = AppConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));

        let cfg = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://x/y")])).unwrap();
        assert_eq!(cfg.store, StoreBackend::Postgres);
        assert_eq!(cfg.max_connections, 10);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn memory_backend_needs_no_database() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("USER_STORE", "Memory"),
            ("APP_PORT", "3000"),
            ("DB_MAX_CONNECTIONS", "4"),
        ]))
        .unwrap();
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.max_connections, 4);
    }

    #[test]
    fn rejects_unknown_backend_and_bad_port() {
        assert!(AppConfig::from_lookup(lookup(&[("USER_STORE", "redis")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[
            ("USER_STORE", "memory"),
            ("APP_PORT", "eighty"),
        ]))
        .is_err());
    }
}
