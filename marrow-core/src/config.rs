//! Database connection configuration

use serde::{Deserialize, Serialize};

/// Database engine kinds a configuration may name
///
/// Only [`Engine::Sqlite`] is currently backed by an adapter; resolving a
/// configuration for any other kind fails with an unsupported
/// configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    Sqlite,
    Mysql,
    MariaDb,
    Postgres,
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Engine::Sqlite => write!(f, "sqlite"),
            Engine::Mysql => write!(f, "mysql"),
            Engine::MariaDb => write!(f, "mariadb"),
            Engine::Postgres => write!(f, "postgres"),
        }
    }
}

/// Everything needed to open a database session
///
/// For SQLite only `engine` and `database` (a file path or `:memory:`)
/// matter. The remaining fields describe a full network connection and a
/// `url` that overrides them, for engines served by future adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub engine: Engine,
    pub database: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl DatabaseConfig {
    /// Configuration for a SQLite database at the given path
    pub fn sqlite(database: impl Into<String>) -> Self {
        Self {
            engine: Engine::Sqlite,
            database: database.into(),
            host: None,
            port: None,
            username: None,
            password: None,
            url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_config() {
        let config = DatabaseConfig::sqlite("development.db");
        assert_eq!(config.engine, Engine::Sqlite);
        assert_eq!(config.database, "development.db");
        assert!(config.host.is_none());
    }

    #[test]
    fn test_engine_display() {
        assert_eq!(Engine::Sqlite.to_string(), "sqlite");
        assert_eq!(Engine::MariaDb.to_string(), "mariadb");
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: DatabaseConfig =
            serde_json::from_str(r#"{"engine": "sqlite", "database": "app.db"}"#).unwrap();
        assert_eq!(config.engine, Engine::Sqlite);
        assert_eq!(config.database, "app.db");
        assert!(config.url.is_none());
    }

    #[test]
    fn test_engine_deserializes_lowercase() {
        let engine: Engine = serde_json::from_str(r#""postgres""#).unwrap();
        assert_eq!(engine, Engine::Postgres);
    }
}
