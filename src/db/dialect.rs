//! Per-engine SQL dialect table.
//!
//! The relational adapters share one contract; the only divergence between
//! engines is the table-creation DDL, the parameter placeholder syntax, and
//! how an insert reports the assigned id. Those differences live here so the
//! adapter itself is written once.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Supported relational engines.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SqlEngine {
    /// PostgreSQL: ordinal placeholders, SERIAL-family ids, RETURNING.
    Postgres,
    /// MySQL: positional placeholders, AUTO_INCREMENT ids, last_insert_id.
    Mysql,
    /// SQLite: positional placeholders, rowid-backed ids, RETURNING.
    Sqlite,
}

/// Placeholder syntax for prepared statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholders {
    /// `$1, $2, ...`
    Ordinal,
    /// `?, ?, ...`
    Positional,
}

impl Placeholders {
    /// Render the placeholder for 1-based parameter `n`.
    pub fn nth(&self, n: usize) -> String {
        match self {
            Self::Ordinal => format!("${n}"),
            Self::Positional => "?".to_string(),
        }
    }
}

impl SqlEngine {
    /// Placeholder style used by this engine's driver.
    pub fn placeholders(&self) -> Placeholders {
        match self {
            Self::Postgres => Placeholders::Ordinal,
            Self::Mysql | Self::Sqlite => Placeholders::Positional,
        }
    }

    /// Idempotent DDL for the items table. Never destructive, never altered
    /// once present.
    pub fn create_items_table(&self) -> &'static str {
        match self {
            Self::Postgres => {
                "CREATE TABLE IF NOT EXISTS items (
                    id BIGSERIAL PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT
                )"
            }
            Self::Mysql => {
                "CREATE TABLE IF NOT EXISTS items (
                    id BIGINT AUTO_INCREMENT PRIMARY KEY,
                    name VARCHAR(200) NOT NULL,
                    description TEXT NULL
                )"
            }
            Self::Sqlite => {
                "CREATE TABLE IF NOT EXISTS items (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    description TEXT
                )"
            }
        }
    }

    /// Cheapest possible round-trip statement for health checks.
    pub fn health_probe(&self) -> &'static str {
        "SELECT 1"
    }

    /// Whether `INSERT .. RETURNING` is available. MySQL reports the
    /// assigned id through `last_insert_id` instead.
    pub fn supports_returning(&self) -> bool {
        !matches!(self, Self::Mysql)
    }

    /// URL scheme understood by the sqlx Any driver.
    pub fn url_scheme(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
            Self::Sqlite => "sqlite",
        }
    }

    /// Default server port for local-development fallbacks.
    pub fn default_port(&self) -> u16 {
        match self {
            Self::Postgres => 5432,
            Self::Mysql => 3306,
            // SQLite is file-backed; the port is never used.
            Self::Sqlite => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_engine_from_str() {
        assert_eq!(SqlEngine::from_str("postgres").unwrap(), SqlEngine::Postgres);
        assert_eq!(SqlEngine::from_str("MySQL").unwrap(), SqlEngine::Mysql);
        assert_eq!(SqlEngine::from_str("sqlite").unwrap(), SqlEngine::Sqlite);
        assert!(SqlEngine::from_str("oracle").is_err());
    }

    #[test]
    fn test_placeholder_rendering() {
        assert_eq!(Placeholders::Ordinal.nth(1), "$1");
        assert_eq!(Placeholders::Ordinal.nth(2), "$2");
        assert_eq!(Placeholders::Positional.nth(1), "?");
        assert_eq!(Placeholders::Positional.nth(5), "?");
    }

    #[test]
    fn test_dialect_divergence() {
        assert!(SqlEngine::Postgres.create_items_table().contains("BIGSERIAL"));
        assert!(SqlEngine::Mysql.create_items_table().contains("AUTO_INCREMENT"));
        assert!(SqlEngine::Sqlite.create_items_table().contains("AUTOINCREMENT"));

        assert!(SqlEngine::Postgres.supports_returning());
        assert!(!SqlEngine::Mysql.supports_returning());
        assert!(SqlEngine::Sqlite.supports_returning());
    }
}
