//! Pooled relational adapter, generic over the engine dialect.
//!
//! One implementation serves PostgreSQL, MySQL and SQLite through the sqlx
//! `Any` driver; everything engine-specific comes from the
//! [`SqlEngine`](crate::db::dialect::SqlEngine) dialect table.
//!
//! Note on timeouts: no statement timeout is applied. A hung network call to
//! the database hangs the corresponding request, not the process.

use std::sync::Once;

use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use tokio::sync::OnceCell;

use crate::db::DbError;
use crate::db::adapter::ItemStore;
use crate::db::dialect::SqlEngine;
use crate::db::retry::{RetryPolicy, with_retries};
use crate::db::types::{Item, ItemId, NewItem};

static INSTALL_DRIVERS: Once = Once::new();

/// Relational adapter owning one lazily-created connection pool.
///
/// The pool is the adapter's `ConnectionHandle`: constructed on first use,
/// reused for the life of the process, never reconstructed and never
/// explicitly closed (process exit reclaims it).
pub struct SqlAdapter {
    engine: SqlEngine,
    url: String,
    pool_size: u32,
    pool: OnceCell<AnyPool>,
}

impl SqlAdapter {
    /// Create an adapter without performing any I/O.
    pub fn new(engine: SqlEngine, url: impl Into<String>, pool_size: u32) -> Self {
        Self {
            engine,
            url: url.into(),
            pool_size,
            pool: OnceCell::new(),
        }
    }

    /// Return the existing pool or construct one from configuration.
    ///
    /// Idempotent: at most one pool ever exists per adapter. Failures here
    /// are connection errors; the pool itself is not retried, only the
    /// schema initialization above it is.
    pub async fn connection(&self) -> Result<&AnyPool, DbError> {
        self.pool
            .get_or_try_init(|| async {
                INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

                AnyPoolOptions::new()
                    .max_connections(self.pool_size)
                    .connect(&self.url)
                    .await
                    .map_err(DbError::connection)
            })
            .await
    }

    fn parse_id(&self, id: &str) -> Result<i64, DbError> {
        id.parse::<i64>()
            .map_err(|_| DbError::InvalidId(id.to_string()))
    }

    fn item_from_row(row: &AnyRow) -> Result<Item, DbError> {
        Ok(Item {
            id: ItemId::Int(row.try_get::<i64, _>("id")?),
            name: row.try_get::<String, _>("name")?,
            description: row.try_get::<Option<String>, _>("description")?,
        })
    }
}

#[async_trait::async_trait]
impl ItemStore for SqlAdapter {
    fn engine_name(&self) -> &'static str {
        self.engine.url_scheme()
    }

    /// Probe the server, then create the items table if missing, retrying
    /// until the engine is ready or the policy is exhausted.
    async fn initialize(&self, policy: RetryPolicy) -> Result<(), DbError> {
        let attempts = policy.max_attempts.max(1);

        with_retries(policy, "schema-init", || async {
            let pool = self.connection().await?;
            sqlx::query(self.engine.health_probe()).execute(pool).await?;
            sqlx::query(self.engine.create_items_table())
                .execute(pool)
                .await?;
            Ok(())
        })
        .await
        .map_err(|last| DbError::InitExhausted {
            attempts,
            last: Box::new(last),
        })?;

        tracing::info!(engine = %self.engine, "items table is ready");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DbError> {
        let pool = self.connection().await?;
        sqlx::query(self.engine.health_probe()).execute(pool).await?;
        Ok(())
    }

    async fn list_items(&self) -> Result<Vec<Item>, DbError> {
        let pool = self.connection().await?;
        let rows = sqlx::query("SELECT id, name, description FROM items ORDER BY id ASC")
            .fetch_all(pool)
            .await?;

        rows.iter().map(Self::item_from_row).collect()
    }

    async fn create_item(&self, new: NewItem) -> Result<Item, DbError> {
        let pool = self.connection().await?;
        let ph = self.engine.placeholders();

        if self.engine.supports_returning() {
            let sql = format!(
                "INSERT INTO items (name, description) VALUES ({}, {}) \
                 RETURNING id, name, description",
                ph.nth(1),
                ph.nth(2)
            );
            let row = sqlx::query(&sql)
                .bind(&new.name)
                .bind(&new.description)
                .fetch_one(pool)
                .await?;
            Self::item_from_row(&row)
        } else {
            // MySQL has no RETURNING; the driver reports the assigned id.
            let sql = format!(
                "INSERT INTO items (name, description) VALUES ({}, {})",
                ph.nth(1),
                ph.nth(2)
            );
            let result = sqlx::query(&sql)
                .bind(&new.name)
                .bind(&new.description)
                .execute(pool)
                .await?;

            let id = result
                .last_insert_id()
                .ok_or_else(|| DbError::Query("driver reported no insert id".into()))?;

            Ok(Item {
                id: ItemId::Int(id),
                name: new.name,
                description: new.description,
            })
        }
    }

    async fn get_item(&self, id: &str) -> Result<Option<Item>, DbError> {
        let id = self.parse_id(id)?;
        let pool = self.connection().await?;

        let sql = format!(
            "SELECT id, name, description FROM items WHERE id = {}",
            self.engine.placeholders().nth(1)
        );
        let row = sqlx::query(&sql).bind(id).fetch_optional(pool).await?;

        row.as_ref().map(Self::item_from_row).transpose()
    }

    async fn delete_item(&self, id: &str) -> Result<bool, DbError> {
        let id = self.parse_id(id)?;
        let pool = self.connection().await?;

        let sql = format!(
            "DELETE FROM items WHERE id = {}",
            self.engine.placeholders().nth(1)
        );
        let result = sqlx::query(&sql).bind(id).execute(pool).await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    fn sqlite_adapter(pool_size: u32) -> (SqlAdapter, TempDir) {
        let dir = tempdir().unwrap();
        let url = format!(
            "sqlite:{}?mode=rwc",
            dir.path().join("test.db").display()
        );
        (SqlAdapter::new(SqlEngine::Sqlite, url, pool_size), dir)
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let (adapter, _dir) = sqlite_adapter(2);

        adapter.initialize(RetryPolicy::immediate(1)).await.unwrap();
        // Running again must not fail or alter the existing table.
        adapter.initialize(RetryPolicy::immediate(1)).await.unwrap();

        adapter.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_is_singleton() {
        let (adapter, _dir) = sqlite_adapter(2);

        let first = adapter.connection().await.unwrap();
        let second = adapter.connection().await.unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[tokio::test]
    async fn test_create_and_list_ordering() {
        let (adapter, _dir) = sqlite_adapter(2);
        adapter.initialize(RetryPolicy::immediate(1)).await.unwrap();

        let widget = adapter
            .create_item(NewItem {
                name: "Widget".into(),
                description: None,
            })
            .await
            .unwrap();
        let gadget = adapter
            .create_item(NewItem {
                name: "Gadget".into(),
                description: Some("shiny".into()),
            })
            .await
            .unwrap();

        assert_ne!(widget.id, gadget.id);
        assert_eq!(widget.description, None);

        let items = adapter.list_items().await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0], widget);
        assert_eq!(items[1], gadget);
    }

    #[tokio::test]
    async fn test_get_and_delete() {
        let (adapter, _dir) = sqlite_adapter(2);
        adapter.initialize(RetryPolicy::immediate(1)).await.unwrap();

        let item = adapter
            .create_item(NewItem {
                name: "Widget".into(),
                description: None,
            })
            .await
            .unwrap();
        let id = item.id.to_string();

        let found = adapter.get_item(&id).await.unwrap();
        assert_eq!(found, Some(item));

        assert!(adapter.delete_item(&id).await.unwrap());
        assert!(!adapter.delete_item(&id).await.unwrap());
        assert_eq!(adapter.get_item(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_invalid_id_is_rejected_without_io() {
        let (adapter, _dir) = sqlite_adapter(2);

        // No initialize: a parse failure must surface before any connection.
        match adapter.get_item("not-a-number").await {
            Err(DbError::InvalidId(id)) => assert_eq!(id, "not-a-number"),
            other => panic!("expected InvalidId, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_queries_release_pool_connections() {
        // One connection total: if a failed statement leaked its connection,
        // the follow-up queries would starve.
        let (adapter, _dir) = sqlite_adapter(1);
        adapter.initialize(RetryPolicy::immediate(1)).await.unwrap();

        let pool = adapter.connection().await.unwrap();
        let size_before = pool.size();

        for _ in 0..3 {
            let err = sqlx::query("SELECT * FROM no_such_table")
                .fetch_all(pool)
                .await;
            assert!(err.is_err());
        }

        assert_eq!(pool.size(), size_before);
        adapter.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn test_initialize_exhaustion_reports_attempts() {
        // Unreachable directory: SQLite cannot create the database file.
        let adapter = SqlAdapter::new(
            SqlEngine::Sqlite,
            "sqlite:/nonexistent-keel-dir/test.db?mode=rwc",
            1,
        );

        match adapter.initialize(RetryPolicy::immediate(3)).await {
            Err(DbError::InitExhausted { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected InitExhausted, got {other:?}"),
        }
    }
}
