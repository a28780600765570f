//! The uniform adapter contract every generated backend exposes, regardless
//! of which database engine was baked in at generation time.
//!
//! Lifecycle: construct (no I/O) → `initialize` once at startup (retried, may
//! fail without killing the host) → per-request `health_check` / item
//! operations. Connections are created lazily on first use, reused for the
//! life of the process, and never explicitly closed.

use async_trait::async_trait;

use crate::db::retry::RetryPolicy;
use crate::db::types::{Item, NewItem};
use crate::db::DbError;

/// Uniform persistence contract across structurally different backends
/// (pooled relational engines, single-client document store).
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Engine name for logs and diagnostics.
    fn engine_name(&self) -> &'static str;

    /// Ensure the minimal schema exists, retrying until the backing store is
    /// ready or the policy is exhausted.
    ///
    /// Called exactly once at process startup. Failure after exhaustion is
    /// fatal for the data subsystem only; the host keeps serving.
    async fn initialize(&self, policy: RetryPolicy) -> Result<(), DbError>;

    /// Cheapest possible round trip. No retry, no mutation; a single failure
    /// is reported immediately.
    async fn health_check(&self) -> Result<(), DbError>;

    /// All items, ordered ascending by identifier.
    async fn list_items(&self) -> Result<Vec<Item>, DbError>;

    /// Insert an item; the backing store assigns the identifier.
    async fn create_item(&self, new: NewItem) -> Result<Item, DbError>;

    /// Fetch one item by id. `Ok(None)` when absent; `Err(InvalidId)` when
    /// the id does not parse for this engine.
    async fn get_item(&self, id: &str) -> Result<Option<Item>, DbError>;

    /// Delete one item by id. Returns whether a record was removed.
    async fn delete_item(&self, id: &str) -> Result<bool, DbError>;
}
