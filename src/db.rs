//! Data Layer
//!
//! One uniform persistence contract across structurally different backends:
//! - [`SqlAdapter`]: pooled relational adapter, dialect-driven (Postgres, MySQL, SQLite)
//! - [`DocumentAdapter`]: single-client MongoDB adapter
//! - [`DbRuntime`] / [`DbPhase`]: optional-adapter composition and graceful degradation
//! - [`RetryPolicy`]: bounded, fixed-delay retry around schema initialization

pub mod adapter;
pub mod dialect;
pub mod document;
mod error;
pub mod relational;
pub mod retry;
mod runtime;
mod types;

pub use adapter::ItemStore;
pub use dialect::SqlEngine;
pub use document::DocumentAdapter;
pub use error::DbError;
pub use relational::SqlAdapter;
pub use retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY, RetryPolicy};
pub use runtime::{DbPhase, DbRuntime};
pub use types::{Item, ItemId, NewItem};
