//! Keel - Generated API Backend Core
//!
//! The persistence core of a scaffolded backend: one uniform data-layer
//! contract regardless of which database addon was selected at generation
//! time, plus the host composition that tolerates the addon being absent.
//!
//! # Architecture
//!
//! - **Adapters**: pooled relational (Postgres, MySQL, SQLite through one
//!   dialect-driven implementation) and single-client document store (MongoDB)
//! - **Retry**: bounded, fixed-delay retry around schema initialization,
//!   tuned for container-orchestration startup races
//! - **Host**: Axum HTTP server that binds immediately and degrades
//!   gracefully when the data layer is missing or never comes up

pub mod config;
pub mod db;
pub mod server;

pub use config::{ConfigError, DatabaseConfig, ServerConfig};
pub use db::{DbPhase, DbRuntime, Item, ItemStore, RetryPolicy};
