//! Host-side composition of the optional data layer.
//!
//! The capability is decided once at startup from configuration: either no
//! adapter (in-memory-only build) or exactly one adapter variant. Route
//! mounting observes that capability; startup initialization runs as a
//! supervised task whose outcome lands in an explicit, observable phase
//! instead of a logged side effect. The phase records the startup outcome
//! and guards against re-initialization; per-request health and data calls
//! deliberately bypass it and surface their own errors, so a late-arriving
//! database becomes usable without any reconnect path.

use std::sync::{Arc, RwLock};

use crate::config::DatabaseConfig;
use crate::db::DbError;
use crate::db::adapter::ItemStore;
use crate::db::document::DocumentAdapter;
use crate::db::relational::SqlAdapter;
use crate::db::retry::RetryPolicy;

/// Lifecycle phase of the data subsystem.
///
/// `Uninitialized -> Ready` and `Uninitialized -> Failed` each happen at most
/// once per process; there is no re-initialization path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbPhase {
    /// No database addon in this build. Health reports "not-configured"
    /// without any I/O; item routes are not mounted.
    NotConfigured,
    /// Adapter constructed, startup initialization not yet finished.
    /// Per-request calls surface their own errors in the meantime.
    Uninitialized,
    /// Startup initialization succeeded.
    Ready,
    /// Startup initialization exhausted its retries. The process keeps
    /// serving; only the data routes and `/health-db` degrade.
    Failed,
}

/// Handle to the optional adapter plus its startup phase.
#[derive(Clone)]
pub struct DbRuntime {
    store: Option<Arc<dyn ItemStore>>,
    phase: Arc<RwLock<DbPhase>>,
}

impl DbRuntime {
    /// Runtime for a build with no database addon.
    pub fn disabled() -> Self {
        Self {
            store: None,
            phase: Arc::new(RwLock::new(DbPhase::NotConfigured)),
        }
    }

    /// Wrap an already-constructed adapter.
    pub fn with_store(store: Arc<dyn ItemStore>) -> Self {
        Self {
            store: Some(store),
            phase: Arc::new(RwLock::new(DbPhase::Uninitialized)),
        }
    }

    /// Construct the adapter named by configuration. Performs no I/O.
    pub fn from_config(config: Option<&DatabaseConfig>) -> Self {
        match config {
            None => Self::disabled(),
            Some(DatabaseConfig::Sql(cfg)) => Self::with_store(Arc::new(SqlAdapter::new(
                cfg.engine,
                cfg.connection_url(),
                cfg.pool_size,
            ))),
            Some(DatabaseConfig::Document(cfg)) => {
                Self::with_store(Arc::new(DocumentAdapter::new(&cfg.uri, &cfg.database)))
            }
        }
    }

    /// The adapter, when one is configured.
    pub fn store(&self) -> Option<&Arc<dyn ItemStore>> {
        self.store.as_ref()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> DbPhase {
        *self.phase.read().expect("phase lock poisoned")
    }

    fn set_phase(&self, next: DbPhase) {
        *self.phase.write().expect("phase lock poisoned") = next;
    }

    /// Run the adapter's schema initialization once, updating the phase with
    /// the outcome. A no-op for builds without an adapter or when the phase
    /// already left `Uninitialized`.
    pub async fn initialize(&self, policy: RetryPolicy) -> Result<(), DbError> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        if self.phase() != DbPhase::Uninitialized {
            return Ok(());
        }

        match store.initialize(policy).await {
            Ok(()) => {
                self.set_phase(DbPhase::Ready);
                tracing::info!(engine = store.engine_name(), "data layer ready");
                Ok(())
            }
            Err(err) => {
                self.set_phase(DbPhase::Failed);
                tracing::error!(
                    engine = store.engine_name(),
                    error = %err,
                    "data layer initialization failed; continuing without it"
                );
                Err(err)
            }
        }
    }

    /// Supervised startup task: initialize in the background so the HTTP
    /// listener binds immediately. The task's outcome lands in the phase;
    /// the error itself has already been logged.
    pub fn spawn_initialize(&self, policy: RetryPolicy) -> tokio::task::JoinHandle<()> {
        let runtime = self.clone();
        tokio::spawn(async move {
            let _ = runtime.initialize(policy).await;
        })
    }
}
