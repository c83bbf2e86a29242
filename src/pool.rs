//! Interface boundary to the external tab pool.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use tabtester_core_types::TabId;
use tabtester_session::TabSession;

/// A tab borrowed from the pool for the duration of one job.
///
/// The lease is consumed by [`TabPool::release`], which makes the
/// exactly-once release a move-checked property rather than a convention.
pub struct TabLease {
    pub tab: TabId,
    pub session: Arc<dyn TabSession>,
}

/// Errors surfaced by a pool implementation.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("no tab available: {0}")]
    Exhausted(String),
    #[error("pool internal error: {0}")]
    Internal(String),
}

/// Tab allocation boundary. Implementations must serialize acquire/release
/// pairs per tab; any timeout or retry policy belongs here, not in the
/// executor.
#[async_trait]
pub trait TabPool: Send + Sync {
    async fn acquire(&self) -> Result<TabLease, PoolError>;
    async fn release(&self, lease: TabLease) -> Result<(), PoolError>;
}
