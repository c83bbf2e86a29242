//! Job dispatch: one acquired tab, one executor, one release.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use tabtester_core_types::Job;
use tabtester_executor::{ExecEvent, JobExecutor};

use crate::pool::{PoolError, TabPool};

/// Errors surfaced by [`Dispatcher::dispatch`].
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// A running job handed back to the caller.
///
/// `events` was subscribed before execution began, so no lifecycle event can
/// be missed between dispatch and the caller's first `recv`.
pub struct DispatchedJob {
    pub executor: Arc<JobExecutor>,
    pub events: broadcast::Receiver<ExecEvent>,
}

/// Acquires tabs from the pool and runs one executor per job.
pub struct Dispatcher {
    pool: Arc<dyn TabPool>,
}

impl Dispatcher {
    pub fn new(pool: Arc<dyn TabPool>) -> Self {
        Self { pool }
    }

    /// Acquire a tab, start the job on it, and return the executor handle.
    ///
    /// Execution proceeds in the background; join it with
    /// [`JobExecutor::wait`] or by draining `events` until `done`. The tab
    /// goes back to the pool exactly once, after the terminal signal fires.
    pub async fn dispatch(&self, job: Job) -> Result<DispatchedJob, DispatchError> {
        let lease = self.pool.acquire().await?;
        let tab = lease.tab;
        debug!(target: "dispatcher", tab = %tab.0, url = %job.url, "tab acquired");

        let executor = Arc::new(JobExecutor::new(Arc::clone(&lease.session), job));
        let events = executor.subscribe();

        let pool = Arc::clone(&self.pool);
        let runner = Arc::clone(&executor);
        tokio::spawn(async move {
            if let Err(err) = Arc::clone(&runner).start().await {
                warn!(target: "dispatcher", job = %runner.id().0, %err, "job ended with error");
            }
            if let Err(err) = pool.release(lease).await {
                warn!(target: "dispatcher", tab = %tab.0, %err, "tab release failed");
            } else {
                debug!(target: "dispatcher", tab = %tab.0, "tab released");
            }
        });

        Ok(DispatchedJob { executor, events })
    }
}
