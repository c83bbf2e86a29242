//! tabtester: page-load-and-test jobs against pooled browser tabs.
//!
//! One job is a page load plus an ordered list of test scripts. The
//! [`Dispatcher`] borrows a tab from a [`TabPool`], runs the job through a
//! [`JobExecutor`], and hands the tab back exactly once when the job's
//! terminal signal fires. Callers observe progress through the executor's
//! event stream.
//!
//! The tab pool itself (browser process lifecycle, wire transport) lives
//! outside this workspace behind the [`TabSession`] trait.

pub mod dispatcher;
pub mod pool;

pub use dispatcher::{DispatchError, DispatchedJob, Dispatcher};
pub use pool::{PoolError, TabLease, TabPool};

pub use tabtester_core_types::{Job, JobId, TabId, TestSpec};
pub use tabtester_executor::{ExecEvent, ExecutorConfig, JobError, JobExecutor, Phase};
pub use tabtester_session::{SessionError, SessionEvent, TabSession};
