use tabtester_session::LoadingFailure;
use thiserror::Error;

/// Errors surfaced by [`crate::JobExecutor::start`].
#[derive(Clone, Debug, Error)]
pub enum JobError {
    /// `start` was called a second time on the same instance.
    #[error("executor already started")]
    AlreadyStarted,
    /// The primary document request failed; the job terminated without
    /// running tests that had not started yet.
    #[error("page load failed: {}", .0.error_text)]
    PageLoadFailed(LoadingFailure),
}
