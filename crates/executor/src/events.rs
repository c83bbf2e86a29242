//! Lifecycle and diagnostic events emitted while a job runs.

use serde_json::Value;
use tabtester_core_types::TestSpec;
use tabtester_session::{ConsoleMessage, ExceptionDetail, LoadingFailure, ResponseInfo};
use tokio::sync::broadcast;

/// Events published on an executor's bus.
///
/// Diagnostic events (`Log`, `NetworkFailed`, `NetworkReceived`) never alter
/// job control flow and may keep arriving after [`ExecEvent::Done`] while the
/// session's subscriptions are still installed.
#[derive(Clone, Debug)]
pub enum ExecEvent {
    /// The page wrote to its console.
    Log(ConsoleMessage),
    /// A test settled with a return value.
    TestPass { test: TestSpec, value: Value },
    /// A test raised or rejected.
    TestFailed {
        test: TestSpec,
        exception: ExceptionDetail,
    },
    /// The primary document request failed to load. Terminal.
    PageLoadFailure(LoadingFailure),
    /// Any request failed to load.
    NetworkFailed(LoadingFailure),
    /// A response arrived for any request.
    NetworkReceived(ResponseInfo),
    /// The job finished. Fired exactly once per job.
    Done,
}

impl ExecEvent {
    /// Stable event name, used for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecEvent::Log(_) => "log",
            ExecEvent::TestPass { .. } => "test-pass",
            ExecEvent::TestFailed { .. } => "test-failed",
            ExecEvent::PageLoadFailure(_) => "page-load-failure",
            ExecEvent::NetworkFailed(_) => "network-failed",
            ExecEvent::NetworkReceived(_) => "network-received",
            ExecEvent::Done => "done",
        }
    }
}

/// Sender side of an executor's event bus.
pub type EventBus = broadcast::Sender<ExecEvent>;

/// Create an executor event bus with the given buffer capacity.
pub fn event_bus(capacity: usize) -> (EventBus, broadcast::Receiver<ExecEvent>) {
    broadcast::channel(capacity.max(1))
}
