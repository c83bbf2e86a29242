//! The per-job orchestrator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tabtester_core_types::{Job, JobId};
use tabtester_session::{
    EvalOptions, EvalOutcome, ExceptionDetail, LoadingFailure, RequestId, SessionError,
    SessionEvent, TabSession,
};

use crate::config::ExecutorConfig;
use crate::error::JobError;
use crate::events::{event_bus, EventBus, ExecEvent};
use crate::script::wrap_async;

/// Fixed identifying header attached to every request the tab issues while a
/// job runs, alongside any caller-supplied headers.
pub const TESTER_HEADER: &str = "x-tabtester";

/// Job phases. Terminal: `Done`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Init,
    Configuring,
    Navigating,
    AwaitingReady,
    Ready,
    RunningTests,
    Done,
}

/// Drives one job against one borrowed tab session.
///
/// Construct with [`JobExecutor::new`], subscribe for events, then call
/// [`JobExecutor::start`] once. The executor owns the job's run state; the
/// session is borrowed and handed back to the pool by the dispatcher once
/// the terminal signal fires.
pub struct JobExecutor {
    session: Arc<dyn TabSession>,
    job: Job,
    id: JobId,
    bus: EventBus,
    phase: watch::Sender<Phase>,
    started: AtomicBool,
    ready_seen: AtomicBool,
    completed: AtomicBool,
    primary_request: OnceLock<RequestId>,
    failure: OnceLock<LoadingFailure>,
    done: CancellationToken,
}

impl JobExecutor {
    pub fn new(session: Arc<dyn TabSession>, job: Job) -> Self {
        Self::with_config(session, job, ExecutorConfig::default())
    }

    pub fn with_config(session: Arc<dyn TabSession>, job: Job, config: ExecutorConfig) -> Self {
        let (bus, _) = event_bus(config.event_capacity);
        let (phase, _) = watch::channel(Phase::Init);
        Self {
            session,
            job,
            id: JobId::new(),
            bus,
            phase,
            started: AtomicBool::new(false),
            ready_seen: AtomicBool::new(false),
            completed: AtomicBool::new(false),
            primary_request: OnceLock::new(),
            failure: OnceLock::new(),
            done: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Subscribe to the job's lifecycle and diagnostic events.
    pub fn subscribe(&self) -> broadcast::Receiver<ExecEvent> {
        self.bus.subscribe()
    }

    /// Execute the job. Resolves only after the terminal signal has fired.
    ///
    /// Returns `Err(JobError::AlreadyStarted)` on a second call and
    /// `Err(JobError::PageLoadFailed)` when the primary document request
    /// failed to load.
    pub async fn start(self: Arc<Self>) -> Result<(), JobError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(JobError::AlreadyStarted);
        }

        debug!(target: "executor", job = %self.id.0, url = %self.job.url, "job starting");
        self.advance(&[Phase::Init], Phase::Configuring);
        self.configure().await;

        // Subscribe before navigating so no readiness or network event can
        // slip past the listener. The listener outlives the terminal signal:
        // diagnostics keep flowing until the session's stream closes, but
        // never re-trigger phase transitions.
        self.advance(&[Phase::Configuring], Phase::Navigating);
        let events = self.session.events();
        tokio::spawn(Arc::clone(&self).event_loop(events));

        match self
            .session
            .navigate(&self.job.url, self.job.referrer.as_deref())
            .await
        {
            Ok(()) => {
                self.advance(&[Phase::Navigating], Phase::AwaitingReady);
            }
            Err(err) => {
                warn!(target: "executor", job = %self.id.0, %err, "navigation rejected");
                self.fail_page_load(LoadingFailure {
                    request_id: RequestId::default(),
                    error_text: err.to_string(),
                    canceled: false,
                    resource_type: None,
                });
            }
        }

        self.done.cancelled().await;

        match self.failure.get() {
            Some(failure) => Err(JobError::PageLoadFailed(failure.clone())),
            None => Ok(()),
        }
    }

    /// Block until the terminal signal fires. Idempotent; safe to call after
    /// the signal has already fired.
    pub async fn wait(&self) {
        self.done.cancelled().await;
    }

    /// Snapshot of the current document root. Pass-through to the session,
    /// independent of job phase and free of side effects on the job.
    pub async fn document_snapshot(&self) -> Result<serde_json::Value, SessionError> {
        self.session.document_root().await
    }

    async fn configure(&self) {
        for (name, value) in &self.job.cookies {
            if let Err(err) = self.session.set_cookie(&self.job.url, name, value).await {
                warn!(target: "executor", job = %self.id.0, cookie = %name, %err, "set_cookie failed");
            }
        }

        // Fixed marker first so caller headers win on collision.
        let mut headers = HashMap::new();
        headers.insert(
            TESTER_HEADER.to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        headers.extend(
            self.job
                .headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        if let Err(err) = self.session.set_extra_headers(headers).await {
            warn!(target: "executor", job = %self.id.0, %err, "set_extra_headers failed");
        }
    }

    async fn event_loop(self: Arc<Self>, mut events: broadcast::Receiver<SessionEvent>) {
        debug!(target: "executor", job = %self.id.0, "event loop entered");
        loop {
            match events.recv().await {
                Ok(event) => self.handle_event(event).await,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(target: "executor", job = %self.id.0, skipped, "session event stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
        debug!(target: "executor", job = %self.id.0, "event loop exiting");
    }

    async fn handle_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::RequestWillBeSent(request) => {
                // First-wins: the first observed request is taken to be the
                // main document fetch; later requests never displace it.
                if self.primary_request.set(request.request_id.clone()).is_ok() {
                    debug!(
                        target: "executor",
                        job = %self.id.0,
                        request = %request.request_id.0,
                        url = %request.url,
                        "primary request established"
                    );
                }
            }
            SessionEvent::LoadingFailed(failure) => {
                self.emit(ExecEvent::NetworkFailed(failure.clone()));
                if self.primary_request.get() == Some(&failure.request_id) {
                    self.fail_page_load(failure);
                }
            }
            SessionEvent::ResponseReceived(response) => {
                self.emit(ExecEvent::NetworkReceived(response));
            }
            SessionEvent::ConsoleMessage(message) => {
                self.emit(ExecEvent::Log(message));
            }
            SessionEvent::DomContentFired => {
                self.on_document_ready().await;
            }
        }
    }

    async fn on_document_ready(&self) {
        if self.completed.load(Ordering::SeqCst) {
            debug!(target: "executor", job = %self.id.0, "document ready after completion; ignoring");
            return;
        }
        if self.ready_seen.swap(true, Ordering::SeqCst) {
            return;
        }
        self.advance(&[Phase::Navigating, Phase::AwaitingReady], Phase::Ready);

        if let Some(script) = self
            .job
            .inject_script
            .as_deref()
            .filter(|script| !script.is_empty())
        {
            // Injection failure is not a distinguished outcome: log and keep
            // going so the tests still run.
            match self
                .session
                .evaluate(&wrap_async(script), EvalOptions::fire_and_await())
                .await
            {
                Ok(EvalOutcome {
                    exception: Some(exception),
                    ..
                }) => {
                    warn!(target: "executor", job = %self.id.0, text = %exception.text, "inject script raised");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(target: "executor", job = %self.id.0, %err, "inject script evaluation failed");
                }
            }
        }

        self.advance(&[Phase::Ready], Phase::RunningTests);
        for test in &self.job.tests {
            // One at a time, in list order: a test may depend on page state
            // left behind by its predecessors.
            let outcome = self
                .session
                .evaluate(&wrap_async(&test.script), EvalOptions::returning_value())
                .await;
            match outcome {
                Ok(EvalOutcome {
                    exception: Some(exception),
                    ..
                }) => {
                    self.emit(ExecEvent::TestFailed {
                        test: test.clone(),
                        exception,
                    });
                }
                Ok(EvalOutcome { value, .. }) => {
                    self.emit(ExecEvent::TestPass {
                        test: test.clone(),
                        value,
                    });
                }
                Err(err) => {
                    self.emit(ExecEvent::TestFailed {
                        test: test.clone(),
                        exception: ExceptionDetail::from_text(err.to_string()),
                    });
                }
            }
        }

        self.complete();
    }

    fn fail_page_load(&self, failure: LoadingFailure) {
        if self.completed.load(Ordering::SeqCst) {
            return;
        }
        if self.failure.set(failure.clone()).is_err() {
            return;
        }
        warn!(target: "executor", job = %self.id.0, error = %failure.error_text, "page load failed");
        self.emit(ExecEvent::PageLoadFailure(failure));
        self.complete();
    }

    fn complete(&self) {
        if self.completed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.phase.send_replace(Phase::Done);
        info!(target: "executor", job = %self.id.0, "job complete");
        let _ = self.bus.send(ExecEvent::Done);
        self.done.cancel();
    }

    fn advance(&self, from: &[Phase], to: Phase) {
        self.phase.send_if_modified(|phase| {
            if from.contains(phase) {
                *phase = to;
                true
            } else {
                false
            }
        });
    }

    fn emit(&self, event: ExecEvent) {
        debug!(target: "executor", job = %self.id.0, kind = event.kind(), "emit");
        let _ = self.bus.send(event);
    }
}
