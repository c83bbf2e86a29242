//! End-to-end dispatcher tests over mock pool and session implementations.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::time::{sleep, timeout};

use tabtester::{
    DispatchedJob, Dispatcher, ExecEvent, Job, PoolError, TabId, TabLease, TabPool, TestSpec,
};
use tabtester_session::{
    session_events, EvalOptions, EvalOutcome, ExceptionDetail, LoadingFailure, RequestId,
    RequestInfo, SessionError, SessionEvent, SessionEventBus, TabSession,
};

struct ScriptedSession {
    bus: SessionEventBus,
    on_navigate: Mutex<Vec<SessionEvent>>,
    eval_results: Mutex<VecDeque<EvalOutcome>>,
}

impl ScriptedSession {
    fn new(on_navigate: Vec<SessionEvent>) -> Arc<Self> {
        let (bus, _rx) = session_events(64);
        Arc::new(Self {
            bus,
            on_navigate: Mutex::new(on_navigate),
            eval_results: Mutex::new(VecDeque::new()),
        })
    }

    fn queue_eval(&self, outcome: EvalOutcome) {
        self.eval_results.lock().unwrap().push_back(outcome);
    }
}

#[async_trait]
impl TabSession for ScriptedSession {
    async fn set_cookie(&self, _url: &str, _name: &str, _value: &str) -> Result<(), SessionError> {
        Ok(())
    }

    async fn set_extra_headers(
        &self,
        _headers: HashMap<String, String>,
    ) -> Result<(), SessionError> {
        Ok(())
    }

    async fn navigate(&self, _url: &str, _referrer: Option<&str>) -> Result<(), SessionError> {
        for event in self.on_navigate.lock().unwrap().drain(..) {
            let _ = self.bus.send(event);
        }
        Ok(())
    }

    async fn evaluate(
        &self,
        _expression: &str,
        _options: EvalOptions,
    ) -> Result<EvalOutcome, SessionError> {
        Ok(self
            .eval_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.bus.subscribe()
    }

    async fn document_root(&self) -> Result<Value, SessionError> {
        Ok(json!({ "nodeName": "#document" }))
    }
}

struct SingleTabPool {
    tab: TabId,
    session: Arc<ScriptedSession>,
    acquired: Mutex<u32>,
    released: Mutex<Vec<TabId>>,
}

impl SingleTabPool {
    fn new(session: Arc<ScriptedSession>) -> Arc<Self> {
        Arc::new(Self {
            tab: TabId::new(),
            session,
            acquired: Mutex::new(0),
            released: Mutex::new(Vec::new()),
        })
    }

    fn released(&self) -> Vec<TabId> {
        self.released.lock().unwrap().clone()
    }
}

#[async_trait]
impl TabPool for SingleTabPool {
    async fn acquire(&self) -> Result<TabLease, PoolError> {
        *self.acquired.lock().unwrap() += 1;
        Ok(TabLease {
            tab: self.tab,
            session: self.session.clone(),
        })
    }

    async fn release(&self, lease: TabLease) -> Result<(), PoolError> {
        self.released.lock().unwrap().push(lease.tab);
        Ok(())
    }
}

async fn collect_until_done(handle: &mut DispatchedJob) -> Vec<ExecEvent> {
    let mut events = Vec::new();
    loop {
        let event = timeout(Duration::from_secs(2), handle.events.recv())
            .await
            .expect("event before timeout")
            .expect("bus open");
        let is_done = matches!(event, ExecEvent::Done);
        events.push(event);
        if is_done {
            break;
        }
    }
    events
}

async fn wait_for_release(pool: &SingleTabPool) -> Vec<TabId> {
    for _ in 0..100 {
        let released = pool.released();
        if !released.is_empty() {
            return released;
        }
        sleep(Duration::from_millis(10)).await;
    }
    pool.released()
}

#[tokio::test]
async fn passing_job_releases_tab_once() {
    let session = ScriptedSession::new(vec![SessionEvent::DomContentFired]);
    session.queue_eval(EvalOutcome::value(json!(2)));
    let pool = SingleTabPool::new(session);
    let dispatcher = Dispatcher::new(pool.clone());

    let mut job = Job::new("https://example.test");
    job.tests = vec![TestSpec::new("return 1 + 1")];

    let mut handle = dispatcher.dispatch(job).await.expect("dispatch");
    let events = collect_until_done(&mut handle).await;

    assert!(events
        .iter()
        .any(|e| matches!(e, ExecEvent::TestPass { value, .. } if value == &json!(2))));

    handle.executor.wait().await;
    let released = wait_for_release(&pool).await;
    assert_eq!(released, vec![pool.tab]);
    assert_eq!(*pool.acquired.lock().unwrap(), 1);
}

#[tokio::test]
async fn throwing_test_still_completes_and_releases() {
    let session = ScriptedSession::new(vec![SessionEvent::DomContentFired]);
    session.queue_eval(EvalOutcome::exception(ExceptionDetail::from_text(
        "Uncaught 'x'",
    )));
    let pool = SingleTabPool::new(session);
    let dispatcher = Dispatcher::new(pool.clone());

    let mut job = Job::new("https://example.test");
    job.tests = vec![TestSpec::new("throw 'x'")];

    let mut handle = dispatcher.dispatch(job).await.expect("dispatch");
    let events = collect_until_done(&mut handle).await;

    assert!(events
        .iter()
        .any(|e| matches!(e, ExecEvent::TestFailed { exception, .. } if exception.text.contains('x'))));

    let released = wait_for_release(&pool).await;
    assert_eq!(released.len(), 1);
}

#[tokio::test]
async fn failed_page_load_still_releases_tab() {
    let session = ScriptedSession::new(vec![
        SessionEvent::RequestWillBeSent(RequestInfo {
            request_id: RequestId::new("doc"),
            url: "https://unreachable.invalid/".into(),
            method: Some("GET".into()),
        }),
        SessionEvent::LoadingFailed(LoadingFailure {
            request_id: RequestId::new("doc"),
            error_text: "net::ERR_NAME_NOT_RESOLVED".into(),
            canceled: false,
            resource_type: Some("Document".into()),
        }),
    ]);
    let pool = SingleTabPool::new(session);
    let dispatcher = Dispatcher::new(pool.clone());

    let mut handle = dispatcher
        .dispatch(Job::new("https://unreachable.invalid"))
        .await
        .expect("dispatch");
    let events = collect_until_done(&mut handle).await;

    assert!(events
        .iter()
        .any(|e| matches!(e, ExecEvent::PageLoadFailure(_))));
    assert!(!events
        .iter()
        .any(|e| matches!(e, ExecEvent::TestPass { .. } | ExecEvent::TestFailed { .. })));

    let released = wait_for_release(&pool).await;
    assert_eq!(released.len(), 1);
}
