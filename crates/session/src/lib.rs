//! Tab session facade.
//!
//! This crate defines the thin protocol surface the job executor depends on:
//! navigation, script evaluation, cookie/header configuration, an event
//! stream for document-ready / console / network notifications, and a
//! document-root query. The concrete implementation (tab pool + wire
//! transport) lives outside this repository; the executor only ever talks
//! to the [`TabSession`] trait.

pub mod error;
pub mod events;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

pub use error::{SessionError, SessionErrorKind};
pub use events::{
    session_events, ConsoleLevel, ConsoleMessage, LoadingFailure, RequestId, RequestInfo,
    ResponseInfo, SessionEvent, SessionEventBus,
};

/// Options for one script evaluation.
///
/// `await_suspension` maps to the protocol's promise-awaiting mode so scripts
/// wrapped in an async envelope settle before the result is read;
/// `return_value` asks for the settled value by value rather than by handle.
#[derive(Clone, Copy, Debug, Default)]
pub struct EvalOptions {
    pub await_suspension: bool,
    pub return_value: bool,
}

impl EvalOptions {
    /// Await async completion, discard the result. Used for script injection.
    pub fn fire_and_await() -> Self {
        Self {
            await_suspension: true,
            return_value: false,
        }
    }

    /// Await async completion and return the settled value. Used for tests.
    pub fn returning_value() -> Self {
        Self {
            await_suspension: true,
            return_value: true,
        }
    }
}

/// Exception description surfaced by an evaluation, protocol-shaped.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetail {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<Value>,
}

impl ExceptionDetail {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Result of one evaluation: either a settled value or the raised exception.
#[derive(Clone, Debug, Default)]
pub struct EvalOutcome {
    pub value: Value,
    pub exception: Option<ExceptionDetail>,
}

impl EvalOutcome {
    pub fn value(value: Value) -> Self {
        Self {
            value,
            exception: None,
        }
    }

    pub fn exception(detail: ExceptionDetail) -> Self {
        Self {
            value: Value::Null,
            exception: Some(detail),
        }
    }
}

/// Protocol channel for one borrowed browser tab.
///
/// Implementations must not require exclusive ownership: the executor borrows
/// a session for the duration of one job and the pool reclaims it afterwards.
/// `events` may be called any number of times; each call yields an
/// independent receiver over the same underlying stream.
#[async_trait]
pub trait TabSession: Send + Sync {
    /// Set one cookie scoped to `url`. May overwrite an equivalent cookie.
    async fn set_cookie(&self, url: &str, name: &str, value: &str) -> Result<(), SessionError>;

    /// Configure headers sent with every subsequent request from this tab.
    async fn set_extra_headers(
        &self,
        headers: HashMap<String, String>,
    ) -> Result<(), SessionError>;

    /// Issue a navigation. Settles when the navigation is accepted, not when
    /// the document finishes loading; readiness arrives as
    /// [`SessionEvent::DomContentFired`].
    async fn navigate(&self, url: &str, referrer: Option<&str>) -> Result<(), SessionError>;

    /// Evaluate an expression in the page's execution context.
    async fn evaluate(
        &self,
        expression: &str,
        options: EvalOptions,
    ) -> Result<EvalOutcome, SessionError>;

    /// Subscribe to the tab's protocol event stream.
    fn events(&self) -> broadcast::Receiver<SessionEvent>;

    /// Snapshot of the current document root, independent of job phase.
    async fn document_root(&self) -> Result<Value, SessionError>;
}
