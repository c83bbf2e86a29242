//! Protocol event payloads delivered on a session's event stream.
//!
//! Field names follow the wire protocol's camelCase params so payloads can be
//! deserialized straight out of the transport.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Opaque network request identifier assigned by the browser.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

/// Payload of a request-started notification.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    pub request_id: RequestId,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// Payload of a loading-failed notification.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadingFailure {
    pub request_id: RequestId,
    #[serde(default)]
    pub error_text: String,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
}

/// Payload of a response-received notification.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInfo {
    pub request_id: RequestId,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub status: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Severity of a page console message.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Debug,
    #[default]
    Log,
    Info,
    Warning,
    Error,
}

/// One message emitted on the page's console.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleMessage {
    #[serde(default)]
    pub level: ConsoleLevel,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<i64>,
}

/// Events a tab session fans out to subscribers.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    /// A network request left the tab.
    RequestWillBeSent(RequestInfo),
    /// A network request failed to load.
    LoadingFailed(LoadingFailure),
    /// A response arrived for a request.
    ResponseReceived(ResponseInfo),
    /// The page wrote to its console.
    ConsoleMessage(ConsoleMessage),
    /// The document's initial content finished loading.
    DomContentFired,
}

/// Broadcast sender side of a session's event stream.
pub type SessionEventBus = broadcast::Sender<SessionEvent>;

/// Create a session event channel with the given buffer capacity.
pub fn session_events(capacity: usize) -> (SessionEventBus, broadcast::Receiver<SessionEvent>) {
    broadcast::channel(capacity.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loading_failure_parses_protocol_params() {
        let failure: LoadingFailure = serde_json::from_value(json!({
            "requestId": "1000.1",
            "errorText": "net::ERR_NAME_NOT_RESOLVED",
            "canceled": false,
            "resourceType": "Document",
        }))
        .expect("failure payload");
        assert_eq!(failure.request_id, RequestId::new("1000.1"));
        assert_eq!(failure.error_text, "net::ERR_NAME_NOT_RESOLVED");
        assert_eq!(failure.resource_type.as_deref(), Some("Document"));
    }

    #[test]
    fn console_level_uses_lowercase_names() {
        let message: ConsoleMessage = serde_json::from_value(json!({
            "level": "warning",
            "text": "deprecated API",
        }))
        .expect("console payload");
        assert_eq!(message.level, ConsoleLevel::Warning);
        assert_eq!(message.text, "deprecated API");
    }
}
