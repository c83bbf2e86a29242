//! Shared identifiers and the job model used across the tabtester crates.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a pooled browser tab.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TabId(pub Uuid);

impl TabId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for one executed job.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

/// One unit of work: a page load plus an ordered list of test scripts.
///
/// Everything but `url` is optional. `cookies` entries become one cookie
/// each, scoped to `url`; `headers` are merged with the fixed identifying
/// header and applied to every request the tab issues; `inject_script` runs
/// once after the document is ready, before any test.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub cookies: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inject_script: Option<String>,
    #[serde(default)]
    pub tests: Vec<TestSpec>,
}

impl Job {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// One test script plus arbitrary caller metadata.
///
/// The metadata is passed through unchanged on result events so callers can
/// correlate pass/fail outcomes back to their own identifiers. Tests have no
/// identity beyond list position and this metadata.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TestSpec {
    pub script: String,
    #[serde(flatten)]
    pub meta: serde_json::Map<String, serde_json::Value>,
}

impl TestSpec {
    pub fn new(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            meta: serde_json::Map::new(),
        }
    }
}
