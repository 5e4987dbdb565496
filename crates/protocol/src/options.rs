//! Query options and driver capability flags.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default total wait budget for queries, in milliseconds.
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 2000;

/// Default wait budget for boolean predicates (`has_selector` and friends),
/// in milliseconds. Shorter than the query budget so negative assertions do
/// not stall test runs.
pub const DEFAULT_PREDICATE_TIMEOUT_MS: u64 = 500;

/// Default polling interval inside the wait loop, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Per-query options for `find` and related calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    /// Overrides the session's default wait timeout for this query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,

    /// Overrides the exactness of semantic matching for this query.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<bool>,

    /// Keep only matches whose text content contains this string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl FindOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wait timeout for this query.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets semantic match exactness for this query.
    pub fn exact(mut self, exact: bool) -> Self {
        self.exact = Some(exact);
        self
    }

    /// Filters matches by contained text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// What a driver can and cannot do.
///
/// The wait engine reads `live` to decide whether each poll needs a fresh
/// document fetch; the session reads the remaining flags to fail fast with
/// an unsupported-operation error instead of silently no-opping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// The DOM can change without an explicit navigation (script-driven
    /// backends). Snapshot drivers leave this false.
    pub live: bool,
    /// The backend executes JavaScript.
    pub javascript: bool,
    /// The backend supports attaching files to file inputs.
    pub file_upload: bool,
}

impl Capabilities {
    /// Capabilities of a static snapshot backend: no scripting, documents
    /// only change on navigation.
    pub const fn snapshot() -> Self {
        Self {
            live: false,
            javascript: false,
            file_upload: true,
        }
    }

    /// Capabilities of a live rendering backend.
    pub const fn live_rendering() -> Self {
        Self {
            live: true,
            javascript: true,
            file_upload: true,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::snapshot()
    }
}
