//! Session configuration.

use marmot_protocol::{
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_PREDICATE_TIMEOUT_MS, DEFAULT_WAIT_TIMEOUT_MS,
};
use std::time::Duration;

/// Per-session configuration, passed to the driver factory at construction.
///
/// There is deliberately no process-wide mutable configuration: each session
/// owns its own copy.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Base host prepended by drivers that navigate relative paths over a
    /// real transport. Snapshot drivers may ignore it.
    pub app_host: Option<String>,
    /// Total wait budget for `find` and interactions.
    pub default_wait_timeout: Duration,
    /// Wait budget for boolean predicates (`has_selector` and friends).
    pub predicate_wait_timeout: Duration,
    /// Polling interval inside the wait loop.
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_host: None,
            default_wait_timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            predicate_wait_timeout: Duration::from_millis(DEFAULT_PREDICATE_TIMEOUT_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl SessionConfig {
    /// Creates a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application host for drivers with a real transport.
    pub fn with_app_host(mut self, host: impl Into<String>) -> Self {
        self.app_host = Some(host.into());
        self
    }

    /// Sets the total wait budget for queries and interactions.
    pub fn with_default_wait_timeout(mut self, timeout: Duration) -> Self {
        self.default_wait_timeout = timeout;
        self
    }

    /// Sets the wait budget for boolean predicates.
    pub fn with_predicate_wait_timeout(mut self, timeout: Duration) -> Self {
        self.predicate_wait_timeout = timeout;
        self
    }

    /// Sets the polling interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
