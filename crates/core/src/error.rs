//! Error types for the marmot session engine.

use thiserror::Error;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a session.
#[derive(Debug, Error)]
pub enum Error {
    /// No driver factory is registered under the requested name.
    ///
    /// Raised at session construction time, before any navigation.
    #[error("Driver not found: no driver registered as '{0}'")]
    DriverNotFound(String),

    /// No element matched the selector within the wait budget.
    #[error("Unable to find {0}")]
    NotFound(String),

    /// More than one element matched a selector that requires a unique
    /// match. Never retried: a second match will not disappear by waiting.
    #[error("Ambiguous match: found {count} elements matching {selector}")]
    AmbiguousMatch {
        /// Description of the offending selector.
        selector: String,
        /// How many elements matched.
        count: usize,
    },

    /// The element backing a handle no longer exists in the current
    /// document. Session helpers re-resolve once before surfacing this.
    #[error("Stale element: {0} refers to a superseded document")]
    Stale(String),

    /// The driver cannot carry out the requested operation.
    #[error("Unsupported operation: '{driver}' driver cannot {operation}")]
    Unsupported {
        /// Name of the driver that refused.
        driver: String,
        /// The operation that was requested.
        operation: String,
    },

    /// An error raised by the application under test, forwarded unmodified.
    #[error("Application error: {0}")]
    Application(String),

    /// A wait aborted because the session navigated or was reset while the
    /// wait was in flight.
    #[error("Wait cancelled: the session navigated or was reset while waiting")]
    Cancelled,

    /// Malformed selector or argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Driver-level transport or backend failure.
    #[error("Driver error: {0}")]
    Driver(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for failures that may resolve on a later poll: the element may
    /// simply not exist yet, or the handle raced a re-render.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Stale(_))
    }

    /// True when the error originated in the application under test.
    pub fn is_application(&self) -> bool {
        matches!(self, Self::Application(_))
    }
}
