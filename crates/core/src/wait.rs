//! Bounded retry loop for transiently failing queries.
//!
//! Anything that may legitimately fail *for now* — an element not rendered
//! yet, a handle that raced a re-render — runs inside [`Wait::until`]. The
//! loop retries retryable errors until the deadline and passes terminal
//! errors straight through: an ambiguous match will not disappear by
//! waiting, and a cancelled wait must fail fast rather than return data
//! from a superseded page.

use crate::error::{Error, Result};
use std::time::Duration;
use tokio::time::Instant;

/// A bounded polling loop.
#[derive(Debug, Clone, Copy)]
pub struct Wait {
    timeout: Duration,
    interval: Duration,
}

impl Wait {
    /// Creates a wait with a total budget and polling interval.
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    /// Polls `attempt` until it succeeds, fails terminally, or the budget
    /// is exhausted. The attempt always runs at least once; the error from
    /// the final attempt is returned on timeout.
    pub async fn until<T, F>(&self, mut attempt: F) -> Result<T>
    where
        F: AsyncFnMut() -> Result<T>,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && Instant::now() < deadline => {
                    tracing::trace!(%error, "retrying after transient failure");
                    tokio::time::sleep(self.interval).await;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
