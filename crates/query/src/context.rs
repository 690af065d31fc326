//! Per-query deadline and cancellation.

use crate::QueryError;
use std::{future::Future, time::Duration};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Deadline and cancellation signal carried by one query.
///
/// Every network round trip of a query runs through [`CallContext::run`], so
/// an elapsed deadline or a cancelled token stops the remaining sub-calls.
#[derive(Debug, Clone)]
pub struct CallContext {
    deadline: Instant,
    timeout: Duration,
    cancel: CancellationToken,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::with_timeout(Self::DEFAULT_TIMEOUT)
    }
}

impl CallContext {
    /// Default bound on a whole query.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now() + timeout,
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `cancel` as the cancellation signal.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Cancel the query this context belongs to.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Time left before the deadline.
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    /// Drive `fut` unless the context is cancelled or its deadline passes first.
    ///
    /// Cancellation wins over the deadline, and both win over a future that
    /// is ready at the same time.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, QueryError>
    where
        F: Future<Output = Result<T, QueryError>>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(QueryError::Cancelled),
            () = tokio::time::sleep_until(self.deadline) => {
                Err(QueryError::DeadlineExceeded(self.timeout))
            }
            result = fut => result,
        }
    }
}
