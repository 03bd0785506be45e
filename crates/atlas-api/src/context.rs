// Request scope: cancellation + deadline
//
// Every API call runs inside a `Context`. The root context is cancelled on
// shutdown; collectors derive a child with their own timeout for each scrape.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::Error;

/// Cancellation and deadline scope for a group of API requests.
///
/// Cheap to clone. Children created with [`with_timeout`](Self::with_timeout)
/// observe the parent's cancellation and never outlive the parent's deadline.
#[derive(Debug, Clone)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Deadline>,
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    /// The budget the deadline was derived from, for error reporting.
    timeout: Duration,
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl Context {
    /// A root context with no deadline that is never cancelled on its own.
    pub fn background() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }

    /// A root context driven by an externally owned cancellation token.
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Derive a child scope that expires `timeout` from now.
    ///
    /// The child's deadline is the earlier of the parent's and its own.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let own = Deadline {
            at: Instant::now() + timeout,
            timeout,
        };
        let deadline = match self.deadline {
            Some(parent) if parent.at <= own.at => parent,
            _ => own,
        };
        Self {
            cancel: self.cancel.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancel this scope and every scope derived from it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The timeout budget this scope was created with, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.deadline.map(|d| d.timeout)
    }

    /// Time left before the deadline. `None` means unbounded.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.at.saturating_duration_since(Instant::now()))
    }

    /// Drive `fut` to completion unless the scope is cancelled or expires first.
    ///
    /// An elapsed deadline yields [`Error::Timeout`]; cancellation yields
    /// [`Error::Cancelled`]. The inner future is dropped in both cases, which
    /// aborts any in-flight request.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, Error>>,
    {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(d) => tokio::time::sleep_until(d.at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            () = expired => Err(Error::Timeout {
                timeout: deadline.map_or(Duration::ZERO, |d| d.timeout),
            }),
            result = fut => result,
        }
    }
}
