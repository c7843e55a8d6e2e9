//! Per-call deadline and cancellation.
//!
//! Every public operation takes a [`Context`]. The facade only passes it along;
//! clients enforce it, either by checking it up front ([`Context::check`]) or by
//! racing the round trip against it ([`Context::run`]).

use std::{
    future::{Future, pending},
    time::{Duration, Instant},
};

use tokio_util::sync::CancellationToken;

use crate::error::{ClientError, ClientResult};

/// Deadline and cancellation carrier for a single call.
///
/// A default context never expires and cannot be cancelled.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use docgate::context::Context;
///
/// let ctx = Context::with_timeout(Duration::from_secs(5));
/// let user = store.find_one_by_field(&ctx, "users", "email", "==", "a@b.c").await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancellation: Option<CancellationToken>,
}

impl Context {
    /// Creates a context with no deadline and no cancellation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that expires `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Creates a context that expires at `deadline`.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            cancellation: None,
        }
    }

    /// Attaches a cancellation token to this context.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, or `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Fails fast if the context is already cancelled or past its deadline.
    pub fn check(&self) -> ClientResult<()> {
        if self.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        if self.is_expired() {
            return Err(ClientError::DeadlineExceeded);
        }

        Ok(())
    }

    /// Drives `fut` until it completes, the deadline passes, or the context is cancelled.
    ///
    /// Must be called from within a Tokio runtime with the time driver enabled.
    pub async fn run<F, T>(&self, fut: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        self.check()?;

        let cancelled = async {
            match &self.cancellation {
                Some(token) => token.cancelled().await,
                None => pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            result = fut => result,
            _ = cancelled => Err(ClientError::Cancelled),
            _ = expired => Err(ClientError::DeadlineExceeded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_context_never_fails() {
        let ctx = Context::new();

        assert!(ctx.check().is_ok());
        assert!(ctx.remaining().is_none());
    }

    #[test]
    fn expired_context_fails_check() {
        let ctx = Context::with_deadline(Instant::now() - Duration::from_millis(1));

        assert!(matches!(ctx.check(), Err(ClientError::DeadlineExceeded)));
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }

    #[test]
    fn cancelled_context_fails_check() {
        let token = CancellationToken::new();
        let ctx = Context::new().with_cancellation(token.clone());
        token.cancel();

        assert!(matches!(ctx.check(), Err(ClientError::Cancelled)));
    }

    #[tokio::test]
    async fn run_returns_future_output() {
        let ctx = Context::with_timeout(Duration::from_secs(5));

        let value = ctx.run(async { Ok::<_, ClientError>(7) }).await.unwrap();

        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn run_stops_at_deadline() {
        let ctx = Context::with_timeout(Duration::from_millis(10));

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, ClientError>(())
            })
            .await;

        assert!(matches!(result, Err(ClientError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn run_stops_on_cancellation() {
        let token = CancellationToken::new();
        let ctx = Context::new().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        let result = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok::<_, ClientError>(())
            })
            .await;

        canceller.await.unwrap();
        assert!(matches!(result, Err(ClientError::Cancelled)));
    }
}
