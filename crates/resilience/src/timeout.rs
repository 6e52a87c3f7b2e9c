// crates/resilience/src/timeout.rs
//! Timeout handling utilities

use crate::cancel::CancelToken;
use crate::error::{ResilienceError, ResilienceResult};
use std::future::Future;
use std::time::Duration;

/// Awaits `operation`, giving up after `duration`
pub async fn with_timeout<F, T>(duration: Duration, operation: F) -> ResilienceResult<T>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(duration, operation)
        .await
        .map_err(|_| ResilienceError::Timeout(duration))
}

/// Timeout wrapper for operations
#[derive(Debug, Clone)]
pub struct Timeout {
    duration: Duration,
}

impl Timeout {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Executes a future with this timeout
    pub async fn execute<F, T>(&self, operation: F) -> ResilienceResult<T>
    where
        F: Future<Output = T>,
    {
        with_timeout(self.duration, operation).await
    }

    /// Executes a future until it finishes, times out, or `token` is cancelled
    pub async fn run_cancellable<F, T>(
        &self,
        operation: F,
        token: &CancelToken,
    ) -> ResilienceResult<T>
    where
        F: Future<Output = T>,
    {
        if token.is_cancelled() {
            return Err(ResilienceError::Cancelled);
        }

        tokio::select! {
            result = with_timeout(self.duration, operation) => result,
            _ = token.cancelled() => Err(ResilienceError::Cancelled),
        }
    }

    /// Runs a blocking closure on the blocking pool under this timeout
    ///
    /// The closure keeps running in the background after a timeout or
    /// cancellation; only its result is discarded.
    pub async fn run_blocking<F, T>(&self, operation: F, token: &CancelToken) -> ResilienceResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let handle = tokio::task::spawn_blocking(operation);
        match self.run_cancellable(handle, token).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(join_error)) => Err(ResilienceError::TaskFailed(join_error.to_string())),
            Err(e) => {
                log::debug!("Abandoning blocking task: {}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_timeout_success() {
        let result = with_timeout(Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            42
        })
        .await;

        assert_eq!(result.ok(), Some(42));
    }

    #[tokio::test]
    async fn test_timeout_exceeded() {
        let result = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            42
        })
        .await;

        assert!(matches!(result, Err(ResilienceError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_timeout_wrapper() {
        let timeout = Timeout::new(Duration::from_millis(100));
        let result = timeout.execute(async { 42 }).await;
        assert_eq!(result.ok(), Some(42));
        assert_eq!(timeout.duration(), Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_cancel_wins_over_slow_operation() {
        let timeout = Timeout::new(Duration::from_secs(10));
        let token = CancelToken::new();
        let canceller = token.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = timeout
            .run_cancellable(tokio::time::sleep(Duration::from_secs(5)), &token)
            .await;
        assert!(matches!(result, Err(ResilienceError::Cancelled)));
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_skips_work() {
        let timeout = Timeout::new(Duration::from_secs(1));
        let token = CancelToken::new();
        token.cancel();

        let result = timeout.run_cancellable(async { 1 }, &token).await;
        assert!(matches!(result, Err(ResilienceError::Cancelled)));
    }

    #[tokio::test]
    async fn test_run_blocking() {
        let timeout = Timeout::new(Duration::from_secs(1));
        let token = CancelToken::new();

        let result = timeout.run_blocking(|| 6 * 7, &token).await;
        assert_eq!(result.ok(), Some(42));

        let slow = Timeout::new(Duration::from_millis(20));
        let result = slow
            .run_blocking(
                || std::thread::sleep(Duration::from_millis(300)),
                &token,
            )
            .await;
        assert!(matches!(result, Err(ResilienceError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_run_blocking_panic_is_task_failure() {
        let timeout = Timeout::new(Duration::from_secs(1));
        let result: ResilienceResult<()> = timeout
            .run_blocking(|| panic!("resolver exploded"), &CancelToken::new())
            .await;
        assert!(matches!(result, Err(ResilienceError::TaskFailed(_))));
    }
}
