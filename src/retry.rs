//! Exponential backoff around any async upstream call.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::{sleep, Duration};

/// Returned (via `From`) when a pending retry is abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canceled;

impl Display for Canceled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("canceled")
    }
}

impl std::error::Error for Canceled {}

/// Cloneable cancellation flag. Once triggered it stays triggered.
#[derive(Clone, Debug)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once `cancel` has been called (immediately if it already was).
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // the sender lives as long as `self`, so this only ends on `true`
        let _ = rx.wait_for(|flag| *flag).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Wait before the first retry; doubled for every further one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(2000),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay }
    }

    /// Delay before retry number `retry` (0-based): base, 2x base, 4x base...
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Run `op` until it succeeds, fails with an error `is_transient` rejects,
    /// or the retry budget is spent. The last error is returned unchanged.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        mut op: F,
        is_transient: P,
        cancel: Option<&CancelToken>,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: Display + From<Canceled>,
    {
        let mut retry: u32 = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if retry >= self.max_retries || !is_transient(&err) {
                if retry > 0 {
                    log::error!("giving up after {} attempts: {err}", retry + 1);
                }
                return Err(err);
            }

            let wait = self.delay_for(retry);
            log::warn!(
                "attempt {}/{} failed: {err} - retrying in {} ms",
                retry + 1,
                self.max_attempts(),
                wait.as_millis()
            );

            match cancel {
                Some(token) => {
                    if token.is_cancelled() {
                        return Err(Canceled.into());
                    }
                    tokio::select! {
                        _ = sleep(wait) => {}
                        _ = token.cancelled() => {
                            log::info!("retry canceled during backoff");
                            return Err(Canceled.into());
                        }
                    }
                }
                None => sleep(wait).await,
            }
            retry += 1;
        }
    }
}
