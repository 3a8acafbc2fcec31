use std::future::Future;
use std::time::Duration;

use bizstore_query::{Error, Result};
use tokio_util::sync::CancellationToken;

/// Per-operation handle carrying the deadline and the cancellation signal.
///
/// Every collection call runs inside [`OpCtx::run`], so one handle bounds all
/// store round-trips of that call.
#[derive(Clone, Debug)]
pub struct OpCtx {
    cancel: CancellationToken,
    timeout: Duration,
}

impl Default for OpCtx {
    fn default() -> Self {
        Self::new()
    }
}

impl OpCtx {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(12);

    #[must_use]
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Tie this context to an externally owned token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run `fut` against the deadline and the cancellation token.
    ///
    /// # Errors
    /// `Error::Timeout` when the deadline passes first, `Error::Cancelled`
    /// when the token fires first, otherwise whatever `fut` returns.
    pub async fn run<T, F>(&self, op: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                tracing::warn!(op, "operation cancelled");
                Err(Error::Cancelled)
            }
            res = tokio::time::timeout(self.timeout, fut) => {
                if let Ok(out) = res {
                    out
                } else {
                    tracing::warn!(op, timeout = ?self.timeout, "operation timed out");
                    Err(Error::Timeout)
                }
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passes_through_result() {
        let ctx = OpCtx::new();
        let out = ctx.run("ok", async { Ok(7) }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn deadline_yields_timeout() {
        let ctx = OpCtx::new().with_timeout(Duration::from_millis(50));
        let res: Result<()> = ctx
            .run("slow", async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok(())
            })
            .await;
        assert_eq!(res, Err(Error::Timeout));
    }

    #[tokio::test]
    async fn cancelled_token_wins() {
        let ctx = OpCtx::new();
        ctx.cancel();
        let res: Result<()> = ctx.run("cancelled", async { Ok(()) }).await;
        assert_eq!(res, Err(Error::Cancelled));
        assert!(ctx.is_cancelled());
    }
}
