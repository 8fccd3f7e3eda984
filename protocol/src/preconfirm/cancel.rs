//! Request cancellation and deadlines.
//!
//! A [`CancelSignal`] travels with one issuance request. It fires when the
//! watched flag flips to `true` (or its sender is dropped, the same
//! convention the node's shutdown channel uses) or when the deadline passes.
//! Once fired, every remaining pipeline step is skipped.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use super::error::PreconfirmError;

/// Cancellation flag plus optional deadline.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    cancelled: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Self::default()
    }

    /// Fires when `rx` observes `true` or its sender goes away.
    pub fn from_watch(rx: watch::Receiver<bool>) -> Self {
        Self {
            cancelled: Some(rx),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Non-blocking check, used between synchronous steps.
    pub fn check(&self) -> Result<(), PreconfirmError> {
        if let Some(rx) = &self.cancelled {
            if *rx.borrow() || rx.has_changed().is_err() {
                return Err(PreconfirmError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(PreconfirmError::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Runs `fut` unless the signal fires first.
    ///
    /// Cancellation wins ties with the deadline, and both win ties with the
    /// future; a fired signal always aborts.
    pub async fn guard<F>(&self, fut: F) -> Result<F::Output, PreconfirmError>
    where
        F: Future,
    {
        self.check()?;

        let cancelled = async {
            match self.cancelled.clone() {
                Some(rx) => wait_cancelled(rx).await,
                None => std::future::pending().await,
            }
        };
        let deadline = async {
            match self.deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => Err(PreconfirmError::Cancelled),
            _ = deadline => Err(PreconfirmError::DeadlineExceeded),
            out = fut => Ok(out),
        }
    }
}

async fn wait_cancelled(mut rx: watch::Receiver<bool>) {
    loop {
        if *rx.borrow_and_update() {
            return;
        }
        if rx.changed().await.is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn never_lets_work_through() {
        let out = CancelSignal::never().guard(async { 7 }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn already_cancelled_skips_work() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let signal = CancelSignal::from_watch(rx);

        let result = signal.guard(async { unreachable!("must not run") }).await;
        assert!(matches!(result, Err(PreconfirmError::Cancelled)));
    }

    #[tokio::test]
    async fn cancel_interrupts_pending_work() {
        let (tx, rx) = watch::channel(false);
        let signal = CancelSignal::from_watch(rx);

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tx.send(true).unwrap();
            // Keep the sender alive until the flag is observed.
            tokio::time::sleep(Duration::from_millis(50)).await;
        });

        let result = signal.guard(std::future::pending::<()>()).await;
        assert!(matches!(result, Err(PreconfirmError::Cancelled)));
        canceller.await.unwrap();
    }

    #[tokio::test]
    async fn dropped_sender_counts_as_cancel() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let signal = CancelSignal::from_watch(rx);
        assert!(matches!(signal.check(), Err(PreconfirmError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_fires() {
        let signal = CancelSignal::never().with_timeout(Duration::from_secs(1));
        let result = signal.guard(std::future::pending::<()>()).await;
        assert!(matches!(result, Err(PreconfirmError::DeadlineExceeded)));
        assert!(matches!(
            signal.check(),
            Err(PreconfirmError::DeadlineExceeded)
        ));
    }
}
