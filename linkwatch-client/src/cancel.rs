//! Caller-supplied cancellation.

use std::future::Future;

use tokio::sync::watch;

use crate::FetchError;

/// Handle that cancels every [`CancelSignal`] cloned from its pair.
///
/// Dropping the handle without calling [`cancel`](Self::cancel) leaves the
/// signals uncancelled.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel all outstanding and future operations observing this signal.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// A cancellation signal observed by in-flight requests.
///
/// # Example
///
/// ```rust
/// use linkwatch_client::{CancelSignal, FetchError};
///
/// # tokio_test::block_on(async {
/// let (handle, signal) = CancelSignal::new();
/// handle.cancel();
///
/// let result: Result<(), FetchError> = signal.race(std::future::pending()).await;
/// assert!(matches!(result, Err(FetchError::Cancelled)));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancelSignal {
    /// Create a linked handle and signal.
    pub fn new() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, Self { rx: Some(rx) })
    }

    /// A signal that is never cancelled.
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// True once the paired handle has cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Resolve once the signal is cancelled. Never resolves otherwise.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                // Handle dropped without cancelling
                return std::future::pending().await;
            }
        }
    }

    /// Run `fut` unless the signal fires first.
    ///
    /// An already-cancelled signal wins without polling `fut`.
    pub async fn race<T, F>(&self, fut: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(FetchError::Cancelled),
            result = fut => result,
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::never()
    }
}
