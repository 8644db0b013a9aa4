//! Per-activation cancellation scope for background loops
//!
//! Each activation owns a fresh [`CancelScope`]. The loop it spawns holds a
//! [`CancelToken`] and only observes cancellation while suspended in
//! [`CancelToken::sleep`]; computation in between is never interrupted.

use std::time::Duration;
use tokio::sync::watch;

/// Owner side of a cancellation scope
///
/// Dropping the scope cancels every token handed out from it.
#[derive(Debug)]
pub struct CancelScope {
    tx: watch::Sender<bool>,
}

impl CancelScope {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelScope {
    fn default() -> Self {
        Self::new()
    }
}

/// Loop side of a cancellation scope
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the scope is cancelled or dropped
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Suspend for `duration` unless cancelled first
    ///
    /// Returns `true` when the full duration elapsed, `false` on cancellation.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        tokio::select! {
            biased;

            _ = self.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
