//! Pass-scoped execution context.

use tokio::sync::watch;

/// Ambient context threaded through every phase call of one pass.
///
/// Carries a cooperative cancellation signal. The orchestrator never skips
/// phases on cancellation (every selected phase runs exactly once per pass,
/// and the final persist always runs); long-running phase operations are
/// expected to observe the signal and return early on their own.
#[derive(Debug, Clone)]
pub struct PassContext {
    cancel_rx: watch::Receiver<bool>,
}

impl PassContext {
    /// Create a context that is never cancelled.
    pub fn new() -> Self {
        let (_, cancel_rx) = watch::channel(false);
        Self { cancel_rx }
    }

    /// Create a context together with its cancellation handle.
    pub fn cancellable() -> (Self, CancelHandle) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        (Self { cancel_rx }, CancelHandle { cancel_tx })
    }

    /// Check whether the pass has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Wait until the pass is cancelled.
    ///
    /// Never resolves when the handle was dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut cancel_rx = self.cancel_rx.clone();
        loop {
            if *cancel_rx.borrow() {
                return;
            }
            if cancel_rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for PassContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle that cancels the pass it was created with.
#[derive(Debug)]
pub struct CancelHandle {
    cancel_tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation to the pass.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }
}
