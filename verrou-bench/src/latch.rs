use std::sync::Arc;

use tokio::sync::watch;

/// One-shot broadcast latch.
///
/// Releasing twice is not observable as an error, and waiters that arrive
/// after the release return immediately. Used for both the start barrier
/// and the stop broadcast of a run.
#[derive(Debug, Clone)]
pub struct Latch {
    tx: Arc<watch::Sender<bool>>,
}

impl Latch {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);

        Self { tx: Arc::new(tx) }
    }

    pub fn release(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_released(&self) -> bool {
        *self.tx.borrow()
    }

    pub async fn released(&self) {
        let mut rx = self.tx.subscribe();

        // The sender lives in self, so the wait can only end by release.
        let _ = rx.wait_for(|released| *released).await;
    }
}

impl Default for Latch {
    fn default() -> Self {
        Self::new()
    }
}
