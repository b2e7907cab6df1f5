//! Level-triggered wake gates for stage coordination.
//!
//! A [`Gate`] is a binary signal that a producer sets when work is available and
//! a consumer clears when it has drained its queue. Unlike an edge-triggered
//! notification, a waiter that arrives after the gate was set still proceeds
//! immediately; setting an already-set gate is a no-op.

use std::sync::Arc;

use tokio::sync::watch;

/// A level-triggered binary signal shared between a producer and a consumer.
#[derive(Debug, Clone)]
pub struct Gate {
    tx: Arc<watch::Sender<bool>>,
}

impl Gate {
    /// Creates a new gate in the cleared state.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Sets the gate, waking all pending waiters. No-op if already set.
    pub fn set(&self) {
        self.tx.send_replace(true);
    }

    /// Clears the gate. No-op if already clear.
    pub fn clear(&self) {
        self.tx.send_replace(false);
    }

    /// Returns `true` if the gate is currently set.
    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Waits until the gate is set.
    ///
    /// Returns immediately if the gate is already set at the time of the call.
    pub async fn wait_set(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|set| *set).await;
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}
