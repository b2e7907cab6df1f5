//! Terminal shutdown broadcast for worker coordination.
//!
//! Shutdown is a one-way transition: once requested it is never rescinded, so
//! the channel carries a boolean that only ever moves from `false` to `true`.
//! All receivers observe the same signal, whether they were waiting when it was
//! sent or subscribe afterwards.

use tokio::sync::watch;

/// Transmitter side of the shutdown channel.
///
/// Cloneable; any holder can request shutdown for all subscribers.
#[derive(Debug, Clone)]
pub struct ShutdownTx(watch::Sender<bool>);

/// Receiver side of the shutdown channel.
#[derive(Debug, Clone)]
pub struct ShutdownRx(watch::Receiver<bool>);

/// Creates a new shutdown channel in the "running" state.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTx(tx), ShutdownRx(rx))
}

impl ShutdownTx {
    /// Broadcasts the shutdown signal to all subscribers.
    ///
    /// Idempotent; repeated calls are no-ops after the first.
    pub fn shutdown(&self) {
        self.0.send_replace(true);
    }

    /// Creates a new receiver subscribed to this channel.
    pub fn subscribe(&self) -> ShutdownRx {
        ShutdownRx(self.0.subscribe())
    }
}

impl ShutdownRx {
    /// Returns `true` if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        *self.0.borrow()
    }

    /// Waits until shutdown is requested.
    ///
    /// Returns immediately if shutdown was already requested before the call.
    /// If every [`ShutdownTx`] is dropped without a shutdown having been
    /// requested, none can ever arrive, so this future stays pending rather
    /// than report a shutdown nobody asked for.
    pub async fn wait_for_shutdown(&self) {
        let mut rx = self.0.clone();
        // `wait_for` checks the current value first, so a signal sent before
        // this call is never missed.
        if rx.wait_for(|shutdown| *shutdown).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    #[tokio::test]
    async fn shutdown_is_observed_by_late_subscribers() {
        let (tx, rx) = create_shutdown_channel();
        assert!(!rx.is_shutdown());

        tx.shutdown();

        let late_rx = tx.subscribe();
        assert!(late_rx.is_shutdown());
        late_rx.wait_for_shutdown().await;
    }

    #[tokio::test]
    async fn wait_for_shutdown_wakes_pending_waiters() {
        let (tx, rx) = create_shutdown_channel();

        let waiter = tokio::spawn(async move {
            rx.wait_for_shutdown().await;
        });

        tx.shutdown();
        waiter.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_transmitters_do_not_signal_shutdown() {
        let (tx, rx) = create_shutdown_channel();
        drop(tx);

        assert!(!rx.is_shutdown());

        // With no transmitter left the wait must stay pending, not resolve.
        let wait = tokio::time::timeout(Duration::from_secs(60), rx.wait_for_shutdown());
        assert!(wait.await.is_err());
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let (tx, rx) = create_shutdown_channel();
        tx.shutdown();
        tx.shutdown();
        assert!(rx.is_shutdown());
    }
}
