//! Shutdown coordination for the controller.

use tokio::sync::broadcast;

/// Coordinator for stopping the reconciliation loop.
///
/// The loop holds a receiver and exits at its next sleep once the
/// signal fires; an in-flight tick is always finished first.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Fire once the process receives SIGINT or SIGTERM.
    pub async fn trigger_on_signal(self) {
        super::signals::wait_for_termination().await;
        tracing::info!("Termination signal received, stopping after the current tick");
        self.trigger();
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
