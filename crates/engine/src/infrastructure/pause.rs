//! Cooperative pause between actor turns.
//!
//! A pause is only ever observed at the gate, which the round loop visits
//! after an actor's turn has fully resolved. Nothing mid-action waits here.

use tokio::sync::watch;

#[derive(Debug, Clone)]
pub struct PauseGate {
    tx: std::sync::Arc<watch::Sender<bool>>,
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseGate {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            tx: std::sync::Arc::new(tx),
        }
    }

    /// Ask the loop to stop at the next gate.
    pub fn request(&self) {
        self.tx.send_replace(true);
    }

    pub fn resume(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_requested(&self) -> bool {
        *self.tx.borrow()
    }

    /// Return immediately unless a pause is requested; otherwise wait until
    /// `resume` is called.
    pub async fn wait_if_requested(&self) {
        let mut rx = self.tx.subscribe();
        if !*rx.borrow_and_update() {
            return;
        }
        tracing::info!("Paused between turns");
        // The sender lives in `self`, so `changed` cannot fail while we wait.
        while *rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                break;
            }
        }
        tracing::info!("Resumed");
    }
}
