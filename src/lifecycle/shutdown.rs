//! Daemon stop signal fan-out.
//!
//! `main` owns one [`Shutdown`]; the HTTP server holds a receiver and starts
//! draining when SIGTERM or Ctrl-C triggers it.

use tokio::sync::broadcast;

/// One-shot stop notice shared by the daemon's long-running tasks.
pub struct Shutdown {
    notify: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (notify, _) = broadcast::channel(1);
        Self { notify }
    }

    /// Receiver that resolves once the daemon is asked to stop.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notify.subscribe()
    }

    /// Ask every subscriber to stop. Returns how many were notified.
    pub fn trigger(&self) -> usize {
        let notified = self.notify.send(()).unwrap_or(0);
        tracing::info!(subscribers = notified, "Shutdown requested");
        notified
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.notify.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
