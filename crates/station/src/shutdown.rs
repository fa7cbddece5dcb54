//! Cooperative cancellation for the polling loop.

use std::{future::Future, io};

use tokio::sync::watch;

/// Fires the paired [`Shutdown`] handles.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Observes whether shutdown was requested.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Fires once `signal` resolves. If the signal cannot be listened for,
    /// the error is logged and shutdown is never requested.
    pub async fn trigger_on<F>(self, signal: F)
    where
        F: Future<Output = io::Result<()>>,
    {
        match signal.await {
            Ok(()) => {
                tracing::info!("shutdown requested");
                self.trigger();
            }
            Err(e) => tracing::error!(error = %e, "failed to listen for signals"),
        }
    }
}

impl Shutdown {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested. Never resolves if the trigger is
    /// dropped without firing.
    pub async fn triggered(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
