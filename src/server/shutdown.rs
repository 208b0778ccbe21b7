//! Graceful shutdown primitives for the rchat server
//!
//! Two single-fire signals coordinate teardown:
//! - [`ShutdownController`] / [`ShutdownSignal`]: the interrupt watcher fires
//!   the controller, the serving task observes the signal and starts draining
//! - [`CompletionLatch`]: fired by the serving task once the drain (or a
//!   transport failure) has finished; the caller blocks on it before exiting

use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

/// Shutdown signal receiver
///
/// Cloned into every component that needs to know when draining starts.
#[derive(Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait for shutdown signal
    pub async fn wait(&mut self) {
        // Wait until the value becomes true
        while !*self.receiver.borrow_and_update() {
            if self.receiver.changed().await.is_err() {
                // Controller dropped without firing, treat as shutdown
                break;
            }
        }
    }

    /// Check if shutdown was signaled (non-blocking)
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Controller for triggering shutdown
///
/// Fires at most once. Not `Clone`: exactly one owner may start a shutdown.
pub struct ShutdownController {
    sender: watch::Sender<bool>,
}

impl ShutdownController {
    /// Trigger shutdown
    ///
    /// Returns `true` only for the call that actually fired; later calls are
    /// no-ops and return `false`.
    pub fn shutdown(&self) -> bool {
        let fired = self.sender.send_if_modified(|triggered| {
            if *triggered {
                false
            } else {
                *triggered = true;
                true
            }
        });
        if fired {
            info!("Shutdown signal sent");
        }
        fired
    }
}

/// Create a new shutdown signal pair
///
/// Returns (controller, signal) where:
/// - controller: Used to trigger shutdown
/// - signal: Cloned and passed to components that need to listen
pub fn shutdown_channel() -> (ShutdownController, ShutdownSignal) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownController { sender }, ShutdownSignal { receiver })
}

/// How a server run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// An interrupt was observed and in-flight requests drained
    Drained,
    /// Serving stopped on a transport error
    Failed,
}

/// One-shot completion latch
///
/// Fired exactly once with the [`Termination`] reason. Any number of clones
/// may [`wait`](CompletionLatch::wait), before or after the latch fires;
/// once fired, waiting returns immediately.
#[derive(Clone)]
pub struct CompletionLatch {
    sender: Arc<watch::Sender<Option<Termination>>>,
}

impl CompletionLatch {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Fire the latch
    ///
    /// Returns `true` if this call fired it, `false` if it had already fired
    /// (the first reason is kept).
    pub fn fire(&self, termination: Termination) -> bool {
        self.sender.send_if_modified(|slot| {
            if slot.is_some() {
                false
            } else {
                *slot = Some(termination);
                true
            }
        })
    }

    /// The termination reason, if the latch has fired (non-blocking)
    pub fn termination(&self) -> Option<Termination> {
        *self.sender.borrow()
    }

    pub fn is_fired(&self) -> bool {
        self.termination().is_some()
    }

    /// Wait until the latch fires and return the reason
    pub async fn wait(&self) -> Termination {
        let mut receiver = self.sender.subscribe();
        loop {
            if let Some(termination) = *receiver.borrow_and_update() {
                return termination;
            }
            // The sender lives in `self`, so the channel cannot close here
            if receiver.changed().await.is_err() {
                return Termination::Failed;
            }
        }
    }
}

impl Default for CompletionLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait for a single SIGINT (Ctrl+C)
///
/// If the handler cannot be installed the error is logged and this future
/// never resolves: the server keeps running without graceful shutdown.
pub async fn wait_for_interrupt() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received SIGINT"),
        Err(e) => {
            error!(error = %e, "Failed to listen for SIGINT, graceful shutdown disabled");
            std::future::pending::<()>().await;
        }
    }
}
