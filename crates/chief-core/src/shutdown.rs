//! Cancellation and per-call time budgets
//!
//! Every provider call, read or write, goes through [`guarded`], which
//! bounds it by a timeout and races it against the run's [`ShutdownSignal`].

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;

use crate::error::{Error, Operation, Result};

/// Receiving side of a shutdown request
///
/// Clones observe the same trigger.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: Option<watch::Receiver<bool>>,
}

/// Sending side of a shutdown request
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Request shutdown; idempotent
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl ShutdownSignal {
    /// Create a connected trigger/signal pair
    pub fn channel() -> (ShutdownTrigger, ShutdownSignal) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, ShutdownSignal { rx: Some(rx) })
    }

    /// A signal that never fires
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Whether shutdown has been requested
    pub fn is_triggered(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Resolve once shutdown is requested
    ///
    /// Pends forever if the trigger is dropped without firing.
    pub async fn triggered(&mut self) {
        if let Some(rx) = self.rx.as_mut() {
            let closed = rx.wait_for(|triggered| *triggered).await.is_err();
            if !closed {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::never()
    }
}

/// Run one provider call under a timeout, aborting on shutdown
pub async fn guarded<T, F>(
    operation: Operation,
    timeout: Duration,
    shutdown: &mut ShutdownSignal,
    call: F,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    if shutdown.is_triggered() {
        return Err(Error::Cancelled(format!("before {}", operation)));
    }

    tokio::select! {
        biased;

        _ = shutdown.triggered() => Err(Error::Cancelled(format!("during {}", operation))),

        result = tokio::time::timeout(timeout, call) => match result {
            Ok(inner) => inner,
            Err(_) => Err(Error::Timeout { operation, timeout }),
        },
    }
}
