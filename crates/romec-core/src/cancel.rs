//! Cooperative cancellation for in-flight compile requests.
//!
//! A [`CancelHandle`] / [`CancelSignal`] pair shares one `watch` flag. The
//! dispatcher races every suspension point against [`CancelSignal::cancelled`];
//! when the flag flips, the in-flight future is dropped.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::{CommandResult, CompileCommandError};

/// Create a connected handle/signal pair.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx: Arc::new(tx) }, CancelSignal { rx })
}

/// Fires cancellation. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observes cancellation.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation has been requested.
    ///
    /// Never resolves if every handle was dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Drive `fut` unless cancellation wins first.
    ///
    /// Checks the flag before polling, so an already-cancelled signal never
    /// starts the future.
    pub async fn guard<F>(&self, fut: F) -> CommandResult<F::Output>
    where
        F: Future,
    {
        if self.is_cancelled() {
            return Err(CompileCommandError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(CompileCommandError::Cancelled),
            out = fut => Ok(out),
        }
    }
}
