//! Cancellation signal shared between callers and the engine.
//!
//! The token wraps a channel that never carries a value. Cancelling drops the
//! only sender, which disconnects every receiver at once, so the signal can sit
//! in a `select!` next to regular message channels.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{bounded, Receiver, Sender};

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    tx: Mutex<Option<Sender<()>>>,
    rx: Receiver<()>,
}

/// A cloneable, process-wide cancellation signal.
///
/// All clones observe the same state. Cancelling is idempotent.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    /// Creates a token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = bounded::<()>(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                tx: Mutex::new(Some(tx)),
                rx,
            }),
        }
    }

    /// Fires the signal.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        // A poisoned lock still holds the sender; dropping it is all we need.
        let sender = match self.inner.tx.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);
    }

    /// Returns true once [`cancel`](Self::cancel) has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Receiver that becomes ready (disconnected) when the token is cancelled.
    ///
    /// Intended for `crossbeam_channel::select!`; it never yields a value.
    #[must_use]
    pub fn receiver(&self) -> &Receiver<()> {
        &self.inner.rx
    }

    /// Blocks until the token is cancelled.
    pub fn wait(&self) {
        let _ = self.inner.rx.recv();
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
