use std::{
    fmt, mem,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

/// Shared cancellation state.
///
/// Cancelling drops `done_tx`, which disconnects every clone of `done_rx`.
/// Children register themselves here so the cancellation can be pushed down
/// to them.
struct ContextState {
    cancellable: bool,
    cancelled: AtomicBool,
    done_tx: Mutex<Option<Sender<()>>>,
    done_rx: Receiver<()>,
    children: Mutex<Vec<Weak<ContextState>>>,
}

impl ContextState {
    fn new(cancellable: bool) -> Arc<Self> {
        let (done_tx, done_rx) = crossbeam_channel::bounded(0);
        Arc::new(Self {
            cancellable,
            cancelled: AtomicBool::new(false),
            done_tx: Mutex::new(Some(done_tx)),
            done_rx,
            children: Mutex::new(Vec::new()),
        })
    }

    fn cancel(&self) {
        if !self.cancellable || self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        self.done_tx.lock().take();

        // The flag is set before the registry is drained, so a child that
        // registers concurrently either lands in this batch or sees the flag.
        let children = mem::take(&mut *self.children.lock());
        for child in children {
            if let Some(child) = child.upgrade() {
                child.cancel();
            }
        }
    }

    #[inline]
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Cooperative, hierarchical cancellation token passed through every
/// protocol call.
///
/// Clones share state. Cancelling a context cancels all of its descendants;
/// cancelling a child leaves the parent untouched.
#[derive(Clone)]
pub struct Context {
    state: Arc<ContextState>,
}

impl Context {
    /// A context that is never cancelled. [`cancel`](Self::cancel) is a no-op on it.
    pub fn background() -> Self {
        Self {
            state: ContextState::new(false),
        }
    }

    /// A cancellable root context.
    pub fn new_root() -> Self {
        Self {
            state: ContextState::new(true),
        }
    }

    /// Create a cancellable context linked to this one.
    pub fn new_child(&self) -> Self {
        let child = ContextState::new(true);
        {
            let mut children = self.state.children.lock();
            if self.state.is_cancelled() {
                drop(children);
                child.cancel();
            } else {
                children.retain(|c| c.strong_count() > 0);
                children.push(Arc::downgrade(&child));
            }
        }
        Self { state: child }
    }

    /// Cancel this context and every descendant. Idempotent.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// Whether this context (or an ancestor) has been cancelled.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// A receiver that disconnects once the context is cancelled.
    ///
    /// Nothing is ever sent on it, so a `recv` returns only after
    /// cancellation, including one that happened before the call.
    pub fn done(&self) -> &Receiver<()> {
        &self.state.done_rx
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}
