use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
};

use parking_lot::Mutex;

/// An idempotent release of a resource or subscription.
pub trait Disposable: Send + Sync {
    /// Release the resource. Only the first call has an effect.
    fn dispose(&self);
    fn is_disposed(&self) -> bool;
}

/// An external resource that can be closed once.
pub trait Closer: Send + 'static {
    type Error: fmt::Display;

    fn close(self) -> Result<(), Self::Error>;
}

/// The shared, always-disposed instance.
pub fn disposed() -> Arc<dyn Disposable> {
    static DISPOSED: OnceLock<Arc<dyn Disposable>> = OnceLock::new();
    DISPOSED.get_or_init(|| Arc::new(Disposed)).clone()
}

/// A disposable that flips its flag but runs nothing.
pub fn empty() -> Arc<dyn Disposable> {
    Arc::new(CleanUp::default())
}

/// A disposable running `on_disposed` exactly once.
pub fn from_fn(on_disposed: impl FnOnce() + Send + 'static) -> Arc<dyn Disposable> {
    let f: Box<dyn FnOnce() + Send> = Box::new(on_disposed);
    Arc::new(CleanUp::from(f))
}

/// A disposable closing `closer` exactly once. A close error is logged and dropped.
pub fn from_closer<C: Closer>(closer: C) -> Arc<dyn Disposable> {
    from_fn(move || {
        if let Err(err) = closer.close() {
            log::debug!("ignoring error while closing disposed resource: {}", err);
        }
    })
}

struct Disposed;

impl Disposable for Disposed {
    fn dispose(&self) {}

    fn is_disposed(&self) -> bool {
        true
    }
}

/// Runs its action on the first `dispose`. The flag decides the winner, so the
/// lock around the action is only ever taken once.
#[derive(Default)]
pub(crate) struct CleanUp {
    disposed: AtomicBool,
    on_disposed: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl Disposable for CleanUp {
    fn dispose(&self) {
        if self
            .disposed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if let Some(f) = self.on_disposed.lock().take() {
                f();
            }
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }
}

impl From<Box<dyn FnOnce() + Send>> for CleanUp {
    fn from(value: Box<dyn FnOnce() + Send>) -> Self {
        CleanUp {
            disposed: AtomicBool::new(false),
            on_disposed: Mutex::new(Some(value)),
        }
    }
}

impl fmt::Debug for CleanUp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanUp")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
