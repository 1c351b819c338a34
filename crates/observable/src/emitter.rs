use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use parking_lot::Mutex;

use crate::{
    Context, Disposable, DisposableSlot, Emitter, Error, ObservableEmitter, Observer,
};

/// Emitter of a [`create`](crate::create)d observable.
///
/// Pushes are dropped once the emitter is disposed, once it has delivered a
/// terminal signal, or while the context is cancelled. The emitter is also
/// the subscription handle the observer receives in `on_subscribe`; it lets
/// go of the observer when the subscription ends, so an observer may keep
/// that handle without keeping itself alive.
pub struct CreateEmitter<T: 'static> {
    resource: DisposableSlot,
    terminated: AtomicBool,
    observer: Mutex<Option<Arc<dyn Observer<T>>>>,
}

impl<T: 'static> CreateEmitter<T> {
    pub fn new(observer: Arc<dyn Observer<T>>) -> Arc<Self> {
        Arc::new(Self {
            resource: DisposableSlot::new(),
            terminated: AtomicBool::new(false),
            observer: Mutex::new(Some(observer)),
        })
    }

    fn is_live(&self, ctx: &Context) -> bool {
        !self.resource.is_disposed()
            && !self.terminated.load(Ordering::Acquire)
            && !ctx.is_cancelled()
    }

    /// The observer, while the subscription is live. Callbacks run outside the lock.
    fn live_observer(&self, ctx: &Context) -> Option<Arc<dyn Observer<T>>> {
        if self.is_live(ctx) {
            self.observer.lock().clone()
        } else {
            None
        }
    }

    /// Claim the single terminal signal, releasing the observer to the caller.
    fn terminate(&self, ctx: &Context) -> Option<Arc<dyn Observer<T>>> {
        if self.is_live(ctx) && !self.terminated.swap(true, Ordering::AcqRel) {
            self.observer.lock().take()
        } else {
            None
        }
    }

    fn release(&self) {
        self.resource.dispose();
        self.observer.lock().take();
    }
}

impl<T: 'static> Emitter<T> for CreateEmitter<T> {
    fn on_next(&self, ctx: &Context, value: T) {
        if let Some(observer) = self.live_observer(ctx) {
            observer.on_next(ctx, value);
        }
    }

    fn on_error(&self, ctx: &Context, err: Error) {
        if let Some(observer) = self.terminate(ctx) {
            observer.on_error(ctx, err);
            self.resource.dispose();
        }
    }

    fn on_complete(&self, ctx: &Context) {
        if let Some(observer) = self.terminate(ctx) {
            observer.on_complete(ctx);
            self.resource.dispose();
        }
    }
}

impl<T: 'static> ObservableEmitter<T> for CreateEmitter<T> {
    fn set_disposable(&self, disposable: Arc<dyn Disposable>) {
        self.resource.set(disposable);
    }

    fn is_disposed(&self) -> bool {
        self.resource.is_disposed()
    }
}

impl<T: 'static> Disposable for CreateEmitter<T> {
    fn dispose(&self) {
        self.release();
    }

    fn is_disposed(&self) -> bool {
        self.resource.is_disposed()
    }
}
