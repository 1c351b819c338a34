use std::sync::Arc;

use crate::{Context, Disposable, Error, TypeInfo};

/// Consumer side of a subscription.
///
/// `on_subscribe` is called exactly once, before anything else. After
/// `on_error` or `on_complete` nothing further is delivered.
pub trait Observer<T: 'static>: Send + Sync {
    fn declared_type(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    /// Receives the handle that cancels this subscription.
    fn on_subscribe(&self, subscription: Arc<dyn Disposable>);
    fn on_next(&self, ctx: &Context, value: T);
    fn on_error(&self, ctx: &Context, err: Error);
    fn on_complete(&self, ctx: &Context);
}

/// A source of signals in push fashion.
pub trait Emitter<T>: Send + Sync {
    fn on_next(&self, ctx: &Context, value: T);
    fn on_error(&self, ctx: &Context, err: Error);
    fn on_complete(&self, ctx: &Context);
}

/// The emitter handed to a subscribe procedure.
pub trait ObservableEmitter<T>: Emitter<T> {
    /// Bind a resource to the subscription. It replaces (and disposes) the
    /// previous one and is disposed when the subscription ends.
    fn set_disposable(&self, disposable: Arc<dyn Disposable>);
    fn is_disposed(&self) -> bool;
}

pub type EmitterRef<T> = Arc<dyn ObservableEmitter<T>>;
