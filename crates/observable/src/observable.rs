use std::{
    any::type_name,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use crate::{
    BlockingForEachObserver, Context, CreateEmitter, Emitter, EmitterRef, Error, IntoRunner,
    Observer, TypeInfo,
};

/// A cold, repeatable description of how to feed an [`Observer`].
pub trait ObservableSource<T: 'static> {
    fn declared_type(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    /// Run the subscription procedure once for `observer`.
    ///
    /// Returns when the procedure returns, which for a producer that hands
    /// its work to another thread is before the stream terminates.
    fn subscribe(&self, ctx: &Context, observer: Arc<dyn Observer<T>>);
}

/// Operators available on every [`ObservableSource`].
pub trait Observable<T: Send + 'static>: ObservableSource<T> {
    /// Feed every element to `consumer` on the emitting thread and block until
    /// the stream terminates.
    ///
    /// Returns the stream's error, or the first error the consumer returns.
    /// If `ctx` is cancelled before an outcome arrives this returns `Ok(())`,
    /// exactly as a completed stream would. An invalid consumer is reported
    /// before subscribing.
    fn blocking_for_each<M, F>(&self, ctx: &Context, consumer: F) -> Result<(), Error>
    where
        Self: Sized,
        F: IntoRunner<T, M>,
    {
        let observer = BlockingForEachObserver::new(consumer.into_runner()?);
        self.subscribe(ctx, observer.clone());
        observer.wait(ctx)
    }
}

impl<T: Send + 'static, S: ObservableSource<T> + ?Sized> Observable<T> for S {}

type SubscribeFn<T> = dyn Fn(&Context, EmitterRef<T>) + Send + Sync;

/// Observable built from a subscribe procedure, see [`create`] and [`just`].
pub struct ObservableCreate<T> {
    on_subscribe: Arc<SubscribeFn<T>>,
}

impl<T> Clone for ObservableCreate<T> {
    fn clone(&self) -> Self {
        Self {
            on_subscribe: self.on_subscribe.clone(),
        }
    }
}

/// Build an observable whose subscriptions run `on_subscribe`.
///
/// A panic escaping `on_subscribe` is caught and delivered as `on_error`.
pub fn create<T, F>(on_subscribe: F) -> ObservableCreate<T>
where
    T: 'static,
    F: Fn(&Context, EmitterRef<T>) + Send + Sync + 'static,
{
    ObservableCreate {
        on_subscribe: Arc::new(on_subscribe),
    }
}

/// Build an observable emitting `items` in order, then completing.
pub fn just<T, I>(items: I) -> ObservableCreate<T>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = T>,
{
    let items: Arc<[T]> = items.into_iter().collect();
    create(move |ctx, emitter| {
        for item in items.iter() {
            if emitter.is_disposed() {
                return;
            }
            emitter.on_next(ctx, item.clone());
        }
        emitter.on_complete(ctx);
    })
}

impl<T: 'static> ObservableSource<T> for ObservableCreate<T> {
    fn subscribe(&self, ctx: &Context, observer: Arc<dyn Observer<T>>) {
        let emitter = CreateEmitter::new(observer.clone());
        observer.on_subscribe(emitter.clone());

        log::trace!("subscribing observer of {}", type_name::<T>());
        let handle: EmitterRef<T> = emitter.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| (self.on_subscribe)(ctx, handle)));
        match outcome {
            Ok(()) => log::trace!("subscribe procedure of {} returned", type_name::<T>()),
            Err(payload) => {
                let err = Error::from_panic(payload);
                log::warn!("subscribe procedure of {} panicked: {}", type_name::<T>(), err);
                emitter.on_error(ctx, err);
            }
        }
    }
}
