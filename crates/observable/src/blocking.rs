use std::sync::Arc;

use crossbeam_channel::{bounded, select, Receiver, Sender};

use crate::{Context, Disposable, DisposableSlot, Error, Observer, Runner, TypeInfo};

/// Observer behind [`Observable::blocking_for_each`](crate::Observable::blocking_for_each).
///
/// Runs the consumer for every element on the emitting thread and parks the
/// subscriber in [`wait`](Self::wait) until the stream reaches an outcome.
/// The first outcome wins; it releases the upstream and fills the
/// single-slot notification channel.
pub struct BlockingForEachObserver<T> {
    upstream: DisposableSlot,
    consumer: Runner<T>,
    notify_tx: Sender<Option<Error>>,
    notify_rx: Receiver<Option<Error>>,
}

impl<T: Send + 'static> BlockingForEachObserver<T> {
    pub fn new(consumer: Runner<T>) -> Arc<Self> {
        let (notify_tx, notify_rx) = bounded(1);
        Arc::new(Self {
            upstream: DisposableSlot::new(),
            consumer,
            notify_tx,
            notify_rx,
        })
    }

    fn is_active(&self, ctx: &Context) -> bool {
        !self.upstream.is_disposed() && !ctx.is_cancelled()
    }

    fn finish(&self, outcome: Option<Error>) {
        if self.upstream.dispose() {
            // Capacity 1 and a single winner: this never blocks.
            let _ = self.notify_tx.try_send(outcome);
        }
    }

    /// Block until the stream terminates or `ctx` is cancelled.
    ///
    /// An outcome already delivered takes precedence over cancellation.
    pub fn wait(&self, ctx: &Context) -> Result<(), Error> {
        let outcome = match self.notify_rx.try_recv() {
            Ok(outcome) => outcome,
            Err(_) => select! {
                recv(self.notify_rx) -> outcome => outcome.unwrap_or(None),
                recv(ctx.done()) -> _ => {
                    log::debug!("blocking for each cancelled before the stream terminated");
                    None
                }
            },
        };
        if self.upstream.dispose() {
            log::debug!("released upstream of a blocking for each");
        }
        outcome.map_or(Ok(()), Err)
    }
}

impl<T: Send + 'static> Observer<T> for BlockingForEachObserver<T> {
    fn declared_type(&self) -> TypeInfo {
        self.consumer.receive_type()
    }

    fn on_subscribe(&self, subscription: Arc<dyn Disposable>) {
        self.upstream.set_once(subscription);
    }

    fn on_next(&self, ctx: &Context, value: T) {
        if !self.is_active(ctx) {
            return;
        }
        if let Err(err) = self.consumer.run(ctx, value) {
            log::trace!("consumer failed, stopping the stream: {}", err);
            self.finish(Some(err));
        }
    }

    fn on_error(&self, ctx: &Context, err: Error) {
        if self.is_active(ctx) {
            self.finish(Some(err));
        }
    }

    fn on_complete(&self, ctx: &Context) {
        if self.is_active(ctx) {
            self.finish(None);
        }
    }
}

impl<T: Send + 'static> Disposable for BlockingForEachObserver<T> {
    fn dispose(&self) {
        self.upstream.dispose();
    }

    fn is_disposed(&self) -> bool {
        self.upstream.is_disposed()
    }
}
