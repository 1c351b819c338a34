use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Context, Disposable, Error, Observer};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Event<T> {
    Subscribe,
    Next(T),
    Error(String),
    Complete,
}

/// Observer recording every signal it receives.
pub(crate) struct Recorder<T> {
    events: Mutex<Vec<Event<T>>>,
    subscription: Mutex<Option<Arc<dyn Disposable>>>,
}

impl<T: Clone> Recorder<T> {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            subscription: Mutex::new(None),
        })
    }

    pub(crate) fn events(&self) -> Vec<Event<T>> {
        self.events.lock().clone()
    }

    pub(crate) fn subscription(&self) -> Option<Arc<dyn Disposable>> {
        self.subscription.lock().clone()
    }
}

impl<T: Send + 'static> Observer<T> for Recorder<T> {
    fn on_subscribe(&self, subscription: Arc<dyn Disposable>) {
        *self.subscription.lock() = Some(subscription);
        self.events.lock().push(Event::Subscribe);
    }

    fn on_next(&self, _: &Context, value: T) {
        self.events.lock().push(Event::Next(value));
    }

    fn on_error(&self, _: &Context, err: Error) {
        self.events.lock().push(Event::Error(err.to_string()));
    }

    fn on_complete(&self, _: &Context) {
        self.events.lock().push(Event::Complete);
    }
}
