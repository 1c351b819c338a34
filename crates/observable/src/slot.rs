use std::{fmt, sync::Arc};

use arc_swap::ArcSwap;

use crate::Disposable;

/// What a [`DisposableSlot`] currently holds.
pub(crate) enum SlotState {
    Empty,
    Holding(Arc<dyn Disposable>),
    /// Disposed forever.
    Terminal,
}

impl SlotState {
    fn name(&self) -> &'static str {
        match self {
            SlotState::Empty => "Empty",
            SlotState::Holding(_) => "Holding",
            SlotState::Terminal => "Terminal",
        }
    }
}

/// Atomic cell holding at most one live [`Disposable`].
///
/// Every transition is a compare-and-swap on the state pointer, retried on
/// contention. Once the slot reaches [`SlotState::Terminal`] it never changes
/// again, and whatever it held has been disposed exactly once.
pub struct DisposableSlot {
    state: ArcSwap<SlotState>,
}

impl DisposableSlot {
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(SlotState::Empty),
        }
    }

    pub fn is_disposed(&self) -> bool {
        matches!(**self.state.load(), SlotState::Terminal)
    }

    /// Store `d`, disposing whatever was held before.
    ///
    /// Returns false (after disposing `d`) if the slot is already terminal.
    pub fn set(&self, d: Arc<dyn Disposable>) -> bool {
        self.store(d, true)
    }

    /// Store `d` without disposing the displaced content.
    ///
    /// Returns false (after disposing `d`) if the slot is already terminal.
    pub fn replace(&self, d: Arc<dyn Disposable>) -> bool {
        self.store(d, false)
    }

    /// Store `d` only if nothing was ever stored before.
    ///
    /// On any other state `d` is disposed and false is returned.
    pub fn set_once(&self, d: Arc<dyn Disposable>) -> bool {
        let current = self.state.load();
        if let SlotState::Empty = **current {
            let next = Arc::new(SlotState::Holding(d.clone()));
            let previous = self.state.compare_and_swap(&current, next);
            if Arc::ptr_eq(&*previous, &*current) {
                return true;
            }
        }
        log::trace!("set_once rejected on {} slot", self.state.load().name());
        d.dispose();
        false
    }

    /// Move the slot to its terminal state and dispose the held content.
    ///
    /// Returns true only for the call that performed the transition.
    pub fn dispose(&self) -> bool {
        if self.is_disposed() {
            return false;
        }
        let previous = self.state.swap(Arc::new(SlotState::Terminal));
        match &*previous {
            SlotState::Terminal => false,
            SlotState::Holding(d) => {
                d.dispose();
                true
            }
            SlotState::Empty => true,
        }
    }

    fn store(&self, d: Arc<dyn Disposable>, dispose_previous: bool) -> bool {
        let next = Arc::new(SlotState::Holding(d.clone()));
        loop {
            let current = self.state.load();
            if let SlotState::Terminal = **current {
                log::trace!("rejecting disposable on terminal slot");
                d.dispose();
                return false;
            }
            let previous = self.state.compare_and_swap(&current, next.clone());
            if Arc::ptr_eq(&*previous, &*current) {
                if let (true, SlotState::Holding(old)) = (dispose_previous, &**current) {
                    old.dispose();
                }
                return true;
            }
        }
    }
}

impl Default for DisposableSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DisposableSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DisposableSlot")
            .field(&self.state.load().name())
            .finish()
    }
}
