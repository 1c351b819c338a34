//! Push-based observables in rust
//!
//! An [`ObservableSource`] describes how to feed an [`Observer`]; [`create`]
//! builds one from a subscribe procedure and [`just`] from a list of items.
//! Subscriptions are cancelled through [`Disposable`] handles, which are
//! stored in lock-free [`DisposableSlot`]s.
//!
//! ## Example
//! ```
//! use std::sync::{Arc, Mutex};
//!
//! use rx_observable::{just, Context, Observable};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! just([1, 2, 3]).blocking_for_each(&Context::background(), move |v: i32| {
//!     sink.lock().unwrap().push(v)
//! })?;
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
//! # Ok::<(), rx_observable::Error>(())
//! ```

/// Public API.
mod blocking;
mod caller;
mod context;
pub mod disposable;
mod emitter;
mod error;
mod observable;
mod observer;
mod runner;
mod signature;
mod slot;

#[cfg(test)]
mod testing;

// Reexport of the public API.
#[doc(inline)]
pub use crate::blocking::*;
#[doc(inline)]
pub use crate::caller::*;
#[doc(inline)]
pub use crate::context::*;
#[doc(inline)]
pub use crate::disposable::{Closer, Disposable};
#[doc(inline)]
pub use crate::emitter::*;
#[doc(inline)]
pub use crate::error::*;
#[doc(inline)]
pub use crate::observable::*;
#[doc(inline)]
pub use crate::observer::*;
#[doc(inline)]
pub use crate::runner::*;
#[doc(inline)]
pub use crate::signature::*;
#[doc(inline)]
pub use crate::slot::*;
