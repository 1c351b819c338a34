use std::{any::Any, error::Error as StdError, fmt};

use parking_lot::Mutex;
use thiserror::Error;

/// Why a callable could not be adapted into a [`Runner`](crate::Runner) or
/// [`Caller`](crate::Caller).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdaptError {
    #[error("call cannot be nil")]
    NilCallable,
    #[error("call should be a function")]
    NotCallable,
    #[error("call should have either 1 or 2 arguments but got {0}")]
    InvalidArity(usize),
    #[error("the first argument should be {expected} but got {actual}")]
    InvalidFirstParameter {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("call should return either {expected} values but got {actual}")]
    InvalidReturnArity {
        expected: &'static str,
        actual: usize,
    },
    #[error("the second return value can only be error but got {0}")]
    InvalidSecondReturn(&'static str),
    #[error("the first return value can only be error but got {0}")]
    InvalidReturnType(&'static str),
    #[error("call should receive {expected} but accepts {actual}")]
    ReceiveTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("call should return {expected} but returns {actual}")]
    ReturnTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },
}

/// The error carried by `on_error` and returned by consumers.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Adapt(#[from] AdaptError),
    #[error(transparent)]
    Panic(#[from] PanicError),
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Custom(Box<dyn StdError + Send + Sync + 'static>),
}

impl Error {
    pub fn new<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error::Custom(Box::new(err))
    }

    pub fn msg(message: impl Into<String>) -> Self {
        Error::Message(message.into())
    }

    /// Turn a payload caught by `catch_unwind` into an error.
    ///
    /// A payload that already is an [`Error`] is returned as is.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        match payload.downcast::<Error>() {
            Ok(err) => *err,
            Err(payload) => Error::Panic(PanicError::new(payload)),
        }
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, Error::Panic(_))
    }

    /// Borrow the wrapped error of a [`Error::Custom`] as a concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: StdError + 'static,
    {
        match self {
            Error::Custom(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }
}

/// A panic raised inside a subscribe procedure.
pub struct PanicError {
    message: String,
    payload: Mutex<Box<dyn Any + Send>>,
}

impl PanicError {
    fn new(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };
        Self {
            message,
            payload: Mutex::new(payload),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The original payload, e.g. for `std::panic::resume_unwind`.
    pub fn into_payload(self) -> Box<dyn Any + Send> {
        self.payload.into_inner()
    }
}

impl fmt::Display for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panic: {}", self.message)
    }
}

impl fmt::Debug for PanicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanicError")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl StdError for PanicError {}

#[cfg(test)]
mod test {
    use std::panic;

    use crate::{AdaptError, Error};

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn adapt_errors_render_their_shape() {
        assert_eq!(
            AdaptError::InvalidArity(3).to_string(),
            "call should have either 1 or 2 arguments but got 3"
        );
        let err: Error = AdaptError::InvalidReturnArity {
            expected: "0 or 1",
            actual: 2,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "call should return either 0 or 1 values but got 2"
        );
    }

    #[test]
    fn panic_payloads() {
        let err = Error::from_panic(panic::catch_unwind(|| panic!("oops")).unwrap_err());
        assert!(err.is_panic());
        assert_eq!(err.to_string(), "panic: oops");

        let err = Error::from_panic(Box::new(42u32));
        let Error::Panic(inner) = err else {
            panic!("expected a panic error");
        };
        assert_eq!(*inner.into_payload().downcast::<u32>().unwrap(), 42);
    }

    #[test]
    fn error_payload_passes_through() {
        let err = Error::from_panic(Box::new(Error::new(Boom)));
        assert!(!err.is_panic());
        assert!(err.downcast_ref::<Boom>().is_some());
        assert_eq!(err.to_string(), "boom");
    }
}
