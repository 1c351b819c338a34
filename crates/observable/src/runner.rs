use std::{fmt, sync::Arc};

use crate::{
    signature::{self, Contextual, ContextualFallible, Fallible, Plain},
    AdaptError, Context, Error, Function, Signature, TypeInfo,
};

type Run<T> = dyn Fn(&Context, T) -> Result<(), Error> + Send + Sync;

/// A side-effecting consumer of `T`, adapted once from a user callable.
///
/// Accepted shapes are `Fn(T)`, `Fn(T) -> Result<(), Error>` and the same two
/// with a leading `&Context`. [`run`](Self::run) always takes the context and
/// always yields a result; the adapter fills in whatever the callable lacks.
pub struct Runner<T> {
    receive_type: TypeInfo,
    has_context: bool,
    has_error: bool,
    run: Arc<Run<T>>,
}

impl<T: Send + 'static> Runner<T> {
    /// Adapt a typed closure.
    pub fn new<M, F>(run: F) -> Result<Self, AdaptError>
    where
        F: IntoRunner<T, M>,
    {
        run.into_runner()
    }

    /// Adapt an arbitrary value, which has to be a [`Function`] of a runner shape.
    pub fn of<A: std::any::Any>(call: Option<&A>) -> Result<Self, AdaptError> {
        <Function as IntoRunner<T, Function>>::into_runner(Function::lookup(call)?.clone())
    }

    fn inspect(signature: &Signature, run: Arc<Run<T>>) -> Result<Self, AdaptError> {
        let inputs = signature.inspect_inputs()?;
        let has_error = match signature.outputs() {
            [] => false,
            [ret] if *ret == TypeInfo::error() => true,
            [ret] => return Err(AdaptError::InvalidReturnType(ret.name())),
            other => {
                return Err(AdaptError::InvalidReturnArity {
                    expected: "0 or 1",
                    actual: other.len(),
                })
            }
        };
        let expected = TypeInfo::of::<T>();
        if inputs.receive_type != expected {
            return Err(AdaptError::ReceiveTypeMismatch {
                expected: expected.name(),
                actual: inputs.receive_type.name(),
            });
        }
        Ok(Self {
            receive_type: inputs.receive_type,
            has_context: inputs.has_context,
            has_error,
            run,
        })
    }
}

impl<T> Runner<T> {
    pub fn receive_type(&self) -> TypeInfo {
        self.receive_type
    }

    pub fn has_context(&self) -> bool {
        self.has_context
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn run(&self, ctx: &Context, value: T) -> Result<(), Error> {
        (self.run)(ctx, value)
    }
}

impl<T> Clone for Runner<T> {
    fn clone(&self) -> Self {
        Self {
            receive_type: self.receive_type,
            has_context: self.has_context,
            has_error: self.has_error,
            run: self.run.clone(),
        }
    }
}

impl<T> fmt::Debug for Runner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner")
            .field("receive_type", &self.receive_type)
            .field("has_context", &self.has_context)
            .field("has_error", &self.has_error)
            .finish()
    }
}

/// Conversion into a [`Runner`]. `M` names the accepted shape.
pub trait IntoRunner<T, M> {
    fn into_runner(self) -> Result<Runner<T>, AdaptError>;
}

impl<T, F> IntoRunner<T, Plain> for F
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    fn into_runner(self) -> Result<Runner<T>, AdaptError> {
        let signature = Signature::new(vec![TypeInfo::of::<T>()], vec![]);
        Runner::inspect(
            &signature,
            Arc::new(move |_: &Context, value: T| {
                self(value);
                Ok(())
            }),
        )
    }
}

impl<T, F> IntoRunner<T, Fallible> for F
where
    T: Send + 'static,
    F: Fn(T) -> Result<(), Error> + Send + Sync + 'static,
{
    fn into_runner(self) -> Result<Runner<T>, AdaptError> {
        let signature = Signature::new(vec![TypeInfo::of::<T>()], vec![TypeInfo::error()]);
        Runner::inspect(&signature, Arc::new(move |_: &Context, value: T| self(value)))
    }
}

impl<T, F> IntoRunner<T, Contextual> for F
where
    T: Send + 'static,
    F: Fn(&Context, T) + Send + Sync + 'static,
{
    fn into_runner(self) -> Result<Runner<T>, AdaptError> {
        let signature = Signature::new(vec![TypeInfo::context(), TypeInfo::of::<T>()], vec![]);
        Runner::inspect(
            &signature,
            Arc::new(move |ctx: &Context, value: T| {
                self(ctx, value);
                Ok(())
            }),
        )
    }
}

impl<T, F> IntoRunner<T, ContextualFallible> for F
where
    T: Send + 'static,
    F: Fn(&Context, T) -> Result<(), Error> + Send + Sync + 'static,
{
    fn into_runner(self) -> Result<Runner<T>, AdaptError> {
        let signature = Signature::new(
            vec![TypeInfo::context(), TypeInfo::of::<T>()],
            vec![TypeInfo::error()],
        );
        Runner::inspect(&signature, Arc::new(self))
    }
}

impl<T: Send + 'static> IntoRunner<T, Function> for Function {
    fn into_runner(self) -> Result<Runner<T>, AdaptError> {
        let inputs = self.signature().inspect_inputs()?;
        let has_context = inputs.has_context;
        let has_error = self.signature().outputs().len() == 1;
        let shape = self.signature().clone();
        Runner::inspect(
            &shape,
            Arc::new(move |ctx: &Context, value: T| {
                let outputs = self.call(signature::arguments(ctx, has_context, value));
                if has_error {
                    signature::take_error(outputs.into_iter().next())
                } else {
                    Ok(())
                }
            }),
        )
    }
}
