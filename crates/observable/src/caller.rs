use std::{any::Any, fmt, sync::Arc};

use crate::{
    signature::{self, Contextual, ContextualFallible, Fallible, Plain},
    AdaptError, Context, Error, Function, Signature, TypeInfo,
};

type Call<T, R> = dyn Fn(&Context, T) -> Result<R, Error> + Send + Sync;

/// A value-producing callable from `T` to `R`, adapted once from a user callable.
///
/// Accepted shapes are `Fn(T) -> R`, `Fn(T) -> Result<R, Error>` and the same
/// two with a leading `&Context`. A present error wins over the value.
pub struct Caller<T, R> {
    receive_type: TypeInfo,
    return_type: TypeInfo,
    has_context: bool,
    has_error: bool,
    call: Arc<Call<T, R>>,
}

impl<T, R> Caller<T, R>
where
    T: Send + 'static,
    R: 'static,
{
    pub fn new<M, F>(call: F) -> Result<Self, AdaptError>
    where
        F: IntoCaller<T, R, M>,
    {
        call.into_caller()
    }

    /// Adapt an arbitrary value, which has to be a [`Function`] of a caller shape.
    pub fn of<A: Any>(call: Option<&A>) -> Result<Self, AdaptError> {
        <Function as IntoCaller<T, R, Function>>::into_caller(Function::lookup(call)?.clone())
    }

    fn inspect(signature: &Signature, call: Arc<Call<T, R>>) -> Result<Self, AdaptError> {
        let inputs = signature.inspect_inputs()?;
        let (return_type, has_error) = match signature.outputs() {
            [ret] => (*ret, false),
            [ret, err] if *err == TypeInfo::error() => (*ret, true),
            [_, err] => return Err(AdaptError::InvalidSecondReturn(err.name())),
            other => {
                return Err(AdaptError::InvalidReturnArity {
                    expected: "1 or 2",
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
        let expected = TypeInfo::of::<R>();
        if return_type != expected {
            return Err(AdaptError::ReturnTypeMismatch {
                expected: expected.name(),
                actual: return_type.name(),
            });
        }
        Ok(Self {
            receive_type: inputs.receive_type,
            return_type,
            has_context: inputs.has_context,
            has_error,
            call,
        })
    }
}

impl<T, R> Caller<T, R> {
    pub fn receive_type(&self) -> TypeInfo {
        self.receive_type
    }

    pub fn return_type(&self) -> TypeInfo {
        self.return_type
    }

    pub fn has_context(&self) -> bool {
        self.has_context
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn call(&self, ctx: &Context, value: T) -> Result<R, Error> {
        (self.call)(ctx, value)
    }
}

impl<T, R> Clone for Caller<T, R> {
    fn clone(&self) -> Self {
        Self {
            receive_type: self.receive_type,
            return_type: self.return_type,
            has_context: self.has_context,
            has_error: self.has_error,
            call: self.call.clone(),
        }
    }
}

impl<T, R> fmt::Debug for Caller<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caller")
            .field("receive_type", &self.receive_type)
            .field("return_type", &self.return_type)
            .field("has_context", &self.has_context)
            .field("has_error", &self.has_error)
            .finish()
    }
}

/// Conversion into a [`Caller`]. `M` names the accepted shape.
pub trait IntoCaller<T, R, M> {
    fn into_caller(self) -> Result<Caller<T, R>, AdaptError>;
}

impl<T, R, F> IntoCaller<T, R, Plain> for F
where
    T: Send + 'static,
    R: 'static,
    F: Fn(T) -> R + Send + Sync + 'static,
{
    fn into_caller(self) -> Result<Caller<T, R>, AdaptError> {
        let signature = Signature::new(vec![TypeInfo::of::<T>()], vec![TypeInfo::of::<R>()]);
        Caller::inspect(&signature, Arc::new(move |_: &Context, value: T| Ok(self(value))))
    }
}

impl<T, R, F> IntoCaller<T, R, Fallible> for F
where
    T: Send + 'static,
    R: 'static,
    F: Fn(T) -> Result<R, Error> + Send + Sync + 'static,
{
    fn into_caller(self) -> Result<Caller<T, R>, AdaptError> {
        let signature = Signature::new(
            vec![TypeInfo::of::<T>()],
            vec![TypeInfo::of::<R>(), TypeInfo::error()],
        );
        Caller::inspect(&signature, Arc::new(move |_: &Context, value: T| self(value)))
    }
}

impl<T, R, F> IntoCaller<T, R, Contextual> for F
where
    T: Send + 'static,
    R: 'static,
    F: Fn(&Context, T) -> R + Send + Sync + 'static,
{
    fn into_caller(self) -> Result<Caller<T, R>, AdaptError> {
        let signature = Signature::new(
            vec![TypeInfo::context(), TypeInfo::of::<T>()],
            vec![TypeInfo::of::<R>()],
        );
        Caller::inspect(
            &signature,
            Arc::new(move |ctx: &Context, value: T| Ok(self(ctx, value))),
        )
    }
}

impl<T, R, F> IntoCaller<T, R, ContextualFallible> for F
where
    T: Send + 'static,
    R: 'static,
    F: Fn(&Context, T) -> Result<R, Error> + Send + Sync + 'static,
{
    fn into_caller(self) -> Result<Caller<T, R>, AdaptError> {
        let signature = Signature::new(
            vec![TypeInfo::context(), TypeInfo::of::<T>()],
            vec![TypeInfo::of::<R>(), TypeInfo::error()],
        );
        Caller::inspect(&signature, Arc::new(self))
    }
}

impl<T, R> IntoCaller<T, R, Function> for Function
where
    T: Send + 'static,
    R: 'static,
{
    fn into_caller(self) -> Result<Caller<T, R>, AdaptError> {
        let has_context = self.signature().inspect_inputs()?.has_context;
        let has_error = self.signature().outputs().len() == 2;
        let shape = self.signature().clone();
        Caller::inspect(
            &shape,
            Arc::new(move |ctx: &Context, value: T| {
                let mut outputs = self
                    .call(signature::arguments(ctx, has_context, value))
                    .into_iter();
                let ret = outputs.next();
                if has_error {
                    signature::take_error(outputs.next())?;
                }
                signature::take_output::<R>(ret)
            }),
        )
    }
}

#[cfg(test)]
mod test {
    use crate::{AdaptError, Caller, Context, Error, Function, TypeInfo, Value};

    #[derive(Debug, thiserror::Error)]
    #[error("test")]
    struct TestError;

    #[test]
    fn caller_of_reports_shape() {
        let cases = vec![
            (
                "SimpleFunction",
                Function::builder().param::<i32>().returns::<i32>(),
                false,
                false,
            ),
            (
                "FunctionWithContext",
                Function::builder()
                    .param::<Context>()
                    .param::<i32>()
                    .returns::<i32>(),
                true,
                false,
            ),
            (
                "FunctionWithError",
                Function::builder()
                    .param::<i32>()
                    .returns::<i32>()
                    .returns_error(),
                false,
                true,
            ),
            (
                "FunctionWithContextAndError",
                Function::builder()
                    .param::<Context>()
                    .param::<i32>()
                    .returns::<i32>()
                    .returns_error(),
                true,
                true,
            ),
        ];
        for (name, builder, has_context, has_error) in cases {
            let f = builder.build(|_| Vec::new());
            let caller = Caller::<i32, i32>::of(Some(&f))
                .unwrap_or_else(|e| panic!("{}: {}", name, e));
            assert_eq!(caller.receive_type(), TypeInfo::of::<i32>(), "{}", name);
            assert_eq!(caller.return_type(), TypeInfo::of::<i32>(), "{}", name);
            assert_eq!(caller.has_context(), has_context, "{}", name);
            assert_eq!(caller.has_error(), has_error, "{}", name);
        }
    }

    #[test]
    fn caller_of_rejects_invalid_shapes() {
        let cases = vec![
            (
                "EmptyArgument",
                Function::builder().returns::<i32>(),
                "call should have either 1 or 2 arguments but got 0",
            ),
            (
                "TooManyArguments",
                Function::builder()
                    .param::<i32>()
                    .param::<i32>()
                    .param::<i32>()
                    .returns::<i32>(),
                "call should have either 1 or 2 arguments but got 3",
            ),
            (
                "InvalidFirstArgument",
                Function::builder()
                    .param::<i32>()
                    .param::<i32>()
                    .returns::<i32>(),
                "the first argument should be rx_observable::Context but got i32",
            ),
            (
                "EmptyReturnValue",
                Function::builder().param::<i32>(),
                "call should return either 1 or 2 values but got 0",
            ),
            (
                "TooManyReturnValues",
                Function::builder()
                    .param::<i32>()
                    .returns::<i32>()
                    .returns::<i32>()
                    .returns::<i32>(),
                "call should return either 1 or 2 values but got 3",
            ),
            (
                "InvalidSecondReturnValue",
                Function::builder()
                    .param::<i32>()
                    .returns::<i32>()
                    .returns::<i32>(),
                "the second return value can only be error but got i32",
            ),
            (
                "OtherReturnType",
                Function::builder().param::<i32>().returns::<u64>(),
                "call should return i32 but returns u64",
            ),
        ];
        for (name, builder, message) in cases {
            let f = builder.build(|_| Vec::new());
            let err = Caller::<i32, i32>::of(Some(&f)).unwrap_err();
            assert_eq!(err.to_string(), message, "{}", name);
        }
        assert_eq!(
            Caller::<i32, i32>::of(None::<&Function>).unwrap_err(),
            AdaptError::NilCallable
        );
        assert_eq!(
            Caller::<i32, i32>::of(Some(&1u8)).unwrap_err(),
            AdaptError::NotCallable
        );
    }

    #[test]
    fn typed_closures_call() {
        let ctx = Context::background();

        let double: Caller<i32, i32> = Caller::new(|v: i32| v * 2).unwrap();
        assert_eq!(double.call(&ctx, 3).unwrap(), 6);

        let cancelled: Caller<i32, bool> =
            Caller::new(|ctx: &Context, _: i32| ctx.is_cancelled()).unwrap();
        assert!(cancelled.has_context());
        assert!(!cancelled.call(&ctx, 3).unwrap());

        let failing: Caller<i32, i32> =
            Caller::new(|_: i32| -> Result<i32, Error> { Err(Error::new(TestError)) }).unwrap();
        assert!(failing.has_error());
        assert_eq!(failing.call(&ctx, 3).unwrap_err().to_string(), "test");
    }

    #[test]
    fn dynamic_function_call() {
        let f = Function::builder()
            .param::<Context>()
            .param::<i32>()
            .returns::<i32>()
            .returns_error()
            .build(|args| {
                let value = *args[1].downcast_ref::<i32>().unwrap();
                if value < 0 {
                    vec![Box::new(0) as Value, Box::new(Some(Error::msg("negative")))]
                } else {
                    vec![Box::new(value + 1) as Value, Box::new(None::<Error>)]
                }
            });
        let caller = Caller::<i32, i32>::of(Some(&f)).unwrap();
        let ctx = Context::background();
        assert_eq!(caller.call(&ctx, 3).unwrap(), 4);
        assert_eq!(caller.call(&ctx, -1).unwrap_err().to_string(), "negative");
    }

    #[test]
    fn dynamic_function_with_wrong_outputs() {
        let f = Function::builder()
            .param::<i32>()
            .returns::<i32>()
            .build(|_| vec![Box::new("not an i32") as Value]);
        let caller = Caller::<i32, i32>::of(Some(&f)).unwrap();
        let err = caller.call(&Context::background(), 1).unwrap_err();
        assert_eq!(err.to_string(), "function did not return its declared i32");
    }
}
