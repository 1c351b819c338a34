//! Callable shapes.
//!
//! A [`Signature`] lists the parameter and return types of a callable. Typed
//! closures derive theirs statically; a [`Function`] carries an explicit one
//! and a type-erased body, which is how shapes that Rust closures cannot
//! express reach the adapter and get rejected with a descriptive error.

use std::{
    any::{type_name, Any, TypeId},
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use crate::{AdaptError, Context, Error};

/// A boxed argument or return value of a [`Function`].
pub type Value = Box<dyn Any + Send>;

type Body = dyn Fn(Vec<Value>) -> Vec<Value> + Send + Sync;

const CONTEXT_NAME: &str = concat!(env!("CARGO_CRATE_NAME"), "::Context");

// Markers selecting which closure shape an adapter impl accepts.

/// `Fn(T)`.
pub enum Plain {}
/// `Fn(T) -> Result<_, Error>`.
pub enum Fallible {}
/// `Fn(&Context, T)`.
pub enum Contextual {}
/// `Fn(&Context, T) -> Result<_, Error>`.
pub enum ContextualFallible {}

/// Runtime name of a type, compared by [`TypeId`].
#[derive(Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// [`Context`] is named by its public path; everything else by `type_name`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        let id = TypeId::of::<T>();
        let name = if id == TypeId::of::<Context>() {
            CONTEXT_NAME
        } else {
            type_name::<T>()
        };
        Self { id, name }
    }

    /// The cancellation token a callable may accept first.
    pub fn context() -> Self {
        Self::of::<Context>()
    }

    /// The trailing error slot. `None` stands for "no error".
    pub fn error() -> Self {
        Self::of::<Option<Error>>()
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    inputs: Vec<TypeInfo>,
    outputs: Vec<TypeInfo>,
}

impl Signature {
    pub fn new(inputs: Vec<TypeInfo>, outputs: Vec<TypeInfo>) -> Self {
        Self { inputs, outputs }
    }

    pub fn inputs(&self) -> &[TypeInfo] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TypeInfo] {
        &self.outputs
    }

    /// Check the parameter list: `(payload)` or `(Context, payload)`.
    pub(crate) fn inspect_inputs(&self) -> Result<Inputs, AdaptError> {
        match self.inputs.as_slice() {
            [receive_type] => Ok(Inputs {
                receive_type: *receive_type,
                has_context: false,
            }),
            [first, receive_type] => {
                if *first != TypeInfo::context() {
                    return Err(AdaptError::InvalidFirstParameter {
                        expected: TypeInfo::context().name(),
                        actual: first.name(),
                    });
                }
                Ok(Inputs {
                    receive_type: *receive_type,
                    has_context: true,
                })
            }
            other => Err(AdaptError::InvalidArity(other.len())),
        }
    }
}

pub(crate) struct Inputs {
    pub receive_type: TypeInfo,
    pub has_context: bool,
}

/// A type-erased callable with an explicit [`Signature`].
///
/// The body receives the arguments in declaration order and must return
/// values matching the declared outputs. An error output is an
/// `Option<Error>`.
///
/// ```
/// use rx_observable::{Context, Error, Function, Runner, Value};
///
/// let print = Function::builder()
///     .param::<Context>()
///     .param::<i32>()
///     .returns_error()
///     .build(|mut args| {
///         let value = args.pop().and_then(|v| v.downcast::<i32>().ok());
///         println!("{:?}", value);
///         vec![Box::new(None::<Error>) as Value]
///     });
/// let runner = Runner::<i32>::of(Some(&print)).unwrap();
/// assert!(runner.has_context());
/// ```
#[derive(Clone)]
pub struct Function {
    signature: Signature,
    body: Arc<Body>,
}

impl Function {
    pub fn builder() -> FunctionBuilder {
        FunctionBuilder::default()
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn call(&self, args: Vec<Value>) -> Vec<Value> {
        (self.body)(args)
    }

    /// Resolve an adapter argument to a `Function`.
    pub(crate) fn lookup<A: Any>(call: Option<&A>) -> Result<&Function, AdaptError> {
        let call: &dyn Any = call.ok_or(AdaptError::NilCallable)?;
        call.downcast_ref::<Function>()
            .ok_or(AdaptError::NotCallable)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("inputs", &self.signature.inputs)
            .field("outputs", &self.signature.outputs)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct FunctionBuilder {
    signature: Signature,
}

impl FunctionBuilder {
    pub fn param<P: Any + Send>(mut self) -> Self {
        self.signature.inputs.push(TypeInfo::of::<P>());
        self
    }

    pub fn returns<R: Any + Send>(mut self) -> Self {
        self.signature.outputs.push(TypeInfo::of::<R>());
        self
    }

    pub fn returns_error(mut self) -> Self {
        self.signature.outputs.push(TypeInfo::error());
        self
    }

    pub fn build(
        self,
        body: impl Fn(Vec<Value>) -> Vec<Value> + Send + Sync + 'static,
    ) -> Function {
        Function {
            signature: self.signature,
            body: Arc::new(body),
        }
    }
}

/// Lay out the arguments for a dynamic call.
pub(crate) fn arguments<T: Send + 'static>(ctx: &Context, has_context: bool, value: T) -> Vec<Value> {
    let mut args: Vec<Value> = Vec::with_capacity(2);
    if has_context {
        args.push(Box::new(ctx.clone()));
    }
    args.push(Box::new(value));
    args
}

/// Unpack a returned value of the declared type.
pub(crate) fn take_output<R: 'static>(output: Option<Value>) -> Result<R, Error> {
    match output.map(|v| v.downcast::<R>()) {
        Some(Ok(value)) => Ok(*value),
        _ => {
            log::error!("function output does not match its declared {}", type_name::<R>());
            Err(Error::msg(format!(
                "function did not return its declared {}",
                type_name::<R>()
            )))
        }
    }
}

/// Unpack an `Option<Error>` output.
pub(crate) fn take_error(output: Option<Value>) -> Result<(), Error> {
    match take_output::<Option<Error>>(output)? {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
