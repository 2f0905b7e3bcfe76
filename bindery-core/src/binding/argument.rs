use crate::{Prepared, Result, Value};
use std::{
    fmt::{self, Debug},
    slice,
    sync::Arc,
};

/// Something that accepts a value at a 1-based parameter position.
///
/// Every driver `Prepared` handle is a target, tests and tooling can provide
/// their own (e.g. to collect the values a statement would bind).
pub trait ArgumentTarget {
    /// Set the parameter at `position` (1-based, matching the `?` order).
    fn set(&mut self, position: u64, value: Value) -> Result<()>;
}

impl<P: Prepared> ArgumentTarget for P {
    fn set(&mut self, position: u64, value: Value) -> Result<()> {
        self.bind_index(value, position).map(|_| ())
    }
}

/// Capability of binding itself to one positional parameter.
///
/// A `Value` is the common case. `ArgumentFn` covers arguments that need to
/// decide how to bind at execution time.
pub trait Argument: Send + Sync + Debug {
    fn apply(&self, target: &mut dyn ArgumentTarget, position: u64) -> Result<()>;
}

impl Argument for Value {
    fn apply(&self, target: &mut dyn ArgumentTarget, position: u64) -> Result<()> {
        target.set(position, self.clone())
    }
}

/// Closure based `Argument`, the description is what shows up in logs.
pub struct ArgumentFn<F> {
    description: String,
    function: F,
}

impl<F> ArgumentFn<F>
where
    F: Fn(&mut dyn ArgumentTarget, u64) -> Result<()> + Send + Sync,
{
    pub fn new(description: impl Into<String>, function: F) -> Self {
        Self {
            description: description.into(),
            function,
        }
    }
}

impl<F> Argument for ArgumentFn<F>
where
    F: Fn(&mut dyn ArgumentTarget, u64) -> Result<()> + Send + Sync,
{
    fn apply(&self, target: &mut dyn ArgumentTarget, position: u64) -> Result<()> {
        (self.function)(target, position)
    }
}

impl<F> Debug for ArgumentFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ArgumentFn").field(&self.description).finish()
    }
}

/// What a named parameter is bound to.
#[derive(Clone, Debug)]
pub enum Binding {
    /// Exactly one positional parameter.
    Value(Arc<dyn Argument>),
    /// One positional parameter per element, possibly none.
    List(Arc<[Arc<dyn Argument>]>),
}

impl Binding {
    pub fn value(argument: impl Argument + 'static) -> Self {
        Binding::Value(Arc::new(argument))
    }
    pub fn list<A: Argument + 'static>(arguments: impl IntoIterator<Item = A>) -> Self {
        Binding::List(
            arguments
                .into_iter()
                .map(|v| Arc::new(v) as Arc<dyn Argument>)
                .collect(),
        )
    }
    pub fn is_list(&self) -> bool {
        matches!(self, Binding::List(..))
    }
    /// Number of `?` this binding expands to.
    pub fn slots(&self) -> usize {
        self.arguments().len()
    }
    /// Arguments in positional order.
    pub fn arguments(&self) -> &[Arc<dyn Argument>] {
        match self {
            Binding::Value(v) => slice::from_ref(v),
            Binding::List(v) => v,
        }
    }
}
