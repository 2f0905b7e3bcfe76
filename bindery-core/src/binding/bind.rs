use crate::{
    Argument, AsValue, Binding, BindingError, Bindings, NamedStatement, Rendered, Result,
};

/// Persistent builder chain over a statement and its bindings.
///
/// Implementors hold a `Bindings` snapshot and know how to produce a copy of
/// themselves around a different one (`with_bindings`). Every provided method
/// returns a new builder and leaves `self` untouched, so one partially bound
/// template can be shared and completed independently by many callers.
///
/// ```
/// use bindery_core::{Bind, Query};
/// let template = Query::parse("SELECT * FROM t WHERE status IN :statuses AND kind = :kind")?;
/// let active = template.bind("kind", "user")?.bind_list("statuses", ["ACTIVE", "MIA"])?;
/// assert_eq!(
///     active.render()?.sql,
///     "SELECT * FROM t WHERE status IN (?,?) AND kind = ?"
/// );
/// assert!(template.bindings().is_empty());
/// # Ok::<(), bindery_core::Error>(())
/// ```
pub trait Bind: Sized {
    /// Current bindings snapshot.
    fn bindings(&self) -> &Bindings;

    /// A builder of the same kind around `bindings`.
    fn with_bindings(&self, bindings: Bindings) -> Self;

    fn statement(&self) -> &NamedStatement {
        self.bindings().statement()
    }

    /// Bind `name` to a single value.
    fn bind(&self, name: &str, value: impl AsValue) -> Result<Self> {
        self.bind_argument(name, value.as_value())
    }

    /// Bind `name` to a NULL typed after `T`.
    fn bind_null<T: AsValue>(&self, name: &str) -> Result<Self> {
        self.bind_argument(name, T::as_empty_value())
    }

    /// Bind `name` to a custom argument.
    fn bind_argument(&self, name: &str, argument: impl Argument + 'static) -> Result<Self> {
        Ok(self.with_bindings(self.bindings().bind_value(name, argument)?))
    }

    /// Bind `name` to a collection, expanded into one `?` per element.
    fn bind_list<I>(&self, name: &str, values: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsValue,
    {
        Ok(self.with_bindings(
            self.bindings()
                .bind_list(name, values.into_iter().map(AsValue::as_value))?,
        ))
    }

    /// Like `bind_list`, an absent collection is an error rather than an empty list.
    fn bind_list_opt<I>(&self, name: &str, values: Option<I>) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsValue,
    {
        match values {
            Some(values) => self.bind_list(name, values),
            None => Err(BindingError::AbsentCollection(name.into()).into()),
        }
    }

    /// Bind `name` to a value that an explicit `bind` can later replace.
    fn bind_default(&self, name: &str, value: impl AsValue) -> Result<Self> {
        Ok(self.with_bindings(
            self.bindings()
                .bind_default(name, Binding::value(value.as_value()))?,
        ))
    }

    /// Bind several single values at once, stops at the first failure.
    fn bind_all<N, V>(&self, values: impl IntoIterator<Item = (N, V)>) -> Result<Self>
    where
        N: AsRef<str>,
        V: AsValue,
    {
        let mut bindings = self.bindings().clone();
        for (name, value) in values {
            bindings = bindings.bind_value(name.as_ref(), value.as_value())?;
        }
        Ok(self.with_bindings(bindings))
    }

    /// Positional SQL and bind operations, fails if any declared parameter is unbound.
    fn render(&self) -> Result<Rendered> {
        let statement = self.statement();
        let bindings = self.bindings();
        statement.check_all_bindings_present(bindings)?;
        statement.check_no_extra_bindings(bindings)?;
        statement.render(bindings)
    }
}
