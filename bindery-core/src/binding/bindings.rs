use crate::{Argument, Binding, BindingError, NamedStatement, Result};
use std::{
    collections::BTreeMap,
    fmt::{self, Debug},
    sync::Arc,
};

#[derive(Clone, Debug)]
struct Entry {
    binding: Binding,
    /// Defaults can be replaced once by an explicit binding.
    default: bool,
}

/// Immutable set of named bindings for one statement.
///
/// Every bind returns a new `Bindings`, the receiver is never modified. Only
/// names declared by the statement are accepted and each can be bound once
/// (a default can be overridden by a later explicit bind).
#[derive(Clone)]
pub struct Bindings {
    statement: NamedStatement,
    entries: Arc<BTreeMap<String, Entry>>,
}

impl Bindings {
    /// Empty bindings for `statement`.
    pub fn new(statement: &NamedStatement) -> Self {
        Self {
            statement: statement.clone(),
            entries: Default::default(),
        }
    }

    /// The statement the names are checked against.
    pub fn statement(&self) -> &NamedStatement {
        &self.statement
    }

    fn check_declared(&self, name: &str) -> Result<()> {
        if !self.statement.contains_parameter(name) {
            return Err(BindingError::UnknownParameter(name.into()).into());
        }
        Ok(())
    }

    fn with_entry(&self, name: &str, entry: Entry) -> Self {
        let mut entries = (*self.entries).clone();
        entries.insert(name.into(), entry);
        Self {
            statement: self.statement.clone(),
            entries: Arc::new(entries),
        }
    }

    /// New bindings with `name` bound to `binding`.
    pub fn bind(&self, name: &str, binding: Binding) -> Result<Self> {
        self.check_declared(name)?;
        if self.entries.get(name).is_some_and(|v| !v.default) {
            return Err(BindingError::DuplicateBinding(name.into()).into());
        }
        Ok(self.with_entry(
            name,
            Entry {
                binding,
                default: false,
            },
        ))
    }

    /// Bind `name` to exactly one positional parameter.
    pub fn bind_value(&self, name: &str, argument: impl Argument + 'static) -> Result<Self> {
        self.bind(name, Binding::value(argument))
    }

    /// Bind `name` to one positional parameter per element, an empty list is valid.
    pub fn bind_list<A: Argument + 'static>(
        &self,
        name: &str,
        arguments: impl IntoIterator<Item = A>,
    ) -> Result<Self> {
        self.bind(name, Binding::list(arguments))
    }

    /// Bind a value that a later `bind` of the same name replaces.
    pub fn bind_default(&self, name: &str, binding: Binding) -> Result<Self> {
        self.check_declared(name)?;
        if self.entries.contains_key(name) {
            return Err(BindingError::DuplicateBinding(name.into()).into());
        }
        Ok(self.with_entry(
            name,
            Entry {
                binding,
                default: true,
            },
        ))
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name).map(|v| &v.binding)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// True when `name` is bound to a default that was not overridden yet.
    pub fn is_default(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|v| v.default)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bound names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), &v.binding))
    }
}

impl Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, &v.binding)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AsValue, Value};

    fn statement() -> NamedStatement {
        NamedStatement::new("SELECT * FROM t WHERE a = :a AND b IN :b AND c = :c").unwrap()
    }

    fn error(result: Result<Bindings>) -> BindingError {
        result
            .expect_err("Expected a binding error")
            .downcast::<BindingError>()
            .expect("Expected a BindingError")
    }

    #[test]
    fn persistent() {
        let empty = Bindings::new(&statement());
        let first = empty.bind_value("a", 1i32.as_value()).unwrap();
        let second = first.bind_list("b", ["x".as_value()]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(first.names().collect::<Vec<_>>(), ["a"]);
        assert_eq!(second.names().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(second.get("b").map(Binding::slots), Some(1));
    }

    #[test]
    fn unknown_and_duplicate() {
        let bindings = Bindings::new(&statement());
        assert_eq!(
            error(bindings.bind_value("z", Value::Null)),
            BindingError::UnknownParameter("z".into())
        );
        assert_eq!(
            error(bindings.bind_value("A", Value::Null)),
            BindingError::UnknownParameter("A".into())
        );
        let bindings = bindings.bind_value("a", Value::Null).unwrap();
        assert_eq!(
            error(bindings.bind_value("a", Value::Null)),
            BindingError::DuplicateBinding("a".into())
        );
        assert_eq!(
            error(bindings.bind_list("a", Vec::<Value>::new())),
            BindingError::DuplicateBinding("a".into())
        );
    }

    #[test]
    fn defaults() {
        let defaults = Bindings::new(&statement())
            .bind_default("c", Binding::value(0i32.as_value()))
            .unwrap();
        assert!(defaults.is_default("c"));
        assert_eq!(
            error(defaults.bind_default("c", Binding::value(1i32.as_value()))),
            BindingError::DuplicateBinding("c".into())
        );
        let overridden = defaults.bind_value("c", 5i32.as_value()).unwrap();
        assert!(!overridden.is_default("c"));
        assert!(defaults.is_default("c"));
        assert_eq!(
            error(overridden.bind_value("c", 6i32.as_value())),
            BindingError::DuplicateBinding("c".into())
        );
    }
}
