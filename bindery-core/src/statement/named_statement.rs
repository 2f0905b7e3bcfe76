use super::lexer::enclosed_placeholders;
use crate::{BindingError, Bindings, Error, Result, Token, tokenize, truncate_long};
use anyhow::Context;
use std::{
    collections::BTreeSet,
    fmt::{self, Debug, Display},
    str::FromStr,
    sync::Arc,
};

struct Inner {
    sql: String,
    tokens: Box<[Token]>,
    names: BTreeSet<String>,
    occurrences: Box<[String]>,
    enclosed: Box<[bool]>,
}

/// SQL with `:name` placeholders, parsed once and shared.
///
/// Cloning is cheap and the value is never modified, it can be used from any
/// number of threads at the same time.
#[derive(Clone)]
pub struct NamedStatement(Arc<Inner>);

impl NamedStatement {
    /// Tokenize `sql`, fails on unterminated literals or comments.
    pub fn new(sql: impl Into<String>) -> Result<Self> {
        let sql = sql.into();
        let context = || format!("While parsing the statement:\n{}", truncate_long!(sql));
        let tokens = tokenize(&sql).with_context(context)?;
        let enclosed = enclosed_placeholders(&sql).with_context(context)?;
        let occurrences: Box<[String]> = tokens
            .iter()
            .filter_map(Token::parameter_name)
            .map(ToOwned::to_owned)
            .collect();
        let names = occurrences.iter().cloned().collect();
        Ok(Self(Arc::new(Inner {
            sql,
            tokens: tokens.into(),
            names,
            occurrences,
            enclosed: enclosed.into(),
        })))
    }

    /// The source text.
    pub fn sql(&self) -> &str {
        &self.0.sql
    }

    /// Literals and placeholders in source order.
    pub fn tokens(&self) -> &[Token] {
        &self.0.tokens
    }

    /// Distinct parameter names, sorted.
    pub fn parameter_names(&self) -> &BTreeSet<String> {
        &self.0.names
    }

    /// One entry per placeholder in source order, names can repeat.
    pub fn occurrences(&self) -> &[String] {
        &self.0.occurrences
    }

    /// One entry per placeholder, `true` when it already follows `(`, `[` or `,`.
    pub fn enclosed(&self) -> &[bool] {
        &self.0.enclosed
    }

    pub fn contains_parameter(&self, name: &str) -> bool {
        self.0.names.contains(name)
    }

    /// Empty bindings for this statement.
    pub fn bindings(&self) -> Bindings {
        Bindings::new(self)
    }

    /// Fails with `MissingBindings` listing every declared name without a binding.
    pub fn check_all_bindings_present(&self, bindings: &Bindings) -> Result<()> {
        let missing = self
            .0
            .names
            .iter()
            .filter(|name| !bindings.contains(name))
            .cloned()
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            return Err(BindingError::MissingBindings(missing).into());
        }
        Ok(())
    }

    /// Fails with `UnknownBinding` listing every bound name the statement does not declare.
    pub fn check_no_extra_bindings(&self, bindings: &Bindings) -> Result<()> {
        let extra = bindings
            .names()
            .filter(|name| !self.contains_parameter(name))
            .map(ToOwned::to_owned)
            .collect::<Vec<_>>();
        if !extra.is_empty() {
            return Err(BindingError::UnknownBinding(extra).into());
        }
        Ok(())
    }

    /// Same source text, the tokens derive from it.
    pub fn same_as(&self, other: &NamedStatement) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.sql == other.0.sql
    }
}

impl FromStr for NamedStatement {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl Display for NamedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.sql)
    }
}

impl Debug for NamedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedStatement")
            .field("sql", &truncate_long!(self.0.sql))
            .field("names", &self.0.names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AsValue, ParseError, Value};

    #[test]
    fn occurrences_and_names() {
        let statement =
            NamedStatement::new("UPDATE t SET a = :b, b = :a WHERE id = :id OR a = :b").unwrap();
        assert_eq!(statement.occurrences(), ["b", "a", "id", "b"]);
        assert_eq!(
            statement.parameter_names().iter().collect::<Vec<_>>(),
            ["a", "b", "id"]
        );
        assert!(statement.contains_parameter("id"));
        assert!(!statement.contains_parameter("ID"));
        assert_eq!(
            statement.tokens().iter().filter(|v| v.is_parameter()).count(),
            statement.occurrences().len()
        );
        assert_eq!(
            statement.to_string(),
            "UPDATE t SET a = :b, b = :a WHERE id = :id OR a = :b"
        );
    }

    #[test]
    fn parse_failure() {
        let error = "SELECT ':a".parse::<NamedStatement>().unwrap_err();
        let parse = error
            .downcast_ref::<ParseError>()
            .expect("Expected the ParseError to be preserved");
        assert_eq!(parse.position, 7);
    }

    #[test]
    fn missing_bindings_are_listed() {
        let statement = NamedStatement::new("SELECT :z, :a, :m, :a").unwrap();
        let bindings = statement.bindings().bind_value("m", Value::Null).unwrap();
        let error = statement
            .check_all_bindings_present(&bindings)
            .expect_err("Expected missing bindings");
        assert_eq!(
            error.downcast_ref::<BindingError>(),
            Some(&BindingError::MissingBindings(vec!["a".into(), "z".into()]))
        );
        let bindings = bindings
            .bind_value("a", 1i32.as_value())
            .and_then(|v| v.bind_value("z", 2i32.as_value()))
            .unwrap();
        statement.check_all_bindings_present(&bindings).unwrap();
    }

    #[test]
    fn extra_bindings() {
        let wide = NamedStatement::new("SELECT :a, :b").unwrap();
        let narrow = NamedStatement::new("SELECT :a").unwrap();
        let bindings = wide
            .bindings()
            .bind_value("a", Value::Null)
            .and_then(|v| v.bind_value("b", Value::Null))
            .unwrap();
        wide.check_no_extra_bindings(&bindings).unwrap();
        let error = narrow.check_no_extra_bindings(&bindings).unwrap_err();
        assert_eq!(
            error.downcast_ref::<BindingError>(),
            Some(&BindingError::UnknownBinding(vec!["b".into()]))
        );
    }
}
