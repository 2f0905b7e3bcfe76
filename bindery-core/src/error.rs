use std::fmt::{self, Display};

/// Lexical failure raised while tokenizing SQL text.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (at byte {position})")]
pub struct ParseError {
    /// What went wrong.
    pub message: String,
    /// Byte offset of the offending construct (the opening delimiter for unterminated ones).
    pub position: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Misuse of a statement template, detected where it happens.
///
/// Every variant names the parameter(s) involved. Propagated wrapped in
/// [`crate::Error`], recover it with `error.downcast_ref::<BindingError>()`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("Parameter `:{0}` is not declared by the statement")]
    UnknownParameter(String),
    #[error("Parameter `:{0}` is already bound")]
    DuplicateBinding(String),
    #[error("Missing bindings for {}", Names(.0))]
    MissingBindings(Vec<String>),
    #[error("Bindings for {} are not declared by the statement", Names(.0))]
    UnknownBinding(Vec<String>),
    #[error("Parameter `:{0}` has no binding while rendering")]
    UnresolvedParameter(String),
    #[error("Parameter `:{0}` cannot be bound to an absent collection")]
    AbsentCollection(String),
    #[error("Batch item {index} renders different SQL than the first item")]
    InconsistentBatch { index: usize },
    #[error("{0}")]
    PreconditionViolated(String),
}

struct Names<'a>(&'a [String]);

impl Display for Names<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "`:{name}`")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_parameters() {
        assert_eq!(
            BindingError::MissingBindings(vec!["a".into(), "b".into()]).to_string(),
            "Missing bindings for `:a`, `:b`"
        );
        assert_eq!(
            BindingError::DuplicateBinding("status".into()).to_string(),
            "Parameter `:status` is already bound"
        );
        assert_eq!(
            ParseError::new("Unterminated string literal", 7).to_string(),
            "Unterminated string literal (at byte 7)"
        );
    }
}
