use std::fmt::{self, Display};

/// A piece of SQL source: verbatim text or a named placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// Text copied verbatim into the rendered SQL (comments and quoted literals included).
    Literal(String),
    /// A `:name` placeholder, holds the name without the marker.
    NamedParameter(String),
}

impl Token {
    pub fn is_parameter(&self) -> bool {
        matches!(self, Token::NamedParameter(..))
    }
    /// The parameter name, if this is a placeholder.
    pub fn parameter_name(&self) -> Option<&str> {
        match self {
            Token::NamedParameter(name) => Some(name),
            Token::Literal(..) => None,
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(text) => f.write_str(text),
            Token::NamedParameter(name) => write!(f, ":{name}"),
        }
    }
}
