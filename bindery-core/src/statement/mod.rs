mod lexer;
mod named_statement;
mod render;
mod token;

pub use lexer::{positional_markers, split_statements, tokenize};
pub use named_statement::*;
pub use render::*;
pub use token::*;
