//! Core of Bindery: named-parameter SQL templates.
//!
//! SQL is written with `:name` placeholders and parsed once into a
//! [`NamedStatement`]. Values are attached through the immutable [`Bind`]
//! builder chain and, at execution time, the statement is rendered into
//! positional `?` SQL plus the ordered bind operations a driver [`Prepared`]
//! handle replays.
mod as_value;
mod binding;
mod connection;
mod driver;
mod error;
mod executor;
mod prepared;
mod query;
mod row;
mod statement;
mod transaction;
mod util;
mod value;

pub use ::anyhow::Context as ErrorContext;
pub use as_value::*;
pub use binding::*;
pub use connection::*;
pub use driver::*;
pub use error::*;
pub use executor::*;
pub use prepared::*;
pub use query::*;
pub use row::*;
pub use statement::*;
pub use transaction::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

/// Result type.
pub type Result<T> = anyhow::Result<T>;
/// Error type.
pub type Error = anyhow::Error;
