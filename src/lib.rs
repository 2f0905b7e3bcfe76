//! Bindery: named-parameter SQL templates.
//!
//! Write SQL with `:name` placeholders, bind values through an immutable
//! builder chain, then execute the equivalent positional `?` SQL on any
//! driver implementing the [`Driver`] traits.
//!
//! ```
//! use bindery::{Bind, Query};
//! let template = Query::parse("SELECT * FROM users WHERE status IN :statuses AND age > :age")?;
//! let query = template
//!     .bind_list("statuses", ["ACTIVE", "MIA"])?
//!     .bind("age", 30)?;
//! let rendered = query.render()?;
//! assert_eq!(rendered.sql, "SELECT * FROM users WHERE status IN (?,?) AND age > ?");
//! assert_eq!(rendered.operations.len(), 3);
//! # Ok::<(), bindery::Error>(())
//! ```
pub use bindery_core::*;
