use crate::{AsValue, Result};
use std::fmt::{Debug, Display};

/// A parameterized, backend-prepared statement handle.
///
/// Drivers pre-parse the positional SQL once, the values are then set by
/// position through `bind_index` (usually by replaying a `Rendered`). Dropping
/// the handle releases the backend resources, on every exit path.
///
/// Methods return `&mut Self` for fluent chaining:
/// ```ignore
/// prepared.bind_index(42, 1)?.bind_index("hello", 2)?;
/// ```
pub trait Prepared: Send + Sync + Display + Debug {
    /// The positional SQL this handle was prepared from.
    fn sql(&self) -> &str;
    /// Clear all bound values.
    fn clear_bindings(&mut self) -> Result<&mut Self>;
    /// Bind a value at a specific position (1-based, following the `?` order).
    fn bind_index(&mut self, value: impl AsValue, index: u64) -> Result<&mut Self>
    where
        Self: Sized;
    /// Queue the currently bound values as one batch item and start a fresh one.
    fn add_batch(&mut self) -> Result<&mut Self>;
}
