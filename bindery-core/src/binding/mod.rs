mod argument;
mod bind;
mod bindings;

pub use argument::*;
pub use bind::*;
pub use bindings::*;
