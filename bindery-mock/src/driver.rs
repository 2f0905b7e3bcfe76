use crate::{MockConnection, MockPrepared};
use bindery_core::Driver;

#[derive(Default, Clone, Copy, Debug)]
pub struct MockDriver;
impl MockDriver {
    pub const fn new() -> Self {
        Self
    }
}

impl Driver for MockDriver {
    type Connection = MockConnection;
    type Prepared = MockPrepared;

    const NAME: &'static [&'static str] = &["mock"];
}
