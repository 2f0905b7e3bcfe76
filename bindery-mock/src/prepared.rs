use crate::{Event, Journal};
use bindery_core::{AsValue, Error, Prepared, Result, Value, positional_markers, truncate_long};
use std::fmt::{self, Display, Formatter};

#[derive(Debug)]
pub struct MockPrepared {
    pub(crate) sql: String,
    pub(crate) placeholders: usize,
    pub(crate) values: Vec<Option<Value>>,
    pub(crate) batch: Vec<Vec<Value>>,
    pub(crate) journal: Journal,
}

impl MockPrepared {
    pub(crate) fn new(sql: String, journal: Journal) -> Result<Self> {
        let placeholders = positional_markers(&sql)?;
        Ok(Self {
            sql,
            placeholders,
            values: vec![None; placeholders],
            batch: Vec::new(),
            journal,
        })
    }

    /// Values currently bound, fails if any position was left unset.
    pub(crate) fn bound_values(&self) -> Result<Vec<Value>> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.clone().ok_or_else(|| {
                    Error::msg(format!(
                        "Parameter {} of `{}` is not bound",
                        i + 1,
                        truncate_long!(self.sql)
                    ))
                })
            })
            .collect()
    }

    /// Number of `?` markers in the SQL, literals and comments excluded.
    pub fn placeholders(&self) -> usize {
        self.placeholders
    }
}

impl Prepared for MockPrepared {
    fn sql(&self) -> &str {
        &self.sql
    }
    fn clear_bindings(&mut self) -> Result<&mut Self> {
        self.journal.record(Event::ClearBindings);
        self.values.iter_mut().for_each(|v| *v = None);
        Ok(self)
    }
    fn bind_index(&mut self, value: impl AsValue, index: u64) -> Result<&mut Self> {
        let Some(slot) = (index as usize)
            .checked_sub(1)
            .and_then(|i| self.values.get_mut(i))
        else {
            return Err(Error::msg(format!(
                "Position {index} is out of range, the statement has {} parameters",
                self.placeholders
            )));
        };
        let value = value.as_value();
        *slot = Some(value.clone());
        self.journal.record(Event::Bind(index, value));
        Ok(self)
    }
    fn add_batch(&mut self) -> Result<&mut Self> {
        let values = self.bound_values()?;
        self.batch.push(values);
        self.values.iter_mut().for_each(|v| *v = None);
        self.journal.record(Event::AddBatch);
        Ok(self)
    }
}

impl Display for MockPrepared {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.sql))
    }
}

impl Drop for MockPrepared {
    fn drop(&mut self) {
        self.journal.record(Event::Release(self.sql.clone()));
    }
}
