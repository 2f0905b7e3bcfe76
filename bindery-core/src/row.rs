use crate::{Error, FromValue, Result, Value};
use anyhow::Context;
use std::{
    iter::{self},
    slice,
    sync::Arc,
};

/// Result of a modifying operation (INSERT/UPDATE/DELETE).
#[derive(Default, Clone, Copy, PartialEq, Eq, Debug)]
pub struct RowsAffected {
    /// Number of rows modified (if supported by backend).
    pub rows_affected: Option<u64>,
    /// Last inserted ID (driver-dependent).
    pub last_affected_id: Option<i64>,
}

impl RowsAffected {
    pub fn new(rows_affected: u64) -> Self {
        Self {
            rows_affected: Some(rows_affected),
            last_affected_id: None,
        }
    }
}

/// Shared column names.
pub type RowNames = Arc<[String]>;
/// Row values matching `RowNames`.
pub type Row = Box<[Value]>;

/// Row with column labels.
#[derive(Default, Clone, PartialEq, Debug)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Column values.
    pub values: Row,
}

impl RowLabeled {
    pub fn new(names: RowNames, values: Row) -> Self {
        Self {
            labels: names,
            values,
        }
    }
    /// Column labels.
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    /// Row values.
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    /// Get value by column name.
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .and_then(|i| self.values.get(i))
    }
    /// Get the value of column `name` converted to `T`.
    pub fn get<T: FromValue>(&self, name: &str) -> Result<T> {
        let value = self
            .get_column(name)
            .ok_or_else(|| Error::msg(format!("Column `{name}` is not present in the row")))?;
        T::try_from_value(value.clone())
            .with_context(|| format!("While reading column `{name}`"))
    }
    /// Column count.
    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'s> IntoIterator for &'s RowLabeled {
    type Item = (&'s String, &'s Value);
    type IntoIter = iter::Zip<slice::Iter<'s, String>, slice::Iter<'s, Value>>;
    fn into_iter(self) -> Self::IntoIter {
        iter::zip(self.labels.iter(), self.values.iter())
    }
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            if self.rows_affected.is_some() || elem.rows_affected.is_some() {
                self.rows_affected = Some(
                    self.rows_affected.unwrap_or_default() + elem.rows_affected.unwrap_or_default(),
                );
            }
            if elem.last_affected_id.is_some() {
                self.last_affected_id = elem.last_affected_id;
            }
        }
    }
}

/// Item of a result stream.
#[derive(Clone, PartialEq, Debug)]
pub enum QueryResult {
    /// A labeled row
    Row(RowLabeled),
    /// A modify effect aggregation
    Affected(RowsAffected),
}

impl From<RowLabeled> for QueryResult {
    fn from(value: RowLabeled) -> Self {
        QueryResult::Row(value)
    }
}

impl From<RowsAffected> for QueryResult {
    fn from(value: RowsAffected) -> Self {
        QueryResult::Affected(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_columns() {
        let row = RowLabeled::new(
            ["id".to_string(), "name".to_string()].into(),
            [Value::Int64(Some(7)), Value::Varchar(None)].into(),
        );
        assert_eq!(row.get::<i32>("id").unwrap(), 7);
        assert_eq!(row.get::<Option<String>>("name").unwrap(), None);
        assert!(row.get::<i32>("missing").is_err());
        assert!(row.get::<bool>("id").is_err());
    }

    #[test]
    fn affected_sum() {
        let mut total = RowsAffected::default();
        total.extend([
            RowsAffected::new(2),
            RowsAffected {
                rows_affected: Some(3),
                last_affected_id: Some(9),
            },
        ]);
        assert_eq!(total.rows_affected, Some(5));
        assert_eq!(total.last_affected_id, Some(9));
    }
}
