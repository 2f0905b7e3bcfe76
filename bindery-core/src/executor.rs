use crate::{
    Driver, Error, QueryResult, Result, RowLabeled, RowsAffected,
    stream::{Stream, StreamExt, TryStreamExt},
};
use std::future::{self, Future};

/// Prepared handle type of an executor's driver.
pub type PreparedOf<E> = <<E as Executor>::Driver as Driver>::Prepared;

/// Async statement executor bound to a concrete `Driver`.
///
/// Responsibilities:
/// - Prepare positional SQL into driver handles
/// - Run prepared handles, streaming results without buffering (when possible)
/// - Provide ergonomic helpers for fetching and execution
///
/// Implementors typically wrap a connection or pooled handle.
pub trait Executor: Send + Sized {
    /// Associated driver type.
    type Driver: Driver;

    /// Returns a driver instance.
    ///
    /// Override if the executor carries specific driver state.
    fn driver(&self) -> Self::Driver {
        Default::default()
    }

    /// Prepare positional SQL for later execution.
    fn prepare(&mut self, sql: String) -> impl Future<Output = Result<PreparedOf<Self>>> + Send;

    /// Prepare positional SQL so that running it also yields the generated `columns`.
    ///
    /// After the affected counts the stream yields one row per generated key.
    fn prepare_with_keys(
        &mut self,
        sql: String,
        columns: Vec<String>,
    ) -> impl Future<Output = Result<PreparedOf<Self>>> + Send {
        let _ = (sql, columns);
        let error = Error::msg(format!(
            "Generated keys are not supported by {}",
            self.driver().name()
        ));
        future::ready(Err(error))
    }

    /// Execute a prepared statement with its current bindings, streaming
    /// `QueryResult` (rows or affected counts).
    fn run<'s>(
        &'s mut self,
        prepared: &'s mut PreparedOf<Self>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's;

    /// Execute every batch item queued with `Prepared::add_batch`.
    ///
    /// Yields one `Affected` per item in the order they were added, then the
    /// generated key rows when the statement was prepared with keys.
    fn run_batch<'s>(
        &'s mut self,
        prepared: &'s mut PreparedOf<Self>,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's;

    /// Execute yielding `RowLabeled` from the resulting stream (filtering out `RowsAffected`).
    fn fetch<'s>(
        &'s mut self,
        prepared: &'s mut PreparedOf<Self>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send + 's {
        self.run(prepared).filter_map(|v| async move {
            match v {
                Ok(QueryResult::Row(v)) => Some(Ok(v)),
                Err(e) => Some(Err(e)),
                _ => None,
            }
        })
    }

    /// Execute and aggregate affected rows counter.
    fn execute<'s>(
        &'s mut self,
        prepared: &'s mut PreparedOf<Self>,
    ) -> impl Future<Output = Result<RowsAffected>> + Send + 's {
        self.run(prepared)
            .filter_map(|v| async move {
                match v {
                    Ok(QueryResult::Affected(v)) => Some(Ok(v)),
                    Err(e) => Some(Err(e)),
                    _ => None,
                }
            })
            .try_collect()
    }
}
