use crate::{Event, Journal, MockDriver, MockPrepared, Operation};
use async_stream::try_stream;
use bindery_core::{
    Connection, ErrorContext, Executor, Isolation, QueryResult, Result,
    stream::Stream, truncate_long,
};
use std::{borrow::Cow, mem};
use url::Url;

/// In-memory session that records what it is asked to do.
///
/// Configured through the URL query:
/// `mock://localhost?auto_commit=false&isolation=serializable`.
#[derive(Debug)]
pub struct MockConnection {
    pub(crate) url: Url,
    pub(crate) journal: Journal,
}

impl MockConnection {
    /// Handle to the session record, it can be kept after the connection is gone.
    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl Executor for MockConnection {
    type Driver = MockDriver;

    async fn prepare(&mut self, sql: String) -> Result<MockPrepared> {
        self.journal.check(Operation::Prepare)?;
        self.journal.record(Event::Prepare(sql.clone()));
        MockPrepared::new(sql, self.journal.clone())
    }

    async fn prepare_with_keys(
        &mut self,
        sql: String,
        columns: Vec<String>,
    ) -> Result<MockPrepared> {
        self.journal.check(Operation::Prepare)?;
        self.journal.record(Event::PrepareWithKeys(sql.clone(), columns));
        MockPrepared::new(sql, self.journal.clone())
    }

    fn run<'s>(
        &'s mut self,
        prepared: &'s mut MockPrepared,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        try_stream! {
            self.journal.check(Operation::Execute)?;
            let values = prepared.bound_values()?;
            self.journal.record(Event::Execute(prepared.sql.clone(), values));
            for result in self.journal.execute(&prepared.sql) {
                yield result;
            }
        }
    }

    fn run_batch<'s>(
        &'s mut self,
        prepared: &'s mut MockPrepared,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        try_stream! {
            self.journal.check(Operation::Execute)?;
            let items = mem::take(&mut prepared.batch);
            self.journal
                .record(Event::ExecuteBatch(prepared.sql.clone(), items.len()));
            let mut keys = Vec::new();
            for values in items {
                self.journal.record(Event::Execute(prepared.sql.clone(), values));
                for result in self.journal.execute(&prepared.sql) {
                    match result {
                        QueryResult::Affected(..) => yield result,
                        QueryResult::Row(..) => keys.push(result),
                    }
                }
            }
            for key in keys {
                yield key;
            }
        }
    }
}

impl Connection for MockConnection {
    async fn connect(url: Cow<'static, str>) -> Result<MockConnection> {
        let context = format!("While trying to connect to `{}`", truncate_long!(url));
        let url = Self::sanitize_url(url)?;
        let mut auto_commit = true;
        let mut isolation = Isolation::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "auto_commit" => {
                    auto_commit = value
                        .parse()
                        .with_context(|| format!("Invalid auto_commit `{value}`"))
                        .context(context.clone())?
                }
                "isolation" => isolation = value.parse().context(context.clone())?,
                "mode" => {}
                _ => log::warn!("Ignoring unknown option `{key}` of the mock connection"),
            }
        }
        let journal = Journal::new(auto_commit, isolation);
        journal.record(Event::Connect(url.to_string()));
        Ok(MockConnection { url, journal })
    }

    async fn auto_commit(&mut self) -> Result<bool> {
        Ok(self.journal.auto_commit())
    }

    async fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        self.journal.check(Operation::SetAutoCommit)?;
        self.journal.record(Event::SetAutoCommit(auto_commit));
        self.journal.set_auto_commit(auto_commit);
        Ok(())
    }

    async fn isolation(&mut self) -> Result<Isolation> {
        Ok(self.journal.isolation())
    }

    async fn set_isolation(&mut self, isolation: Isolation) -> Result<()> {
        self.journal.check(Operation::SetIsolation)?;
        self.journal.record(Event::SetIsolation(isolation));
        self.journal.set_isolation(isolation);
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.journal.check(Operation::Commit)?;
        self.journal.record(Event::Commit);
        self.journal.commit();
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.journal.check(Operation::Rollback)?;
        self.journal.record(Event::Rollback);
        self.journal.rollback();
        Ok(())
    }

    async fn disconnect(self) -> Result<()> {
        self.journal.record(Event::Disconnect);
        Ok(())
    }
}
