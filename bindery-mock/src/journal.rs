use bindery_core::{Error, Isolation, QueryResult, Result, RowLabeled, RowsAffected, Value};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

/// Something the mock driver was asked to do.
#[derive(Clone, PartialEq, Debug)]
pub enum Event {
    Connect(String),
    Prepare(String),
    PrepareWithKeys(String, Vec<String>),
    /// Position (1-based) and value.
    Bind(u64, Value),
    ClearBindings,
    AddBatch,
    /// SQL and the values it ran with.
    Execute(String, Vec<Value>),
    /// SQL and the number of items.
    ExecuteBatch(String, usize),
    SetAutoCommit(bool),
    SetIsolation(Isolation),
    Commit,
    Rollback,
    /// A prepared handle was dropped.
    Release(String),
    Disconnect,
}

/// Operations that can be told to fail.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Operation {
    Prepare,
    Execute,
    SetAutoCommit,
    SetIsolation,
    Commit,
    Rollback,
}

#[derive(Debug)]
struct State {
    events: Vec<Event>,
    responses: VecDeque<Vec<QueryResult>>,
    failures: Vec<(Operation, String)>,
    auto_commit: bool,
    isolation: Isolation,
    pending: Vec<String>,
    committed: Vec<String>,
}

/// Shared record of a mock session, also used to script its responses.
///
/// Every clone observes the same session.
#[derive(Clone, Debug)]
pub struct Journal(Arc<Mutex<State>>);

impl Journal {
    pub(crate) fn new(auto_commit: bool, isolation: Isolation) -> Self {
        Self(Arc::new(Mutex::new(State {
            events: Vec::new(),
            responses: VecDeque::new(),
            failures: Vec::new(),
            auto_commit,
            isolation,
            pending: Vec::new(),
            committed: Vec::new(),
        })))
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn record(&self, event: Event) {
        log::trace!("Mock event {event:?}");
        self.lock().events.push(event);
    }

    /// Fails with the scripted error if `operation` was told to fail next.
    pub(crate) fn check(&self, operation: Operation) -> Result<()> {
        let mut state = self.lock();
        if let Some(i) = state.failures.iter().position(|(v, _)| *v == operation) {
            let (_, message) = state.failures.remove(i);
            return Err(Error::msg(message));
        }
        Ok(())
    }

    /// Everything recorded so far, in order.
    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    /// Forget the recorded events.
    pub fn clear(&self) {
        self.lock().events.clear();
    }

    /// The SQL of every `Release` event, in order.
    pub fn released(&self) -> Vec<String> {
        self.lock()
            .events
            .iter()
            .filter_map(|v| match v {
                Event::Release(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    /// The next execution yields `results`. Each batch item consumes one response.
    pub fn push_response(&self, results: impl IntoIterator<Item = QueryResult>) {
        self.lock()
            .responses
            .push_back(results.into_iter().collect());
    }

    /// The next execution yields these rows.
    pub fn push_rows<L, R>(&self, labels: L, rows: impl IntoIterator<Item = R>)
    where
        L: IntoIterator,
        L::Item: Into<String>,
        R: IntoIterator<Item = Value>,
    {
        let labels: Arc<[String]> = labels.into_iter().map(Into::into).collect();
        self.push_response(
            rows.into_iter()
                .map(|row| RowLabeled::new(labels.clone(), row.into_iter().collect()).into()),
        );
    }

    /// The next execution reports `rows` affected rows.
    pub fn push_affected(&self, rows: u64) {
        self.push_response([RowsAffected::new(rows).into()]);
    }

    /// The next call of `operation` fails with `message`.
    pub fn fail_next(&self, operation: Operation, message: impl Into<String>) {
        self.lock().failures.push((operation, message.into()));
    }

    /// Statements executed but neither committed nor rolled back yet.
    pub fn pending(&self) -> Vec<String> {
        self.lock().pending.clone()
    }

    /// Statements that are permanent.
    pub fn committed(&self) -> Vec<String> {
        self.lock().committed.clone()
    }

    pub fn auto_commit(&self) -> bool {
        self.lock().auto_commit
    }

    pub fn isolation(&self) -> Isolation {
        self.lock().isolation
    }

    pub(crate) fn execute(&self, sql: &str) -> Vec<QueryResult> {
        let mut state = self.lock();
        if state.auto_commit {
            state.committed.push(sql.into());
        } else {
            state.pending.push(sql.into());
        }
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| vec![RowsAffected::new(0).into()])
    }

    pub(crate) fn set_auto_commit(&self, auto_commit: bool) {
        let mut state = self.lock();
        // Enabling auto-commit makes the outstanding work permanent
        if auto_commit && !state.auto_commit {
            let pending = std::mem::take(&mut state.pending);
            state.committed.extend(pending);
        }
        state.auto_commit = auto_commit;
    }

    pub(crate) fn set_isolation(&self, isolation: Isolation) {
        self.lock().isolation = isolation;
    }

    pub(crate) fn commit(&self) {
        let mut state = self.lock();
        let pending = std::mem::take(&mut state.pending);
        state.committed.extend(pending);
    }

    pub(crate) fn rollback(&self) {
        self.lock().pending.clear();
    }
}
