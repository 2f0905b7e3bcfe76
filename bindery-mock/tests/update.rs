use bindery_core::{
    Bind, Connection, Executor, QueryResult, Result, RowLabeled, RowsAffected, Update, Value,
    stream::Stream,
};
use bindery_mock::{Event, MockConnection, MockDriver, MockPrepared, Operation, init_logs};
use std::future::Future;

async fn connect() -> MockConnection {
    init_logs();
    let connection = MockConnection::connect("mock://localhost".into())
        .await
        .expect("Could not connect to the mock driver");
    connection.journal().clear();
    connection
}

#[tokio::test]
async fn execute() {
    let mut connection = connect().await;
    let journal = connection.journal();
    journal.push_affected(3);
    let affected = Update::parse("UPDATE users SET status = :status WHERE id IN :ids")
        .expect("Could not parse the update")
        .bind("status", "MIA")
        .and_then(|v| v.bind_list("ids", [1i64, 2, 3]))
        .expect("Could not bind the update")
        .execute(&mut connection)
        .await
        .expect("Could not execute the update");
    assert_eq!(affected.rows_affected, Some(3));

    let sql = "UPDATE users SET status = ? WHERE id IN (?,?,?)";
    let values = vec![
        Value::Varchar(Some("MIA".into())),
        Value::Int64(Some(1)),
        Value::Int64(Some(2)),
        Value::Int64(Some(3)),
    ];
    let mut expected = vec![Event::Prepare(sql.into())];
    expected.extend(
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Event::Bind(i as u64 + 1, v.clone())),
    );
    expected.push(Event::Execute(sql.into(), values));
    expected.push(Event::Release(sql.into()));
    assert_eq!(journal.events(), expected);
}

#[tokio::test]
async fn generated_keys() {
    let mut connection = connect().await;
    let journal = connection.journal();
    journal.push_response([
        QueryResult::Affected(RowsAffected {
            rows_affected: Some(1),
            last_affected_id: Some(42),
        }),
        QueryResult::Row(RowLabeled::new(
            ["id".to_string()].into(),
            [Value::Int64(Some(42))].into(),
        )),
    ]);
    let (affected, keys) = Update::parse("INSERT INTO users (name) VALUES (:name)")
        .expect("Could not parse the insert")
        .bind("name", "ann")
        .expect("Could not bind the name")
        .execute_returning_keys(&mut connection, ["id"], |row| row.get::<i64>("id"))
        .await
        .expect("Could not execute the insert");
    assert_eq!(affected.rows_affected, Some(1));
    assert_eq!(affected.last_affected_id, Some(42));
    assert_eq!(keys, [42]);
    assert_eq!(
        journal.events()[0],
        Event::PrepareWithKeys(
            "INSERT INTO users (name) VALUES (?)".into(),
            vec!["id".into()]
        )
    );
}

#[tokio::test]
async fn driver_errors_are_propagated() {
    let mut connection = connect().await;
    let journal = connection.journal();
    let update = Update::parse("DELETE FROM users").expect("Could not parse the delete");

    journal.fail_next(Operation::Prepare, "syntax error near DELETE");
    let error = update
        .execute(&mut connection)
        .await
        .expect_err("The prepare failure should be returned");
    assert!(format!("{error:#}").contains("syntax error near DELETE"));
    assert!(journal.events().is_empty());

    journal.fail_next(Operation::Execute, "disk full");
    let error = update
        .execute(&mut connection)
        .await
        .expect_err("The execute failure should be returned");
    assert!(format!("{error:#}").contains("disk full"));
    assert_eq!(
        journal.events(),
        [
            Event::Prepare("DELETE FROM users".into()),
            Event::Release("DELETE FROM users".into()),
        ]
    );
}

/// Executor relying on the default `prepare_with_keys`.
struct WithoutKeys(MockConnection);

impl Executor for WithoutKeys {
    type Driver = MockDriver;

    fn prepare(&mut self, sql: String) -> impl Future<Output = Result<MockPrepared>> + Send {
        self.0.prepare(sql)
    }

    fn run<'s>(
        &'s mut self,
        prepared: &'s mut MockPrepared,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        self.0.run(prepared)
    }

    fn run_batch<'s>(
        &'s mut self,
        prepared: &'s mut MockPrepared,
    ) -> impl Stream<Item = Result<QueryResult>> + Send + 's {
        self.0.run_batch(prepared)
    }
}

#[tokio::test]
async fn keys_unsupported() {
    let mut executor = WithoutKeys(connect().await);
    let update = Update::parse("INSERT INTO users (name) VALUES ('ann')")
        .expect("Could not parse the insert");
    let error = update
        .execute_returning_keys(&mut executor, ["id"], Ok)
        .await
        .expect_err("Keys are not supported");
    assert!(format!("{error:#}").contains("Generated keys are not supported by mock"));
    update
        .execute(&mut executor)
        .await
        .expect("A plain execute still works");
}
