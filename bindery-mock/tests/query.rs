use bindery_core::{
    ArgumentFn, ArgumentTarget, Bind, BindingError, Connection, Error, Query, Value,
    stream::TryStreamExt,
};
use bindery_mock::{Event, MockConnection, init_logs, silent_logs};
use std::pin::pin;

async fn connect() -> MockConnection {
    init_logs();
    let connection = MockConnection::connect("mock://localhost".into())
        .await
        .expect("Could not connect to the mock driver");
    connection.journal().clear();
    connection
}

fn varchar(value: &str) -> Value {
    Value::Varchar(Some(value.into()))
}

#[tokio::test]
async fn map_rows() {
    let mut connection = connect().await;
    let journal = connection.journal();
    journal.push_rows(
        ["id", "name"],
        [
            [Value::Int64(Some(1)), varchar("ann")],
            [Value::Int64(Some(2)), varchar("bob")],
        ],
    );
    let query = Query::parse("SELECT id, name FROM users WHERE status IN :statuses AND id > :id")
        .expect("Could not parse the query")
        .bind_list("statuses", ["ACTIVE", "MIA"])
        .and_then(|v| v.bind("id", 0))
        .expect("Could not bind the query");
    let users = query
        .map(&mut connection, |row| {
            Ok((row.get::<i64>("id")?, row.get::<String>("name")?))
        })
        .await
        .expect("Could not map the rows");
    assert_eq!(users, [(1, "ann".to_string()), (2, "bob".to_string())]);

    let sql = "SELECT id, name FROM users WHERE status IN (?,?) AND id > ?";
    assert_eq!(
        journal.events(),
        [
            Event::Prepare(sql.into()),
            Event::Bind(1, varchar("ACTIVE")),
            Event::Bind(2, varchar("MIA")),
            Event::Bind(3, Value::Int32(Some(0))),
            Event::Execute(
                sql.into(),
                vec![varchar("ACTIVE"), varchar("MIA"), Value::Int32(Some(0))]
            ),
            Event::Release(sql.into()),
        ]
    );
}

#[tokio::test]
async fn mapper_failure_releases_the_statement() {
    let mut connection = connect().await;
    let journal = connection.journal();
    journal.push_rows(
        ["id"],
        [[Value::Int64(Some(1))], [Value::Int64(Some(2))]],
    );
    let query = Query::parse("SELECT id FROM t").expect("Could not parse the query");
    let result = query
        .map(&mut connection, |row| {
            if row.get::<i64>("id")? == 1 {
                return Err(Error::msg("Rejected the first row"));
            }
            Ok(())
        })
        .await;
    let error = result.expect_err("The mapper error should be returned");
    assert_eq!(error.to_string(), "Rejected the first row");
    assert_eq!(journal.released(), ["SELECT id FROM t"]);
}

#[tokio::test]
async fn dropping_the_stream_releases_the_statement() {
    let mut connection = connect().await;
    let journal = connection.journal();
    journal.push_rows(
        ["id"],
        [[Value::Int64(Some(1))], [Value::Int64(Some(2))]],
    );
    let query = Query::parse("SELECT id FROM t").expect("Could not parse the query");
    {
        let mut stream = pin!(query.fetch(&mut connection));
        let first = stream
            .try_next()
            .await
            .expect("Could not fetch the first row")
            .expect("Expected a first row");
        assert_eq!(first.get::<i64>("id").expect("Expected an id"), 1);
        assert!(journal.released().is_empty());
    }
    assert_eq!(journal.released(), ["SELECT id FROM t"]);
}

#[tokio::test]
async fn missing_bindings_fail_before_preparing() {
    let mut connection = connect().await;
    let journal = connection.journal();
    let query = Query::parse("SELECT * FROM t WHERE a = :a AND b = :b AND c = :c")
        .expect("Could not parse the query")
        .bind("b", true)
        .expect("Could not bind b");
    let error = query
        .list(&mut connection)
        .await
        .expect_err("Expected missing bindings");
    assert_eq!(
        error.downcast_ref::<BindingError>(),
        Some(&BindingError::MissingBindings(vec!["a".into(), "c".into()]))
    );
    assert!(journal.events().is_empty());
}

#[tokio::test]
async fn one_and_optional() {
    let mut connection = connect().await;
    let journal = connection.journal();
    let query = Query::parse("SELECT name FROM users WHERE id = :id")
        .expect("Could not parse the query")
        .bind("id", 7u32)
        .expect("Could not bind id");
    let name = |row: bindery_core::RowLabeled| row.get::<String>("name");

    journal.push_rows(["name"], [[varchar("ann")]]);
    assert_eq!(
        query.one(&mut connection, name).await.expect("Expected one row"),
        "ann"
    );

    assert_eq!(
        query
            .optional(&mut connection, name)
            .await
            .expect("Expected no failure"),
        None
    );
    silent_logs! {
        query
            .one(&mut connection, name)
            .await
            .expect_err("Zero rows is not exactly one");
    }

    journal.push_rows(["name"], [[varchar("ann")], [varchar("bob")]]);
    silent_logs! {
        query
            .optional(&mut connection, name)
            .await
            .expect_err("Two rows is more than optional allows");
    }
    assert_eq!(journal.released().len(), 4);
}

#[tokio::test]
async fn custom_argument() {
    let mut connection = connect().await;
    let journal = connection.journal();
    let upper = ArgumentFn::new("upper name", |target: &mut dyn ArgumentTarget, position| {
        target.set(position, Value::Varchar(Some("ANN".into())))
    });
    let rows = Query::parse("SELECT * FROM users WHERE name = :name")
        .expect("Could not parse the query")
        .bind_argument("name", upper)
        .expect("Could not bind the argument")
        .list(&mut connection)
        .await
        .expect("Could not list the rows");
    assert!(rows.is_empty());
    assert!(
        journal
            .events()
            .contains(&Event::Bind(1, varchar("ANN")))
    );
}

#[tokio::test]
async fn typed_nulls() {
    let mut connection = connect().await;
    let journal = connection.journal();
    Query::parse("SELECT * FROM t WHERE a IS NOT DISTINCT FROM :a AND b = :b")
        .expect("Could not parse the query")
        .bind_null::<i64>("a")
        .and_then(|v| v.bind("b", None::<String>))
        .expect("Could not bind the nulls")
        .list(&mut connection)
        .await
        .expect("Could not list the rows");
    let events = journal.events();
    assert!(events.contains(&Event::Bind(1, Value::Int64(None))));
    assert!(events.contains(&Event::Bind(2, Value::Varchar(None))));
}

#[tokio::test]
async fn question_marks_in_literals_and_comments() {
    let mut connection = connect().await;
    let journal = connection.journal();
    Query::parse("SELECT '?', \"a?\" /* ? */ FROM t WHERE id IN ( -- ids?\n :ids)")
        .expect("Could not parse the query")
        .bind_list("ids", [1, 2])
        .expect("Could not bind the query")
        .list(&mut connection)
        .await
        .expect("Could not list the rows");
    let sql = "SELECT '?', \"a?\" /* ? */ FROM t WHERE id IN ( -- ids?\n ?,?)";
    assert!(journal.events().contains(&Event::Execute(
        sql.into(),
        vec![Value::Int32(Some(1)), Value::Int32(Some(2))]
    )));
}
