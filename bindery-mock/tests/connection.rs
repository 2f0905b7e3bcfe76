use bindery_core::{Connection, Driver, Isolation};
use bindery_mock::{Event, MockConnection, MockDriver, init_logs, silent_logs};

#[tokio::test]
async fn url_options() {
    init_logs();
    let connection =
        MockConnection::connect("mock://localhost?auto_commit=false&isolation=serializable".into())
            .await
            .expect("Could not connect to the mock driver");
    let journal = connection.journal();
    assert!(!journal.auto_commit());
    assert_eq!(journal.isolation(), Isolation::Serializable);
    assert_eq!(connection.url().host_str(), Some("localhost"));
}

#[tokio::test]
async fn in_memory() {
    init_logs();
    let connection = MockDriver::new()
        .connect("mock://:memory:".into())
        .await
        .expect("Could not connect to the mock driver");
    assert_eq!(connection.url().host_str(), Some("localhost"));
    assert_eq!(connection.url().query(), Some("mode=memory"));
    let journal = connection.journal();
    assert!(journal.auto_commit());
    assert_eq!(journal.isolation(), Isolation::ReadCommitted);
    connection
        .disconnect()
        .await
        .expect("Could not disconnect");
    assert_eq!(journal.events().last(), Some(&Event::Disconnect));
}

#[tokio::test]
async fn invalid_urls() {
    init_logs();
    assert_eq!(MockDriver::new().name(), "mock");
    let error = silent_logs! {
        MockConnection::connect("postgres://localhost".into())
            .await
            .expect_err("Only mock:// URLs are accepted")
    };
    assert!(format!("{error:#}").contains("mock://"));
    let error = MockConnection::connect("mock://localhost?isolation=snapshot".into())
        .await
        .expect_err("Unknown isolation level");
    assert!(format!("{error:#}").contains("snapshot"));
    let error = MockConnection::connect("mock://localhost?auto_commit=maybe".into())
        .await
        .expect_err("Invalid auto-commit flag");
    assert!(format!("{error:#}").contains("maybe"));
}
