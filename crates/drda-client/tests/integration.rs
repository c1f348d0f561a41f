//! Live server integration tests.
//!
//! These tests require a running Derby network server or Db2 instance. They
//! are ignored by default and can be run with:
//!
//! ```bash
//! export DRDA_HOST=localhost
//! export DRDA_PORT=1527
//! export DRDA_DATABASE=testdb
//! # Db2 only
//! export DRDA_USER=db2inst1
//! export DRDA_PASSWORD=secret
//!
//! cargo test -p drda-client --test integration -- --ignored
//! ```
//!
//! A Derby server for local runs:
//! ```bash
//! java -jar derbyrun.jar server start -noSecurityManager
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use drda_client::{Client, Config, Error};

/// Connection settings from the environment.
fn get_test_config() -> Option<Config> {
    let host = std::env::var("DRDA_HOST").ok()?;
    let port = std::env::var("DRDA_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(1527);
    let database = std::env::var("DRDA_DATABASE").unwrap_or_else(|_| "testdb".into());

    let mut config = Config::new().host(host).port(port).database(database);
    if let (Ok(user), Ok(password)) = (std::env::var("DRDA_USER"), std::env::var("DRDA_PASSWORD")) {
        config = config.credentials(user, password);
    }
    Some(config)
}

fn table_name(suffix: &str) -> String {
    format!("DRDA_TEST_{}_{}", suffix, std::process::id())
}

#[test]
#[ignore = "Requires a DRDA server"]
fn test_basic_connection() {
    let config = get_test_config().expect("DRDA_HOST required");
    let client = Client::connect(config).expect("Failed to connect");
    client.close().expect("Failed to close connection");
}

#[test]
#[ignore = "Requires a DRDA server"]
fn test_create_insert_select() {
    let config = get_test_config().expect("DRDA_HOST required");
    let mut client = Client::connect(config).unwrap();
    let table = table_name("BASIC");

    client
        .execute(&format!(
            "CREATE TABLE {table} (ID INTEGER NOT NULL, NAME VARCHAR(40), PRICE DECIMAL(9, 2))"
        ))
        .unwrap();

    for (id, name) in [(1, "alpha"), (2, "O'Brien")] {
        let inserted = client
            .execute_with(
                &format!("INSERT INTO {table} (ID, NAME, PRICE) VALUES (?, ?, 12.50)"),
                &[&id, &name],
            )
            .unwrap();
        assert_eq!(inserted, 1);
    }

    let rs = client
        .query(&format!("SELECT ID, NAME, PRICE FROM {table} ORDER BY ID"))
        .unwrap();
    assert_eq!(rs.columns().len(), 3);
    let names: Vec<String> = rs.map(|row| row.get_by_name("NAME").unwrap()).collect();
    assert_eq!(names, ["alpha", "O'Brien"]);

    client.execute(&format!("DROP TABLE {table}")).unwrap();
    client.close().unwrap();
}

#[test]
#[ignore = "Requires a DRDA server"]
fn test_sql_error_keeps_connection_usable() {
    let config = get_test_config().expect("DRDA_HOST required");
    let mut client = Client::connect(config).unwrap();

    let err = client.query("SELECT * FROM DRDA_NO_SUCH_TABLE").unwrap_err();
    assert!(matches!(err, Error::Sql { .. }), "{err:?}");
    assert!(!client.is_poisoned());

    client.execute("COMMIT").unwrap();
    let table = table_name("AFTER_ERROR");
    client
        .execute(&format!("CREATE TABLE {table} (N INTEGER)"))
        .unwrap();
    let rs = client.query(&format!("SELECT N FROM {table}")).unwrap();
    assert!(rs.is_empty());
    client.execute(&format!("DROP TABLE {table}")).unwrap();
}

#[test]
#[ignore = "Requires a DRDA server"]
fn test_invalid_database_is_rejected() {
    let config = get_test_config()
        .expect("DRDA_HOST required")
        .database("DRDA_NO_SUCH_DB");
    let err = Client::connect(config).unwrap_err();
    assert!(matches!(err, Error::Server { .. } | Error::Sql { .. }), "{err:?}");
}
