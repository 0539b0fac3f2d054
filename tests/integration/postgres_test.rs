//! PostgreSQL integration tests.
//!
//! Prepares and executes statements against a live server through a session.

use prepstmt::config::{ConnectionConfig, SessionConfig};
use prepstmt::db::ResultStatus;
use prepstmt::{exec_code, PrepError, ResultHolder, Session};

/// Helper to get test database URL from environment.
fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL").ok()
}

/// Helper to create a test session.
async fn get_test_session() -> Option<Session> {
    let url = get_test_database_url()?;
    let config = ConnectionConfig::from_connection_string(&url).ok()?;
    Session::connect(&config, SessionConfig::default()).await.ok()
}

#[tokio::test]
async fn test_select_with_parameter() {
    let Some(mut session) = get_test_session().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let id = session
        .prepare_statement("SELECT $1::int * 2 AS doubled, NULL::text AS nothing")
        .await
        .unwrap();

    let mut holder = ResultHolder::new();
    let outcome = session.exec(id, &["21"], &mut holder).await;
    assert_eq!(exec_code(&outcome), 0);
    assert_eq!(holder.status(), Some(ResultStatus::TuplesOk));
    assert_eq!(holder.row_count(), 1);
    assert_eq!(holder.column_name(0), Some("doubled"));
    assert_eq!(holder.cell_text(0, 0), "42");
    assert!(holder.is_null(0, 1));

    session.cleanup().await;
}

#[tokio::test]
async fn test_select_with_zero_rows_is_accepted() {
    let Some(mut session) = get_test_session().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let id = session
        .prepare_statement("SELECT 1 AS one WHERE false")
        .await
        .unwrap();

    let mut holder = ResultHolder::new();
    session.exec::<&str>(id, &[], &mut holder).await.unwrap();
    assert_eq!(holder.row_count(), 0);
    assert_eq!(holder.column_count(), 1);

    session.cleanup().await;
}

#[tokio::test]
async fn test_ddl_and_dml_lifecycle() {
    let Some(mut session) = get_test_session().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let create = session
        .prepare_statement("CREATE TEMP TABLE prepstmt_it (id int PRIMARY KEY, note text)")
        .await
        .unwrap();
    let mut holder = ResultHolder::new();
    session.exec::<&str>(create, &[], &mut holder).await.unwrap();

    let insert = session
        .prepare_statement("INSERT INTO prepstmt_it (id, note) VALUES ($1, $2)")
        .await
        .unwrap();
    session
        .exec(insert, &["1", "it's quoted"], &mut holder)
        .await
        .unwrap();
    assert_eq!(holder.rows_affected(), Some(1));

    let duplicate = session.exec(insert, &["1", "again"], &mut holder).await;
    assert_eq!(exec_code(&duplicate), 5);
    assert!(!holder.is_valid());

    let select = session
        .prepare_statement("SELECT note FROM prepstmt_it WHERE id = $1")
        .await
        .unwrap();
    session.exec(select, &["1"], &mut holder).await.unwrap();
    assert_eq!(holder.cell_text(0, 0), "it's quoted");

    session.cleanup().await;
}

#[tokio::test]
async fn test_invalid_sql_rejected_at_prepare() {
    let Some(mut session) = get_test_session().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = session
        .prepare_statement("SELECT * FROM nonexistent_table_xyz")
        .await;
    match result {
        Err(PrepError::BackendPrepareRejected(msg)) => {
            assert!(msg.contains("nonexistent_table_xyz") || msg.contains("does not exist"));
        }
        other => panic!("Expected BackendPrepareRejected, got {other:?}"),
    }
    assert_eq!(session.statement_count(), 0);

    let id = session.prepare_statement("SELECT 1").await.unwrap();
    assert_eq!(id, 1);

    session.cleanup().await;
}
