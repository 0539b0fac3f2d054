//! Session integration tests.
//!
//! Exercises the prepare/execute lifecycle end to end over the mock backend.

use pretty_assertions::assert_eq;
use prepstmt::config::SessionConfig;
use prepstmt::db::{BackendCall, BackendResult, MockBackend, ResultStatus};
use prepstmt::{exec_code, CommandKind, PrepError, ResultHolder, Session};

const USERS_BY_ID: &str = "SELECT * FROM users WHERE id = $1";

fn users_backend() -> MockBackend {
    MockBackend::new().with_response(
        USERS_BY_ID,
        BackendResult::tuples(
            vec!["id".to_string(), "email".to_string()],
            vec![vec![Some("42".to_string()), Some("ada@example.com".to_string())]],
        ),
    )
}

#[tokio::test]
async fn test_end_to_end_select() {
    let mut session = Session::new(users_backend());

    let id = session.prepare_statement(USERS_BY_ID).await.unwrap();
    assert_eq!(id, 1);

    let mut holder = ResultHolder::new();
    let outcome = session.exec(id, &["42"], &mut holder).await;
    assert_eq!(exec_code(&outcome), 0);
    assert!(holder.row_count() >= 0);
    assert_eq!(holder.cell_text(0, 1), "ada@example.com");

    let outcome = session.exec(id, &["42", "x"], &mut holder).await;
    assert_eq!(exec_code(&outcome), 4);
    assert!(!holder.is_valid());
}

#[tokio::test]
async fn test_prepare_twice_reuses_entry() {
    let mut session = Session::new(MockBackend::new());

    for text in [
        "SELECT 1",
        "  insert into t values ($1)",
        "DELETE FROM t WHERE id = $2 AND a = $1",
    ] {
        let first = session.prepare_statement(text).await.unwrap();
        let count = session.statement_count();
        let second = session.prepare_statement(text).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(session.statement_count(), count);
    }
    assert_eq!(session.statement_count(), 3);
}

#[tokio::test]
async fn test_statement_metadata() {
    let mut session = Session::new(MockBackend::new());

    let id = session
        .prepare_statement("UPDATE t SET a = $1 WHERE id = $3")
        .await
        .unwrap();
    let stmt = session.statement(id).unwrap();

    assert_eq!(stmt.kind, CommandKind::Update);
    assert_eq!(stmt.param_count, 3);
    assert_eq!(stmt.name, "stmt_1");
    assert!(stmt.prepared);
}

#[tokio::test]
async fn test_unclassifiable_command() {
    let mut session = Session::new(MockBackend::new());

    let result = session.prepare_statement("FOO BAR").await;
    assert!(matches!(result, Err(PrepError::UnsupportedCommandKind(_))));
    assert_eq!(session.statement_count(), 0);
}

#[tokio::test]
async fn test_rejected_prepare_keeps_ids_contiguous() {
    let mut session = Session::new(MockBackend::new().reject_prepare("SELECT nope"));

    assert_eq!(session.prepare_statement("SELECT 1").await, Ok(1));
    assert!(session.prepare_statement("SELECT nope").await.is_err());
    assert!(session.last_error().is_some());
    assert_eq!(session.prepare_statement("SELECT 2").await, Ok(2));
    assert!(!session.statement_exists(3));
}

#[tokio::test]
async fn test_exec_unknown_id() {
    let mut session = Session::new(MockBackend::new());
    let mut holder = ResultHolder::new();

    for id in [0, 1, 99] {
        let outcome = session.exec::<&str>(id, &[], &mut holder).await;
        assert_eq!(exec_code(&outcome), 2);
        assert!(!holder.is_valid());
    }
}

#[tokio::test]
async fn test_exec_failure_releases_previous_result() {
    let mut session = Session::new(users_backend());
    let id = session.prepare_statement(USERS_BY_ID).await.unwrap();
    let mut holder = ResultHolder::new();

    session.exec(id, &["42"], &mut holder).await.unwrap();
    assert!(holder.is_valid());

    let outcome = session.exec::<&str>(id, &[], &mut holder).await;
    assert_eq!(
        outcome,
        Err(PrepError::ParameterCountMismatch {
            expected: 1,
            actual: 0
        })
    );
    assert!(!holder.is_valid());
    assert_eq!(holder.row_count(), -1);
}

#[tokio::test]
async fn test_result_validation_matrix_end_to_end() {
    let backend = MockBackend::new()
        .with_response("CREATE TABLE t (id int)", BackendResult::command_ok("CREATE TABLE", 0))
        .with_response(
            "DROP TABLE t",
            BackendResult::tuples(vec!["x".to_string()], vec![]),
        )
        .with_response(
            "TRUNCATE t",
            BackendResult::command_ok("TRUNCATE TABLE", 0).with_status(ResultStatus::EmptyQuery),
        );
    let mut session = Session::new(backend);
    let mut holder = ResultHolder::new();

    let create = session.prepare_statement("CREATE TABLE t (id int)").await.unwrap();
    let drop = session.prepare_statement("DROP TABLE t").await.unwrap();
    let truncate = session.prepare_statement("TRUNCATE t").await.unwrap();

    let outcome = session.exec::<&str>(create, &[], &mut holder).await;
    assert_eq!(exec_code(&outcome), 0);
    assert_eq!(holder.status(), Some(ResultStatus::CommandOk));

    let outcome = session.exec::<&str>(drop, &[], &mut holder).await;
    assert_eq!(exec_code(&outcome), 5);
    assert!(!holder.is_valid());

    let outcome = session.exec::<&str>(truncate, &[], &mut holder).await;
    assert_eq!(exec_code(&outcome), 5);
}

#[tokio::test]
async fn test_cleanup_forgets_statements() {
    let backend = MockBackend::new();
    let log = backend.call_log();
    let mut session = Session::new(backend);

    let id = session.prepare_statement("SELECT 1").await.unwrap();
    session.cleanup().await;

    assert_eq!(session.statement_count(), 0);
    assert!(!session.statement_exists(id));
    assert_eq!(log.lock().unwrap().last(), Some(&BackendCall::Close));

    let mut holder = ResultHolder::new();
    let outcome = session.exec::<&str>(id, &[], &mut holder).await;
    assert_eq!(exec_code(&outcome), 1);

    session.init(Box::new(MockBackend::new())).await;
    let outcome = session.exec::<&str>(id, &[], &mut holder).await;
    assert_eq!(exec_code(&outcome), 2);
}

#[tokio::test]
async fn test_strict_placeholders() {
    let config = SessionConfig {
        strict_placeholders: true,
        ..Default::default()
    };
    let mut session = Session::with_config(Box::new(MockBackend::new()), config);

    let result = session.prepare_statement("SELECT $1, $3").await;
    assert!(matches!(result, Err(PrepError::PlaceholderGap { .. })));

    let id = session.prepare_statement("SELECT $2, $1").await.unwrap();
    assert_eq!(id, 1);
}

#[tokio::test]
async fn test_custom_statement_prefix() {
    let backend = MockBackend::new();
    let log = backend.call_log();
    let config = SessionConfig {
        statement_prefix: "app_".to_string(),
        ..Default::default()
    };
    let mut session = Session::with_config(Box::new(backend), config);

    session.prepare_statement("SELECT 1").await.unwrap();

    let calls = log.lock().unwrap();
    assert!(matches!(
        &calls[0],
        BackendCall::Prepare { name, .. } if name == "app_1"
    ));
}

#[tokio::test]
async fn test_session_behind_mutex() {
    let session = tokio::sync::Mutex::new(Session::new(MockBackend::new()));

    let tasks = (0..4).map(|i| {
        let session = &session;
        async move {
            let mut guard = session.lock().await;
            guard
                .prepare_statement(&format!("SELECT {}", i % 2))
                .await
                .unwrap()
        }
    });
    let ids = futures::future::join_all(tasks).await;

    assert_eq!(ids, vec![1, 2, 1, 2]);
    assert_eq!(session.lock().await.statement_count(), 2);
}
