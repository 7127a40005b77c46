//! Comportamiento de PgSqlFunction que no requiere una base de datos:
//! validación de constructor, script ausente, resolución de credenciales y
//! limpieza idempotente.

use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};use tempfile::TempDir;

use jobflow_core::{ExecutionContext, Function, FunctionError, FunctionState, RunIdentity, SecretError, SecretStore,
                   TaskNode};
use jobflow_postgres::PgSqlFunction;

fn config_with_script(path: &str) -> Map<String, Value> {
    let mut m = Map::new();
    m.insert("sql_file_path".into(), json!(path));
    m
}

fn ctx(secrets_dir: &Path, secret_key: Option<&str>) -> ExecutionContext {
    ExecutionContext::new(&RunIdentity::manual(),
                          "job_pg",
                          "task_pg",
                          Map::new(),
                          secret_key.map(str::to_string),
                          SecretStore::new(secrets_dir))
}

#[test]
fn constructor_requires_sql_file_path() {
    let dir = TempDir::new().unwrap();
    let err = PgSqlFunction::new(ctx(dir.path(), None), Map::new(), dir.path()).unwrap_err();
    match err {
        FunctionError::MissingRequiredParameter { function, param } => {
            assert_eq!(function, "PgSqlFunction");
            assert_eq!(param, "sql_file_path");
        }
        other => panic!("unexpected: {other}"),
    }
}

#[test]
fn missing_script_fails_pre_execute() {
    let dir = TempDir::new().unwrap();
    let f = PgSqlFunction::new(ctx(dir.path(), Some("creds")), config_with_script("no/such.sql"), dir.path()).unwrap();
    let mut node = TaskNode::new(Box::new(f));
    let err = node.pre_execute().unwrap_err();
    match err {
        FunctionError::ScriptNotFound { path } => assert!(path.ends_with("no/such.sql")),
        other => panic!("unexpected: {other}"),
    }
    assert_eq!(node.state(), FunctionState::Failed);
}

#[test]
fn missing_secret_key_is_a_credential_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("query.sql"), "SELECT 1;").unwrap();
    let f = PgSqlFunction::new(ctx(dir.path(), None), config_with_script("query.sql"), dir.path()).unwrap();
    let mut node = TaskNode::new(Box::new(f));
    let err = node.pre_execute().unwrap_err();
    assert!(matches!(err, FunctionError::CredentialResolution(SecretError::NoSecretKey)));
}

#[test]
fn secret_without_database_field_names_it() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("query.sql"), "SELECT 1;").unwrap();
    fs::write(dir.path().join("creds.json"),
              r#"{"host": "localhost", "user": "app", "password": "pw"}"#).unwrap();
    let f = PgSqlFunction::new(ctx(dir.path(), Some("creds")), config_with_script("query.sql"), dir.path()).unwrap();
    let mut node = TaskNode::new(Box::new(f));
    let err = node.pre_execute().unwrap_err();
    match err {
        FunctionError::CredentialResolution(SecretError::MissingField { field, .. }) => {
            assert_eq!(field, "database");
        }
        other => panic!("unexpected: {other}"),
    }
    // la limpieza tras el fallo ya corrió; reintentar deja el nodo listo
    node.retry().expect("retry desde Failed");
    assert_eq!(node.state(), FunctionState::Retrying);
}

#[test]
fn execute_without_pre_execute_is_a_lifecycle_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("query.sql"), "SELECT 1;").unwrap();
    let f = PgSqlFunction::new(ctx(dir.path(), Some("creds")), config_with_script("query.sql"), dir.path()).unwrap();
    let mut node = TaskNode::new(Box::new(f));
    assert!(matches!(node.execute(), Err(FunctionError::InvalidLifecycleState { op: "execute", .. })));
}

#[test]
fn post_execute_is_idempotent_without_resources() {
    let dir = TempDir::new().unwrap();
    let mut f =
        PgSqlFunction::new(ctx(dir.path(), None), config_with_script("query.sql"), dir.path()).unwrap();
    // sin conexión abierta: ambas llamadas son no-ops que no fallan
    f.post_execute().expect("first");
    f.post_execute().expect("second");
}

#[test]
fn absolute_sql_path_skips_the_root() {
    let dir = TempDir::new().unwrap();
    let abs = dir.path().join("abs.sql");
    fs::write(&abs, "SELECT 1;").unwrap();
    fs::write(dir.path().join("creds.json"), r#"{"host": "h", "user": "u", "password": "p"}"#).unwrap();
    let f = PgSqlFunction::new(ctx(dir.path(), Some("creds")),
                               config_with_script(abs.to_str().unwrap()),
                               "/some/other/root").unwrap();
    let mut node = TaskNode::new(Box::new(f));
    // el script absoluto se encontró: el fallo llega recién en credenciales
    let err = node.pre_execute().unwrap_err();
    assert!(matches!(err, FunctionError::CredentialResolution(SecretError::MissingField { .. })));
}
