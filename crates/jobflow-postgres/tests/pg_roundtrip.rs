//! Pruebas de integración contra un Postgres real (requiere entorno).
//!
//! Se omiten en silencio si `JOBFLOW_TEST_PG_HOST` no está definido. Entorno
//! esperado: JOBFLOW_TEST_PG_HOST / _PORT (opcional) / _DATABASE / _USER /
//! _PASSWORD, apuntando a una base descartable.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};
use tempfile::TempDir;

use jobflow_core::{ExecutionContext, FunctionError, FunctionState, RunIdentity, SecretStore, TaskNode};
use jobflow_postgres::PgSqlFunction;

fn test_env() -> Option<Map<String, Value>> {
    let host = env::var("JOBFLOW_TEST_PG_HOST").ok()?;
    let mut secret = Map::new();
    secret.insert("host".into(), json!(host));
    if let Ok(port) = env::var("JOBFLOW_TEST_PG_PORT") {
        secret.insert("port".into(), json!(port));
    }
    secret.insert("database".into(),
                  json!(env::var("JOBFLOW_TEST_PG_DATABASE").unwrap_or_else(|_| "postgres".into())));
    secret.insert("user".into(), json!(env::var("JOBFLOW_TEST_PG_USER").unwrap_or_else(|_| "postgres".into())));
    secret.insert("password".into(), json!(env::var("JOBFLOW_TEST_PG_PASSWORD").unwrap_or_default()));
    Some(secret)
}

fn write_fixtures(dir: &Path, secret: &Map<String, Value>, script: &str) {
    fs::write(dir.join("it.json"), serde_json::to_string(&Value::Object(secret.clone())).unwrap()).unwrap();
    fs::write(dir.join("script.sql"), script).unwrap();
}

fn node_for(dir: &Path, extra_kwargs: &[(&str, Value)]) -> TaskNode {
    let mut config = Map::new();
    config.insert("sql_file_path".into(), json!("script.sql"));
    for (k, v) in extra_kwargs {
        config.insert(k.to_string(), v.clone());
    }
    let ctx = ExecutionContext::new(&RunIdentity::manual(),
                                    "job_it",
                                    "task_it",
                                    config.clone(),
                                    Some("it".to_string()),
                                    SecretStore::new(dir));
    let f = PgSqlFunction::new(ctx, config, dir).expect("constructor");
    TaskNode::new(Box::new(f))
}

fn run_script(secret: &Map<String, Value>, script: &str, kwargs: &[(&str, Value)]) -> Result<Option<Value>, FunctionError> {
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path(), secret, script);
    let mut node = node_for(dir.path(), kwargs);
    node.run()
}

#[test]
fn select_returns_rows_as_objects() {
    let Some(secret) = test_env() else {
        eprintln!("JOBFLOW_TEST_PG_HOST no definido: omitiendo test");
        return;
    };
    let out = run_script(&secret, "SELECT 1 AS one, 'x' AS label;", &[]).expect("run");
    let rows = out.expect("filas");
    assert_eq!(rows, json!([{"one": "1", "label": "x"}]));
}

#[test]
fn bound_params_reach_the_statement() {
    let Some(secret) = test_env() else {
        eprintln!("JOBFLOW_TEST_PG_HOST no definido: omitiendo test");
        return;
    };
    let out = run_script(&secret,
                         "SELECT :label::text AS echoed, :n::bigint + 1 AS next;",
                         &[("label", json!("abc")), ("n", json!(41))]).expect("run");
    let rows = out.expect("filas");
    assert_eq!(rows[0]["echoed"], json!("abc"));
    assert_eq!(rows[0]["next"], json!(42));
}

#[test]
fn failed_script_rolls_back_before_surfacing() {
    let Some(secret) = test_env() else {
        eprintln!("JOBFLOW_TEST_PG_HOST no definido: omitiendo test");
        return;
    };
    // preparar la tabla (run exitoso, commitea)
    run_script(&secret,
               "CREATE TABLE IF NOT EXISTS jobflow_rb_test(id INT); DELETE FROM jobflow_rb_test;",
               &[]).expect("setup");

    // insertar y fallar en el mismo script: nada debe quedar commiteado
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path(), &secret,
                   "INSERT INTO jobflow_rb_test VALUES (1); SELECT * FROM jobflow_no_such_table;");
    let mut node = node_for(dir.path(), &[]);
    node.pre_execute().expect("pre_execute");
    let err = node.execute().unwrap_err();
    assert!(matches!(err, FunctionError::QueryExecution(_)), "unexpected: {err}");
    assert_eq!(node.state(), FunctionState::Failed);

    // verificar que el INSERT se revirtió
    let out = run_script(&secret, "SELECT count(*) AS n FROM jobflow_rb_test;", &[]).expect("verify");
    assert_eq!(out.expect("filas")[0]["n"], json!("0"));

    // limpieza
    run_script(&secret, "DROP TABLE jobflow_rb_test;", &[]).expect("teardown");
}

#[test]
fn dml_without_rows_commits() {
    let Some(secret) = test_env() else {
        eprintln!("JOBFLOW_TEST_PG_HOST no definido: omitiendo test");
        return;
    };
    run_script(&secret,
               "CREATE TABLE IF NOT EXISTS jobflow_commit_test(id INT); DELETE FROM jobflow_commit_test; \
                INSERT INTO jobflow_commit_test VALUES (7);",
               &[]).expect("dml");
    let out = run_script(&secret, "SELECT id FROM jobflow_commit_test;", &[]).expect("verify");
    assert_eq!(out.expect("filas"), json!([{"id": "7"}]));
    run_script(&secret, "DROP TABLE jobflow_commit_test;", &[]).expect("teardown");
}

#[test]
fn retry_acquires_a_fresh_connection() {
    let Some(secret) = test_env() else {
        eprintln!("JOBFLOW_TEST_PG_HOST no definido: omitiendo test");
        return;
    };
    let dir = TempDir::new().unwrap();
    write_fixtures(dir.path(), &secret, "SELECT * FROM jobflow_missing_for_retry;");
    let mut node = node_for(dir.path(), &[]);
    node.pre_execute().expect("pre_execute");
    assert!(node.execute().is_err());
    assert_eq!(node.state(), FunctionState::Failed);

    // el segundo intento arregla el script y debe abrir conexión nueva
    fs::write(dir.path().join("script.sql"), "SELECT 5 AS five;").unwrap();
    node.retry().expect("retry");
    node.pre_execute().expect("fresh pre_execute");
    let out = node.execute().expect("fresh execute");
    assert_eq!(out.expect("filas")[0]["five"], json!("5"));
    node.post_execute().expect("post");
    node.succeed().expect("succeed");
}
