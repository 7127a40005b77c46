//! Function relacional: ejecuta un script SQL con semántica transaccional.
//!
//! Ciclo de vida:
//! - `pre_execute`: lee el script, resuelve credenciales vía el contexto y
//!   abre la única conexión del run.
//! - `execute`: corre el script dentro de una transacción explícita. Si el
//!   statement devuelve filas, esas filas son el resultado (un objeto JSON
//!   por fila); si no, se commitea. Ante cualquier error la transacción se
//!   revierte ANTES de que el error suba: no es observable un commit
//!   parcial.
//! - `post_execute`: cierra la conexión; idempotente.
//!
//! Parámetros de runtime: toda clave de la configuración salvo
//! `sql_file_path` es un bind param. Sin binds el script corre por
//! `simple_query` (acepta múltiples statements); con binds, los
//! placeholders `:nombre` se reescriben a `$n` posicionales y los valores
//! JSON se bindean nativamente.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use postgres::types::{ToSql, Type};
use postgres::{Client, Row, SimpleQueryMessage, Transaction};
use serde_json::{Map, Value};

use jobflow_core::{ExecutionContext, Function, FunctionError};

use crate::conn::ConnParams;

/// Nombre bajo el que se registra la implementación (el que escriben los
/// job specs en su campo `function`).
pub const PG_SQL_FUNCTION_NAME: &str = "PgSqlFunction";

const REQUIRED_PARAMS: &[&str] = &["sql_file_path"];

pub struct PgSqlFunction {
    ctx: ExecutionContext,
    config: Map<String, Value>,
    sql_root: PathBuf,
    client: Option<Client>,
    script: Option<String>,
}

impl std::fmt::Debug for PgSqlFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSqlFunction")
            .field("ctx", &self.ctx)
            .field("config", &self.config)
            .field("sql_root", &self.sql_root)
            .field("client", &self.client.as_ref().map(|_| "<Client>"))
            .field("script", &self.script)
            .finish()
    }
}

impl PgSqlFunction {
    /// La validación de parámetros obligatorios corre también aquí, a nivel
    /// constructor: un spec sin `sql_file_path` aborta la compilación del
    /// job, no espera al primer run.
    pub fn new(ctx: ExecutionContext,
               config: Map<String, Value>,
               sql_root: impl Into<PathBuf>)
               -> Result<Self, FunctionError> {
        for param in REQUIRED_PARAMS {
            if !config.contains_key(*param) {
                return Err(FunctionError::MissingRequiredParameter { function: PG_SQL_FUNCTION_NAME.to_string(),
                                                                     param: (*param).to_string() });
            }
        }
        Ok(Self { ctx, config, sql_root: sql_root.into(), client: None, script: None })
    }

    fn script_path(&self) -> Result<PathBuf, FunctionError> {
        let raw = self.config
                      .get("sql_file_path")
                      .and_then(Value::as_str)
                      .ok_or_else(|| FunctionError::MissingRequiredParameter { function: PG_SQL_FUNCTION_NAME.to_string(),
                                                                               param: "sql_file_path".to_string() })?;
        let path = Path::new(raw);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(self.sql_root.join(path))
        }
    }

    fn read_script(&self) -> Result<String, FunctionError> {
        let path = self.script_path()?;
        if !path.exists() {
            return Err(FunctionError::ScriptNotFound { path });
        }
        fs::read_to_string(&path)
            .map_err(|e| FunctionError::Internal(format!("cannot read sql script {}: {e}", path.display())))
    }

    // kwargs de runtime: configuración menos la ruta del script
    fn bind_params(&self) -> Vec<(String, Value)> {
        self.config
            .iter()
            .filter(|(k, _)| k.as_str() != "sql_file_path")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Function for PgSqlFunction {
    fn name(&self) -> &str {
        PG_SQL_FUNCTION_NAME
    }

    fn context(&self) -> &ExecutionContext {
        &self.ctx
    }

    fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    fn required_params(&self) -> &'static [&'static str] {
        REQUIRED_PARAMS
    }

    fn pre_execute(&mut self) -> Result<(), FunctionError> {
        self.script = Some(self.read_script()?);
        let bundle = self.ctx.get_secret(None)?;
        let params = ConnParams::from_bundle(&bundle)?;
        debug!("task '{}': opening postgres connection to {}:{}/{}",
               self.ctx.task_id, params.host, params.port, params.database);
        let client = params.connect()
                           .map_err(|e| FunctionError::Internal(format!("cannot open postgres connection: {e}")))?;
        self.client = Some(client);
        Ok(())
    }

    fn execute(&mut self) -> Result<Option<Value>, FunctionError> {
        let binds = self.bind_params();
        let (client, script) = match (self.client.as_mut(), self.script.as_deref()) {
            (Some(client), Some(script)) => (client, script),
            _ => {
                let detail = "connection or script not established; pre_execute must complete first".to_string();
                return Err(FunctionError::InvalidLifecycleState { op: "execute", detail });
            }
        };
        debug!("task '{}': executing sql script ({} bytes, {} bind params)",
               self.ctx.task_id, script.len(), binds.len());

        let mut tx = client.transaction().map_err(|e| FunctionError::QueryExecution(e.to_string()))?;
        let outcome = if binds.is_empty() {
            run_simple(&mut tx, script)
        } else {
            run_bound(&mut tx, script, &binds)
        };
        match outcome {
            Ok(Some(rows)) => {
                // statement con filas: las filas son el resultado; no hay
                // nada que commitear
                debug!("task '{}': script returned {} row(s)", self.ctx.task_id, rows.len());
                Ok(Some(Value::Array(rows)))
            }
            Ok(None) => {
                tx.commit().map_err(|e| FunctionError::QueryExecution(e.to_string()))?;
                debug!("task '{}': script committed", self.ctx.task_id);
                Ok(None)
            }
            Err(e) => {
                if let Err(rb) = tx.rollback() {
                    warn!("task '{}': rollback after failed script also failed: {rb}", self.ctx.task_id);
                }
                Err(FunctionError::QueryExecution(e.to_string()))
            }
        }
    }

    fn post_execute(&mut self) -> Result<(), FunctionError> {
        if let Some(client) = self.client.take() {
            drop(client);
            debug!("task '{}': postgres connection closed", self.ctx.task_id);
        }
        self.script = None;
        Ok(())
    }

    fn on_failure(&mut self) {
        if let Some(client) = self.client.as_mut() {
            // rollback best-effort por si quedó una transacción abierta; un
            // fallo aquí se registra y no escala
            if let Err(e) = client.batch_execute("ROLLBACK") {
                warn!("task '{}': rollback on failure failed: {e}", self.ctx.task_id);
            }
        }
        if let Err(e) = self.post_execute() {
            warn!("task '{}': cleanup on failure failed: {e}", self.ctx.task_id);
        }
    }

    fn on_retry(&mut self) {
        debug!("task '{}': releasing resources before retry", self.ctx.task_id);
        if let Err(e) = self.post_execute() {
            warn!("task '{}': cleanup before retry failed: {e}", self.ctx.task_id);
        }
    }
}

// Camino sin binds: simple_query acepta scripts multi-statement y devuelve
// las filas como texto. Un RowDescription sin filas sigue contando como
// "devolvió un row set" (SELECT vacío != DML).
fn run_simple(tx: &mut Transaction<'_>, script: &str) -> Result<Option<Vec<Value>>, postgres::Error> {
    let messages = tx.simple_query(script)?;
    let mut saw_row_set = false;
    let mut rows = Vec::new();
    for msg in messages {
        match msg {
            SimpleQueryMessage::Row(row) => {
                saw_row_set = true;
                let mut obj = Map::new();
                for (i, col) in row.columns().iter().enumerate() {
                    let value = row.get(i).map(|v| Value::String(v.to_string())).unwrap_or(Value::Null);
                    obj.insert(col.name().to_string(), value);
                }
                rows.push(Value::Object(obj));
            }
            SimpleQueryMessage::RowDescription(_) => saw_row_set = true,
            _ => {}
        }
    }
    Ok(if saw_row_set { Some(rows) } else { None })
}

// Camino con binds: un solo statement preparado; la forma del resultado la
// decide el statement (columns vacías = DML/DDL).
fn run_bound(tx: &mut Transaction<'_>,
             script: &str,
             binds: &[(String, Value)])
             -> Result<Option<Vec<Value>>, postgres::Error> {
    let (sql, ordered) = rewrite_placeholders(script, binds);
    let params: Vec<Box<dyn ToSql + Sync>> = ordered.iter().map(sql_param).collect();
    let param_refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|b| b.as_ref()).collect();
    let stmt = tx.prepare(&sql)?;
    if stmt.columns().is_empty() {
        tx.execute(&stmt, &param_refs)?;
        Ok(None)
    } else {
        let rows = tx.query(&stmt, &param_refs)?;
        Ok(Some(rows.iter().map(row_to_json).collect()))
    }
}

/// Reescribe placeholders `:nombre` a `$n` posicionales, asignando índices
/// por orden de primera aparición. Sólo se reescriben nombres presentes en
/// `binds`; `::` (cast) y contenido de strings `'...'` quedan intactos. Un
/// nombre repetido reusa su índice.
fn rewrite_placeholders(script: &str, binds: &[(String, Value)]) -> (String, Vec<Value>) {
    let mut out = String::with_capacity(script.len() + 8);
    let mut ordered: Vec<Value> = Vec::new();
    let mut index_of: HashMap<String, usize> = HashMap::new();
    let chars: Vec<char> = script.chars().collect();
    let mut i = 0usize;
    let mut in_string = false;
    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if c == '\'' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        match c {
            '\'' => {
                in_string = true;
                out.push(c);
                i += 1;
            }
            ':' => {
                let prev_blocks = out.chars()
                                     .last()
                                     .map(|p| p == ':' || p.is_alphanumeric() || p == '_')
                                     .unwrap_or(false);
                let next_starts_ident = chars.get(i + 1).map(|n| n.is_alphabetic() || *n == '_').unwrap_or(false);
                if prev_blocks || !next_starts_ident {
                    out.push(c);
                    i += 1;
                    continue;
                }
                let mut j = i + 1;
                while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
                    j += 1;
                }
                let name: String = chars[i + 1..j].iter().collect();
                match binds.iter().find(|(k, _)| *k == name) {
                    Some((_, value)) => {
                        let next_index = ordered.len() + 1;
                        let idx = *index_of.entry(name).or_insert_with(|| {
                                                           ordered.push(value.clone());
                                                           next_index
                                                       });
                        out.push('$');
                        out.push_str(&idx.to_string());
                    }
                    None => {
                        out.push(':');
                        out.push_str(&name);
                    }
                }
                i = j;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    (out, ordered)
}

// Mapeo JSON -> tipo nativo bindable. Arrays y objetos viajan como JSONB.
fn sql_param(v: &Value) -> Box<dyn ToSql + Sync> {
    match v {
        Value::Null => Box::new(Option::<String>::None),
        Value::Bool(b) => Box::new(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Box::new(i)
            } else if let Some(f) = n.as_f64() {
                Box::new(f)
            } else {
                Box::new(v.clone())
            }
        }
        Value::String(s) => Box::new(s.clone()),
        other => Box::new(other.clone()),
    }
}

fn row_to_json(row: &Row) -> Value {
    let mut obj = Map::new();
    for (i, col) in row.columns().iter().enumerate() {
        obj.insert(col.name().to_string(), column_to_json(row, i));
    }
    Value::Object(obj)
}

// Decodifica los tipos comunes de Postgres a JSON; un tipo sin conversión
// nativa queda como null con warning (el texto del tipo va en el log).
fn column_to_json(row: &Row, idx: usize) -> Value {
    let ty = row.columns()[idx].type_().clone();
    if ty == Type::BOOL {
        take(row.try_get::<_, Option<bool>>(idx)).map(Value::Bool).unwrap_or(Value::Null)
    } else if ty == Type::INT2 {
        take(row.try_get::<_, Option<i16>>(idx)).map(|v| Value::from(i64::from(v))).unwrap_or(Value::Null)
    } else if ty == Type::INT4 {
        take(row.try_get::<_, Option<i32>>(idx)).map(|v| Value::from(i64::from(v))).unwrap_or(Value::Null)
    } else if ty == Type::INT8 {
        take(row.try_get::<_, Option<i64>>(idx)).map(Value::from).unwrap_or(Value::Null)
    } else if ty == Type::FLOAT4 {
        take(row.try_get::<_, Option<f32>>(idx)).map(|v| Value::from(f64::from(v))).unwrap_or(Value::Null)
    } else if ty == Type::FLOAT8 {
        take(row.try_get::<_, Option<f64>>(idx)).map(Value::from).unwrap_or(Value::Null)
    } else if ty == Type::TEXT || ty == Type::VARCHAR || ty == Type::BPCHAR || ty == Type::NAME {
        take(row.try_get::<_, Option<String>>(idx)).map(Value::String).unwrap_or(Value::Null)
    } else if ty == Type::JSON || ty == Type::JSONB {
        take(row.try_get::<_, Option<Value>>(idx)).unwrap_or(Value::Null)
    } else if ty == Type::UUID {
        take(row.try_get::<_, Option<uuid::Uuid>>(idx)).map(|u| Value::String(u.to_string())).unwrap_or(Value::Null)
    } else if ty == Type::TIMESTAMPTZ {
        take(row.try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)).map(|t| Value::String(t.to_rfc3339()))
                                                                          .unwrap_or(Value::Null)
    } else if ty == Type::TIMESTAMP {
        take(row.try_get::<_, Option<chrono::NaiveDateTime>>(idx)).map(|t| Value::String(t.to_string()))
                                                                  .unwrap_or(Value::Null)
    } else if ty == Type::DATE {
        take(row.try_get::<_, Option<chrono::NaiveDate>>(idx)).map(|d| Value::String(d.to_string()))
                                                              .unwrap_or(Value::Null)
    } else {
        warn!("column '{}' has type {ty} without native json conversion; returning null",
              row.columns()[idx].name());
        Value::Null
    }
}

fn take<T>(r: Result<Option<T>, postgres::Error>) -> Option<T> {
    match r {
        Ok(v) => v,
        Err(e) => {
            warn!("column decode failed: {e}");
            None
        }
    }
}
