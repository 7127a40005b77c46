//! Errores del núcleo: resolución de secretos y ciclo de vida de Functions.
//!
//! - `SecretError` cubre la resolución de credenciales (siempre en runtime,
//!   dentro de `pre_execute`).
//! - `FunctionError` es el tipo de error común de los hooks del ciclo de vida;
//!   las implementaciones concretas mapean sus fallos a estas variantes.
//! - `UnknownImplementation` pertenece a la resolución del registry y lo
//!   consume el compilador (aborta la compilación del job afectado).

use std::path::PathBuf;

use thiserror::Error;

/// Fallos al resolver un bundle de credenciales desde el `SecretStore`.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("no secret name provided and no secret_key set in ExecutionContext")]
    NoSecretKey,
    #[error("secret file not found: {path} (derived from key '{name}')")]
    NotFound { name: String, path: PathBuf },
    #[error("cannot read secret file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("secret file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("secret '{name}' is missing required field '{field}'")]
    MissingField { name: String, field: String },
    #[error("secret '{name}' has invalid field '{field}': {detail}")]
    InvalidField { name: String, field: String, detail: String },
}

/// Error común de los hooks del ciclo de vida (`pre_execute` / `execute` /
/// `post_execute`). El driver (`TaskNode`) agrega las variantes de guarda;
/// las implementaciones aportan las específicas de su recurso.
#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("required parameter '{param}' missing for function '{function}'")]
    MissingRequiredParameter { function: String, param: String },
    #[error("invalid lifecycle state in {op}: {detail}")]
    InvalidLifecycleState { op: &'static str, detail: String },
    #[error("sql script not found: {path}")]
    ScriptNotFound { path: PathBuf },
    #[error("credential resolution failed: {0}")]
    CredentialResolution(#[from] SecretError),
    #[error("query execution failed (transaction rolled back): {0}")]
    QueryExecution(String),
    #[error("internal: {0}")]
    Internal(String),
}

/// Nombre de implementación no registrado. Lista los nombres conocidos para
/// que el fallo sea accionable sin inspeccionar el proceso.
#[derive(Debug, Error)]
#[error("unknown implementation '{name}'; known implementations: {known:?}")]
pub struct UnknownImplementation {
    pub name: String,
    pub known: Vec<String>,
}
