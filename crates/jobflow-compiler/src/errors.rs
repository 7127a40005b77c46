//! Errores de compilación de job specs.
//!
//! Distinción central del diseño: los problemas estructurales de un job
//! (implementación desconocida, parámetro obligatorio ausente, ciclo)
//! abortan la compilación de ESE job y se propagan como `CompileError`; los
//! problemas recuperables (edge colgante, archivo de spec ilegible, job_id
//! duplicado) se registran como diagnósticos y la pasada continúa.

use std::path::PathBuf;

use thiserror::Error;

use jobflow_core::{FunctionError, UnknownImplementation};

/// Spec malformado o inválido.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("cannot read job spec {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed job spec {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid job spec '{job_id}': {reason}")]
    Invalid { job_id: String, reason: String },
}

/// Aborta la compilación del job afectado. Cada variante nombra el job y,
/// cuando aplica, la task y el campo ofensivo.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error("job '{job_id}', task '{task_id}': {source}")]
    ImplementationNotFound {
        job_id: String,
        task_id: String,
        #[source]
        source: UnknownImplementation,
    },
    #[error("job '{job_id}', task '{task_id}': required parameter '{param}' is missing")]
    MissingRequiredParameter { job_id: String, task_id: String, param: String },
    #[error("job '{job_id}': cyclic dependency among tasks {cycle:?}")]
    CyclicDependency { job_id: String, cycle: Vec<String> },
    #[error("job '{job_id}', task '{task_id}': cannot instantiate: {source}")]
    Instantiation {
        job_id: String,
        task_id: String,
        #[source]
        source: FunctionError,
    },
}
