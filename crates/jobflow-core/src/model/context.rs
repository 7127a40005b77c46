//! Contexto de ejecución entregado a cada Function.
//!
//! Un `ExecutionContext` es un value object inmutable por run: identidad
//! (job/task/run), parámetros y la referencia de credenciales. Lo construye
//! el compilador y lo posee en exclusiva la instancia de Function durante
//! ese run.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::SecretError;
use crate::secret::{SecretBundle, SecretStore};

/// Identidad de run aportada por el scheduler externo en el límite de
/// proceso. El core no decide cuándo ni cuántas veces se ejecuta un job;
/// sólo propaga estos campos a los contextos.
#[derive(Debug, Clone)]
pub struct RunIdentity {
    pub execution_time: DateTime<Utc>,
    pub run_id: String,
}

impl RunIdentity {
    pub fn new(execution_time: DateTime<Utc>, run_id: impl Into<String>) -> Self {
        Self { execution_time, run_id: run_id.into() }
    }

    /// Identidad generada localmente para pases de discovery o disparos
    /// manuales sin scheduler.
    pub fn manual() -> Self {
        Self { execution_time: Utc::now(), run_id: format!("manual__{}", Uuid::new_v4()) }
    }
}

/// Contexto por run: identidad + parámetros + handle de secretos.
/// Inmutable tras la construcción.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub execution_time: DateTime<Utc>,
    pub job_id: String,
    pub task_id: String,
    pub run_id: String,
    pub params: Map<String, Value>,
    pub secret_key: Option<String>,
    secrets: SecretStore,
}

impl ExecutionContext {
    pub fn new(identity: &RunIdentity,
               job_id: impl Into<String>,
               task_id: impl Into<String>,
               params: Map<String, Value>,
               secret_key: Option<String>,
               secrets: SecretStore)
               -> Self {
        Self { execution_time: identity.execution_time,
               job_id: job_id.into(),
               task_id: task_id.into(),
               run_id: identity.run_id.clone(),
               params,
               secret_key,
               secrets }
    }

    /// Resuelve el bundle de credenciales. `name_override` tiene precedencia
    /// sobre el `secret_key` del contexto; sin ninguno de los dos falla con
    /// `NoSecretKey`.
    pub fn get_secret(&self, name_override: Option<&str>) -> Result<SecretBundle, SecretError> {
        let name = name_override.or(self.secret_key.as_deref()).ok_or(SecretError::NoSecretKey)?;
        self.secrets.resolve(name)
    }
}
