//! Modelo de datos del job spec declarativo (YAML, uno por archivo).
//!
//! El spec describe QUÉ correr: un graph de tasks con dependencias, cada
//! task ligada a un nombre de implementación y una referencia de secreto.
//! `tasks` preserva el orden de declaración (la compilación resuelve en ese
//! orden y los mensajes de error resultan estables).

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::SpecError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JobSpec {
    pub job_id: String,
    pub schedule: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub catchup: bool,
    #[serde(default)]
    pub tasks: IndexMap<String, TaskSpec>,
    #[serde(default)]
    pub dependencies: Vec<DependencyEdge>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskSpec {
    pub task_id: String,
    /// Nombre de implementación, tal como está registrado en el
    /// OperatorRegistry.
    pub function: String,
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default)]
    pub kwargs: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DependencyEdge {
    pub source: String,
    pub target: String,
}

impl JobSpec {
    pub fn from_yaml_str(raw: &str) -> Result<Self, SpecError> {
        let spec: JobSpec = serde_yaml::from_str(raw).map_err(|source| SpecError::Yaml { path: "<inline>".into(),
                                                                                         source })?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, SpecError> {
        let raw = fs::read_to_string(path).map_err(|source| SpecError::Io { path: path.to_path_buf(), source })?;
        let spec: JobSpec =
            serde_yaml::from_str(&raw).map_err(|source| SpecError::Yaml { path: path.to_path_buf(), source })?;
        spec.validate()?;
        Ok(spec)
    }

    fn validate(&self) -> Result<(), SpecError> {
        if self.job_id.trim().is_empty() {
            return Err(SpecError::Invalid { job_id: self.job_id.clone(), reason: "job_id must be non-empty".into() });
        }
        if self.schedule.trim().is_empty() {
            return Err(SpecError::Invalid { job_id: self.job_id.clone(),
                                            reason: "schedule must be non-empty".into() });
        }
        for (key, task) in &self.tasks {
            if task.task_id.trim().is_empty() {
                return Err(SpecError::Invalid { job_id: self.job_id.clone(),
                                                reason: format!("task '{key}' has an empty task_id") });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_spec_with_defaults() {
        let raw = r#"
job_id: daily_metrics
schedule: "0 6 * * *"
tasks:
  extract:
    task_id: extract
    function: PgSqlFunction
    secret_key: warehouse
    kwargs:
      sql_file_path: sql/extract.sql
      day: 3
  load:
    task_id: load
    function: PgSqlFunction
    secret_key: warehouse
    kwargs:
      sql_file_path: sql/load.sql
dependencies:
  - source: extract
    target: load
"#;
        let spec = JobSpec::from_yaml_str(raw).expect("spec parse");
        assert_eq!(spec.job_id, "daily_metrics");
        assert!(!spec.catchup);
        assert!(spec.tags.is_empty());
        assert_eq!(spec.description, "");
        // orden de declaración preservado
        let keys: Vec<&str> = spec.tasks.keys().map(String::as_str).collect();
        assert_eq!(keys, ["extract", "load"]);
        assert_eq!(spec.tasks["extract"].kwargs["day"], serde_json::json!(3));
        assert_eq!(spec.dependencies.len(), 1);
    }

    #[test]
    fn empty_job_id_is_invalid() {
        let raw = "job_id: \"\"\nschedule: daily\n";
        assert!(matches!(JobSpec::from_yaml_str(raw), Err(SpecError::Invalid { .. })));
    }

    #[test]
    fn missing_schedule_is_malformed() {
        let raw = "job_id: j\n";
        assert!(matches!(JobSpec::from_yaml_str(raw), Err(SpecError::Yaml { .. })));
    }
}
