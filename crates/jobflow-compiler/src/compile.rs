//! Compilador spec -> graph.
//!
//! Transformación pura: consume un `JobSpec` y un registry y produce un
//! `TaskGraph` de Functions instanciadas, cada una ligada a su
//! `ExecutionContext`. Política de fallos:
//! - implementación no resuelta o parámetro obligatorio ausente: fail-fast,
//!   el job entero aborta y no se registra graph parcial;
//! - edge con endpoint inexistente: se descarta con diagnóstico y la
//!   compilación continúa;
//! - ciclo declarado: error de compilación (el scheduler externo no puede
//!   ordenar un graph inconsistente).

use indexmap::IndexMap;
use log::warn;

use jobflow_core::{ExecutionContext, FunctionError, OperatorRegistry, RunIdentity, SecretStore, TaskNode};

use crate::diagnostics::Diagnostics;
use crate::errors::CompileError;
use crate::graph::{detect_cycle, TaskGraph};
use crate::spec::JobSpec;

/// Compila specs contra un registry fijo. El `SecretStore` se clona dentro
/// de cada contexto; la resolución de credenciales ocurre recién en
/// `pre_execute`, nunca aquí.
pub struct TaskGraphCompiler<'r> {
    registry: &'r OperatorRegistry,
    secrets: SecretStore,
}

impl<'r> TaskGraphCompiler<'r> {
    pub fn new(registry: &'r OperatorRegistry, secrets: SecretStore) -> Self {
        Self { registry, secrets }
    }

    pub fn compile(&self,
                   spec: &JobSpec,
                   identity: &RunIdentity,
                   diagnostics: &mut Diagnostics)
                   -> Result<TaskGraph, CompileError> {
        let job_id = &spec.job_id;
        let mut nodes: IndexMap<String, TaskNode> = IndexMap::with_capacity(spec.tasks.len());

        for (task_key, task) in &spec.tasks {
            let factory = self.registry
                              .resolve(&task.function)
                              .map_err(|source| CompileError::ImplementationNotFound { job_id: job_id.clone(),
                                                                                       task_id: task_key.clone(),
                                                                                       source })?;
            let ctx = ExecutionContext::new(identity,
                                            job_id.clone(),
                                            task.task_id.clone(),
                                            task.kwargs.clone(),
                                            task.secret_key.clone(),
                                            self.secrets.clone());
            let function = factory(ctx, task.kwargs.clone()).map_err(|e| match e {
                                 FunctionError::MissingRequiredParameter { param, .. } => {
                                     CompileError::MissingRequiredParameter { job_id: job_id.clone(),
                                                                              task_id: task_key.clone(),
                                                                              param }
                                 }
                                 other => CompileError::Instantiation { job_id: job_id.clone(),
                                                                        task_id: task_key.clone(),
                                                                        source: other },
                             })?;
            nodes.insert(task_key.clone(), TaskNode::new(function));
        }

        let mut edges: Vec<(String, String)> = Vec::with_capacity(spec.dependencies.len());
        for dep in &spec.dependencies {
            if nodes.contains_key(&dep.source) && nodes.contains_key(&dep.target) {
                edges.push((dep.source.clone(), dep.target.clone()));
            } else {
                let msg = format!("dropped invalid dependency {} -> {}: endpoint not among compiled tasks",
                                  dep.source, dep.target);
                warn!("job '{job_id}': {msg}");
                diagnostics.warn(Some(job_id.as_str()), msg);
            }
        }

        if let Some(cycle) = detect_cycle(&nodes, &edges) {
            return Err(CompileError::CyclicDependency { job_id: job_id.clone(), cycle });
        }

        Ok(TaskGraph::new(job_id.clone(),
                          spec.description.clone(),
                          spec.schedule.clone(),
                          spec.catchup,
                          spec.tags.clone(),
                          nodes,
                          edges))
    }
}
