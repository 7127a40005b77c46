//! jobflow-compiler: de job specs declarativos a task graphs ejecutables.
//!
//! Módulos:
//! - `spec`: modelo de datos del YAML (orden de declaración preservado).
//! - `compile`: el compilador spec -> graph (transformación pura).
//! - `graph`: `TaskGraph` con consultas de orden para el scheduler.
//! - `discover`: pasada por directorio con fallos no-fatales por fuente.
//! - `diagnostics`: problemas recuperables, separados de los errores duros.

pub mod compile;
pub mod diagnostics;
pub mod discover;
pub mod errors;
pub mod graph;
pub mod spec;

pub use compile::TaskGraphCompiler;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use discover::{load_all_jobs, DiscoveryResult};
pub use errors::{CompileError, SpecError};
pub use graph::TaskGraph;
pub use spec::{DependencyEdge, JobSpec, TaskSpec};
