//! Discovery de job specs: escanea un directorio y compila cada spec.
//!
//! Punto de entrada del límite de proceso con el scheduler: dado un
//! directorio de specs y un registry, devuelve job_id -> graph compilado.
//! Los fallos son siempre no-fatales por fuente: un archivo ilegible o un
//! job que no compila se registra como diagnóstico y la pasada continúa con
//! el resto.

use std::path::Path;

use indexmap::IndexMap;
use log::{debug, warn};

use jobflow_core::{OperatorRegistry, RunIdentity, SecretStore};

use crate::compile::TaskGraphCompiler;
use crate::diagnostics::Diagnostics;
use crate::graph::TaskGraph;
use crate::spec::JobSpec;

/// Resultado de una pasada de discovery.
pub struct DiscoveryResult {
    /// Graphs compilados, indexados por job_id, en orden de carga.
    pub graphs: IndexMap<String, TaskGraph>,
    pub diagnostics: Diagnostics,
}

/// Escanea `jobs_dir` en busca de `*.yaml`/`*.yml` (orden lexicográfico de
/// nombre de archivo, para que "el último cargado gana" sea determinista),
/// compila cada spec y agrega los graphs resultantes.
///
/// Un job_id duplicado entre archivos no es error: el graph cargado después
/// reemplaza al anterior y queda un diagnóstico de la colisión.
pub fn load_all_jobs(jobs_dir: &Path,
                     registry: &OperatorRegistry,
                     secrets: SecretStore,
                     identity: &RunIdentity)
                     -> DiscoveryResult {
    let mut graphs: IndexMap<String, TaskGraph> = IndexMap::new();
    let mut diagnostics = Diagnostics::default();

    let entries = match std::fs::read_dir(jobs_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("jobs dir {} not readable: {e}", jobs_dir.display());
            diagnostics.error(None, format!("jobs dir {} not readable: {e}", jobs_dir.display()));
            return DiscoveryResult { graphs, diagnostics };
        }
    };

    let mut paths: Vec<_> = entries.filter_map(|e| e.ok())
                                   .map(|e| e.path())
                                   .filter(|p| {
                                       matches!(p.extension().and_then(|x| x.to_str()), Some("yaml") | Some("yml"))
                                   })
                                   .collect();
    paths.sort();

    let compiler = TaskGraphCompiler::new(registry, secrets);
    for path in paths {
        debug!("processing job spec {}", path.display());
        let spec = match JobSpec::from_yaml_file(&path) {
            Ok(spec) => spec,
            Err(e) => {
                warn!("skipping {}: {e}", path.display());
                diagnostics.error(None, format!("skipping {}: {e}", path.display()));
                continue;
            }
        };
        let job_id = spec.job_id.clone();
        match compiler.compile(&spec, identity, &mut diagnostics) {
            Ok(graph) => {
                if graphs.contains_key(&job_id) {
                    let msg = format!("duplicate job_id '{job_id}': replaced by {}", path.display());
                    warn!("{msg}");
                    diagnostics.warn(Some(job_id.as_str()), msg);
                }
                graphs.insert(job_id, graph);
            }
            Err(e) => {
                warn!("job '{job_id}' failed to compile: {e}");
                diagnostics.error(Some(job_id.as_str()), e.to_string());
            }
        }
    }

    DiscoveryResult { graphs, diagnostics }
}
