use std::path::PathBuf;

use jobflow_compiler::{load_all_jobs, Severity};
use jobflow_core::{PathsConfig, RegistryBuilder, RunIdentity, SecretStore};

fn main() {
    // Cargar .env si existe para obtener JOBFLOW_DATA_DIR y compañía
    let _ = dotenvy::dotenv();
    // CLI mínima: `jobflow [--data-root <DIR>] [--jobs <DIR>] [--secrets <DIR>]`
    let args: Vec<String> = std::env::args().collect();
    let mut cfg = PathsConfig::from_env();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data-root" => {
                i += 1;
                if i < args.len() {
                    cfg = PathsConfig::with_root(PathBuf::from(&args[i]));
                }
            }
            "--jobs" => {
                i += 1;
                if i < args.len() {
                    cfg.jobs_dir = PathBuf::from(&args[i]);
                }
            }
            "--secrets" => {
                i += 1;
                if i < args.len() {
                    cfg.secrets_dir = PathBuf::from(&args[i]);
                }
            }
            other => {
                eprintln!("[jobflow] argumento desconocido: {other}");
                std::process::exit(2);
            }
        }
        i += 1;
    }

    let registry = jobflow_postgres::register_defaults(RegistryBuilder::new(), &cfg.data_root).build();
    let secrets = SecretStore::new(&cfg.secrets_dir);
    let identity = RunIdentity::manual();

    println!("[jobflow] jobs dir: {}", cfg.jobs_dir.display());
    println!("[jobflow] implementations: {:?}", registry.names());

    let result = load_all_jobs(&cfg.jobs_dir, &registry, secrets, &identity);

    for graph in result.graphs.values() {
        println!("job '{}' (schedule: {}): {} task(s), {} edge(s)",
                 graph.job_id,
                 graph.schedule,
                 graph.len(),
                 graph.edges().len());
        for task_id in graph.topological_order() {
            let upstream = graph.upstream(task_id);
            if upstream.is_empty() {
                println!("  - {task_id}");
            } else {
                println!("  - {task_id} (after {})", upstream.join(", "));
            }
        }
    }

    for d in result.diagnostics.entries() {
        let tag = match d.severity {
            Severity::Warning => "WARN",
            Severity::Error => "ERROR",
        };
        match &d.job_id {
            Some(job_id) => eprintln!("[{tag}] job '{job_id}': {}", d.message),
            None => eprintln!("[{tag}] {}", d.message),
        }
    }

    if result.graphs.is_empty() && result.diagnostics.has_errors() {
        std::process::exit(1);
    }
}
