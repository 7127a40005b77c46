//! Carga de configuración de rutas desde variables de entorno.
//! Usa convención `JOBFLOW_DATA_DIR` con subdirectorios opcionales.

use std::env;
use std::path::PathBuf;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Rutas que el proceso necesita: raíz de datos (contra la que se resuelven
/// los scripts SQL relativos), directorio de job specs y directorio de
/// secretos. Son un valor explícito construido una vez y pasado por
/// referencia; nada lo lee de forma ambiental después.
#[derive(Debug, Clone)]
pub struct PathsConfig {
    pub data_root: PathBuf,
    pub jobs_dir: PathBuf,
    pub secrets_dir: PathBuf,
}

impl PathsConfig {
    /// Lee `JOBFLOW_DATA_DIR` (default `.`), `JOBFLOW_JOBS_DIR` (default
    /// `<root>/jobs`) y `JOBFLOW_SECRETS_DIR` (default `<root>/secret`).
    pub fn from_env() -> Self {
        Lazy::force(&DOTENV_LOADED);
        let data_root = env::var("JOBFLOW_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."));
        let jobs_dir = env::var("JOBFLOW_JOBS_DIR").map(PathBuf::from).unwrap_or_else(|_| data_root.join("jobs"));
        let secrets_dir =
            env::var("JOBFLOW_SECRETS_DIR").map(PathBuf::from).unwrap_or_else(|_| data_root.join("secret"));
        Self { data_root, jobs_dir, secrets_dir }
    }

    /// Configuración con los defaults de layout bajo una raíz dada. Útil en
    /// tests y en callers que no usan entorno.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let data_root = root.into();
        let jobs_dir = data_root.join("jobs");
        let secrets_dir = data_root.join("secret");
        Self { data_root, jobs_dir, secrets_dir }
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
