//! Store de secretos en disco: resolución por nombre lógico.
//!
//! El contrato es únicamente de lookup: un nombre lógico (con o sin sufijo
//! `.json`) se resuelve contra un directorio fijo a un documento JSON plano.
//! El mecanismo de almacenamiento (rotación, cifrado, montaje) queda fuera;
//! este módulo no escribe nunca en disco.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::errors::SecretError;

/// Handle hacia el directorio de secretos. Es un valor explícito que se
/// inyecta en cada `ExecutionContext`; no hay derivación ambiental de rutas.
#[derive(Debug, Clone)]
pub struct SecretStore {
    dir: PathBuf,
}

impl SecretStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resuelve `name` a un `SecretBundle`. Acepta `creds` y `creds.json`
    /// indistintamente; el archivo buscado es siempre `<dir>/<base>.json`.
    pub fn resolve(&self, name: &str) -> Result<SecretBundle, SecretError> {
        let base = name.strip_suffix(".json").unwrap_or(name);
        let path = self.dir.join(format!("{base}.json"));
        if !path.exists() {
            return Err(SecretError::NotFound { name: name.to_string(), path });
        }
        let raw = fs::read_to_string(&path).map_err(|source| SecretError::Read { path: path.clone(), source })?;
        let values: Map<String, Value> =
            serde_json::from_str(&raw).map_err(|source| SecretError::Parse { path: path.clone(), source })?;
        Ok(SecretBundle { name: base.to_string(), values })
    }
}

/// Bundle de credenciales resuelto. Vive lo que dura una llamada de
/// resolución: no se cachea ni se persiste.
#[derive(Debug, Clone)]
pub struct SecretBundle {
    name: String,
    values: Map<String, Value>,
}

impl SecretBundle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Campo obligatorio de tipo string. Un campo ausente o de otro tipo se
    /// reporta como `MissingField` nombrando el campo exacto.
    pub fn require_str(&self, field: &str) -> Result<&str, SecretError> {
        self.values
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| SecretError::MissingField { name: self.name.clone(), field: field.to_string() })
    }
}
