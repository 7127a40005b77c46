//! Registry de implementaciones: nombre -> factory de Functions.
//!
//! Reemplaza el descubrimiento dinámico por reflexión con un patrón de
//! registro explícito: las implementaciones se registran al arranque del
//! proceso vía `RegistryBuilder` y el resultado es un valor inmutable que se
//! pasa por referencia al compilador. No hay estado global: el set de
//! implementaciones disponible es enumerable y testeable en aislamiento.

use std::collections::HashMap;

use log::warn;
use serde_json::{Map, Value};

use crate::errors::{FunctionError, UnknownImplementation};
use crate::function::Function;
use crate::model::ExecutionContext;

/// Factory que produce una instancia ligada a un contexto y sus kwargs. La
/// validación de parámetros obligatorios a nivel constructor corre aquí
/// dentro (en tiempo de compilación del graph).
pub type FunctionFactory =
    Box<dyn Fn(ExecutionContext, Map<String, Value>) -> Result<Box<dyn Function>, FunctionError> + Send + Sync>;

/// Acumula registros y se consume en un `OperatorRegistry` inmutable.
#[derive(Default)]
pub struct RegistryBuilder {
    map: HashMap<String, FunctionFactory>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra `factory` bajo `name`. Una colisión de nombres no es fatal:
    /// gana el último registro y se emite un warning.
    pub fn register<F>(mut self, name: impl Into<String>, factory: F) -> Self
        where F: Fn(ExecutionContext, Map<String, Value>) -> Result<Box<dyn Function>, FunctionError>
                  + Send
                  + Sync
                  + 'static
    {
        let name = name.into();
        if self.map.insert(name.clone(), Box::new(factory)).is_some() {
            warn!("implementation '{name}' registered twice; last registration wins");
        }
        self
    }

    pub fn build(self) -> OperatorRegistry {
        OperatorRegistry { map: self.map }
    }
}

/// Mapa de implementaciones, de sólo lectura tras la construcción. Se
/// construye una vez por proceso; la construcción no tiene efectos en disco.
pub struct OperatorRegistry {
    map: HashMap<String, FunctionFactory>,
}

impl OperatorRegistry {
    /// Devuelve la factory para `name` o falla listando los nombres
    /// actualmente conocidos.
    pub fn resolve(&self, name: &str) -> Result<&FunctionFactory, UnknownImplementation> {
        self.map
            .get(name)
            .ok_or_else(|| UnknownImplementation { name: name.to_string(), known: self.names() })
    }

    /// Nombres registrados, ordenados.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.map.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
