use serde_json::{Map, Value};

use crate::errors::FunctionError;
use crate::model::ExecutionContext;

/// Unidad de trabajo polimórfica con ciclo de vida fijo.
///
/// Las implementaciones aportan sólo el comportamiento de cada hook; las
/// guardas de transición y la validación de parámetros obligatorios corren
/// en el driver compartido (`TaskNode`), de modo que ninguna implementación
/// repite esa lógica.
pub trait Function {
    /// Nombre de la implementación, tal como se registra y como aparece en
    /// los job specs. Se usa en diagnósticos.
    fn name(&self) -> &str;

    /// Contexto de run que posee esta instancia.
    fn context(&self) -> &ExecutionContext;

    /// Configuración fusionada (kwargs del constructor).
    fn config(&self) -> &Map<String, Value>;

    /// Claves de configuración obligatorias. El driver verifica presencia
    /// antes de permitir `pre_execute`.
    fn required_params(&self) -> &'static [&'static str] {
        &[]
    }

    /// Setup con efectos externos. Único hook autorizado a adquirir
    /// recursos (conexiones, archivos, sockets).
    fn pre_execute(&mut self) -> Result<(), FunctionError>;

    /// La unidad de trabajo. Devuelve un valor de resultado o falla con un
    /// error específico de la ejecución.
    fn execute(&mut self) -> Result<Option<Value>, FunctionError>;

    /// Libera todo recurso adquirido en `pre_execute`. Debe ser idempotente:
    /// una segunda llamada no falla ni libera dos veces.
    fn post_execute(&mut self) -> Result<(), FunctionError>;

    /// Hook observador tras un run exitoso. Sin autoridad de transición.
    fn on_success(&mut self) {}

    /// Hook observador tras un fallo. Al retornar, la limpieza equivalente a
    /// `post_execute` debe haber corrido (el driver la garantiza como
    /// respaldo en todo caso).
    fn on_failure(&mut self) {}

    /// Hook observador entre intentos. Debe dejar la instancia lista para un
    /// `pre_execute` fresco.
    fn on_retry(&mut self) {}
}
