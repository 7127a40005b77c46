//! Driver compartido del ciclo de vida.
//!
//! `TaskNode` envuelve una `Box<dyn Function>` y es el único dueño del
//! `FunctionState`: cada operación verifica la transición antes de delegar
//! en el hook de la implementación. El scheduler externo sólo interactúa con
//! nodos; nunca invoca hooks de la implementación directamente.
//!
//! Invariantes que el driver garantiza:
//! - `execute` sin `pre_execute` completo es error de programación
//!   (`InvalidLifecycleState`), no un fallo de la implementación.
//! - Tras cualquier hook fallido, `on_failure` + limpieza corren antes de
//!   que el error llegue al caller; el core nunca se traga un error de
//!   ejecución, sólo evita que fugue recursos.
//! - `post_execute` es seguro de llamar repetidas veces.

use log::warn;
use serde_json::Value;

use super::definition::Function;
use super::status::FunctionState;
use crate::errors::FunctionError;

/// Nodo de tarea compilado: una Function ligada a su contexto más el estado
/// del ciclo de vida. Las operaciones toman `&mut self`; una instancia no se
/// puede conducir concurrentemente.
pub struct TaskNode {
    function: Box<dyn Function>,
    state: FunctionState,
}

impl TaskNode {
    pub fn new(function: Box<dyn Function>) -> Self {
        Self { function, state: FunctionState::Created }
    }

    pub fn state(&self) -> FunctionState {
        self.state
    }

    /// task_id del contexto ligado.
    pub fn task_id(&self) -> &str {
        &self.function.context().task_id
    }

    /// Nombre de la implementación registrada.
    pub fn function_name(&self) -> &str {
        self.function.name()
    }

    fn invalid(&self, op: &'static str, expected: &str) -> FunctionError {
        FunctionError::InvalidLifecycleState { op,
                                               detail: format!("requires {expected}, current state is {:?}",
                                                               self.state) }
    }

    /// `Created`/`Retrying` -> `Validated` -> `PreExecuted`.
    ///
    /// Valida primero que toda clave declarada en `required_params` esté en
    /// la configuración; recién después corre el hook de setup (el único con
    /// permiso para adquirir recursos externos).
    pub fn pre_execute(&mut self) -> Result<(), FunctionError> {
        match self.state {
            FunctionState::Created | FunctionState::Retrying => {}
            _ => return Err(self.invalid("pre_execute", "Created or Retrying")),
        }
        for param in self.function.required_params() {
            if !self.function.config().contains_key(*param) {
                self.state = FunctionState::Failed;
                return Err(FunctionError::MissingRequiredParameter { function: self.function.name().to_string(),
                                                                     param: (*param).to_string() });
            }
        }
        self.state = FunctionState::Validated;
        match self.function.pre_execute() {
            Ok(()) => {
                self.state = FunctionState::PreExecuted;
                Ok(())
            }
            Err(e) => {
                self.fail();
                Err(e)
            }
        }
    }

    /// `PreExecuted` -> `Executed`. Devuelve el valor de resultado de la
    /// unidad de trabajo (filas, conteos, o nada).
    pub fn execute(&mut self) -> Result<Option<Value>, FunctionError> {
        if self.state != FunctionState::PreExecuted {
            return Err(self.invalid("execute", "PreExecuted"));
        }
        match self.function.execute() {
            Ok(out) => {
                self.state = FunctionState::Executed;
                Ok(out)
            }
            Err(e) => {
                self.fail();
                Err(e)
            }
        }
    }

    /// `Executed` -> `PostExecuted`; desde `PreExecuted` (run interrumpido) o
    /// `Failed` corre como limpieza sin cambiar a éxito. Idempotente: en
    /// estados sin recursos vivos es un no-op que nunca falla.
    pub fn post_execute(&mut self) -> Result<(), FunctionError> {
        match self.state {
            FunctionState::PreExecuted | FunctionState::Executed => {
                self.function.post_execute()?;
                self.state = FunctionState::PostExecuted;
                Ok(())
            }
            // limpieza tras fallo: el estado sigue siendo Failed para que el
            // scheduler pueda decidir retry
            FunctionState::Failed => self.function.post_execute(),
            _ => Ok(()),
        }
    }

    /// `PostExecuted` -> `Succeeded`; dispara `on_success`.
    pub fn succeed(&mut self) -> Result<(), FunctionError> {
        if self.state != FunctionState::PostExecuted {
            return Err(self.invalid("succeed", "PostExecuted"));
        }
        self.function.on_success();
        self.state = FunctionState::Succeeded;
        Ok(())
    }

    /// `Failed` -> `Retrying`; dispara `on_retry` y deja el nodo listo para
    /// un `pre_execute` fresco (el intento retirado ya liberó sus recursos).
    pub fn retry(&mut self) -> Result<(), FunctionError> {
        if self.state != FunctionState::Failed {
            return Err(self.invalid("retry", "Failed"));
        }
        self.function.on_retry();
        self.state = FunctionState::Retrying;
        Ok(())
    }

    /// Un intento completo: setup, trabajo, limpieza, éxito. Conveniencia
    /// para schedulers que no necesitan conducir hook por hook.
    pub fn run(&mut self) -> Result<Option<Value>, FunctionError> {
        self.pre_execute()?;
        let out = self.execute()?;
        self.post_execute()?;
        self.succeed()?;
        Ok(out)
    }

    // Marca Failed y garantiza on_failure + limpieza antes de devolver el
    // control. Un error de limpieza se registra, no escala: el error que
    // debe ver el caller es el del hook que falló.
    fn fail(&mut self) {
        self.state = FunctionState::Failed;
        self.function.on_failure();
        if let Err(e) = self.function.post_execute() {
            warn!("cleanup after failure of task '{}' also failed: {e}", self.task_id());
        }
    }
}
