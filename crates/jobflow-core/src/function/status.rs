/// Estado de una Function durante un run.
///
/// Las transiciones válidas son:
/// - `Created` -> `Validated` -> `PreExecuted` (vía `pre_execute`)
/// - `PreExecuted` -> `Executed` (vía `execute`)
/// - `Executed` -> `PostExecuted` (vía `post_execute`)
/// - `PostExecuted` -> `Succeeded` (vía `succeed`)
/// - cualquier hook fallido -> `Failed`
/// - `Failed` -> `Retrying` (vía `retry`), que vuelve a habilitar un
///   `pre_execute` fresco
///
/// No se permiten reversiones ni saltos arbitrarios; las guardas viven en el
/// driver (`TaskNode`), no en las implementaciones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionState {
    /// La instancia existe; sin efectos externos todavía.
    Created,
    /// Parámetros obligatorios verificados.
    Validated,
    /// Setup completado; recursos externos adquiridos.
    PreExecuted,
    /// La unidad de trabajo terminó correctamente.
    Executed,
    /// Recursos liberados tras una ejecución exitosa.
    PostExecuted,
    /// Run completo; `on_success` disparado.
    Succeeded,
    /// Algún hook falló. La limpieza local ya corrió.
    Failed,
    /// Entre intentos: recursos del intento anterior liberados, a la espera
    /// de un nuevo `pre_execute`.
    Retrying,
}
