//! Registro explícito de las implementaciones de este crate.

use std::path::PathBuf;

use jobflow_core::{Function, RegistryBuilder};

use crate::function::{PgSqlFunction, PG_SQL_FUNCTION_NAME};

/// Registra `PgSqlFunction` en el builder. `sql_root` es la raíz contra la
/// que se resuelven los `sql_file_path` relativos de los specs; la factory
/// la captura para que la instanciación no dependa de entorno ambiental.
pub fn register_defaults(builder: RegistryBuilder, sql_root: impl Into<PathBuf>) -> RegistryBuilder {
    let sql_root = sql_root.into();
    builder.register(PG_SQL_FUNCTION_NAME, move |ctx, kwargs| {
               PgSqlFunction::new(ctx, kwargs, sql_root.clone()).map(|f| Box::new(f) as Box<dyn Function>)
           })
}
