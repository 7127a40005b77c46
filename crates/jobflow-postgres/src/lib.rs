//! jobflow-postgres
//!
//! Implementación relacional de `Function`: ejecuta scripts SQL contra
//! Postgres bajo el ciclo de vida del core, con credenciales resueltas en
//! runtime desde el `SecretStore` y semántica transaccional (commit sólo en
//! DML/DDL exitoso; rollback garantizado antes de propagar cualquier error).
//!
//! Módulos:
//! - `function`: `PgSqlFunction` y la ejecución de scripts.
//! - `conn`: contrato de credenciales -> parámetros de conexión.
//! - `register`: alta explícita en el `OperatorRegistry`.

pub mod conn;
pub mod function;
pub mod register;

pub use function::{PgSqlFunction, PG_SQL_FUNCTION_NAME};
pub use register::register_defaults;
