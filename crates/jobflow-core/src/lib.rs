//! jobflow-core: contratos del núcleo de orquestación.
//!
//! Este crate define las piezas que comparten el compilador de graphs y las
//! implementaciones concretas de unidades de trabajo:
//! - `Function` + `TaskNode`: la interfaz polimórfica de unidad de trabajo y
//!   el driver que aplica la máquina de estados del ciclo de vida.
//! - `ExecutionContext` / `RunIdentity`: identidad por run y acceso a
//!   credenciales.
//! - `SecretStore` / `SecretBundle`: contrato de lookup de secretos.
//! - `OperatorRegistry`: mapa explícito nombre -> factory, construido una vez
//!   por proceso.
//! - `PathsConfig`: rutas del proceso cargadas desde entorno.
//!
//! El crate no ejecuta nada por sí mismo: el scheduler externo conduce los
//! `TaskNode` que produce el compilador.

pub mod config;
pub mod errors;
pub mod function;
pub mod model;
pub mod registry;
pub mod secret;

pub use config::{init_dotenv, PathsConfig};
pub use errors::{FunctionError, SecretError, UnknownImplementation};
pub use function::{Function, FunctionState, TaskNode};
pub use model::{ExecutionContext, RunIdentity};
pub use registry::{FunctionFactory, OperatorRegistry, RegistryBuilder};
pub use secret::{SecretBundle, SecretStore};
