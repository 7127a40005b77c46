//! Definiciones relacionadas a Functions.
//!
//! Una Function es la unidad de trabajo polimórfica del sistema: cada
//! implementación concreta pasa por la misma máquina de estados fija. Este
//! módulo define:
//! - `Function`: interfaz con el set fijo de hooks.
//! - `FunctionState`: estados y transiciones válidas.
//! - `TaskNode`: driver compartido que aplica las guardas.

pub mod definition;
pub mod driver;
mod status;

pub use definition::Function;
pub use driver::TaskNode;
pub use status::FunctionState;
