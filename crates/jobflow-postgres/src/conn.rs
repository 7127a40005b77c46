//! Parámetros de conexión derivados de un bundle de credenciales.
//!
//! Contrato del secreto relacional: campos obligatorios {host, database,
//! user, password}; `port` opcional (default 5432, aceptado como número o
//! string numérico). Un campo ausente o inutilizable se reporta nombrando el
//! campo exacto para que el fallo sea accionable.

use postgres::{Client, Config, NoTls};
use serde_json::Value;

use jobflow_core::{SecretBundle, SecretError};

pub(crate) const DEFAULT_PORT: u16 = 5432;

#[derive(Debug, Clone)]
pub(crate) struct ConnParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl ConnParams {
    pub fn from_bundle(bundle: &SecretBundle) -> Result<Self, SecretError> {
        let host = bundle.require_str("host")?.to_string();
        let database = bundle.require_str("database")?.to_string();
        let user = bundle.require_str("user")?.to_string();
        let password = bundle.require_str("password")?.to_string();
        let port = match bundle.get("port") {
            None | Some(Value::Null) => DEFAULT_PORT,
            Some(v) => parse_port(bundle.name(), v)?,
        };
        Ok(Self { host, port, database, user, password })
    }

    /// Abre una conexión propia (sin pool: una conexión por run, nunca
    /// compartida entre instancias ni entre reintentos).
    pub fn connect(&self) -> Result<Client, postgres::Error> {
        let mut cfg = Config::new();
        cfg.host(&self.host)
           .port(self.port)
           .dbname(&self.database)
           .user(&self.user)
           .password(&self.password);
        cfg.connect(NoTls)
    }
}

fn parse_port(secret: &str, v: &Value) -> Result<u16, SecretError> {
    let invalid = || SecretError::InvalidField { name: secret.to_string(),
                                                 field: "port".to_string(),
                                                 detail: format!("expected a port number, got {v}") };
    match v {
        Value::Number(n) => n.as_u64().and_then(|p| u16::try_from(p).ok()).ok_or_else(invalid),
        Value::String(s) => s.parse::<u16>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}
