//! Query endpoints.
//!
//! Each endpoint takes one query parameter, checks its length in characters,
//! and runs `/<name> <value>` through the engine.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::Json;
use query_core::QueryResult;
use tracing::info;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Accepted lengths for a parameter, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthRule {
    Exact(usize),
    AtLeast(usize),
    /// Inclusive on both ends.
    Between(usize, usize),
}

impl LengthRule {
    pub fn accepts(&self, len: usize) -> bool {
        match *self {
            LengthRule::Exact(n) => len == n,
            LengthRule::AtLeast(n) => len >= n,
            LengthRule::Between(min, max) => (min..=max).contains(&len),
        }
    }
}

/// One query endpoint: path, parameter and validation.
#[derive(Debug)]
pub struct QueryEndpoint {
    /// Path segment and command name.
    pub name: &'static str,
    pub param: &'static str,
    pub rule: LengthRule,
    /// Text returned when validation fails.
    pub error: &'static str,
}

const fn endpoint(
    name: &'static str,
    param: &'static str,
    rule: LengthRule,
    error: &'static str,
) -> QueryEndpoint {
    QueryEndpoint {
        name,
        param,
        rule,
        error,
    }
}

pub static ENDPOINTS: &[QueryEndpoint] = &[
    endpoint("cla", "dni", LengthRule::Exact(8), "DNI inválido"),
    endpoint("afp", "dni", LengthRule::Exact(8), "DNI inválido"),
    endpoint("bdir", "direccion", LengthRule::AtLeast(9), "Dirección muy corta"),
    endpoint("pasaporte", "pasaporte", LengthRule::AtLeast(5), "Pasaporte inválido"),
    endpoint("cedula", "cedula", LengthRule::AtLeast(7), "Cédula inválida"),
    endpoint("dend", "dni", LengthRule::Exact(8), "DNI inválido"),
    endpoint("dence", "ce", LengthRule::Between(6, 12), "CE inválido"),
    endpoint("denpas", "pasaporte", LengthRule::Between(6, 12), "Pasaporte inválido"),
    endpoint("denci", "ci", LengthRule::Between(6, 12), "CI inválida"),
    endpoint("denp", "placa", LengthRule::Between(5, 7), "Placa inválida"),
    endpoint("denar", "serie", LengthRule::Between(5, 13), "Serie inválida"),
    endpoint("dencl", "clave", LengthRule::Between(5, 11), "Clave inválida"),
    endpoint("cafp", "dni", LengthRule::Exact(8), "DNI inválido"),
    endpoint("sbs", "dni", LengthRule::Exact(8), "DNI inválido"),
];

impl QueryEndpoint {
    pub fn path(&self) -> String {
        format!("/{}", self.name)
    }

    /// Validate the parameter and build the command line.
    ///
    /// A missing parameter is treated as empty.
    pub fn command(&self, params: &HashMap<String, String>) -> Result<String> {
        let value = params.get(self.param).map(String::as_str).unwrap_or_default();
        if !self.rule.accepts(value.chars().count()) {
            return Err(ApiError::InvalidParam(self.error));
        }
        Ok(format!("/{} {}", self.name, value))
    }
}

/// Validate, run and return the query result.
pub async fn run(
    endpoint: &'static QueryEndpoint,
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<QueryResult>> {
    let command = endpoint.command(&params)?;
    info!(endpoint = endpoint.name, "Running query");
    Ok(Json(state.runner.run_query(&command).await))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(name: &str) -> &'static QueryEndpoint {
        ENDPOINTS.iter().find(|e| e.name == name).unwrap()
    }

    fn params(key: &str, value: &str) -> HashMap<String, String> {
        HashMap::from([(key.to_string(), value.to_string())])
    }

    #[test]
    fn test_length_rules() {
        assert!(LengthRule::Exact(8).accepts(8));
        assert!(!LengthRule::Exact(8).accepts(7));
        assert!(LengthRule::AtLeast(9).accepts(40));
        assert!(!LengthRule::AtLeast(9).accepts(8));
        assert!(LengthRule::Between(5, 7).accepts(5));
        assert!(LengthRule::Between(5, 7).accepts(7));
        assert!(!LengthRule::Between(5, 7).accepts(8));
    }

    #[test]
    fn test_command_line() {
        let command = find("cla").command(&params("dni", "12345678")).unwrap();
        assert_eq!(command, "/cla 12345678");

        let command = find("bdir")
            .command(&params("direccion", "Av. Lima 123"))
            .unwrap();
        assert_eq!(command, "/bdir Av. Lima 123");
    }

    #[test]
    fn test_length_counts_characters() {
        // Six characters, eight bytes.
        assert!(find("denci").command(&params("ci", "ÑÑabcd")).is_ok());
    }

    #[test]
    fn test_invalid_params() {
        let err = find("afp").command(&HashMap::new()).unwrap_err();
        assert_eq!(err.to_string(), "DNI inválido");

        let err = find("cla").command(&params("dni", "1234567")).unwrap_err();
        assert_eq!(err.to_string(), "DNI inválido");

        let err = find("denp").command(&params("placa", "ABC12345")).unwrap_err();
        assert_eq!(err.to_string(), "Placa inválida");
    }

    #[test]
    fn test_endpoint_table_is_unique() {
        let mut names: Vec<&str> = ENDPOINTS.iter().map(|e| e.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ENDPOINTS.len());
        assert_eq!(ENDPOINTS.len(), 14);
    }
}
