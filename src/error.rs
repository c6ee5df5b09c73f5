//! Error types for the rule engine

use pyo3::exceptions::PyValueError;
use pyo3::PyErr;
use thiserror::Error;

/// Main error type for the rule engine
#[derive(Error, Debug)]
pub enum RuleError {
    #[error("Invalid operand: {0}")]
    InvalidOperand(String),

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl From<RuleError> for PyErr {
    fn from(err: RuleError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

/// Result type alias for the rule engine
pub type Result<T> = std::result::Result<T, RuleError>;
