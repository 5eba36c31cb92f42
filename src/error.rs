//! Error types for the FEA solver

use thiserror::Error;

/// Errors arising while evaluating element kernels or the linear-algebra backend.
#[derive(Error, Debug)]
pub enum NumericalError {
    #[error("singular Jacobian in element {element} (degenerate or inverted geometry)")]
    SingularJacobian { element: usize },

    #[error("singular matrix encountered during solve")]
    SingularMatrix,

    #[error("solver failure: {0}")]
    SolverFailure(String),
}

/// Main error type for FEA operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("numerical error: {0}")]
    Numerical(#[from] NumericalError),

    #[error("model database checks found {} error(s) and {} warning(s)", errors.len(), warnings.len())]
    Validation {
        errors: Vec<String>,
        warnings: Vec<String>,
    },

    #[error("output database contains no frames")]
    MissingFrame,

    #[error("malformed output database: {0}")]
    MalformedOdb(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Result type for FEA operations.
pub type Result<T> = std::result::Result<T, Error>;
