//! Error types for the bridge facade.

use qsb_codegen::CodegenError;
use qsb_eval::EvalError;
use qsb_ir::IrError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned by every bridge operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QsError {
    /// Parsing or evaluating the program failed.
    #[error(transparent)]
    Eval(#[from] EvalError),

    /// Translating the traced circuit failed.
    #[error(transparent)]
    Codegen(#[from] CodegenError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The requested noise cannot be turned into a Pauli distribution.
    #[error("Invalid noise: {0}")]
    InvalidNoise(#[source] IrError),

    /// The evaluation thread could not be started.
    #[error("Failed to start evaluation thread: {0}")]
    Thread(#[source] std::io::Error),
}

/// Result type for bridge operations.
pub type QsResult<T> = Result<T, QsError>;
