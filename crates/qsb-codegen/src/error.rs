//! Error types for code generation.

use qsb_eval::BackendError;
use qsb_ir::{IrError, QubitId};
use thiserror::Error;

/// Errors that can occur while tracing or emitting a circuit.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CodegenError {
    /// A reset was traced but the generation options forbid resets.
    #[error("Reset of qubit {0} is not supported by the selected generation options")]
    ResetNotSupported(QubitId),

    /// The entry point returned a value that cannot be recorded as output.
    #[error("Cannot record output of type {0}")]
    UnsupportedOutput(String),

    /// The wrapped backend failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The circuit rejected an instruction.
    #[error(transparent)]
    Ir(#[from] IrError),
}

/// Result type for code generation.
pub type CodegenResult<T> = Result<T, CodegenError>;
