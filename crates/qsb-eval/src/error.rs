//! Error types for evaluation and backends.

use qsb_ir::{IrError, QubitId};
use qsb_lang::ParseError;
use thiserror::Error;

/// Errors raised by a [`Backend`](crate::Backend).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BackendError {
    /// A qubit was released while not in the |0⟩ state.
    #[error("Qubit {0} released while not in |0⟩")]
    QubitNotZero(QubitId),

    /// Allocation would exceed the backend's capacity.
    #[error("Cannot allocate more than {max} qubits")]
    TooManyQubits {
        /// Maximum number of live qubits.
        max: usize,
    },

    /// The qubit is not currently allocated.
    #[error("Qubit {0} is not allocated")]
    UnknownQubit(QubitId),

    /// The backend cannot perform the requested operation.
    #[error("Operation not supported by this backend: {0}")]
    Unsupported(String),

    /// IR error while recording instructions.
    #[error("Circuit error: {0}")]
    Ir(#[from] IrError),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors that can occur while evaluating a program.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EvalError {
    /// The source failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The backend rejected an operation.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// No entry point could be found.
    #[error("No entry point found: mark an operation with @EntryPoint() or name it Main")]
    NoEntryPoint,

    /// More than one callable is marked `@EntryPoint()`.
    #[error("Multiple entry points: {0}")]
    MultipleEntryPoints(String),

    /// The entry point declares parameters.
    #[error("Entry point '{0}' must not take parameters")]
    EntryPointHasParameters(String),

    /// A name could not be resolved.
    #[error("Unknown identifier '{0}'")]
    UnknownIdentifier(String),

    /// A value had the wrong type for an operation.
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Expected type.
        expected: String,
        /// Actual value.
        found: String,
    },

    /// A callable was invoked with the wrong number of arguments.
    #[error("'{name}' expects {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Callable name.
        name: String,
        /// Expected argument count.
        expected: usize,
        /// Actual argument count.
        got: usize,
    },

    /// Assignment to an immutable binding.
    #[error("Cannot update immutable binding '{0}'")]
    ImmutableBinding(String),

    /// Array index out of range.
    #[error("Index {index} out of range for array of length {len}")]
    IndexOutOfRange {
        /// Requested index.
        index: i64,
        /// Array length.
        len: usize,
    },

    /// Integer division or remainder by zero.
    #[error("Division by zero")]
    DivisionByZero,

    /// Range with a zero step.
    #[error("Range step must not be zero")]
    ZeroStep,

    /// A function tried to perform a quantum operation.
    #[error("Function cannot call operation '{0}'")]
    QuantumInFunction(String),

    /// A measurement result that is only known at run time drove classical logic.
    #[error("Measurement result {0} is not known during code generation and cannot be used in '{1}'")]
    DeferredResult(String, String),

    /// A functor is not available for the target.
    #[error("'{functor}' is not supported for '{target}'")]
    FunctorNotSupported {
        /// `Adjoint` or `Controlled`.
        functor: String,
        /// The callable.
        target: String,
    },

    /// A language feature the evaluator does not implement.
    #[error("Not supported: {0}")]
    NotSupported(String),

    /// The program executed `fail`.
    #[error("Program failed: {0}")]
    UserFail(String),

    /// An array literal asked for more elements than allowed.
    #[error("Array of {size} elements exceeds the limit of {max}")]
    ArrayTooLarge {
        /// Requested length.
        size: usize,
        /// Largest allowed length.
        max: usize,
    },

    /// Recursion limit reached.
    #[error("Maximum call depth of {0} exceeded")]
    CallDepthExceeded(usize),
}

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;
