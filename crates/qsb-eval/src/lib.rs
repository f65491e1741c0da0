//! Evaluator for qsbridge programs
//!
//! A tree-walking interpreter over the `qsb-lang` AST. Quantum effects go
//! through the [`Backend`] trait, so the same program can drive the
//! statevector simulator or the circuit tracer used for code generation.
//! Console output (`Message`, `DumpMachine`) goes to a [`Receiver`].
//!
//! # Example
//!
//! ```rust
//! use qsb_eval::Interpreter;
//!
//! let interp = Interpreter::new(r#"
//!     @EntryPoint()
//!     operation Hello() : Unit {
//!         Message("Hello");
//!     }
//! "#).unwrap();
//! assert_eq!(interp.entry_name(), Some("Hello"));
//! ```

pub mod backend;
pub mod error;
mod interpreter;
pub mod value;

pub use backend::{
    Backend, MeasurementResult, NullReceiver, QubitAllocator, Receiver, StateDump, format_state_id,
};
pub use error::{BackendError, BackendResult, EvalError, EvalResult};
pub use interpreter::{Interpreter, MAX_ARRAY_LEN, MAX_CALL_DEPTH};
pub use value::{CallableRef, CallableTarget, Value};
