//! qsbridge code generation
//!
//! Programs are not compiled statically. Instead the evaluator runs them
//! against a [`CircuitTracer`], which records every gate, measurement and
//! reset into a [`qsb_ir::Circuit`]. The emitters then turn that circuit
//! into text:
//!
//! - [`emit_qasm2`]: OpenQASM 2.0, shaped by [`QasmGenerationOptions`]
//! - [`emit_qir`]: base-profile QIR with output recording
//! - [`render_quantikz`]: a LaTeX circuit diagram
//!
//! # Example
//!
//! ```rust
//! use qsb_codegen::{CircuitTracer, QasmGenerationOptions, emit_qasm2};
//! use qsb_eval::{Interpreter, NullReceiver};
//!
//! let interp = Interpreter::new(r#"
//!     operation Main() : (Result, Result) {
//!         use (a, b) = (Qubit(), Qubit());
//!         H(a);
//!         CNOT(a, b);
//!         (M(a), M(b))
//!     }
//! "#).unwrap();
//!
//! let mut tracer = CircuitTracer::new("main");
//! interp.eval_entry(&mut tracer, &mut NullReceiver).unwrap();
//!
//! let qasm = emit_qasm2(tracer.circuit(), &QasmGenerationOptions::default()).unwrap();
//! assert!(qasm.contains("cx q[0], q[1];"));
//! ```

pub mod error;
pub mod qasm;
pub mod qir;
pub mod quantikz;
pub mod tracer;

pub use error::{CodegenError, CodegenResult};
pub use qasm::{QasmGenerationOptions, ResetBehavior, emit_qasm2};
pub use qir::{OutputShape, emit_qir};
pub use quantikz::render_quantikz;
pub use tracer::CircuitTracer;
