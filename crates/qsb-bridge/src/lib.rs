//! qsbridge: run and translate Q# programs
//!
//! This crate is the public face of the workspace. It takes Q# source text
//! and either runs it on the local statevector simulator, one result per
//! shot, or translates it to OpenQASM 2.0, QIR or a quantikz diagram.
//!
//! # Operations
//!
//! | Function | Returns |
//! |----------|---------|
//! | [`run_qs`] | one [`ExecutionState`] |
//! | [`run_qs_shots`] | one [`ExecutionState`] per shot |
//! | [`run_qs_with_options`] | one [`ExecutionState`] per shot, with noise and seed |
//! | [`qasm2`], [`qasm2_expression`] | OpenQASM 2.0 text |
//! | [`qir`], [`qir_expression`] | base-profile QIR text |
//! | [`circuit`] | the traced [`Circuit`] |
//! | [`quantikz`] | LaTeX |
//! | [`quantikz_operation`] | LaTeX for a named operation |
//!
//! The free functions use [`BridgeConfig::default`]. Build a [`Bridge`] to
//! use a loaded configuration instead.
//!
//! # Example
//!
//! ```rust
//! use qsb_bridge::{ExecutionOptions, run_qs_with_options};
//!
//! let source = r#"
//!     namespace Demo {
//!         @EntryPoint()
//!         operation Coin() : Result {
//!             use q = Qubit();
//!             H(q);
//!             Message("flipping");
//!             MResetZ(q)
//!         }
//!     }
//! "#;
//!
//! let options = ExecutionOptions::from_shots(10).with_seed(1);
//! let shots = run_qs_with_options(source, &options).unwrap();
//! assert_eq!(shots.len(), 10);
//! for shot in &shots {
//!     assert_eq!(shot.messages, vec!["flipping"]);
//!     let result = shot.result.as_deref().unwrap_or("No result available");
//!     assert!(result == "Zero" || result == "One");
//! }
//! ```

mod bridge;
pub mod config;
pub mod error;
pub mod state;

pub use bridge::Bridge;
pub use config::{BridgeConfig, ConfigError};
pub use error::{QsError, QsResult};
pub use state::{ExecutionOptions, ExecutionState, QubitState};

pub use qsb_codegen::{QasmGenerationOptions, ResetBehavior};
pub use qsb_ir::{Circuit, Noise, PauliDistribution};

/// Run a program once.
pub fn run_qs(source: &str) -> QsResult<ExecutionState> {
    Bridge::default().run(source)
}

/// Run a program for `shots` noiseless shots.
pub fn run_qs_shots(source: &str, shots: u32) -> QsResult<Vec<ExecutionState>> {
    Bridge::default().run_shots(source, shots)
}

/// Run a program with explicit options.
pub fn run_qs_with_options(
    source: &str,
    options: &ExecutionOptions,
) -> QsResult<Vec<ExecutionState>> {
    Bridge::default().run_with_options(source, options)
}

/// Translate a program to OpenQASM 2.0.
pub fn qasm2(source: &str, options: &QasmGenerationOptions) -> QsResult<String> {
    Bridge::default().qasm2(source, options)
}

/// Translate an expression such as `{ operation Foo() : Unit { ... }; Foo() }`
/// to OpenQASM 2.0.
pub fn qasm2_expression(expression: &str, options: &QasmGenerationOptions) -> QsResult<String> {
    Bridge::default().qasm2_expression(expression, options)
}

/// Translate a program to base-profile QIR.
pub fn qir(source: &str) -> QsResult<String> {
    Bridge::default().qir(source)
}

/// Translate an expression to base-profile QIR.
pub fn qir_expression(expression: &str) -> QsResult<String> {
    Bridge::default().qir_expression(expression)
}

/// Run a program once and return the circuit it executed.
pub fn circuit(source: &str) -> QsResult<Circuit> {
    Bridge::default().circuit(source)
}

/// Render the circuit of a program as quantikz LaTeX.
pub fn quantikz(source: &str) -> QsResult<String> {
    Bridge::default().quantikz(source)
}

/// Render the circuit of the operation `name` as quantikz LaTeX. The
/// operation takes no arguments and needs no `@EntryPoint()`.
pub fn quantikz_operation(name: &str, source: &str) -> QsResult<String> {
    Bridge::default().quantikz_operation(name, source)
}
