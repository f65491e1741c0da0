//! Q# front end for qsbridge
//!
//! This crate turns Q# source text into an AST. It covers the subset of the
//! language that the evaluator understands: namespaces, operations and
//! functions, qubit allocation, classical control flow, functors and the
//! usual operators.
//!
//! # Example
//!
//! ```rust
//! use qsb_lang::parse;
//!
//! let source = r#"
//!     namespace Demo {
//!         @EntryPoint()
//!         operation Main() : Result {
//!             use q = Qubit();
//!             H(q);
//!             MResetZ(q)
//!         }
//!     }
//! "#;
//!
//! let program = parse(source).unwrap();
//! assert_eq!(program.callables[0].name, "Main");
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
mod parser;

pub use ast::Program;
pub use error::{ParseError, ParseResult};
pub use parser::{MAX_NESTING, parse, parse_expression};
