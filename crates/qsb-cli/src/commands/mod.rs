//! CLI command implementations.

pub mod circuit;
pub mod common;
pub mod qasm;
pub mod qir;
pub mod quantikz;
pub mod run;
pub mod version;
