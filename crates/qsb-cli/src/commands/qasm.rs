//! Qasm command implementation.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use qsb_bridge::Bridge;
use qsb_codegen::ResetBehavior;

use super::common::{load_source, write_output};

/// Execute the qasm command.
///
/// Flags override the configured generation options.
pub fn execute(
    bridge: &Bridge,
    input: &Path,
    output: Option<&Path>,
    no_qelib: bool,
    reset_behavior: Option<ResetBehavior>,
) -> Result<()> {
    let source = load_source(input)?;

    let mut options = bridge.config().qasm;
    if no_qelib {
        options.include_qelib = false;
    }
    if let Some(behavior) = reset_behavior {
        options.reset_behavior = behavior;
    }

    info!(input = %input.display(), ?options, "Generating OpenQASM 2.0");
    let qasm = bridge.qasm2(&source, &options)?;
    write_output(&qasm, output)
}
