//! Quantikz command implementation.

use std::path::Path;

use anyhow::Result;

use qsb_bridge::Bridge;

use super::common::{load_source, write_output};

/// Execute the quantikz command, for the entry point or for the named
/// operation.
pub fn execute(
    bridge: &Bridge,
    input: &Path,
    operation: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let source = load_source(input)?;
    let latex = match operation {
        Some(name) => bridge.quantikz_operation(name, &source)?,
        None => bridge.quantikz(&source)?,
    };
    write_output(&latex, output)
}
