//! Qir command implementation.

use std::path::Path;

use anyhow::Result;
use tracing::info;

use qsb_bridge::Bridge;

use super::common::{load_source, write_output};

/// Execute the qir command.
pub fn execute(bridge: &Bridge, input: &Path, output: Option<&Path>) -> Result<()> {
    let source = load_source(input)?;
    info!(input = %input.display(), "Generating QIR");
    let qir = bridge.qir(&source)?;
    write_output(&qir, output)
}
