//! Circuit command implementation.

use std::path::Path;

use anyhow::Result;
use console::style;

use qsb_bridge::Bridge;
use qsb_ir::Instruction;

use super::common::{OutputFormat, load_source};

/// Execute the circuit command.
pub fn execute(bridge: &Bridge, input: &Path, format: OutputFormat) -> Result<()> {
    let source = load_source(input)?;
    let circuit = bridge.circuit(&source)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&circuit)?),
        OutputFormat::Text => {
            println!(
                "{} {}: {} qubits, {} instructions, depth {}",
                style("→").cyan().bold(),
                style(circuit.name()).green(),
                circuit.num_qubits(),
                circuit.len(),
                circuit.depth()
            );
            for inst in circuit.instructions() {
                println!("  {}", describe(inst));
            }
            let counts = circuit.count_ops();
            if !counts.is_empty() {
                println!();
                println!("Operation counts:");
                for (name, count) in counts {
                    println!("  {}: {}", style(name).cyan(), count);
                }
            }
        }
    }
    Ok(())
}

fn describe(inst: &Instruction) -> String {
    let qubits: Vec<String> = inst.qubits.iter().map(ToString::to_string).collect();
    let mut line = format!("{} {}", inst.name(), qubits.join(", "));
    if let Some(clbit) = inst.clbits.first() {
        line.push_str(&format!(" -> {clbit}"));
    }
    line
}
