//! Run command implementation.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use console::style;
use serde::Serialize;
use tracing::info;

use qsb_bridge::{Bridge, ExecutionOptions, ExecutionState, Noise};

use super::common::{OutputFormat, load_source};

/// JSON form of a run.
#[derive(Serialize)]
struct RunReport<'a> {
    shots: u32,
    noise: String,
    seed: Option<u64>,
    results: &'a [ExecutionState],
}

/// Execute the run command.
pub fn execute(
    bridge: &Bridge,
    input: &Path,
    shots: u32,
    noise: Noise,
    seed: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    let source = load_source(input)?;
    let mut options = ExecutionOptions::new(shots, noise);
    options.seed = seed;

    info!(input = %input.display(), shots, %noise, "Running program");
    let results = bridge.run_with_options(&source, &options)?;

    match format {
        OutputFormat::Json => {
            let report = RunReport {
                shots,
                noise: noise.to_string(),
                seed,
                results: &results,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!(
                "{} Running {} ({} shots, {} noise)",
                style("→").cyan().bold(),
                style(input.display()).green(),
                shots,
                style(noise).yellow()
            );
            let mut out = io::stdout().lock();
            for (i, state) in results.iter().enumerate() {
                writeln!(out)?;
                writeln!(out, "Shot {} of {}", i + 1, shots)?;
                write_outcome(&mut out, state)?;
            }
        }
    }
    Ok(())
}

fn write_outcome(out: &mut impl Write, state: &ExecutionState) -> io::Result<()> {
    writeln!(out, "Messages:")?;
    for msg in &state.messages {
        writeln!(out, "  {msg}")?;
    }

    if !state.states.is_empty() {
        writeln!(out, "State ({} qubits):", state.qubit_count)?;
        for qubit_state in &state.states {
            writeln!(
                out,
                "  {}: {:.6} {:+.6}i",
                style(&qubit_state.id).cyan(),
                qubit_state.amplitude_real,
                qubit_state.amplitude_imaginary
            )?;
        }
    }

    writeln!(out, "Output:")?;
    match &state.result {
        Some(result) => writeln!(out, "  {result}"),
        None => writeln!(out, "  No result available"),
    }
}
