//! Shared helpers for CLI commands.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use console::style;

/// How a command prints structured results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "table" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("Unknown format: '{other}'. Available: text, json")),
        }
    }
}

/// Read a Q# source file.
pub fn load_source(path: &Path) -> Result<String> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Write generated text to `output`, or to stdout when there is none.
pub fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            eprintln!(
                "{} Wrote {}",
                style("✓").green().bold(),
                style(path.display()).green()
            );
        }
        None => print!("{text}"),
    }
    Ok(())
}
