//! qsbridge command-line interface
//!
//! Runs Q# programs on the local simulator and translates them to
//! OpenQASM 2.0, QIR and quantikz.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use qsb_bridge::{Bridge, BridgeConfig, Noise};
use qsb_codegen::ResetBehavior;

mod commands;

use commands::common::OutputFormat;
use commands::{circuit, qasm, qir, quantikz, run, version};

/// qsb - run Q# programs and translate them to OpenQASM, QIR and LaTeX
#[derive(Parser)]
#[command(name = "qsb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// YAML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program on the simulator
    Run {
        /// Q# source file
        input: PathBuf,

        /// Number of shots
        #[arg(short, long, default_value = "1")]
        shots: u32,

        /// Noise model (ideal, bit-flip:P, phase-flip:P, depolarizing:P, pauli:X,Y,Z)
        #[arg(short, long, default_value = "ideal")]
        noise: Noise,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Translate a program to OpenQASM 2.0
    Qasm {
        /// Q# source file
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave out `include "qelib1.inc";`
        #[arg(long)]
        no_qelib: bool,

        /// How resets are emitted (supported, ignored, error)
        #[arg(long)]
        reset_behavior: Option<ResetBehavior>,
    },

    /// Translate a program to base-profile QIR
    Qir {
        /// Q# source file
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the circuit a program executes
    Circuit {
        /// Q# source file
        input: PathBuf,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Render a program's circuit as quantikz LaTeX
    Quantikz {
        /// Q# source file
        input: PathBuf,

        /// Render this operation instead of the entry point, e.g. `Test.Main`
        #[arg(long)]
        operation: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Config errors are reported after logging is up.
    let config = BridgeConfig::load(cli.config.as_deref());

    let filter = match cli.verbose {
        0 => config
            .as_ref()
            .map(|c| c.logging.level.clone())
            .unwrap_or_else(|_| "warn".to_string()),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = config
        .map_err(anyhow::Error::from)
        .and_then(|config| Ok(Bridge::new(config)?))
        .and_then(|bridge| execute(&bridge, cli.command));

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}

fn execute(bridge: &Bridge, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Run {
            input,
            shots,
            noise,
            seed,
            format,
        } => run::execute(bridge, &input, shots, noise, seed, format),

        Commands::Qasm {
            input,
            output,
            no_qelib,
            reset_behavior,
        } => qasm::execute(
            bridge,
            &input,
            output.as_deref(),
            no_qelib,
            reset_behavior,
        ),

        Commands::Qir { input, output } => qir::execute(bridge, &input, output.as_deref()),

        Commands::Circuit { input, format } => circuit::execute(bridge, &input, format),

        Commands::Quantikz {
            input,
            operation,
            output,
        } => quantikz::execute(bridge, &input, operation.as_deref(), output.as_deref()),

        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}
