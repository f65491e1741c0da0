//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - run and translate Q# programs",
        style("qsbridge").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  qsb-lang     Q# subset lexer and parser");
    println!("  qsb-eval     Interpreter and backend trait");
    println!("  qsb-sim      Statevector simulator");
    println!("  qsb-codegen  OpenQASM 2.0, QIR and quantikz emitters");
    println!("  qsb-bridge   Run and translate API");
    println!();
    println!("License:    {}", style(env!("CARGO_PKG_LICENSE")).dim());
}
