//! OpenQASM 2.0 emitter.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::str::FromStr;

use qsb_ir::{Circuit, Instruction, InstructionKind, QubitId, StandardGate};

use crate::error::{CodegenError, CodegenResult};

/// How resets appear in generated OpenQASM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetBehavior {
    /// Emit `reset q[i];`.
    #[default]
    Supported,
    /// Drop resets from the output.
    Ignored,
    /// Fail with [`CodegenError::ResetNotSupported`].
    Error,
}

impl FromStr for ResetBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "supported" => Ok(Self::Supported),
            "ignored" => Ok(Self::Ignored),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown reset behavior '{other}' (expected supported, ignored or error)"
            )),
        }
    }
}

/// Options for OpenQASM generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QasmGenerationOptions {
    /// Emit `include "qelib1.inc";`.
    pub include_qelib: bool,
    /// What to do with resets.
    pub reset_behavior: ResetBehavior,
}

impl Default for QasmGenerationOptions {
    fn default() -> Self {
        Self {
            include_qelib: true,
            reset_behavior: ResetBehavior::Supported,
        }
    }
}

impl QasmGenerationOptions {
    /// Create options.
    pub fn new(include_qelib: bool, reset_behavior: ResetBehavior) -> Self {
        Self {
            include_qelib,
            reset_behavior,
        }
    }
}

// qelib1.inc predates the Ising gates, so their definitions are inlined.
const RXX_DEF: &str =
    "gate rxx(theta) a, b { h a; h b; cx a, b; rz(theta) b; cx a, b; h a; h b; }";
const RYY_DEF: &str = "gate ryy(theta) a, b { rx(pi/2) a; rx(pi/2) b; cx a, b; rz(theta) b; cx a, b; rx(-pi/2) a; rx(-pi/2) b; }";
const RZZ_DEF: &str = "gate rzz(theta) a, b { cx a, b; rz(theta) b; cx a, b; }";

/// Emit a circuit as OpenQASM 2.0 source.
///
/// Lines come out in instruction order, so the same circuit and options
/// always give the same text.
pub fn emit_qasm2(circuit: &Circuit, options: &QasmGenerationOptions) -> CodegenResult<String> {
    let mut emitter = Qasm2Emitter::new(options);
    emitter.emit_circuit(circuit)?;
    Ok(emitter.output)
}

struct Qasm2Emitter<'o> {
    options: &'o QasmGenerationOptions,
    output: String,
}

impl<'o> Qasm2Emitter<'o> {
    fn new(options: &'o QasmGenerationOptions) -> Self {
        Self {
            options,
            output: String::new(),
        }
    }

    fn emit_circuit(&mut self, circuit: &Circuit) -> CodegenResult<()> {
        self.writeln("OPENQASM 2.0;");
        if self.options.include_qelib {
            self.writeln("include \"qelib1.inc\";");
        }

        let mut needs = [false; 3];
        for inst in circuit.instructions() {
            match inst.as_gate() {
                Some(StandardGate::RXX(_)) => needs[0] = true,
                Some(StandardGate::RYY(_)) => needs[1] = true,
                Some(StandardGate::RZZ(_)) => needs[2] = true,
                _ => {}
            }
        }
        for (needed, def) in needs.into_iter().zip([RXX_DEF, RYY_DEF, RZZ_DEF]) {
            if needed {
                self.writeln(def);
            }
        }

        self.writeln(&format!("qreg q[{}];", circuit.num_qubits()));
        if circuit.num_clbits() > 0 {
            self.writeln(&format!("creg c[{}];", circuit.num_clbits()));
        }

        for inst in circuit.instructions() {
            self.emit_instruction(inst)?;
        }
        Ok(())
    }

    fn emit_instruction(&mut self, inst: &Instruction) -> CodegenResult<()> {
        match &inst.kind {
            InstructionKind::Gate(gate) => {
                let qubits = emit_qubits(&inst.qubits);
                match gate.angle() {
                    Some(theta) => {
                        self.writeln(&format!("{}({theta}) {qubits};", qasm_name(gate)));
                    }
                    None => self.writeln(&format!("{} {qubits};", qasm_name(gate))),
                }
            }
            InstructionKind::Measure => {
                for (q, c) in inst.qubits.iter().zip(&inst.clbits) {
                    self.writeln(&format!("measure q[{}] -> c[{}];", q.0, c.0));
                }
            }
            InstructionKind::Reset => match self.options.reset_behavior {
                ResetBehavior::Supported => {
                    self.writeln(&format!("reset {};", emit_qubits(&inst.qubits)));
                }
                ResetBehavior::Ignored => {}
                ResetBehavior::Error => {
                    let qubit = inst.qubits.first().copied().unwrap_or(QubitId(0));
                    return Err(CodegenError::ResetNotSupported(qubit));
                }
            },
        }
        Ok(())
    }

    fn writeln(&mut self, line: &str) {
        let _ = writeln!(self.output, "{line}");
    }
}

fn qasm_name(gate: &StandardGate) -> &'static str {
    match gate {
        StandardGate::R1(_) => "u1",
        other => other.name(),
    }
}

fn emit_qubits(qubits: &[QubitId]) -> String {
    qubits
        .iter()
        .map(|q| format!("q[{}]", q.0))
        .collect::<Vec<_>>()
        .join(", ")
}
