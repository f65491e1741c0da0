//! Base-profile QIR emitter.
//!
//! The output is textual LLVM IR with opaque `%Qubit` and `%Result`
//! pointers built from integer ids, one entry function, and the output
//! recording calls for the entry's return value.

use std::fmt::Write as _;

use qsb_eval::{MeasurementResult, Value};
use qsb_ir::{Circuit, ClbitId, InstructionKind, QubitId, StandardGate};

use crate::error::{CodegenError, CodegenResult};

const ENTRY_POINT: &str = "ENTRYPOINT__main";

/// The structure of the entry point's return value, as recorded output.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputShape {
    /// A measurement result.
    Result(ClbitId),
    /// A classical boolean.
    Bool(bool),
    /// A classical integer.
    Int(i64),
    /// A classical double.
    Double(f64),
    /// A tuple; `()` is the empty tuple.
    Tuple(Vec<OutputShape>),
    /// An array.
    Array(Vec<OutputShape>),
}

impl OutputShape {
    /// The shape of `()`.
    pub fn unit() -> Self {
        Self::Tuple(vec![])
    }

    /// Build the shape of a value returned by a traced entry point.
    ///
    /// Results must be deferred, since base-profile output can only record
    /// results that the program itself measured.
    pub fn from_value(value: &Value) -> CodegenResult<Self> {
        Ok(match value {
            Value::Unit => Self::unit(),
            Value::Result(MeasurementResult::Deferred(clbit)) => Self::Result(*clbit),
            Value::Bool(b) => Self::Bool(*b),
            Value::Int(i) => Self::Int(*i),
            Value::Double(d) => Self::Double(*d),
            Value::Tuple(items) => Self::Tuple(
                items
                    .iter()
                    .map(Self::from_value)
                    .collect::<CodegenResult<_>>()?,
            ),
            Value::Array(items) => Self::Array(
                items
                    .iter()
                    .map(Self::from_value)
                    .collect::<CodegenResult<_>>()?,
            ),
            Value::Result(MeasurementResult::Known(_)) => {
                return Err(CodegenError::UnsupportedOutput("constant Result".into()));
            }
            other => return Err(CodegenError::UnsupportedOutput(other.type_name().into())),
        })
    }
}

/// Emit a traced circuit and its output shape as base-profile QIR.
///
/// Base profile allows no reset and no operation on a qubit after it is
/// measured. Each measurement is copied onto a fresh auxiliary qubit with
/// `H`, `CZ`, `H` and then measured there, so the measured wire stays usable.
/// A reset moves its wire onto a fresh qubit instead of emitting anything.
pub fn emit_qir(circuit: &Circuit, output: &OutputShape) -> CodegenResult<String> {
    let mut emitter = QirEmitter::default();
    let mut qubits = QubitMap::new(circuit.num_qubits());
    for inst in circuit.instructions() {
        match &inst.kind {
            InstructionKind::Gate(gate) => {
                let mapped: Vec<QubitId> =
                    inst.qubits.iter().map(|q| qubits.physical(*q)).collect();
                emitter.gate(gate, &mapped);
            }
            InstructionKind::Measure => {
                for (q, c) in inst.qubits.iter().zip(&inst.clbits) {
                    let target = qubits.physical(*q);
                    let aux = qubits.fresh();
                    emitter.gate(&StandardGate::H, &[aux]);
                    emitter.gate(&StandardGate::CZ, &[aux, target]);
                    emitter.gate(&StandardGate::H, &[aux]);
                    emitter.call(
                        Callee::irreversible("__quantum__qis__m__body", "%Qubit*, %Result*"),
                        &format!("{}, {}", qubit_arg(aux), result_arg(*c)),
                    );
                }
            }
            InstructionKind::Reset => inst.qubits.iter().for_each(|q| qubits.release(*q)),
        }
    }
    emitter.record(output);
    Ok(emitter.finish(qubits.count(), circuit.num_clbits()))
}

/// Assignment of circuit wires to base-profile qubit ids.
///
/// Wire `i` starts on qubit `i`. Ids are never reused.
struct QubitMap {
    wires: Vec<Option<u32>>,
    next: u32,
}

impl QubitMap {
    fn new(num_wires: usize) -> Self {
        Self {
            wires: (0..num_wires as u32).map(Some).collect(),
            next: num_wires as u32,
        }
    }

    fn physical(&mut self, wire: QubitId) -> QubitId {
        if let Some(id) = self.wires[wire.index()] {
            return QubitId(id);
        }
        let id = self.fresh();
        self.wires[wire.index()] = Some(id.0);
        id
    }

    fn fresh(&mut self) -> QubitId {
        let id = QubitId(self.next);
        self.next += 1;
        id
    }

    fn release(&mut self, wire: QubitId) {
        self.wires[wire.index()] = None;
    }

    fn count(&self) -> usize {
        self.next as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Callee {
    name: &'static str,
    params: &'static str,
    irreversible: bool,
}

impl Callee {
    fn new(name: &'static str, params: &'static str) -> Self {
        Self {
            name,
            params,
            irreversible: false,
        }
    }

    fn irreversible(name: &'static str, params: &'static str) -> Self {
        Self {
            irreversible: true,
            ..Self::new(name, params)
        }
    }
}

#[derive(Default)]
struct QirEmitter {
    body: Vec<String>,
    callees: Vec<Callee>,
}

impl QirEmitter {
    fn call(&mut self, callee: Callee, args: &str) {
        if !self.callees.contains(&callee) {
            self.callees.push(callee);
        }
        self.body.push(format!("call void @{}({args})", callee.name));
    }

    fn gate(&mut self, gate: &StandardGate, qubits: &[QubitId]) {
        let qs: Vec<String> = qubits.iter().map(|q| qubit_arg(*q)).collect();
        let (name, params) = match gate {
            StandardGate::I => return,
            StandardGate::CSwap => {
                // Fredkin as CX · Toffoli · CX
                let (c, a, b) = (qubits[0], qubits[1], qubits[2]);
                self.gate(&StandardGate::CX, &[b, a]);
                self.gate(&StandardGate::CCX, &[c, a, b]);
                self.gate(&StandardGate::CX, &[b, a]);
                return;
            }
            StandardGate::X => ("__quantum__qis__x__body", "%Qubit*"),
            StandardGate::Y => ("__quantum__qis__y__body", "%Qubit*"),
            StandardGate::Z => ("__quantum__qis__z__body", "%Qubit*"),
            StandardGate::H => ("__quantum__qis__h__body", "%Qubit*"),
            StandardGate::S => ("__quantum__qis__s__body", "%Qubit*"),
            StandardGate::Sdg => ("__quantum__qis__s__adj", "%Qubit*"),
            StandardGate::T => ("__quantum__qis__t__body", "%Qubit*"),
            StandardGate::Tdg => ("__quantum__qis__t__adj", "%Qubit*"),
            StandardGate::Rx(_) => ("__quantum__qis__rx__body", "double, %Qubit*"),
            StandardGate::Ry(_) => ("__quantum__qis__ry__body", "double, %Qubit*"),
            // Base profile has no phase gate; R1 equals Rz up to global phase.
            StandardGate::Rz(_) | StandardGate::R1(_) => {
                ("__quantum__qis__rz__body", "double, %Qubit*")
            }
            StandardGate::CX => ("__quantum__qis__cx__body", "%Qubit*, %Qubit*"),
            StandardGate::CY => ("__quantum__qis__cy__body", "%Qubit*, %Qubit*"),
            StandardGate::CZ => ("__quantum__qis__cz__body", "%Qubit*, %Qubit*"),
            StandardGate::Swap => ("__quantum__qis__swap__body", "%Qubit*, %Qubit*"),
            StandardGate::RXX(_) => ("__quantum__qis__rxx__body", "double, %Qubit*, %Qubit*"),
            StandardGate::RYY(_) => ("__quantum__qis__ryy__body", "double, %Qubit*, %Qubit*"),
            StandardGate::RZZ(_) => ("__quantum__qis__rzz__body", "double, %Qubit*, %Qubit*"),
            StandardGate::CCX => (
                "__quantum__qis__ccx__body",
                "%Qubit*, %Qubit*, %Qubit*",
            ),
        };
        let args = match gate.angle() {
            Some(theta) => format!("double {}, {}", llvm_double(theta), qs.join(", ")),
            None => qs.join(", "),
        };
        self.call(Callee::new(name, params), &args);
    }

    fn record(&mut self, shape: &OutputShape) {
        match shape {
            OutputShape::Result(c) => self.call(
                Callee::new("__quantum__rt__result_record_output", "%Result*, i8*"),
                &format!("{}, i8* null", result_arg(*c)),
            ),
            OutputShape::Bool(b) => self.call(
                Callee::new("__quantum__rt__bool_record_output", "i1, i8*"),
                &format!("i1 {b}, i8* null"),
            ),
            OutputShape::Int(i) => self.call(
                Callee::new("__quantum__rt__int_record_output", "i64, i8*"),
                &format!("i64 {i}, i8* null"),
            ),
            OutputShape::Double(d) => self.call(
                Callee::new("__quantum__rt__double_record_output", "double, i8*"),
                &format!("double {}, i8* null", llvm_double(*d)),
            ),
            OutputShape::Tuple(items) => {
                self.call(
                    Callee::new("__quantum__rt__tuple_record_output", "i64, i8*"),
                    &format!("i64 {}, i8* null", items.len()),
                );
                items.iter().for_each(|item| self.record(item));
            }
            OutputShape::Array(items) => {
                self.call(
                    Callee::new("__quantum__rt__array_record_output", "i64, i8*"),
                    &format!("i64 {}, i8* null", items.len()),
                );
                items.iter().for_each(|item| self.record(item));
            }
        }
    }

    fn finish(self, num_qubits: usize, num_results: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "%Result = type opaque");
        let _ = writeln!(out, "%Qubit = type opaque");
        let _ = writeln!(out);
        let _ = writeln!(out, "define void @{ENTRY_POINT}() #0 {{");
        let _ = writeln!(out, "block_0:");
        for line in &self.body {
            let _ = writeln!(out, "  {line}");
        }
        let _ = writeln!(out, "  ret void");
        let _ = writeln!(out, "}}");

        // Reversible callees first, in order of first use, then the rest.
        let (irreversible, reversible): (Vec<Callee>, Vec<Callee>) =
            self.callees.into_iter().partition(|c| c.irreversible);
        for callee in reversible {
            let _ = writeln!(out);
            let _ = writeln!(out, "declare void @{}({})", callee.name, callee.params);
        }
        for callee in irreversible {
            let _ = writeln!(out);
            let _ = writeln!(out, "declare void @{}({}) #1", callee.name, callee.params);
        }

        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "attributes #0 = {{ \"entry_point\" \"output_labeling_schema\" \
             \"qir_profiles\"=\"base_profile\" \"required_num_qubits\"=\"{num_qubits}\" \
             \"required_num_results\"=\"{num_results}\" }}"
        );
        let _ = writeln!(out, "attributes #1 = {{ \"irreversible\" }}");
        let _ = writeln!(out);
        let _ = writeln!(out, "; module flags");
        let _ = writeln!(out);
        let _ = writeln!(out, "!llvm.module.flags = !{{!0, !1, !2, !3}}");
        let _ = writeln!(out);
        let _ = writeln!(out, "!0 = !{{i32 1, !\"qir_major_version\", i32 1}}");
        let _ = writeln!(out, "!1 = !{{i32 7, !\"qir_minor_version\", i32 0}}");
        let _ = writeln!(
            out,
            "!2 = !{{i32 1, !\"dynamic_qubit_management\", i1 false}}"
        );
        let _ = writeln!(
            out,
            "!3 = !{{i32 1, !\"dynamic_result_management\", i1 false}}"
        );
        out
    }
}

fn qubit_arg(qubit: QubitId) -> String {
    format!("%Qubit* inttoptr (i64 {} to %Qubit*)", qubit.0)
}

fn result_arg(clbit: ClbitId) -> String {
    format!("%Result* inttoptr (i64 {} to %Result*)", clbit.0)
}

/// LLVM needs a decimal point in floating literals, including `1.0e-7`.
fn llvm_double(value: f64) -> String {
    let text = format!("{value:?}");
    match text.find('e') {
        Some(pos) if !text[..pos].contains('.') => {
            format!("{}.0{}", &text[..pos], &text[pos..])
        }
        _ => text,
    }
}
