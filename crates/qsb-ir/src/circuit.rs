//! High-level circuit builder API.

use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::StandardGate;
use crate::instruction::{Instruction, InstructionKind};
use crate::qubit::{Clbit, ClbitId, Qubit, QubitId};

/// A quantum circuit.
///
/// Instructions are kept in program order. The circuit tracer appends to it
/// while a program runs, and the emitters walk it front to back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Qubits in the circuit, indexed by id.
    qubits: Vec<Qubit>,
    /// Classical bits in the circuit, indexed by id.
    clbits: Vec<Clbit>,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            clbits: vec![],
            instructions: vec![],
        }
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        for _ in 0..num_qubits {
            circuit.add_qubit();
        }
        for _ in 0..num_clbits {
            circuit.add_clbit();
        }
        circuit
    }

    /// Add a single qubit to the circuit.
    pub fn add_qubit(&mut self) -> QubitId {
        let id = QubitId(self.qubits.len() as u32);
        self.qubits.push(Qubit::new(id));
        id
    }

    /// Add a single classical bit to the circuit.
    pub fn add_clbit(&mut self) -> ClbitId {
        let id = ClbitId(self.clbits.len() as u32);
        self.clbits.push(Clbit::new(id));
        id
    }

    /// Append an instruction after validating its operands.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        if let InstructionKind::Gate(gate) = &instruction.kind {
            let got = instruction.qubits.len() as u32;
            if got != gate.num_qubits() {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name().to_string(),
                    expected: gate.num_qubits(),
                    got,
                });
            }
        }

        for (i, qubit) in instruction.qubits.iter().enumerate() {
            if qubit.index() >= self.qubits.len() {
                return Err(IrError::QubitNotFound {
                    qubit: *qubit,
                    gate_name: Some(instruction.name().to_string()),
                });
            }
            if instruction.qubits[..i].contains(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit: *qubit,
                    gate_name: Some(instruction.name().to_string()),
                });
            }
        }

        for clbit in &instruction.clbits {
            if clbit.index() >= self.clbits.len() {
                return Err(IrError::ClbitNotFound { clbit: *clbit });
            }
        }

        if instruction.is_measure() {
            for (qubit, clbit) in instruction.qubits.iter().zip(&instruction.clbits) {
                self.qubits[qubit.index()].measurements += 1;
                self.clbits[clbit.index()].source = Some(*qubit);
            }
        }

        self.instructions.push(instruction);
        Ok(self)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Apply any standard gate.
    pub fn gate(
        &mut self,
        gate: StandardGate,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(gate, qubits))
    }

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Instruction::measure(qubit, clbit))
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::reset(qubit))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the qubits in the circuit.
    pub fn qubits(&self) -> &[Qubit] {
        &self.qubits
    }

    /// Get the classical bits in the circuit.
    pub fn clbits(&self) -> &[Clbit] {
        &self.clbits
    }

    /// Get the instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Get the number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Check whether the circuit has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Get the circuit depth.
    ///
    /// Each instruction lands one layer after the latest layer of any qubit
    /// it touches.
    pub fn depth(&self) -> usize {
        let mut wire_depth = vec![0usize; self.qubits.len()];
        let mut depth = 0;
        for inst in &self.instructions {
            let layer = inst
                .qubits
                .iter()
                .map(|q| wire_depth[q.index()])
                .max()
                .unwrap_or(0)
                + 1;
            for q in &inst.qubits {
                wire_depth[q.index()] = layer;
            }
            depth = depth.max(layer);
        }
        depth
    }

    /// Count instructions per name, in order of first appearance.
    pub fn count_ops(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = vec![];
        for inst in &self.instructions {
            match counts.iter_mut().find(|(name, _)| name == inst.name()) {
                Some((_, n)) => *n += 1,
                None => counts.push((inst.name().to_string(), 1)),
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bell() -> Circuit {
        let mut circuit = Circuit::with_size("bell", 2, 2);
        circuit
            .gate(StandardGate::H, [QubitId(0)])
            .unwrap()
            .gate(StandardGate::CX, [QubitId(0), QubitId(1)])
            .unwrap()
            .measure(QubitId(0), ClbitId(0))
            .unwrap()
            .measure(QubitId(1), ClbitId(1))
            .unwrap();
        circuit
    }

    #[test]
    fn test_new_circuit() {
        let circuit = Circuit::new("test");
        assert_eq!(circuit.name(), "test");
        assert_eq!(circuit.num_qubits(), 0);
        assert_eq!(circuit.num_clbits(), 0);
        assert!(circuit.is_empty());
    }

    #[test]
    fn test_circuit_with_size() {
        let circuit = Circuit::with_size("test", 3, 2);
        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.num_clbits(), 2);
    }

    #[test]
    fn test_bell_state() {
        let circuit = bell();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.num_clbits(), 2);
        assert_eq!(circuit.depth(), 3); // H, CX, parallel measures
        assert_eq!(circuit.qubits()[1].measurements, 1);
        assert_eq!(circuit.clbits()[1].source, Some(QubitId(1)));
    }

    #[test]
    fn test_depth_of_ladder() {
        let mut circuit = Circuit::with_size("ladder", 4, 0);
        circuit.gate(StandardGate::H, [QubitId(0)]).unwrap();
        for i in 0..3 {
            circuit
                .gate(StandardGate::CX, [QubitId(i), QubitId(i + 1)])
                .unwrap();
        }
        circuit.gate(StandardGate::X, [QubitId(0)]).unwrap();
        assert_eq!(circuit.len(), 5);
        assert_eq!(circuit.depth(), 4);
    }

    #[test]
    fn test_added_wires_get_sequential_ids() {
        let mut circuit = Circuit::new("grow");
        assert_eq!(circuit.add_qubit(), QubitId(0));
        assert_eq!(circuit.add_qubit(), QubitId(1));
        assert_eq!(circuit.add_clbit(), ClbitId(0));
        assert_eq!(circuit.num_qubits(), 2);
    }

    #[test]
    fn test_unknown_qubit_rejected() {
        let mut circuit = Circuit::with_size("test", 1, 0);
        let err = circuit
            .gate(StandardGate::CX, [QubitId(0), QubitId(1)])
            .unwrap_err();
        assert!(matches!(err, IrError::QubitNotFound { .. }));
    }

    #[test]
    fn test_unknown_clbit_rejected() {
        let mut circuit = Circuit::with_size("test", 1, 0);
        let err = circuit.measure(QubitId(0), ClbitId(0)).unwrap_err();
        assert!(matches!(err, IrError::ClbitNotFound { .. }));
    }

    #[test]
    fn test_duplicate_qubit_rejected() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        let err = circuit
            .gate(StandardGate::CX, [QubitId(1), QubitId(1)])
            .unwrap_err();
        assert!(matches!(err, IrError::DuplicateQubit { .. }));
    }

    #[test]
    fn test_qubit_count_mismatch() {
        let mut circuit = Circuit::with_size("test", 2, 0);
        let err = circuit
            .gate(StandardGate::CCX, [QubitId(0), QubitId(1)])
            .unwrap_err();
        assert!(matches!(
            err,
            IrError::QubitCountMismatch {
                expected: 3,
                got: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_count_ops() {
        let mut circuit = bell();
        circuit.reset(QubitId(0)).unwrap();

        assert_eq!(
            circuit.count_ops(),
            vec![
                ("h".to_string(), 1),
                ("cx".to_string(), 1),
                ("measure".to_string(), 2),
                ("reset".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_serde_roundtrip() {
        let circuit = bell();
        let json = serde_json::to_string(&circuit).unwrap();
        let back: Circuit = serde_json::from_str(&json).unwrap();
        assert_eq!(back, circuit);
    }
}
