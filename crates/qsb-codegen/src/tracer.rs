//! A backend that records what a program does into a [`Circuit`].

use rustc_hash::FxHashMap;
use tracing::trace;

use qsb_eval::{
    Backend, BackendError, BackendResult, MeasurementResult, QubitAllocator, StateDump,
};
use qsb_ir::{Circuit, Instruction, QubitId, StandardGate};

/// Records gates, measurements and resets into a circuit.
///
/// Standalone, the tracer knows nothing about amplitudes: measurements
/// return [`MeasurementResult::Deferred`] with the classical bit they write
/// to, and `DumpMachine` sees an empty state. Wrapping a backend with
/// [`CircuitTracer::wrapping`] forwards every call so outcomes are real,
/// while the same circuit is recorded.
///
/// Every allocation gets a fresh circuit wire, even when the program reuses a
/// released qubit id, so no wire is ever shared by two logical qubits.
pub struct CircuitTracer<'a> {
    circuit: Circuit,
    allocator: QubitAllocator,
    wires: FxHashMap<QubitId, QubitId>,
    inner: Option<&'a mut dyn Backend>,
}

impl<'a> CircuitTracer<'a> {
    /// Create a standalone tracer.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            circuit: Circuit::new(name),
            allocator: QubitAllocator::new(),
            wires: FxHashMap::default(),
            inner: None,
        }
    }

    /// Create a tracer that forwards to `inner`.
    pub fn wrapping(name: impl Into<String>, inner: &'a mut dyn Backend) -> Self {
        Self {
            inner: Some(inner),
            ..Self::new(name)
        }
    }

    /// The circuit recorded so far.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Consume the tracer and return the recorded circuit.
    pub fn into_circuit(self) -> Circuit {
        self.circuit
    }

    fn wire(&self, qubit: QubitId) -> BackendResult<QubitId> {
        self.wires
            .get(&qubit)
            .copied()
            .ok_or(BackendError::UnknownQubit(qubit))
    }
}

impl Backend for CircuitTracer<'_> {
    fn allocate(&mut self) -> BackendResult<QubitId> {
        let qubit = match self.inner.as_deref_mut() {
            Some(inner) => inner.allocate()?,
            None => self.allocator.allocate(),
        };
        let wire = self.circuit.add_qubit();
        self.wires.insert(qubit, wire);
        trace!(%qubit, %wire, "traced allocation");
        Ok(qubit)
    }

    fn release(&mut self, qubit: QubitId) -> BackendResult<()> {
        self.wire(qubit)?;
        match self.inner.as_deref_mut() {
            Some(inner) => inner.release(qubit)?,
            None => {
                self.allocator.release(qubit);
            }
        }
        self.wires.remove(&qubit);
        Ok(())
    }

    fn gate(&mut self, gate: &StandardGate, qubits: &[QubitId]) -> BackendResult<()> {
        let wires = qubits
            .iter()
            .map(|q| self.wire(*q))
            .collect::<BackendResult<Vec<_>>>()?;
        if let Some(inner) = self.inner.as_deref_mut() {
            inner.gate(gate, qubits)?;
        }
        self.circuit.apply(Instruction::gate(*gate, wires))?;
        Ok(())
    }

    fn measure(&mut self, qubit: QubitId) -> BackendResult<MeasurementResult> {
        let wire = self.wire(qubit)?;
        let clbit = self.circuit.add_clbit();
        self.circuit.measure(wire, clbit)?;
        match self.inner.as_deref_mut() {
            Some(inner) => inner.measure(qubit),
            None => Ok(MeasurementResult::Deferred(clbit)),
        }
    }

    fn reset(&mut self, qubit: QubitId) -> BackendResult<()> {
        let wire = self.wire(qubit)?;
        if let Some(inner) = self.inner.as_deref_mut() {
            inner.reset(qubit)?;
        }
        self.circuit.reset(wire)?;
        Ok(())
    }

    fn capture_state(&mut self) -> BackendResult<StateDump> {
        match self.inner.as_deref_mut() {
            Some(inner) => inner.capture_state(),
            None => Ok(StateDump::default()),
        }
    }

    fn qubit_count(&self) -> usize {
        match self.inner.as_deref() {
            Some(inner) => inner.qubit_count(),
            None => self.allocator.live_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsb_ir::{ClbitId, InstructionKind};

    #[test]
    fn test_standalone_measurement_is_deferred() {
        let mut tracer = CircuitTracer::new("t");
        let q = tracer.allocate().unwrap();
        tracer.gate(&StandardGate::H, &[q]).unwrap();
        let r = tracer.measure(q).unwrap();
        assert_eq!(r, MeasurementResult::Deferred(ClbitId(0)));

        let circuit = tracer.into_circuit();
        assert_eq!(circuit.num_qubits(), 1);
        assert_eq!(circuit.num_clbits(), 1);
        assert_eq!(circuit.len(), 2);
    }

    #[test]
    fn test_reused_id_gets_fresh_wire() {
        let mut tracer = CircuitTracer::new("t");
        let a = tracer.allocate().unwrap();
        tracer.gate(&StandardGate::X, &[a]).unwrap();
        tracer.reset(a).unwrap();
        tracer.release(a).unwrap();

        let b = tracer.allocate().unwrap();
        assert_eq!(a, b);
        tracer.gate(&StandardGate::H, &[b]).unwrap();

        let circuit = tracer.into_circuit();
        assert_eq!(circuit.num_qubits(), 2);
        let last = circuit.instructions().last().unwrap();
        assert_eq!(last.qubits, vec![QubitId(1)]);
    }

    #[test]
    fn test_mresetz_records_measure_and_reset() {
        let mut tracer = CircuitTracer::new("t");
        let q = tracer.allocate().unwrap();
        tracer.mresetz(q).unwrap();
        let kinds: Vec<_> = tracer.circuit().instructions().iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![InstructionKind::Measure, InstructionKind::Reset]);
    }

    #[test]
    fn test_unknown_qubit_rejected() {
        let mut tracer = CircuitTracer::new("t");
        assert!(matches!(
            tracer.gate(&StandardGate::H, &[QubitId(3)]),
            Err(BackendError::UnknownQubit(_))
        ));
    }

    #[test]
    fn test_standalone_dump_is_empty() {
        let mut tracer = CircuitTracer::new("t");
        tracer.allocate().unwrap();
        assert_eq!(tracer.capture_state().unwrap(), StateDump::default());
        assert_eq!(tracer.qubit_count(), 1);
    }
}
