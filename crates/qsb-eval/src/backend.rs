//! The execution seam between the evaluator and a quantum backend.

use num_complex::Complex64;
use qsb_ir::{ClbitId, QubitId, StandardGate};

use crate::error::BackendResult;

/// Outcome of a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementResult {
    /// The outcome is known: `false` is `Zero`, `true` is `One`.
    Known(bool),
    /// The outcome is only available when the generated program runs.
    Deferred(ClbitId),
}

/// A snapshot of the simulator state, as produced by `DumpMachine`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateDump {
    /// Number of live qubits.
    pub qubit_count: usize,
    /// Basis index (bit `i` is qubit `i`) and amplitude, nonzero entries only.
    pub amplitudes: Vec<(u64, Complex64)>,
}

/// A quantum backend driven by the evaluator.
///
/// Every operation is fallible and reports through [`BackendResult`].
pub trait Backend {
    /// Allocate a fresh qubit in |0⟩.
    fn allocate(&mut self) -> BackendResult<QubitId>;

    /// Release a qubit. It must be in |0⟩ unless its last operation was a
    /// measurement, in which case the backend resets it.
    fn release(&mut self, qubit: QubitId) -> BackendResult<()>;

    /// Apply a gate; controls come first in `qubits`.
    fn gate(&mut self, gate: &StandardGate, qubits: &[QubitId]) -> BackendResult<()>;

    /// Measure in the computational basis without resetting.
    fn measure(&mut self, qubit: QubitId) -> BackendResult<MeasurementResult>;

    /// Reset a qubit to |0⟩.
    fn reset(&mut self, qubit: QubitId) -> BackendResult<()>;

    /// Measure, then reset to |0⟩.
    fn mresetz(&mut self, qubit: QubitId) -> BackendResult<MeasurementResult> {
        let result = self.measure(qubit)?;
        self.reset(qubit)?;
        Ok(result)
    }

    /// Capture the current state for diagnostics.
    fn capture_state(&mut self) -> BackendResult<StateDump>;

    /// Number of live qubits.
    fn qubit_count(&self) -> usize;
}

/// Receives program output.
pub trait Receiver {
    /// A `Message` call.
    fn message(&mut self, msg: &str);

    /// A `DumpMachine` call.
    fn state(&mut self, dump: &StateDump);
}

/// A receiver that drops all output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReceiver;

impl Receiver for NullReceiver {
    fn message(&mut self, _msg: &str) {}

    fn state(&mut self, _dump: &StateDump) {}
}

/// Hands out qubit ids, reusing the lowest released id first.
#[derive(Debug, Default, Clone)]
pub struct QubitAllocator {
    live: Vec<bool>,
}

impl QubitAllocator {
    /// Create an empty allocator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the lowest free id.
    pub fn allocate(&mut self) -> QubitId {
        match self.live.iter().position(|live| !live) {
            Some(index) => {
                self.live[index] = true;
                QubitId(index as u32)
            }
            None => {
                self.live.push(true);
                QubitId((self.live.len() - 1) as u32)
            }
        }
    }

    /// Free an id. Returns `false` if it was not allocated.
    pub fn release(&mut self, qubit: QubitId) -> bool {
        match self.live.get_mut(qubit.index()) {
            Some(live) if *live => {
                *live = false;
                while self.live.last() == Some(&false) {
                    self.live.pop();
                }
                true
            }
            _ => false,
        }
    }

    /// Whether the id is currently allocated.
    pub fn is_live(&self, qubit: QubitId) -> bool {
        self.live.get(qubit.index()).copied().unwrap_or(false)
    }

    /// Number of live ids.
    pub fn live_count(&self) -> usize {
        self.live.iter().filter(|live| **live).count()
    }

    /// One past the highest id ever needed while live.
    pub fn width(&self) -> usize {
        self.live.len()
    }
}

/// Format a basis index as a ket with qubit 0 leftmost, e.g. `|10⟩`.
pub fn format_state_id(index: u64, qubit_count: usize) -> String {
    let bits: String = (0..qubit_count)
        .map(|q| if (index >> q) & 1 == 1 { '1' } else { '0' })
        .collect();
    format!("|{bits}⟩")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocator_reuses_lowest_id() {
        let mut alloc = QubitAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        let c = alloc.allocate();
        assert_eq!((a, b, c), (QubitId(0), QubitId(1), QubitId(2)));

        assert!(alloc.release(b));
        assert!(!alloc.release(b));
        assert_eq!(alloc.allocate(), QubitId(1));
        assert_eq!(alloc.live_count(), 3);
    }

    #[test]
    fn test_allocator_shrinks() {
        let mut alloc = QubitAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        alloc.release(b);
        alloc.release(a);
        assert_eq!(alloc.width(), 0);
        assert!(!alloc.is_live(a));
    }

    #[test]
    fn test_format_state_id() {
        assert_eq!(format_state_id(0, 2), "|00⟩");
        assert_eq!(format_state_id(1, 2), "|10⟩");
        assert_eq!(format_state_id(3, 3), "|110⟩");
        assert_eq!(format_state_id(0, 0), "|⟩");
    }
}
