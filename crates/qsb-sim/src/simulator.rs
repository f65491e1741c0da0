//! Simulator backend implementation.

use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use qsb_eval::{
    Backend, BackendError, BackendResult, MeasurementResult, QubitAllocator, StateDump,
};
use qsb_ir::{IrError, PauliDistribution, QubitId, StandardGate};

use crate::statevector::{Statevector, ZERO_TOLERANCE};

/// Default limit on simultaneously live qubits.
pub const DEFAULT_MAX_QUBITS: usize = 20;

/// Local statevector simulator.
///
/// Qubits are allocated on demand. The random number generator lives as long
/// as the backend, so consecutive shots draw from one stream while
/// [`reset_state`](Self::reset_state) gives each shot a fresh register.
///
/// A qubit may be released when it is in |0⟩ or when its last operation was a
/// measurement; a measured qubit is reset on release. Under noise a qubit the
/// program uncomputed may still have picked up an error, so every released
/// qubit is reset.
pub struct SimulatorBackend {
    state: Statevector,
    allocator: QubitAllocator,
    /// Per slot: was the last operation a measurement.
    measured: Vec<bool>,
    rng: StdRng,
    noise: PauliDistribution,
    max_qubits: usize,
}

impl SimulatorBackend {
    /// Create a new simulator backend with default settings.
    pub fn new() -> Self {
        Self::with_max_qubits(DEFAULT_MAX_QUBITS)
    }

    /// Create a simulator with custom max qubits.
    pub fn with_max_qubits(max_qubits: usize) -> Self {
        Self {
            state: Statevector::new(0),
            allocator: QubitAllocator::new(),
            measured: Vec::new(),
            rng: StdRng::from_entropy(),
            noise: PauliDistribution::ideal(),
            max_qubits,
        }
    }

    /// Seed the random number generator.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Apply Pauli noise after every gate and before every measurement.
    #[must_use]
    pub fn with_noise(mut self, noise: PauliDistribution) -> Self {
        self.noise = noise;
        self
    }

    /// Maximum number of live qubits.
    pub fn max_qubits(&self) -> usize {
        self.max_qubits
    }

    /// Forget all qubits. The random stream continues.
    pub fn reset_state(&mut self) {
        self.state.clear();
        self.allocator = QubitAllocator::new();
        self.measured.clear();
    }

    fn slot(&self, qubit: QubitId) -> BackendResult<usize> {
        if self.allocator.is_live(qubit) {
            Ok(qubit.index())
        } else {
            Err(BackendError::UnknownQubit(qubit))
        }
    }

    fn apply_noise(&mut self, slots: &[usize]) {
        if self.noise.is_ideal() {
            return;
        }
        let (x, y, z) = (self.noise.x(), self.noise.y(), self.noise.z());
        for &slot in slots {
            let r: f64 = self.rng.r#gen();
            let error = if r < x {
                StandardGate::X
            } else if r < x + y {
                StandardGate::Y
            } else if r < x + y + z {
                StandardGate::Z
            } else {
                continue;
            };
            trace!(qubit = slot, %error, "noise");
            self.state.apply_gate(&error, &[slot]);
        }
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for SimulatorBackend {
    fn allocate(&mut self) -> BackendResult<QubitId> {
        if self.allocator.live_count() >= self.max_qubits {
            return Err(BackendError::TooManyQubits {
                max: self.max_qubits,
            });
        }
        let qubit = self.allocator.allocate();
        while self.state.num_qubits() < self.allocator.width() {
            self.state.grow();
        }
        self.measured.resize(self.allocator.width(), false);
        self.measured[qubit.index()] = false;
        Ok(qubit)
    }

    fn release(&mut self, qubit: QubitId) -> BackendResult<()> {
        let slot = self.slot(qubit)?;
        if self.measured[slot] || !self.noise.is_ideal() {
            self.state.reset(slot, &mut self.rng);
        } else if !self.state.is_zero(slot) {
            return Err(BackendError::QubitNotZero(qubit));
        }
        self.allocator.release(qubit);
        self.state.truncate(self.allocator.width());
        self.measured.truncate(self.allocator.width());
        Ok(())
    }

    fn gate(&mut self, gate: &StandardGate, qubits: &[QubitId]) -> BackendResult<()> {
        if qubits.len() != gate.num_qubits() as usize {
            return Err(IrError::QubitCountMismatch {
                gate_name: gate.name().to_string(),
                expected: gate.num_qubits(),
                got: qubits.len() as u32,
            }
            .into());
        }
        let mut slots = Vec::with_capacity(qubits.len());
        for (i, qubit) in qubits.iter().enumerate() {
            if qubits[..i].contains(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit: *qubit,
                    gate_name: Some(gate.name().to_string()),
                }
                .into());
            }
            slots.push(self.slot(*qubit)?);
        }
        self.state.apply_gate(gate, &slots);
        self.apply_noise(&slots);
        for &slot in &slots {
            self.measured[slot] = false;
        }
        Ok(())
    }

    fn measure(&mut self, qubit: QubitId) -> BackendResult<MeasurementResult> {
        let slot = self.slot(qubit)?;
        self.apply_noise(&[slot]);
        let outcome = self.state.measure(slot, &mut self.rng);
        self.measured[slot] = true;
        Ok(MeasurementResult::Known(outcome))
    }

    fn reset(&mut self, qubit: QubitId) -> BackendResult<()> {
        let slot = self.slot(qubit)?;
        self.state.reset(slot, &mut self.rng);
        self.measured[slot] = false;
        Ok(())
    }

    fn capture_state(&mut self) -> BackendResult<StateDump> {
        let live: Vec<usize> = (0..self.allocator.width())
            .filter(|&slot| self.allocator.is_live(QubitId(slot as u32)))
            .collect();

        let amplitudes: Vec<(u64, Complex64)> = self
            .state
            .amplitudes()
            .iter()
            .enumerate()
            .filter(|(_, amp)| amp.norm_sqr() > ZERO_TOLERANCE)
            .map(|(index, amp)| {
                let compact = live
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| index & (1 << **slot) != 0)
                    .fold(0u64, |acc, (bit, _)| acc | (1 << bit));
                (compact, *amp)
            })
            .collect();

        debug!(qubits = live.len(), entries = amplitudes.len(), "Captured state");
        Ok(StateDump {
            qubit_count: live.len(),
            amplitudes,
        })
    }

    fn qubit_count(&self) -> usize {
        self.allocator.live_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> SimulatorBackend {
        SimulatorBackend::new().with_seed(42)
    }

    #[test]
    fn test_allocate_reuses_released_ids() {
        let mut sim = seeded();
        let a = sim.allocate().unwrap();
        let b = sim.allocate().unwrap();
        assert_eq!((a, b), (QubitId(0), QubitId(1)));

        sim.release(a).unwrap();
        assert_eq!(sim.qubit_count(), 1);
        assert_eq!(sim.allocate().unwrap(), QubitId(0));
    }

    #[test]
    fn test_release_requires_zero() {
        let mut sim = seeded();
        let q = sim.allocate().unwrap();
        sim.gate(&StandardGate::X, &[q]).unwrap();
        assert!(matches!(sim.release(q), Err(BackendError::QubitNotZero(_))));

        sim.reset(q).unwrap();
        sim.release(q).unwrap();
        assert_eq!(sim.qubit_count(), 0);
    }

    #[test]
    fn test_release_after_measurement() {
        let mut sim = seeded();
        let q = sim.allocate().unwrap();
        sim.gate(&StandardGate::X, &[q]).unwrap();
        assert_eq!(sim.measure(q).unwrap(), MeasurementResult::Known(true));
        sim.release(q).unwrap();

        // The slot comes back clean.
        let q = sim.allocate().unwrap();
        assert_eq!(sim.measure(q).unwrap(), MeasurementResult::Known(false));

        // A gate after the measurement makes the qubit live again.
        sim.gate(&StandardGate::X, &[q]).unwrap();
        assert!(matches!(sim.release(q), Err(BackendError::QubitNotZero(_))));
    }

    #[test]
    fn test_release_under_noise_resets() {
        let noise = PauliDistribution::new(1.0, 0.0, 0.0).unwrap();
        let mut sim = seeded().with_noise(noise);
        let q = sim.allocate().unwrap();
        // Uncomputed, but the noise leaves it in |1⟩.
        sim.gate(&StandardGate::H, &[q]).unwrap();
        sim.gate(&StandardGate::H, &[q]).unwrap();
        sim.release(q).unwrap();

        let q = sim.allocate().unwrap();
        assert!(sim.state.is_zero(q.index()));
    }

    #[test]
    fn test_max_qubits() {
        let mut sim = SimulatorBackend::with_max_qubits(2);
        sim.allocate().unwrap();
        sim.allocate().unwrap();
        assert!(matches!(
            sim.allocate(),
            Err(BackendError::TooManyQubits { max: 2 })
        ));
    }

    #[test]
    fn test_bell_measurements_agree() {
        let mut sim = seeded();
        for _ in 0..20 {
            let a = sim.allocate().unwrap();
            let b = sim.allocate().unwrap();
            sim.gate(&StandardGate::H, &[a]).unwrap();
            sim.gate(&StandardGate::CX, &[a, b]).unwrap();
            let ra = sim.mresetz(a).unwrap();
            let rb = sim.mresetz(b).unwrap();
            assert_eq!(ra, rb);
            sim.release(b).unwrap();
            sim.release(a).unwrap();
        }
    }

    #[test]
    fn test_gate_rejects_duplicates_and_unknown_qubits() {
        let mut sim = seeded();
        let q = sim.allocate().unwrap();
        assert!(matches!(
            sim.gate(&StandardGate::CX, &[q, q]),
            Err(BackendError::Ir(IrError::DuplicateQubit { .. }))
        ));
        assert!(matches!(
            sim.gate(&StandardGate::H, &[QubitId(5)]),
            Err(BackendError::UnknownQubit(_))
        ));
    }

    #[test]
    fn test_capture_state_compacts_live_qubits() {
        let mut sim = seeded();
        let _a = sim.allocate().unwrap();
        let b = sim.allocate().unwrap();
        let c = sim.allocate().unwrap();
        sim.release(b).unwrap();
        sim.gate(&StandardGate::X, &[c]).unwrap();

        let dump = sim.capture_state().unwrap();
        assert_eq!(dump.qubit_count, 2);
        assert_eq!(dump.amplitudes.len(), 1);
        assert_eq!(dump.amplitudes[0].0, 0b10);
    }

    #[test]
    fn test_bit_flip_noise_always_flips() {
        let noise = PauliDistribution::new(1.0, 0.0, 0.0).unwrap();
        let mut sim = seeded().with_noise(noise);
        let q = sim.allocate().unwrap();
        // I, then a forced X before the measurement: two flips cancel out
        sim.gate(&StandardGate::I, &[q]).unwrap();
        assert_eq!(sim.measure(q).unwrap(), MeasurementResult::Known(false));
    }

    #[test]
    fn test_seed_reproducible() {
        let sample = |seed| {
            let mut sim = SimulatorBackend::new().with_seed(seed);
            (0..32)
                .map(|_| {
                    let q = sim.allocate().unwrap();
                    sim.gate(&StandardGate::H, &[q]).unwrap();
                    let r = sim.mresetz(q).unwrap();
                    sim.release(q).unwrap();
                    r
                })
                .collect::<Vec<_>>()
        };
        assert_eq!(sample(9), sample(9));
    }

    #[test]
    fn test_reset_state_clears_register() {
        let mut sim = seeded();
        let q = sim.allocate().unwrap();
        sim.gate(&StandardGate::X, &[q]).unwrap();
        sim.reset_state();
        assert_eq!(sim.qubit_count(), 0);
        assert_eq!(sim.allocate().unwrap(), QubitId(0));
        assert!(sim.measure(QubitId(0)).unwrap() == MeasurementResult::Known(false));
    }
}
