//! qsbridge local statevector simulator
//!
//! A dense statevector backend for the evaluator. Qubits are allocated and
//! released while the program runs, so the register only ever holds the
//! qubits that are live at that moment (up to `max_qubits`).
//!
//! # Features
//!
//! - **Exact Simulation**: Full statevector representation
//! - **Dynamic Allocation**: Released ids are reused lowest-first
//! - **Seeded Sampling**: One `StdRng` stream per backend for reproducible shots
//! - **Pauli Noise**: Optional X/Y/Z error channel after gates and before measurement
//!
//! # Performance
//!
//! | Qubits | Memory | Simulation Speed |
//! |--------|--------|------------------|
//! | 10 | ~16 KB | Instant |
//! | 15 | ~512 KB | Fast |
//! | 20 | ~16 MB | Moderate |
//! | 25 | ~512 MB | Slow |
//!
//! # Example
//!
//! ```rust
//! use qsb_eval::{Backend, MeasurementResult};
//! use qsb_ir::StandardGate;
//! use qsb_sim::SimulatorBackend;
//!
//! let mut sim = SimulatorBackend::new().with_seed(7);
//! let a = sim.allocate().unwrap();
//! let b = sim.allocate().unwrap();
//! sim.gate(&StandardGate::H, &[a]).unwrap();
//! sim.gate(&StandardGate::CX, &[a, b]).unwrap();
//!
//! // Bell pair: both halves always agree
//! let ra = sim.mresetz(a).unwrap();
//! let rb = sim.mresetz(b).unwrap();
//! assert_eq!(ra, rb);
//! assert!(matches!(ra, MeasurementResult::Known(_)));
//! ```

mod simulator;
pub mod statevector;

pub use simulator::{DEFAULT_MAX_QUBITS, SimulatorBackend};
pub use statevector::Statevector;
