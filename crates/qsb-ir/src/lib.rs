//! qsbridge circuit intermediate representation
//!
//! This crate holds the data structures shared by the simulator and the
//! code generators: qubit and classical bit ids, the standard gate set,
//! instructions, circuits and Pauli noise.
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qsb_ir::{Circuit, ClbitId, QubitId, StandardGate};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//!
//! // |00⟩ → (|00⟩ + |11⟩)/√2
//! circuit.gate(StandardGate::H, [QubitId(0)]).unwrap();
//! circuit.gate(StandardGate::CX, [QubitId(0), QubitId(1)]).unwrap();
//!
//! circuit.measure(QubitId(0), ClbitId(0)).unwrap();
//! circuit.measure(QubitId(1), ClbitId(1)).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3);
//! ```
//!
//! # Supported Gates
//!
//! | Gate | Qubits | Description |
//! |------|--------|-------------|
//! | `I` | 1 | Identity |
//! | `X`, `Y`, `Z` | 1 | Pauli gates |
//! | `H` | 1 | Hadamard gate |
//! | `S`, `Sdg` | 1 | S and S-dagger gates |
//! | `T`, `Tdg` | 1 | T and T-dagger gates |
//! | `Rx`, `Ry`, `Rz` | 1 | Rotation gates |
//! | `R1` | 1 | Phase gate |
//! | `CX` | 2 | Controlled-NOT (CNOT) |
//! | `CY`, `CZ` | 2 | Controlled-Y and Controlled-Z |
//! | `Swap` | 2 | SWAP gate |
//! | `RXX`, `RYY`, `RZZ` | 2 | Two-qubit Ising rotations |
//! | `CCX` | 3 | Toffoli (CCNOT) gate |
//! | `CSwap` | 3 | Fredkin gate |

pub mod circuit;
pub mod error;
pub mod gate;
pub mod instruction;
pub mod noise;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::StandardGate;
pub use instruction::{Instruction, InstructionKind};
pub use noise::{Noise, PauliDistribution};
pub use qubit::{Clbit, ClbitId, Qubit, QubitId};
