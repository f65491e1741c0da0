//! Adjoint and Controlled functor support.
//!
//! Controlled gates are expanded into the standard gate set with the usual
//! textbook decompositions. Only the cases below have a decomposition; any
//! other combination of gate and control count is rejected.
//!
//! | Gate | Controls | Expansion |
//! |------|----------|-----------|
//! | `X` | 1, 2 | `CX`, `CCX` |
//! | `CX` | 1 | `CCX` |
//! | `Y`, `Z` | 1 | `CY`, `CZ` |
//! | `Z`, `CZ` | 2 total | `H · CCX · H` |
//! | `Swap` | 1 | `CSwap` |
//! | `H` | 1 | `Ry(-π/4) · CZ · Ry(π/4)` |
//! | `Rx`, `Ry`, `Rz` | 1 | two `CX` with half-angle rotations |
//! | `S`, `T`, `R1` and inverses | 1 | controlled phase |

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use qsb_ir::{QubitId, StandardGate};

use super::GateOp;
use crate::error::{EvalError, EvalResult};
use crate::value::Value;

/// The adjoint of a recorded gate sequence.
pub(crate) fn invert(ops: Vec<GateOp>) -> Vec<GateOp> {
    ops.into_iter()
        .rev()
        .map(|(gate, qubits)| (gate.inverse(), qubits))
        .collect()
}

/// Split the arguments of a `Controlled` call into control qubits and the
/// inner argument list, once per applied functor.
pub(crate) fn peel_controls(
    count: u8,
    mut args: Vec<Value>,
) -> EvalResult<(Vec<QubitId>, Vec<Value>)> {
    let mut controls = Vec::new();
    for _ in 0..count {
        if args.len() < 2 {
            return Err(EvalError::ArityMismatch {
                name: "Controlled".into(),
                expected: 2,
                got: args.len(),
            });
        }
        let mut rest = args.split_off(1);
        controls.extend(args[0].as_qubits()?);
        args = if rest.len() == 1 {
            match rest.pop() {
                Some(Value::Tuple(items)) => items,
                Some(Value::Unit) | None => Vec::new(),
                Some(single) => vec![single],
            }
        } else {
            rest
        };
    }
    Ok((controls, args))
}

/// Expand `gate` on `targets` with the given control qubits.
pub(crate) fn controlled(
    gate: StandardGate,
    controls: &[QubitId],
    targets: &[QubitId],
) -> EvalResult<Vec<GateOp>> {
    use StandardGate as G;

    let unsupported = || {
        EvalError::NotSupported(format!(
            "Controlled {} with {} control qubit(s)",
            gate.name(),
            controls.len()
        ))
    };
    if targets.len() != gate.num_qubits() as usize {
        return Err(unsupported());
    }
    let t = targets;

    Ok(match (gate, controls) {
        (G::I, _) => Vec::new(),
        (G::X, [c]) => vec![(G::CX, vec![*c, t[0]])],
        (G::X, [c0, c1]) => vec![(G::CCX, vec![*c0, *c1, t[0]])],
        (G::CX, [c]) => vec![(G::CCX, vec![*c, t[0], t[1]])],
        (G::Y, [c]) => vec![(G::CY, vec![*c, t[0]])],
        (G::Z, [c]) => vec![(G::CZ, vec![*c, t[0]])],
        (G::Z, [c0, c1]) => doubly_controlled_z(*c0, *c1, t[0]),
        (G::CZ, [c]) => doubly_controlled_z(*c, t[0], t[1]),
        (G::Swap, [c]) => vec![(G::CSwap, vec![*c, t[0], t[1]])],
        (G::H, [c]) => vec![
            (G::Ry(-FRAC_PI_4), vec![t[0]]),
            (G::CZ, vec![*c, t[0]]),
            (G::Ry(FRAC_PI_4), vec![t[0]]),
        ],
        (G::Rz(theta), [c]) => controlled_rotation(G::Rz, theta, *c, t[0]),
        (G::Ry(theta), [c]) => controlled_rotation(G::Ry, theta, *c, t[0]),
        (G::Rx(theta), [c]) => {
            let mut ops = vec![(G::H, vec![t[0]])];
            ops.extend(controlled_rotation(G::Rz, theta, *c, t[0]));
            ops.push((G::H, vec![t[0]]));
            ops
        }
        (G::S, [c]) => controlled_phase(FRAC_PI_2, *c, t[0]),
        (G::Sdg, [c]) => controlled_phase(-FRAC_PI_2, *c, t[0]),
        (G::T, [c]) => controlled_phase(FRAC_PI_4, *c, t[0]),
        (G::Tdg, [c]) => controlled_phase(-FRAC_PI_4, *c, t[0]),
        (G::R1(theta), [c]) => controlled_phase(theta, *c, t[0]),
        _ => return Err(unsupported()),
    })
}

fn doubly_controlled_z(c0: QubitId, c1: QubitId, target: QubitId) -> Vec<GateOp> {
    vec![
        (StandardGate::H, vec![target]),
        (StandardGate::CCX, vec![c0, c1, target]),
        (StandardGate::H, vec![target]),
    ]
}

fn controlled_rotation(
    make: fn(f64) -> StandardGate,
    theta: f64,
    control: QubitId,
    target: QubitId,
) -> Vec<GateOp> {
    vec![
        (make(theta / 2.0), vec![target]),
        (StandardGate::CX, vec![control, target]),
        (make(-theta / 2.0), vec![target]),
        (StandardGate::CX, vec![control, target]),
    ]
}

fn controlled_phase(theta: f64, control: QubitId, target: QubitId) -> Vec<GateOp> {
    vec![
        (StandardGate::R1(theta / 2.0), vec![control]),
        (StandardGate::CX, vec![control, target]),
        (StandardGate::R1(-theta / 2.0), vec![target]),
        (StandardGate::CX, vec![control, target]),
        (StandardGate::R1(theta / 2.0), vec![target]),
    ]
}
