//! Built-in operations and functions.

use std::f64::consts::{E, PI};

use qsb_ir::{QubitId, StandardGate};
use qsb_lang::ast::Pauli;

use super::{Evaluator, Exec};
use crate::backend::MeasurementResult;
use crate::error::{EvalError, EvalResult};
use crate::value::{CallableRef, Value};

/// Built-in callables and whether each one is an operation.
const INTRINSICS: &[(&str, bool)] = &[
    // Gates
    ("I", true),
    ("X", true),
    ("Y", true),
    ("Z", true),
    ("H", true),
    ("S", true),
    ("T", true),
    ("Rx", true),
    ("Ry", true),
    ("Rz", true),
    ("R1", true),
    ("CNOT", true),
    ("CX", true),
    ("CY", true),
    ("CZ", true),
    ("CCNOT", true),
    ("SWAP", true),
    ("Rxx", true),
    ("Ryy", true),
    ("Rzz", true),
    // Measurement and reset
    ("M", true),
    ("MResetZ", true),
    ("MResetEachZ", true),
    ("MeasureEachZ", true),
    ("Measure", true),
    ("Reset", true),
    ("ResetAll", true),
    ("ApplyToEach", true),
    // Diagnostics
    ("Message", false),
    ("DumpMachine", false),
    ("Fact", false),
    // Classical
    ("Length", false),
    ("IntAsDouble", false),
    ("ResultAsBool", false),
    ("BoolAsResult", false),
    ("ResultArrayAsInt", false),
    ("PI", false),
    ("E", false),
    ("Sqrt", false),
    ("Sin", false),
    ("Cos", false),
    ("Tan", false),
    ("ArcSin", false),
    ("ArcCos", false),
    ("ArcTan", false),
    ("ArcTan2", false),
    ("Log", false),
    ("Exp", false),
    ("AbsI", false),
    ("AbsD", false),
    ("Floor", false),
    ("Ceiling", false),
    ("Round", false),
    ("Truncate", false),
    ("MinI", false),
    ("MaxI", false),
    ("MinD", false),
    ("MaxD", false),
    ("Reversed", false),
    ("Head", false),
    ("Tail", false),
    ("IndexRange", false),
];

const ROTATIONS: &[&str] = &["Rx", "Ry", "Rz", "R1", "Rxx", "Ryy", "Rzz"];

/// Canonical name of a built-in, if `name` is one.
pub(crate) fn lookup(name: &str) -> Option<&'static str> {
    INTRINSICS
        .iter()
        .find(|(intrinsic, _)| *intrinsic == name)
        .map(|(intrinsic, _)| *intrinsic)
}

fn is_operation(name: &str) -> bool {
    INTRINSICS
        .iter()
        .any(|(intrinsic, operation)| *intrinsic == name && *operation)
}

fn take<const N: usize>(name: &str, args: Vec<Value>) -> EvalResult<[Value; N]> {
    args.try_into().map_err(|args: Vec<Value>| EvalError::ArityMismatch {
        name: name.to_string(),
        expected: N,
        got: args.len(),
    })
}

/// The gate and operands for a gate intrinsic, or `None` for anything else.
fn gate_call(name: &str, args: &[Value]) -> EvalResult<Option<(StandardGate, Vec<QubitId>)>> {
    let rotation = ROTATIONS.contains(&name);
    let (theta, operands) = match (rotation, args.split_first()) {
        (true, Some((theta, rest))) => (theta.as_double()?, rest),
        (true, None) => {
            return Err(EvalError::ArityMismatch {
                name: name.to_string(),
                expected: 2,
                got: 0,
            });
        }
        (false, _) => (0.0, args),
    };

    let gate = match name {
        "I" => StandardGate::I,
        "X" => StandardGate::X,
        "Y" => StandardGate::Y,
        "Z" => StandardGate::Z,
        "H" => StandardGate::H,
        "S" => StandardGate::S,
        "T" => StandardGate::T,
        "Rx" => StandardGate::Rx(theta),
        "Ry" => StandardGate::Ry(theta),
        "Rz" => StandardGate::Rz(theta),
        "R1" => StandardGate::R1(theta),
        "CNOT" | "CX" => StandardGate::CX,
        "CY" => StandardGate::CY,
        "CZ" => StandardGate::CZ,
        "CCNOT" => StandardGate::CCX,
        "SWAP" => StandardGate::Swap,
        "Rxx" => StandardGate::RXX(theta),
        "Ryy" => StandardGate::RYY(theta),
        "Rzz" => StandardGate::RZZ(theta),
        _ => return Ok(None),
    };

    let expected = gate.num_qubits() as usize;
    if operands.len() != expected {
        return Err(EvalError::ArityMismatch {
            name: name.to_string(),
            expected: expected + usize::from(rotation),
            got: args.len(),
        });
    }
    let qubits = operands
        .iter()
        .map(Value::as_qubit)
        .collect::<EvalResult<Vec<_>>>()?;
    Ok(Some((gate, qubits)))
}

impl<'a> Evaluator<'a> {
    pub(super) fn call_intrinsic(
        &mut self,
        name: &'static str,
        callee: &CallableRef,
        args: Vec<Value>,
    ) -> Exec<Value> {
        if is_operation(name) {
            self.ensure_quantum(name)?;
        }
        let (controls, args) = super::functor::peel_controls(callee.controlled, args)?;

        if let Some((gate, qubits)) = gate_call(name, &args)? {
            let gate = if callee.adjoint { gate.inverse() } else { gate };
            self.apply_gate(gate, &qubits, &controls)?;
            return Ok(Value::Unit);
        }

        if name == "ApplyToEach" {
            return self.apply_to_each(callee, controls, args);
        }

        if callee.adjoint || !controls.is_empty() {
            return Err(EvalError::FunctorNotSupported {
                functor: if callee.adjoint { "Adjoint" } else { "Controlled" }.into(),
                target: name.into(),
            }
            .into());
        }

        match name {
            "M" | "MResetZ" => {
                let [qubit] = take(name, args)?;
                let result = self.measure(qubit.as_qubit()?, name == "MResetZ")?;
                Ok(Value::Result(result))
            }
            "MResetEachZ" | "MeasureEachZ" => {
                let [qubits] = take(name, args)?;
                let mut results = vec![];
                for qubit in qubits.as_qubits()? {
                    let result = self.measure(qubit, name == "MResetEachZ")?;
                    results.push(Value::Result(result));
                }
                Ok(Value::Array(results))
            }
            "Measure" => {
                let [bases, qubits] = take(name, args)?;
                self.measure_pauli(&bases, &qubits)
            }
            "Reset" => {
                let [qubit] = take(name, args)?;
                self.reset(qubit.as_qubit()?)?;
                Ok(Value::Unit)
            }
            "ResetAll" => {
                let [qubits] = take(name, args)?;
                for qubit in qubits.as_qubits()? {
                    self.reset(qubit)?;
                }
                Ok(Value::Unit)
            }
            "Message" => {
                let [msg] = take(name, args)?;
                self.receiver.message(&msg.to_string());
                Ok(Value::Unit)
            }
            "DumpMachine" => {
                let dump = self.backend.capture_state()?;
                self.receiver.state(&dump);
                Ok(Value::Unit)
            }
            "Fact" => {
                let [condition, msg] = take(name, args)?;
                if !condition.as_bool()? {
                    return Err(EvalError::UserFail(msg.to_string()).into());
                }
                Ok(Value::Unit)
            }
            _ => Ok(classical(name, args)?),
        }
    }

    fn apply_to_each(
        &mut self,
        callee: &CallableRef,
        controls: Vec<QubitId>,
        args: Vec<Value>,
    ) -> Exec<Value> {
        let [op, register] = take("ApplyToEach", args)?;
        let mut inner = op.as_callable()?.clone();
        inner.adjoint ^= callee.adjoint;
        if !controls.is_empty() {
            inner.controlled = inner.controlled.saturating_add(1);
        }
        let control_array = Value::Array(controls.iter().copied().map(Value::Qubit).collect());

        for target in register.into_array()? {
            let args = if controls.is_empty() {
                vec![target]
            } else {
                vec![control_array.clone(), target]
            };
            self.call(&inner, args)?;
        }
        Ok(Value::Unit)
    }

    /// Single-qubit `Measure([basis], [qubit])`.
    fn measure_pauli(&mut self, bases: &Value, qubits: &Value) -> Exec<Value> {
        let (basis, qubit) = match (bases.as_array()?, qubits.as_qubits()?.as_slice()) {
            ([Value::Pauli(basis)], [qubit]) => (*basis, *qubit),
            _ => {
                return Err(EvalError::NotSupported(
                    "Measure is limited to a single qubit in a single Pauli basis".into(),
                )
                .into());
            }
        };

        let (before, after): (&[StandardGate], &[StandardGate]) = match basis {
            Pauli::I => return Ok(Value::Result(MeasurementResult::Known(false))),
            Pauli::Z => (&[], &[]),
            Pauli::X => (&[StandardGate::H], &[StandardGate::H]),
            Pauli::Y => (
                &[StandardGate::Sdg, StandardGate::H],
                &[StandardGate::H, StandardGate::S],
            ),
        };
        for gate in before {
            self.apply_gate(*gate, &[qubit], &[])?;
        }
        let result = self.measure(qubit, false)?;
        for gate in after {
            self.apply_gate(*gate, &[qubit], &[])?;
        }
        Ok(Value::Result(result))
    }
}

fn double_fn(name: &str, args: Vec<Value>, f: fn(f64) -> f64) -> EvalResult<Value> {
    let [x] = take(name, args)?;
    Ok(Value::Double(f(x.as_double()?)))
}

fn rounding(name: &str, args: Vec<Value>, f: fn(f64) -> f64) -> EvalResult<Value> {
    let [x] = take(name, args)?;
    Ok(Value::Int(f(x.as_double()?) as i64))
}

fn classical(name: &str, args: Vec<Value>) -> EvalResult<Value> {
    Ok(match name {
        "PI" => {
            take::<0>(name, args)?;
            Value::Double(PI)
        }
        "E" => {
            take::<0>(name, args)?;
            Value::Double(E)
        }
        "Sqrt" => double_fn(name, args, f64::sqrt)?,
        "Sin" => double_fn(name, args, f64::sin)?,
        "Cos" => double_fn(name, args, f64::cos)?,
        "Tan" => double_fn(name, args, f64::tan)?,
        "ArcSin" => double_fn(name, args, f64::asin)?,
        "ArcCos" => double_fn(name, args, f64::acos)?,
        "ArcTan" => double_fn(name, args, f64::atan)?,
        "Log" => double_fn(name, args, f64::ln)?,
        "Exp" => double_fn(name, args, f64::exp)?,
        "AbsD" => double_fn(name, args, f64::abs)?,
        "ArcTan2" => {
            let [y, x] = take(name, args)?;
            Value::Double(y.as_double()?.atan2(x.as_double()?))
        }
        "Floor" => rounding(name, args, f64::floor)?,
        "Ceiling" => rounding(name, args, f64::ceil)?,
        "Round" => rounding(name, args, f64::round)?,
        "Truncate" => rounding(name, args, f64::trunc)?,
        "AbsI" => {
            let [x] = take(name, args)?;
            Value::Int(x.as_int()?.wrapping_abs())
        }
        "MinI" | "MaxI" => {
            let [a, b] = take(name, args)?;
            let (a, b) = (a.as_int()?, b.as_int()?);
            Value::Int(if name == "MinI" { a.min(b) } else { a.max(b) })
        }
        "MinD" | "MaxD" => {
            let [a, b] = take(name, args)?;
            let (a, b) = (a.as_double()?, b.as_double()?);
            Value::Double(if name == "MinD" { a.min(b) } else { a.max(b) })
        }
        "IntAsDouble" => {
            let [x] = take(name, args)?;
            Value::Double(x.as_int()? as f64)
        }
        "ResultAsBool" => {
            let [r] = take(name, args)?;
            Value::Bool(r.as_known_result(name)?)
        }
        "BoolAsResult" => {
            let [b] = take(name, args)?;
            Value::Result(MeasurementResult::Known(b.as_bool()?))
        }
        "ResultArrayAsInt" => {
            let [results] = take(name, args)?;
            let mut number = 0i64;
            for (i, r) in results.as_array()?.iter().enumerate() {
                if r.as_known_result(name)? {
                    number |= 1i64.wrapping_shl(i as u32);
                }
            }
            Value::Int(number)
        }
        "Length" => {
            let [arr] = take(name, args)?;
            Value::Int(arr.as_array()?.len() as i64)
        }
        "Reversed" => {
            let [arr] = take(name, args)?;
            let mut items = arr.into_array()?;
            items.reverse();
            Value::Array(items)
        }
        "Head" | "Tail" => {
            let [arr] = take(name, args)?;
            let items = arr.into_array()?;
            let len = items.len();
            let item = if name == "Head" {
                items.into_iter().next()
            } else {
                items.into_iter().last()
            };
            item.ok_or(EvalError::IndexOutOfRange { index: 0, len })?
        }
        "IndexRange" => {
            let [arr] = take(name, args)?;
            Value::Range {
                start: Some(0),
                step: 1,
                end: Some(arr.as_array()?.len() as i64 - 1),
            }
        }
        other => return Err(EvalError::UnknownIdentifier(other.to_string())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("CNOT"), Some("CNOT"));
        assert_eq!(lookup("Foo"), None);
        assert!(is_operation("MResetZ"));
        assert!(!is_operation("Message"));
    }

    #[test]
    fn test_gate_call_arity() {
        let q = Value::Qubit(QubitId(0));
        let (gate, qubits) = gate_call("Rz", &[Value::Double(0.5), q.clone()])
            .unwrap()
            .unwrap();
        assert_eq!(gate, StandardGate::Rz(0.5));
        assert_eq!(qubits, vec![QubitId(0)]);

        assert!(matches!(
            gate_call("CNOT", &[q.clone()]),
            Err(EvalError::ArityMismatch { expected: 2, got: 1, .. })
        ));
        assert!(gate_call("Message", &[q]).unwrap().is_none());
    }

    #[test]
    fn test_classical_math() {
        assert_eq!(
            classical("MaxI", vec![Value::Int(3), Value::Int(9)]).unwrap(),
            Value::Int(9)
        );
        assert_eq!(classical("Floor", vec![Value::Double(2.7)]).unwrap(), Value::Int(2));
        assert_eq!(classical("Round", vec![Value::Double(2.5)]).unwrap(), Value::Int(3));

        let bits = Value::Array(vec![
            Value::Result(MeasurementResult::Known(true)),
            Value::Result(MeasurementResult::Known(false)),
            Value::Result(MeasurementResult::Known(true)),
        ]);
        assert_eq!(classical("ResultArrayAsInt", vec![bits]).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_head_of_empty_array_fails() {
        let err = classical("Head", vec![Value::Array(vec![])]).unwrap_err();
        assert!(matches!(err, EvalError::IndexOutOfRange { len: 0, .. }));
    }
}
