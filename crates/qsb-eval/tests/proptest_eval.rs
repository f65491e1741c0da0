//! Property-based tests for classical evaluation.

use proptest::prelude::*;
use qsb_eval::{
    Backend, BackendError, BackendResult, Interpreter, MeasurementResult, NullReceiver, StateDump,
    Value,
};
use qsb_ir::{QubitId, StandardGate};

/// A backend for programs that never touch qubits.
struct Classical;

impl Backend for Classical {
    fn allocate(&mut self) -> BackendResult<QubitId> {
        Err(BackendError::TooManyQubits { max: 0 })
    }
    fn release(&mut self, qubit: QubitId) -> BackendResult<()> {
        Err(BackendError::UnknownQubit(qubit))
    }
    fn gate(&mut self, _gate: &StandardGate, qubits: &[QubitId]) -> BackendResult<()> {
        Err(BackendError::UnknownQubit(qubits[0]))
    }
    fn measure(&mut self, qubit: QubitId) -> BackendResult<MeasurementResult> {
        Err(BackendError::UnknownQubit(qubit))
    }
    fn reset(&mut self, qubit: QubitId) -> BackendResult<()> {
        Err(BackendError::UnknownQubit(qubit))
    }
    fn capture_state(&mut self) -> BackendResult<StateDump> {
        Ok(StateDump::default())
    }
    fn qubit_count(&self) -> usize {
        0
    }
}

fn eval(source: &str) -> Value {
    Interpreter::new(source)
        .unwrap()
        .eval_entry(&mut Classical, &mut NullReceiver)
        .unwrap()
}

proptest! {
    #[test]
    fn integer_arithmetic_matches_rust(a in -1000_i64..1000, b in 1_i64..1000) {
        let source = format!(
            "function Main() : (Int, Int, Int, Int) {{ ({a} + {b}, {a} - {b}, {a} * {b}, {a} / {b}) }}"
        );
        let expected = Value::Tuple(vec![
            Value::Int(a + b),
            Value::Int(a - b),
            Value::Int(a * b),
            Value::Int(a / b),
        ]);
        prop_assert_eq!(eval(&source), expected);
    }

    #[test]
    fn loop_sum_matches_formula(n in 0_i64..200) {
        let source = format!(
            "function Main() : Int {{ mutable s = 0; for i in 1..{n} {{ set s += i; }} s }}"
        );
        prop_assert_eq!(eval(&source), Value::Int(n * (n + 1) / 2));
    }

    #[test]
    fn reversed_twice_is_identity(values in prop::collection::vec(-50_i64..50, 0..16)) {
        let literal = values.iter().map(i64::to_string).collect::<Vec<_>>().join(", ");
        let source = format!("function Main() : Int[] {{ Reversed(Reversed([{literal}])) }}");
        let expected = Value::Array(values.into_iter().map(Value::Int).collect());
        prop_assert_eq!(eval(&source), expected);
    }
}
