//! Runtime values.

use std::fmt;

use qsb_ir::QubitId;
use qsb_lang::ast::Pauli;

use crate::backend::MeasurementResult;
use crate::error::{EvalError, EvalResult};

/// What a callable value refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallableTarget {
    /// A built-in operation or function, by name.
    Intrinsic(&'static str),
    /// A user callable, by index into the interpreter's table.
    Global(usize),
    /// A callable declared inside a block, by index into the run's table.
    Local(usize),
}

/// A callable value with its functors applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallableRef {
    /// The target.
    pub target: CallableTarget,
    /// Display name.
    pub name: String,
    /// Whether an odd number of `Adjoint` functors has been applied.
    pub adjoint: bool,
    /// Number of `Controlled` functors applied.
    pub controlled: u8,
}

impl CallableRef {
    /// A plain reference without functors.
    pub fn new(target: CallableTarget, name: impl Into<String>) -> Self {
        Self {
            target,
            name: name.into(),
            adjoint: false,
            controlled: 0,
        }
    }
}

/// A value produced by evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Result(MeasurementResult),
    Pauli(Pauli),
    Qubit(QubitId),
    /// Inclusive range; open ends are filled in by slicing.
    Range {
        start: Option<i64>,
        step: i64,
        end: Option<i64>,
    },
    Array(Vec<Value>),
    Tuple(Vec<Value>),
    Callable(CallableRef),
}

impl Value {
    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "Unit",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Double(_) => "Double",
            Value::String(_) => "String",
            Value::Result(_) => "Result",
            Value::Pauli(_) => "Pauli",
            Value::Qubit(_) => "Qubit",
            Value::Range { .. } => "Range",
            Value::Array(_) => "Array",
            Value::Tuple(_) => "Tuple",
            Value::Callable(_) => "Callable",
        }
    }

    fn mismatch(&self, expected: &str) -> EvalError {
        EvalError::TypeMismatch {
            expected: expected.to_string(),
            found: format!("{} ({})", self.type_name(), self),
        }
    }

    pub fn as_bool(&self) -> EvalResult<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch("Bool")),
        }
    }

    pub fn as_int(&self) -> EvalResult<i64> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(other.mismatch("Int")),
        }
    }

    /// A double, accepting integers as well.
    pub fn as_double(&self) -> EvalResult<f64> {
        match self {
            Value::Double(d) => Ok(*d),
            Value::Int(i) => Ok(*i as f64),
            other => Err(other.mismatch("Double")),
        }
    }

    pub fn as_qubit(&self) -> EvalResult<QubitId> {
        match self {
            Value::Qubit(q) => Ok(*q),
            other => Err(other.mismatch("Qubit")),
        }
    }

    pub fn as_array(&self) -> EvalResult<&[Value]> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.mismatch("Array")),
        }
    }

    pub fn into_array(self) -> EvalResult<Vec<Value>> {
        match self {
            Value::Array(items) => Ok(items),
            other => Err(other.mismatch("Array")),
        }
    }

    /// A measurement result whose outcome must be known.
    ///
    /// `context` names the construct that needs the value.
    pub fn as_known_result(&self, context: &str) -> EvalResult<bool> {
        match self {
            Value::Result(MeasurementResult::Known(bit)) => Ok(*bit),
            Value::Result(MeasurementResult::Deferred(clbit)) => Err(EvalError::DeferredResult(
                clbit.to_string(),
                context.to_string(),
            )),
            other => Err(other.mismatch("Result")),
        }
    }

    /// Qubits contained in a `Qubit` or `Qubit[]` value.
    pub fn as_qubits(&self) -> EvalResult<Vec<QubitId>> {
        match self {
            Value::Qubit(q) => Ok(vec![*q]),
            Value::Array(items) => items.iter().map(Value::as_qubit).collect(),
            other => Err(other.mismatch("Qubit[]")),
        }
    }

    pub fn as_callable(&self) -> EvalResult<&CallableRef> {
        match self {
            Value::Callable(c) => Ok(c),
            other => Err(other.mismatch("Callable")),
        }
    }

    /// Iterate a range's elements. Both ends must be closed.
    pub fn range_iter(start: i64, step: i64, end: i64) -> EvalResult<impl Iterator<Item = i64>> {
        if step == 0 {
            return Err(EvalError::ZeroStep);
        }
        let mut current = Some(start);
        Ok(std::iter::from_fn(move || {
            let value = current?;
            let in_range = if step > 0 { value <= end } else { value >= end };
            if !in_range {
                return None;
            }
            current = value.checked_add(step);
            Some(value)
        }))
    }

    /// Deep equality as used by `==`.
    ///
    /// Deferred measurement results cannot be compared.
    pub fn try_eq(&self, other: &Value) -> EvalResult<bool> {
        match (self, other) {
            (Value::Result(_), Value::Result(_)) => {
                Ok(self.as_known_result("==")? == other.as_known_result("==")?)
            }
            (Value::Int(a), Value::Int(b)) => Ok(a == b),
            (Value::Double(a), Value::Double(b)) => Ok(a == b),
            (Value::Array(a), Value::Array(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                if a.len() != b.len() {
                    return Ok(false);
                }
                for (x, y) in a.iter().zip(b) {
                    if !x.try_eq(y)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => Ok(self == other),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::Double(d)
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "()"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Double(d) => {
                if d.is_finite() && d.fract() == 0.0 && d.abs() < 1e15 {
                    write!(f, "{d:.1}")
                } else {
                    write!(f, "{d}")
                }
            }
            Value::String(s) => write!(f, "{s}"),
            Value::Result(MeasurementResult::Known(false)) => write!(f, "Zero"),
            Value::Result(MeasurementResult::Known(true)) => write!(f, "One"),
            Value::Result(MeasurementResult::Deferred(clbit)) => write!(f, "Result({clbit})"),
            Value::Pauli(p) => write!(f, "Pauli{p:?}"),
            Value::Qubit(q) => write!(f, "Qubit{}", q.0),
            Value::Range { start, step, end } => {
                if let Some(start) = start {
                    write!(f, "{start}")?;
                }
                if *step != 1 {
                    write!(f, "..{step}")?;
                }
                match end {
                    Some(end) => write!(f, "..{end}"),
                    None => write!(f, "..."),
                }
            }
            Value::Array(items) => {
                write!(f, "[")?;
                write_list(f, items)?;
                write!(f, "]")
            }
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_list(f, items)?;
                write!(f, ")")
            }
            Value::Callable(c) => {
                if c.adjoint {
                    write!(f, "Adjoint ")?;
                }
                for _ in 0..c.controlled {
                    write!(f, "Controlled ")?;
                }
                write!(f, "{}", c.name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsb_ir::ClbitId;

    #[test]
    fn test_display() {
        assert_eq!(Value::Unit.to_string(), "()");
        assert_eq!(Value::Double(1.0).to_string(), "1.0");
        assert_eq!(Value::Double(0.25).to_string(), "0.25");
        assert_eq!(Value::Pauli(Pauli::X).to_string(), "PauliX");
        assert_eq!(Value::Qubit(QubitId(3)).to_string(), "Qubit3");

        let pair = Value::Tuple(vec![
            Value::Result(MeasurementResult::Known(true)),
            Value::Result(MeasurementResult::Known(false)),
        ]);
        assert_eq!(pair.to_string(), "(One, Zero)");

        let arr = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(arr.to_string(), "[1, 2]");
    }

    #[test]
    fn test_range_display() {
        let r = Value::Range {
            start: Some(0),
            step: 2,
            end: Some(10),
        };
        assert_eq!(r.to_string(), "0..2..10");
        let open = Value::Range {
            start: Some(1),
            step: 1,
            end: None,
        };
        assert_eq!(open.to_string(), "1...");
    }

    #[test]
    fn test_range_iter() {
        let up: Vec<_> = Value::range_iter(0, 2, 6).unwrap().collect();
        assert_eq!(up, vec![0, 2, 4, 6]);
        let down: Vec<_> = Value::range_iter(3, -1, 1).unwrap().collect();
        assert_eq!(down, vec![3, 2, 1]);
        let empty: Vec<_> = Value::range_iter(2, 1, 1).unwrap().collect();
        assert!(empty.is_empty());
        assert!(Value::range_iter(0, 0, 1).is_err());

        let top: Vec<_> = Value::range_iter(i64::MAX - 1, 1, i64::MAX).unwrap().collect();
        assert_eq!(top, vec![i64::MAX - 1, i64::MAX]);
    }

    #[test]
    fn test_deferred_result_cannot_compare() {
        let deferred = Value::Result(MeasurementResult::Deferred(ClbitId(0)));
        let one = Value::Result(MeasurementResult::Known(true));
        assert!(matches!(
            deferred.try_eq(&one),
            Err(EvalError::DeferredResult(_, _))
        ));
        assert!(one.try_eq(&one).unwrap());
    }
}
