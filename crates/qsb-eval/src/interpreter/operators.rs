//! Classical operators on values.

use std::cmp::Ordering;

use qsb_lang::ast::{BinOp, UnOp};

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

pub(crate) fn unary(op: UnOp, operand: Value) -> EvalResult<Value> {
    Ok(match (op, operand) {
        (UnOp::Neg, Value::Int(i)) => Value::Int(i.wrapping_neg()),
        (UnOp::Neg, Value::Double(d)) => Value::Double(-d),
        (UnOp::Not, value) => Value::Bool(!value.as_bool()?),
        (UnOp::BitNot, value) => Value::Int(!value.as_int()?),
        (UnOp::Neg, value) => {
            return Err(EvalError::TypeMismatch {
                expected: "Int or Double".into(),
                found: value.to_string(),
            });
        }
    })
}

pub(crate) fn binary(op: BinOp, left: Value, right: Value) -> EvalResult<Value> {
    use Value::{Array, Bool, Double, Int, String};

    Ok(match op {
        BinOp::Eq => Bool(left.try_eq(&right)?),
        BinOp::NotEq => Bool(!left.try_eq(&right)?),
        BinOp::And => Bool(left.as_bool()? && right.as_bool()?),
        BinOp::Or => Bool(left.as_bool()? || right.as_bool()?),

        BinOp::Add => match (left, right) {
            (Int(a), Int(b)) => Int(a.wrapping_add(b)),
            (String(a), b) => String(a + &b.to_string()),
            (Array(mut a), Array(b)) => {
                a.extend(b);
                Array(a)
            }
            (a, b) => Double(a.as_double()? + b.as_double()?),
        },
        BinOp::Sub => match (left, right) {
            (Int(a), Int(b)) => Int(a.wrapping_sub(b)),
            (a, b) => Double(a.as_double()? - b.as_double()?),
        },
        BinOp::Mul => match (left, right) {
            (Int(a), Int(b)) => Int(a.wrapping_mul(b)),
            (a, b) => Double(a.as_double()? * b.as_double()?),
        },
        BinOp::Div => match (left, right) {
            (Int(_), Int(0)) => return Err(EvalError::DivisionByZero),
            (Int(a), Int(b)) => Int(a.wrapping_div(b)),
            (a, b) => Double(a.as_double()? / b.as_double()?),
        },
        BinOp::Mod => match (left, right) {
            (Int(_), Int(0)) => return Err(EvalError::DivisionByZero),
            (Int(a), Int(b)) => Int(a.wrapping_rem(b)),
            (a, b) => Double(a.as_double()? % b.as_double()?),
        },
        BinOp::Pow => match (left, right) {
            (Int(a), Int(b)) => {
                let exp = u32::try_from(b).map_err(|_| EvalError::TypeMismatch {
                    expected: "non-negative exponent".into(),
                    found: b.to_string(),
                })?;
                Int(a.wrapping_pow(exp))
            }
            (a, b) => Double(a.as_double()?.powf(b.as_double()?)),
        },

        BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => {
            let ordering = compare(&left, &right)?;
            Bool(match op {
                BinOp::Lt => ordering == Ordering::Less,
                BinOp::LtEq => ordering != Ordering::Greater,
                BinOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }

        BinOp::BitAnd => Int(left.as_int()? & right.as_int()?),
        BinOp::BitOr => Int(left.as_int()? | right.as_int()?),
        BinOp::BitXor => Int(left.as_int()? ^ right.as_int()?),
        BinOp::Shl => Int(left.as_int()?.wrapping_shl(shift_amount(&right)?)),
        BinOp::Shr => Int(left.as_int()?.wrapping_shr(shift_amount(&right)?)),
    })
}

fn shift_amount(value: &Value) -> EvalResult<u32> {
    let amount = value.as_int()?;
    u32::try_from(amount).map_err(|_| EvalError::TypeMismatch {
        expected: "non-negative shift".into(),
        found: amount.to_string(),
    })
}

fn compare(left: &Value, right: &Value) -> EvalResult<Ordering> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
        (a, b) => {
            let (a, b) = (a.as_double()?, b.as_double()?);
            a.partial_cmp(&b).ok_or_else(|| EvalError::TypeMismatch {
                expected: "comparable numbers".into(),
                found: format!("{a}, {b}"),
            })
        }
    }
}

fn checked_index(index: i64, len: usize) -> EvalResult<usize> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < len)
        .ok_or(EvalError::IndexOutOfRange { index, len })
}

/// `target[index]` for an integer or a range index.
pub(crate) fn index(target: Value, index: Value) -> EvalResult<Value> {
    let items = target.into_array()?;
    match index {
        Value::Int(i) => {
            let i = checked_index(i, items.len())?;
            Ok(items.into_iter().nth(i).unwrap_or(Value::Unit))
        }
        Value::Range { start, step, end } => {
            let last = items.len() as i64 - 1;
            let (start, end) = if step > 0 {
                (start.unwrap_or(0), end.unwrap_or(last))
            } else {
                (start.unwrap_or(last), end.unwrap_or(0))
            };
            let mut slice = Vec::new();
            for i in Value::range_iter(start, step, end)? {
                slice.push(items[checked_index(i, items.len())?].clone());
            }
            Ok(Value::Array(slice))
        }
        other => Err(EvalError::TypeMismatch {
            expected: "Int or Range index".into(),
            found: other.to_string(),
        }),
    }
}

/// Copy-and-update `target w/ index <- value`.
pub(crate) fn update(target: Value, index: Value, value: Value) -> EvalResult<Value> {
    let mut items = target.into_array()?;
    let i = checked_index(index.as_int()?, items.len())?;
    items[i] = value;
    Ok(Value::Array(items))
}

/// Elements visited by a `for` loop.
pub(crate) fn iterate(value: Value) -> EvalResult<Box<dyn Iterator<Item = Value>>> {
    match value {
        Value::Array(items) => Ok(Box::new(items.into_iter())),
        Value::Range {
            start: Some(start),
            step,
            end: Some(end),
        } => Ok(Box::new(Value::range_iter(start, step, end)?.map(Value::Int))),
        other => Err(EvalError::TypeMismatch {
            expected: "Array or closed Range".into(),
            found: other.to_string(),
        }),
    }
}
