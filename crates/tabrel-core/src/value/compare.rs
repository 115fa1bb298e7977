use crate::value::{Value, ValueTag};
use std::cmp::Ordering;

// Integer payload widened so signed and unsigned values compare exactly.
fn integral(value: &Value) -> Option<i128> {
    match value {
        Value::Int(v) => Some(i128::from(*v)),
        Value::Uint(v) => Some(i128::from(*v)),
        _ => None,
    }
}

#[expect(clippy::cast_precision_loss)]
fn numeric_cmp(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (integral(left), integral(right)) {
        return Some(l.cmp(&r));
    }

    let l = match left {
        Value::Float(v) => *v,
        _ => integral(left)? as f64,
    };
    let r = match right {
        Value::Float(v) => *v,
        _ => integral(right)? as f64,
    };

    Some(l.total_cmp(&r))
}

pub(super) fn canonical_cmp(left: &Value, right: &Value) -> Ordering {
    let (left_tag, right_tag) = (ValueTag::of(left), ValueTag::of(right));
    let rank = left_tag.family_rank().cmp(&right_tag.family_rank());
    if rank != Ordering::Equal {
        return rank;
    }

    match (left, right) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(l), Value::Bool(r)) => l.cmp(r),
        (Value::Text(l), Value::Text(r)) => l.cmp(r),
        (Value::Blob(l), Value::Blob(r)) => l.cmp(r),
        _ => numeric_cmp(left, right)
            .unwrap_or(Ordering::Equal)
            // an integer and a float of equal magnitude stay distinct
            .then_with(|| left_tag.to_u8().cmp(&right_tag.to_u8())),
    }
}

pub(super) fn compare_loose(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        (Value::Text(l), Value::Text(r)) => Some(l.cmp(r)),
        (Value::Blob(l), Value::Blob(r)) => Some(l.cmp(r)),
        _ => numeric_cmp(left, right),
    }
}
