//! Native scalar conversions.
//!
//! Conversions are lenient where the result is unambiguous (numeric strings,
//! bool ↔ number, anything → bool by truthiness) and refuse where a silent
//! zero would hide bad input (non-numeric strings, containers to numbers).
use crate::descriptor::ScalarKind;
use crate::value::Value;

/// True if `value` already has the runtime kind `kind` and needs no conversion.
pub fn matches_kind(kind: ScalarKind, value: &Value) -> bool {
    match kind {
        ScalarKind::String => matches!(value, Value::String(_)),
        ScalarKind::Int => matches!(value, Value::Int(_)),
        ScalarKind::Bool => matches!(value, Value::Bool(_)),
        ScalarKind::Float => matches!(value, Value::Float(_)),
        ScalarKind::Array => matches!(value, Value::Sequence(_) | Value::Collection(_) | Value::Map(_)),
    }
}

/// Convert `value` to `kind`. On failure returns the offending runtime kind.
pub fn coerce(kind: ScalarKind, value: Value) -> Result<Value, &'static str> {
    match kind {
        ScalarKind::String => to_string(value).map(Value::String),
        ScalarKind::Int => to_int(value).map(Value::Int),
        ScalarKind::Float => to_float(value).map(Value::Float),
        ScalarKind::Bool => Ok(Value::Bool(truthy(&value))),
        ScalarKind::Array => Ok(to_array(value)),
    }
}

fn to_string(value: Value) -> Result<String, &'static str> {
    match value {
        Value::String(s) => Ok(s),
        Value::Int(i) => Ok(i.to_string()),
        Value::Float(f) => Ok(f.to_string()),
        Value::Bool(true) => Ok("1".to_string()),
        Value::Bool(false) | Value::Null => Ok(String::new()),
        other => Err(other.kind_name()),
    }
}

fn to_int(value: Value) -> Result<i64, &'static str> {
    match value {
        Value::Int(i) => Ok(i),
        Value::Float(f) => float_to_int(f).ok_or("float"),
        Value::Bool(b) => Ok(b as i64),
        Value::Null => Ok(0),
        Value::String(s) => {
            let t = s.trim();
            t.parse::<i64>().ok()
                .or_else(|| t.parse::<f64>().ok().and_then(float_to_int))
                .ok_or("string")
        }
        other => Err(other.kind_name()),
    }
}

fn float_to_int(f: f64) -> Option<i64> {
    // `as` saturates; refuse instead of clamping
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

fn to_float(value: Value) -> Result<f64, &'static str> {
    match value {
        Value::Float(f) => Ok(f),
        Value::Int(i) => Ok(i as f64),
        Value::Bool(b) => Ok(if b { 1.0 } else { 0.0 }),
        Value::Null => Ok(0.0),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()).ok_or("string"),
        other => Err(other.kind_name()),
    }
}

/// Truthiness: empty, zero and `"0"` are false.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Map(m) => !m.is_empty(),
        Value::Sequence(xs) | Value::Collection(xs) => !xs.is_empty(),
        Value::Object(_) | Value::Enum(_) => true,
    }
}

fn to_array(value: Value) -> Value {
    match value {
        v @ (Value::Sequence(_) | Value::Collection(_) | Value::Map(_)) => v,
        Value::Null => Value::Sequence(Vec::new()),
        other => Value::Sequence(vec![other]),
    }
}

// ------------------------------- Tests ------------------------------------ //
