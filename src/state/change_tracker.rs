//! ChangeTracker - Structural Dirty Comparison
//!
//! Pure comparison of JSON-like values. Object key order never matters,
//! array order always does, and numbers compare by value so `1` equals
//! `1.0`. An absent value (not loaded yet) is distinct from JSON `null`.

use serde_json::Value;

/// Whether `current` differs structurally from `baseline`
pub fn is_dirty(baseline: Option<&Value>, current: Option<&Value>) -> bool {
    match (baseline, current) {
        (None, None) => false,
        (Some(a), Some(b)) => !values_equal(a, b),
        _ => true,
    }
}

/// Recursive structural equality over JSON values
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(fx), Some(fy)) if x.is_f64() || y.is_f64() => fx == fy,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(key, x)| ym.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => false,
    }
}
