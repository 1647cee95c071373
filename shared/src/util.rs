use serde_json::Value;

/// Coerce a JSON number or numeric string into a finite `f64`
///
/// Returns `None` for anything else (including `NaN`/`inf` strings).
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

/// Trim and cap a string at `max` characters (not bytes)
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.trim().chars().take(max).collect()
}
