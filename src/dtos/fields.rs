use serde_json::Value;

/// Presence check with loose truthiness: absent, `null`, `false`, `0` and `""`
/// all count as missing.
pub fn present(field: &Option<Value>) -> Option<&Value> {
    field.as_ref().filter(|value| !is_falsy(value))
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Strings as-is, `null` as empty, anything else as its JSON text.
pub fn text_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
