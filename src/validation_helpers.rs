use crate::violation_types::{ValidationContext, ValidationError};
use serde_json::Value;
use tracing::debug;

/// JSON type name of a value, as reported in type mismatch messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Renders a value for messages: strings bare, everything else as JSON
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Extends a field path with a property name (`a` + `b` = `a.b`)
pub fn property_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}

/// Extends a field path with an array index (`a` + 0 = `a[0]`)
pub fn index_path(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}

/// Logs violations with their kind and flattens them to messages
pub fn into_messages(errors: Vec<ValidationError>, context: ValidationContext) -> Vec<String> {
    errors
        .into_iter()
        .map(|e| {
            debug!(
                context = context.as_str(),
                kind = e.kind.as_str(),
                path = %e.path,
                "{}",
                e.message
            );
            e.message
        })
        .collect()
}
