//! Shape check for the status endpoint's payload.

use serde_json::Value;

use crate::watch::WatchError;

/// A payload that passed the shape check.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    /// Raw homework records, most recent first. Individual records are only
    /// interpreted when used.
    pub homeworks: Vec<Value>,
    /// Server time to use as the next cursor, when present as an integer.
    pub current_date: Option<i64>,
}

impl StatusReport {
    pub fn is_empty(&self) -> bool {
        self.homeworks.is_empty()
    }

    pub fn latest(&self) -> Option<&Value> {
        self.homeworks.first()
    }
}

pub fn check_response(payload: Value) -> Result<StatusReport, WatchError> {
    let mut fields = match payload {
        Value::Object(fields) => fields,
        other => {
            return Err(WatchError::Schema(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            )))
        }
    };

    let homeworks = match fields.remove("homeworks") {
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(WatchError::Schema(format!(
                "'homeworks' must be an array, got {}",
                json_type(&other)
            )))
        }
        None => return Err(WatchError::Schema("missing 'homeworks' field".into())),
    };

    let current_date = fields.get("current_date").and_then(Value::as_i64);

    Ok(StatusReport {
        homeworks,
        current_date,
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
