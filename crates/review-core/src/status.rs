use serde_json::Value;

use crate::catalog::HomeworkStatus;
use crate::watch::WatchError;

/// The fields of a homework record the watcher cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeworkRecord {
    pub name: String,
    pub status: HomeworkStatus,
}

impl HomeworkRecord {
    pub fn from_value(record: &Value) -> Result<Self, WatchError> {
        let name = string_field(record, "homework_name")?;
        let status = string_field(record, "status")?;
        let status = status
            .parse::<HomeworkStatus>()
            .map_err(|e| WatchError::Parse(e.to_string()))?;

        Ok(Self {
            name: name.to_string(),
            status,
        })
    }

    pub fn message(&self) -> String {
        format!("Status changed for \"{}\": {}", self.name, self.status.verdict())
    }
}

fn string_field<'a>(record: &'a Value, key: &str) -> Result<&'a str, WatchError> {
    match record.get(key) {
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(WatchError::Parse(format!("'{key}' is not a string"))),
        None => Err(WatchError::Parse(format!("missing '{key}' field"))),
    }
}

/// Renders the notification text for one homework record.
pub fn parse_status(record: &Value) -> Result<String, WatchError> {
    HomeworkRecord::from_value(record).map(|r| r.message())
}
