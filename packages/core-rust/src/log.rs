//! Structured log entries written once per handled call.
//!
//! Entries carry a sanitized snapshot of the operation parameters. Nested
//! objects are dropped and pipeline steps are reduced to `{type, params}`,
//! which bounds entry size and keeps structured payloads out of the log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity recorded for calls that never authenticated.
pub const ANONYMOUS: &str = "anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutcome {
    Success,
    Error,
}

/// One immutable record of a completed or failed call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    /// Authenticated email, or [`ANONYMOUS`].
    pub user: String,
    pub endpoint: String,
    pub params: Map<String, Value>,
    /// Elapsed wall-clock time in milliseconds.
    pub duration: u64,
    pub result: LogOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LogEntry {
    #[must_use]
    pub fn success(
        user: impl Into<String>,
        endpoint: impl Into<String>,
        params: Map<String, Value>,
        duration: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level: LogLevel::Info,
            user: user.into(),
            endpoint: endpoint.into(),
            params,
            duration,
            result: LogOutcome::Success,
            message: None,
        }
    }

    #[must_use]
    pub fn failure(
        user: impl Into<String>,
        endpoint: impl Into<String>,
        params: Map<String, Value>,
        duration: u64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level: LogLevel::Error,
            user: user.into(),
            endpoint: endpoint.into(),
            params,
            duration,
            result: LogOutcome::Error,
            message: Some(message.into()),
        }
    }
}

/// Reduces a parameter object to a loggable snapshot.
///
/// - `operations` arrays are mapped to `{type, params}` per step.
/// - Any other top-level value that is a JSON object is omitted.
/// - Scalars, nulls and arrays are kept as-is.
///
/// Non-object input yields an empty snapshot.
#[must_use]
pub fn sanitize_params(params: &Value) -> Map<String, Value> {
    let Value::Object(fields) = params else {
        return Map::new();
    };

    let mut sanitized = Map::new();
    for (key, value) in fields {
        match value {
            Value::Array(steps) if key == "operations" => {
                let reduced = steps.iter().map(reduce_step).collect();
                sanitized.insert(key.clone(), Value::Array(reduced));
            }
            Value::Object(_) => {}
            other => {
                sanitized.insert(key.clone(), other.clone());
            }
        }
    }
    sanitized
}

fn reduce_step(step: &Value) -> Value {
    let mut reduced = Map::new();
    for key in ["type", "params"] {
        if let Some(value) = step.get(key) {
            reduced.insert(key.to_string(), value.clone());
        }
    }
    Value::Object(reduced)
}
