use serde_json::{Map, Value};

use super::{FetchResponse, TransportError};

/// One successful API payload, keys in the order the API sent them.
pub type Record = Map<String, Value>;

/// Value of the body's `status` field that flags an API-level failure.
pub const ERROR_MARKER: &str = "ERROR";

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Record),
    Failed(Failure),
}

/// Why an identifier produced no record. None of these stop the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Failure {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("HTTP {status}")]
    Http { status: u16 },
    #[error("logical error: {message}")]
    Logical { message: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl Failure {
    /// Short label used in run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            Failure::Transport(_) => "transport",
            Failure::Http { .. } => "http",
            Failure::Logical { .. } => "logical",
            Failure::Malformed(_) => "malformed",
        }
    }
}

impl From<TransportError> for Failure {
    fn from(e: TransportError) -> Self {
        Failure::Transport(e.0)
    }
}

/// Decide what a single request amounted to.
///
/// A 2xx body must be a JSON object carrying a `status` field; anything else is
/// `Malformed` rather than silently counted as a success.
pub fn classify(result: Result<FetchResponse, TransportError>) -> Outcome {
    let resp = match result {
        Ok(r) => r,
        Err(e) => return Outcome::Failed(e.into()),
    };
    if !resp.is_success() {
        return Outcome::Failed(Failure::Http {
            status: resp.status,
        });
    }

    let record = match serde_json::from_str::<Value>(&resp.body) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            return Outcome::Failed(Failure::Malformed(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            )))
        }
        Err(e) => return Outcome::Failed(Failure::Malformed(e.to_string())),
    };

    match record.get("status") {
        None => Outcome::Failed(Failure::Malformed("missing `status` field".to_string())),
        Some(Value::String(s)) if s == ERROR_MARKER => Outcome::Failed(Failure::Logical {
            message: match record.get("message") {
                Some(Value::String(m)) => m.clone(),
                Some(Value::Null) | None => "no message".to_string(),
                Some(other) => other.to_string(),
            },
        }),
        Some(_) => Outcome::Success(record),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
