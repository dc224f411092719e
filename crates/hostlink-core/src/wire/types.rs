//! Command and response types exchanged with the host.
//!
//! [`Command`] serializes directly as the wire message. [`Response`] is the
//! canonical result handed back to the agent; its JSON form is
//! `{"outcome":"success","payload":..}` or `{"outcome":"error","reason":..}`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BridgeError, ErrorKind};

/// Ordered parameter map of a command.
pub type Parameters = Map<String, Value>;

/// One named command with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    #[serde(rename = "command")]
    pub name: String,
    #[serde(rename = "params", default)]
    pub parameters: Parameters,
}

impl Command {
    /// Create a command, rejecting an empty name.
    pub fn new(name: impl Into<String>, parameters: Parameters) -> Result<Self, BridgeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(BridgeError::UnknownOperation(
                "command name must not be empty".to_string(),
            ));
        }
        Ok(Self { name, parameters })
    }

    /// Create a command with no parameters.
    pub fn bare(name: impl Into<String>) -> Result<Self, BridgeError> {
        Self::new(name, Parameters::new())
    }

    /// Builder: add or replace one parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// String value of a parameter, if present and a string.
    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).and_then(Value::as_str)
    }
}

/// Details of a failed call.
///
/// Only `reason` is serialized; `kind` and the raw host value stay in-process
/// for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub reason: String,
    #[serde(skip)]
    pub kind: ErrorKind,
    #[serde(skip)]
    pub raw: Option<Value>,
}

impl Failure {
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            kind,
            raw: None,
        }
    }

    pub fn with_raw(mut self, raw: Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Canonical result of one call. Exactly one of payload/reason exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Response {
    Success { payload: Value },
    Error(Failure),
}

impl Response {
    pub fn success(payload: Value) -> Self {
        Response::Success { payload }
    }

    pub fn error(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Response::Error(Failure::new(kind, reason))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Response::Success { payload } => Some(payload),
            Response::Error(_) => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Response::Success { .. } => None,
            Response::Error(failure) => Some(&failure.reason),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Response::Success { .. } => None,
            Response::Error(failure) => Some(failure.kind),
        }
    }

    /// JSON form handed to the agent.
    pub fn to_value(&self) -> Value {
        match self {
            Response::Success { payload } => {
                serde_json::json!({ "outcome": "success", "payload": payload })
            }
            Response::Error(failure) => {
                serde_json::json!({ "outcome": "error", "reason": failure.reason })
            }
        }
    }
}

impl From<BridgeError> for Response {
    fn from(err: BridgeError) -> Self {
        Response::Error(Failure::new(err.kind(), err.to_string()))
    }
}
