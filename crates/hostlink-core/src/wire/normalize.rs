//! Host reply normalisation.
//!
//! Different host command families report results in different shapes. Each
//! known shape has one adapter; anything else object-shaped is treated as an
//! opaque success payload.

use serde_json::{Map, Value};

use super::types::{Failure, Response};
use crate::error::ErrorKind;

const NO_REASON: &str = "host reported failure without a reason";

/// Known upstream reply shapes, checked in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostShape {
    /// `{"outcome": "success"|"error", "payload"|"reason": ..}`
    Canonical,
    /// `{"status": "success"|"error", "result"?: .., "error"|"message"?: ..}`
    StatusEnvelope,
    /// `{"success": bool, ..}`
    SuccessFlag,
    Opaque,
}

impl HostShape {
    fn detect(obj: &Map<String, Value>) -> Self {
        if obj.get("outcome").and_then(Value::as_str).is_some() {
            HostShape::Canonical
        } else if obj.get("status").and_then(Value::as_str).is_some() {
            HostShape::StatusEnvelope
        } else if obj.get("success").is_some_and(Value::is_boolean) {
            HostShape::SuccessFlag
        } else {
            HostShape::Opaque
        }
    }
}

/// Convert any decoded host reply into a canonical [`Response`].
pub fn normalize(raw: Value) -> Response {
    let Value::Object(obj) = &raw else {
        return Response::error(
            ErrorKind::DecodeFailed,
            format!(
                "failed to decode host response: expected a JSON object, got {}",
                type_name(&raw)
            ),
        );
    };

    let shape = HostShape::detect(obj);
    let outcome = match shape {
        HostShape::Canonical => match obj.get("outcome").and_then(Value::as_str) {
            Some("error") => Err(reason_of(obj)),
            _ => Ok(obj.get("payload").cloned().unwrap_or(Value::Null)),
        },
        HostShape::StatusEnvelope => match obj.get("status").and_then(Value::as_str) {
            Some("error") => Err(reason_of(obj)),
            _ => match obj.get("result") {
                // The bridge wraps command results; a command can still flag
                // its own failure inside the envelope.
                Some(Value::Object(inner)) if inner_failed(inner) => Err(reason_of(inner)),
                Some(result) => Ok(result.clone()),
                None => Ok(Value::Object(without(obj, "status"))),
            },
        },
        HostShape::SuccessFlag => {
            if obj.get("success") == Some(&Value::Bool(true)) {
                Ok(obj.get("result").cloned().unwrap_or_else(|| raw.clone()))
            } else {
                Err(reason_of(obj))
            }
        }
        HostShape::Opaque => Ok(raw.clone()),
    };

    match outcome {
        Ok(payload) => Response::success(payload),
        Err(reason) => {
            tracing::debug!(?shape, %reason, "Host reported failure");
            Response::Error(Failure::new(ErrorKind::HostReportedFailure, reason).with_raw(raw))
        }
    }
}

/// A wrapped command result that reports its own failure, either as
/// `success: false` or as `status: "error"`.
fn inner_failed(inner: &Map<String, Value>) -> bool {
    inner.get("success") == Some(&Value::Bool(false))
        || inner.get("status").and_then(Value::as_str) == Some("error")
}

/// Most specific non-empty reason: `error`, then `message`, then `reason`.
fn reason_of(obj: &Map<String, Value>) -> String {
    ["error", "message", "reason"]
        .iter()
        .filter_map(|key| obj.get(*key))
        .find_map(text_of)
        .unwrap_or_else(|| NO_REASON.to_string())
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(inner) => inner.get("message").and_then(text_of),
        _ => None,
    }
}

fn without(obj: &Map<String, Value>, key: &str) -> Map<String, Value> {
    obj.iter()
        .filter(|(k, _)| k.as_str() != key)
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
