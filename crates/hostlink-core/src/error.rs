//! Error taxonomy.
//!
//! Every failure a caller can observe maps to one [`ErrorKind`]. Transport
//! failures are never raised past the session boundary: the client converts
//! them into an error [`Response`](crate::wire::Response) carrying the kind.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Coarse classification of a failed call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConnectFailed,
    SendFailed,
    ReceiveTimeout,
    ReceiveEmpty,
    DecodeFailed,
    #[default]
    HostReportedFailure,
    NoTargetSelected,
    UnknownOperation,
    InvalidParameters,
}

impl ErrorKind {
    /// Whether the failure was decided locally, before any network access.
    pub fn is_local(self) -> bool {
        matches!(
            self,
            ErrorKind::NoTargetSelected | ErrorKind::UnknownOperation | ErrorKind::InvalidParameters
        )
    }
}

/// Errors raised inside the transport and dispatch layers.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("failed to connect to host at {endpoint}: {reason}")]
    ConnectFailed { endpoint: String, reason: String },

    #[error("failed to send command to host: {0}")]
    SendFailed(#[source] std::io::Error),

    #[error("timed out after {0:?} waiting for a complete host response")]
    ReceiveTimeout(Duration),

    #[error("host closed the connection without responding")]
    ReceiveEmpty,

    #[error("failed to decode host response: {0}")]
    DecodeFailed(String),

    #[error("{0}")]
    HostReportedFailure(String),

    #[error("no {scope} selected for '{operation}'; call '{setter}' first")]
    NoTargetSelected {
        operation: String,
        scope: &'static str,
        setter: &'static str,
    },

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("invalid parameters for '{operation}': {reason}")]
    InvalidParameters { operation: String, reason: String },
}

impl BridgeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BridgeError::ConnectFailed { .. } => ErrorKind::ConnectFailed,
            BridgeError::SendFailed(_) => ErrorKind::SendFailed,
            BridgeError::ReceiveTimeout(_) => ErrorKind::ReceiveTimeout,
            BridgeError::ReceiveEmpty => ErrorKind::ReceiveEmpty,
            BridgeError::DecodeFailed(_) => ErrorKind::DecodeFailed,
            BridgeError::HostReportedFailure(_) => ErrorKind::HostReportedFailure,
            BridgeError::NoTargetSelected { .. } => ErrorKind::NoTargetSelected,
            BridgeError::UnknownOperation(_) => ErrorKind::UnknownOperation,
            BridgeError::InvalidParameters { .. } => ErrorKind::InvalidParameters,
        }
    }

    pub(crate) fn invalid(operation: &str, reason: impl Into<String>) -> Self {
        BridgeError::InvalidParameters {
            operation: operation.to_string(),
            reason: reason.into(),
        }
    }
}
