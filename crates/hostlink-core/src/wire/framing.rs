//! Message framing.
//!
//! Exactly one scheme is used per deployment:
//!
//! | Scheme      | Config name  | Terminator                          |
//! |-------------|--------------|-------------------------------------|
//! | NUL byte    | `nul`        | single `0x00` byte (default)        |
//! | Text marker | `text`       | ASCII `__MCP_END__`                 |
//! | Half-close  | `half-close` | none; the writer shuts down its half |
//!
//! Compact JSON never contains a raw `0x00` (control characters inside
//! strings are escaped), so the NUL scheme needs no escaping. The text marker
//! is not escaped either: a payload string containing `__MCP_END__` verbatim
//! will be cut short by the receiver.

use std::fmt;
use std::str::FromStr;

use super::types::Command;

/// Terminator of the `text` framing scheme.
pub const TEXT_SENTINEL: &[u8] = b"__MCP_END__";

const NUL_SENTINEL: &[u8] = b"\0";

/// Errors from encoding or decoding a framed message.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("failed to serialize command: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to parse framed command: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("framed message is missing its {0} terminator")]
    MissingTerminator(Framing),

    #[error("unknown framing scheme '{0}' (expected nul, text, or half-close)")]
    UnknownScheme(String),

    #[error("unknown reassembly strategy '{0}' (expected delimiter or speculative)")]
    UnknownStrategy(String),
}

/// How message boundaries are marked on the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Framing {
    #[default]
    NulByte,
    TextSentinel,
    HalfClose,
}

impl Framing {
    /// Terminator bytes, or `None` for half-close.
    pub fn sentinel(self) -> Option<&'static [u8]> {
        match self {
            Framing::NulByte => Some(NUL_SENTINEL),
            Framing::TextSentinel => Some(TEXT_SENTINEL),
            Framing::HalfClose => None,
        }
    }

    /// Config name of the scheme.
    pub fn as_str(self) -> &'static str {
        match self {
            Framing::NulByte => "nul",
            Framing::TextSentinel => "text",
            Framing::HalfClose => "half-close",
        }
    }

    /// Whether the sender must shut down its write half after the message.
    pub fn closes_write_half(self) -> bool {
        matches!(self, Framing::HalfClose)
    }

    /// Serialize a command as compact UTF-8 JSON followed by the terminator.
    pub fn encode(self, command: &Command) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes = serde_json::to_vec(command).map_err(ProtocolError::Encode)?;
        if let Some(sentinel) = self.sentinel() {
            if find(&bytes, sentinel).is_some() {
                tracing::warn!(
                    command = %command.name,
                    "Command body contains the framing terminator; the host will truncate it"
                );
            }
            bytes.extend_from_slice(sentinel);
        }
        Ok(bytes)
    }

    /// Split one framed message and parse the command it carries.
    ///
    /// Bytes after the first terminator are ignored. For half-close framing
    /// the whole input is the message.
    pub fn decode(self, bytes: &[u8]) -> Result<Command, ProtocolError> {
        let body = match self.sentinel() {
            Some(sentinel) => {
                let end = find(bytes, sentinel).ok_or(ProtocolError::MissingTerminator(self))?;
                &bytes[..end]
            }
            None => bytes,
        };
        serde_json::from_slice(body).map_err(ProtocolError::Decode)
    }
}

impl fmt::Display for Framing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framing {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "nul" => Ok(Framing::NulByte),
            "text" => Ok(Framing::TextSentinel),
            "half-close" => Ok(Framing::HalfClose),
            other => Err(ProtocolError::UnknownScheme(other.to_string())),
        }
    }
}

/// Position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
