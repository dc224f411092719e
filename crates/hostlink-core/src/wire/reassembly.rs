//! Response reassembly.
//!
//! The host's reply arrives in arbitrarily sized chunks. A [`Reassembler`]
//! accumulates them and decides when the message is complete. It performs no
//! I/O: the client's read loop feeds it, and so does the fuzz target.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::framing::{Framing, ProtocolError, find};
use crate::error::BridgeError;

/// How completeness of a reply is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReassemblyStrategy {
    /// Complete at the first occurrence of the framing terminator.
    #[default]
    Delimiter,
    /// Complete as soon as the accumulated bytes parse as one JSON document.
    ///
    /// A valid prefix followed by more bytes is reported complete early.
    Speculative,
}

impl ReassemblyStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            ReassemblyStrategy::Delimiter => "delimiter",
            ReassemblyStrategy::Speculative => "speculative",
        }
    }
}

impl fmt::Display for ReassemblyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReassemblyStrategy {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "delimiter" => Ok(ReassemblyStrategy::Delimiter),
            "speculative" => Ok(ReassemblyStrategy::Speculative),
            other => Err(ProtocolError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Incremental reply reassembler.
#[derive(Debug)]
pub struct Reassembler {
    strategy: ReassemblyStrategy,
    sentinel: Option<&'static [u8]>,
    buf: Vec<u8>,
    /// Offset from which the next terminator search starts. Lags the end of
    /// the buffer by `sentinel.len() - 1` so a split terminator is found.
    scan_from: usize,
}

impl Reassembler {
    pub fn new(framing: Framing, strategy: ReassemblyStrategy) -> Self {
        Self {
            strategy,
            sentinel: framing.sentinel(),
            buf: Vec::new(),
            scan_from: 0,
        }
    }

    pub fn strategy(&self) -> ReassemblyStrategy {
        self.strategy
    }

    /// Bytes accumulated so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Feed one chunk. Returns the decoded reply once it is complete.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Option<Value>, BridgeError> {
        self.buf.extend_from_slice(chunk);
        match self.strategy {
            ReassemblyStrategy::Delimiter => {
                let Some(sentinel) = self.sentinel else {
                    // Half-close: only EOF ends the message.
                    return Ok(None);
                };
                match find(&self.buf[self.scan_from..], sentinel) {
                    Some(offset) => {
                        let end = self.scan_from + offset;
                        decode_body(&self.buf[..end]).map(Some)
                    }
                    None => {
                        self.scan_from = self.buf.len().saturating_sub(sentinel.len() - 1);
                        Ok(None)
                    }
                }
            }
            ReassemblyStrategy::Speculative => Ok(self.try_parse()),
        }
    }

    /// The peer closed the stream. Whatever was received is the message.
    pub fn finish(&self) -> Result<Value, BridgeError> {
        if self.buf.is_empty() {
            return Err(BridgeError::ReceiveEmpty);
        }
        decode_body(self.body())
    }

    /// Best-effort parse of a partial reply after a timeout.
    pub fn salvage(&self) -> Option<Value> {
        if self.buf.is_empty() {
            return None;
        }
        self.try_parse()
    }

    fn try_parse(&self) -> Option<Value> {
        let body = self.body().trim_ascii();
        match body.last() {
            Some(b'}') | Some(b']') => serde_json::from_slice(body).ok(),
            _ => None,
        }
    }

    /// Buffer up to the first terminator, or all of it.
    fn body(&self) -> &[u8] {
        match self.sentinel.and_then(|s| find(&self.buf, s)) {
            Some(end) => &self.buf[..end],
            None => &self.buf,
        }
    }
}

fn decode_body(body: &[u8]) -> Result<Value, BridgeError> {
    serde_json::from_slice(body.trim_ascii())
        .map_err(|e| BridgeError::DecodeFailed(format!("{e} ({} bytes received)", body.len())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    fn feed_all(r: &mut Reassembler, chunks: &[&[u8]]) -> Option<Value> {
        for chunk in chunks {
            if let Some(v) = r.push(chunk).unwrap() {
                return Some(v);
            }
        }
        None
    }

    #[test]
    fn test_single_chunk_nul() {
        let mut r = Reassembler::new(Framing::NulByte, ReassemblyStrategy::Delimiter);
        let v = r.push(b"{\"status\":\"success\"}\0").unwrap();
        assert_eq!(v, Some(json!({"status": "success"})));
    }

    #[test]
    fn test_text_marker_split_across_chunks() {
        let mut r = Reassembler::new(Framing::TextSentinel, ReassemblyStrategy::Delimiter);
        let chunks: [&[u8]; 3] = [b"{\"a\":1}__MC", b"P_E", b"ND__"];
        assert_eq!(feed_all(&mut r, &chunks), Some(json!({"a": 1})));
    }

    #[test]
    fn test_marker_split_one_byte_at_a_time() {
        let msg = b"{\"tree\":[1,2,3]}__MCP_END__";
        let mut r = Reassembler::new(Framing::TextSentinel, ReassemblyStrategy::Delimiter);
        let mut out = None;
        for b in msg {
            if let Some(v) = r.push(std::slice::from_ref(b)).unwrap() {
                out = Some(v);
                break;
            }
        }
        assert_eq!(out, Some(json!({"tree": [1, 2, 3]})));
    }

    #[test]
    fn test_incomplete_waits() {
        let mut r = Reassembler::new(Framing::NulByte, ReassemblyStrategy::Delimiter);
        assert_eq!(r.push(b"{\"a\":").unwrap(), None);
        assert_eq!(r.push(b"1}").unwrap(), None);
        assert_eq!(r.push(b"\0").unwrap(), Some(json!({"a": 1})));
    }

    #[test]
    fn test_garbage_before_terminator_is_decode_failure() {
        let mut r = Reassembler::new(Framing::NulByte, ReassemblyStrategy::Delimiter);
        let err = r.push(b"not json\0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodeFailed);
    }

    #[test]
    fn test_half_close_completes_only_at_eof() {
        let mut r = Reassembler::new(Framing::HalfClose, ReassemblyStrategy::Delimiter);
        assert_eq!(r.push(b"{\"ok\":true}").unwrap(), None);
        assert_eq!(r.finish().unwrap(), json!({"ok": true}));
    }

    #[test]
    fn test_eof_with_nothing_is_empty() {
        let r = Reassembler::new(Framing::NulByte, ReassemblyStrategy::Delimiter);
        assert!(matches!(r.finish(), Err(BridgeError::ReceiveEmpty)));
    }

    #[test]
    fn test_eof_without_terminator_parses_what_arrived() {
        let mut r = Reassembler::new(Framing::NulByte, ReassemblyStrategy::Delimiter);
        r.push(b"{\"a\":1}").unwrap();
        assert_eq!(r.finish().unwrap(), json!({"a": 1}));

        let mut r = Reassembler::new(Framing::NulByte, ReassemblyStrategy::Delimiter);
        r.push(b"{\"a\":").unwrap();
        assert_eq!(r.finish().unwrap_err().kind(), ErrorKind::DecodeFailed);
    }

    #[test]
    fn test_speculative_completes_on_parse() {
        let mut r = Reassembler::new(Framing::HalfClose, ReassemblyStrategy::Speculative);
        assert_eq!(r.push(b"{\"a\":[1,").unwrap(), None);
        assert_eq!(r.push(b"2]}").unwrap(), Some(json!({"a": [1, 2]})));
    }

    #[test]
    fn test_speculative_strips_terminator() {
        let mut r = Reassembler::new(Framing::NulByte, ReassemblyStrategy::Speculative);
        assert_eq!(r.push(b"{\"a\":1}\0").unwrap(), Some(json!({"a": 1})));
    }

    #[test]
    fn test_speculative_accepts_valid_prefix() {
        // Known limitation: anything the host sends after a parseable prefix is lost.
        let mut r = Reassembler::new(Framing::HalfClose, ReassemblyStrategy::Speculative);
        assert_eq!(r.push(b"[1]").unwrap(), Some(json!([1])));
    }

    #[test]
    fn test_salvage() {
        let mut r = Reassembler::new(Framing::NulByte, ReassemblyStrategy::Delimiter);
        assert_eq!(r.salvage(), None);
        r.push(b"{\"partial\":").unwrap();
        assert_eq!(r.salvage(), None);
        r.push(b"true}  ").unwrap();
        assert_eq!(r.salvage(), Some(json!({"partial": true})));
        assert_eq!(r.len(), 18);
    }

    #[test]
    fn test_parse_strategy_names() {
        assert_eq!(
            "speculative".parse::<ReassemblyStrategy>().unwrap(),
            ReassemblyStrategy::Speculative
        );
        assert!("greedy".parse::<ReassemblyStrategy>().is_err());
        assert_eq!(ReassemblyStrategy::default().to_string(), "delimiter");
    }

    proptest! {
        #[test]
        fn prop_any_chunking_yields_same_value(
            text in "[a-zA-Z0-9 ]{0,64}",
            n in 0i64..10_000,
            cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
            text_framing in any::<bool>(),
        ) {
            let framing = if text_framing { Framing::TextSentinel } else { Framing::NulByte };
            let expected = json!({"status": "success", "result": {"name": text, "n": n}});
            let mut wire = serde_json::to_vec(&expected).unwrap();
            wire.extend_from_slice(framing.sentinel().unwrap());

            let mut points: Vec<usize> = cuts.iter().map(|i| i.index(wire.len())).collect();
            points.sort_unstable();
            points.dedup();

            let mut r = Reassembler::new(framing, ReassemblyStrategy::Delimiter);
            let mut start = 0;
            let mut got = None;
            for end in points.into_iter().chain(std::iter::once(wire.len())) {
                if let Some(v) = r.push(&wire[start..end]).unwrap() {
                    got = Some(v);
                    break;
                }
                start = end;
            }
            prop_assert_eq!(got, Some(expected));
        }
    }
}
