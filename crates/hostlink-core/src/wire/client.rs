//! Host client: connects to the host's command port over TCP.
//!
//! Every call opens a fresh connection, sends exactly one framed command,
//! reads until the reply is complete, and closes. Transport failures never
//! escape [`HostClient::call`]; they come back as error [`Response`]s.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::time::{Instant, timeout};
use tracing::{debug, trace, warn};

use hostlink_config::HostConfig;

use super::framing::{Framing, ProtocolError};
use super::normalize::normalize;
use super::reassembly::{Reassembler, ReassemblyStrategy};
use super::types::{Command, Response};
use crate::BoxFuture;
use crate::error::BridgeError;

const READ_BUFFER_SIZE: usize = 8192;

/// Anything that can carry a command to the host and return its response.
///
/// The dispatcher and attention context talk to the host only through this
/// trait, so tests can substitute a scripted transport.
pub trait HostTransport: Send + Sync {
    fn send<'a>(&'a self, command: &'a Command) -> BoxFuture<'a, Response>;
}

/// Lifecycle of one connection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Open,
    Closing,
    Closed,
}

/// Reconnect-per-call TCP client for the host command port.
#[derive(Debug, Clone)]
pub struct HostClient {
    endpoint: String,
    framing: Framing,
    reassembly: ReassemblyStrategy,
    connect_timeout: Duration,
    response_timeout: Duration,
    chunk_timeout: Duration,
    sessions: Arc<Semaphore>,
}

impl HostClient {
    /// Create a client for `endpoint` (`host:port`) with default settings.
    pub fn new(endpoint: impl Into<String>) -> Self {
        let defaults = HostConfig::default();
        Self {
            endpoint: endpoint.into(),
            framing: Framing::default(),
            reassembly: ReassemblyStrategy::default(),
            connect_timeout: defaults.connect_timeout(),
            response_timeout: defaults.response_timeout(),
            chunk_timeout: defaults.chunk_timeout(),
            sessions: Arc::new(Semaphore::new(defaults.max_concurrent_sessions)),
        }
    }

    /// Build a client from the `[host]` config section.
    pub fn from_config(config: &HostConfig) -> Result<Self, ProtocolError> {
        Ok(Self::new(config.endpoint())
            .with_framing(config.framing.parse()?)
            .with_reassembly(config.reassembly.parse()?)
            .with_timeouts(
                config.connect_timeout(),
                config.response_timeout(),
                config.chunk_timeout(),
            )
            .with_max_sessions(config.max_concurrent_sessions))
    }

    pub fn with_framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    pub fn with_reassembly(mut self, reassembly: ReassemblyStrategy) -> Self {
        self.reassembly = reassembly;
        self
    }

    /// Set connect, overall response, and per-chunk idle timeouts.
    pub fn with_timeouts(
        mut self,
        connect: Duration,
        response: Duration,
        chunk: Duration,
    ) -> Self {
        self.connect_timeout = connect;
        self.response_timeout = response;
        self.chunk_timeout = chunk;
        self
    }

    /// Bound the number of sessions open at once.
    pub fn with_max_sessions(mut self, max: usize) -> Self {
        self.sessions = Arc::new(Semaphore::new(max.max(1)));
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn reassembly(&self) -> ReassemblyStrategy {
        self.reassembly
    }

    /// Send one command and return the normalised response.
    pub async fn call(&self, command: &Command) -> Response {
        match self.exchange(command).await {
            Ok(raw) => normalize(raw),
            Err(e) => {
                warn!(command = %command.name, kind = ?e.kind(), error = %e, "Host call failed");
                Response::from(e)
            }
        }
    }

    /// Send one command and return the raw decoded reply.
    pub async fn exchange(&self, command: &Command) -> Result<Value, BridgeError> {
        let _permit = self
            .sessions
            .acquire()
            .await
            .map_err(|_| self.connect_failed("session pool closed"))?;

        let mut session = Session::new(&command.name);
        session.transition(SessionState::Connecting);

        let connect = TcpStream::connect(&self.endpoint);
        let mut stream = match timeout(self.connect_timeout, connect).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(self.connect_failed(e)),
            Err(_) => {
                return Err(self.connect_failed(format!(
                    "timed out after {:?}",
                    self.connect_timeout
                )));
            }
        };
        session.transition(SessionState::Open);

        let bytes = self.framing.encode(command).map_err(|e| {
            BridgeError::SendFailed(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;
        stream
            .write_all(&bytes)
            .await
            .map_err(BridgeError::SendFailed)?;
        if self.framing.closes_write_half() {
            stream.shutdown().await.map_err(BridgeError::SendFailed)?;
        }
        debug!(
            command = %command.name,
            bytes = bytes.len(),
            framing = %self.framing,
            "Command sent"
        );

        let result = self.read_reply(&mut stream).await;
        session.transition(SessionState::Closing);
        drop(stream);
        session.transition(SessionState::Closed);
        result
    }

    async fn read_reply(&self, stream: &mut TcpStream) -> Result<Value, BridgeError> {
        let deadline = Instant::now() + self.response_timeout;
        let mut reassembler = Reassembler::new(self.framing, self.reassembly);
        let mut buf = vec![0u8; READ_BUFFER_SIZE];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            // The idle timeout only applies once the host has started replying.
            let wait = if reassembler.is_empty() {
                remaining
            } else {
                remaining.min(self.chunk_timeout)
            };

            let read = match timeout(wait, stream.read(&mut buf)).await {
                Ok(read) => read,
                Err(_) => return self.on_timeout(&reassembler, wait),
            };

            match read {
                Ok(0) => {
                    debug!(bytes = reassembler.len(), "Host closed the stream");
                    return reassembler.finish();
                }
                Ok(n) => {
                    trace!(chunk = n, total = reassembler.len() + n, "Received chunk");
                    if let Some(value) = reassembler.push(&buf[..n])? {
                        debug!(bytes = reassembler.len(), "Reply complete");
                        return Ok(value);
                    }
                }
                Err(e) => {
                    debug!(error = %e, bytes = reassembler.len(), "Read failed");
                    return reassembler.finish();
                }
            }
        }
    }

    fn on_timeout(
        &self,
        reassembler: &Reassembler,
        waited: Duration,
    ) -> Result<Value, BridgeError> {
        if reassembler.is_empty() {
            return Err(BridgeError::ReceiveTimeout(self.response_timeout));
        }
        match reassembler.salvage() {
            Some(value) => {
                warn!(
                    bytes = reassembler.len(),
                    "Reply not terminated before timeout; using the parseable data received"
                );
                Ok(value)
            }
            None => Err(BridgeError::ReceiveTimeout(waited)),
        }
    }

    fn connect_failed(&self, reason: impl ToString) -> BridgeError {
        BridgeError::ConnectFailed {
            endpoint: self.endpoint.clone(),
            reason: reason.to_string(),
        }
    }
}

impl HostTransport for HostClient {
    fn send<'a>(&'a self, command: &'a Command) -> BoxFuture<'a, Response> {
        Box::pin(self.call(command))
    }
}

/// Per-call session bookkeeping, traced at each transition.
struct Session<'a> {
    command: &'a str,
    state: SessionState,
}

impl<'a> Session<'a> {
    fn new(command: &'a str) -> Self {
        Self {
            command,
            state: SessionState::Disconnected,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!(command = self.command, from = ?self.state, to = ?next, "Session state");
        self.state = next;
    }
}
