//! Scripted stand-in for the host's command port.
//!
//! [`MockHost`] binds an ephemeral localhost port and answers every
//! connection with one [`Reply`] chosen by command name. Every command it
//! receives is recorded, so tests can assert on exactly what went over the
//! wire.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hostlink_core::wire::{Command, Framing, HostClient};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// What the mock host does after reading one command.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Write the value followed by the host's terminator.
    Json(Value),
    /// Write these bytes verbatim; the test controls any terminator.
    Raw(Vec<u8>),
    /// Write each part verbatim, pausing between parts.
    Chunked(Vec<Vec<u8>>, Duration),
    /// Keep the connection open and never answer.
    Silent,
    /// Close the connection without writing anything.
    Close,
}

impl Reply {
    /// `{"status":"success","result":..}`
    pub fn success(result: Value) -> Self {
        Reply::Json(json!({"status": "success", "result": result}))
    }

    /// `{"status":"error","error":..}`
    pub fn error(reason: &str) -> Self {
        Reply::Json(json!({"status": "error", "error": reason}))
    }
}

#[derive(Debug, Default)]
struct Script {
    replies: HashMap<String, Reply>,
    fallback: Option<Reply>,
}

/// A scripted host listening on `127.0.0.1`.
///
/// The accept loop is aborted on drop.
pub struct MockHost {
    addr: SocketAddr,
    framing: Framing,
    received: Arc<Mutex<Vec<Command>>>,
    task: JoinHandle<()>,
}

/// Builder for [`MockHost`].
#[derive(Debug, Default)]
pub struct MockHostBuilder {
    framing: Framing,
    script: Script,
}

impl MockHostBuilder {
    pub fn framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Answer `command` with `reply`.
    pub fn on(mut self, command: &str, reply: Reply) -> Self {
        self.script.replies.insert(command.to_string(), reply);
        self
    }

    /// Answer unscripted commands with `reply` instead of an empty success.
    pub fn otherwise(mut self, reply: Reply) -> Self {
        self.script.fallback = Some(reply);
        self
    }

    pub async fn start(self) -> MockHost {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock host");
        let addr = listener.local_addr().expect("mock host has no local addr");
        let received = Arc::new(Mutex::new(Vec::new()));
        let script = Arc::new(self.script);
        let framing = self.framing;

        let log = Arc::clone(&received);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let script = Arc::clone(&script);
                let log = Arc::clone(&log);
                tokio::spawn(serve(stream, framing, script, log));
            }
        });

        MockHost {
            addr,
            framing,
            received,
            task,
        }
    }
}

impl MockHost {
    pub fn builder() -> MockHostBuilder {
        MockHostBuilder::default()
    }

    /// NUL-framed host answering every command with an empty success.
    pub async fn start() -> Self {
        Self::builder().start().await
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// `host:port` as the client expects it.
    pub fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    /// Client configured for this host with short timeouts.
    pub fn client(&self) -> HostClient {
        HostClient::new(self.endpoint())
            .with_framing(self.framing)
            .with_timeouts(
                Duration::from_millis(500),
                Duration::from_millis(1500),
                Duration::from_millis(400),
            )
    }

    /// Every command received so far, in arrival order.
    pub fn received(&self) -> Vec<Command> {
        self.received.lock().expect("mock host log poisoned").clone()
    }

    /// Names of the received commands.
    pub fn commands(&self) -> Vec<String> {
        self.received().into_iter().map(|c| c.name).collect()
    }
}

impl Drop for MockHost {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    framing: Framing,
    script: Arc<Script>,
    log: Arc<Mutex<Vec<Command>>>,
) {
    let Some(bytes) = read_request(&mut stream, framing).await else {
        return;
    };
    let Ok(command) = framing.decode(&bytes) else {
        return;
    };
    let reply = script
        .replies
        .get(&command.name)
        .or(script.fallback.as_ref())
        .cloned()
        .unwrap_or_else(|| Reply::success(json!({})));
    if let Ok(mut log) = log.lock() {
        log.push(command);
    }

    match reply {
        Reply::Json(value) => {
            let mut out = serde_json::to_vec(&value).unwrap_or_default();
            if let Some(sentinel) = framing.sentinel() {
                out.extend_from_slice(sentinel);
            }
            let _ = stream.write_all(&out).await;
        }
        Reply::Raw(bytes) => {
            let _ = stream.write_all(&bytes).await;
        }
        Reply::Chunked(parts, pause) => {
            for part in parts {
                if stream.write_all(&part).await.is_err() {
                    return;
                }
                let _ = stream.flush().await;
                tokio::time::sleep(pause).await;
            }
        }
        Reply::Silent => {
            // Hold the connection until the client gives up.
            let mut sink = [0u8; 64];
            while let Ok(n) = stream.read(&mut sink).await {
                if n == 0 {
                    break;
                }
            }
            return;
        }
        Reply::Close => return,
    }
    let _ = stream.shutdown().await;
}

/// Read one framed command: up to the terminator, or to EOF for half-close.
async fn read_request(stream: &mut TcpStream, framing: Framing) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return (!buf.is_empty()).then_some(buf);
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(sentinel) = framing.sentinel()
            && buf.windows(sentinel.len()).any(|w| w == sentinel)
        {
            return Some(buf);
        }
    }
}
