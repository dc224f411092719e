#![deny(unsafe_code)]

//! hostlink core: the command transport between an agent and a host
//! application's UI-building subsystem.
//!
//! A command travels leaf-first through these layers:
//!
//! ```text
//! ┌────────────┐  name + params  ┌──────────────┐  resolve   ┌────────────────┐
//! │   Agent    │────────────────▶│  Dispatcher  │───────────▶│ Attention ctx  │
//! └────────────┘                 │  + catalogue │◀───────────│ (target cache) │
//!                                └──────┬───────┘            └────────────────┘
//!                                       │ Command
//!                                ┌──────▼───────┐  framed bytes  ┌────────────┐
//!                                │  HostClient  │───────────────▶│    Host    │
//!                                │ framer/reasm │◀───────────────│ application│
//!                                └──────┬───────┘   raw reply    └────────────┘
//!                                       │ normalise
//!                                   Response
//! ```

use std::future::Future;
use std::pin::Pin;

/// Boxed `Send` future returned by object-safe async trait methods such as
/// [`HostTransport::send`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Implicit "current target" cache with update-on-read.
pub mod attention;
/// Named operation dispatch.
pub mod dispatch;
/// Error taxonomy shared by every layer.
pub mod error;
/// Tag-markup to widget-document translation.
pub mod markup;
/// Operation registry and advertised catalogue.
pub mod tools;
/// Wire protocol: framing, reassembly, normalisation, and the socket client.
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use attention::{AttentionContext, Scope};
pub use dispatch::Dispatcher;
pub use error::{BridgeError, ErrorKind};
pub use tools::{Catalogue, OperationRegistry};
pub use wire::{Command, Failure, Framing, HostClient, HostTransport, Response};
