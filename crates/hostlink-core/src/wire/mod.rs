//! Wire protocol: one JSON command per connection over a plain TCP stream.
//!
//! A raw stream has no message boundaries, so every message carries exactly
//! one framing scheme chosen per deployment (see [`Framing`]). The reply is
//! reassembled from arbitrary chunks by a sans-IO [`Reassembler`] and then
//! normalised into the canonical [`Response`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐  {"command":..,"params":{..}} + framing  ┌──────────────┐
//! │HostClient│─────────────────────────────────────────▶│     Host     │
//! │          │◀─────────────────────────────────────────│ command port │
//! └────┬─────┘        reply bytes (any chunking)        └──────────────┘
//!      │
//! ┌────▼───────┐   ┌────────────┐
//! │Reassembler │──▶│ normalize  │──▶ Response
//! └────────────┘   └────────────┘
//! ```

pub mod client;
pub mod framing;
pub mod normalize;
pub mod reassembly;
pub mod types;

pub use client::{HostClient, HostTransport, SessionState};
pub use framing::{Framing, ProtocolError, TEXT_SENTINEL};
pub use normalize::normalize;
pub use reassembly::{Reassembler, ReassemblyStrategy};
pub use types::*;
