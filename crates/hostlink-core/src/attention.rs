//! Attention context: the "current target" the agent is working on.
//!
//! Most host operations act on an implicit target (the open widget document,
//! the animation being keyed, the material graph being edited). The agent
//! names the target once with a selection operation; later calls that omit it
//! get it injected from here.
//!
//! Each scope is `Unset` until it is either set explicitly or learned from the
//! host on a cache miss (update-on-read). Once cached it is only ever replaced
//! by a newer value, never cleared. Nothing invalidates a cached value when the
//! host changes its own target out of band.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::BridgeError;
use crate::wire::{Command, HostTransport};

/// One independently tracked piece of attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    /// The widget document being edited.
    Asset,
    /// The animation timeline being keyed.
    Animation,
    /// The sub-widget whose tracks are being keyed.
    Widget,
    /// The material graph being edited.
    Material,
}

impl Scope {
    pub const ALL: [Scope; 4] = [Scope::Asset, Scope::Animation, Scope::Widget, Scope::Material];

    /// Parameter name carrying this scope on the wire.
    pub fn param(self) -> &'static str {
        match self {
            Scope::Asset => "asset_path",
            Scope::Animation => "animation_name",
            Scope::Widget => "widget_name",
            Scope::Material => "material_path",
        }
    }

    /// Operation that selects this scope.
    pub fn setter(self) -> &'static str {
        match self {
            Scope::Asset => "set_target_umg_asset",
            Scope::Animation => "set_animation_scope",
            Scope::Widget => "set_widget_scope",
            Scope::Material => "material_set_target",
        }
    }

    /// Host query answering "what is the current value?", if the host has one.
    pub fn host_query(self) -> Option<&'static str> {
        match self {
            Scope::Asset => Some("get_target_umg_asset"),
            Scope::Animation | Scope::Widget | Scope::Material => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Scope::Asset => "target asset",
            Scope::Animation => "animation scope",
            Scope::Widget => "widget scope",
            Scope::Material => "target material",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shared, mutex-guarded attention state for one agent session.
///
/// A miss in [`resolve_or_fail`](Self::resolve_or_fail) keeps the lock while
/// the host is queried, so concurrent `get`/`set` calls on the same context
/// wait up to the client's response timeout.
#[derive(Debug, Default)]
pub struct AttentionContext {
    fields: Mutex<BTreeMap<Scope, String>>,
}

impl AttentionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, scope: Scope) -> Option<String> {
        self.fields.lock().await.get(&scope).cloned()
    }

    /// Record a selection. Blank values are ignored so a scope is never cleared.
    pub async fn set(&self, scope: Scope, value: impl Into<String>) {
        let value = value.into();
        if value.trim().is_empty() {
            debug!(%scope, "Ignoring blank selection");
            return;
        }
        let previous = self.fields.lock().await.insert(scope, value.clone());
        info!(%scope, %value, previous = ?previous, "Attention updated");
    }

    /// Current value of every cached scope.
    pub async fn snapshot(&self) -> BTreeMap<Scope, String> {
        self.fields.lock().await.clone()
    }

    /// Cached value, or one host query on a miss, or `NoTargetSelected`.
    ///
    /// The guard is held across the host query, so concurrent callers missing
    /// on the same context trigger at most one query between them.
    pub async fn resolve_or_fail(
        &self,
        scope: Scope,
        operation: &str,
        transport: &dyn HostTransport,
    ) -> Result<String, BridgeError> {
        let mut fields = self.fields.lock().await;
        if let Some(value) = fields.get(&scope) {
            return Ok(value.clone());
        }

        if let Some(query) = scope.host_query() {
            debug!(%scope, query, operation, "Attention miss, asking host");
            let response = transport.send(&Command::bare(query)?).await;
            match response.payload().and_then(answer_of) {
                Some(answer) => {
                    info!(%scope, value = %answer, "Attention learned from host");
                    fields.insert(scope, answer.clone());
                    return Ok(answer);
                }
                None => {
                    if let Some(reason) = response.reason() {
                        warn!(%scope, query, %reason, "Attention query failed");
                    }
                }
            }
        }

        Err(BridgeError::NoTargetSelected {
            operation: operation.to_string(),
            scope: scope.label(),
            setter: scope.setter(),
        })
    }
}

/// Non-empty `data.asset_path`, falling back to a top-level `asset_path`.
fn answer_of(payload: &Value) -> Option<String> {
    payload
        .pointer("/data/asset_path")
        .or_else(|| payload.get("asset_path"))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
