//! Named operation dispatch.
//!
//! ```text
//! name + params
//!   │ registry lookup ─────────── unknown → UnknownOperation
//!   │ structural validation ───── bad shape → InvalidParameters
//!   │ local preprocessing ─────── markup/document → json_data string
//!   │ attention resolution ────── unresolvable → NoTargetSelected
//!   ▼
//! transport.send(Command) ──▶ Response ──▶ selection write-through on success
//! ```
//!
//! Every failure above the transport is decided before any network access.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::attention::{AttentionContext, Scope};
use crate::error::BridgeError;
use crate::markup;
use crate::tools::{
    Access, Catalogue, Operation, OperationRegistry, Preprocess, ScopeUse, ToolDefinition,
};
use crate::wire::{Command, HostClient, HostTransport, Response};

/// Routes named operations to the host through a transport.
#[derive(Debug)]
pub struct Dispatcher<T: HostTransport = HostClient> {
    registry: OperationRegistry,
    catalogue: Catalogue,
    transport: T,
}

impl<T: HostTransport> Dispatcher<T> {
    /// Dispatcher over the built-in operations, all advertised.
    pub fn new(transport: T) -> Self {
        Self::with_registry(transport, OperationRegistry::with_builtins())
    }

    pub fn with_registry(transport: T, registry: OperationRegistry) -> Self {
        let catalogue = Catalogue::all(&registry);
        Self {
            registry,
            catalogue,
            transport,
        }
    }

    pub fn with_catalogue(mut self, catalogue: Catalogue) -> Self {
        self.catalogue = catalogue;
        self
    }

    /// Swap in a freshly loaded catalogue.
    pub fn set_catalogue(&mut self, catalogue: Catalogue) {
        self.catalogue = catalogue;
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Definitions of the advertised operations.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.catalogue.definitions(&self.registry)
    }

    /// Run one named operation. Never fails: every error is a [`Response`].
    pub async fn dispatch(&self, ctx: &AttentionContext, name: &str, params: Value) -> Response {
        match self.try_dispatch(ctx, name, params).await {
            Ok(response) => response,
            Err(e) => {
                debug!(operation = name, kind = ?e.kind(), error = %e, "Rejected before sending");
                Response::from(e)
            }
        }
    }

    async fn try_dispatch(
        &self,
        ctx: &AttentionContext,
        name: &str,
        params: Value,
    ) -> Result<Response, BridgeError> {
        let op = self
            .registry
            .get(name)
            .ok_or_else(|| BridgeError::UnknownOperation(name.to_string()))?;

        let mut params = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(BridgeError::invalid(
                    name,
                    format!("parameters must be a JSON object, got {other}"),
                ));
            }
        };
        op.validate(&params)?;

        if !self.catalogue.is_advertised(name) {
            debug!(operation = name, "Dispatching an operation that is not advertised");
        }

        preprocess(op, &mut params)?;
        resolve_scopes(op, ctx, &self.transport, &mut params).await?;

        let command = Command::new(op.wire_name.clone(), params)?;
        match op.access {
            Access::Write => info!(operation = name, wire = %command.name, "Dispatching"),
            Access::Read => debug!(operation = name, wire = %command.name, "Dispatching"),
        }
        let response = self.transport.send(&command).await;

        if response.is_success()
            && let Some(selection) = &op.selects
            && let Some(value) = command.param_str(&selection.param)
        {
            ctx.set(selection.scope, value).await;
        }
        Ok(response)
    }
}

/// Apply the operation's local parameter transformation.
fn preprocess(op: &Operation, params: &mut Map<String, Value>) -> Result<(), BridgeError> {
    match &op.preprocess {
        Preprocess::None => Ok(()),
        Preprocess::Document(key) => {
            let encoded = match params.get(key) {
                Some(Value::String(s)) => {
                    serde_json::from_str::<Value>(s).map_err(|e| {
                        BridgeError::invalid(&op.name, format!("'{key}' is not valid JSON: {e}"))
                    })?;
                    return Ok(());
                }
                Some(doc) => serde_json::to_string(doc)
                    .map_err(|e| BridgeError::invalid(&op.name, e.to_string()))?,
                None => return Ok(()),
            };
            params.insert(key.clone(), Value::String(encoded));
            Ok(())
        }
        Preprocess::Markup(key) => {
            let source = match params.remove(key) {
                Some(Value::String(s)) => s,
                _ => {
                    return Err(BridgeError::invalid(
                        &op.name,
                        format!("missing required parameter '{key}'"),
                    ));
                }
            };
            let doc =
                markup::translate(&source).map_err(|e| BridgeError::invalid(&op.name, e.to_string()))?;
            let encoded =
                serde_json::to_string(&doc).map_err(|e| BridgeError::invalid(&op.name, e.to_string()))?;
            params.insert("json_data".into(), Value::String(encoded));
            Ok(())
        }
    }
}

/// Fill in missing scope parameters from the attention context.
///
/// Scopes that can only be satisfied locally are checked first, so a call
/// that is going to fail never reaches the host.
async fn resolve_scopes(
    op: &Operation,
    ctx: &AttentionContext,
    transport: &dyn HostTransport,
    params: &mut Map<String, Value>,
) -> Result<(), BridgeError> {
    let mut uses = op.scopes.clone();
    uses.sort_by_key(|u| u.scope().host_query().is_some());

    for use_ in uses {
        match use_ {
            ScopeUse::Guard(scope) => {
                if ctx.get(scope).await.is_none() {
                    return Err(no_target(op, scope));
                }
            }
            ScopeUse::Inject(scope) => {
                if has_value(params, scope.param()) {
                    continue;
                }
                let value = ctx.resolve_or_fail(scope, &op.name, transport).await?;
                params.insert(scope.param().to_string(), Value::String(value));
            }
            ScopeUse::InjectIfKnown(scope) => {
                if has_value(params, scope.param()) {
                    continue;
                }
                if let Some(value) = ctx.get(scope).await {
                    params.insert(scope.param().to_string(), Value::String(value));
                }
            }
        }
    }
    Ok(())
}

fn has_value(params: &Map<String, Value>, key: &str) -> bool {
    match params.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn no_target(op: &Operation, scope: Scope) -> BridgeError {
    BridgeError::NoTargetSelected {
        operation: op.name.clone(),
        scope: scope.label(),
        setter: scope.setter(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::FakeTransport;
    use hostlink_config::{CatalogueDocument, ToolDescriptor};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn dispatcher(host: FakeTransport) -> Dispatcher<FakeTransport> {
        Dispatcher::new(host)
    }

    #[tokio::test]
    async fn test_unknown_operation() {
        let d = dispatcher(FakeTransport::new());
        let ctx = AttentionContext::new();
        let resp = d.dispatch(&ctx, "summon_dragon", json!({})).await;
        assert_eq!(resp.error_kind(), Some(ErrorKind::UnknownOperation));
        assert!(d.transport().commands().is_empty());
    }

    #[tokio::test]
    async fn test_set_target_then_create_carries_target() {
        let d = dispatcher(FakeTransport::new());
        let ctx = AttentionContext::new();

        let resp = d
            .dispatch(&ctx, "set_target_umg_asset", json!({"asset_path": "/Game/AssetA"}))
            .await;
        assert!(resp.is_success());

        let resp = d
            .dispatch(
                &ctx,
                "create_widget",
                json!({"widget_type": "Button", "new_widget_name": "Ok"}),
            )
            .await;
        assert!(resp.is_success());

        let sent = d.transport().commands();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].name, "create_widget");
        assert_eq!(sent[1].param_str("asset_path"), Some("/Game/AssetA"));
    }

    #[tokio::test]
    async fn test_explicit_param_wins_over_context() {
        let d = dispatcher(FakeTransport::new());
        let ctx = AttentionContext::new();
        ctx.set(Scope::Asset, "/Game/A").await;

        d.dispatch(&ctx, "get_widget_tree", json!({"asset_path": "/Game/B"}))
            .await;
        assert_eq!(
            d.transport().commands()[0].param_str("asset_path"),
            Some("/Game/B")
        );
    }

    #[tokio::test]
    async fn test_failed_selection_does_not_write_through() {
        let host = FakeTransport::new().reply(
            "set_target_umg_asset",
            Response::error(ErrorKind::HostReportedFailure, "no such asset"),
        );
        let d = dispatcher(host);
        let ctx = AttentionContext::new();
        ctx.set(Scope::Asset, "/Game/Old").await;

        let resp = d
            .dispatch(&ctx, "set_target_umg_asset", json!({"asset_path": "/Game/Bad"}))
            .await;
        assert_eq!(resp.reason(), Some("no such asset"));
        assert_eq!(ctx.get(Scope::Asset).await.as_deref(), Some("/Game/Old"));
    }

    #[tokio::test]
    async fn test_unresolvable_target_fails_fast() {
        let host = FakeTransport::new().reply(
            "get_target_umg_asset",
            Response::success(json!({"data": {"asset_path": ""}})),
        );
        let d = dispatcher(host);
        let ctx = AttentionContext::new();

        let resp = d.dispatch(&ctx, "save_asset", json!({})).await;
        assert_eq!(resp.error_kind(), Some(ErrorKind::NoTargetSelected));
        // Only the attention query reached the host.
        assert_eq!(d.transport().names(), vec!["get_target_umg_asset"]);
    }

    #[tokio::test]
    async fn test_local_scope_checked_before_host_query() {
        let d = dispatcher(FakeTransport::new());
        let ctx = AttentionContext::new();

        let resp = d.dispatch(&ctx, "get_animation_keyframes", json!({})).await;
        assert_eq!(resp.error_kind(), Some(ErrorKind::NoTargetSelected));
        assert!(resp.reason().unwrap().contains("set_animation_scope"));
        assert!(d.transport().commands().is_empty());
    }

    #[tokio::test]
    async fn test_material_guard() {
        let d = dispatcher(FakeTransport::new());
        let ctx = AttentionContext::new();

        let resp = d.dispatch(&ctx, "material_compile_asset", json!({})).await;
        assert_eq!(resp.error_kind(), Some(ErrorKind::NoTargetSelected));
        assert!(d.transport().commands().is_empty());

        d.dispatch(&ctx, "material_set_target", json!({"path": "/Game/M_Base"}))
            .await;
        let resp = d.dispatch(&ctx, "material_compile_asset", json!({})).await;
        assert!(resp.is_success());
        let sent = d.transport().commands();
        assert_eq!(sent[1].name, "material_compile_asset");
        assert!(sent[1].parameters.is_empty());
    }

    #[tokio::test]
    async fn test_timeline_scopes_injected_when_known() {
        let d = dispatcher(FakeTransport::new());
        let ctx = AttentionContext::new();
        ctx.set(Scope::Asset, "/Game/A").await;

        d.dispatch(&ctx, "remove_property_track", json!({"property_name": "RenderOpacity"}))
            .await;
        d.dispatch(&ctx, "set_animation_scope", json!({"animation_name": "FadeIn"}))
            .await;
        d.dispatch(&ctx, "remove_property_track", json!({"property_name": "RenderOpacity"}))
            .await;

        let sent = d.transport().commands();
        assert_eq!(sent[0].param_str("animation_name"), None);
        assert_eq!(sent[2].param_str("animation_name"), Some("FadeIn"));
        assert_eq!(sent[2].param_str("widget_name"), None);
    }

    #[tokio::test]
    async fn test_structural_validation() {
        let d = dispatcher(FakeTransport::new());
        let ctx = AttentionContext::new();

        let resp = d
            .dispatch(&ctx, "set_widget_properties", json!({"widget_name": "A", "properties": 5}))
            .await;
        assert_eq!(resp.error_kind(), Some(ErrorKind::InvalidParameters));

        let resp = d.dispatch(&ctx, "get_widget_tree", json!([1, 2])).await;
        assert_eq!(resp.error_kind(), Some(ErrorKind::InvalidParameters));
        assert!(d.transport().commands().is_empty());
    }

    #[tokio::test]
    async fn test_document_sent_as_string() {
        let d = dispatcher(FakeTransport::new());
        let ctx = AttentionContext::new();
        ctx.set(Scope::Asset, "/Game/A").await;

        let doc = json!({"widget_name": "Root", "widget_class": "/Script/UMG.CanvasPanel"});
        d.dispatch(&ctx, "apply_json_to_umg", json!({"json_data": doc.clone()}))
            .await;
        let sent = d.transport().commands();
        let text = sent[0].param_str("json_data").unwrap();
        assert_eq!(serde_json::from_str::<Value>(text).unwrap(), doc);

        let resp = d
            .dispatch(&ctx, "apply_json_to_umg", json!({"json_data": "{broken"}))
            .await;
        assert_eq!(resp.error_kind(), Some(ErrorKind::InvalidParameters));
        assert_eq!(d.transport().commands().len(), 1);
    }

    #[tokio::test]
    async fn test_markup_translated_and_sent_as_document_apply() {
        let d = dispatcher(FakeTransport::new());
        let ctx = AttentionContext::new();
        ctx.set(Scope::Asset, "/Game/A").await;

        let resp = d
            .dispatch(
                &ctx,
                "apply_markup",
                json!({"markup": "<CanvasPanel Name=\"Root\"><Button Slot.ZOrder=\"1\"/></CanvasPanel>"}),
            )
            .await;
        assert!(resp.is_success());

        let sent = d.transport().commands();
        assert_eq!(sent[0].name, "apply_json_to_umg");
        assert!(sent[0].parameters.get("markup").is_none());
        let doc: Value = serde_json::from_str(sent[0].param_str("json_data").unwrap()).unwrap();
        assert_eq!(doc["children"][0]["properties"]["Slot"], json!({"ZOrder": 1}));
        assert_eq!(sent[0].param_str("asset_path"), Some("/Game/A"));
    }

    #[tokio::test]
    async fn test_bad_markup_is_local_failure() {
        let d = dispatcher(FakeTransport::new());
        let ctx = AttentionContext::new();
        let resp = d
            .dispatch(&ctx, "apply_markup", json!({"markup": "<A/><B/>"}))
            .await;
        assert_eq!(resp.error_kind(), Some(ErrorKind::InvalidParameters));
        assert!(d.transport().commands().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_operation_still_runs() {
        let reg = OperationRegistry::with_builtins();
        let doc = CatalogueDocument {
            system_instruction: None,
            tools: vec![ToolDescriptor::new("get_creatable_widget_types", "", false)],
        };
        let d = Dispatcher::new(FakeTransport::new())
            .with_catalogue(Catalogue::from_document(&reg, &doc));
        assert!(d.tool_definitions().is_empty());

        let ctx = AttentionContext::new();
        let resp = d.dispatch(&ctx, "get_creatable_widget_types", json!({})).await;
        assert!(resp.is_success());
        assert_eq!(d.transport().names(), vec!["get_creatable_widget_types"]);
    }
}
