//! Batch scripts: a JSON array of operations run against one attention context.
//!
//! ```json
//! [
//!   {"tool": "set_target_umg_asset", "params": {"asset_path": "/Game/UI/WBP_Main"}},
//!   {"tool": "get_widget_tree"}
//! ]
//! ```

use anyhow::{Context, Result};
use hostlink_core::{AttentionContext, Dispatcher, HostTransport, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One scripted call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    pub tool: String,
    #[serde(default)]
    pub params: Value,
}

/// Outcome of one step, printed as a JSON line.
#[derive(Debug, Serialize)]
pub struct StepResult {
    pub tool: String,
    pub response: Value,
}

pub fn parse(text: &str) -> Result<Vec<Step>> {
    serde_json::from_str(text).context("script must be a JSON array of {\"tool\", \"params\"} steps")
}

/// Run steps in order, sharing one context. Returns the results and whether all succeeded.
pub async fn run<T: HostTransport>(
    dispatcher: &Dispatcher<T>,
    ctx: &AttentionContext,
    steps: Vec<Step>,
    stop_on_error: bool,
) -> (Vec<StepResult>, bool) {
    let mut results = Vec::with_capacity(steps.len());
    let mut all_ok = true;
    for (i, step) in steps.into_iter().enumerate() {
        let response: Response = dispatcher.dispatch(ctx, &step.tool, step.params).await;
        let ok = response.is_success();
        results.push(StepResult {
            tool: step.tool,
            response: response.to_value(),
        });
        if !ok {
            all_ok = false;
            if stop_on_error {
                warn!(step = i + 1, "Stopping script after failed step");
                break;
            }
        }
    }
    (results, all_ok)
}
