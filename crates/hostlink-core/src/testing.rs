//! In-process transport double for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::json;

use crate::BoxFuture;
use crate::wire::{Command, HostTransport, Response};

/// Records every command and answers from a per-name script.
///
/// Unscripted commands get `{"outcome":"success","payload":{}}`.
#[derive(Debug, Default)]
pub(crate) struct FakeTransport {
    replies: HashMap<String, Response>,
    sent: Mutex<Vec<Command>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(mut self, name: &str, response: Response) -> Self {
        self.replies.insert(name.to_string(), response);
        self
    }

    pub(crate) fn commands(&self) -> Vec<Command> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub(crate) fn names(&self) -> Vec<String> {
        self.commands().into_iter().map(|c| c.name).collect()
    }
}

impl HostTransport for FakeTransport {
    fn send<'a>(&'a self, command: &'a Command) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(command.clone());
            }
            self.replies
                .get(&command.name)
                .cloned()
                .unwrap_or_else(|| Response::success(json!({})))
        })
    }
}
