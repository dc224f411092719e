//! Tool catalogue document.
//!
//! The catalogue document is an external JSON file that decides which
//! operations are advertised to the calling agent and how they are described,
//! without touching code:
//!
//! ```json
//! {
//!   "system_instruction": "You are a UI design partner...",
//!   "tools": [
//!     { "name": "get_widget_tree", "description": "Full hierarchy.", "enabled": true },
//!     { "name": "delete_widget", "enabled": false }
//!   ]
//! }
//! ```
//!
//! Entries default to `enabled = true` and an empty description (the
//! operation's built-in description is used in that case).

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors from loading a catalogue document.
#[derive(Debug, thiserror::Error)]
pub enum CatalogueError {
    #[error("failed to read catalogue document: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalogue document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid catalogue document: {0}")]
    Validation(String),
}

/// One advertised operation as declared in the catalogue document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            enabled,
        }
    }
}

/// The parsed catalogue document.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CatalogueDocument {
    /// Free-form instruction text shipped alongside the tools.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<String>,

    /// Declared tools, in document order.
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

impl CatalogueDocument {
    /// Load a catalogue document from a JSON file using async I/O.
    pub async fn load(path: &Path) -> Result<Self, CatalogueError> {
        let content = tokio::fs::read_to_string(path).await?;
        let doc = Self::parse(&content)?;
        tracing::info!(
            path = %path.display(),
            declared = doc.tools.len(),
            enabled = doc.enabled_count(),
            "Loaded tool catalogue"
        );
        Ok(doc)
    }

    /// Parse a catalogue document from a JSON string.
    pub fn parse(s: &str) -> Result<Self, CatalogueError> {
        let doc: CatalogueDocument = serde_json::from_str(s)?;
        doc.validate()?;
        Ok(doc)
    }

    /// Reject empty or duplicated tool names.
    pub fn validate(&self) -> Result<(), CatalogueError> {
        let mut seen = HashSet::new();
        for (i, tool) in self.tools.iter().enumerate() {
            if tool.name.trim().is_empty() {
                return Err(CatalogueError::Validation(format!(
                    "tools[{i}].name must not be empty"
                )));
            }
            if !seen.insert(tool.name.as_str()) {
                return Err(CatalogueError::Validation(format!(
                    "tools[{i}].name {:?} is declared more than once",
                    tool.name
                )));
            }
        }
        Ok(())
    }

    /// Look up a declared tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Number of declared tools with `enabled = true`.
    pub fn enabled_count(&self) -> usize {
        self.tools.iter().filter(|t| t.enabled).count()
    }
}
