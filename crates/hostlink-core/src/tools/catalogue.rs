//! Advertised tool catalogue.
//!
//! Built from the registry, optionally filtered and annotated by a catalogue
//! document. When a document is present it is authoritative: only operations
//! it declares and enables are advertised, in document order. Without one,
//! every registered operation is advertised.
//!
//! Advertising is separate from dispatch. A disabled or undeclared operation
//! is hidden from the agent but still runs if invoked by name.

use std::collections::HashSet;
use std::path::Path;

use hostlink_config::{CatalogueDocument, CatalogueError};
use tracing::{info, warn};

use super::{OperationRegistry, ToolDefinition};

#[derive(Debug, Clone)]
struct Entry {
    name: String,
    description: Option<String>,
}

/// The set of operations advertised to the agent.
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    entries: Vec<Entry>,
    system_instruction: Option<String>,
}

impl Catalogue {
    /// Advertise every registered operation with its built-in description.
    pub fn all(registry: &OperationRegistry) -> Self {
        Self {
            entries: registry
                .iter()
                .map(|op| Entry {
                    name: op.name.clone(),
                    description: None,
                })
                .collect(),
            system_instruction: None,
        }
    }

    /// Advertise the enabled operations a document declares.
    ///
    /// Declared names the registry does not know are skipped with a warning.
    pub fn from_document(registry: &OperationRegistry, doc: &CatalogueDocument) -> Self {
        let mut entries = Vec::new();
        let mut seen = HashSet::new();
        for tool in &doc.tools {
            if !registry.contains(&tool.name) {
                warn!(tool = %tool.name, "Catalogue declares an unknown operation; skipping");
                continue;
            }
            if !tool.enabled || !seen.insert(tool.name.as_str()) {
                continue;
            }
            entries.push(Entry {
                name: tool.name.clone(),
                description: Some(tool.description.clone()).filter(|d| !d.trim().is_empty()),
            });
        }
        Self {
            entries,
            system_instruction: doc.system_instruction.clone(),
        }
    }

    /// Load a catalogue document from disk and apply it to `registry`.
    pub async fn load(registry: &OperationRegistry, path: &Path) -> Result<Self, CatalogueError> {
        let doc = CatalogueDocument::load(path).await?;
        let catalogue = Self::from_document(registry, &doc);
        info!(
            path = %path.display(),
            advertised = catalogue.len(),
            registered = registry.len(),
            "Tool catalogue applied"
        );
        Ok(catalogue)
    }

    /// Advertised operation names, in catalogue order.
    pub fn advertised(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn is_advertised(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Description override from the document, if any.
    pub fn description(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.description.as_deref())
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    /// Tool definitions for every advertised operation.
    pub fn definitions(&self, registry: &OperationRegistry) -> Vec<ToolDefinition> {
        self.entries
            .iter()
            .filter_map(|e| {
                registry
                    .get(&e.name)
                    .map(|op| op.definition(e.description.as_deref()))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
