//! Registry of every operation the dispatcher can run.

use std::collections::HashMap;

use super::{Category, Operation, ToolDefinition, builtin};

/// All known operations, in registration order.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    operations: Vec<Operation>,
    index: HashMap<String, usize>,
}

impl OperationRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the built-in host operations.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for op in builtin::operations() {
            registry.register(op);
        }
        registry
    }

    /// Register an operation, replacing any previous one with the same name.
    pub fn register(&mut self, op: Operation) {
        match self.index.get(&op.name) {
            Some(&i) => self.operations[i] = op,
            None => {
                self.index.insert(op.name.clone(), self.operations.len());
                self.operations.push(op);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Operation> {
        self.index.get(name).map(|&i| &self.operations[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.operations.iter().map(|op| op.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.operations.iter()
    }

    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &Operation> {
        self.operations.iter().filter(move |op| op.category == category)
    }

    /// Definitions of every registered operation with built-in descriptions.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.operations.iter().map(|op| op.definition(None)).collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}
