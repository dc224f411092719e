//! Operation registry and advertised catalogue.
//!
//! Every operation the agent can call is registered once with its parameter
//! shapes, access class, and attention requirements ([`OperationRegistry`]).
//! The [`Catalogue`] then decides which of them are advertised and how they
//! are described, driven by an external catalogue document.

pub mod builtin;
pub mod catalogue;
pub mod registry;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::attention::Scope;
use crate::error::BridgeError;

pub use catalogue::Catalogue;
pub use registry::OperationRegistry;

/// Tool definition as advertised to the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's input parameters.
    pub parameters: Value,
}

/// Structural type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JsonType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
    /// A JSON object, or a string holding one.
    ObjectOrString,
    Any,
}

impl JsonType {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            JsonType::String => value.is_string(),
            JsonType::Integer => value.is_i64() || value.is_u64(),
            JsonType::Number => value.is_number(),
            JsonType::Boolean => value.is_boolean(),
            JsonType::Object => value.is_object(),
            JsonType::Array => value.is_array(),
            JsonType::ObjectOrString => value.is_object() || value.is_string(),
            JsonType::Any => true,
        }
    }

    fn schema(self) -> Value {
        match self {
            JsonType::String => json!({"type": "string"}),
            JsonType::Integer => json!({"type": "integer"}),
            JsonType::Number => json!({"type": "number"}),
            JsonType::Boolean => json!({"type": "boolean"}),
            JsonType::Object => json!({"type": "object"}),
            JsonType::Array => json!({"type": "array"}),
            JsonType::ObjectOrString => json!({"type": ["object", "string"]}),
            JsonType::Any => json!({}),
        }
    }

    fn name(self) -> &'static str {
        match self {
            JsonType::String => "a string",
            JsonType::Integer => "an integer",
            JsonType::Number => "a number",
            JsonType::Boolean => "a boolean",
            JsonType::Object => "an object",
            JsonType::Array => "an array",
            JsonType::ObjectOrString => "an object or a JSON string",
            JsonType::Any => "any value",
        }
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub ty: JsonType,
    pub required: bool,
    pub description: String,
}

/// Whether an operation mutates host state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Read,
    Write,
}

/// Grouping used for listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Context,
    Introspection,
    StructureRead,
    StructureWrite,
    Bulk,
    Timeline,
    Material,
    Blueprint,
    Editor,
}

/// How an operation depends on one attention scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeUse {
    /// Must resolve (cache or host query); injected under the scope's parameter.
    Inject(Scope),
    /// Injected when cached; otherwise left to the host.
    InjectIfKnown(Scope),
    /// Must be cached locally; not sent.
    Guard(Scope),
}

impl ScopeUse {
    pub fn scope(self) -> Scope {
        match self {
            ScopeUse::Inject(s) | ScopeUse::InjectIfKnown(s) | ScopeUse::Guard(s) => s,
        }
    }
}

/// A selection operation records one of its parameters as the new value of a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub scope: Scope,
    pub param: String,
}

/// Local transformation applied to parameters before sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preprocess {
    None,
    /// The named parameter holds a widget document; send it as a JSON string.
    Document(String),
    /// The named parameter holds tag markup; translate it into a widget
    /// document sent under `json_data`.
    Markup(String),
}

/// A registered operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub access: Access,
    pub params: Vec<ParamSpec>,
    pub scopes: Vec<ScopeUse>,
    pub selects: Option<Selection>,
    /// Command name sent to the host.
    pub wire_name: String,
    pub preprocess: Preprocess,
}

impl Operation {
    pub fn new(
        name: impl Into<String>,
        category: Category,
        access: Access,
        description: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            wire_name: name.clone(),
            name,
            description: description.into(),
            category,
            access,
            params: Vec::new(),
            scopes: Vec::new(),
            selects: None,
            preprocess: Preprocess::None,
        }
    }

    pub fn read(
        name: impl Into<String>,
        category: Category,
        description: impl Into<String>,
    ) -> Self {
        Self::new(name, category, Access::Read, description)
    }

    pub fn write(
        name: impl Into<String>,
        category: Category,
        description: impl Into<String>,
    ) -> Self {
        Self::new(name, category, Access::Write, description)
    }

    /// Declare a required parameter.
    pub fn param(self, name: &str, ty: JsonType, description: &str) -> Self {
        self.push_param(name, ty, true, description)
    }

    /// Declare an optional parameter.
    pub fn optional(self, name: &str, ty: JsonType, description: &str) -> Self {
        self.push_param(name, ty, false, description)
    }

    fn push_param(mut self, name: &str, ty: JsonType, required: bool, description: &str) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            ty,
            required,
            description: description.to_string(),
        });
        self
    }

    /// Resolve `scope` and inject it. Also declares its parameter as optional.
    pub fn injects(mut self, scope: Scope) -> Self {
        self.scopes.push(ScopeUse::Inject(scope));
        self.declare_scope_param(scope)
    }

    pub fn injects_if_known(mut self, scope: Scope) -> Self {
        self.scopes.push(ScopeUse::InjectIfKnown(scope));
        self.declare_scope_param(scope)
    }

    pub fn guarded_by(mut self, scope: Scope) -> Self {
        self.scopes.push(ScopeUse::Guard(scope));
        self
    }

    pub fn selects(mut self, scope: Scope, param: &str) -> Self {
        self.selects = Some(Selection {
            scope,
            param: param.to_string(),
        });
        self
    }

    pub fn sends_as(mut self, wire_name: &str) -> Self {
        self.wire_name = wire_name.to_string();
        self
    }

    pub fn preprocess(mut self, preprocess: Preprocess) -> Self {
        self.preprocess = preprocess;
        self
    }

    fn declare_scope_param(self, scope: Scope) -> Self {
        if self.params.iter().any(|p| p.name == scope.param()) {
            return self;
        }
        let description = format!("Defaults to the current {}.", scope.label());
        self.optional(scope.param(), JsonType::String, &description)
    }

    /// JSON Schema of the parameters.
    pub fn schema(&self) -> Value {
        let mut properties = Map::new();
        for p in &self.params {
            let mut schema = p.ty.schema();
            if !p.description.is_empty()
                && let Value::Object(obj) = &mut schema
            {
                obj.insert("description".into(), Value::String(p.description.clone()));
            }
            properties.insert(p.name.clone(), schema);
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();
        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Advertised definition, with an optional description override.
    pub fn definition(&self, description: Option<&str>) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: description
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(&self.description)
                .to_string(),
            parameters: self.schema(),
        }
    }

    /// Structural check: required parameters present, declared types respected.
    ///
    /// Undeclared parameters pass through untouched.
    pub fn validate(&self, params: &Map<String, Value>) -> Result<(), BridgeError> {
        for spec in &self.params {
            match params.get(&spec.name) {
                None | Some(Value::Null) if spec.required => {
                    return Err(BridgeError::invalid(
                        &self.name,
                        format!("missing required parameter '{}'", spec.name),
                    ));
                }
                Some(value) if !value.is_null() && !spec.ty.matches(value) => {
                    return Err(BridgeError::invalid(
                        &self.name,
                        format!("parameter '{}' must be {}", spec.name, spec.ty.name()),
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
