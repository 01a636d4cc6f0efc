//! Capability descriptors and derived wire schemas.
//!
//! A capability is described twice: the `CapabilitySpec` is the descriptor
//! an action author writes next to the handler, and the `CapabilityDef` is
//! the JSON-schema form derived from it at registration time and sent to
//! the model backend. The two differ in one important way: parameters of
//! kind `Context` carry the ambient context and are stripped from the
//! visible schema — the backend never learns they exist.

use serde::{Deserialize, Serialize};
use serde_json::json;

/// The type of a capability parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Boolean,
    Number,
    Object,
    /// Ambient context, supplied by the host and hidden from the backend
    Context,
}

impl ParamKind {
    /// JSON-schema type name. Context parameters have no wire form.
    fn schema_type(&self) -> Option<&'static str> {
        match self {
            ParamKind::String => Some("string"),
            ParamKind::Boolean => Some("boolean"),
            ParamKind::Number => Some("number"),
            ParamKind::Object => Some("object"),
            ParamKind::Context => None,
        }
    }
}

/// One declared parameter of a capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,

    pub kind: ParamKind,

    /// Natural-language description shown to the backend; empty when the
    /// author did not provide one.
    #[serde(default)]
    pub description: String,

    /// Default value. A parameter is required iff this is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: String::new(),
            default: None,
        }
    }

    /// The ambient-context parameter.
    pub fn context(name: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Context)
    }

    /// Attach a description.
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Attach a default value, making the parameter optional.
    pub fn default_value(mut self, value: serde_json::Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Required iff no default value was declared.
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// The authored descriptor of a capability. Built once at registration;
/// immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySpec {
    pub name: String,

    /// Natural-language description of what the capability does
    pub description: String,

    /// Ordered parameter list
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

impl CapabilitySpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Append a parameter declaration.
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Whether any parameter carries the ambient context.
    pub fn wants_context(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::Context)
    }

    /// Derive the externally visible definition.
    ///
    /// Context parameters are excluded entirely; everything else maps to a
    /// JSON-schema property, required iff it has no default value.
    pub fn to_def(&self) -> CapabilityDef {
        let mut properties = serde_json::Map::new();
        let mut required: Vec<String> = Vec::new();

        for param in &self.params {
            let Some(schema_type) = param.kind.schema_type() else {
                continue;
            };
            properties.insert(
                param.name.clone(),
                json!({
                    "type": schema_type,
                    "description": param.description,
                }),
            );
            if param.is_required() {
                required.push(param.name.clone());
            }
        }

        CapabilityDef {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

/// A capability definition sent to the model backend so it knows what it
/// may request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityDef {
    /// The capability name
    pub name: String,

    /// Description of what the capability does
    pub description: String,

    /// JSON Schema describing the visible parameters
    pub parameters: serde_json::Value,
}
