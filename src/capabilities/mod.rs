pub mod completion;
pub mod data_processor;
pub mod file_reader;
pub mod prompt_format;
pub mod registry;
pub mod web_search;
pub mod wikipedia;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub use registry::{CapabilityInfo, CapabilityRegistry};

/// JSON types a capability parameter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Object => "object",
            ParamType::Array => "array",
        }
    }

    /// Type compatibility for validation. Integers satisfy `Number`.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Object => value.is_object(),
            ParamType::Array => value.is_array(),
        }
    }
}

/// One declared parameter of a capability schema.
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub default: Option<Value>,
    pub description: String,
}

impl ParamSpec {
    pub fn required(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: true,
            default: None,
            description: description.into(),
        }
    }

    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        default: Value,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            required: false,
            default: Some(default),
            description: description.into(),
        }
    }
}

/// Render a parameter list as a JSON schema object for discovery.
pub fn schema_json(params: &[ParamSpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for spec in params {
        let mut property = Map::new();
        property.insert("type".to_string(), json!(spec.param_type.as_str()));
        property.insert("description".to_string(), json!(spec.description));
        if let Some(default) = &spec.default {
            property.insert("default".to_string(), default.clone());
        }
        properties.insert(spec.name.clone(), Value::Object(property));

        if spec.required {
            required.push(json!(spec.name));
        }
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// A named unit of work dispatchable by name. Constructed once at startup,
/// registered, and immutable thereafter.
#[async_trait]
pub trait Capability: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters(&self) -> Vec<ParamSpec>;

    /// Execute with parameters already validated and defaulted by the
    /// dispatcher. Errors here surface as execution-error envelopes.
    async fn execute(&self, params: Map<String, Value>) -> Result<Value>;
}

impl std::fmt::Debug for dyn Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability").field("name", &self.name()).finish()
    }
}
