use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use super::{Capability, ParamSpec, ParamType};

/// Structured-data processing over a JSON document supplied as text.
///
/// Operations: `validate` reports whether the document parses, `keys` lists
/// the top-level object keys, `extract` pulls the value at a JSON pointer.
pub struct DataProcessorCapability;

impl DataProcessorCapability {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DataProcessorCapability {
    fn default() -> Self {
        Self::new()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl Capability for DataProcessorCapability {
    fn name(&self) -> &str {
        "process_data"
    }

    fn description(&self) -> &str {
        "Process a JSON document: validate it, list its keys, or extract a value by JSON pointer."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("data", ParamType::String, "The JSON document text"),
            ParamSpec::optional(
                "operation",
                ParamType::String,
                json!("validate"),
                "One of: validate, keys, extract",
            ),
            ParamSpec::optional(
                "pointer",
                ParamType::String,
                json!(""),
                "JSON pointer for the extract operation",
            ),
        ]
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value> {
        let data = params["data"]
            .as_str()
            .ok_or_else(|| anyhow!("Missing data parameter"))?;
        let operation = params["operation"].as_str().unwrap_or("validate");

        let parsed: std::result::Result<Value, _> = serde_json::from_str(data);

        match operation {
            // Invalid input is a data-level outcome here, not a failure.
            "validate" => Ok(match parsed {
                Ok(value) => json!({"valid": true, "kind": value_kind(&value)}),
                Err(e) => json!({"valid": false, "error": e.to_string()}),
            }),
            "keys" => {
                let value = parsed.map_err(|e| anyhow!("Invalid JSON document: {}", e))?;
                let object = value
                    .as_object()
                    .ok_or_else(|| anyhow!("Document is not a JSON object"))?;
                let mut keys: Vec<&String> = object.keys().collect();
                keys.sort();
                Ok(json!({"keys": keys, "count": keys.len()}))
            }
            "extract" => {
                let value = parsed.map_err(|e| anyhow!("Invalid JSON document: {}", e))?;
                let pointer = params["pointer"].as_str().unwrap_or("");
                let extracted = value
                    .pointer(pointer)
                    .ok_or_else(|| anyhow!("No value at pointer '{}'", pointer))?;
                Ok(json!({"pointer": pointer, "value": extracted}))
            }
            other => Err(anyhow!("Unsupported operation: {}", other)),
        }
    }
}
