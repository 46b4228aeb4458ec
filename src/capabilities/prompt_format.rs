use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{Capability, ParamSpec, ParamType};
use crate::prompts::{stringify_variables, PromptStore};

/// Formats a registered prompt template with caller-supplied variables.
pub struct PromptFormatCapability {
    prompts: Arc<PromptStore>,
}

impl PromptFormatCapability {
    pub fn new(prompts: Arc<PromptStore>) -> Self {
        Self { prompts }
    }
}

#[async_trait]
impl Capability for PromptFormatCapability {
    fn name(&self) -> &str {
        "format_prompt"
    }

    fn description(&self) -> &str {
        "Format a registered prompt template with variables. Formatting is all-or-nothing."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("template", ParamType::String, "Name of a registered template"),
            ParamSpec::optional(
                "variables",
                ParamType::Object,
                json!({}),
                "Values for the template placeholders",
            ),
        ]
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value> {
        let template = params["template"]
            .as_str()
            .ok_or_else(|| anyhow!("Missing template parameter"))?;
        let variables = params["variables"]
            .as_object()
            .map(stringify_variables)
            .unwrap_or_default();

        let formatted = self.prompts.format(template, &variables)?;

        Ok(json!({
            "formatted": formatted,
        }))
    }
}
