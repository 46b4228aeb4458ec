use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{Capability, ParamSpec, ParamType};
use crate::providers::LlmProvider;

/// Completion generation over the configured language-model backend.
pub struct CompletionCapability {
    provider: Arc<dyn LlmProvider>,
}

impl CompletionCapability {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Capability for CompletionCapability {
    fn name(&self) -> &str {
        "llm"
    }

    fn description(&self) -> &str {
        "Generate a text completion for a prompt."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("prompt", ParamType::String, "The prompt to complete"),
            ParamSpec::optional(
                "max_tokens",
                ParamType::Integer,
                json!(256),
                "Upper bound on generated tokens",
            ),
        ]
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value> {
        let prompt = params["prompt"]
            .as_str()
            .ok_or_else(|| anyhow!("Missing prompt parameter"))?;
        let max_tokens = params["max_tokens"].as_u64().unwrap_or(256) as u32;

        let text = self.provider.complete(prompt, max_tokens).await?;

        Ok(json!({
            "text": text,
        }))
    }
}
