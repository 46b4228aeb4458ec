use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{Capability, ParamSpec, ParamType};
use crate::providers::WikipediaProvider;

pub struct WikipediaCapability {
    provider: Arc<dyn WikipediaProvider>,
}

impl WikipediaCapability {
    pub fn new(provider: Arc<dyn WikipediaProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Capability for WikipediaCapability {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "Look up an encyclopedia summary for a topic."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("query", ParamType::String, "Topic to look up"),
            ParamSpec::optional(
                "sentences",
                ParamType::Integer,
                json!(3),
                "Number of summary sentences to return",
            ),
        ]
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value> {
        let query = params["query"]
            .as_str()
            .ok_or_else(|| anyhow!("Missing query parameter"))?;
        let sentences = params["sentences"].as_u64().unwrap_or(3) as usize;

        let summary = self.provider.lookup(query, sentences).await?;

        Ok(json!({
            "title": summary.title,
            "summary": summary.summary,
            "url": summary.url,
        }))
    }
}
