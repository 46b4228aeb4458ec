use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::{Capability, ParamSpec, ParamType};
use crate::providers::SearchProvider;

pub struct WebSearchCapability {
    provider: Arc<dyn SearchProvider>,
}

impl WebSearchCapability {
    pub fn new(provider: Arc<dyn SearchProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Capability for WebSearchCapability {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Returns ranked results with titles and descriptions."
    }

    fn parameters(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::required("query", ParamType::String, "The search query"),
            ParamSpec::optional(
                "count",
                ParamType::Integer,
                json!(3),
                "Number of results to return",
            ),
        ]
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value> {
        let query = params["query"]
            .as_str()
            .ok_or_else(|| anyhow!("Missing query parameter"))?;
        let count = params["count"].as_u64().unwrap_or(3) as usize;

        let results = self.provider.search(query, count).await?;

        Ok(json!({
            "query": query,
            "count": results.len(),
            "results": results,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockSearchProvider;

    #[tokio::test]
    async fn test_web_search_results() {
        let capability = WebSearchCapability::new(Arc::new(MockSearchProvider::new()));

        let mut params = Map::new();
        params.insert("query".to_string(), json!("rust"));
        params.insert("count".to_string(), json!(2));

        let result = capability.execute(params).await.unwrap();
        assert_eq!(result["count"], 2);
        assert!(result["results"].is_array());
        assert_eq!(result["results"][0]["title"], "Mock Result 1");
    }
}
