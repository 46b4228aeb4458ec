use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use super::{dispatch_completion, extract_json_object, string_list};
use crate::dispatch::Dispatcher;
use crate::prompts::PromptStore;

/// Structured output of a fact-extraction run. A populated `error` means the
/// completion could not be used; callers must check it rather than assume
/// success.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactReport {
    pub facts: Vec<String>,
    pub entities: Vec<String>,
    pub statistics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub key_points: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    pub tools_used: Vec<String>,
}

impl FactReport {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    fn from_parsed(value: &Value) -> Self {
        Self {
            facts: string_list(value, "facts"),
            entities: string_list(value, "entities"),
            statistics: string_list(value, "statistics"),
            summary: value["summary"].as_str().map(|s| s.to_string()),
            key_points: string_list(value, "key_points"),
            error: None,
            raw_response: None,
            tools_used: Vec::new(),
        }
    }
}

/// Extracts factual statements from text, optionally gathering research
/// context through the dispatcher first.
pub struct FactExtractor {
    dispatcher: Arc<Dispatcher>,
    prompts: Arc<PromptStore>,
}

impl FactExtractor {
    pub fn new(dispatcher: Arc<Dispatcher>, prompts: Arc<PromptStore>) -> Self {
        Self {
            dispatcher,
            prompts,
        }
    }

    pub async fn extract_facts(&self, text: &str) -> FactReport {
        let mut variables = HashMap::new();
        variables.insert("text".to_string(), text.to_string());

        let prompt = match self.prompts.format("fact_extraction", &variables) {
            Ok(prompt) => prompt,
            Err(e) => return FactReport::failed(e.to_string()),
        };

        match dispatch_completion(&self.dispatcher, prompt, 512).await {
            Ok(response) => match extract_json_object(&response) {
                Some(parsed) => FactReport::from_parsed(&parsed),
                None => FactReport {
                    raw_response: Some(response),
                    ..FactReport::failed("Failed to parse completion as JSON")
                },
            },
            Err(message) => FactReport::failed(message),
        }
    }

    /// Gather supporting material via web search and encyclopedia lookup,
    /// then extract facts from the combined text. Gathering failures degrade
    /// to extraction over the bare query.
    pub async fn extract_facts_with_research(&self, query: &str) -> FactReport {
        let mut sections = vec![format!("Query: {}", query)];
        let mut tools_used = Vec::new();

        let mut params = Map::new();
        params.insert("query".to_string(), json!(query));
        params.insert("count".to_string(), json!(3));
        let search = self.dispatcher.dispatch("web_search", params).await;
        if search.success {
            if let Some(result) = &search.result {
                sections.push(format!("Web search results: {}", result));
                tools_used.push("web_search".to_string());
            }
        } else {
            log::debug!("research web search unavailable for '{}'", query);
        }

        let mut params = Map::new();
        params.insert("query".to_string(), json!(query));
        params.insert("sentences".to_string(), json!(5));
        let wiki = self.dispatcher.dispatch("wikipedia", params).await;
        if wiki.success {
            if let Some(result) = &wiki.result {
                sections.push(format!("Encyclopedia summary: {}", result));
                tools_used.push("wikipedia".to_string());
            }
        } else {
            log::debug!("research wikipedia lookup unavailable for '{}'", query);
        }

        let combined = sections.join("\n\n");
        let mut report = self.extract_facts(&combined).await;
        report.tools_used = tools_used;
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::completion::CompletionCapability;
    use crate::capabilities::web_search::WebSearchCapability;
    use crate::capabilities::wikipedia::WikipediaCapability;
    use crate::capabilities::CapabilityRegistry;
    use crate::providers::{MockLlmProvider, MockSearchProvider, MockWikipediaProvider};

    fn extractor_with_llm(llm: MockLlmProvider) -> FactExtractor {
        let mut registry = CapabilityRegistry::new();
        registry
            .register(Arc::new(CompletionCapability::new(Arc::new(llm))))
            .unwrap();
        registry
            .register(Arc::new(WebSearchCapability::new(Arc::new(
                MockSearchProvider::new(),
            ))))
            .unwrap();
        registry
            .register(Arc::new(WikipediaCapability::new(Arc::new(
                MockWikipediaProvider::new(),
            ))))
            .unwrap();

        let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry)));
        FactExtractor::new(dispatcher, Arc::new(PromptStore::with_builtins()))
    }

    #[tokio::test]
    async fn test_extract_facts_parses_structure() {
        let response = r#"{"facts": ["The tower is in Paris."], "entities": ["Paris"],
            "statistics": [], "summary": "Tower facts", "key_points": ["location"]}"#;
        let extractor = extractor_with_llm(MockLlmProvider::with_response(response));

        let report = extractor.extract_facts("The tower is in Paris.").await;
        assert!(!report.is_degraded());
        assert_eq!(report.facts, vec!["The tower is in Paris."]);
        assert_eq!(report.entities, vec!["Paris"]);
        assert_eq!(report.summary.as_deref(), Some("Tower facts"));
    }

    #[tokio::test]
    async fn test_extract_facts_parse_failure_is_soft() {
        let extractor =
            extractor_with_llm(MockLlmProvider::with_response("I cannot answer in JSON."));

        let report = extractor.extract_facts("anything").await;
        assert!(report.is_degraded());
        assert!(report.facts.is_empty());
        assert!(report.raw_response.is_some());
    }

    #[tokio::test]
    async fn test_extract_facts_provider_failure_is_soft() {
        let extractor = extractor_with_llm(MockLlmProvider::failing());

        let report = extractor.extract_facts("anything").await;
        assert!(report.is_degraded());
        assert!(report.raw_response.is_none());
    }

    #[tokio::test]
    async fn test_research_records_tools_used() {
        let response = r#"{"facts": ["f"], "entities": [], "statistics": [],
            "summary": "s", "key_points": []}"#;
        let extractor = extractor_with_llm(MockLlmProvider::with_response(response));

        let report = extractor.extract_facts_with_research("electric vehicles").await;
        assert!(!report.is_degraded());
        assert_eq!(report.tools_used, vec!["web_search", "wikipedia"]);
    }
}
