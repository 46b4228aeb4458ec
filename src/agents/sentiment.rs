use serde::{Deserialize, Serialize};
use serde_json::{json, Map};
use std::collections::HashMap;
use std::sync::Arc;

use super::{dispatch_completion, extract_json_object, string_list};
use crate::dispatch::Dispatcher;
use crate::prompts::PromptStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Mixed,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Mixed => "mixed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "negative" => Some(Sentiment::Negative),
            "neutral" => Some(Sentiment::Neutral),
            "mixed" => Some(Sentiment::Mixed),
            _ => None,
        }
    }
}

/// Structured output of a sentiment run. On parse failure `sentiment` falls
/// back to neutral and `error` carries the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentReport {
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub tone: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
    pub tools_used: Vec<String>,
}

impl SentimentReport {
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            confidence: 0.0,
            tone: Vec::new(),
            justification: None,
            error: Some(message.into()),
            raw_response: None,
            tools_used: Vec::new(),
        }
    }
}

/// Analyzes the emotional tone of text, optionally with web-search context
/// for the topic under discussion.
pub struct SentimentAnalyzer {
    dispatcher: Arc<Dispatcher>,
    prompts: Arc<PromptStore>,
}

impl SentimentAnalyzer {
    pub fn new(dispatcher: Arc<Dispatcher>, prompts: Arc<PromptStore>) -> Self {
        Self {
            dispatcher,
            prompts,
        }
    }

    pub async fn analyze_sentiment(&self, text: &str) -> SentimentReport {
        self.analyze(text, "No additional context".to_string(), Vec::new())
            .await
    }

    /// Gather recent opinions on `topic` first, then analyze with that
    /// context attached. A failed search degrades to the plain analysis.
    pub async fn analyze_with_context(&self, text: &str, topic: &str) -> SentimentReport {
        let mut params = Map::new();
        params.insert(
            "query".to_string(),
            json!(format!("{} sentiment opinions", topic)),
        );
        params.insert("count".to_string(), json!(2));

        let search = self.dispatcher.dispatch("web_search", params).await;
        let (context, tools_used) = if search.success {
            match &search.result {
                Some(result) => (
                    format!("Context data: {}", result),
                    vec!["web_search".to_string()],
                ),
                None => ("No additional context".to_string(), Vec::new()),
            }
        } else {
            log::debug!("sentiment context search unavailable for '{}'", topic);
            ("No additional context".to_string(), Vec::new())
        };

        self.analyze(text, context, tools_used).await
    }

    async fn analyze(
        &self,
        text: &str,
        context: String,
        tools_used: Vec<String>,
    ) -> SentimentReport {
        let mut variables = HashMap::new();
        variables.insert("text".to_string(), text.to_string());
        variables.insert("context".to_string(), context);

        let prompt = match self.prompts.format("sentiment_analysis", &variables) {
            Ok(prompt) => prompt,
            Err(e) => return SentimentReport::failed(e.to_string()),
        };

        let response = match dispatch_completion(&self.dispatcher, prompt, 512).await {
            Ok(response) => response,
            Err(message) => {
                let mut report = SentimentReport::failed(message);
                report.tools_used = tools_used;
                return report;
            }
        };

        match extract_json_object(&response) {
            Some(parsed) => {
                let sentiment = parsed["sentiment"]
                    .as_str()
                    .and_then(Sentiment::parse)
                    .unwrap_or(Sentiment::Neutral);
                let confidence = parsed["confidence"].as_f64().unwrap_or(0.0).clamp(0.0, 1.0);

                SentimentReport {
                    sentiment,
                    confidence,
                    tone: string_list(&parsed, "tone"),
                    justification: parsed["justification"].as_str().map(|s| s.to_string()),
                    error: None,
                    raw_response: None,
                    tools_used,
                }
            }
            None => {
                let mut report = SentimentReport::failed("Failed to parse completion as JSON");
                report.raw_response = Some(response);
                report.tools_used = tools_used;
                report
            }
        }
    }
}
