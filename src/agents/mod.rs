pub mod fact_extractor;
pub mod orchestrator;
pub mod sentiment;

pub use fact_extractor::{FactExtractor, FactReport};
pub use orchestrator::{Orchestrator, OrchestratorReport, Plan, StepKind, StepOutcome, Synthesis};
pub use sentiment::{Sentiment, SentimentAnalyzer, SentimentReport};

use serde_json::{Map, Value};

use crate::dispatch::Dispatcher;

/// Pull a JSON object out of completion text. Completions routinely wrap
/// JSON in markdown fences or surround it with prose; this finds the
/// outermost object and parses it.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let mut text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        text = stripped;
    } else if let Some(stripped) = text.strip_prefix("```") {
        text = stripped;
    }
    if let Some(stripped) = text.strip_suffix("```") {
        text = stripped;
    }
    let text = text.trim();

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    serde_json::from_str(&text[start..=end]).ok()
}

/// Dispatch a completion through the `llm` capability and return the text,
/// or the envelope error message. Agents never call the provider directly.
pub(crate) async fn dispatch_completion(
    dispatcher: &Dispatcher,
    prompt: String,
    max_tokens: u32,
) -> Result<String, String> {
    let mut params = Map::new();
    params.insert("prompt".to_string(), Value::String(prompt));
    params.insert("max_tokens".to_string(), Value::from(max_tokens));

    let envelope = dispatcher.dispatch("llm", params).await;
    if envelope.success {
        envelope
            .result
            .as_ref()
            .and_then(|r| r["text"].as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| "completion result missing text".to_string())
    } else {
        Err(envelope
            .error
            .map(|e| e.message)
            .unwrap_or_else(|| "completion failed".to_string()))
    }
}

/// Collect string entries from a JSON array field, tolerating absence.
pub(crate) fn string_list(value: &Value, key: &str) -> Vec<String> {
    value[key]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_plain_json() {
        let value = extract_json_object(r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_extract_fenced_json() {
        let text = "```json\n{\"sentiment\": \"positive\"}\n```";
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["sentiment"], "positive");
    }

    #[test]
    fn test_extract_json_with_surrounding_prose() {
        let text = "Here is the analysis:\n{\"facts\": [\"x\"]}\nHope that helps!";
        let value = extract_json_object(text).unwrap();
        assert_eq!(value["facts"], json!(["x"]));
    }

    #[test]
    fn test_extract_rejects_non_json() {
        assert!(extract_json_object("no braces here").is_none());
        assert!(extract_json_object("{ not valid json }").is_none());
        assert!(extract_json_object("").is_none());
    }

    #[test]
    fn test_string_list_tolerates_absence() {
        let value = json!({"facts": ["a", "b"], "mixed": ["x", 3]});
        assert_eq!(string_list(&value, "facts"), vec!["a", "b"]);
        assert_eq!(string_list(&value, "mixed"), vec!["x"]);
        assert!(string_list(&value, "missing").is_empty());
    }
}
