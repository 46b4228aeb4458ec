use std::sync::Arc;

use switchboard::agents::Orchestrator;
use switchboard::capabilities::completion::CompletionCapability;
use switchboard::capabilities::web_search::WebSearchCapability;
use switchboard::capabilities::wikipedia::WikipediaCapability;
use switchboard::capabilities::CapabilityRegistry;
use switchboard::dispatch::Dispatcher;
use switchboard::prompts::PromptStore;
use switchboard::providers::{
    LlmProvider, MockLlmProvider, MockSearchProvider, MockWikipediaProvider,
};

// Satisfies every agent parser at once, so step completion order does not
// matter to the test.
const UNIVERSAL_RESPONSE: &str = r#"{
    "facts": ["EV sales grew."], "entities": ["EV"], "statistics": [],
    "summary": "EV facts", "key_points": ["growth"],
    "sentiment": "positive", "confidence": 0.9, "tone": ["optimism"],
    "justification": "Upbeat coverage.",
    "comprehensive_response": "Electric vehicles are growing and viewed positively.",
    "key_findings": ["growth", "positive reception"]
}"#;

const THREE_STEP_QUERY: &str =
    "What are the latest developments in electric vehicles and how do people feel about them?";

fn orchestrator(llm: impl LlmProvider + 'static, with_search: bool) -> Orchestrator {
    let mut registry = CapabilityRegistry::new();
    registry
        .register(Arc::new(CompletionCapability::new(Arc::new(llm))))
        .unwrap();
    if with_search {
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
    }

    let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry)));
    Orchestrator::new(dispatcher, Arc::new(PromptStore::with_builtins()))
}

#[tokio::test]
async fn test_three_step_plan() {
    let orchestrator = orchestrator(MockLlmProvider::new(), true);
    let plan = orchestrator.classify(THREE_STEP_QUERY);

    assert!(plan.needs_fact_extraction);
    assert!(plan.needs_sentiment_analysis);
    assert!(plan.needs_web_search);
    assert_eq!(plan.steps().len(), 3);
}

#[tokio::test]
async fn test_all_steps_succeed() {
    let orchestrator = orchestrator(MockLlmProvider::with_response(UNIVERSAL_RESPONSE), true);

    let report = orchestrator.handle_query(THREE_STEP_QUERY).await;

    assert_eq!(report.steps.len(), 3);
    assert!(report.steps.iter().all(|s| s.success));
    assert_eq!(
        report.synthesis.sources_used,
        vec!["fact_extraction", "sentiment_analysis", "web_search"]
    );
    assert_eq!(
        report.synthesis.comprehensive_response,
        "Electric vehicles are growing and viewed positively."
    );
    assert!((report.synthesis.confidence - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_confidence_monotone_in_successful_steps() {
    // All three steps succeed.
    let full = orchestrator(MockLlmProvider::with_response(UNIVERSAL_RESPONSE), true)
        .handle_query(THREE_STEP_QUERY)
        .await;

    // The completion backend is down: fact extraction and sentiment degrade,
    // only the direct web search step succeeds.
    let partial = orchestrator(MockLlmProvider::failing(), true)
        .handle_query(THREE_STEP_QUERY)
        .await;

    assert_eq!(full.synthesis.sources_used.len(), 3);
    assert_eq!(partial.synthesis.sources_used, vec!["web_search"]);
    assert!(full.synthesis.confidence >= partial.synthesis.confidence);
    assert!(partial.synthesis.confidence > 0.0);

    // sources_used counts exactly the successful steps.
    let successes = partial.steps.iter().filter(|s| s.success).count();
    assert_eq!(partial.synthesis.sources_used.len(), successes);
}

#[tokio::test]
async fn test_all_steps_failing_never_raises() {
    // No search backend and a failing completion backend: every planned step
    // fails, synthesis still completes.
    let report = orchestrator(MockLlmProvider::failing(), false)
        .handle_query(THREE_STEP_QUERY)
        .await;

    assert_eq!(report.steps.len(), 3);
    assert!(report.steps.iter().all(|s| !s.success));
    assert!(report.steps.iter().all(|s| s.error.is_some()));
    assert_eq!(report.synthesis.confidence, 0.0);
    assert!(report.synthesis.sources_used.is_empty());
    assert!(report
        .synthesis
        .comprehensive_response
        .contains("Insufficient information"));
}

#[tokio::test]
async fn test_failed_steps_excluded_from_synthesis() {
    let report = orchestrator(MockLlmProvider::failing(), true)
        .handle_query(THREE_STEP_QUERY)
        .await;

    let failed: Vec<_> = report.steps.iter().filter(|s| !s.success).collect();
    assert_eq!(failed.len(), 2);
    for step in failed {
        assert!(!report
            .synthesis
            .sources_used
            .contains(&step.step.as_str().to_string()));
    }
}

#[tokio::test]
async fn test_unstructured_synthesis_completion_damps_confidence() {
    // The two step completions parse; the queue is then exhausted, so the
    // synthesis call gets the mock's plain-prose default.
    let responses = vec![UNIVERSAL_RESPONSE.to_string(), UNIVERSAL_RESPONSE.to_string()];
    let orchestrated = orchestrator(MockLlmProvider::with_responses(responses), true);

    let report = orchestrated.handle_query(THREE_STEP_QUERY).await;

    assert!(report.steps.iter().all(|s| s.success));
    assert_eq!(
        report.synthesis.comprehensive_response,
        "Mock completion response"
    );
    assert!(report.synthesis.confidence < 1.0);
    assert!(report.synthesis.confidence > 0.0);
}
