use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use super::{dispatch_completion, extract_json_object, string_list};
use super::{FactExtractor, SentimentAnalyzer};
use crate::dispatch::Dispatcher;
use crate::prompts::PromptStore;

const INSUFFICIENT_INFORMATION: &str =
    "Insufficient information to answer the query.";

/// What a query needs, decided by classification before any step runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub needs_fact_extraction: bool,
    pub needs_sentiment_analysis: bool,
    pub needs_web_search: bool,
}

impl Plan {
    pub fn steps(&self) -> Vec<StepKind> {
        let mut steps = Vec::new();
        if self.needs_fact_extraction {
            steps.push(StepKind::FactExtraction);
        }
        if self.needs_sentiment_analysis {
            steps.push(StepKind::SentimentAnalysis);
        }
        if self.needs_web_search {
            steps.push(StepKind::WebSearch);
        }
        steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    FactExtraction,
    SentimentAnalysis,
    WebSearch,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::FactExtraction => "fact_extraction",
            StepKind::SentimentAnalysis => "sentiment_analysis",
            StepKind::WebSearch => "web_search",
        }
    }
}

/// Outcome of one executed plan step. Failed steps keep their error here and
/// are excluded from synthesis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: StepKind,
    pub success: bool,
    pub output: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Synthesis {
    pub comprehensive_response: String,
    pub key_findings: Vec<String>,
    pub confidence: f64,
    pub sources_used: Vec<String>,
}

/// Full record of one orchestrated query run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorReport {
    pub query: String,
    pub plan: Plan,
    pub steps: Vec<StepOutcome>,
    pub synthesis: Synthesis,
}

/// Coordinates the specialized agents and capabilities for one query at a
/// time: classify the query, run the planned steps, synthesize one answer.
/// A query run never returns an error; failures are absorbed per step.
pub struct Orchestrator {
    dispatcher: Arc<Dispatcher>,
    prompts: Arc<PromptStore>,
    fact_extractor: FactExtractor,
    sentiment_analyzer: SentimentAnalyzer,
    sentiment_re: Regex,
    info_re: Regex,
    search_re: Regex,
}

impl Orchestrator {
    pub fn new(dispatcher: Arc<Dispatcher>, prompts: Arc<PromptStore>) -> Self {
        let fact_extractor = FactExtractor::new(dispatcher.clone(), prompts.clone());
        let sentiment_analyzer = SentimentAnalyzer::new(dispatcher.clone(), prompts.clone());
        Self {
            dispatcher,
            prompts,
            fact_extractor,
            sentiment_analyzer,
            sentiment_re: Regex::new(
                r"(?i)\b(feel|feels|feeling|feelings|opinion|opinions|love|loves|hate|hates|sentiment|review|reviews|mood|happy|angry|excited|disappointed|amazing|terrible)\b",
            )
            .expect("valid sentiment pattern"),
            info_re: Regex::new(
                r"(?i)\b(what|who|when|where|why|how|explain|describe|fact|facts|information|history|benefits|tell me)\b",
            )
            .expect("valid info pattern"),
            search_re: Regex::new(
                r"(?i)\b(latest|current|recent|recently|news|today|trending|development|developments|search)\b",
            )
            .expect("valid search pattern"),
        }
    }

    /// Keyword classification of the query text. Deterministic; makes no
    /// external call.
    pub fn classify(&self, query: &str) -> Plan {
        Plan {
            needs_fact_extraction: self.info_re.is_match(query),
            needs_sentiment_analysis: self.sentiment_re.is_match(query),
            needs_web_search: self.search_re.is_match(query),
        }
    }

    pub async fn handle_query(&self, query: &str) -> OrchestratorReport {
        let plan = self.classify(query);
        let steps = plan.steps();
        let planned = steps.len();
        log::info!(
            "orchestrating query with {} planned step(s): {:?}",
            planned,
            steps
        );

        // Steps are independent of one another, so they run concurrently;
        // synthesis treats the outcomes as a set keyed by step name.
        let outcomes = futures::future::join_all(
            steps.into_iter().map(|step| self.run_step(step, query, &plan)),
        )
        .await;

        let synthesis = self.synthesize(query, &outcomes, planned).await;

        OrchestratorReport {
            query: query.to_string(),
            plan,
            steps: outcomes,
            synthesis,
        }
    }

    async fn run_step(&self, step: StepKind, query: &str, plan: &Plan) -> StepOutcome {
        match step {
            StepKind::FactExtraction => {
                let report = if plan.needs_web_search {
                    self.fact_extractor.extract_facts_with_research(query).await
                } else {
                    self.fact_extractor.extract_facts(query).await
                };
                StepOutcome {
                    step,
                    success: !report.is_degraded(),
                    error: report.error.clone(),
                    output: serde_json::to_value(&report).unwrap_or(Value::Null),
                }
            }
            StepKind::SentimentAnalysis => {
                let report = if plan.needs_web_search {
                    self.sentiment_analyzer.analyze_with_context(query, query).await
                } else {
                    self.sentiment_analyzer.analyze_sentiment(query).await
                };
                StepOutcome {
                    step,
                    success: !report.is_degraded(),
                    error: report.error.clone(),
                    output: serde_json::to_value(&report).unwrap_or(Value::Null),
                }
            }
            StepKind::WebSearch => {
                let mut params = Map::new();
                params.insert("query".to_string(), json!(query));
                params.insert("count".to_string(), json!(3));
                let envelope = self.dispatcher.dispatch("web_search", params).await;
                StepOutcome {
                    step,
                    success: envelope.success,
                    error: envelope.error.map(|e| e.message),
                    output: envelope.result.unwrap_or(Value::Null),
                }
            }
        }
    }

    /// Combine the successful step outputs into one answer. Always completes:
    /// with no usable material the fixed insufficient-information response is
    /// returned with confidence 0.
    async fn synthesize(
        &self,
        query: &str,
        outcomes: &[StepOutcome],
        planned: usize,
    ) -> Synthesis {
        let successes: Vec<&StepOutcome> = outcomes.iter().filter(|o| o.success).collect();

        if successes.is_empty() {
            return Synthesis {
                comprehensive_response: INSUFFICIENT_INFORMATION.to_string(),
                key_findings: Vec::new(),
                confidence: 0.0,
                sources_used: Vec::new(),
            };
        }

        let fraction = successes.len() as f64 / planned as f64;
        let mut sources_used: Vec<String> = successes
            .iter()
            .map(|o| o.step.as_str().to_string())
            .collect();
        sources_used.sort();

        let material = successes
            .iter()
            .map(|o| format!("## {}\n{}", o.step.as_str(), o.output))
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut variables = HashMap::new();
        variables.insert("query".to_string(), query.to_string());
        variables.insert("material".to_string(), material.clone());

        let prompt = match self.prompts.format("synthesis", &variables) {
            Ok(prompt) => prompt,
            Err(e) => {
                log::warn!("synthesis template unavailable: {}", e);
                return Synthesis {
                    comprehensive_response: format!("Gathered material:\n{}", material),
                    key_findings: Vec::new(),
                    confidence: fraction * 0.5,
                    sources_used,
                };
            }
        };

        match dispatch_completion(&self.dispatcher, prompt, 512).await {
            Ok(response) => match extract_json_object(&response) {
                Some(parsed) => Synthesis {
                    comprehensive_response: parsed["comprehensive_response"]
                        .as_str()
                        .unwrap_or(&response)
                        .to_string(),
                    key_findings: string_list(&parsed, "key_findings"),
                    confidence: fraction,
                    sources_used,
                },
                // Unstructured completion text still answers the query,
                // with slightly damped confidence.
                None => Synthesis {
                    comprehensive_response: response,
                    key_findings: Vec::new(),
                    confidence: fraction * 0.9,
                    sources_used,
                },
            },
            Err(message) => {
                log::warn!("synthesis completion failed: {}", message);
                Synthesis {
                    comprehensive_response: format!(
                        "Unable to synthesize a combined answer: {}",
                        message
                    ),
                    key_findings: Vec::new(),
                    confidence: fraction * 0.5,
                    sources_used,
                }
            }
        }
    }
}
