use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::agents::OrchestratorReport;
use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::dispatch::Envelope;
use crate::prompts::stringify_variables;

pub async fn index() -> &'static str {
    "Welcome to the Switchboard capability server!"
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
        "available_capabilities": state.dispatcher.registry().names(),
    }))
}

pub async fn list_capabilities(State(state): State<AppState>) -> Json<Value> {
    let capabilities: Vec<_> = state.dispatcher.registry().list().collect();
    Json(json!({ "capabilities": capabilities }))
}

#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub capability: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Execute a capability. Protocol failures (unknown capability, bad
/// parameters, execution errors) come back as error envelopes with a 200
/// status; only a malformed request body is an HTTP error.
pub async fn dispatch_capability(
    State(state): State<AppState>,
    payload: Result<Json<DispatchRequest>, JsonRejection>,
) -> Result<Json<Envelope>, ApiError> {
    let Json(request) = payload?;
    let envelope = state
        .dispatcher
        .dispatch(&request.capability, request.parameters)
        .await;
    Ok(Json(envelope))
}

#[derive(Debug, Deserialize)]
pub struct FormatPromptRequest {
    pub template: String,
    #[serde(default)]
    pub variables: Map<String, Value>,
}

pub async fn format_prompt(
    State(state): State<AppState>,
    payload: Result<Json<FormatPromptRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let variables = stringify_variables(&request.variables);
    let formatted = state.prompts.format(&request.template, &variables)?;
    Ok(Json(json!({ "formatted": formatted })))
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

pub async fn run_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<OrchestratorReport>, ApiError> {
    let Json(request) = payload?;
    let report = state.orchestrator.handle_query(&request.query).await;
    Ok(Json(report))
}
