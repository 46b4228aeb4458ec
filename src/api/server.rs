use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::agents::Orchestrator;
use crate::api::handlers;
use crate::dispatch::Dispatcher;
use crate::prompts::PromptStore;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub prompts: Arc<PromptStore>,
    pub orchestrator: Arc<Orchestrator>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/capabilities", get(handlers::list_capabilities))
        .route("/mcp", post(handlers::dispatch_capability))
        .route("/prompt", post(handlers::format_prompt))
        .route("/query", post(handlers::run_query))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    log::info!("Switchboard API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    use crate::capabilities::completion::CompletionCapability;
    use crate::capabilities::data_processor::DataProcessorCapability;
    use crate::capabilities::file_reader::FileReaderCapability;
    use crate::capabilities::prompt_format::PromptFormatCapability;
    use crate::capabilities::web_search::WebSearchCapability;
    use crate::capabilities::CapabilityRegistry;
    use crate::providers::{MockLlmProvider, MockSearchProvider};
    use crate::resources::ResourceStore;

    fn create_test_app(resource_dir: &TempDir) -> Router {
        std::fs::write(resource_dir.path().join("example.txt"), "hello").unwrap();
        let resources = Arc::new(ResourceStore::new(
            resource_dir.path().to_path_buf(),
            vec!["example.txt".to_string()],
        ));
        let prompts = Arc::new(PromptStore::with_builtins());

        let mut registry = CapabilityRegistry::new();
        registry
            .register(Arc::new(FileReaderCapability::new(resources)))
            .unwrap();
        registry
            .register(Arc::new(CompletionCapability::new(Arc::new(
                MockLlmProvider::new(),
            ))))
            .unwrap();
        registry
            .register(Arc::new(WebSearchCapability::new(Arc::new(
                MockSearchProvider::new(),
            ))))
            .unwrap();
        registry
            .register(Arc::new(PromptFormatCapability::new(prompts.clone())))
            .unwrap();
        registry
            .register(Arc::new(DataProcessorCapability::new()))
            .unwrap();

        let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry)));
        let orchestrator = Arc::new(Orchestrator::new(dispatcher.clone(), prompts.clone()));

        create_router(AppState {
            dispatcher,
            prompts,
            orchestrator,
        })
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let dir = TempDir::new().unwrap();
        let app = create_test_app(&dir);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert!(json["version"].is_string());
        assert!(json["available_capabilities"]
            .as_array()
            .unwrap()
            .contains(&json!("file_reader")));
    }

    #[tokio::test]
    async fn test_capabilities_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        let app = create_test_app(&dir);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/capabilities")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let names: Vec<String> = json["capabilities"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap().to_string())
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(json["capabilities"][0]["parameter_schema"]["type"] == "object");
    }

    #[tokio::test]
    async fn test_dispatch_file_reader() {
        let dir = TempDir::new().unwrap();
        let app = create_test_app(&dir);

        let response = app
            .oneshot(post_json(
                "/mcp",
                json!({"capability": "file_reader", "parameters": {"filename": "example.txt"}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["result"]["content"], "hello");
        assert_eq!(json["metadata"]["capability_name"], "file_reader");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_capability_is_envelope() {
        let dir = TempDir::new().unwrap();
        let app = create_test_app(&dir);

        let response = app
            .oneshot(post_json(
                "/mcp",
                json!({"capability": "nonexistent_tool", "parameters": {}}),
            ))
            .await
            .unwrap();

        // Protocol errors still travel in the envelope.
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["kind"], "unknown_capability");
    }

    #[tokio::test]
    async fn test_dispatch_missing_parameter() {
        let dir = TempDir::new().unwrap();
        let app = create_test_app(&dir);

        let response = app
            .oneshot(post_json(
                "/mcp",
                json!({"capability": "web_search", "parameters": {}}),
            ))
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["kind"], "invalid_parameters");
        assert!(json["error"]["message"].as_str().unwrap().contains("query"));
    }

    #[tokio::test]
    async fn test_format_prompt_endpoint() {
        let dir = TempDir::new().unwrap();
        let app = create_test_app(&dir);

        let response = app
            .oneshot(post_json(
                "/prompt",
                json!({"template": "summarize", "variables": {"text": "some text"}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["formatted"], "Summarize the following text: some text");
    }

    #[tokio::test]
    async fn test_format_prompt_missing_variable() {
        let dir = TempDir::new().unwrap();
        let app = create_test_app(&dir);

        let response = app
            .oneshot(post_json(
                "/prompt",
                json!({"template": "summarize", "variables": {}}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("text"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let app = create_test_app(&dir);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/mcp")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_query_without_keywords() {
        let dir = TempDir::new().unwrap();
        let app = create_test_app(&dir);

        let response = app
            .oneshot(post_json("/query", json!({"query": "zzz qqq blorp"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["synthesis"]["confidence"], 0.0);
        assert!(json["steps"].as_array().unwrap().is_empty());
    }
}
