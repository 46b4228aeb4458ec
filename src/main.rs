use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use switchboard::agents::Orchestrator;
use switchboard::api::{serve, AppState};
use switchboard::capabilities::completion::CompletionCapability;
use switchboard::capabilities::data_processor::DataProcessorCapability;
use switchboard::capabilities::file_reader::FileReaderCapability;
use switchboard::capabilities::prompt_format::PromptFormatCapability;
use switchboard::capabilities::web_search::WebSearchCapability;
use switchboard::capabilities::wikipedia::WikipediaCapability;
use switchboard::capabilities::CapabilityRegistry;
use switchboard::dispatch::Dispatcher;
use switchboard::prompts::PromptStore;
use switchboard::providers::{BraveSearchProvider, GeminiProvider, RestWikipediaProvider};
use switchboard::resources::ResourceStore;
use switchboard::Config;

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(about = "Named-capability dispatch and orchestration server", long_about = None)]
#[command(version)]
struct Cli {
    #[arg(long, global = true, help = "Path to a TOML config file")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        #[arg(long, help = "Override the configured port")]
        port: Option<u16>,
    },
    /// Dispatch a single capability and print the envelope
    Call {
        capability: String,
        #[arg(long, default_value = "{}", help = "Parameters as a JSON object")]
        params: String,
    },
    /// Run an orchestrated query and print the report
    Query { query: String },
    /// List registered capabilities
    Capabilities,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            let state = build_state(&config)?;
            serve(state, port.unwrap_or(config.port)).await
        }
        Commands::Call { capability, params } => {
            let state = build_state(&config)?;
            let parameters: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&params).context("parsing --params as a JSON object")?;
            let envelope = state.dispatcher.dispatch(&capability, parameters).await;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
            Ok(())
        }
        Commands::Query { query } => {
            let state = build_state(&config)?;
            let report = state.orchestrator.handle_query(&query).await;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Capabilities => {
            let state = build_state(&config)?;
            for info in state.dispatcher.registry().list() {
                println!("{}: {}", info.name, info.description);
            }
            Ok(())
        }
    }
}

/// Assemble the registries, dispatcher, and orchestrator from configuration.
/// Capabilities whose backend is not configured are left unregistered and
/// surface as unknown-capability envelopes.
fn build_state(config: &Config) -> Result<AppState> {
    let timeout = Duration::from_secs(config.request_timeout_secs);

    let resources = match ResourceStore::from_dir(config.resource_dir.clone()) {
        Ok(store) => {
            log::info!(
                "registered {} resource(s) from {}",
                store.names().len(),
                config.resource_dir.display()
            );
            store
        }
        Err(e) => {
            log::warn!("resource directory unavailable ({}); serving no resources", e);
            ResourceStore::new(config.resource_dir.clone(), Vec::new())
        }
    };
    let resources = Arc::new(resources);
    let prompts = Arc::new(PromptStore::with_builtins());

    let mut registry = CapabilityRegistry::new();
    registry.register(Arc::new(FileReaderCapability::new(resources.clone())))?;
    registry.register(Arc::new(PromptFormatCapability::new(prompts.clone())))?;
    registry.register(Arc::new(DataProcessorCapability::new()))?;
    registry.register(Arc::new(WikipediaCapability::new(Arc::new(
        RestWikipediaProvider::new().with_timeout(timeout),
    ))))?;

    match &config.gemini_api_key {
        Some(key) => {
            let provider = GeminiProvider::new(key.clone())
                .with_model(config.model.clone())
                .with_timeout(timeout);
            registry.register(Arc::new(CompletionCapability::new(Arc::new(provider))))?;
        }
        None => log::warn!("GEMINI_API_KEY not set; completion capability disabled"),
    }

    match &config.brave_api_key {
        Some(key) => {
            let provider = BraveSearchProvider::new(key.clone()).with_timeout(timeout);
            registry.register(Arc::new(WebSearchCapability::new(Arc::new(provider))))?;
        }
        None => log::warn!("BRAVE_API_KEY not set; web search capability disabled"),
    }

    let dispatcher = Arc::new(Dispatcher::new(Arc::new(registry)));
    let orchestrator = Arc::new(Orchestrator::new(dispatcher.clone(), prompts.clone()));

    Ok(AppState {
        dispatcher,
        prompts,
        orchestrator,
    })
}
