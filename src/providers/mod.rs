pub mod llm;
pub mod search;
pub mod wikipedia;

pub use llm::{GeminiProvider, LlmProvider, MockLlmProvider};
pub use search::{BraveSearchProvider, MockSearchProvider, SearchProvider, SearchResult};
pub use wikipedia::{MockWikipediaProvider, RestWikipediaProvider, WikiSummary, WikipediaProvider};
