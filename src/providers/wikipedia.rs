use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiSummary {
    pub title: String,
    pub summary: String,
    pub url: String,
}

#[async_trait]
pub trait WikipediaProvider: Send + Sync {
    async fn lookup(&self, query: &str, sentences: usize) -> Result<WikiSummary>;
}

/// Provider backed by the Wikipedia REST summary endpoint.
#[derive(Debug, Clone)]
pub struct RestWikipediaProvider {
    endpoint: String,
    timeout: Duration,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct WikipediaResponse {
    title: String,
    extract: String,
    content_urls: Option<WikipediaContentUrls>,
}

#[derive(Debug, Deserialize)]
struct WikipediaContentUrls {
    desktop: WikipediaDesktopUrls,
}

#[derive(Debug, Deserialize)]
struct WikipediaDesktopUrls {
    page: String,
}

impl RestWikipediaProvider {
    pub fn new() -> Self {
        Self {
            endpoint: "https://en.wikipedia.org/api/rest_v1/page/summary".to_string(),
            timeout: Duration::from_secs(30),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for RestWikipediaProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep the first `sentences` sentences of a summary extract.
fn truncate_sentences(text: &str, sentences: usize) -> String {
    if sentences == 0 {
        return String::new();
    }
    text.split_inclusive(". ")
        .take(sentences)
        .collect::<String>()
        .trim()
        .to_string()
}

#[async_trait]
impl WikipediaProvider for RestWikipediaProvider {
    async fn lookup(&self, query: &str, sentences: usize) -> Result<WikiSummary> {
        let title = query.trim().replace(' ', "_");
        let url = format!("{}/{}", self.endpoint, title);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Wikipedia API error {} for '{}'", status, query);
        }

        let result: WikipediaResponse = response.json().await?;

        Ok(WikiSummary {
            summary: truncate_sentences(&result.extract, sentences),
            url: result
                .content_urls
                .map(|u| u.desktop.page)
                .unwrap_or_default(),
            title: result.title,
        })
    }
}

pub struct MockWikipediaProvider;

impl Default for MockWikipediaProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWikipediaProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WikipediaProvider for MockWikipediaProvider {
    async fn lookup(&self, query: &str, _sentences: usize) -> Result<WikiSummary> {
        Ok(WikiSummary {
            title: query.to_string(),
            summary: format!("Mock encyclopedia summary for {}", query),
            url: "https://en.wikipedia.org/wiki/Mock".to_string(),
        })
    }
}
