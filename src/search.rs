use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::AppConfig;
use crate::db::Store;

pub const NO_RESULTS: &str = "Sorry, I couldn't find relevant results for your query.";
pub const SEARCH_FAILED: &str = "Sorry, I encountered an error while fetching search results.";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrganicResult {
    pub snippet: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

/// What the search provider answered.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// HTTP 200: the ranked organic results, possibly empty.
    Results(Vec<OrganicResult>),
    /// Any other HTTP status.
    HttpStatus(u16),
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> anyhow::Result<SearchOutcome>;
}

/// SerpAPI (`GET /search?q=...&api_key=...`).
pub struct SerpApiClient {
    client: Client,
    api_key: String,
    url: String,
}

impl SerpApiClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.serpapi_api_key.clone(),
            url: config.serpapi_url.clone(),
        }
    }
}

#[async_trait]
impl SearchProvider for SerpApiClient {
    async fn search(&self, query: &str) -> anyhow::Result<SearchOutcome> {
        let resp = self
            .client
            .get(&self.url)
            .query(&[("q", query), ("api_key", self.api_key.as_str())])
            .send()
            .await?;

        if resp.status() != StatusCode::OK {
            return Ok(SearchOutcome::HttpStatus(resp.status().as_u16()));
        }

        let body: SerpResponse = resp.json().await?;
        Ok(SearchOutcome::Results(body.organic_results))
    }
}

/// Runs a web search and turns the top organic result into a chat reply.
pub struct WebSearchRelay {
    provider: Arc<dyn SearchProvider>,
    store: Arc<dyn Store>,
}

impl WebSearchRelay {
    pub fn new(provider: Arc<dyn SearchProvider>, store: Arc<dyn Store>) -> Self {
        Self { provider, store }
    }

    /// Returns the text to send back. Only a successful summary is logged
    /// to the conversation history of `chat_id`.
    pub async fn search(&self, query: &str, chat_id: i64) -> anyhow::Result<String> {
        let outcome = match self.provider.search(query).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Web search for chat {} failed: {}", chat_id, e);
                return Ok(SEARCH_FAILED.to_string());
            }
        };

        let results = match outcome {
            SearchOutcome::Results(results) => results,
            SearchOutcome::HttpStatus(status) => {
                tracing::warn!("Search provider answered HTTP {} for chat {}", status, chat_id);
                return Ok(SEARCH_FAILED.to_string());
            }
        };

        let Some(top) = results.first() else {
            return Ok(NO_RESULTS.to_string());
        };

        let summary = summarize(top);
        self.store.log_conversation(chat_id, query, &summary).await?;
        tracing::info!("🔎 Web search answered for chat {}", chat_id);

        Ok(summary)
    }
}

fn summarize(result: &OrganicResult) -> String {
    format!(
        "Here is a summary for your query:\n\n{}...\n\nFor more details, check the full article here: {}",
        result.snippet.as_deref().unwrap_or("No summary available"),
        result.link.as_deref().unwrap_or("(no link provided)"),
    )
}
