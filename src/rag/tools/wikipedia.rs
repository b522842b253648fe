// SPDX-License-Identifier: MIT

//! General-knowledge tool backed by the MediaWiki API

use crate::adk::error::{RagError, Result};
use crate::adk::tool::{query_arg, Tool};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{json, Value};

/// Returned when the search matches no page
pub const NO_RESULTS: &str = "No good Wikipedia Search Result was found";

const MAX_QUERY_CHARS: usize = 300;
const MAX_OUTPUT_CHARS: usize = 4000;
const USER_AGENT: &str = concat!("ragweave/", env!("CARGO_PKG_VERSION"));

static WIKIPEDIA_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "Topic or entity to look up"
            }
        },
        "required": ["query"]
    })
});

pub struct WikipediaTool {
    client: Client,
    api_url: String,
    top_k_results: usize,
}

impl WikipediaTool {
    pub fn new(lang: &str, top_k_results: usize) -> Self {
        Self::with_api_url(
            format!("https://{}.wikipedia.org/w/api.php", lang),
            top_k_results,
        )
    }

    /// Point at any MediaWiki `api.php`
    pub fn with_api_url(api_url: impl Into<String>, top_k_results: usize) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.into(),
            top_k_results,
        }
    }

    /// Search, then fetch the intro of each hit
    pub async fn run(&self, query: &str) -> Result<String> {
        let query: String = query.chars().take(MAX_QUERY_CHARS).collect();
        let search = self
            .get(&[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", &query),
                ("srlimit", &self.top_k_results.to_string()),
                ("format", "json"),
            ])
            .await?;

        let titles = parse_search_titles(&search);
        log::debug!("wikipedia: {} hits for '{}'", titles.len(), query);

        let mut pages = Vec::with_capacity(titles.len());
        for title in titles.into_iter().take(self.top_k_results) {
            let body = self
                .get(&[
                    ("action", "query"),
                    ("prop", "extracts"),
                    ("exintro", "1"),
                    ("explaintext", "1"),
                    ("redirects", "1"),
                    ("titles", &title),
                    ("format", "json"),
                ])
                .await?;
            if let Some(summary) = parse_extract(&body) {
                pages.push((title, summary));
            }
        }

        Ok(format_pages(&pages))
    }

    async fn get(&self, params: &[(&str, &str)]) -> Result<Value> {
        let resp = self
            .client
            .get(&self.api_url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .query(params)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await?;
            return Err(RagError::api("Wikipedia", format!("{}: {}", status, text)));
        }
        Ok(resp.json().await?)
    }
}

fn parse_search_titles(body: &Value) -> Vec<String> {
    body["query"]["search"]
        .as_array()
        .map(|hits| {
            hits.iter()
                .filter_map(|h| h["title"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_extract(body: &Value) -> Option<String> {
    body["query"]["pages"]
        .as_object()?
        .values()
        .find_map(|page| page["extract"].as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn format_pages(pages: &[(String, String)]) -> String {
    if pages.is_empty() {
        return NO_RESULTS.to_string();
    }
    let text = pages
        .iter()
        .map(|(title, summary)| format!("Page: {}\nSummary: {}", title, summary))
        .collect::<Vec<_>>()
        .join("\n\n");
    text.chars().take(MAX_OUTPUT_CHARS).collect()
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "wikipedia"
    }

    fn description(&self) -> &str {
        "Search Wikipedia for general knowledge."
    }

    fn schema(&self) -> &Value {
        &WIKIPEDIA_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let query = query_arg(&input)
            .ok_or_else(|| RagError::api("Wikipedia", "tool call needs a 'query' string"))?;
        Ok(Value::String(self.run(query).await?))
    }
}
