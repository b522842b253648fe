// SPDX-License-Identifier: MIT

//! Embedding providers

use crate::adk::error::{ModelError, RagError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Inputs per `/embeddings` request
const BATCH_SIZE: usize = 128;

/// Turns text into dense vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    /// One vector per input, in input order
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_documents(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("empty embedding response".into()).into())
    }
}

/// OpenAI `/embeddings` client
pub struct OpenAIEmbeddings {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl OpenAIEmbeddings {
    /// Requires `OPENAI_API_KEY`; honours `OPENAI_BASE_URL`
    pub fn new(model_name: impl Into<String>) -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ModelError::ApiKeyMissing("OpenAI".to_string()))?;
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self::with_endpoint(api_key, base_url, model_name))
    }

    pub fn with_endpoint(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model_name: model_name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.base_url);
        let body = json!({
            "model": self.model_name,
            "input": batch,
        });

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited {
                retry_after_secs: None,
            }
            .into());
        }
        if !status.is_success() {
            let text = resp.text().await?;
            return Err(RagError::api("OpenAI", format!("{}: {}", status, text)));
        }

        let resp_json: Value = resp.json().await?;
        parse_embeddings(&resp_json, batch.len())
    }
}

/// Vectors from an `/embeddings` response, reordered by `index`
fn parse_embeddings(response: &Value, expected: usize) -> Result<Vec<Vec<f32>>> {
    let data = response["data"]
        .as_array()
        .ok_or_else(|| ModelError::InvalidResponse("no data in embeddings response".into()))?;

    let mut rows = Vec::with_capacity(data.len());
    for (i, item) in data.iter().enumerate() {
        let index = item["index"].as_u64().map_or(i, |n| n as usize);
        let vector = item["embedding"]
            .as_array()
            .ok_or_else(|| ModelError::InvalidResponse("embedding is not an array".into()))?
            .iter()
            .map(|v| v.as_f64().unwrap_or_default() as f32)
            .collect::<Vec<f32>>();
        rows.push((index, vector));
    }
    rows.sort_by_key(|(index, _)| *index);

    if rows.len() != expected {
        return Err(ModelError::InvalidResponse(format!(
            "expected {} embeddings, got {}",
            expected,
            rows.len()
        ))
        .into());
    }
    Ok(rows.into_iter().map(|(_, v)| v).collect())
}

#[async_trait]
impl Embedder for OpenAIEmbeddings {
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(BATCH_SIZE) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        log::debug!("Embedded {} texts with {}", texts.len(), self.model_name);
        Ok(vectors)
    }
}
