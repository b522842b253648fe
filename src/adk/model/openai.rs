// SPDX-License-Identifier: MIT

//! OpenAI Model - chat-completions API implementation

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::{ModelError, RagError, Result};
use crate::adk::tool::Tool;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI chat-completions model implementation
pub struct OpenAIModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
    /// Used when the caller passes no per-request config
    default_config: Option<GenerationConfig>,
}

impl OpenAIModel {
    /// Create a new OpenAIModel
    ///
    /// Requires `OPENAI_API_KEY` environment variable to be set.
    /// Optionally uses `OPENAI_BASE_URL` for custom endpoints.
    pub fn new(model_name: impl Into<String>) -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ModelError::ApiKeyMissing("OpenAI".to_string()))?;
        let base_url = env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self::with_endpoint(api_key, base_url, model_name))
    }

    /// Create a model against an explicit endpoint
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
            default_config: None,
        }
    }

    pub fn with_generation_config(mut self, config: GenerationConfig) -> Self {
        self.default_config = Some(config);
        self
    }

    /// Convert internal Content to one or more OpenAI messages
    ///
    /// Tool results fan out into one `tool` message per response because the
    /// API matches them to calls by `tool_call_id`.
    fn content_to_openai_messages(content: &Content) -> Vec<Value> {
        let role = match content.role.as_str() {
            "model" => "assistant",
            other => other,
        };

        let responses: Vec<Value> = content
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::FunctionResponse { id, response, .. } => Some(json!({
                    "role": "tool",
                    "tool_call_id": id,
                    "content": match response {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    }
                })),
                _ => None,
            })
            .collect();
        if !responses.is_empty() {
            return responses;
        }

        let mut tool_calls = Vec::new();
        let mut text_content = String::new();

        for part in &content.parts {
            match part {
                Part::Text(t) => text_content.push_str(t),
                // Reasoning is not replayed to the API
                Part::Thinking(_) => {}
                Part::FunctionCall { id, name, args } => {
                    tool_calls.push(json!({
                        "id": id,
                        "type": "function",
                        "function": {
                            "name": name,
                            "arguments": args.to_string()
                        }
                    }));
                }
                Part::FunctionResponse { .. } => {}
            }
        }

        if !tool_calls.is_empty() {
            vec![json!({
                "role": role,
                "content": if text_content.is_empty() { Value::Null } else { json!(text_content) },
                "tool_calls": tool_calls
            })]
        } else {
            vec![json!({
                "role": role,
                "content": text_content
            })]
        }
    }

    /// Convert tools to OpenAI function format
    fn tools_to_openai_format(tools: &[Arc<dyn Tool>]) -> Vec<Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "type": "function",
                    "function": {
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.schema()
                    }
                })
            })
            .collect()
    }

    /// Parse OpenAI response into Content
    fn parse_openai_response(response: &Value) -> Result<Content> {
        let choice = response["choices"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| ModelError::InvalidResponse("No choices in OpenAI response".into()))?;

        let message = &choice["message"];
        let mut parts = Vec::new();

        if let Some(reasoning) = message["reasoning_content"].as_str() {
            if !reasoning.is_empty() {
                parts.push(Part::Thinking(reasoning.to_string()));
            }
        }

        if let Some(content) = message["content"].as_str() {
            if !content.is_empty() {
                parts.push(Part::Text(content.to_string()));
            }
        }

        if let Some(tool_calls) = message["tool_calls"].as_array() {
            for (i, tc) in tool_calls.iter().enumerate() {
                let name = tc["function"]["name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                let id = tc["id"]
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("call_{}", i));
                let args_str = tc["function"]["arguments"].as_str().unwrap_or("{}");
                let args: Value = serde_json::from_str(args_str).unwrap_or(json!({}));

                parts.push(Part::FunctionCall { id, name, args });
            }
        }

        Ok(Content {
            role: "model".to_string(),
            parts,
        })
    }
}

#[async_trait]
impl Model for OpenAIModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content> {
        let url = format!("{}/chat/completions", self.base_url);

        let messages: Vec<Value> = history
            .iter()
            .flat_map(Self::content_to_openai_messages)
            .collect();

        let mut body = json!({
            "model": self.model_name,
            "messages": messages
        });

        if let Some(cfg) = config.or(self.default_config.as_ref()) {
            if let Some(temp) = cfg.temperature {
                body["temperature"] = json!(temp);
            }
            if let Some(max_tokens) = cfg.max_output_tokens {
                body["max_tokens"] = json!(max_tokens);
            }
            if let Some(top_p) = cfg.top_p {
                body["top_p"] = json!(top_p);
            }
        }

        if let Some(tools) = tools {
            if !tools.is_empty() {
                body["tools"] = json!(Self::tools_to_openai_format(tools));
                body["tool_choice"] = json!("auto");
            }
        }

        log::debug!(
            "OpenAI request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            return Err(ModelError::RateLimited { retry_after_secs }.into());
        }
        if !status.is_success() {
            let text = resp.text().await?;
            return Err(RagError::api("OpenAI", format!("{}: {}", status, text)));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("OpenAI response: {}", resp_json);

        Self::parse_openai_response(&resp_json)
    }
}
