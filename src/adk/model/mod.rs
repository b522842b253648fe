// SPDX-License-Identifier: MIT

//! Model module - defines the LLM model trait and implementations
//!
//! This module provides the core Model trait and shared message types.
//! The only bundled implementation is [openai], which speaks the
//! chat-completions protocol and therefore also covers OpenAI-compatible
//! endpoints (Groq, Ollama, vLLM) through `OPENAI_BASE_URL`.

pub mod openai;

use crate::adk::error::Result;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// Parts of a message - text, thinking, function calls, etc.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Part {
    /// Regular text output from the model
    Text(String),
    /// Reasoning content from thinking models
    Thinking(String),
    /// Function/tool call requested by the model
    FunctionCall {
        /// Provider-issued call id, echoed back on the matching response
        id: String,
        name: String,
        args: serde_json::Value,
    },
    /// Response from executing a function/tool
    FunctionResponse {
        id: String,
        name: String,
        response: serde_json::Value,
    },
}

impl Content {
    pub fn new(role: impl Into<String>, parts: Vec<Part>) -> Self {
        Self {
            role: role.into(),
            parts,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new("system", vec![Part::Text(text.into())])
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new("user", vec![Part::Text(text.into())])
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::new("model", vec![Part::Text(text.into())])
    }

    /// Concatenated `Text` parts, or `None` when the message carries no text
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    pub fn has_function_calls(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, Part::FunctionCall { .. }))
    }
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content>;
}
