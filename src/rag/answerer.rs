// SPDX-License-Identifier: MIT

//! Answerer collaborator seam
//!
//! The plain responder only needs "prompt in, text out"; [`ModelAnswerer`]
//! adapts any [`Model`] to that contract.

use crate::adk::error::{ModelError, Result};
use crate::adk::model::{Content, GenerationConfig, Model};
use async_trait::async_trait;
use std::sync::Arc;

/// Generates text for a prompt or a message list
#[async_trait]
pub trait Answerer: Send + Sync {
    async fn invoke(&self, messages: &[Content]) -> Result<String>;

    async fn invoke_prompt(&self, prompt: &str) -> Result<String> {
        self.invoke(&[Content::user(prompt)]).await
    }
}

/// Single-call answerer on top of a chat model
pub struct ModelAnswerer {
    model: Arc<dyn Model>,
    config: Option<GenerationConfig>,
}

impl ModelAnswerer {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self {
            model,
            config: None,
        }
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = Some(config);
        self
    }
}

#[async_trait]
impl Answerer for ModelAnswerer {
    async fn invoke(&self, messages: &[Content]) -> Result<String> {
        let response = self
            .model
            .generate_content(messages, self.config.as_ref(), None)
            .await?;
        if response.has_function_calls() {
            return Err(ModelError::InvalidResponse(
                "unexpected tool call from a plain completion".to_string(),
            )
            .into());
        }
        // Empty text is a legitimate (if unhelpful) completion
        Ok(response.text().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::error::RagError;
    use crate::adk::model::Part;
    use crate::adk::tool::Tool;
    use std::sync::Mutex;

    struct ScriptedModel {
        reply: Content,
        seen: Mutex<Vec<Content>>,
    }

    #[async_trait]
    impl Model for ScriptedModel {
        async fn generate_content(
            &self,
            history: &[Content],
            _config: Option<&GenerationConfig>,
            tools: Option<&[Arc<dyn Tool>]>,
        ) -> Result<Content> {
            assert!(tools.is_none());
            self.seen.lock().unwrap().extend_from_slice(history);
            Ok(self.reply.clone())
        }
    }

    #[tokio::test]
    async fn test_invoke_prompt_wraps_user_message() {
        let model = Arc::new(ScriptedModel {
            reply: Content::model("Paris"),
            seen: Mutex::new(Vec::new()),
        });
        let answerer = ModelAnswerer::new(model.clone());

        let answer = answerer.invoke_prompt("Capital of France?").await.unwrap();
        assert_eq!(answer, "Paris");
        assert_eq!(model.seen.lock().unwrap()[0], Content::user("Capital of France?"));
    }

    #[tokio::test]
    async fn test_empty_completion_is_empty_string() {
        let model = Arc::new(ScriptedModel {
            reply: Content::new("model", vec![]),
            seen: Mutex::new(Vec::new()),
        });
        let answer = ModelAnswerer::new(model).invoke_prompt("?").await.unwrap();
        assert_eq!(answer, "");
    }

    #[tokio::test]
    async fn test_tool_call_is_invalid_response() {
        let model = Arc::new(ScriptedModel {
            reply: Content::new(
                "model",
                vec![Part::FunctionCall {
                    id: "c".to_string(),
                    name: "x".to_string(),
                    args: serde_json::json!({}),
                }],
            ),
            seen: Mutex::new(Vec::new()),
        });
        let err = ModelAnswerer::new(model).invoke_prompt("?").await.unwrap_err();
        assert!(matches!(err, RagError::Model(ModelError::InvalidResponse(_))));
    }
}
