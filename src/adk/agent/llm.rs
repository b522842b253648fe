// SPDX-License-Identifier: MIT

//! LLM Agent - native function-calling loop
//!
//! This agent sends the conversation to the model, executes every tool call
//! the model requests, feeds the results back and repeats until the model
//! answers with plain text.

use super::Agent;
use crate::adk::error::{RagError, Result};
use crate::adk::model::{Content, Model, Part};
use crate::adk::tool::Tool;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

const DEFAULT_MAX_TURNS: u32 = 10;

/// Standard LLM agent with tool calling support
pub struct LLMAgent {
    pub name: String,
    pub description: String,
    pub instruction: String,
    pub model: Arc<dyn Model>,
    pub tools: Vec<Arc<dyn Tool>>,
    pub max_turns: u32,
    /// HashMap for O(1) tool lookups
    tool_map: HashMap<String, usize>,
}

impl LLMAgent {
    pub fn new(
        name: String,
        description: String,
        instruction: String,
        model: Arc<dyn Model>,
        tools: Vec<Arc<dyn Tool>>,
    ) -> Self {
        let tool_map: HashMap<String, usize> = tools
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name().to_string(), i))
            .collect();

        Self {
            name,
            description,
            instruction,
            model,
            tools,
            max_turns: DEFAULT_MAX_TURNS,
            tool_map,
        }
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    fn get_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tool_map.get(name).map(|&i| &self.tools[i])
    }

    /// Execute one requested call; tool failures become an error payload the
    /// model can react to instead of aborting the loop.
    async fn call_tool(&self, name: &str, args: &serde_json::Value) -> serde_json::Value {
        log::info!("Tool call: {} {}", name, args);
        match self.get_tool(name) {
            Some(t) => match t.execute(args.clone()).await {
                Ok(res) => res,
                Err(e) => {
                    log::error!("Tool {} failed: {}", name, e);
                    serde_json::json!({ "error": e.to_string() })
                }
            },
            None => {
                log::error!("Tool {} not found", name);
                serde_json::json!({ "error": RagError::tool_not_found(name).to_string() })
            }
        }
    }
}

#[async_trait]
impl Agent for LLMAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, messages: Vec<Content>) -> Result<Vec<Content>> {
        let mut history = Vec::with_capacity(messages.len() + 1);
        history.push(Content::system(self.instruction.clone()));
        history.extend(messages);

        for turn in 0..self.max_turns {
            log::info!("Agent {} turn {}/{}", self.name, turn + 1, self.max_turns);
            let response = self
                .model
                .generate_content(&history, None, Some(&self.tools))
                .await?;

            log::debug!(
                "Agent {} received response with {} parts",
                self.name,
                response.parts.len()
            );

            let function_calls: Vec<(String, String, serde_json::Value)> = response
                .parts
                .iter()
                .filter_map(|part| match part {
                    Part::FunctionCall { id, name, args } => {
                        Some((id.clone(), name.clone(), args.clone()))
                    }
                    _ => None,
                })
                .collect();

            history.push(response);

            if function_calls.is_empty() {
                // Text (or nothing at all): the loop is over either way.
                history.remove(0);
                return Ok(history);
            }

            let mut function_responses = Vec::with_capacity(function_calls.len());
            for (id, name, args) in function_calls {
                let response = self.call_tool(&name, &args).await;
                function_responses.push(Part::FunctionResponse { id, name, response });
            }

            history.push(Content::new("user", function_responses));
        }

        log::error!(
            "Agent {} reached max turns without text response",
            self.name
        );
        Err(RagError::MaxIterations {
            kind: "turns".to_string(),
            limit: self.max_turns,
        })
    }
}
