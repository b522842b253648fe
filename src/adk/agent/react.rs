// SPDX-License-Identifier: MIT

//! ReAct Agent - Reasoning + Acting pattern
//!
//! The agent explicitly reasons about what to do, takes actions (tool
//! calls), and observes the results in a structured
//! Thought → Action → Observation loop kept in a text scratchpad.

use super::{last_user_text, Agent};
use crate::adk::error::{RagError, Result};
use crate::adk::model::{Content, Model, Part};
use crate::adk::tool::Tool;
use async_trait::async_trait;
use std::sync::Arc;

/// ReAct (Reasoning + Acting) Agent
pub struct ReActAgent {
    pub name: String,
    pub description: String,
    pub instruction: String,
    pub model: Arc<dyn Model>,
    pub tools: Vec<Arc<dyn Tool>>,
    pub max_iterations: u32,
}

/// ReAct step types
#[derive(Debug)]
enum ReActStep {
    /// Model is thinking/reasoning
    Thought(String),
    /// Model wants to call a tool
    Action {
        tool: String,
        args: serde_json::Value,
    },
    /// Model has a final answer
    FinalAnswer(String),
}

impl ReActAgent {
    pub fn new(
        name: String,
        description: String,
        instruction: String,
        model: Arc<dyn Model>,
        tools: Vec<Arc<dyn Tool>>,
        max_iterations: u32,
    ) -> Self {
        Self {
            name,
            description,
            instruction,
            model,
            tools,
            max_iterations,
        }
    }

    /// Build the ReAct system prompt with tool descriptions
    fn build_react_system_prompt(&self) -> String {
        let tool_section = if self.tools.is_empty() {
            "No tools are available. You must answer based on your knowledge.".to_string()
        } else {
            let tool_descriptions: Vec<String> = self
                .tools
                .iter()
                .map(|t| format!("- {}: {}", t.name(), t.description()))
                .collect();
            format!("Available tools:\n{}", tool_descriptions.join("\n"))
        };

        format!(
            r#"{}

You are using the ReAct (Reasoning + Acting) pattern. For each step:

1. **Thought**: Reason about what you know and what you need to do next
2. **Action**: Either call a tool OR provide a final answer

{}

Response format:
- To use a tool, respond with a function call (only use tools listed above)
- To provide a final answer, respond with text starting with "Final Answer:" followed by your answer

Always think step by step. After receiving tool results (Observations), continue reasoning until you can provide a final answer."#,
            self.instruction, tool_section
        )
    }

    /// Build the current prompt including scratchpad history
    fn build_prompt_with_scratchpad(&self, input: &str, scratchpad: &[String]) -> String {
        if scratchpad.is_empty() {
            input.to_string()
        } else {
            format!(
                "{}\n\n--- Previous Steps ---\n{}\n\nContinue from where you left off.",
                input,
                scratchpad.join("\n")
            )
        }
    }

    /// Parse the model response to determine the ReAct step type
    ///
    /// A tool call anywhere in the reply wins over text, then a
    /// `Final Answer:` line, then any remaining text or reasoning as a thought.
    fn parse_response(&self, response: &Content) -> ReActStep {
        if let Some((tool, args)) = response.parts.iter().find_map(|part| match part {
            Part::FunctionCall { name, args, .. } => Some((name.clone(), args.clone())),
            _ => None,
        }) {
            return ReActStep::Action { tool, args };
        }

        let texts = response.parts.iter().filter_map(|part| match part {
            Part::Text(text) => Some(text.trim()),
            _ => None,
        });
        for text in texts.clone() {
            if let Some(answer) = strip_final_answer(text) {
                return ReActStep::FinalAnswer(answer.to_string());
            }
        }

        let thinking = response.parts.iter().filter_map(|part| match part {
            Part::Thinking(thought) => Some(thought.trim()),
            _ => None,
        });
        let thought = thinking
            .chain(texts)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        ReActStep::Thought(thought)
    }

    /// Execute a tool and render the observation
    async fn execute_tool(&self, tool_name: &str, args: serde_json::Value) -> String {
        match self.tools.iter().find(|t| t.name() == tool_name) {
            Some(t) => match t.execute(args).await {
                Ok(serde_json::Value::String(s)) => s,
                Ok(result) => serde_json::to_string_pretty(&result).unwrap_or_default(),
                Err(e) => format!("Error: {}", e),
            },
            None => format!("Error: Tool '{}' not found", tool_name),
        }
    }
}

/// Text after a case-insensitive `Final Answer:` marker that opens a line
fn strip_final_answer(text: &str) -> Option<&str> {
    const MARKER: &str = "final answer:";
    let line_starts =
        std::iter::once(0).chain(text.match_indices('\n').map(|(i, _)| i + 1));
    for start in line_starts {
        let line = text[start..].trim_start_matches([' ', '\t']);
        match line.get(..MARKER.len()) {
            Some(head) if head.eq_ignore_ascii_case(MARKER) => {
                return Some(line[MARKER.len()..].trim());
            }
            _ => {}
        }
    }
    None
}

#[async_trait]
impl Agent for ReActAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, mut messages: Vec<Content>) -> Result<Vec<Content>> {
        let input = last_user_text(&messages);
        let system_prompt = self.build_react_system_prompt();
        let mut scratchpad: Vec<String> = Vec::new();

        for iteration in 0..self.max_iterations {
            log::info!(
                "ReActAgent {} iteration {}/{}",
                self.name,
                iteration + 1,
                self.max_iterations
            );

            let history = vec![
                Content::system(system_prompt.clone()),
                Content::user(self.build_prompt_with_scratchpad(&input, &scratchpad)),
            ];

            let response = self
                .model
                .generate_content(&history, None, Some(&self.tools))
                .await?;

            let step = self.parse_response(&response);
            log::debug!("ReActAgent step: {:?}", step);

            match step {
                ReActStep::Thought(thought) => {
                    if !thought.is_empty() {
                        log::info!("Thought: {}", thought);
                        scratchpad.push(format!("Thought: {}", thought));
                    }
                }
                ReActStep::Action { tool, args } => {
                    log::info!("Action: {}({})", tool, args);
                    scratchpad.push(format!("Action: {}({})", tool, args));

                    let observation = self.execute_tool(&tool, args).await;
                    log::debug!("Observation: {}", observation);
                    scratchpad.push(format!("Observation: {}", observation));
                }
                ReActStep::FinalAnswer(answer) => {
                    log::info!("ReActAgent {} produced a final answer", self.name);
                    messages.push(Content::model(answer));
                    return Ok(messages);
                }
            }
        }

        log::error!(
            "ReActAgent {} reached max iterations ({}) without a final answer",
            self.name,
            self.max_iterations
        );
        log::debug!("ReActAgent scratchpad:\n{}", scratchpad.join("\n"));
        Err(RagError::MaxIterations {
            kind: "iterations".to_string(),
            limit: self.max_iterations,
        })
    }
}
