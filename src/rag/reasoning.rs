// SPDX-License-Identifier: MIT

//! Agentic responder
//!
//! Instead of a single completion, the `responder` step runs a tool-using
//! agent that can search the indexed documents or a general-knowledge source
//! before answering. The agent is built on first use and reused afterwards.
//!
//! Unlike the plain responder, failures inside the agent loop never fail the
//! workflow: they degrade to [`FALLBACK_ANSWER`].

use crate::adk::agent::{Agent, LLMAgent, ReActAgent};
use crate::adk::error::Result;
use crate::adk::model::{Content, Model};
use crate::adk::tool::Tool;
use crate::rag::graph::Node;
use crate::rag::retriever::Retriever;
use crate::rag::state::ConversationState;
use crate::rag::tools::RetrieverTool;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Answer used when the agent produces no usable text
pub const FALLBACK_ANSWER: &str = "Could not generate answer.";

/// Which reasoning loop drives the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentStrategy {
    /// Native function calling (`LLMAgent`)
    #[default]
    ToolCalling,
    /// Text-driven Thought/Action/Observation loop (`ReActAgent`)
    React,
}

impl std::str::FromStr for AgentStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tool_calling" | "default" => Ok(Self::ToolCalling),
            "react" => Ok(Self::React),
            other => Err(format!("unknown agent strategy: {}", other)),
        }
    }
}

pub struct ReasoningNode {
    retriever: Arc<dyn Retriever>,
    model: Arc<dyn Model>,
    knowledge: Arc<dyn Tool>,
    strategy: AgentStrategy,
    max_iterations: u32,
    agent: OnceCell<Arc<dyn Agent>>,
}

impl ReasoningNode {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        model: Arc<dyn Model>,
        knowledge: Arc<dyn Tool>,
    ) -> Self {
        Self {
            retriever,
            model,
            knowledge,
            strategy: AgentStrategy::default(),
            max_iterations: 10,
            agent: OnceCell::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: AgentStrategy, max_iterations: u32) -> Self {
        self.strategy = strategy;
        self.max_iterations = max_iterations;
        self
    }

    pub fn is_built(&self) -> bool {
        self.agent.get().is_some()
    }

    fn build_tools(&self) -> Vec<Arc<dyn Tool>> {
        vec![
            Arc::new(RetrieverTool::new(self.retriever.clone())),
            self.knowledge.clone(),
        ]
    }

    fn system_prompt(&self) -> String {
        format!(
            "You are a helpful RAG agent. Prefer 'retriever' for user-provided docs; \
             use '{}' for general knowledge. Return only the final useful answer.",
            self.knowledge.name()
        )
    }

    fn build_agent(&self) -> Arc<dyn Agent> {
        let tools = self.build_tools();
        log::info!(
            "Building {:?} reasoning agent with tools: {}",
            self.strategy,
            tools.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
        );
        let name = "rag-agent".to_string();
        let description = "Answers questions from indexed documents or general knowledge".to_string();
        match self.strategy {
            AgentStrategy::ToolCalling => Arc::new(
                LLMAgent::new(
                    name,
                    description,
                    self.system_prompt(),
                    self.model.clone(),
                    tools,
                )
                .with_max_turns(self.max_iterations),
            ),
            AgentStrategy::React => Arc::new(ReActAgent::new(
                name,
                description,
                self.system_prompt(),
                self.model.clone(),
                tools,
                self.max_iterations,
            )),
        }
    }

    fn agent(&self) -> &Arc<dyn Agent> {
        self.agent.get_or_init(|| self.build_agent())
    }

    pub async fn generate_answer(&self, state: &ConversationState) -> ConversationState {
        let agent = self.agent();

        let answer = match agent.invoke(vec![Content::user(state.question.clone())]).await {
            Ok(messages) => messages.last().and_then(Content::text),
            Err(e) => {
                log::warn!("Reasoning agent {} failed: {}", agent.name(), e);
                None
            }
        };

        let answer = answer.unwrap_or_else(|| {
            log::warn!("Reasoning agent produced no answer, using fallback");
            FALLBACK_ANSWER.to_string()
        });
        state.with_answer(answer)
    }
}

#[async_trait]
impl Node for ReasoningNode {
    async fn call(&self, state: &ConversationState) -> Result<ConversationState> {
        Ok(self.generate_answer(state).await)
    }
}
