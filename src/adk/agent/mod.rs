// SPDX-License-Identifier: MIT

//! Agent module - tool-using reasoning loops
//!
//! This module provides the core Agent trait and implementations:
//! - `LLMAgent` - native function-calling loop
//! - `ReActAgent` - Thought → Action → Observation loop driven by text

mod llm;
mod react;

pub use llm::LLMAgent;
pub use react::ReActAgent;

use crate::adk::error::Result;
use crate::adk::model::Content;
use async_trait::async_trait;

/// Core agent trait for all agent types
#[async_trait]
pub trait Agent: Send + Sync {
    /// Returns the agent name
    fn name(&self) -> &str;

    /// Run the agent over a message list and return the resulting message
    /// sequence. The final answer, if any, is the text of the last message.
    async fn invoke(&self, messages: Vec<Content>) -> Result<Vec<Content>>;

    /// Run the agent with a single user input and return the final text
    async fn run(&self, input: String) -> Result<String> {
        let messages = self.invoke(vec![Content::user(input)]).await?;
        Ok(messages
            .last()
            .and_then(Content::text)
            .unwrap_or_default())
    }
}

/// Text of the most recent user message, used as the task for an agent loop
pub(crate) fn last_user_text(messages: &[Content]) -> String {
    messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .and_then(Content::text)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A simple mock agent that echoes the last user message
    pub struct MockAgent {
        name: String,
        transform: fn(String) -> String,
    }

    impl MockAgent {
        pub fn new(name: &str, transform: fn(String) -> String) -> Self {
            Self {
                name: name.to_string(),
                transform,
            }
        }
    }

    #[async_trait]
    impl Agent for MockAgent {
        fn name(&self) -> &str {
            &self.name
        }

        async fn invoke(&self, mut messages: Vec<Content>) -> Result<Vec<Content>> {
            let input = last_user_text(&messages);
            messages.push(Content::model((self.transform)(input)));
            Ok(messages)
        }
    }

    #[tokio::test]
    async fn test_mock_agent() {
        let agent = MockAgent::new("test", |s| format!("{}-transformed", s));
        assert_eq!(agent.name(), "test");

        let result = agent.run("input".to_string()).await.unwrap();
        assert_eq!(result, "input-transformed");
    }

    #[test]
    fn test_last_user_text_skips_model_messages() {
        let messages = vec![
            Content::user("first"),
            Content::model("reply"),
            Content::user("second"),
            Content::model("reply 2"),
        ];
        assert_eq!(last_user_text(&messages), "second");
    }
}
