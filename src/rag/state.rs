// SPDX-License-Identifier: MIT

//! Conversation state threaded through the RAG workflow
//!
//! Nodes never mutate a state in place: each one takes a
//! [`ConversationState`] by reference and returns a new value built from it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Opaque per-document metadata (title, source, page, ...)
pub type Metadata = Map<String, Value>;

/// Plain key-value view of a finished run, returned by the workflow engine
pub type StateValues = Map<String, Value>;

/// A retrieved passage or ingested chunk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// String metadata value for `key`, unless it is the empty string
    ///
    /// Whitespace-only values count as present and are returned as-is.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// State record for one question/answer turn
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub question: String,
    /// Relevance order as delivered by the retriever, most relevant first
    #[serde(default)]
    pub retrieved_docs: Vec<Document>,
    /// Empty until the responder runs
    #[serde(default)]
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

impl ConversationState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Default::default()
        }
    }

    pub fn with_thread(mut self, thread_id: Option<String>) -> Self {
        self.thread_id = thread_id;
        self
    }

    /// Initial state for a new turn: the new question plus whatever the
    /// previous turn on this thread left behind.
    pub fn resume(question: impl Into<String>, prior: Option<&ConversationState>) -> Self {
        let mut state = Self::new(question);
        if let Some(prior) = prior {
            state.retrieved_docs = prior.retrieved_docs.clone();
            state.answer = prior.answer.clone();
            state.thread_id = prior.thread_id.clone();
        }
        state
    }

    /// Same question and answer, new documents
    pub fn with_docs(&self, retrieved_docs: Vec<Document>) -> Self {
        Self {
            question: self.question.clone(),
            retrieved_docs,
            answer: self.answer.clone(),
            thread_id: self.thread_id.clone(),
        }
    }

    /// Same question and documents, new answer
    pub fn with_answer(&self, answer: impl Into<String>) -> Self {
        Self {
            question: self.question.clone(),
            retrieved_docs: self.retrieved_docs.clone(),
            answer: answer.into(),
            thread_id: self.thread_id.clone(),
        }
    }

    /// Convert into the plain key-value structure handed back to callers
    pub fn into_values(self) -> StateValues {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // A struct of strings and maps always serializes to an object
            _ => StateValues::new(),
        }
    }
}
