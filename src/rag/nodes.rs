// SPDX-License-Identifier: MIT

//! Plain pipeline nodes: retrieve, then answer from the retrieved context
//!
//! Neither node catches collaborator failures; they reach the caller of the
//! workflow unchanged.

use crate::adk::error::Result;
use crate::rag::answerer::Answerer;
use crate::rag::graph::Node;
use crate::rag::retriever::Retriever;
use crate::rag::state::{ConversationState, Document};
use async_trait::async_trait;
use std::sync::Arc;

/// `retriever` node: fills `retrieved_docs` for the state's question
pub struct RetrieveNode {
    retriever: Arc<dyn Retriever>,
}

impl RetrieveNode {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }

    pub async fn retrieve_docs(&self, state: &ConversationState) -> Result<ConversationState> {
        let docs = self.retriever.invoke(&state.question).await?;
        log::info!(
            "Retrieved {} documents for question ({} chars)",
            docs.len(),
            state.question.len()
        );
        Ok(state.with_docs(docs))
    }
}

#[async_trait]
impl Node for RetrieveNode {
    async fn call(&self, state: &ConversationState) -> Result<ConversationState> {
        self.retrieve_docs(state).await
    }
}

/// Plain `responder` node: one completion over the retrieved context
pub struct GenerateNode {
    answerer: Arc<dyn Answerer>,
}

impl GenerateNode {
    pub fn new(answerer: Arc<dyn Answerer>) -> Self {
        Self { answerer }
    }

    pub async fn generate_answer(&self, state: &ConversationState) -> Result<ConversationState> {
        let prompt = build_prompt(&state.question, &state.retrieved_docs);
        let answer = self.answerer.invoke_prompt(&prompt).await?;
        log::info!("Generated answer ({} chars)", answer.len());
        Ok(state.with_answer(answer))
    }
}

#[async_trait]
impl Node for GenerateNode {
    async fn call(&self, state: &ConversationState) -> Result<ConversationState> {
        self.generate_answer(state).await
    }
}

/// Context-stuffed prompt for the plain responder
pub fn build_prompt(question: &str, docs: &[Document]) -> String {
    let context = docs
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Answer the following question based on the context.\nContext: {}\n\nQuestion: {}",
        context, question
    )
}
