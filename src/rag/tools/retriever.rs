// SPDX-License-Identifier: MIT

//! Retrieval tool: exposes the document retriever to the reasoning agent

use crate::adk::error::{RagError, Result};
use crate::adk::tool::{query_arg, Tool};
use crate::rag::retriever::Retriever;
use crate::rag::state::Document;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};
use std::sync::Arc;

/// Returned when the retriever yields nothing
pub const NO_DOCUMENTS: &str = "No documents found.";

/// Maximum passages rendered per call
pub const MAX_PASSAGES: usize = 8;

static RETRIEVER_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {
            "query": {
                "type": "string",
                "description": "Free-text query to search the indexed documents with"
            }
        },
        "required": ["query"]
    })
});

pub struct RetrieverTool {
    retriever: Arc<dyn Retriever>,
}

impl RetrieverTool {
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self { retriever }
    }

    /// String-in, string-out form of the tool
    pub async fn run(&self, query: &str) -> Result<String> {
        let docs = self.retriever.invoke(query).await?;
        log::debug!("retriever tool: {} documents for '{}'", docs.len(), query);
        Ok(format_passages(&docs))
    }
}

/// Render up to [`MAX_PASSAGES`] passages as `[i] label\ncontent` blocks
/// separated by a blank line.
pub fn format_passages(docs: &[Document]) -> String {
    if docs.is_empty() {
        return NO_DOCUMENTS.to_string();
    }
    docs.iter()
        .take(MAX_PASSAGES)
        .enumerate()
        .map(|(i, doc)| {
            let n = i + 1;
            let label = doc
                .meta_str("title")
                .or_else(|| doc.meta_str("source"))
                .map(str::to_string)
                .unwrap_or_else(|| format!("doc_{}", n));
            format!("[{}] {}\n{}", n, label, doc.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for RetrieverTool {
    fn name(&self) -> &str {
        "retriever"
    }

    fn description(&self) -> &str {
        "Fetch passages from the indexed user-provided documents."
    }

    fn schema(&self) -> &Value {
        &RETRIEVER_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<Value> {
        let query = query_arg(&input)
            .ok_or_else(|| RagError::Retrieval("retriever tool needs a 'query' string".into()))?;
        Ok(Value::String(self.run(query).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubRetriever(Vec<Document>);

    #[async_trait]
    impl Retriever for StubRetriever {
        async fn invoke(&self, _query: &str) -> Result<Vec<Document>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_empty_retriever_yields_sentinel() {
        let tool = RetrieverTool::new(Arc::new(StubRetriever(vec![])));
        assert_eq!(tool.run("anything").await.unwrap(), NO_DOCUMENTS);

        let value = tool.execute(json!({"query": "anything"})).await.unwrap();
        assert_eq!(value, json!(NO_DOCUMENTS));
    }

    #[test]
    fn test_label_fallback_order() {
        let docs = vec![
            Document::new("one")
                .with_metadata("title", "Title A")
                .with_metadata("source", "a.pdf"),
            Document::new("two").with_metadata("source", "b.txt"),
            Document::new("three"),
            Document::new("four").with_metadata("title", ""),
            Document::new("five")
                .with_metadata("title", " ")
                .with_metadata("source", "e.md"),
        ];

        assert_eq!(
            format_passages(&docs),
            "[1] Title A\none\n\n[2] b.txt\ntwo\n\n[3] doc_3\nthree\n\n[4] doc_4\nfour\n\n[5]  \nfive"
        );
    }

    #[tokio::test]
    async fn test_caps_at_eight_passages() {
        let docs = (1..=10)
            .map(|i| Document::new(format!("content {}", i)))
            .collect();
        let tool = RetrieverTool::new(Arc::new(StubRetriever(docs)));

        let out = tool.run("q").await.unwrap();
        let blocks: Vec<&str> = out.split("\n\n").collect();
        assert_eq!(blocks.len(), MAX_PASSAGES);
        assert_eq!(blocks[0], "[1] doc_1\ncontent 1");
        assert_eq!(blocks[7], "[8] doc_8\ncontent 8");
        assert!(!out.contains("content 9"));
    }

    #[tokio::test]
    async fn test_missing_query_is_error() {
        let tool = RetrieverTool::new(Arc::new(StubRetriever(vec![])));
        assert!(tool.execute(json!({})).await.is_err());
    }
}
