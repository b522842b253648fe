// SPDX-License-Identifier: MIT

//! In-memory vector index with cosine-similarity search

use crate::adk::error::{RagError, Result};
use crate::rag::retriever::Retriever;
use crate::rag::state::Document;
use crate::vector_store::embeddings::Embedder;
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;

pub const DEFAULT_TOP_K: usize = 4;

struct Entry {
    document: Document,
    vector: Vec<f32>,
}

/// Owns the index and hands out retrievers over it
pub struct VectorStore {
    embedder: Arc<dyn Embedder>,
    retriever: Option<VectorRetriever>,
}

impl VectorStore {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            retriever: None,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.retriever.is_some()
    }

    /// Embed `documents` and replace the index; the returned retriever
    /// yields `k` documents per query.
    pub async fn create_retriever(
        &mut self,
        documents: Vec<Document>,
        k: usize,
    ) -> Result<VectorRetriever> {
        let entries = if documents.is_empty() {
            log::warn!("Building vector index from an empty document set");
            Vec::new()
        } else {
            let texts: Vec<String> = documents.iter().map(|d| d.content.clone()).collect();
            let vectors = self.embedder.embed_documents(&texts).await?;
            if vectors.len() != documents.len() {
                return Err(RagError::Retrieval(format!(
                    "embedder returned {} vectors for {} documents",
                    vectors.len(),
                    documents.len()
                )));
            }
            documents
                .into_iter()
                .zip(vectors)
                .map(|(document, vector)| Entry { document, vector })
                .collect()
        };

        log::info!("Vector index built with {} documents", entries.len());
        let retriever = VectorRetriever {
            entries: Arc::new(entries),
            embedder: self.embedder.clone(),
            k,
        };
        self.retriever = Some(retriever.clone());
        Ok(retriever)
    }

    pub fn get_retriever(&self) -> Result<VectorRetriever> {
        self.retriever
            .clone()
            .ok_or_else(|| RagError::not_initialized("Vector store"))
    }

    /// Top `k` documents for `query`, most similar first
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let retriever = self
            .retriever
            .as_ref()
            .ok_or_else(|| RagError::not_initialized("Vector store"))?;
        retriever.search(query, k).await
    }
}

/// Query handle over a built index
#[derive(Clone)]
pub struct VectorRetriever {
    entries: Arc<Vec<Entry>>,
    embedder: Arc<dyn Embedder>,
    k: usize,
}

impl VectorRetriever {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query_vector = self.embedder.embed_query(query).await?;

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(&query_vector, &e.vector)))
            .collect();
        // Stable sort keeps insertion order among equal scores
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, _)| self.entries[i].document.clone())
            .collect())
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn invoke(&self, query: &str) -> Result<Vec<Document>> {
        self.search(query, self.k).await
    }
}

/// 0.0 when either vector has zero norm or the lengths differ
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
