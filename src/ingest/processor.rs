// SPDX-License-Identifier: MIT

//! Load sources and split them into retrieval-sized chunks

use crate::adk::error::{RagError, Result};
use crate::ingest::loader::Loader;
use crate::ingest::source::Source;
use crate::rag::state::Document;
use text_splitter::{ChunkConfig, TextSplitter};

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

pub struct DocumentProcessor {
    chunk_size: usize,
    chunk_overlap: usize,
    loader: Loader,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl DocumentProcessor {
    /// `chunk_size` and `chunk_overlap` are measured in characters
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            loader: Loader::new(),
        }
    }

    /// Load every source, in order
    ///
    /// All sources are classified before any is loaded, so an unsupported
    /// entry fails the batch without touching the network or disk.
    pub async fn load_documents<S: AsRef<str>>(&self, sources: &[S]) -> Result<Vec<Document>> {
        let sources = sources
            .iter()
            .map(|s| Source::classify(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let mut docs = Vec::new();
        for source in &sources {
            docs.extend(self.loader.load(source).await?);
        }
        Ok(docs)
    }

    /// Split documents into chunks that keep their metadata plus a `chunk`
    /// index within the parent document.
    pub fn split_documents(&self, documents: Vec<Document>) -> Result<Vec<Document>> {
        if self.chunk_size == 0 {
            return Err(RagError::config("chunk_size must be greater than 0"));
        }
        let config = ChunkConfig::new(self.chunk_size)
            .with_overlap(self.chunk_overlap)
            .map_err(|e| RagError::config(e.to_string()))?;
        let splitter = TextSplitter::new(config);

        let mut chunks = Vec::new();
        for doc in documents {
            for (i, chunk) in splitter.chunks(&doc.content).enumerate() {
                let mut metadata = doc.metadata.clone();
                metadata.insert("chunk".to_string(), i.into());
                chunks.push(Document {
                    content: chunk.to_string(),
                    metadata,
                });
            }
        }
        Ok(chunks)
    }

    /// Load and split
    pub async fn process<S: AsRef<str>>(&self, sources: &[S]) -> Result<Vec<Document>> {
        let docs = self.load_documents(sources).await?;
        let doc_count = docs.len();
        let chunks = self.split_documents(docs)?;
        log::info!(
            "Processed {} sources into {} documents and {} chunks",
            sources.len(),
            doc_count,
            chunks.len()
        );
        Ok(chunks)
    }
}
