// SPDX-License-Identifier: MIT

//! Embedding-backed document index

pub mod embeddings;
pub mod store;

pub use embeddings::{Embedder, OpenAIEmbeddings};
pub use store::{VectorRetriever, VectorStore};
