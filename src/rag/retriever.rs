// SPDX-License-Identifier: MIT

//! Retriever collaborator seam

use crate::adk::error::Result;
use crate::rag::state::Document;
use async_trait::async_trait;
use std::sync::Arc;

/// Returns passages relevant to a query, most relevant first
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn invoke(&self, query: &str) -> Result<Vec<Document>>;
}

#[async_trait]
impl<T: Retriever + ?Sized> Retriever for Arc<T> {
    async fn invoke(&self, query: &str) -> Result<Vec<Document>> {
        (**self).invoke(query).await
    }
}
