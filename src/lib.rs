// SPDX-License-Identifier: MIT

//! ragweave: retrieval-augmented question answering over your own documents
//!
//! Sources are ingested and indexed ([`ingest`], [`vector_store`]), then each
//! question runs through a `retriever → responder` workflow ([`rag`]) whose
//! state can be checkpointed per conversation thread.

pub mod adk;
pub mod config;
pub mod ingest;
pub mod rag;
pub mod vector_store;
