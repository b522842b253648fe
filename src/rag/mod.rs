// SPDX-License-Identifier: MIT

//! Retrieval-augmented question answering
//!
//! A two-step workflow (`retriever` → `responder`) over a shared
//! [`state::ConversationState`], with optional per-thread checkpoints.

pub mod answerer;
pub mod checkpoint;
pub mod graph;
pub mod nodes;
pub mod reasoning;
pub mod retriever;
pub mod state;
pub mod tools;

pub use graph::{GraphBuilder, Responder};
pub use state::{ConversationState, Document};
