// SPDX-License-Identifier: MIT

//! Tools offered to the reasoning agent

pub mod retriever;
pub mod wikipedia;

pub use retriever::{format_passages, RetrieverTool, NO_DOCUMENTS};
pub use wikipedia::WikipediaTool;
