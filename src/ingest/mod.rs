// SPDX-License-Identifier: MIT

//! Document ingestion: classify sources, load them, split into chunks

pub mod loader;
pub mod processor;
pub mod source;

pub use loader::Loader;
pub use processor::DocumentProcessor;
pub use source::Source;
