// SPDX-License-Identifier: MIT

//! Typed error handling for ragweave
//!
//! Every collaborator seam (retriever, answerer, model, tool, embedder,
//! checkpoint store) reports failures through [`RagError`] so that the
//! workflow can propagate them unmodified to the caller of `run`.

use thiserror::Error;

/// Top-level error type for ragweave
#[derive(Debug, Error)]
pub enum RagError {
    /// API errors from external services (OpenAI, Wikipedia, ...)
    #[error("API error from {provider}: {message}")]
    Api { provider: String, message: String },

    /// The retriever collaborator failed
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    /// The answerer collaborator failed
    #[error("Generation failed: {0}")]
    Generation(String),

    /// A resource was used before it was built (e.g. the vector index)
    #[error("{0} is not initialized")]
    NotInitialized(String),

    /// Ingestion was handed a source it cannot classify
    #[error("Unsupported source type: {0}. Use URL, .txt file, .pdf file, or PDF directory.")]
    UnsupportedSource(String),

    /// PDF could not be loaded or had no extractable text
    #[error("Failed to read PDF {path}: {message}")]
    Pdf { path: String, message: String },

    /// Tool not found during agent execution
    #[error("Tool '{name}' not found")]
    ToolNotFound { name: String },

    /// Configuration errors (missing env vars, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Model/LLM-specific errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Workflow graph errors
    #[error("Workflow error: {0}")]
    Workflow(#[from] WorkflowError),

    /// Checkpoint store failures
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Max iterations/turns reached
    #[error("Max {kind} reached: {limit}")]
    MaxIterations { kind: String, limit: u32 },

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Workflow graph errors
#[derive(Debug, Error, PartialEq)]
pub enum WorkflowError {
    /// `compile` was called without an entry point
    #[error("Graph has no entry point")]
    MissingEntryPoint,

    /// An edge or the entry point refers to a node that was never added
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// Two nodes were registered under the same name
    #[error("Node '{0}' is already defined")]
    DuplicateNode(String),

    /// A node has no outgoing edge, so execution could never reach END
    #[error("Node '{0}' has no outgoing edge")]
    MissingEdge(String),

    /// Execution visited more nodes than allowed
    #[error("Graph execution exceeded {0} steps")]
    StepLimit(usize),

    /// `run` was given a different checkpoint store than the compiled graph
    #[error("Graph was compiled with a different checkpoint store; rebuild before switching stores")]
    CheckpointerMismatch,
}

/// Model/LLM-specific errors
#[derive(Debug, Error)]
pub enum ModelError {
    /// API key not configured
    #[error("API key not configured for provider: {0}")]
    ApiKeyMissing(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    /// Invalid response from model
    #[error("Invalid response from model: {0}")]
    InvalidResponse(String),
}

impl RagError {
    /// Create an API error
    pub fn api(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a tool not found error
    pub fn tool_not_found(name: impl Into<String>) -> Self {
        Self::ToolNotFound { name: name.into() }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a not-initialized error for the named resource
    pub fn not_initialized(resource: impl Into<String>) -> Self {
        Self::NotInitialized(resource.into())
    }
}

pub type Result<T, E = RagError> = std::result::Result<T, E>;
