// SPDX-License-Identifier: MIT

use crate::adk::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for tools that can be called by agents.
///
/// Implementations store name, description and schema in fields (or
/// statics) so the accessors never allocate.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (must be unique within an agent's tool set)
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does
    fn description(&self) -> &str;

    /// Returns the JSON schema for the tool's input parameters
    fn schema(&self) -> &Value;

    /// Execute the tool with the given input and return the result
    async fn execute(&self, input: Value) -> Result<Value>;
}

/// Pull the free-text `query` argument out of a tool call.
///
/// Models sometimes send a bare string instead of `{"query": ...}`, so both
/// shapes are accepted.
pub fn query_arg(input: &Value) -> Option<&str> {
    match input {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => obj.get("query").and_then(Value::as_str),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_arg_object() {
        assert_eq!(query_arg(&json!({"query": "rust"})), Some("rust"));
    }

    #[test]
    fn test_query_arg_bare_string() {
        assert_eq!(query_arg(&json!("rust")), Some("rust"));
    }

    #[test]
    fn test_query_arg_missing() {
        assert_eq!(query_arg(&json!({"q": "rust"})), None);
        assert_eq!(query_arg(&json!(42)), None);
    }
}
