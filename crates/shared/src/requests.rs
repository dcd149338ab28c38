//! Requests proposed by a decision-maker.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One proposed action: a tool name and loosely-typed arguments.
///
/// Arguments are validated and normalized by the engine before anything
/// runs; nothing here is trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl ToolCall {
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            args: Map::new(),
        }
    }

    /// Builder for an argument.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Parse a call from JSON like `{"tool": "perform_attack", "args": {...}}`.
    pub fn from_json(text: &str) -> Result<Self, ToolCallError> {
        let call: ToolCall =
            serde_json::from_str(text).map_err(|e| ToolCallError::Malformed(e.to_string()))?;
        if call.tool.trim().is_empty() {
            return Err(ToolCallError::MissingTool);
        }
        Ok(call)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolCallError {
    #[error("tool call is not valid JSON: {0}")]
    Malformed(String),
    #[error("tool call has no tool name")]
    MissingTool,
}
