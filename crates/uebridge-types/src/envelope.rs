//! The uniform result envelope returned for every tool invocation.

use serde::{Deserialize, Serialize};

use crate::error::DispatchError;
use crate::rpc::RpcResponse;

/// `{tool, ok, error, response}` wrapper around one invocation.
///
/// `ok` is false exactly when `error` is set. `response` is only present when
/// a handler ran to completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<RpcResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_tools: Option<Vec<String>>,
}

impl ToolInvocationResult {
    /// A handler that completed, successfully or with its own failure.
    pub fn completed(tool: impl Into<String>, error: Option<String>, response: RpcResponse) -> Self {
        Self {
            tool: Some(tool.into()),
            ok: error.is_none(),
            error,
            response: Some(response),
            available_tools: None,
        }
    }

    /// A dispatch failure; no handler output is attached.
    pub fn failed(err: &DispatchError) -> Self {
        let tool = match err {
            DispatchError::MissingTool => None,
            DispatchError::UnknownTool { name } => Some(name.clone()),
            DispatchError::HandlerFailure { tool, .. } => Some(tool.clone()),
        };
        Self {
            tool,
            ok: false,
            error: Some(err.to_string()),
            response: None,
            available_tools: None,
        }
    }

    /// Attach the registry listing, as done for missing/unknown tool errors.
    pub fn with_available_tools(mut self, names: Vec<String>) -> Self {
        self.available_tools = Some(names);
        self
    }
}
