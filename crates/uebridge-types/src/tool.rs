//! Tool trait and related types.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::error::ToolError;
use crate::rpc::{ConnectionContext, RpcResponse};

/// Arguments passed to a tool: a flat JSON object.
pub type ToolArgs = serde_json::Map<String, serde_json::Value>;

/// Name, description and input schema of a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Context provided to tools during execution.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Working directory the invocation was made from.
    pub cwd: PathBuf,
    /// Resolved connection, or the reason discovery failed.
    connection: Result<ConnectionContext, String>,
}

impl ToolContext {
    /// Context for a resolved server.
    pub fn connected(cwd: PathBuf, connection: ConnectionContext) -> Self {
        Self {
            cwd,
            connection: Ok(connection),
        }
    }

    /// Context for when discovery failed; `reason` is reported by any tool
    /// that needs the server.
    pub fn disconnected(cwd: PathBuf, reason: impl Into<String>) -> Self {
        Self {
            cwd,
            connection: Err(reason.into()),
        }
    }

    /// The resolved connection, or [`ToolError::NotConnected`].
    pub fn connection(&self) -> Result<&ConnectionContext, ToolError> {
        self.connection
            .as_ref()
            .map_err(|reason| ToolError::NotConnected(reason.clone()))
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_ok()
    }
}

/// Trait that all tools must implement.
///
/// A tool is bound to one name in the registry. It performs zero or more RPC
/// calls and returns a response map; an `ok: false` entry in that map is a
/// tool-reported failure, an `Err` is a failure of the tool itself.
pub trait Tool: Send + Sync {
    /// The unique, dot-namespaced name of this tool (e.g. `ue.ping`).
    fn name(&self) -> &str;

    /// Definition used when listing tools.
    fn definition(&self) -> ToolDefinition;

    /// Whether this tool needs a discovered server to run.
    ///
    /// Front-ends refuse to dispatch a peer-requiring tool when discovery failed.
    fn requires_peer(&self) -> bool {
        true
    }

    /// Execute the tool with the given arguments and context.
    ///
    /// The context is passed by value; it is cheap to clone.
    fn execute(
        &self,
        args: ToolArgs,
        ctx: ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<RpcResponse, ToolError>> + Send + '_>>;
}
