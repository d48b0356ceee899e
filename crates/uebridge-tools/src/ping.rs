//! Ping tool: checks connectivity with the UE RPC server.

use serde_json::Map;
use std::future::Future;
use std::pin::Pin;
use uebridge_types::{RpcResponse, Tool, ToolArgs, ToolContext, ToolDefinition, ToolError};

/// Sends `ping` and returns the server's response unchanged, e.g.
/// `{"id": "...", "op": "ping", "ok": true, "version": "0.1.0"}`.
pub struct PingTool;

impl Tool for PingTool {
    fn name(&self) -> &str {
        "ue.ping"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "ue.ping".to_string(),
            description: "Ping the UE RPC server to check connectivity. Returns the server's \
                          response, including its version."
                .to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    fn execute(
        &self,
        _args: ToolArgs,
        ctx: ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<RpcResponse, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let conn = ctx.connection()?;
            Ok(uebridge_rpc::call("ping", Map::new(), conn).await?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn ping_without_connection_fails_before_any_io() {
        let ctx = ToolContext::disconnected(PathBuf::from("/tmp"), "rpc.json not found");
        let result = PingTool.execute(ToolArgs::new(), ctx).await;
        assert!(matches!(result, Err(ToolError::NotConnected(_))));
    }

    #[test]
    fn requires_peer() {
        assert!(PingTool.requires_peer());
        assert_eq!(PingTool.definition().name, PingTool.name());
    }
}
