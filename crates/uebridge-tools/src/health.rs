//! Health tool: a quick, non-fatal reachability probe.

use crate::registry::reported_failure;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use uebridge_types::{
    RpcResponse, Tool, ToolArgs, ToolContext, ToolDefinition, ToolError, TransportError,
};

/// Default probe timeout in milliseconds.
pub const DEFAULT_HEALTH_TIMEOUT_MS: u64 = 500;

/// Pings the server with a short timeout.
///
/// A timeout or refused connection is reported as `status: "unreachable"`
/// rather than raised, so callers can poll health without handling errors.
pub struct HealthTool {
    timeout_ms: u64,
}

#[derive(Deserialize)]
struct HealthInput {
    #[serde(default)]
    timeout_ms: Option<u64>,
}

impl HealthTool {
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }
}

impl Default for HealthTool {
    fn default() -> Self {
        Self::new(DEFAULT_HEALTH_TIMEOUT_MS)
    }
}

impl Tool for HealthTool {
    fn name(&self) -> &str {
        "ue.health"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "ue.health".to_string(),
            description: format!(
                "Quick health check of the UE RPC server ({}ms timeout by default). \
                 Reports status 'ok', 'error' or 'unreachable' instead of failing.",
                self.timeout_ms
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "timeout_ms": {
                        "type": "integer",
                        "description": "Probe timeout in milliseconds"
                    }
                }
            }),
        }
    }

    fn execute(
        &self,
        args: ToolArgs,
        ctx: ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<RpcResponse, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let input: HealthInput =
                serde_json::from_value(Value::Object(args)).map_err(|e| {
                    ToolError::InvalidInput {
                        tool: "ue.health".into(),
                        message: e.to_string(),
                    }
                })?;

            // A zero timeout means "use the default", not "no timeout".
            let timeout_ms = input
                .timeout_ms
                .filter(|ms| *ms > 0)
                .unwrap_or(self.timeout_ms);
            let conn = ctx.connection()?.with_timeout(timeout_ms);

            let started = Instant::now();
            let result = uebridge_rpc::call("ping", Map::new(), &conn).await;
            let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            let mut out = Map::new();
            match result {
                Ok(peer) => {
                    match reported_failure(&peer) {
                        None => {
                            out.insert("ok".into(), json!(true));
                            out.insert("status".into(), json!("ok"));
                        }
                        Some(error) => {
                            out.insert("ok".into(), json!(false));
                            out.insert("status".into(), json!("error"));
                            out.insert("error".into(), json!(error));
                        }
                    }
                    out.insert("latency_ms".into(), json!(latency_ms));
                    out.insert("peer".into(), Value::Object(peer));
                }
                Err(
                    e @ (TransportError::Timeout { .. } | TransportError::Unreachable { .. }),
                ) => {
                    tracing::debug!("Health probe failed: {e}");
                    out.insert("ok".into(), json!(false));
                    out.insert("status".into(), json!("unreachable"));
                    out.insert("error".into(), json!(e.to_string()));
                    out.insert("timeout_ms".into(), json!(conn.timeout_ms()));
                }
                Err(e) => return Err(e.into()),
            }
            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uebridge_types::ConnectionContext;

    fn closed_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn refused_connection_is_reported_not_raised() {
        let conn = ConnectionContext::new("127.0.0.1", closed_port(), 2000).unwrap();
        let ctx = ToolContext::connected(PathBuf::from("/tmp"), conn);

        let out = HealthTool::default()
            .execute(ToolArgs::new(), ctx)
            .await
            .unwrap();
        assert_eq!(out["ok"], false);
        assert_eq!(out["status"], "unreachable");
        assert_eq!(out["timeout_ms"], 500);
        assert!(out["error"].as_str().unwrap().contains("Cannot reach UE RPC"));
    }

    #[tokio::test]
    async fn timeout_arg_overrides_default() {
        let conn = ConnectionContext::new("127.0.0.1", closed_port(), 2000).unwrap();
        let ctx = ToolContext::connected(PathBuf::from("/tmp"), conn);
        let mut args = ToolArgs::new();
        args.insert("timeout_ms".into(), json!(50));

        let out = HealthTool::new(500).execute(args, ctx).await.unwrap();
        assert_eq!(out["timeout_ms"], 50);
    }

    #[tokio::test]
    async fn zero_timeout_arg_falls_back_to_health_default() {
        let conn = ConnectionContext::new("127.0.0.1", closed_port(), 2000).unwrap();
        let ctx = ToolContext::connected(PathBuf::from("/tmp"), conn);
        let mut args = ToolArgs::new();
        args.insert("timeout_ms".into(), json!(0));

        let out = HealthTool::new(500).execute(args, ctx).await.unwrap();
        assert_eq!(out["timeout_ms"], 500);
    }

    #[tokio::test]
    async fn bad_timeout_arg_is_invalid_input() {
        let conn = ConnectionContext::new("127.0.0.1", closed_port(), 2000).unwrap();
        let ctx = ToolContext::connected(PathBuf::from("/tmp"), conn);
        let mut args = ToolArgs::new();
        args.insert("timeout_ms".into(), json!("soon"));

        let result = HealthTool::default().execute(args, ctx).await;
        assert!(matches!(result, Err(ToolError::InvalidInput { .. })));
    }

    #[test]
    fn definition_mentions_timeout() {
        assert!(HealthTool::new(750).definition().description.contains("750ms"));
    }
}
