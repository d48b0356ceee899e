//! Discover tool: reports which UE instance discovery resolves to.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use uebridge_discovery::DiscoveryStore;
use uebridge_types::{
    DiscoveryRecord, RpcResponse, Tool, ToolArgs, ToolContext, ToolDefinition, ToolError,
};

/// Runs discovery and returns the live record; does not contact the server.
pub struct DiscoverTool {
    store: DiscoveryStore,
}

#[derive(Deserialize)]
pub(crate) struct ProjectInput {
    #[serde(default)]
    pub(crate) project_dir: Option<String>,
}

impl DiscoverTool {
    pub fn new(store: DiscoveryStore) -> Self {
        Self { store }
    }
}

impl Tool for DiscoverTool {
    fn name(&self) -> &str {
        "ue.discover"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "ue.discover".to_string(),
            description: "Locate the running UE RPC server from its discovery file and verify \
                          its process is alive. Returns port, pid and start time."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "project_dir": {
                        "type": "string",
                        "description": "UE project directory (default: current directory)"
                    }
                }
            }),
        }
    }

    fn requires_peer(&self) -> bool {
        false
    }

    fn execute(
        &self,
        args: ToolArgs,
        ctx: ToolContext,
    ) -> Pin<Box<dyn Future<Output = Result<RpcResponse, ToolError>> + Send + '_>> {
        Box::pin(async move {
            let input = parse_project_input("ue.discover", args)?;
            let selector = project_selector(input.project_dir.as_deref(), &ctx.cwd);
            let record = self.store.resolve(selector.as_deref()).await?;
            Ok(record_response(&record, Utc::now()))
        })
    }
}

pub(crate) fn parse_project_input(tool: &str, args: ToolArgs) -> Result<ProjectInput, ToolError> {
    serde_json::from_value(Value::Object(args)).map_err(|e| ToolError::InvalidInput {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

/// Selector for an optional `project_dir` argument; relative paths are taken
/// from the invocation's working directory.
pub(crate) fn project_selector(project_dir: Option<&str>, cwd: &Path) -> Option<PathBuf> {
    project_dir.map(|dir| cwd.join(dir))
}

/// `{ok: true, status: "running", port, pid, started, ...}` for a live record.
pub(crate) fn record_response(record: &DiscoveryRecord, now: DateTime<Utc>) -> RpcResponse {
    let mut out = RpcResponse::new();
    out.insert("ok".into(), json!(true));
    out.insert("status".into(), json!("running"));
    out.insert("port".into(), json!(record.port));
    out.insert("pid".into(), json!(record.pid));
    out.insert("started".into(), json!(record.started));
    if let Some(project) = &record.project {
        out.insert("project".into(), json!(project));
    }
    if let Some(name) = &record.project_name {
        out.insert("project_name".into(), json!(name));
    }
    if let Some(uptime) = record.uptime_secs(now) {
        out.insert("uptime_secs".into(), json!(uptime));
    }
    out
}
