//! Start tool: waits (optionally after launching UE) until discovery
//! resolves a live server.

use crate::discover::{parse_project_input, project_selector, record_response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;
use tokio::time::Instant;
use uebridge_discovery::DiscoveryStore;
use uebridge_types::{RpcResponse, Tool, ToolArgs, ToolContext, ToolDefinition, ToolError};

/// Hard ceiling on how long the tool will wait, whatever is configured.
pub const MAX_WAIT_MS: u64 = 300_000;

/// Floor on the discovery poll interval.
pub const MIN_POLL_INTERVAL_MS: u64 = 50;

fn default_wait_ms() -> u64 {
    60_000
}

fn default_poll_interval_ms() -> u64 {
    500
}

/// How to launch UE and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartSettings {
    /// Command that starts UE with the UEServer plugin. Without one the tool
    /// only waits for an instance started by other means.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Default wait budget in milliseconds (default: 60000).
    #[serde(default = "default_wait_ms")]
    pub wait_ms: u64,
    /// Discovery poll interval in milliseconds (default: 500).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for StartSettings {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            wait_ms: default_wait_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl StartSettings {
    /// The wait budget actually used for a requested value.
    pub fn effective_wait_ms(&self, requested: Option<u64>) -> u64 {
        requested.unwrap_or(self.wait_ms).min(MAX_WAIT_MS)
    }

    pub fn effective_poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

/// Polls discovery until a live instance appears or the wait budget runs out.
pub struct StartTool {
    store: DiscoveryStore,
    settings: StartSettings,
}

#[derive(Deserialize)]
struct StartInput {
    #[serde(default)]
    wait_ms: Option<u64>,
}

impl StartTool {
    pub fn new(store: DiscoveryStore, settings: StartSettings) -> Self {
        Self { store, settings }
    }

    fn launch(&self, command: &str, cwd: &Path) -> Result<(), ToolError> {
        let child = tokio::process::Command::new(command)
            .args(&self.settings.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ToolError::LaunchFailed {
                command: command.to_string(),
                source: e,
            })?;
        tracing::info!(
            "Launched '{}' (pid {})",
            command,
            child.id().map_or_else(|| "?".to_string(), |p| p.to_string())
        );
        Ok(())
    }
}

impl Tool for StartTool {
    fn name(&self) -> &str {
        "ue.start"
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "ue.start".to_string(),
            description: format!(
                "Start UE (if a launch command is configured) and wait until its RPC server \
                 is discoverable. Waits at most {MAX_WAIT_MS}ms."
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "wait_ms": {
                        "type": "integer",
                        "description": "How long to wait for the server, in milliseconds"
                    },
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
            let input: StartInput = serde_json::from_value(Value::Object(args.clone()))
                .map_err(|e| ToolError::InvalidInput {
                    tool: "ue.start".into(),
                    message: e.to_string(),
                })?;
            let project = parse_project_input("ue.start", args)?;
            let selector = project_selector(project.project_dir.as_deref(), &ctx.cwd);
            let selector = selector.as_deref();

            if let Ok(record) = self.store.resolve(selector).await {
                let mut out = record_response(&record, Utc::now());
                out.insert("already_running".into(), json!(true));
                return Ok(out);
            }

            let launched = match &self.settings.command {
                Some(command) => {
                    self.launch(command, &ctx.cwd)?;
                    true
                }
                None => false,
            };

            let budget_ms = self.settings.effective_wait_ms(input.wait_ms);
            let interval = self.settings.effective_poll_interval();
            let started = Instant::now();
            let deadline = started + Duration::from_millis(budget_ms);

            loop {
                let last_error = match self.store.resolve(selector).await {
                    Ok(record) => {
                        let mut out = record_response(&record, Utc::now());
                        out.insert("already_running".into(), json!(false));
                        out.insert("launched".into(), json!(launched));
                        out.insert("waited_ms".into(), json!(elapsed_ms(started)));
                        return Ok(out);
                    }
                    Err(e) => e,
                };

                let now = Instant::now();
                if now >= deadline {
                    tracing::debug!("Gave up waiting for UE after {}ms", budget_ms);
                    let mut out = RpcResponse::new();
                    out.insert("ok".into(), json!(false));
                    out.insert("status".into(), json!("timeout"));
                    out.insert(
                        "error".into(),
                        json!(format!(
                            "UE RPC server did not become ready within {budget_ms}ms: {last_error}"
                        )),
                    );
                    out.insert("launched".into(), json!(launched));
                    out.insert("waited_ms".into(), json!(elapsed_ms(started)));
                    return Ok(out);
                }

                tracing::debug!("Waiting for UE RPC server: {}", last_error);
                tokio::time::sleep(interval.min(deadline - now)).await;
            }
        })
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    u64::try_from(since.elapsed().as_millis()).unwrap_or(u64::MAX)
}
