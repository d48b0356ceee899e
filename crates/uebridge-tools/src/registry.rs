//! Tool registry for name-based dispatch.

use futures_util::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use uebridge_discovery::DiscoveryStore;
use uebridge_types::{
    DispatchError, RpcResponse, Tool, ToolArgs, ToolContext, ToolDefinition, ToolInvocationResult,
};

use crate::start::StartSettings;

/// Registry of available tools, supporting name-based dispatch.
///
/// Built once at startup and only read afterwards.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Create a registry with all built-in tools.
    pub fn with_builtins(
        store: DiscoveryStore,
        health_timeout_ms: u64,
        start: StartSettings,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::PingTool));
        registry.register(Arc::new(super::HealthTool::new(health_timeout_ms)));
        registry.register(Arc::new(super::DiscoverTool::new(store.clone())));
        registry.register(Arc::new(super::StartTool::new(store, start)));
        registry
    }

    /// Register a tool in the registry.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// All tool definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// All registered tool names, sorted.
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a tool exists by name.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Whether the named tool needs a discovered server, if it exists.
    pub fn requires_peer(&self, name: &str) -> Option<bool> {
        self.tools.get(name).map(|t| t.requires_peer())
    }

    /// Invoke a tool and wrap the outcome in the uniform envelope.
    ///
    /// Never fails: missing and unknown names, handler errors and handler
    /// panics all come back as `ok: false` envelopes.
    pub async fn invoke(
        &self,
        tool_name: Option<&str>,
        args: ToolArgs,
        ctx: ToolContext,
    ) -> ToolInvocationResult {
        let Some(name) = tool_name.filter(|n| !n.is_empty()) else {
            return ToolInvocationResult::failed(&DispatchError::MissingTool)
                .with_available_tools(self.tool_names());
        };

        let Some(tool) = self.tools.get(name) else {
            tracing::debug!("Unknown tool requested: {}", name);
            return ToolInvocationResult::failed(&DispatchError::UnknownTool {
                name: name.to_string(),
            })
            .with_available_tools(self.tool_names());
        };

        tracing::debug!(
            "Invoking tool '{}' (server discovered: {})",
            name,
            ctx.is_connected()
        );
        let outcome = AssertUnwindSafe(tool.execute(args, ctx))
            .catch_unwind()
            .await;

        let message = match outcome {
            Ok(Ok(response)) => {
                let error = reported_failure(&response);
                if let Some(error) = &error {
                    tracing::debug!("Tool '{}' reported failure: {}", name, error);
                }
                return ToolInvocationResult::completed(name, error, response);
            }
            Ok(Err(e)) => e.to_string(),
            Err(panic) => {
                tracing::error!("Tool '{}' panicked", name);
                format!("tool '{name}' panicked: {}", panic_message(panic.as_ref()))
            }
        };

        tracing::debug!("Tool '{}' failed: {}", name, message);
        ToolInvocationResult::failed(&DispatchError::HandlerFailure {
            tool: name.to_string(),
            message,
        })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// The failure a response reports about itself, if any.
///
/// A missing `ok` means success; anything other than `ok: true` is a failure,
/// described by the response's `error` field.
pub fn reported_failure(response: &RpcResponse) -> Option<String> {
    match response.get("ok") {
        None | Some(Value::Bool(true)) => None,
        Some(_) => Some(match response.get("error") {
            Some(Value::String(s)) => s.clone(),
            None | Some(Value::Null) => "operation reported failure".to_string(),
            Some(other) => other.to_string(),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
