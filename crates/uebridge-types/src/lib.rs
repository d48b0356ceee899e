//! Shared data model and error hierarchy for ue-bridge.

pub mod discovery;
pub mod envelope;
pub mod error;
pub mod rpc;
pub mod tool;

pub use discovery::DiscoveryRecord;
pub use envelope::ToolInvocationResult;
pub use error::{ConfigError, DiscoveryError, DispatchError, ToolError, TransportError};
pub use rpc::{ConnectionContext, DEFAULT_HOST, DEFAULT_TIMEOUT_MS, RpcResponse};
pub use tool::{Tool, ToolArgs, ToolContext, ToolDefinition};
