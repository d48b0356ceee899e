//! Error hierarchy for ue-bridge.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from locating the UE RPC server through its discovery file.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error(
        "UE RPC server not running: {} not found. Start UE5 with the UEServer plugin enabled.",
        .path.display()
    )]
    NotRunning { path: PathBuf },

    #[error("Cannot read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {message}", .path.display())]
    Corrupt { path: PathBuf, message: String },

    #[error("Malformed discovery file {}: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    #[error(
        "No UE instances registered in {}. Start UE5 with the UEServer plugin enabled.",
        .path.display()
    )]
    NoInstances { path: PathBuf },

    #[error(
        "No UE instance in {} matches {} ({count} registered). Run from your UE5 project directory.",
        .path.display(),
        .selector.display()
    )]
    NoMatch {
        path: PathBuf,
        selector: PathBuf,
        count: usize,
    },

    #[error(
        "Stale port file detected: process {pid} is not running. Remove {} and restart UE5.",
        .path.display()
    )]
    Stale { pid: u32, path: PathBuf },
}

/// Errors from a single request/response exchange with the UE RPC server.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error(
        "Timeout after {timeout_ms}ms contacting UE RPC at {addr}. Ensure UE5 is running with the UEServer plugin enabled."
    )]
    Timeout { addr: String, timeout_ms: u64 },

    #[error("Cannot reach UE RPC at {addr}: {source}. Ensure the UE5 server is running.")]
    Unreachable {
        addr: String,
        source: std::io::Error,
    },

    #[error("Invalid response from UE RPC at {addr}: {message}")]
    InvalidResponse { addr: String, message: String },

    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures at the dispatch boundary. The `Display` output is the envelope's
/// `error` string.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("missing tool")]
    MissingTool,

    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("{message}")]
    HandlerFailure { tool: String, message: String },
}

/// Errors raised by tool handlers.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("Not connected to UE RPC: {0}")]
    NotConnected(String),

    #[error("Invalid input for tool '{tool}': {message}")]
    InvalidInput { tool: String, message: String },

    #[error("Failed to launch '{command}': {source}")]
    LaunchFailed {
        command: String,
        source: std::io::Error,
    },
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_running_names_the_missing_file() {
        let err = DiscoveryError::NotRunning {
            path: PathBuf::from("/proj/.ueserver/rpc.json"),
        };
        let msg = err.to_string();
        assert!(msg.contains("/proj/.ueserver/rpc.json not found"));
        assert!(msg.contains("Start UE5"));
    }

    #[test]
    fn stale_mentions_pid_and_remediation() {
        let err = DiscoveryError::Stale {
            pid: 999_999,
            path: PathBuf::from("/proj/.ueserver/rpc.json"),
        };
        let msg = err.to_string();
        assert!(msg.to_lowercase().contains("stale"));
        assert!(msg.contains("999999"));
        assert!(msg.contains("Remove /proj/.ueserver/rpc.json"));
    }

    #[test]
    fn dispatch_errors_render_envelope_strings() {
        assert_eq!(DispatchError::MissingTool.to_string(), "missing tool");
        assert_eq!(
            DispatchError::UnknownTool {
                name: "ue.nope".into()
            }
            .to_string(),
            "unknown tool: ue.nope"
        );
    }

    #[test]
    fn tool_error_is_transparent_over_transport() {
        let err: ToolError = TransportError::Timeout {
            addr: "127.0.0.1:4000".into(),
            timeout_ms: 250,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Timeout after 250ms contacting UE RPC at 127.0.0.1:4000. \
             Ensure UE5 is running with the UEServer plugin enabled."
        );
    }
}
