//! Connection context and response types shared by the transport and tools.

use crate::error::ConfigError;

/// Default host the UE RPC server binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default end-to-end request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// A JSON object as returned by the UE RPC server.
///
/// The server's payload varies per operation, so responses stay an open map.
pub type RpcResponse = serde_json::Map<String, serde_json::Value>;

/// Where and how to reach the UE RPC server for one call.
///
/// Built once per discovery cycle. Overrides produce a derived copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionContext {
    host: String,
    port: u16,
    timeout_ms: u64,
    request_id: Option<String>,
}

impl ConnectionContext {
    /// Create a context, rejecting port 0 and a zero timeout.
    pub fn new(host: impl Into<String>, port: u16, timeout_ms: u64) -> Result<Self, ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "port".into(),
                message: "must be between 1 and 65535".into(),
            });
        }
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "timeout_ms".into(),
                message: "must be greater than 0".into(),
            });
        }
        Ok(Self {
            host: host.into(),
            port,
            timeout_ms,
            request_id: None,
        })
    }

    /// Copy of this context with a different timeout (e.g. a quick health probe).
    /// A zero timeout is ignored.
    pub fn with_timeout(&self, timeout_ms: u64) -> Self {
        let mut ctx = self.clone();
        if timeout_ms > 0 {
            ctx.timeout_ms = timeout_ms;
        }
        ctx
    }

    /// Copy of this context that sends a fixed request id.
    pub fn with_request_id(&self, id: impl Into<String>) -> Self {
        let mut ctx = self.clone();
        ctx.request_id = Some(id.into());
        ctx
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// `host:port`, for diagnostics.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
