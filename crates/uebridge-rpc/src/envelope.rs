//! Outbound request envelope.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Keys owned by the envelope. A parameter using one of these names is
/// dropped so the envelope's value is the only one on the wire.
pub const RESERVED_KEYS: [&str; 2] = ["id", "op"];

/// A request line: `{"id": "...", "op": "...", ...params}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    pub id: String,
    pub op: String,
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl RpcRequest {
    /// Build a request, generating a fresh id unless `id_override` is given.
    pub fn build(op: impl Into<String>, mut params: Map<String, Value>, id_override: Option<&str>) -> Self {
        let op = op.into();
        for key in RESERVED_KEYS {
            if params.remove(key).is_some() {
                tracing::warn!("Dropping parameter '{key}' from '{op}' request: reserved by the envelope");
            }
        }
        Self {
            id: id_override.map_or_else(generate_request_id, str::to_string),
            op,
            params,
        }
    }
}

/// A request id of the form `cli-<12 hex chars>` taken from a random UUID.
pub fn generate_request_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("cli-{}", &hex[..12])
}
