//! TCP transport for UE RPC calls.
//!
//! One connection per call: connect, write one request line, read one
//! response line, close. A single timeout bounds the whole exchange.

use crate::envelope::RpcRequest;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use uebridge_types::{ConnectionContext, RpcResponse, TransportError};

/// Upper bound on a single response line.
pub const MAX_RESPONSE_BYTES: u64 = 16 * 1024 * 1024;

/// Call `op` on the UE RPC server described by `ctx`.
///
/// Returns the server's JSON object untouched. The connection is closed on
/// every path; when the timeout fires the in-flight socket is dropped.
pub async fn call(
    op: &str,
    params: Map<String, Value>,
    ctx: &ConnectionContext,
) -> Result<RpcResponse, TransportError> {
    let request = RpcRequest::build(op, params, ctx.request_id());
    let mut line = serde_json::to_string(&request)?;
    line.push('\n');

    let addr = ctx.addr();
    let timeout_ms = ctx.timeout_ms();
    tracing::debug!("UE RPC '{}' -> {} (id {})", op, addr, request.id);

    let exchange = exchange(ctx.host(), ctx.port(), line.as_bytes(), &addr);
    let raw = match tokio::time::timeout(Duration::from_millis(timeout_ms), exchange).await {
        Ok(result) => result?,
        Err(_) => {
            tracing::debug!("UE RPC '{}' timed out after {}ms", op, timeout_ms);
            return Err(TransportError::Timeout { addr, timeout_ms });
        }
    };

    let response = parse_response(&raw, &addr)?;
    if let Some(id) = response.get("id").and_then(Value::as_str) {
        if id != request.id {
            tracing::warn!(
                "UE RPC response id '{}' does not match request id '{}'",
                id,
                request.id
            );
        }
    }
    tracing::debug!("UE RPC '{}' completed (id {})", op, request.id);
    Ok(response)
}

/// Connect, write the full request, then read one line.
async fn exchange(
    host: &str,
    port: u16,
    request: &[u8],
    addr: &str,
) -> Result<Vec<u8>, TransportError> {
    let unreachable = |source: std::io::Error| TransportError::Unreachable {
        addr: addr.to_string(),
        source,
    };

    let mut stream = TcpStream::connect((host, port))
        .await
        .map_err(unreachable)?;
    stream.write_all(request).await.map_err(unreachable)?;
    stream.flush().await.map_err(unreachable)?;

    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    (&mut reader)
        .take(MAX_RESPONSE_BYTES)
        .read_until(b'\n', &mut buf)
        .await
        .map_err(unreachable)?;

    let _ = reader.into_inner().shutdown().await;
    Ok(buf)
}

/// Interpret one raw response line.
fn parse_response(raw: &[u8], addr: &str) -> Result<RpcResponse, TransportError> {
    let invalid = |message: String| TransportError::InvalidResponse {
        addr: addr.to_string(),
        message,
    };

    if raw.is_empty() {
        return Err(invalid(
            "connection closed before a response was received".to_string(),
        ));
    }
    if raw.len() as u64 >= MAX_RESPONSE_BYTES && !raw.ends_with(b"\n") {
        return Err(invalid(format!(
            "response exceeds {MAX_RESPONSE_BYTES} bytes"
        )));
    }

    match serde_json::from_slice::<Value>(raw.trim_ascii()) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(invalid(format!("expected a JSON object, got: {other}"))),
        Err(e) => Err(invalid(format!("invalid JSON: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "127.0.0.1:4000";

    fn invalid_message(raw: &[u8]) -> String {
        match parse_response(raw, ADDR) {
            Err(TransportError::InvalidResponse { message, .. }) => message,
            other => panic!("Expected InvalidResponse, got: {other:?}"),
        }
    }

    #[test]
    fn parses_object_line() {
        let resp = parse_response(b"{\"id\":\"cli-1\",\"ok\":true}\n", ADDR).unwrap();
        assert_eq!(resp["id"], "cli-1");
        assert_eq!(resp["ok"], true);
    }

    #[test]
    fn accepts_crlf_and_missing_newline() {
        assert!(parse_response(b"{\"ok\":true}\r\n", ADDR).is_ok());
        assert!(parse_response(b"{\"ok\":true}", ADDR).is_ok());
    }

    #[test]
    fn empty_read_is_invalid() {
        assert!(invalid_message(b"").contains("connection closed"));
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(invalid_message(b"hello\n").starts_with("invalid JSON"));
    }

    #[test]
    fn non_object_is_invalid() {
        assert_eq!(
            invalid_message(b"[1,2]\n"),
            "expected a JSON object, got: [1,2]"
        );
    }

    #[tokio::test]
    async fn refused_connection_is_unreachable() {
        // Bind then drop to get a port with no listener.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let ctx = ConnectionContext::new("127.0.0.1", port, 2000).unwrap();
        match call("ping", Map::new(), &ctx).await {
            Err(TransportError::Unreachable { addr, .. }) => {
                assert_eq!(addr, format!("127.0.0.1:{port}"));
            }
            other => panic!("Expected Unreachable, got: {other:?}"),
        }
    }
}
