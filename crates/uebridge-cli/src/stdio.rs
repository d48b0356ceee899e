//! Persistent stdin/stdout mode: one JSON request per line in, one envelope
//! per line out.

use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use uebridge_tools::ToolRegistry;
use uebridge_types::{ToolArgs, ToolContext};

/// A parsed input line: `{"tool": name, "args": {...}}`. `op` is accepted as an
/// alias for `tool`.
#[derive(Debug, PartialEq)]
struct StdioRequest {
    tool: Option<String>,
    args: ToolArgs,
}

/// Serve requests until `input` reaches EOF.
///
/// Lines are handled strictly in order, each response is flushed before the
/// next line is read, and bad input never ends the loop.
pub async fn run<R, W>(
    input: R,
    output: &mut W,
    registry: &ToolRegistry,
    ctx: &ToolContext,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.split(b'\n');
    while let Some(line) = lines.next_segment().await? {
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }

        let reply = match parse_request(&line) {
            Ok(request) => {
                let result = registry
                    .invoke(request.tool.as_deref(), request.args, ctx.clone())
                    .await;
                serde_json::to_value(result)?
            }
            Err(message) => json!({"ok": false, "error": message}),
        };

        let mut out = serde_json::to_vec(&reply)?;
        out.push(b'\n');
        output.write_all(&out).await?;
        output.flush().await?;
    }
    tracing::debug!("stdin closed, leaving stdio loop");
    Ok(())
}

fn parse_request(line: &[u8]) -> Result<StdioRequest, &'static str> {
    let value: Value = serde_json::from_slice(line).map_err(|_| "invalid JSON input")?;
    let Value::Object(mut obj) = value else {
        return Err("invalid input: expected object");
    };

    let name = |v: Option<&Value>| v.and_then(Value::as_str).map(str::to_string);
    let tool = name(obj.get("tool")).or_else(|| name(obj.get("op")));

    let args = match obj.remove("args") {
        None | Some(Value::Null) => ToolArgs::new(),
        Some(Value::Object(args)) => args,
        Some(_) => return Err("invalid args: expected object"),
    };

    Ok(StdioRequest { tool, args })
}
