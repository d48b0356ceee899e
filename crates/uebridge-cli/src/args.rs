//! `key=value` argument parsing for one-shot invocations.

use serde_json::{Number, Value};
use uebridge_types::ToolArgs;

/// Collect `key=value` tokens into tool arguments.
///
/// Tokens without `=` are ignored. Only the first `=` splits, so values may
/// contain `=`. A repeated key keeps its last value.
pub fn parse_pairs<S: AsRef<str>>(tokens: &[S]) -> ToolArgs {
    let mut args = ToolArgs::new();
    for token in tokens {
        let Some((key, raw)) = token.as_ref().split_once('=') else {
            tracing::debug!("Ignoring argument without '=': {}", token.as_ref());
            continue;
        };
        args.insert(key.to_string(), infer_value(raw));
    }
    args
}

/// `true`/`false` become booleans, integers become i64, finite floats become
/// f64, everything else stays a string.
pub fn infer_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Some(n) = raw
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
    {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}
