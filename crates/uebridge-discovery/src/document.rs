//! Parsing and validation of discovery file contents.
//!
//! Two shapes are accepted:
//!
//! - single instance: `{"port": 45231, "pid": 12345, "started": "..."}`
//! - registry: `{"instances": [{"port", "pid", "started", "project", "project_name"}, ...]}`
//!
//! The shape is detected from the content, not from the file name.

use serde_json::{Map, Value};
use std::path::Path;
use uebridge_types::{DiscoveryError, DiscoveryRecord};

/// A parsed discovery file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryDocument {
    Single(DiscoveryRecord),
    Registry(Vec<DiscoveryRecord>),
}

impl DiscoveryDocument {
    /// Parse raw file bytes. `path` is only used in error messages.
    pub fn parse(bytes: &[u8], path: &Path) -> Result<Self, DiscoveryError> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| DiscoveryError::Corrupt {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let Value::Object(obj) = value else {
            return Err(malformed(
                path,
                format!("expected an object, got {}", type_name(&value)),
            ));
        };

        match obj.get("instances") {
            None => record_from_object(&obj, path, None).map(Self::Single),
            Some(Value::Array(entries)) => entries
                .iter()
                .enumerate()
                .map(|(i, entry)| match entry {
                    Value::Object(o) => record_from_object(o, path, Some(i)),
                    other => Err(malformed(
                        path,
                        format!("instances[{i}]: expected an object, got {}", type_name(other)),
                    )),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Registry),
            Some(other) => Err(malformed(
                path,
                format!("'instances' must be an array, got {}", type_name(other)),
            )),
        }
    }

    /// Pick the record serving `selector`.
    ///
    /// A single-instance document always yields its record. In a registry the
    /// entry with the longest `project` path that prefixes `selector` wins; a
    /// registry holding exactly one entry falls back to it.
    pub fn select(self, selector: &Path, path: &Path) -> Result<DiscoveryRecord, DiscoveryError> {
        let entries = match self {
            Self::Single(record) => return Ok(record),
            Self::Registry(entries) => entries,
        };

        if entries.is_empty() {
            return Err(DiscoveryError::NoInstances {
                path: path.to_path_buf(),
            });
        }

        let best = entries
            .iter()
            .filter_map(|r| {
                let project = Path::new(r.project.as_deref()?);
                selector
                    .starts_with(project)
                    .then(|| (project.components().count(), r))
            })
            .max_by_key(|(depth, _)| *depth)
            .map(|(_, r)| r.clone());

        if let Some(record) = best {
            return Ok(record);
        }

        let count = entries.len();
        match <[DiscoveryRecord; 1]>::try_from(entries) {
            Ok([only]) => Ok(only),
            Err(_) => Err(DiscoveryError::NoMatch {
                path: path.to_path_buf(),
                selector: selector.to_path_buf(),
                count,
            }),
        }
    }
}

fn record_from_object(
    obj: &Map<String, Value>,
    path: &Path,
    index: Option<usize>,
) -> Result<DiscoveryRecord, DiscoveryError> {
    let prefix = index.map(|i| format!("instances[{i}]: ")).unwrap_or_default();

    let port = required_int(obj, "port", path, &prefix)?;
    let port = u16::try_from(port)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| malformed(path, format!("{prefix}'port' out of range: {port}")))?;

    let pid = required_int(obj, "pid", path, &prefix)?;
    let pid = u32::try_from(pid)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| malformed(path, format!("{prefix}'pid' out of range: {pid}")))?;

    Ok(DiscoveryRecord {
        port,
        pid,
        started: optional_str(obj, "started", path, &prefix)?.unwrap_or_default(),
        project: optional_str(obj, "project", path, &prefix)?,
        project_name: optional_str(obj, "project_name", path, &prefix)?,
    })
}

fn required_int(
    obj: &Map<String, Value>,
    key: &str,
    path: &Path,
    prefix: &str,
) -> Result<i64, DiscoveryError> {
    let value = obj
        .get(key)
        .ok_or_else(|| malformed(path, format!("{prefix}missing '{key}' field")))?;
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => n
            .as_i64()
            .ok_or_else(|| malformed(path, format!("{prefix}'{key}' out of range: {n}"))),
        other => Err(malformed(
            path,
            format!(
                "{prefix}invalid '{key}' type: expected int, got {}",
                type_name(other)
            ),
        )),
    }
}

fn optional_str(
    obj: &Map<String, Value>,
    key: &str,
    path: &Path,
    prefix: &str,
) -> Result<Option<String>, DiscoveryError> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(malformed(
            path,
            format!(
                "{prefix}invalid '{key}' type: expected string, got {}",
                type_name(other)
            ),
        )),
    }
}

fn malformed(path: &Path, message: String) -> DiscoveryError {
    DiscoveryError::Malformed {
        path: path.to_path_buf(),
        message,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "/proj/.ueserver/rpc.json";

    fn parse(json: &str) -> Result<DiscoveryDocument, DiscoveryError> {
        DiscoveryDocument::parse(json.as_bytes(), Path::new(PATH))
    }

    fn malformed_message(json: &str) -> String {
        match parse(json) {
            Err(DiscoveryError::Malformed { message, .. }) => message,
            other => panic!("Expected Malformed, got: {other:?}"),
        }
    }

    fn instance(project: &str, port: u16) -> DiscoveryRecord {
        DiscoveryRecord {
            port,
            pid: 100,
            started: String::new(),
            project: Some(project.to_string()),
            project_name: None,
        }
    }

    #[test]
    fn parses_single_instance() {
        let doc = parse(r#"{"port": 45231, "pid": 12345, "started": "2025-12-26T10:30:00Z"}"#)
            .unwrap();
        match doc {
            DiscoveryDocument::Single(r) => {
                assert_eq!(r.port, 45231);
                assert_eq!(r.pid, 12345);
                assert_eq!(r.started, "2025-12-26T10:30:00Z");
                assert!(r.project.is_none());
            }
            other => panic!("Expected Single, got: {other:?}"),
        }
    }

    #[test]
    fn started_is_optional() {
        match parse(r#"{"port": 1, "pid": 2}"#).unwrap() {
            DiscoveryDocument::Single(r) => assert_eq!(r.started, ""),
            other => panic!("Expected Single, got: {other:?}"),
        }
    }

    #[test]
    fn invalid_json_is_corrupt() {
        for input in ["", "{\"port\": 452", "not json", "{\"port\": 1,}"] {
            match parse(input) {
                Err(DiscoveryError::Corrupt { .. }) => {}
                other => panic!("Expected Corrupt for {input:?}, got: {other:?}"),
            }
        }
    }

    #[test]
    fn invalid_utf8_is_corrupt() {
        let result = DiscoveryDocument::parse(&[0xff, 0xfe, 0x7b], Path::new(PATH));
        assert!(matches!(result, Err(DiscoveryError::Corrupt { .. })));
    }

    #[test]
    fn missing_fields_are_malformed() {
        assert_eq!(malformed_message(r#"{"pid": 2}"#), "missing 'port' field");
        assert_eq!(malformed_message(r#"{"port": 2}"#), "missing 'pid' field");
    }

    #[test]
    fn wrong_types_are_malformed() {
        assert_eq!(
            malformed_message(r#"{"port": "45231", "pid": 2}"#),
            "invalid 'port' type: expected int, got string"
        );
        assert_eq!(
            malformed_message(r#"{"port": 45231.5, "pid": 2}"#),
            "invalid 'port' type: expected int, got float"
        );
        assert_eq!(
            malformed_message(r#"{"port": 45231, "pid": true}"#),
            "invalid 'pid' type: expected int, got bool"
        );
        assert_eq!(
            malformed_message(r#"{"port": 45231, "pid": 2, "started": 7}"#),
            "invalid 'started' type: expected string, got int"
        );
    }

    #[test]
    fn out_of_range_values_are_malformed() {
        assert_eq!(
            malformed_message(r#"{"port": 70000, "pid": 2}"#),
            "'port' out of range: 70000"
        );
        assert_eq!(
            malformed_message(r#"{"port": 0, "pid": 2}"#),
            "'port' out of range: 0"
        );
        assert_eq!(
            malformed_message(r#"{"port": 1, "pid": -5}"#),
            "'pid' out of range: -5"
        );
        assert_eq!(
            malformed_message(r#"{"port": 1, "pid": 0}"#),
            "'pid' out of range: 0"
        );
    }

    #[test]
    fn non_object_top_level_is_malformed() {
        assert_eq!(malformed_message("[1, 2]"), "expected an object, got array");
        assert_eq!(malformed_message("42"), "expected an object, got int");
    }

    #[test]
    fn registry_entries_are_validated() {
        assert_eq!(
            malformed_message(r#"{"instances": {"port": 1}}"#),
            "'instances' must be an array, got object"
        );
        assert_eq!(
            malformed_message(r#"{"instances": [{"port": 1, "pid": 2}, {"pid": 3}]}"#),
            "instances[1]: missing 'port' field"
        );
        assert_eq!(
            malformed_message(r#"{"instances": ["x"]}"#),
            "instances[0]: expected an object, got string"
        );
    }

    #[test]
    fn parses_registry() {
        let doc = parse(
            r#"{"instances": [
                {"port": 4001, "pid": 11, "started": "", "project": "/work/Game", "project_name": "Game"},
                {"port": 4002, "pid": 12, "project": "/work/Other"}
            ]}"#,
        )
        .unwrap();
        match doc {
            DiscoveryDocument::Registry(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].project_name.as_deref(), Some("Game"));
                assert_eq!(entries[1].port, 4002);
            }
            other => panic!("Expected Registry, got: {other:?}"),
        }
    }

    #[test]
    fn select_single_ignores_selector() {
        let record = DiscoveryRecord {
            port: 1,
            pid: 2,
            started: String::new(),
            project: None,
            project_name: None,
        };
        let doc = DiscoveryDocument::Single(record.clone());
        assert_eq!(
            doc.select(Path::new("/anywhere"), Path::new(PATH)).unwrap(),
            record
        );
    }

    #[test]
    fn select_empty_registry() {
        let result =
            DiscoveryDocument::Registry(vec![]).select(Path::new("/work"), Path::new(PATH));
        assert!(matches!(result, Err(DiscoveryError::NoInstances { .. })));
    }

    #[test]
    fn select_by_project_prefix() {
        let doc = DiscoveryDocument::Registry(vec![
            instance("/work/Game", 4001),
            instance("/work/Other", 4002),
        ]);
        let r = doc
            .select(Path::new("/work/Other/Source/Module"), Path::new(PATH))
            .unwrap();
        assert_eq!(r.port, 4002);
    }

    #[test]
    fn select_prefers_longest_prefix() {
        let doc = DiscoveryDocument::Registry(vec![
            instance("/work/Game/Plugins/Tool", 4003),
            instance("/work", 4001),
            instance("/work/Game", 4002),
        ]);
        let r = doc
            .select(Path::new("/work/Game/Source"), Path::new(PATH))
            .unwrap();
        assert_eq!(r.port, 4002);
    }

    #[test]
    fn prefix_match_is_component_wise() {
        let doc = DiscoveryDocument::Registry(vec![
            instance("/work/Game", 4001),
            instance("/work/Other", 4002),
        ]);
        let result = doc.select(Path::new("/work/GameTwo"), Path::new(PATH));
        match result {
            Err(DiscoveryError::NoMatch { count, .. }) => assert_eq!(count, 2),
            other => panic!("Expected NoMatch, got: {other:?}"),
        }
    }

    #[test]
    fn sole_entry_is_fallback() {
        let doc = DiscoveryDocument::Registry(vec![instance("/work/Game", 4001)]);
        let r = doc
            .select(Path::new("/somewhere/else"), Path::new(PATH))
            .unwrap();
        assert_eq!(r.port, 4001);
    }
}
