//! Discovery record describing one running UE RPC server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One candidate server instance read from a discovery file.
///
/// Whether the instance is stale is decided by the liveness check at
/// resolution time and is not stored here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    pub port: u16,
    pub pid: u32,
    /// Server start time as written by the plugin (ISO 8601). May be empty.
    #[serde(default)]
    pub started: String,
    /// Project directory the instance serves (multi-instance registry only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
}

impl DiscoveryRecord {
    /// Parse `started`, if it holds an RFC 3339 timestamp.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.started)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Seconds since `started`, measured against `now`.
    pub fn uptime_secs(&self, now: DateTime<Utc>) -> Option<i64> {
        self.started_at().map(|t| (now - t).num_seconds().max(0))
    }
}
