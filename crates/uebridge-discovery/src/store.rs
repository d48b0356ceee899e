//! Read-only access to the discovery file written by the UEServer plugin.

use crate::document::DiscoveryDocument;
use crate::liveness;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uebridge_types::{ConfigError, DiscoveryError, DiscoveryRecord};

/// Directory the plugin writes its state into, relative to the project.
pub const STATE_DIR: &str = ".ueserver";

/// Per-project discovery file name.
pub const PROJECT_FILE: &str = "rpc.json";

/// Shared multi-instance registry file name (under the user's home `.ueserver`).
pub const REGISTRY_FILE: &str = "switchboard.json";

/// Which discovery file is authoritative for this process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryLayout {
    /// `<project>/.ueserver/rpc.json`, one file per project.
    #[default]
    Project,
    /// One user-wide registry listing every running instance.
    Registry,
}

impl FromStr for DiscoveryLayout {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "project" => Ok(Self::Project),
            "registry" => Ok(Self::Registry),
            other => Err(ConfigError::InvalidValue {
                key: "discovery.layout".into(),
                message: format!("expected 'project' or 'registry', got '{other}'"),
            }),
        }
    }
}

/// Locates and validates the running UE RPC server.
///
/// Every call to [`resolve`](Self::resolve) reads the file afresh; nothing is
/// cached, so a server that exits between calls is reported as stale.
#[derive(Debug, Clone)]
pub struct DiscoveryStore {
    layout: DiscoveryLayout,
    registry_path: PathBuf,
    default_selector: PathBuf,
}

impl DiscoveryStore {
    /// Per-project layout. `default_selector` is the project directory used
    /// when a call does not name one.
    pub fn project(default_selector: PathBuf) -> Self {
        Self {
            layout: DiscoveryLayout::Project,
            registry_path: PathBuf::new(),
            default_selector,
        }
    }

    /// Registry layout reading `registry_path`; instances are matched against
    /// the selector (or `default_selector`).
    pub fn registry(registry_path: PathBuf, default_selector: PathBuf) -> Self {
        Self {
            layout: DiscoveryLayout::Registry,
            registry_path,
            default_selector,
        }
    }

    pub fn layout(&self) -> DiscoveryLayout {
        self.layout
    }

    pub fn default_selector(&self) -> &Path {
        &self.default_selector
    }

    /// Path of the discovery file consulted for `selector`.
    pub fn location(&self, selector: &Path) -> PathBuf {
        match self.layout {
            DiscoveryLayout::Project => selector.join(STATE_DIR).join(PROJECT_FILE),
            DiscoveryLayout::Registry => self.registry_path.clone(),
        }
    }

    /// Resolve the live server instance for `selector` (default: the
    /// configured project directory).
    pub async fn resolve(&self, selector: Option<&Path>) -> Result<DiscoveryRecord, DiscoveryError> {
        let selector = selector.unwrap_or(&self.default_selector);
        let path = self.location(selector);
        tracing::debug!("Reading discovery file {}", path.display());

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DiscoveryError::NotRunning { path });
            }
            Err(e) => return Err(DiscoveryError::Unreadable { path, source: e }),
        };

        let record = DiscoveryDocument::parse(&bytes, &path)?.select(selector, &path)?;

        if !liveness::is_alive(record.pid) {
            tracing::warn!(
                "Discovery file {} points at pid {} which is not running",
                path.display(),
                record.pid
            );
            return Err(DiscoveryError::Stale {
                pid: record.pid,
                path,
            });
        }

        tracing::debug!(
            "Resolved UE RPC server on port {} (pid {})",
            record.port,
            record.pid
        );
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_location() {
        let store = DiscoveryStore::project(PathBuf::from("/work/Game"));
        assert_eq!(
            store.location(Path::new("/work/Game")),
            PathBuf::from("/work/Game/.ueserver/rpc.json")
        );
    }

    #[test]
    fn registry_location_ignores_selector() {
        let store = DiscoveryStore::registry(
            PathBuf::from("/home/u/.ueserver/switchboard.json"),
            PathBuf::from("/work/Game"),
        );
        assert_eq!(
            store.location(Path::new("/elsewhere")),
            PathBuf::from("/home/u/.ueserver/switchboard.json")
        );
        assert_eq!(store.layout(), DiscoveryLayout::Registry);
    }

    #[test]
    fn layout_from_str() {
        assert_eq!(
            "Registry".parse::<DiscoveryLayout>().unwrap(),
            DiscoveryLayout::Registry
        );
        assert_eq!(
            " project ".parse::<DiscoveryLayout>().unwrap(),
            DiscoveryLayout::Project
        );
        let err = "central".parse::<DiscoveryLayout>().unwrap_err();
        assert!(err.to_string().contains("central"));
    }

    #[tokio::test]
    async fn unreadable_path_is_not_reported_as_not_running() {
        // A directory where the file should be cannot be read as a file.
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(STATE_DIR).join(PROJECT_FILE)).unwrap();
        let store = DiscoveryStore::project(dir.path().to_path_buf());
        let result = store.resolve(None).await;
        assert!(matches!(result, Err(DiscoveryError::Unreadable { .. })));
    }
}
