//! Layered configuration for ue-bridge.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > config file > defaults

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use uebridge_discovery::{DiscoveryLayout, DiscoveryStore, REGISTRY_FILE, STATE_DIR};
use uebridge_tools::{DEFAULT_HEALTH_TIMEOUT_MS, StartSettings, ToolRegistry};
use uebridge_types::{ConfigError, ConnectionContext, DEFAULT_HOST, DEFAULT_TIMEOUT_MS};

/// Name of the settings file inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Resolved configuration for one ue-bridge process.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub host: String,
    pub timeout_ms: u64,
    pub health_timeout_ms: u64,
    pub layout: DiscoveryLayout,
    pub registry_path: PathBuf,
    /// Absolute project directory discovery uses when a call does not name one.
    pub project_dir: PathBuf,
    /// Directory ue-bridge was started from; relative tool paths resolve here.
    pub cwd: PathBuf,
    pub start: StartSettings,
    pub config_dir: PathBuf,
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub rpc: RpcSettings,
    #[serde(default)]
    pub discovery: DiscoverySettings,
    #[serde(default)]
    pub start: StartSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcSettings {
    pub host: Option<String>,
    pub timeout_ms: Option<u64>,
    pub health_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscoverySettings {
    pub layout: Option<DiscoveryLayout>,
    /// Registry file path; a leading `~/` is expanded to the home directory.
    pub registry_path: Option<String>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub timeout_ms: Option<u64>,
    pub project_dir: Option<PathBuf>,
}

impl BridgeConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. `<config_dir>/config.toml`
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = load_settings_file(&config_dir.join(CONFIG_FILE))?;
        let cwd = std::env::current_dir().map_err(|e| ConfigError::InvalidValue {
            key: "project_dir".into(),
            message: format!("cannot determine current directory: {e}"),
        })?;
        Self::resolve(
            overrides,
            settings,
            |key| std::env::var(key).ok(),
            config_dir,
            &cwd,
        )
    }

    /// Merge already-read sources. `env` looks up environment variables and
    /// `cwd` anchors a relative project directory.
    pub fn resolve(
        overrides: CliOverrides,
        settings: SettingsFile,
        env: impl Fn(&str) -> Option<String>,
        config_dir: PathBuf,
        cwd: &Path,
    ) -> Result<Self, ConfigError> {
        // Host: env > config file > default
        let host = env("UEBRIDGE_HOST")
            .or(settings.rpc.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        if host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "rpc.host".into(),
                message: "must not be empty".into(),
            });
        }

        // Timeout: CLI > env > config file > default
        let env_timeout = env("UEBRIDGE_TIMEOUT_MS")
            .map(|raw| parse_millis("UEBRIDGE_TIMEOUT_MS", &raw))
            .transpose()?;
        let timeout_ms = overrides
            .timeout_ms
            .or(env_timeout)
            .or(settings.rpc.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        require_positive("rpc.timeout_ms", timeout_ms)?;

        let health_timeout_ms = settings
            .rpc
            .health_timeout_ms
            .unwrap_or(DEFAULT_HEALTH_TIMEOUT_MS);
        require_positive("rpc.health_timeout_ms", health_timeout_ms)?;

        // Layout: env > config file > default
        let layout = match env("UEBRIDGE_DISCOVERY_LAYOUT") {
            Some(raw) => raw.parse()?,
            None => settings.discovery.layout.unwrap_or_default(),
        };

        let registry_path = settings
            .discovery
            .registry_path
            .map(|p| expand_home(&p))
            .unwrap_or_else(default_registry_path);

        // Registry entries hold absolute project paths, so the selector must be too.
        let project_dir = match overrides.project_dir {
            Some(dir) => absolute_from(cwd, &dir),
            None => absolute_from(cwd, Path::new("")),
        };

        Ok(BridgeConfig {
            host,
            timeout_ms,
            health_timeout_ms,
            layout,
            registry_path,
            project_dir,
            cwd: cwd.to_path_buf(),
            start: settings.start,
            config_dir,
        })
    }

    /// The discovery store for the configured layout.
    pub fn discovery_store(&self) -> DiscoveryStore {
        match self.layout {
            DiscoveryLayout::Project => DiscoveryStore::project(self.project_dir.clone()),
            DiscoveryLayout::Registry => {
                DiscoveryStore::registry(self.registry_path.clone(), self.project_dir.clone())
            }
        }
    }

    /// Connection context for a server discovered on `port`.
    pub fn connection(&self, port: u16) -> Result<ConnectionContext, ConfigError> {
        ConnectionContext::new(self.host.clone(), port, self.timeout_ms)
    }

    /// A registry holding every built-in tool, wired to this configuration.
    pub fn tool_registry(&self) -> ToolRegistry {
        ToolRegistry::with_builtins(
            self.discovery_store(),
            self.health_timeout_ms,
            self.start.clone(),
        )
    }
}

/// Get the ue-bridge config directory path (~/.uebridge/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("UEBRIDGE_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    home_dir().join(".uebridge")
}

/// Default registry file: `~/.ueserver/switchboard.json`.
pub fn default_registry_path() -> PathBuf {
    home_dir().join(STATE_DIR).join(REGISTRY_FILE)
}

fn home_dir() -> PathBuf {
    dirs_next::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn expand_home(path: &str) -> PathBuf {
    match path.strip_prefix("~/") {
        Some(rest) => home_dir().join(rest),
        None if path == "~" => home_dir(),
        None => PathBuf::from(path),
    }
}

/// `dir` joined onto `base` with `.` and `..` folded away lexically.
fn absolute_from(base: &Path, dir: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in base.join(dir).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn parse_millis(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.into(),
            message: format!("expected milliseconds, got '{raw}': {e}"),
        })
}

fn require_positive(key: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.into(),
            message: "must be greater than 0".into(),
        });
    }
    Ok(())
}

/// Load and parse a TOML settings file. A missing file yields defaults.
pub fn load_settings_file(path: &Path) -> Result<SettingsFile, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(SettingsFile::default())
        }
        Err(e) => Err(ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}
