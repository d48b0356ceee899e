//! Tool registry and built-in tools for ue-bridge.

mod discover;
mod health;
mod ping;
mod registry;
mod start;

pub use discover::DiscoverTool;
pub use health::{DEFAULT_HEALTH_TIMEOUT_MS, HealthTool};
pub use ping::PingTool;
pub use registry::{ToolRegistry, reported_failure};
pub use start::{MAX_WAIT_MS, MIN_POLL_INTERVAL_MS, StartSettings, StartTool};
