//! Discovery of the UE RPC server.
//!
//! The UEServer plugin writes its listening port and process id to a small
//! JSON file on startup. This crate reads that file, validates it, picks the
//! instance serving the caller's project and checks that its process is alive.

pub mod document;
pub mod liveness;
pub mod store;

pub use document::DiscoveryDocument;
pub use liveness::is_alive;
pub use store::{DiscoveryLayout, DiscoveryStore, PROJECT_FILE, REGISTRY_FILE, STATE_DIR};
