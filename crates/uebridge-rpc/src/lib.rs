//! RPC client for the UE RPC server.
//!
//! The server speaks newline-delimited JSON over TCP: the client writes one
//! `{"id", "op", ...params}` line and reads back exactly one JSON object line.
//! Every call opens its own connection and is bounded by a single timeout.

pub mod envelope;
pub mod transport;

pub use envelope::{RESERVED_KEYS, RpcRequest, generate_request_id};
pub use transport::{MAX_RESPONSE_BYTES, call};
