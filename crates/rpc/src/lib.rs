//! `sigil-rpc` — resilient RPC client fabric.
//!
//! A generic harness any service-to-service caller uses to reach remote
//! services: one managed channel per downstream, wrapped in a fixed
//! interceptor pipeline (retry around logging around the transport), with
//! bounded retries, exponential backoff, and per-attempt deadlines.

pub mod channel;
pub mod client;
pub mod config;
pub mod proto;
pub mod status;
pub mod transport;

pub use channel::Channel;
pub use client::{AuthClient, RpcClient, connect};
pub use config::{ClientConfig, RetryPolicy};
pub use status::{Code, RpcError};
pub use transport::{HttpTransport, Transport};
