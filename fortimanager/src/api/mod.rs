//! FortiManager JSON-RPC API client and typed endpoint wrappers

pub mod client;
pub mod common;
pub mod device;
pub mod dvmdb;
pub mod error;
pub mod firewall;
pub mod router;
pub mod rpc;
pub mod sdwan;
pub mod system;
pub mod wireless;

#[cfg(test)]
pub mod test_helpers;

pub use client::{Client, RetryConfig, SystemStatus};
pub use error::ApiError;
