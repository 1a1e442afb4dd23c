//! Protocol buffer types for the Terraform Plugin Protocol v6
//!
//! The protobuf code is generated at build time by tonic_build from
//! proto/tfplugin6.proto and included here. Several generated types share
//! names with framework types (`DynamicValue`, `Diagnostic`, `Schema`,
//! `AttributePath`); always use the `proto::` prefix for the wire types.
//!
//! RPC request/response types live in snake_case modules named after the
//! call, e.g. `proto::get_provider_schema::Request`.

include!(concat!(env!("OUT_DIR"), "/tfplugin6.rs"));

// Re-export the gRPC service trait and server wrapper.
pub use provider_server::{Provider as ProviderService, ProviderServer};
