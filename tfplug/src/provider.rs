//! Provider trait
//!
//! A provider owns the connection to the remote system and acts as a
//! factory for resources and data sources. Factories create a fresh
//! instance per request; the gRPC layer configures each instance with the
//! provider data produced by `configure` before dispatching the operation.

use crate::context::Context;
use crate::data_source::DataSourceWithConfigure;
use crate::resource::ResourceWithConfigure;
use crate::schema::Schema;
use crate::types::{Diagnostic, DynamicValue};
use crate::Result;
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait Provider: Send + Sync {
    /// Schema of the provider configuration block.
    async fn schema(&self, ctx: Context, request: ProviderSchemaRequest) -> ProviderSchemaResponse;

    /// Called once before any resource or data source operation. On success
    /// the returned `provider_data` is handed to every instance created by
    /// the factories below.
    async fn configure(
        &mut self,
        ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse;

    /// Factory: create a resource instance for the given type name.
    async fn create_resource(&self, type_name: &str) -> Result<Box<dyn ResourceWithConfigure>>;

    /// Factory: create a data source instance for the given type name.
    async fn create_data_source(&self, type_name: &str)
        -> Result<Box<dyn DataSourceWithConfigure>>;

    /// Schema map for all resources. Cache this in your implementation.
    async fn resource_schemas(&self) -> HashMap<String, Schema>;

    /// Schema map for all data sources. Cache this in your implementation.
    async fn data_source_schemas(&self) -> HashMap<String, Schema>;
}

pub struct ProviderSchemaRequest;

pub struct ProviderSchemaResponse {
    pub schema: Schema,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct ConfigureProviderRequest {
    pub terraform_version: String,
    pub config: DynamicValue,
}

pub struct ConfigureProviderResponse {
    pub diagnostics: Vec<Diagnostic>,
    /// Opaque data (typically an API client) passed to resources and data
    /// sources through their configure hooks.
    pub provider_data: Option<Arc<dyn Any + Send + Sync>>,
}
