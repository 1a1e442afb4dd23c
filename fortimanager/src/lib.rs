//! Terraform provider for Fortinet FortiManager
//!
//! Exposes configuration objects of FortiManager-managed devices as
//! Terraform resources. Every resource follows the same pattern: a schema
//! mirroring the remote object, CRUD handlers that assemble the device/vdom
//! scope and call the JSON-RPC client, and flatten/expand converters between
//! Terraform state and the wire shapes.

pub mod api;
pub mod data_sources;
pub mod provider_data;
pub mod resources;

pub use provider_data::FortimanagerProviderData;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tfplug::context::Context;
use tfplug::data_source::DataSourceWithConfigure;
use tfplug::provider::{
    ConfigureProviderRequest, ConfigureProviderResponse, Provider, ProviderSchemaRequest,
    ProviderSchemaResponse,
};
use tfplug::resource::ResourceWithConfigure;
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic};
use tfplug::TfplugError;

use crate::api::Client;

#[derive(Default)]
pub struct FortimanagerProvider;

impl FortimanagerProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Provider for FortimanagerProvider {
    async fn schema(&self, _ctx: Context, _request: ProviderSchemaRequest) -> ProviderSchemaResponse {
        let schema = SchemaBuilder::new()
            .version(0)
            .description("FortiManager provider configuration")
            .attribute(
                AttributeBuilder::new("hostname", AttributeType::String)
                    .description(
                        "FortiManager hostname or URL (or FORTIMANAGER_HOSTNAME env var)",
                    )
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("username", AttributeType::String)
                    .description("API user name (or FORTIMANAGER_USERNAME env var)")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("password", AttributeType::String)
                    .description("API user password (or FORTIMANAGER_PASSWORD env var)")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("adom", AttributeType::String)
                    .description("Administrative domain, defaults to 'root'")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("insecure", AttributeType::Bool)
                    .description("Skip TLS certificate verification")
                    .optional()
                    .build(),
            )
            .build();

        ProviderSchemaResponse {
            schema,
            diagnostics: vec![],
        }
    }

    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureProviderRequest,
    ) -> ConfigureProviderResponse {
        let config = &request.config;

        let hostname = config
            .get_string(&AttributePath::new("hostname"))
            .ok()
            .or_else(|| std::env::var("FORTIMANAGER_HOSTNAME").ok());
        let username = config
            .get_string(&AttributePath::new("username"))
            .ok()
            .or_else(|| std::env::var("FORTIMANAGER_USERNAME").ok());
        let password = config
            .get_string(&AttributePath::new("password"))
            .ok()
            .or_else(|| std::env::var("FORTIMANAGER_PASSWORD").ok());
        let adom = config
            .get_string(&AttributePath::new("adom"))
            .ok()
            .or_else(|| std::env::var("FORTIMANAGER_ADOM").ok())
            .unwrap_or_else(|| "root".to_string());
        let insecure = config
            .get_bool(&AttributePath::new("insecure"))
            .ok()
            .or_else(|| {
                std::env::var("FORTIMANAGER_INSECURE")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok())
            })
            .unwrap_or(false);

        let mut diagnostics = vec![];

        let (hostname, username, password) = match (hostname, username, password) {
            (Some(hostname), Some(username), Some(password)) => (hostname, username, password),
            (None, _, _) => {
                diagnostics.push(Diagnostic::error(
                    "Missing hostname",
                    "hostname is required (set in provider config or FORTIMANAGER_HOSTNAME env var)",
                ));
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
            (_, None, _) => {
                diagnostics.push(Diagnostic::error(
                    "Missing username",
                    "username is required (set in provider config or FORTIMANAGER_USERNAME env var)",
                ));
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
            (_, _, None) => {
                diagnostics.push(Diagnostic::error(
                    "Missing password",
                    "password is required (set in provider config or FORTIMANAGER_PASSWORD env var)",
                ));
                return ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                };
            }
        };

        let endpoint = if hostname.contains("://") {
            hostname
        } else {
            format!("https://{}", hostname)
        };

        match Client::connect(&endpoint, &username, &password, insecure).await {
            Ok(client) => ConfigureProviderResponse {
                diagnostics,
                provider_data: Some(Arc::new(FortimanagerProviderData::new(client, adom))),
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to connect to FortiManager",
                    e.to_string(),
                ));
                ConfigureProviderResponse {
                    diagnostics,
                    provider_data: None,
                }
            }
        }
    }

    async fn create_resource(
        &self,
        type_name: &str,
    ) -> tfplug::Result<Box<dyn ResourceWithConfigure>> {
        match type_name {
            "fortimanager_firewall_policy" => {
                Ok(Box::new(resources::FirewallPolicyResource::new()))
            }
            "fortimanager_router_static" => Ok(Box::new(resources::RouterStaticResource::new())),
            "fortimanager_system_interface" => {
                Ok(Box::new(resources::SystemInterfaceResource::new()))
            }
            "fortimanager_wireless_vap" => Ok(Box::new(resources::WirelessVapResource::new())),
            "fortimanager_sdwan_health_check" => {
                Ok(Box::new(resources::SdwanHealthCheckResource::new()))
            }
            _ => Err(TfplugError::ResourceNotFound(type_name.to_string())),
        }
    }

    async fn create_data_source(
        &self,
        type_name: &str,
    ) -> tfplug::Result<Box<dyn DataSourceWithConfigure>> {
        match type_name {
            "fortimanager_system_status" => {
                Ok(Box::new(data_sources::SystemStatusDataSource::new()))
            }
            "fortimanager_dvmdb_device" => Ok(Box::new(data_sources::DvmdbDeviceDataSource::new())),
            _ => Err(TfplugError::DataSourceNotFound(type_name.to_string())),
        }
    }

    async fn resource_schemas(&self) -> HashMap<String, Schema> {
        static SCHEMAS: std::sync::OnceLock<HashMap<String, Schema>> = std::sync::OnceLock::new();

        SCHEMAS
            .get_or_init(|| {
                HashMap::from([
                    (
                        "fortimanager_firewall_policy".to_string(),
                        resources::FirewallPolicyResource::resource_schema(),
                    ),
                    (
                        "fortimanager_router_static".to_string(),
                        resources::RouterStaticResource::resource_schema(),
                    ),
                    (
                        "fortimanager_system_interface".to_string(),
                        resources::SystemInterfaceResource::resource_schema(),
                    ),
                    (
                        "fortimanager_wireless_vap".to_string(),
                        resources::WirelessVapResource::resource_schema(),
                    ),
                    (
                        "fortimanager_sdwan_health_check".to_string(),
                        resources::SdwanHealthCheckResource::resource_schema(),
                    ),
                ])
            })
            .clone()
    }

    async fn data_source_schemas(&self) -> HashMap<String, Schema> {
        static SCHEMAS: std::sync::OnceLock<HashMap<String, Schema>> = std::sync::OnceLock::new();

        SCHEMAS
            .get_or_init(|| {
                HashMap::from([
                    (
                        "fortimanager_system_status".to_string(),
                        data_sources::SystemStatusDataSource::data_source_schema(),
                    ),
                    (
                        "fortimanager_dvmdb_device".to_string(),
                        data_sources::DvmdbDeviceDataSource::data_source_schema(),
                    ),
                ])
            })
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::mock_login;
    use mockito::Server;
    use serial_test::serial;
    use tfplug::types::DynamicValue;

    fn config_with(values: &[(&str, &str)]) -> DynamicValue {
        let mut config = DynamicValue::empty_object();
        for (key, value) in values {
            let _ = config.set_string(&AttributePath::new(key), value.to_string());
        }
        config
    }

    #[tokio::test]
    #[serial]
    async fn provider_configures_from_config_values() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;

        let mut provider = FortimanagerProvider::new();
        let mut config = config_with(&[
            ("hostname", &server.url()),
            ("username", "admin"),
            ("password", "secret"),
        ]);
        let _ = config.set_bool(&AttributePath::new("insecure"), true);

        let response = provider
            .configure(
                Context::new(),
                ConfigureProviderRequest {
                    terraform_version: "1.9.0".to_string(),
                    config,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert!(response.provider_data.is_some());
    }

    #[tokio::test]
    #[serial]
    async fn provider_requires_hostname() {
        std::env::remove_var("FORTIMANAGER_HOSTNAME");

        let mut provider = FortimanagerProvider::new();
        let config = config_with(&[("username", "admin"), ("password", "secret")]);

        let response = provider
            .configure(
                Context::new(),
                ConfigureProviderRequest {
                    terraform_version: "1.9.0".to_string(),
                    config,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].summary.contains("Missing hostname"));
        assert!(response.provider_data.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn provider_requires_password() {
        std::env::remove_var("FORTIMANAGER_PASSWORD");

        let mut provider = FortimanagerProvider::new();
        let config = config_with(&[("hostname", "fmg.example.com"), ("username", "admin")]);

        let response = provider
            .configure(
                Context::new(),
                ConfigureProviderRequest {
                    terraform_version: "1.9.0".to_string(),
                    config,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].summary.contains("Missing password"));
    }

    #[tokio::test]
    #[serial]
    async fn provider_falls_back_to_env_vars() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;

        std::env::set_var("FORTIMANAGER_HOSTNAME", server.url());
        std::env::set_var("FORTIMANAGER_USERNAME", "admin");
        std::env::set_var("FORTIMANAGER_PASSWORD", "secret");
        std::env::set_var("FORTIMANAGER_INSECURE", "true");

        let mut provider = FortimanagerProvider::new();
        let response = provider
            .configure(
                Context::new(),
                ConfigureProviderRequest {
                    terraform_version: "1.9.0".to_string(),
                    config: DynamicValue::empty_object(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert!(response.provider_data.is_some());

        std::env::remove_var("FORTIMANAGER_HOSTNAME");
        std::env::remove_var("FORTIMANAGER_USERNAME");
        std::env::remove_var("FORTIMANAGER_PASSWORD");
        std::env::remove_var("FORTIMANAGER_INSECURE");
    }

    #[tokio::test]
    async fn provider_creates_registered_resources() {
        let provider = FortimanagerProvider::new();

        for type_name in [
            "fortimanager_firewall_policy",
            "fortimanager_router_static",
            "fortimanager_system_interface",
            "fortimanager_wireless_vap",
            "fortimanager_sdwan_health_check",
        ] {
            assert!(provider.create_resource(type_name).await.is_ok());
        }

        assert!(provider.create_resource("fortimanager_bogus").await.is_err());
    }

    #[tokio::test]
    async fn provider_creates_registered_data_sources() {
        let provider = FortimanagerProvider::new();

        assert!(provider
            .create_data_source("fortimanager_system_status")
            .await
            .is_ok());
        assert!(provider
            .create_data_source("fortimanager_dvmdb_device")
            .await
            .is_ok());
        assert!(provider.create_data_source("unknown").await.is_err());
    }

    #[tokio::test]
    async fn provider_schema_maps_cover_all_types() {
        let provider = FortimanagerProvider::new();

        let resource_schemas = provider.resource_schemas().await;
        assert_eq!(resource_schemas.len(), 5);
        assert!(resource_schemas.contains_key("fortimanager_firewall_policy"));

        let data_source_schemas = provider.data_source_schemas().await;
        assert_eq!(data_source_schemas.len(), 2);
        assert!(data_source_schemas.contains_key("fortimanager_system_status"));
    }
}
