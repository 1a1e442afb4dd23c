//! Managed-device inventory data source (dvmdb)

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::data_source::{
    ConfigureDataSourceRequest, ConfigureDataSourceResponse, DataSource, DataSourceSchemaRequest,
    DataSourceSchemaResponse, DataSourceWithConfigure, ReadDataSourceRequest,
    ReadDataSourceResponse, ValidateDataSourceConfigRequest, ValidateDataSourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

#[derive(Default)]
pub struct DvmdbDeviceDataSource {
    provider_data: Option<crate::FortimanagerProviderData>,
}

impl DvmdbDeviceDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_source_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Reads one managed device from the ADOM device database")
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Device name in the ADOM")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ip", AttributeType::String)
                    .description("Management address")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("serial", AttributeType::String)
                    .description("Serial number")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("os_version", AttributeType::String)
                    .description("FortiOS version")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("platform", AttributeType::String)
                    .description("Hardware platform")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Device description")
                    .computed()
                    .build(),
            )
            .build()
    }
}

#[async_trait]
impl DataSource for DvmdbDeviceDataSource {
    fn type_name(&self) -> &str {
        "fortimanager_dvmdb_device"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: DataSourceSchemaRequest,
    ) -> DataSourceSchemaResponse {
        DataSourceSchemaResponse {
            schema: Self::data_source_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        _request: ValidateDataSourceConfigRequest,
    ) -> ValidateDataSourceConfigResponse {
        ValidateDataSourceConfigResponse {
            diagnostics: vec![],
        }
    }

    async fn read(&self, _ctx: Context, request: ReadDataSourceRequest) -> ReadDataSourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(Diagnostic::error(
                    "Provider not configured",
                    "Provider data was not properly configured",
                ));
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        let name = match request.config.get_string(&AttributePath::new("name")) {
            Ok(name) => name,
            Err(_) => {
                diagnostics.push(
                    Diagnostic::error("Missing name", "The 'name' attribute is required")
                        .with_attribute(AttributePath::new("name")),
                );
                return ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                };
            }
        };

        match provider_data
            .client
            .dvmdb(&provider_data.adom)
            .get_device(&name)
            .await
        {
            Ok(device) => {
                let mut state = DynamicValue::empty_object();
                let _ = state.set_string(&AttributePath::new("name"), device.name);
                if let Some(ip) = device.ip {
                    let _ = state.set_string(&AttributePath::new("ip"), ip);
                }
                if let Some(sn) = device.sn {
                    let _ = state.set_string(&AttributePath::new("serial"), sn);
                }
                if let Some(os_ver) = device.os_ver {
                    let _ = state.set_string(&AttributePath::new("os_version"), os_ver);
                }
                if let Some(platform) = device.platform {
                    let _ = state.set_string(&AttributePath::new("platform"), platform);
                }
                if let Some(desc) = device.desc {
                    let _ = state.set_string(&AttributePath::new("description"), desc);
                }

                ReadDataSourceResponse { state, diagnostics }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    format!("Failed to read device {}", name),
                    e.to_string(),
                ));
                ReadDataSourceResponse {
                    state: DynamicValue::null(),
                    diagnostics,
                }
            }
        }
    }
}

#[async_trait]
impl DataSourceWithConfigure for DvmdbDeviceDataSource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureDataSourceRequest,
    ) -> ConfigureDataSourceResponse {
        let mut diagnostics = vec![];

        match request
            .provider_data
            .as_ref()
            .and_then(|data| data.downcast_ref::<crate::FortimanagerProviderData>())
        {
            Some(provider_data) => self.provider_data = Some(provider_data.clone()),
            None => diagnostics.push(Diagnostic::error(
                "Invalid provider data",
                "Expected FortimanagerProviderData from the provider",
            )),
        }

        ConfigureDataSourceResponse { diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{connect, mock_login, mock_rpc, mock_rpc_error};
    use crate::FortimanagerProviderData;
    use mockito::Server;
    use serde_json::json;
    use std::sync::Arc;

    async fn test_data_source(server: &Server) -> DvmdbDeviceDataSource {
        DvmdbDeviceDataSource {
            provider_data: Some(FortimanagerProviderData {
                client: Arc::new(connect(server).await),
                adom: "production".to_string(),
            }),
        }
    }

    fn test_config() -> DynamicValue {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("name"), "fw01".to_string());
        config
    }

    #[tokio::test]
    async fn read_uses_provider_adom() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let get = mock_rpc(
            &mut server,
            "get",
            "/dvmdb/adom/production/device/fw01",
            json!({
                "name": "fw01",
                "ip": "10.0.0.1",
                "sn": "FGT60F0000000001",
                "os_ver": "7.0",
                "platform_str": "FortiGate-60F"
            }),
        )
        .await;

        let data_source = test_data_source(&server).await;
        let response = data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "fortimanager_dvmdb_device".to_string(),
                    config: test_config(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert_eq!(
            response
                .state
                .get_string(&AttributePath::new("serial"))
                .unwrap(),
            "FGT60F0000000001"
        );
        assert_eq!(
            response
                .state
                .get_string(&AttributePath::new("platform"))
                .unwrap(),
            "FortiGate-60F"
        );
        get.assert_async().await;
    }

    #[tokio::test]
    async fn read_reports_unknown_device() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _get = mock_rpc_error(
            &mut server,
            "get",
            "/dvmdb/adom/production/device/fw01",
            -3,
            "Object does not exist",
        )
        .await;

        let data_source = test_data_source(&server).await;
        let response = data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "fortimanager_dvmdb_device".to_string(),
                    config: test_config(),
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0]
            .summary
            .contains("Failed to read device fw01"));
    }
}
