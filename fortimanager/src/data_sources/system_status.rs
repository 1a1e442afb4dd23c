//! FortiManager system status data source

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
pub struct SystemStatusDataSource {
    provider_data: Option<crate::FortimanagerProviderData>,
}

impl SystemStatusDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_source_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Reads version and identity of the FortiManager appliance")
            .attribute(
                AttributeBuilder::new("id", AttributeType::String)
                    .description("The data source ID")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("hostname", AttributeType::String)
                    .description("Configured hostname")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("version", AttributeType::String)
                    .description("Firmware version")
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
                AttributeBuilder::new("platform", AttributeType::String)
                    .description("Platform type")
                    .computed()
                    .build(),
            )
            .build()
    }
}

#[async_trait]
impl DataSource for SystemStatusDataSource {
    fn type_name(&self) -> &str {
        "fortimanager_system_status"
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

    async fn read(&self, _ctx: Context, _request: ReadDataSourceRequest) -> ReadDataSourceResponse {
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

        match provider_data.client.get_status().await {
            Ok(status) => {
                let mut state = DynamicValue::empty_object();
                let _ = state.set_string(
                    &AttributePath::new("id"),
                    "fortimanager_system_status".to_string(),
                );
                let _ = state.set_string(&AttributePath::new("hostname"), status.hostname);
                let _ = state.set_string(&AttributePath::new("version"), status.version);
                let _ = state.set_string(&AttributePath::new("serial"), status.serial);
                if let Some(platform) = status.platform {
                    let _ = state.set_string(&AttributePath::new("platform"), platform);
                }

                ReadDataSourceResponse { state, diagnostics }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to read system status",
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
impl DataSourceWithConfigure for SystemStatusDataSource {
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
    use crate::api::test_helpers::{connect, mock_login, mock_rpc};
    use crate::FortimanagerProviderData;
    use mockito::Server;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn read_populates_all_attributes() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _get = mock_rpc(
            &mut server,
            "get",
            "/sys/status",
            json!({
                "Hostname": "fmg01",
                "Version": "v7.2.2-build1334",
                "Serial Number": "FMG-VM0000000001",
                "Platform Type": "FMG-VM64"
            }),
        )
        .await;

        let data_source = SystemStatusDataSource {
            provider_data: Some(FortimanagerProviderData {
                client: Arc::new(connect(&server).await),
                adom: "root".to_string(),
            }),
        };

        let response = data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "fortimanager_system_status".to_string(),
                    config: DynamicValue::empty_object(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert_eq!(
            response
                .state
                .get_string(&AttributePath::new("hostname"))
                .unwrap(),
            "fmg01"
        );
        assert_eq!(
            response
                .state
                .get_string(&AttributePath::new("version"))
                .unwrap(),
            "v7.2.2-build1334"
        );
        assert_eq!(
            response
                .state
                .get_string(&AttributePath::new("platform"))
                .unwrap(),
            "FMG-VM64"
        );
    }

    #[tokio::test]
    async fn read_without_provider_data_reports_error() {
        let data_source = SystemStatusDataSource::new();

        let response = data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: "fortimanager_system_status".to_string(),
                    config: DynamicValue::empty_object(),
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0]
            .summary
            .contains("Provider not configured"));
    }
}
