//! Wireless controller VAP (SSID) resource

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

use crate::api::wireless::Vap;

const SECURITY_MODES: &[&str] = &[
    "open",
    "wpa2-only-personal",
    "wpa2-only-enterprise",
    "wpa3-sae",
    "wpa3-enterprise",
];

#[derive(Default)]
pub struct WirelessVapResource {
    provider_data: Option<crate::FortimanagerProviderData>,
}

impl WirelessVapResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a wireless VAP (SSID) on a FortiManager-managed device")
            .attribute(
                AttributeBuilder::new("device_name", AttributeType::String)
                    .description("Name of the managed device")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vdom", AttributeType::String)
                    .description("Virtual domain, defaults to 'root'")
                    .optional()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("VAP name")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ssid", AttributeType::String)
                    .description("Broadcast SSID")
                    .required()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("security", AttributeType::String)
                    .description("Security mode")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("passphrase", AttributeType::String)
                    .description("WPA pre-shared key")
                    .optional()
                    .sensitive()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("broadcast_ssid", AttributeType::Bool)
                    .description("Broadcast the SSID")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("max_clients", AttributeType::Number)
                    .description("Maximum client count, 0 for unlimited")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("comment", AttributeType::String)
                    .description("Comment")
                    .optional()
                    .build(),
            )
            .build()
    }

    fn scope(value: &DynamicValue) -> Result<(String, String, String), Diagnostic> {
        let device = value
            .get_string(&AttributePath::new("device_name"))
            .map_err(|_| {
                Diagnostic::error("Missing device_name", "The 'device_name' attribute is required")
            })?;
        let vdom = value
            .get_string(&AttributePath::new("vdom"))
            .unwrap_or_else(|_| "root".to_string());
        let name = value.get_string(&AttributePath::new("name")).map_err(|_| {
            Diagnostic::error("Missing name", "The 'name' attribute is required")
        })?;
        Ok((device, vdom, name))
    }

    fn expand_vap(value: &DynamicValue) -> Vap {
        Vap {
            name: value.get_string(&AttributePath::new("name")).ok(),
            ssid: value.get_string(&AttributePath::new("ssid")).ok(),
            security: value.get_string(&AttributePath::new("security")).ok(),
            passphrase: value.get_string(&AttributePath::new("passphrase")).ok(),
            broadcast_ssid: value
                .get_bool(&AttributePath::new("broadcast_ssid"))
                .ok()
                .map(Into::into),
            max_clients: value
                .get_number(&AttributePath::new("max_clients"))
                .ok()
                .map(|n| n as u32),
            comment: value.get_string(&AttributePath::new("comment")).ok(),
        }
    }

    fn flatten_vap(state: &mut DynamicValue, vap: &Vap) {
        if let Some(ssid) = &vap.ssid {
            let _ = state.set_string(&AttributePath::new("ssid"), ssid.clone());
        }
        if let Some(security) = &vap.security {
            let _ = state.set_string(&AttributePath::new("security"), security.clone());
        }
        // The passphrase is write-only on the wire; whatever is in state is
        // the last value Terraform applied, so leave it untouched.
        if let Some(broadcast_ssid) = vap.broadcast_ssid {
            let _ = state.set_bool(
                &AttributePath::new("broadcast_ssid"),
                broadcast_ssid.as_bool(),
            );
        }
        if let Some(max_clients) = vap.max_clients {
            let _ = state.set_number(&AttributePath::new("max_clients"), max_clients as f64);
        }
        if let Some(comment) = &vap.comment {
            let _ = state.set_string(&AttributePath::new("comment"), comment.clone());
        }
    }
}

#[async_trait]
impl Resource for WirelessVapResource {
    fn type_name(&self) -> &str {
        "fortimanager_wireless_vap"
    }

    async fn schema(
        &self,
        _ctx: Context,
        _request: ResourceSchemaRequest,
    ) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: Self::resource_schema(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        _ctx: Context,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let mut diagnostics = vec![];

        let security = request
            .config
            .get_string(&AttributePath::new("security"))
            .ok();

        if let Some(security) = &security {
            if !SECURITY_MODES.contains(&security.as_str()) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid security mode",
                        format!("Security must be one of {}", SECURITY_MODES.join(", ")),
                    )
                    .with_attribute(AttributePath::new("security")),
                );
            }
        }

        let has_passphrase = request
            .config
            .get_string(&AttributePath::new("passphrase"))
            .is_ok();
        if matches!(security.as_deref(), Some("wpa2-only-personal") | Some("wpa3-sae"))
            && !has_passphrase
        {
            diagnostics.push(
                Diagnostic::error(
                    "Missing passphrase",
                    format!(
                        "Security mode '{}' requires a passphrase",
                        security.as_deref().unwrap_or_default()
                    ),
                )
                .with_attribute(AttributePath::new("passphrase")),
            );
        }

        if let Ok(max_clients) = request
            .config
            .get_number(&AttributePath::new("max_clients"))
        {
            if !(0.0..=512.0).contains(&max_clients) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid max_clients",
                        "max_clients must be between 0 and 512",
                    )
                    .with_attribute(AttributePath::new("max_clients")),
                );
            }
        }

        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, _ctx: Context, request: CreateResourceRequest) -> CreateResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(Diagnostic::error(
                    "Provider not configured",
                    "Provider data was not properly configured",
                ));
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let (device, vdom, _name) = match Self::scope(&request.config) {
            Ok(scope) => scope,
            Err(diag) => {
                diagnostics.push(diag);
                return CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let vap = Self::expand_vap(&request.config);
        match provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .wireless()
            .create_vap(&vap)
            .await
        {
            Ok(()) => CreateResourceResponse {
                new_state: request.planned_state,
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to create VAP", e.to_string()));
                CreateResourceResponse {
                    new_state: request.planned_state,
                    private: vec![],
                    diagnostics,
                }
            }
        }
    }

    async fn read(&self, _ctx: Context, request: ReadResourceRequest) -> ReadResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(Diagnostic::error(
                    "Provider not configured",
                    "Provider data was not properly configured",
                ));
                return ReadResourceResponse {
                    new_state: Some(request.current_state),
                    private: request.private,
                    diagnostics,
                };
            }
        };

        let (device, vdom, name) = match Self::scope(&request.current_state) {
            Ok(scope) => scope,
            Err(_) => {
                return ReadResourceResponse {
                    new_state: None,
                    private: request.private,
                    diagnostics,
                };
            }
        };

        match provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .wireless()
            .get_vap(&name)
            .await
        {
            Ok(vap) => {
                let mut new_state = request.current_state.clone();
                Self::flatten_vap(&mut new_state, &vap);
                ReadResourceResponse {
                    new_state: Some(new_state),
                    private: request.private,
                    diagnostics,
                }
            }
            Err(e) if e.is_not_found() => ReadResourceResponse {
                new_state: None,
                private: request.private,
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to read VAP", e.to_string()));
                ReadResourceResponse {
                    new_state: Some(request.current_state),
                    private: request.private,
                    diagnostics,
                }
            }
        }
    }

    async fn update(&self, _ctx: Context, request: UpdateResourceRequest) -> UpdateResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(Diagnostic::error(
                    "Provider not configured",
                    "Provider data was not properly configured",
                ));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let (device, vdom, name) = match Self::scope(&request.config) {
            Ok(scope) => scope,
            Err(diag) => {
                diagnostics.push(diag);
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let vap = Self::expand_vap(&request.config);
        match provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .wireless()
            .set_vap(&name, &vap)
            .await
        {
            Ok(()) => UpdateResourceResponse {
                new_state: request.planned_state,
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to update VAP", e.to_string()));
                UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                }
            }
        }
    }

    async fn delete(&self, _ctx: Context, request: DeleteResourceRequest) -> DeleteResourceResponse {
        let mut diagnostics = vec![];

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                return DeleteResourceResponse { diagnostics };
            }
        };

        let (device, vdom, name) = match Self::scope(&request.prior_state) {
            Ok(scope) => scope,
            Err(_) => {
                return DeleteResourceResponse { diagnostics };
            }
        };

        match provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .wireless()
            .delete_vap(&name)
            .await
        {
            Ok(()) => DeleteResourceResponse { diagnostics },
            Err(e) if e.is_not_found() => DeleteResourceResponse { diagnostics },
            Err(e) => {
                diagnostics.push(Diagnostic::error("Failed to delete VAP", e.to_string()));
                DeleteResourceResponse { diagnostics }
            }
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for WirelessVapResource {
    async fn configure(
        &mut self,
        _ctx: Context,
        request: ConfigureResourceRequest,
    ) -> ConfigureResourceResponse {
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

        ConfigureResourceResponse { diagnostics }
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

    const VAP_URL: &str = "/pm/config/device/fw01/vdom/root/wireless-controller/vap";

    async fn test_resource(server: &Server) -> WirelessVapResource {
        WirelessVapResource {
            provider_data: Some(FortimanagerProviderData {
                client: Arc::new(connect(server).await),
                adom: "root".to_string(),
            }),
        }
    }

    fn test_config() -> DynamicValue {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("device_name"), "fw01".to_string());
        let _ = config.set_string(&AttributePath::new("name"), "office-wifi".to_string());
        let _ = config.set_string(&AttributePath::new("ssid"), "Office".to_string());
        let _ = config.set_string(
            &AttributePath::new("security"),
            "wpa2-only-personal".to_string(),
        );
        let _ = config.set_string(&AttributePath::new("passphrase"), "hunter22".to_string());
        config
    }

    #[test]
    fn schema_marks_passphrase_sensitive() {
        let schema = WirelessVapResource::resource_schema();

        assert!(schema.attribute("passphrase").unwrap().sensitive);
        assert!(schema.attribute("ssid").unwrap().required);
        assert!(schema.attribute("name").unwrap().force_new);
    }

    #[tokio::test]
    async fn validate_requires_passphrase_for_personal_modes() {
        let resource = WirelessVapResource::new();
        let mut config = test_config();
        let _ = config.set_null(&AttributePath::new("passphrase"));

        let response = resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: "fortimanager_wireless_vap".to_string(),
                    config,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].summary.contains("Missing passphrase"));
    }

    #[tokio::test]
    async fn validate_rejects_unknown_security_mode() {
        let resource = WirelessVapResource::new();
        let mut config = test_config();
        let _ = config.set_string(&AttributePath::new("security"), "wep".to_string());

        let response = resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: "fortimanager_wireless_vap".to_string(),
                    config,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0]
            .summary
            .contains("Invalid security mode"));
    }

    #[tokio::test]
    async fn create_sends_vap_payload() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let add = mock_rpc(&mut server, "add", VAP_URL, json!(null)).await;

        let resource = test_resource(&server).await;
        let config = test_config();

        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "fortimanager_wireless_vap".to_string(),
                    config: config.clone(),
                    planned_state: config,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        add.assert_async().await;
    }

    #[tokio::test]
    async fn read_preserves_passphrase_from_state() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _get = mock_rpc(
            &mut server,
            "get",
            &format!("{}/office-wifi", VAP_URL),
            json!({
                "name": "office-wifi",
                "ssid": "Office",
                "security": "wpa2-only-personal",
                "broadcast-ssid": "enable",
                "max-clients": 50
            }),
        )
        .await;

        let resource = test_resource(&server).await;
        let state = test_config();

        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "fortimanager_wireless_vap".to_string(),
                    current_state: state,
                    private: vec![],
                },
            )
            .await;

        let new_state = response.new_state.unwrap();
        // The API never echoes the passphrase; state keeps the applied one.
        assert_eq!(
            new_state
                .get_string(&AttributePath::new("passphrase"))
                .unwrap(),
            "hunter22"
        );
        assert!(new_state
            .get_bool(&AttributePath::new("broadcast_ssid"))
            .unwrap());
        assert_eq!(
            new_state
                .get_number(&AttributePath::new("max_clients"))
                .unwrap(),
            50.0
        );
    }
}
