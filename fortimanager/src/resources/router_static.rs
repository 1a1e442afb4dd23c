//! Static route resource

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

use crate::api::router::StaticRoute;
use crate::resources::util::{expand_string_list, flatten_string_list};

#[derive(Default)]
pub struct RouterStaticResource {
    provider_data: Option<crate::FortimanagerProviderData>,
}

impl RouterStaticResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages an IPv4 static route on a FortiManager-managed device")
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
                AttributeBuilder::new("seq_num", AttributeType::Number)
                    .description("Route sequence number, assigned when omitted")
                    .optional()
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("dst", AttributeType::String)
                    .description("Destination network, e.g. '10.0.0.0 255.0.0.0'")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("gateway", AttributeType::String)
                    .description("Gateway address")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "device",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Outgoing interface")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("distance", AttributeType::Number)
                    .description("Administrative distance (1 - 255)")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("priority", AttributeType::Number)
                    .description("Route priority")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("weight", AttributeType::Number)
                    .description("ECMP weight (0 - 255)")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::Bool)
                    .description("Enable or disable the route")
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

    fn scope(value: &DynamicValue) -> Result<(String, String), Diagnostic> {
        let device = value
            .get_string(&AttributePath::new("device_name"))
            .map_err(|_| {
                Diagnostic::error("Missing device_name", "The 'device_name' attribute is required")
            })?;
        let vdom = value
            .get_string(&AttributePath::new("vdom"))
            .unwrap_or_else(|_| "root".to_string());
        Ok((device, vdom))
    }

    fn expand_route(value: &DynamicValue) -> StaticRoute {
        StaticRoute {
            seq_num: value
                .get_number(&AttributePath::new("seq_num"))
                .ok()
                .map(|n| n as u32),
            dst: value.get_string(&AttributePath::new("dst")).ok(),
            gateway: value.get_string(&AttributePath::new("gateway")).ok(),
            device: expand_string_list(value, &AttributePath::new("device")),
            distance: value
                .get_number(&AttributePath::new("distance"))
                .ok()
                .map(|n| n as u32),
            priority: value
                .get_number(&AttributePath::new("priority"))
                .ok()
                .map(|n| n as u32),
            weight: value
                .get_number(&AttributePath::new("weight"))
                .ok()
                .map(|n| n as u32),
            status: value
                .get_bool(&AttributePath::new("status"))
                .ok()
                .map(Into::into),
            comment: value.get_string(&AttributePath::new("comment")).ok(),
        }
    }

    fn flatten_route(state: &mut DynamicValue, route: &StaticRoute) {
        if let Some(seq_num) = route.seq_num {
            let _ = state.set_number(&AttributePath::new("seq_num"), seq_num as f64);
        }
        if let Some(dst) = &route.dst {
            let _ = state.set_string(&AttributePath::new("dst"), dst.clone());
        }
        if let Some(gateway) = &route.gateway {
            let _ = state.set_string(&AttributePath::new("gateway"), gateway.clone());
        }
        if let Some(device) = &route.device {
            let _ = state.set(&AttributePath::new("device"), flatten_string_list(device));
        }
        if let Some(distance) = route.distance {
            let _ = state.set_number(&AttributePath::new("distance"), distance as f64);
        }
        if let Some(priority) = route.priority {
            let _ = state.set_number(&AttributePath::new("priority"), priority as f64);
        }
        if let Some(weight) = route.weight {
            let _ = state.set_number(&AttributePath::new("weight"), weight as f64);
        }
        if let Some(status) = route.status {
            let _ = state.set_bool(&AttributePath::new("status"), status.as_bool());
        }
        if let Some(comment) = &route.comment {
            let _ = state.set_string(&AttributePath::new("comment"), comment.clone());
        }
    }
}

#[async_trait]
impl Resource for RouterStaticResource {
    fn type_name(&self) -> &str {
        "fortimanager_router_static"
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

        if let Ok(distance) = request.config.get_number(&AttributePath::new("distance")) {
            if !(1.0..=255.0).contains(&distance) {
                diagnostics.push(
                    Diagnostic::error("Invalid distance", "Distance must be between 1 and 255")
                        .with_attribute(AttributePath::new("distance")),
                );
            }
        }

        if let Ok(weight) = request.config.get_number(&AttributePath::new("weight")) {
            if !(0.0..=255.0).contains(&weight) {
                diagnostics.push(
                    Diagnostic::error("Invalid weight", "Weight must be between 0 and 255")
                        .with_attribute(AttributePath::new("weight")),
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

        let (device, vdom) = match Self::scope(&request.config) {
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

        let route = Self::expand_route(&request.config);
        match provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .router()
            .create_static_route(&route)
            .await
        {
            Ok(seq_num) => {
                let mut new_state = request.planned_state;
                let _ = new_state.set_number(&AttributePath::new("seq_num"), seq_num as f64);
                CreateResourceResponse {
                    new_state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create static route",
                    e.to_string(),
                ));
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

        let (device, vdom) = match Self::scope(&request.current_state) {
            Ok(scope) => scope,
            Err(_) => {
                return ReadResourceResponse {
                    new_state: None,
                    private: request.private,
                    diagnostics,
                };
            }
        };
        let seq_num = match request
            .current_state
            .get_number(&AttributePath::new("seq_num"))
        {
            Ok(seq_num) => seq_num as u32,
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
            .router()
            .get_static_route(seq_num)
            .await
        {
            Ok(route) => {
                let mut new_state = request.current_state.clone();
                Self::flatten_route(&mut new_state, &route);
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
                diagnostics.push(Diagnostic::error(
                    "Failed to read static route",
                    e.to_string(),
                ));
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

        let (device, vdom) = match Self::scope(&request.config) {
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
        let seq_num = match request
            .prior_state
            .get_number(&AttributePath::new("seq_num"))
        {
            Ok(seq_num) => seq_num as u32,
            Err(_) => {
                diagnostics.push(Diagnostic::error(
                    "Missing seq_num",
                    "Prior state has no seq_num to update",
                ));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let route = Self::expand_route(&request.config);
        match provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .router()
            .set_static_route(seq_num, &route)
            .await
        {
            Ok(()) => {
                let mut new_state = request.planned_state;
                let _ = new_state.set_number(&AttributePath::new("seq_num"), seq_num as f64);
                UpdateResourceResponse {
                    new_state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to update static route",
                    e.to_string(),
                ));
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

        let (device, vdom) = match Self::scope(&request.prior_state) {
            Ok(scope) => scope,
            Err(_) => {
                return DeleteResourceResponse { diagnostics };
            }
        };
        let seq_num = match request
            .prior_state
            .get_number(&AttributePath::new("seq_num"))
        {
            Ok(seq_num) => seq_num as u32,
            Err(_) => {
                return DeleteResourceResponse { diagnostics };
            }
        };

        match provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .router()
            .delete_static_route(seq_num)
            .await
        {
            Ok(()) => DeleteResourceResponse { diagnostics },
            Err(e) if e.is_not_found() => DeleteResourceResponse { diagnostics },
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to delete static route",
                    e.to_string(),
                ));
                DeleteResourceResponse { diagnostics }
            }
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for RouterStaticResource {
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
    use crate::api::test_helpers::{connect, mock_login, mock_rpc, mock_rpc_error};
    use crate::FortimanagerProviderData;
    use mockito::Server;
    use serde_json::json;
    use std::sync::Arc;
    use tfplug::types::Dynamic;

    const ROUTE_URL: &str = "/pm/config/device/fw01/vdom/root/router/static";

    async fn test_resource(server: &Server) -> RouterStaticResource {
        RouterStaticResource {
            provider_data: Some(FortimanagerProviderData {
                client: Arc::new(connect(server).await),
                adom: "root".to_string(),
            }),
        }
    }

    fn test_config() -> DynamicValue {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("device_name"), "fw01".to_string());
        let _ = config.set_string(&AttributePath::new("dst"), "10.0.0.0 255.0.0.0".to_string());
        let _ = config.set_string(&AttributePath::new("gateway"), "192.168.1.254".to_string());
        let _ = config.set_list(
            &AttributePath::new("device"),
            vec![Dynamic::String("port1".to_string())],
        );
        config
    }

    #[test]
    fn schema_marks_seq_num_computed() {
        let schema = RouterStaticResource::resource_schema();

        let seq_num = schema.attribute("seq_num").unwrap();
        assert!(seq_num.optional);
        assert!(seq_num.computed);
        assert!(schema.attribute("device_name").unwrap().force_new);
    }

    #[tokio::test]
    async fn validate_rejects_out_of_range_distance() {
        let resource = RouterStaticResource::new();
        let mut config = test_config();
        let _ = config.set_number(&AttributePath::new("distance"), 300.0);

        let response = resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: "fortimanager_router_static".to_string(),
                    config,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].summary.contains("Invalid distance"));
    }

    #[tokio::test]
    async fn create_stores_assigned_seq_num() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _add = mock_rpc(&mut server, "add", ROUTE_URL, json!({"seq-num": 12})).await;

        let resource = test_resource(&server).await;
        let config = test_config();

        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "fortimanager_router_static".to_string(),
                    config: config.clone(),
                    planned_state: config,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert_eq!(
            response
                .new_state
                .get_number(&AttributePath::new("seq_num"))
                .unwrap(),
            12.0
        );
    }

    #[tokio::test]
    async fn read_joins_destination_pair() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _get = mock_rpc(
            &mut server,
            "get",
            &format!("{}/12", ROUTE_URL),
            json!({
                "seq-num": 12,
                "dst": ["10.0.0.0", "255.0.0.0"],
                "gateway": "192.168.1.254",
                "device": "port1",
                "distance": 10
            }),
        )
        .await;

        let resource = test_resource(&server).await;
        let mut state = DynamicValue::empty_object();
        let _ = state.set_string(&AttributePath::new("device_name"), "fw01".to_string());
        let _ = state.set_number(&AttributePath::new("seq_num"), 12.0);

        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "fortimanager_router_static".to_string(),
                    current_state: state,
                    private: vec![],
                },
            )
            .await;

        let new_state = response.new_state.unwrap();
        assert_eq!(
            new_state.get_string(&AttributePath::new("dst")).unwrap(),
            "10.0.0.0 255.0.0.0"
        );
        assert_eq!(
            new_state.get_number(&AttributePath::new("distance")).unwrap(),
            10.0
        );
    }

    #[tokio::test]
    async fn read_clears_state_when_route_is_gone() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _get = mock_rpc_error(
            &mut server,
            "get",
            &format!("{}/12", ROUTE_URL),
            -3,
            "Object does not exist",
        )
        .await;

        let resource = test_resource(&server).await;
        let mut state = DynamicValue::empty_object();
        let _ = state.set_string(&AttributePath::new("device_name"), "fw01".to_string());
        let _ = state.set_number(&AttributePath::new("seq_num"), 12.0);

        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "fortimanager_router_static".to_string(),
                    current_state: state,
                    private: vec![],
                },
            )
            .await;

        assert!(response.new_state.is_none());
    }

    #[tokio::test]
    async fn delete_issues_delete_for_seq_num() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let delete = mock_rpc(
            &mut server,
            "delete",
            &format!("{}/12", ROUTE_URL),
            json!(null),
        )
        .await;

        let resource = test_resource(&server).await;
        let mut prior = test_config();
        let _ = prior.set_number(&AttributePath::new("seq_num"), 12.0);

        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "fortimanager_router_static".to_string(),
                    prior_state: prior,
                    planned_private: vec![],
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        delete.assert_async().await;
    }
}
