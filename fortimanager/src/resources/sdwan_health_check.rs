//! SD-WAN health check resource

use async_trait::async_trait;
use std::collections::HashMap;
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceSchemaRequest, ResourceSchemaResponse,
    ResourceWithConfigure, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, NestedBlockBuilder, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, Dynamic, DynamicValue};

use crate::api::sdwan::{HealthCheck, SlaTarget};
use crate::resources::util::{expand_string_list, flatten_string_list};

const PROTOCOLS: &[&str] = &["ping", "tcp-echo", "udp-echo", "http", "twamp", "dns"];

#[derive(Default)]
pub struct SdwanHealthCheckResource {
    provider_data: Option<crate::FortimanagerProviderData>,
}

impl SdwanHealthCheckResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages an SD-WAN health check on a FortiManager-managed device")
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
                    .description("Health check name")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "server",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Probe servers")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("protocol", AttributeType::String)
                    .description("Probe protocol")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("port", AttributeType::Number)
                    .description("Probe port (1 - 65535)")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("interval", AttributeType::Number)
                    .description("Probe interval in milliseconds")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("failtime", AttributeType::Number)
                    .description("Failures before marking a link down")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("recoverytime", AttributeType::Number)
                    .description("Successes before marking a link up")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "members",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("SD-WAN member sequence numbers to probe")
                .optional()
                .build(),
            )
            .block(
                NestedBlockBuilder::list("sla")
                    .description("SLA targets evaluated against probe results")
                    .attribute(
                        AttributeBuilder::new("id", AttributeType::Number)
                            .description("SLA target ID")
                            .required()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new(
                            "link_cost_factor",
                            AttributeType::List(Box::new(AttributeType::String)),
                        )
                        .description("Factors evaluated (latency, jitter, packet-loss)")
                        .optional()
                        .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("latency_threshold", AttributeType::Number)
                            .description("Latency threshold in milliseconds")
                            .optional()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("jitter_threshold", AttributeType::Number)
                            .description("Jitter threshold in milliseconds")
                            .optional()
                            .build(),
                    )
                    .attribute(
                        AttributeBuilder::new("packetloss_threshold", AttributeType::Number)
                            .description("Packet loss threshold in percent")
                            .optional()
                            .build(),
                    )
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

    fn expand_check(value: &DynamicValue) -> HealthCheck {
        HealthCheck {
            name: value.get_string(&AttributePath::new("name")).ok(),
            server: expand_string_list(value, &AttributePath::new("server")),
            protocol: value.get_string(&AttributePath::new("protocol")).ok(),
            port: value
                .get_number(&AttributePath::new("port"))
                .ok()
                .map(|n| n as u32),
            interval: value
                .get_number(&AttributePath::new("interval"))
                .ok()
                .map(|n| n as u32),
            failtime: value
                .get_number(&AttributePath::new("failtime"))
                .ok()
                .map(|n| n as u32),
            recoverytime: value
                .get_number(&AttributePath::new("recoverytime"))
                .ok()
                .map(|n| n as u32),
            members: expand_string_list(value, &AttributePath::new("members")),
            sla: Self::expand_sla(value),
        }
    }

    fn expand_sla(value: &DynamicValue) -> Option<Vec<SlaTarget>> {
        let entries = value.get_list(&AttributePath::new("sla")).ok()?;
        let mut targets = Vec::with_capacity(entries.len());

        for entry in entries {
            let fields = match entry {
                Dynamic::Map(fields) => fields,
                _ => continue,
            };
            targets.push(SlaTarget {
                id: match fields.get("id") {
                    Some(Dynamic::Number(id)) => Some(*id as u32),
                    _ => None,
                },
                link_cost_factor: match fields.get("link_cost_factor") {
                    Some(Dynamic::List(items)) => Some(
                        items
                            .iter()
                            .filter_map(|item| match item {
                                Dynamic::String(s) => Some(s.clone()),
                                _ => None,
                            })
                            .collect(),
                    ),
                    _ => None,
                },
                latency_threshold: match fields.get("latency_threshold") {
                    Some(Dynamic::Number(n)) => Some(*n as u32),
                    _ => None,
                },
                jitter_threshold: match fields.get("jitter_threshold") {
                    Some(Dynamic::Number(n)) => Some(*n as u32),
                    _ => None,
                },
                packetloss_threshold: match fields.get("packetloss_threshold") {
                    Some(Dynamic::Number(n)) => Some(*n as u32),
                    _ => None,
                },
            });
        }

        Some(targets)
    }

    fn flatten_check(state: &mut DynamicValue, check: &HealthCheck) {
        if let Some(server) = &check.server {
            let _ = state.set(&AttributePath::new("server"), flatten_string_list(server));
        }
        if let Some(protocol) = &check.protocol {
            let _ = state.set_string(&AttributePath::new("protocol"), protocol.clone());
        }
        if let Some(port) = check.port {
            let _ = state.set_number(&AttributePath::new("port"), port as f64);
        }
        if let Some(interval) = check.interval {
            let _ = state.set_number(&AttributePath::new("interval"), interval as f64);
        }
        if let Some(failtime) = check.failtime {
            let _ = state.set_number(&AttributePath::new("failtime"), failtime as f64);
        }
        if let Some(recoverytime) = check.recoverytime {
            let _ = state.set_number(&AttributePath::new("recoverytime"), recoverytime as f64);
        }
        if let Some(members) = &check.members {
            let _ = state.set(&AttributePath::new("members"), flatten_string_list(members));
        }
        if let Some(sla) = &check.sla {
            let _ = state.set(&AttributePath::new("sla"), Self::flatten_sla(sla));
        }
    }

    fn flatten_sla(targets: &[SlaTarget]) -> Dynamic {
        Dynamic::List(
            targets
                .iter()
                .map(|target| {
                    let mut fields = HashMap::new();
                    if let Some(id) = target.id {
                        fields.insert("id".to_string(), Dynamic::Number(id as f64));
                    }
                    if let Some(factors) = &target.link_cost_factor {
                        fields.insert(
                            "link_cost_factor".to_string(),
                            flatten_string_list(factors),
                        );
                    }
                    if let Some(latency) = target.latency_threshold {
                        fields.insert(
                            "latency_threshold".to_string(),
                            Dynamic::Number(latency as f64),
                        );
                    }
                    if let Some(jitter) = target.jitter_threshold {
                        fields.insert(
                            "jitter_threshold".to_string(),
                            Dynamic::Number(jitter as f64),
                        );
                    }
                    if let Some(packetloss) = target.packetloss_threshold {
                        fields.insert(
                            "packetloss_threshold".to_string(),
                            Dynamic::Number(packetloss as f64),
                        );
                    }
                    Dynamic::Map(fields)
                })
                .collect(),
        )
    }
}

#[async_trait]
impl Resource for SdwanHealthCheckResource {
    fn type_name(&self) -> &str {
        "fortimanager_sdwan_health_check"
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

        if let Ok(protocol) = request.config.get_string(&AttributePath::new("protocol")) {
            if !PROTOCOLS.contains(&protocol.as_str()) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid protocol",
                        format!("Protocol must be one of {}", PROTOCOLS.join(", ")),
                    )
                    .with_attribute(AttributePath::new("protocol")),
                );
            }
        }

        if let Ok(port) = request.config.get_number(&AttributePath::new("port")) {
            if !(1.0..=65535.0).contains(&port) {
                diagnostics.push(
                    Diagnostic::error("Invalid port", "Port must be between 1 and 65535")
                        .with_attribute(AttributePath::new("port")),
                );
            }
        }

        // SLA entries must carry unique IDs; the device rejects duplicates
        // with an opaque error.
        if let Some(targets) = Self::expand_sla(&request.config) {
            let mut seen = std::collections::HashSet::new();
            for target in &targets {
                if let Some(id) = target.id {
                    if !seen.insert(id) {
                        diagnostics.push(
                            Diagnostic::error(
                                "Duplicate SLA target ID",
                                format!("SLA target ID {} is used more than once", id),
                            )
                            .with_attribute(AttributePath::new("sla")),
                        );
                    }
                }
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

        let check = Self::expand_check(&request.config);
        match provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .sdwan()
            .create_health_check(&check)
            .await
        {
            Ok(()) => CreateResourceResponse {
                new_state: request.planned_state,
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create health check",
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
            .sdwan()
            .get_health_check(&name)
            .await
        {
            Ok(check) => {
                let mut new_state = request.current_state.clone();
                Self::flatten_check(&mut new_state, &check);
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
                    "Failed to read health check",
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

        let check = Self::expand_check(&request.config);
        match provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .sdwan()
            .set_health_check(&name, &check)
            .await
        {
            Ok(()) => UpdateResourceResponse {
                new_state: request.planned_state,
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to update health check",
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
            .sdwan()
            .delete_health_check(&name)
            .await
        {
            Ok(()) => DeleteResourceResponse { diagnostics },
            Err(e) if e.is_not_found() => DeleteResourceResponse { diagnostics },
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to delete health check",
                    e.to_string(),
                ));
                DeleteResourceResponse { diagnostics }
            }
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for SdwanHealthCheckResource {
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
    use mockito::{Matcher, Server};
    use serde_json::json;
    use std::sync::Arc;

    const CHECK_URL: &str = "/pm/config/device/fw01/vdom/root/system/sdwan/health-check";

    async fn test_resource(server: &Server) -> SdwanHealthCheckResource {
        SdwanHealthCheckResource {
            provider_data: Some(FortimanagerProviderData {
                client: Arc::new(connect(server).await),
                adom: "root".to_string(),
            }),
        }
    }

    fn test_config() -> DynamicValue {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("device_name"), "fw01".to_string());
        let _ = config.set_string(&AttributePath::new("name"), "dc-probe".to_string());
        let _ = config.set_list(
            &AttributePath::new("server"),
            vec![Dynamic::String("10.1.1.1".to_string())],
        );
        let _ = config.set_string(&AttributePath::new("protocol"), "ping".to_string());
        let _ = config.set_list(
            &AttributePath::new("sla"),
            vec![Dynamic::Map(HashMap::from([
                ("id".to_string(), Dynamic::Number(1.0)),
                (
                    "link_cost_factor".to_string(),
                    Dynamic::List(vec![Dynamic::String("latency".to_string())]),
                ),
                ("latency_threshold".to_string(), Dynamic::Number(250.0)),
            ]))],
        );
        config
    }

    #[test]
    fn schema_declares_sla_nested_block() {
        let schema = SdwanHealthCheckResource::resource_schema();

        let sla = schema.block_type("sla").unwrap();
        assert_eq!(sla.block.attributes.len(), 5);
        assert!(sla
            .block
            .attributes
            .iter()
            .any(|attr| attr.name == "latency_threshold"));
    }

    #[tokio::test]
    async fn validate_rejects_duplicate_sla_ids() {
        let resource = SdwanHealthCheckResource::new();
        let mut config = test_config();
        let _ = config.set_list(
            &AttributePath::new("sla"),
            vec![
                Dynamic::Map(HashMap::from([(
                    "id".to_string(),
                    Dynamic::Number(1.0),
                )])),
                Dynamic::Map(HashMap::from([(
                    "id".to_string(),
                    Dynamic::Number(1.0),
                )])),
            ],
        );

        let response = resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: "fortimanager_sdwan_health_check".to_string(),
                    config,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0]
            .summary
            .contains("Duplicate SLA target ID"));
    }

    #[tokio::test]
    async fn create_sends_sla_targets_with_wire_names() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let add = server
            .mock("POST", "/jsonrpc")
            .match_body(Matcher::PartialJson(json!({
                "method": "add",
                "params": [{
                    "url": CHECK_URL,
                    "data": {
                        "name": "dc-probe",
                        "protocol": "ping",
                        "sla": [{
                            "id": 1,
                            "link-cost-factor": ["latency"],
                            "latency-threshold": 250
                        }]
                    }
                }]
            })))
            .with_body(
                json!({
                    "id": 2,
                    "result": [{"status": {"code": 0, "message": "OK"}, "url": CHECK_URL}]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let resource = test_resource(&server).await;
        let config = test_config();

        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "fortimanager_sdwan_health_check".to_string(),
                    config: config.clone(),
                    planned_state: config,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        add.assert_async().await;
    }

    #[tokio::test]
    async fn read_flattens_sla_targets() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _get = mock_rpc(
            &mut server,
            "get",
            &format!("{}/dc-probe", CHECK_URL),
            json!({
                "name": "dc-probe",
                "server": "10.1.1.1",
                "protocol": "ping",
                "interval": 500,
                "sla": [{
                    "id": 1,
                    "link-cost-factor": "latency",
                    "latency-threshold": 250,
                    "jitter-threshold": 50
                }]
            }),
        )
        .await;

        let resource = test_resource(&server).await;
        let mut state = DynamicValue::empty_object();
        let _ = state.set_string(&AttributePath::new("device_name"), "fw01".to_string());
        let _ = state.set_string(&AttributePath::new("name"), "dc-probe".to_string());

        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "fortimanager_sdwan_health_check".to_string(),
                    current_state: state,
                    private: vec![],
                },
            )
            .await;

        let new_state = response.new_state.unwrap();
        let sla = new_state.get_list(&AttributePath::new("sla")).unwrap();
        assert_eq!(sla.len(), 1);
        assert_eq!(
            new_state
                .get_number(&AttributePath::new("sla").index(0).attribute("id"))
                .unwrap(),
            1.0
        );
        assert_eq!(
            new_state
                .get_list(
                    &AttributePath::new("sla")
                        .index(0)
                        .attribute("link_cost_factor")
                )
                .unwrap(),
            vec![Dynamic::String("latency".to_string())]
        );
        assert_eq!(
            new_state
                .get_number(
                    &AttributePath::new("sla")
                        .index(0)
                        .attribute("jitter_threshold")
                )
                .unwrap(),
            50.0
        );
    }
}
