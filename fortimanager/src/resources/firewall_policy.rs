//! Firewall policy resource

use async_trait::async_trait;
use tfplug::context::Context;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ImportedResource,
    ReadResourceRequest, ReadResourceResponse, Resource, ResourceSchemaRequest,
    ResourceSchemaResponse, ResourceWithConfigure, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{AttributeBuilder, AttributeType, Schema, SchemaBuilder};
use tfplug::types::{AttributePath, Diagnostic, DynamicValue};

use crate::api::firewall::FirewallPolicy;
use crate::resources::util::{expand_string_list, flatten_string_list};

const ACTIONS: &[&str] = &["accept", "deny", "ipsec"];
const LOGTRAFFIC_MODES: &[&str] = &["disable", "all", "utm"];

#[derive(Default)]
pub struct FirewallPolicyResource {
    provider_data: Option<crate::FortimanagerProviderData>,
}

impl FirewallPolicyResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a firewall policy on a FortiManager-managed device")
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
                AttributeBuilder::new("policyid", AttributeType::Number)
                    .description("Policy ID assigned by FortiManager")
                    .computed()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Policy name")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "srcintf",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Incoming interfaces")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "dstintf",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Outgoing interfaces")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "srcaddr",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Source address objects")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "dstaddr",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Destination address objects")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "service",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Service objects")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("action", AttributeType::String)
                    .description("Policy action (accept, deny or ipsec)")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("schedule", AttributeType::String)
                    .description("Schedule object, e.g. 'always'")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::Bool)
                    .description("Enable or disable the policy")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("nat", AttributeType::Bool)
                    .description("Enable source NAT")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("logtraffic", AttributeType::String)
                    .description("Log matched traffic (disable, all or utm)")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("comments", AttributeType::String)
                    .description("Comments")
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

    fn expand_policy(value: &DynamicValue) -> FirewallPolicy {
        FirewallPolicy {
            policyid: None,
            name: value.get_string(&AttributePath::new("name")).ok(),
            srcintf: expand_string_list(value, &AttributePath::new("srcintf")),
            dstintf: expand_string_list(value, &AttributePath::new("dstintf")),
            srcaddr: expand_string_list(value, &AttributePath::new("srcaddr")),
            dstaddr: expand_string_list(value, &AttributePath::new("dstaddr")),
            service: expand_string_list(value, &AttributePath::new("service")),
            action: value.get_string(&AttributePath::new("action")).ok(),
            schedule: value.get_string(&AttributePath::new("schedule")).ok(),
            status: value
                .get_bool(&AttributePath::new("status"))
                .ok()
                .map(Into::into),
            nat: value
                .get_bool(&AttributePath::new("nat"))
                .ok()
                .map(Into::into),
            logtraffic: value.get_string(&AttributePath::new("logtraffic")).ok(),
            comments: value.get_string(&AttributePath::new("comments")).ok(),
        }
    }

    fn flatten_policy(state: &mut DynamicValue, policy: &FirewallPolicy) {
        if let Some(policyid) = policy.policyid {
            let _ = state.set_number(&AttributePath::new("policyid"), policyid as f64);
        }
        if let Some(name) = &policy.name {
            let _ = state.set_string(&AttributePath::new("name"), name.clone());
        }
        if let Some(srcintf) = &policy.srcintf {
            let _ = state.set(&AttributePath::new("srcintf"), flatten_string_list(srcintf));
        }
        if let Some(dstintf) = &policy.dstintf {
            let _ = state.set(&AttributePath::new("dstintf"), flatten_string_list(dstintf));
        }
        if let Some(srcaddr) = &policy.srcaddr {
            let _ = state.set(&AttributePath::new("srcaddr"), flatten_string_list(srcaddr));
        }
        if let Some(dstaddr) = &policy.dstaddr {
            let _ = state.set(&AttributePath::new("dstaddr"), flatten_string_list(dstaddr));
        }
        if let Some(service) = &policy.service {
            let _ = state.set(&AttributePath::new("service"), flatten_string_list(service));
        }
        if let Some(action) = &policy.action {
            let _ = state.set_string(&AttributePath::new("action"), action.clone());
        }
        if let Some(schedule) = &policy.schedule {
            let _ = state.set_string(&AttributePath::new("schedule"), schedule.clone());
        }
        if let Some(status) = policy.status {
            let _ = state.set_bool(&AttributePath::new("status"), status.as_bool());
        }
        if let Some(nat) = policy.nat {
            let _ = state.set_bool(&AttributePath::new("nat"), nat.as_bool());
        }
        if let Some(logtraffic) = &policy.logtraffic {
            let _ = state.set_string(&AttributePath::new("logtraffic"), logtraffic.clone());
        }
        if let Some(comments) = &policy.comments {
            let _ = state.set_string(&AttributePath::new("comments"), comments.clone());
        }
    }
}

#[async_trait]
impl Resource for FirewallPolicyResource {
    fn type_name(&self) -> &str {
        "fortimanager_firewall_policy"
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

        if let Ok(action) = request.config.get_string(&AttributePath::new("action")) {
            if !ACTIONS.contains(&action.as_str()) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid action",
                        format!("Action must be one of {}", ACTIONS.join(", ")),
                    )
                    .with_attribute(AttributePath::new("action")),
                );
            }
        }

        if let Ok(logtraffic) = request.config.get_string(&AttributePath::new("logtraffic")) {
            if !LOGTRAFFIC_MODES.contains(&logtraffic.as_str()) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid logtraffic mode",
                        format!("logtraffic must be one of {}", LOGTRAFFIC_MODES.join(", ")),
                    )
                    .with_attribute(AttributePath::new("logtraffic")),
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

        let policy = Self::expand_policy(&request.config);
        let result = provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .firewall()
            .create_policy(&policy)
            .await;

        match result {
            Ok(policyid) => {
                let mut new_state = request.planned_state;
                let _ = new_state.set_number(&AttributePath::new("policyid"), policyid as f64);
                CreateResourceResponse {
                    new_state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create firewall policy",
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
        let policyid = match request
            .current_state
            .get_number(&AttributePath::new("policyid"))
        {
            Ok(policyid) => policyid as u32,
            Err(_) => {
                return ReadResourceResponse {
                    new_state: None,
                    private: request.private,
                    diagnostics,
                };
            }
        };

        let result = provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .firewall()
            .get_policy(policyid)
            .await;

        match result {
            Ok(policy) => {
                let mut new_state = request.current_state.clone();
                Self::flatten_policy(&mut new_state, &policy);
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
                    "Failed to read firewall policy",
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
        let policyid = match request
            .prior_state
            .get_number(&AttributePath::new("policyid"))
        {
            Ok(policyid) => policyid as u32,
            Err(_) => {
                diagnostics.push(Diagnostic::error(
                    "Missing policyid",
                    "Prior state has no policyid to update",
                ));
                return UpdateResourceResponse {
                    new_state: request.prior_state,
                    private: vec![],
                    diagnostics,
                };
            }
        };

        let policy = Self::expand_policy(&request.config);
        let result = provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .firewall()
            .set_policy(policyid, &policy)
            .await;

        match result {
            Ok(()) => {
                let mut new_state = request.planned_state;
                let _ = new_state.set_number(&AttributePath::new("policyid"), policyid as f64);
                UpdateResourceResponse {
                    new_state,
                    private: vec![],
                    diagnostics,
                }
            }
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to update firewall policy",
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
        let policyid = match request
            .prior_state
            .get_number(&AttributePath::new("policyid"))
        {
            Ok(policyid) => policyid as u32,
            Err(_) => {
                return DeleteResourceResponse { diagnostics };
            }
        };

        let result = provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .firewall()
            .delete_policy(policyid)
            .await;

        match result {
            Ok(()) => DeleteResourceResponse { diagnostics },
            // Already gone; deletion is idempotent.
            Err(e) if e.is_not_found() => DeleteResourceResponse { diagnostics },
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to delete firewall policy",
                    e.to_string(),
                ));
                DeleteResourceResponse { diagnostics }
            }
        }
    }

    async fn import_state(
        &self,
        _ctx: Context,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        let mut diagnostics = vec![];

        // Import ID format: device/vdom/policyid
        let parts: Vec<&str> = request.id.split('/').collect();
        let (device, vdom, policyid) = match parts.as_slice() {
            [device, vdom, policyid] => match policyid.parse::<u32>() {
                Ok(policyid) => (device.to_string(), vdom.to_string(), policyid),
                Err(_) => {
                    diagnostics.push(Diagnostic::error(
                        "Invalid import ID",
                        "policyid must be a number",
                    ));
                    return ImportResourceStateResponse {
                        imported_resources: vec![],
                        diagnostics,
                    };
                }
            },
            _ => {
                diagnostics.push(Diagnostic::error(
                    "Invalid import ID",
                    "Import ID must be in the format 'device/vdom/policyid'",
                ));
                return ImportResourceStateResponse {
                    imported_resources: vec![],
                    diagnostics,
                };
            }
        };

        let provider_data = match &self.provider_data {
            Some(data) => data,
            None => {
                diagnostics.push(Diagnostic::error(
                    "Provider not configured",
                    "Unable to import without provider configuration",
                ));
                return ImportResourceStateResponse {
                    imported_resources: vec![],
                    diagnostics,
                };
            }
        };

        let policy = match provider_data
            .client
            .device(&device)
            .vdom(&vdom)
            .firewall()
            .get_policy(policyid)
            .await
        {
            Ok(policy) => policy,
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to fetch firewall policy",
                    format!("Error fetching policy {}: {}", policyid, e),
                ));
                return ImportResourceStateResponse {
                    imported_resources: vec![],
                    diagnostics,
                };
            }
        };

        let mut state = DynamicValue::empty_object();
        let _ = state.set_string(&AttributePath::new("device_name"), device);
        let _ = state.set_string(&AttributePath::new("vdom"), vdom);
        let _ = state.set_number(&AttributePath::new("policyid"), policyid as f64);
        Self::flatten_policy(&mut state, &policy);

        ImportResourceStateResponse {
            imported_resources: vec![ImportedResource {
                type_name: self.type_name().to_string(),
                state,
                private: vec![],
            }],
            diagnostics,
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for FirewallPolicyResource {
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

    const POLICY_URL: &str = "/pm/config/device/fw01/vdom/root/firewall/policy";

    async fn test_resource(server: &Server) -> FirewallPolicyResource {
        FirewallPolicyResource {
            provider_data: Some(FortimanagerProviderData {
                client: Arc::new(connect(server).await),
                adom: "root".to_string(),
            }),
        }
    }

    fn test_config() -> DynamicValue {
        let mut config = DynamicValue::empty_object();
        let _ = config.set_string(&AttributePath::new("device_name"), "fw01".to_string());
        let _ = config.set_string(&AttributePath::new("name"), "allow-web".to_string());
        let _ = config.set_list(
            &AttributePath::new("srcaddr"),
            vec![Dynamic::String("all".to_string())],
        );
        let _ = config.set_list(
            &AttributePath::new("dstaddr"),
            vec![Dynamic::String("web-servers".to_string())],
        );
        let _ = config.set_string(&AttributePath::new("action"), "accept".to_string());
        let _ = config.set_bool(&AttributePath::new("nat"), true);
        config
    }

    #[test]
    fn schema_declares_scope_and_key_attributes() {
        let schema = FirewallPolicyResource::resource_schema();

        let device = schema.attribute("device_name").unwrap();
        assert!(device.required);
        assert!(device.force_new);

        let vdom = schema.attribute("vdom").unwrap();
        assert!(vdom.optional);
        assert!(vdom.force_new);

        let policyid = schema.attribute("policyid").unwrap();
        assert!(policyid.computed);
        assert!(!policyid.required);

        assert!(schema.attribute("srcaddr").is_some());
        assert!(schema.attribute("action").is_some());
    }

    #[tokio::test]
    async fn validate_rejects_unknown_action() {
        let resource = FirewallPolicyResource::new();
        let mut config = test_config();
        let _ = config.set_string(&AttributePath::new("action"), "drop".to_string());

        let response = resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: "fortimanager_firewall_policy".to_string(),
                    config,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0].summary.contains("Invalid action"));
    }

    #[tokio::test]
    async fn create_stores_assigned_policyid() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let add = mock_rpc(&mut server, "add", POLICY_URL, json!({"policyid": 7})).await;

        let resource = test_resource(&server).await;
        let config = test_config();

        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "fortimanager_firewall_policy".to_string(),
                    config: config.clone(),
                    planned_state: config,
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert_eq!(
            response
                .new_state
                .get_number(&AttributePath::new("policyid"))
                .unwrap(),
            7.0
        );
        add.assert_async().await;
    }

    #[tokio::test]
    async fn create_reports_api_failure() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _add = mock_rpc_error(&mut server, "add", POLICY_URL, -2, "Object already exists").await;

        let resource = test_resource(&server).await;
        let config = test_config();

        let response = resource
            .create(
                Context::new(),
                CreateResourceRequest {
                    type_name: "fortimanager_firewall_policy".to_string(),
                    config: config.clone(),
                    planned_state: config,
                },
            )
            .await;

        assert_eq!(response.diagnostics.len(), 1);
        assert!(response.diagnostics[0]
            .summary
            .contains("Failed to create firewall policy"));
    }

    #[tokio::test]
    async fn read_flattens_remote_fields() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _get = mock_rpc(
            &mut server,
            "get",
            &format!("{}/7", POLICY_URL),
            json!({
                "policyid": 7,
                "name": "allow-web",
                "srcaddr": "all",
                "dstaddr": ["web-servers"],
                "action": "accept",
                "status": "enable",
                "nat": 1
            }),
        )
        .await;

        let resource = test_resource(&server).await;
        let mut state = DynamicValue::empty_object();
        let _ = state.set_string(&AttributePath::new("device_name"), "fw01".to_string());
        let _ = state.set_number(&AttributePath::new("policyid"), 7.0);

        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "fortimanager_firewall_policy".to_string(),
                    current_state: state,
                    private: vec![],
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        let new_state = response.new_state.unwrap();
        assert_eq!(
            new_state.get_string(&AttributePath::new("name")).unwrap(),
            "allow-web"
        );
        // A bare "all" on the wire flattens into a one-element list.
        assert_eq!(
            new_state.get_list(&AttributePath::new("srcaddr")).unwrap(),
            vec![Dynamic::String("all".to_string())]
        );
        assert!(new_state.get_bool(&AttributePath::new("status")).unwrap());
        assert!(new_state.get_bool(&AttributePath::new("nat")).unwrap());
    }

    #[tokio::test]
    async fn read_clears_state_when_policy_is_gone() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _get = mock_rpc_error(
            &mut server,
            "get",
            &format!("{}/7", POLICY_URL),
            -3,
            "Object does not exist",
        )
        .await;

        let resource = test_resource(&server).await;
        let mut state = DynamicValue::empty_object();
        let _ = state.set_string(&AttributePath::new("device_name"), "fw01".to_string());
        let _ = state.set_number(&AttributePath::new("policyid"), 7.0);

        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: "fortimanager_firewall_policy".to_string(),
                    current_state: state,
                    private: vec![],
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert!(response.new_state.is_none());
    }

    #[tokio::test]
    async fn update_replaces_policy_and_keeps_id() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let set = mock_rpc(&mut server, "set", &format!("{}/7", POLICY_URL), json!(null)).await;

        let resource = test_resource(&server).await;
        let mut prior = test_config();
        let _ = prior.set_number(&AttributePath::new("policyid"), 7.0);
        let mut config = test_config();
        let _ = config.set_string(&AttributePath::new("action"), "deny".to_string());

        let response = resource
            .update(
                Context::new(),
                UpdateResourceRequest {
                    type_name: "fortimanager_firewall_policy".to_string(),
                    config: config.clone(),
                    planned_state: config,
                    prior_state: prior,
                    planned_private: vec![],
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        assert_eq!(
            response
                .new_state
                .get_number(&AttributePath::new("policyid"))
                .unwrap(),
            7.0
        );
        assert_eq!(
            response
                .new_state
                .get_string(&AttributePath::new("action"))
                .unwrap(),
            "deny"
        );
        set.assert_async().await;
    }

    #[tokio::test]
    async fn delete_tolerates_missing_policy() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _delete = mock_rpc_error(
            &mut server,
            "delete",
            &format!("{}/7", POLICY_URL),
            -3,
            "Object does not exist",
        )
        .await;

        let resource = test_resource(&server).await;
        let mut prior = test_config();
        let _ = prior.set_number(&AttributePath::new("policyid"), 7.0);

        let response = resource
            .delete(
                Context::new(),
                DeleteResourceRequest {
                    type_name: "fortimanager_firewall_policy".to_string(),
                    prior_state: prior,
                    planned_private: vec![],
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn import_requires_three_part_id() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;

        let resource = test_resource(&server).await;
        let response = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "fortimanager_firewall_policy".to_string(),
                    id: "fw01/7".to_string(),
                },
            )
            .await;

        assert!(response.imported_resources.is_empty());
        assert!(response.diagnostics[0].summary.contains("Invalid import ID"));
    }

    #[tokio::test]
    async fn import_builds_full_state() {
        let mut server = Server::new_async().await;
        let _login = mock_login(&mut server).await;
        let _get = mock_rpc(
            &mut server,
            "get",
            &format!("{}/7", POLICY_URL),
            json!({"policyid": 7, "name": "allow-web", "action": "accept"}),
        )
        .await;

        let resource = test_resource(&server).await;
        let response = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: "fortimanager_firewall_policy".to_string(),
                    id: "fw01/root/7".to_string(),
                },
            )
            .await;

        assert!(response.diagnostics.is_empty());
        let state = &response.imported_resources[0].state;
        assert_eq!(
            state.get_string(&AttributePath::new("device_name")).unwrap(),
            "fw01"
        );
        assert_eq!(
            state.get_number(&AttributePath::new("policyid")).unwrap(),
            7.0
        );
        assert_eq!(
            state.get_string(&AttributePath::new("name")).unwrap(),
            "allow-web"
        );
    }
}
