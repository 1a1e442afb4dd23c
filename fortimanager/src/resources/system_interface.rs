//! System interface resource, device-global scope

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

use crate::api::system::SystemInterface;
use crate::resources::util::{expand_string_list, flatten_string_list};

const INTERFACE_TYPES: &[&str] = &["vlan", "loopback", "tunnel", "aggregate"];

#[derive(Default)]
pub struct SystemInterfaceResource {
    provider_data: Option<crate::FortimanagerProviderData>,
}

impl SystemInterfaceResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resource_schema() -> Schema {
        SchemaBuilder::new()
            .version(0)
            .description("Manages a network interface on a FortiManager-managed device")
            .attribute(
                AttributeBuilder::new("device_name", AttributeType::String)
                    .description("Name of the managed device")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Interface name")
                    .required()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vdom", AttributeType::String)
                    .description("VDOM the interface belongs to")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("ip", AttributeType::String)
                    .description("Interface address, e.g. '192.168.1.1 255.255.255.0'")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new(
                    "allowaccess",
                    AttributeType::List(Box::new(AttributeType::String)),
                )
                .description("Management protocols allowed on the interface")
                .optional()
                .build(),
            )
            .attribute(
                AttributeBuilder::new("status", AttributeType::Bool)
                    .description("Bring the interface up or down")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("mtu", AttributeType::Number)
                    .description("MTU (68 - 9216)")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("type", AttributeType::String)
                    .description("Interface type for created interfaces (e.g. 'vlan')")
                    .optional()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("vlanid", AttributeType::Number)
                    .description("VLAN ID (1 - 4094)")
                    .optional()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("interface", AttributeType::String)
                    .description("Parent interface for VLAN interfaces")
                    .optional()
                    .force_new()
                    .build(),
            )
            .attribute(
                AttributeBuilder::new("description", AttributeType::String)
                    .description("Description")
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
        let name = value.get_string(&AttributePath::new("name")).map_err(|_| {
            Diagnostic::error("Missing name", "The 'name' attribute is required")
        })?;
        Ok((device, name))
    }

    fn expand_interface(value: &DynamicValue) -> SystemInterface {
        SystemInterface {
            name: value.get_string(&AttributePath::new("name")).ok(),
            vdom: value.get_string(&AttributePath::new("vdom")).ok(),
            ip: value.get_string(&AttributePath::new("ip")).ok(),
            allowaccess: expand_string_list(value, &AttributePath::new("allowaccess")),
            status: value
                .get_bool(&AttributePath::new("status"))
                .ok()
                .map(Into::into),
            mtu: value
                .get_number(&AttributePath::new("mtu"))
                .ok()
                .map(|n| n as u32),
            interface_type: value.get_string(&AttributePath::new("type")).ok(),
            vlanid: value
                .get_number(&AttributePath::new("vlanid"))
                .ok()
                .map(|n| n as u32),
            interface: value.get_string(&AttributePath::new("interface")).ok(),
            description: value.get_string(&AttributePath::new("description")).ok(),
        }
    }

    fn flatten_interface(state: &mut DynamicValue, interface: &SystemInterface) {
        if let Some(vdom) = &interface.vdom {
            let _ = state.set_string(&AttributePath::new("vdom"), vdom.clone());
        }
        if let Some(ip) = &interface.ip {
            let _ = state.set_string(&AttributePath::new("ip"), ip.clone());
        }
        if let Some(allowaccess) = &interface.allowaccess {
            let _ = state.set(
                &AttributePath::new("allowaccess"),
                flatten_string_list(allowaccess),
            );
        }
        if let Some(status) = interface.status {
            let _ = state.set_bool(&AttributePath::new("status"), status.as_bool());
        }
        if let Some(mtu) = interface.mtu {
            let _ = state.set_number(&AttributePath::new("mtu"), mtu as f64);
        }
        if let Some(interface_type) = &interface.interface_type {
            let _ = state.set_string(&AttributePath::new("type"), interface_type.clone());
        }
        if let Some(vlanid) = interface.vlanid {
            let _ = state.set_number(&AttributePath::new("vlanid"), vlanid as f64);
        }
        if let Some(parent) = &interface.interface {
            let _ = state.set_string(&AttributePath::new("interface"), parent.clone());
        }
        if let Some(description) = &interface.description {
            let _ = state.set_string(&AttributePath::new("description"), description.clone());
        }
    }
}

#[async_trait]
impl Resource for SystemInterfaceResource {
    fn type_name(&self) -> &str {
        "fortimanager_system_interface"
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

        if let Ok(mtu) = request.config.get_number(&AttributePath::new("mtu")) {
            if !(68.0..=9216.0).contains(&mtu) {
                diagnostics.push(
                    Diagnostic::error("Invalid MTU", "MTU must be between 68 and 9216")
                        .with_attribute(AttributePath::new("mtu")),
                );
            }
        }

        if let Ok(vlanid) = request.config.get_number(&AttributePath::new("vlanid")) {
            if !(1.0..=4094.0).contains(&vlanid) {
                diagnostics.push(
                    Diagnostic::error("Invalid VLAN ID", "VLAN ID must be between 1 and 4094")
                        .with_attribute(AttributePath::new("vlanid")),
                );
            }
        }

        if let Ok(interface_type) = request.config.get_string(&AttributePath::new("type")) {
            if !INTERFACE_TYPES.contains(&interface_type.as_str()) {
                diagnostics.push(
                    Diagnostic::error(
                        "Invalid interface type",
                        format!("Type must be one of {}", INTERFACE_TYPES.join(", ")),
                    )
                    .with_attribute(AttributePath::new("type")),
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

        let (device, _name) = match Self::scope(&request.config) {
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

        let interface = Self::expand_interface(&request.config);
        match provider_data
            .client
            .device(&device)
            .global()
            .system()
            .create_interface(&interface)
            .await
        {
            Ok(()) => CreateResourceResponse {
                new_state: request.planned_state,
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to create interface",
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

        let (device, name) = match Self::scope(&request.current_state) {
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
            .global()
            .system()
            .get_interface(&name)
            .await
        {
            Ok(interface) => {
                let mut new_state = request.current_state.clone();
                Self::flatten_interface(&mut new_state, &interface);
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
                    "Failed to read interface",
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

        let (device, name) = match Self::scope(&request.config) {
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

        // Physical interfaces always exist; merge only the managed fields
        // instead of replacing the whole object.
        let interface = Self::expand_interface(&request.config);
        match provider_data
            .client
            .device(&device)
            .global()
            .system()
            .update_interface(&name, &interface)
            .await
        {
            Ok(()) => UpdateResourceResponse {
                new_state: request.planned_state,
                private: vec![],
                diagnostics,
            },
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to update interface",
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

        let (device, name) = match Self::scope(&request.prior_state) {
            Ok(scope) => scope,
            Err(_) => {
                return DeleteResourceResponse { diagnostics };
            }
        };

        match provider_data
            .client
            .device(&device)
            .global()
            .system()
            .delete_interface(&name)
            .await
        {
            Ok(()) => DeleteResourceResponse { diagnostics },
            Err(e) if e.is_not_found() => DeleteResourceResponse { diagnostics },
            Err(e) => {
                diagnostics.push(Diagnostic::error(
                    "Failed to delete interface",
                    e.to_string(),
                ));
                DeleteResourceResponse { diagnostics }
            }
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for SystemInterfaceResource {
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
