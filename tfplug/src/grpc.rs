//! gRPC service implementation of the Terraform Plugin Protocol v6
//!
//! Bridges the generated protobuf service onto the framework's `Provider`
//! trait. Resources and data sources are created per-request through the
//! provider's factories and configured with the provider data captured
//! during `ConfigureProvider`.

use crate::context::Context;
use crate::data_source::{
    ConfigureDataSourceRequest, DataSourceWithConfigure, ReadDataSourceRequest,
    ValidateDataSourceConfigRequest,
};
use crate::provider::{ConfigureProviderRequest, Provider, ProviderSchemaRequest};
use crate::proto;
use crate::resource::{
    ConfigureResourceRequest, CreateResourceRequest, DeleteResourceRequest,
    ImportResourceStateRequest, ReadResourceRequest, ResourceWithConfigure,
    UpdateResourceRequest, ValidateResourceConfigRequest,
};
use crate::schema::{Attribute, AttributeType, Block, NestedBlock, NestingMode, Schema};
use crate::types::{
    has_errors, AttributePath, AttributePathStep, Diagnostic, DiagnosticSeverity, Dynamic,
    DynamicValue,
};
use std::any::Any;
use std::sync::Arc;
use tokio::sync::RwLock;
use tonic::{Request, Response, Status};

/// The gRPC handler. Wrap it in `proto::ProviderServer` to serve it; see
/// [`crate::server::serve`].
pub struct ProviderHandler<P: Provider> {
    provider: Arc<RwLock<P>>,
    provider_data: Arc<RwLock<Option<Arc<dyn Any + Send + Sync>>>>,
}

impl<P: Provider> ProviderHandler<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider: Arc::new(RwLock::new(provider)),
            provider_data: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a resource through the provider factory and hand it the
    /// provider data from ConfigureProvider (when present).
    async fn make_resource(
        &self,
        type_name: &str,
    ) -> std::result::Result<Box<dyn ResourceWithConfigure>, Status> {
        let provider = self.provider.read().await;
        let mut resource = provider
            .create_resource(type_name)
            .await
            .map_err(|e| Status::not_found(e.to_string()))?;

        if let Some(data) = self.provider_data.read().await.clone() {
            let response = resource
                .configure(
                    Context::new(),
                    ConfigureResourceRequest {
                        provider_data: Some(data),
                    },
                )
                .await;
            if has_errors(&response.diagnostics) {
                return Err(Status::internal(format!(
                    "failed to configure resource {}",
                    type_name
                )));
            }
        }

        Ok(resource)
    }

    async fn make_data_source(
        &self,
        type_name: &str,
    ) -> std::result::Result<Box<dyn DataSourceWithConfigure>, Status> {
        let provider = self.provider.read().await;
        let mut data_source = provider
            .create_data_source(type_name)
            .await
            .map_err(|e| Status::not_found(e.to_string()))?;

        if let Some(data) = self.provider_data.read().await.clone() {
            let response = data_source
                .configure(
                    Context::new(),
                    ConfigureDataSourceRequest {
                        provider_data: Some(data),
                    },
                )
                .await;
            if has_errors(&response.diagnostics) {
                return Err(Status::internal(format!(
                    "failed to configure data source {}",
                    type_name
                )));
            }
        }

        Ok(data_source)
    }

    async fn resource_schema(&self, type_name: &str) -> std::result::Result<Schema, Status> {
        let provider = self.provider.read().await;
        provider
            .resource_schemas()
            .await
            .remove(type_name)
            .ok_or_else(|| Status::not_found(format!("Unknown resource type: {}", type_name)))
    }
}

#[tonic::async_trait]
impl<P: Provider + 'static> proto::ProviderService for ProviderHandler<P> {
    async fn get_metadata(
        &self,
        _request: Request<proto::get_metadata::Request>,
    ) -> std::result::Result<Response<proto::get_metadata::Response>, Status> {
        let provider = self.provider.read().await;

        let resources = provider
            .resource_schemas()
            .await
            .into_keys()
            .map(|type_name| proto::get_metadata::ResourceMetadata { type_name })
            .collect();
        let data_sources = provider
            .data_source_schemas()
            .await
            .into_keys()
            .map(|type_name| proto::get_metadata::DataSourceMetadata { type_name })
            .collect();

        Ok(Response::new(proto::get_metadata::Response {
            server_capabilities: Some(server_capabilities()),
            diagnostics: vec![],
            data_sources,
            resources,
        }))
    }

    async fn get_provider_schema(
        &self,
        _request: Request<proto::get_provider_schema::Request>,
    ) -> std::result::Result<Response<proto::get_provider_schema::Response>, Status> {
        let provider = self.provider.read().await;

        let provider_schema = provider
            .schema(Context::new(), ProviderSchemaRequest)
            .await;

        let resource_schemas = provider
            .resource_schemas()
            .await
            .into_iter()
            .map(|(name, schema)| (name, schema_to_proto(&schema)))
            .collect();
        let data_source_schemas = provider
            .data_source_schemas()
            .await
            .into_iter()
            .map(|(name, schema)| (name, schema_to_proto(&schema)))
            .collect();

        Ok(Response::new(proto::get_provider_schema::Response {
            provider: Some(schema_to_proto(&provider_schema.schema)),
            resource_schemas,
            data_source_schemas,
            diagnostics: diagnostics_to_proto(provider_schema.diagnostics),
            provider_meta: None,
            server_capabilities: Some(server_capabilities()),
        }))
    }

    async fn validate_provider_config(
        &self,
        request: Request<proto::validate_provider_config::Request>,
    ) -> std::result::Result<Response<proto::validate_provider_config::Response>, Status> {
        let req = request.into_inner();
        // Decode to surface malformed payloads early; semantic validation
        // happens in ConfigureProvider where env fallbacks are applied.
        let _ = decode_dynamic(&req.config)?;

        Ok(Response::new(proto::validate_provider_config::Response {
            diagnostics: vec![],
        }))
    }

    async fn configure_provider(
        &self,
        request: Request<proto::configure_provider::Request>,
    ) -> std::result::Result<Response<proto::configure_provider::Response>, Status> {
        let req = request.into_inner();
        let config = decode_dynamic(&req.config)?;

        tracing::debug!(terraform_version = %req.terraform_version, "configuring provider");

        let mut provider = self.provider.write().await;
        let response = provider
            .configure(
                Context::new(),
                ConfigureProviderRequest {
                    terraform_version: req.terraform_version,
                    config,
                },
            )
            .await;

        *self.provider_data.write().await = response.provider_data;

        Ok(Response::new(proto::configure_provider::Response {
            diagnostics: diagnostics_to_proto(response.diagnostics),
        }))
    }

    async fn stop_provider(
        &self,
        _request: Request<proto::stop_provider::Request>,
    ) -> std::result::Result<Response<proto::stop_provider::Response>, Status> {
        Ok(Response::new(proto::stop_provider::Response {
            error: String::new(),
        }))
    }

    async fn validate_resource_config(
        &self,
        request: Request<proto::validate_resource_config::Request>,
    ) -> std::result::Result<Response<proto::validate_resource_config::Response>, Status> {
        let req = request.into_inner();
        let schema = self.resource_schema(&req.type_name).await?;
        let config = decode_dynamic(&req.config)?;

        let mut diagnostics = validate_against_schema(&config, &schema);

        let resource = self.make_resource(&req.type_name).await?;
        let response = resource
            .validate(
                Context::new(),
                ValidateResourceConfigRequest {
                    type_name: req.type_name,
                    config,
                },
            )
            .await;
        diagnostics.extend(response.diagnostics);

        Ok(Response::new(proto::validate_resource_config::Response {
            diagnostics: diagnostics_to_proto(diagnostics),
        }))
    }

    async fn validate_data_resource_config(
        &self,
        request: Request<proto::validate_data_resource_config::Request>,
    ) -> std::result::Result<Response<proto::validate_data_resource_config::Response>, Status>
    {
        let req = request.into_inner();
        let config = decode_dynamic(&req.config)?;

        let data_source = self.make_data_source(&req.type_name).await?;
        let response = data_source
            .validate(
                Context::new(),
                ValidateDataSourceConfigRequest {
                    type_name: req.type_name,
                    config,
                },
            )
            .await;

        Ok(Response::new(
            proto::validate_data_resource_config::Response {
                diagnostics: diagnostics_to_proto(response.diagnostics),
            },
        ))
    }

    async fn upgrade_resource_state(
        &self,
        request: Request<proto::upgrade_resource_state::Request>,
    ) -> std::result::Result<Response<proto::upgrade_resource_state::Response>, Status> {
        let req = request.into_inner();

        // Schemas are at version 0; pass the stored JSON through unchanged.
        let upgraded_state = req.raw_state.map(|raw| proto::DynamicValue {
            msgpack: vec![],
            json: raw.json,
        });

        Ok(Response::new(proto::upgrade_resource_state::Response {
            upgraded_state,
            diagnostics: vec![],
        }))
    }

    async fn read_resource(
        &self,
        request: Request<proto::read_resource::Request>,
    ) -> std::result::Result<Response<proto::read_resource::Response>, Status> {
        let req = request.into_inner();
        let current_state = decode_dynamic(&req.current_state)?;

        let resource = self.make_resource(&req.type_name).await?;
        let response = resource
            .read(
                Context::new(),
                ReadResourceRequest {
                    type_name: req.type_name,
                    current_state,
                    private: req.private,
                },
            )
            .await;

        // A missing remote object reads back as null state, which removes
        // the resource from Terraform state.
        let new_state = match response.new_state {
            Some(state) => encode_dynamic(&state)?,
            None => encode_dynamic(&DynamicValue::null())?,
        };

        Ok(Response::new(proto::read_resource::Response {
            new_state: Some(new_state),
            diagnostics: diagnostics_to_proto(response.diagnostics),
            private: response.private,
            deferred: None,
        }))
    }

    async fn plan_resource_change(
        &self,
        request: Request<proto::plan_resource_change::Request>,
    ) -> std::result::Result<Response<proto::plan_resource_change::Response>, Status> {
        let req = request.into_inner();
        let schema = self.resource_schema(&req.type_name).await?;

        let prior_state = decode_dynamic(&req.prior_state)?;
        let proposed_new_state = decode_dynamic(&req.proposed_new_state)?;

        // Destroy plan: proposed state is null.
        if proposed_new_state.is_null() {
            return Ok(Response::new(proto::plan_resource_change::Response {
                planned_state: Some(encode_dynamic(&proposed_new_state)?),
                requires_replace: vec![],
                planned_private: req.prior_private,
                diagnostics: vec![],
                legacy_type_system: false,
                deferred: None,
            }));
        }

        let mut planned_state = proposed_new_state;

        // Computed attributes with no configured value become unknown so
        // Terraform shows "(known after apply)".
        for attr in &schema.block.attributes {
            if !attr.computed {
                continue;
            }
            let path = AttributePath::new(&attr.name);
            let planned_missing = matches!(
                planned_state.navigate_value(&path),
                None | Some(Dynamic::Null)
            );
            if planned_missing {
                planned_state
                    .mark_unknown(&path)
                    .map_err(|e| Status::internal(e.to_string()))?;
            }
        }

        // force_new attributes whose configured value diverges from prior
        // state require replacement.
        let mut requires_replace = Vec::new();
        if !prior_state.is_null() {
            for attr in &schema.block.attributes {
                if !attr.force_new {
                    continue;
                }
                let path = AttributePath::new(&attr.name);
                let prior = prior_state.navigate_value(&path);
                let planned = planned_state.navigate_value(&path);
                if let (Some(prior), Some(planned)) = (prior, planned) {
                    if planned != &Dynamic::Unknown && prior != planned {
                        requires_replace.push(path_to_proto(&path));
                    }
                }
            }
        }

        Ok(Response::new(proto::plan_resource_change::Response {
            planned_state: Some(encode_dynamic(&planned_state)?),
            requires_replace,
            planned_private: req.prior_private,
            diagnostics: vec![],
            legacy_type_system: false,
            deferred: None,
        }))
    }

    async fn apply_resource_change(
        &self,
        request: Request<proto::apply_resource_change::Request>,
    ) -> std::result::Result<Response<proto::apply_resource_change::Response>, Status> {
        let req = request.into_inner();
        let type_name = req.type_name;

        let prior_state = decode_dynamic(&req.prior_state)?;
        let planned_state = decode_dynamic(&req.planned_state)?;
        let config = decode_dynamic(&req.config)?;

        let resource = self.make_resource(&type_name).await?;
        let ctx = Context::new();

        let is_create = prior_state.is_null();
        let is_delete = planned_state.is_null();

        let (new_state, private, diagnostics) = if is_delete {
            let response = resource
                .delete(
                    ctx,
                    DeleteResourceRequest {
                        type_name,
                        prior_state: prior_state.clone(),
                        planned_private: req.planned_private,
                    },
                )
                .await;
            if has_errors(&response.diagnostics) {
                // Deletion failed; the object is still there.
                (prior_state, vec![], response.diagnostics)
            } else {
                (DynamicValue::null(), vec![], response.diagnostics)
            }
        } else if is_create {
            let response = resource
                .create(
                    ctx,
                    CreateResourceRequest {
                        type_name,
                        config,
                        planned_state: planned_state.clone(),
                    },
                )
                .await;
            if has_errors(&response.diagnostics) {
                // Creation is atomic on the remote side; record nothing.
                (DynamicValue::null(), vec![], response.diagnostics)
            } else {
                (response.new_state, response.private, response.diagnostics)
            }
        } else {
            let response = resource
                .update(
                    ctx,
                    UpdateResourceRequest {
                        type_name,
                        config,
                        planned_state: planned_state.clone(),
                        prior_state: prior_state.clone(),
                        planned_private: req.planned_private,
                    },
                )
                .await;
            if has_errors(&response.diagnostics) {
                (prior_state, vec![], response.diagnostics)
            } else {
                (response.new_state, response.private, response.diagnostics)
            }
        };

        Ok(Response::new(proto::apply_resource_change::Response {
            new_state: Some(encode_dynamic(&new_state)?),
            private,
            diagnostics: diagnostics_to_proto(diagnostics),
            legacy_type_system: false,
        }))
    }

    async fn import_resource_state(
        &self,
        request: Request<proto::import_resource_state::Request>,
    ) -> std::result::Result<Response<proto::import_resource_state::Response>, Status> {
        let req = request.into_inner();

        let resource = self.make_resource(&req.type_name).await?;
        let response = resource
            .import_state(
                Context::new(),
                ImportResourceStateRequest {
                    type_name: req.type_name,
                    id: req.id,
                },
            )
            .await;

        let mut imported_resources = Vec::new();
        for imported in response.imported_resources {
            imported_resources.push(proto::import_resource_state::ImportedResource {
                type_name: imported.type_name,
                state: Some(encode_dynamic(&imported.state)?),
                private: imported.private,
            });
        }

        Ok(Response::new(proto::import_resource_state::Response {
            imported_resources,
            diagnostics: diagnostics_to_proto(response.diagnostics),
            deferred: None,
        }))
    }

    async fn read_data_source(
        &self,
        request: Request<proto::read_data_source::Request>,
    ) -> std::result::Result<Response<proto::read_data_source::Response>, Status> {
        let req = request.into_inner();
        let config = decode_dynamic(&req.config)?;

        let data_source = self.make_data_source(&req.type_name).await?;
        let response = data_source
            .read(
                Context::new(),
                ReadDataSourceRequest {
                    type_name: req.type_name,
                    config,
                },
            )
            .await;

        Ok(Response::new(proto::read_data_source::Response {
            state: Some(encode_dynamic(&response.state)?),
            diagnostics: diagnostics_to_proto(response.diagnostics),
            deferred: None,
        }))
    }
}

impl DynamicValue {
    /// Non-failing variant of path navigation for plan logic.
    fn navigate_value(&self, path: &AttributePath) -> Option<&Dynamic> {
        let mut current = &self.value;
        for step in &path.steps {
            current = match (current, step) {
                (Dynamic::Map(m), AttributePathStep::AttributeName(name)) => m.get(name)?,
                (Dynamic::List(l), AttributePathStep::ElementKeyInt(idx)) => {
                    l.get(*idx as usize)?
                }
                _ => return None,
            };
        }
        Some(current)
    }
}

// Conversion helpers

fn server_capabilities() -> proto::ServerCapabilities {
    proto::ServerCapabilities {
        plan_destroy: false,
        get_provider_schema_optional: false,
        move_resource_state: false,
    }
}

/// Terraform's wire encoding of attribute types is JSON ("string",
/// ["list","string"], ["object",{...}], ...).
fn type_json(attr_type: &AttributeType) -> serde_json::Value {
    use serde_json::{json, Value};

    match attr_type {
        AttributeType::String => Value::String("string".to_string()),
        AttributeType::Number => Value::String("number".to_string()),
        AttributeType::Bool => Value::String("bool".to_string()),
        AttributeType::List(elem) => json!(["list", type_json(elem)]),
        AttributeType::Set(elem) => json!(["set", type_json(elem)]),
        AttributeType::Map(elem) => json!(["map", type_json(elem)]),
        AttributeType::Object(attrs) => {
            let fields: serde_json::Map<String, Value> = attrs
                .iter()
                .map(|(name, t)| (name.clone(), type_json(t)))
                .collect();
            json!(["object", fields])
        }
    }
}

fn attribute_to_proto(attr: &Attribute) -> proto::schema::Attribute {
    proto::schema::Attribute {
        name: attr.name.clone(),
        r#type: serde_json::to_vec(&type_json(&attr.r#type)).unwrap_or_default(),
        nested_type: None,
        description: attr.description.clone(),
        required: attr.required,
        optional: attr.optional,
        computed: attr.computed,
        sensitive: attr.sensitive,
        description_kind: proto::StringKind::Plain as i32,
        deprecated: attr.deprecated,
        write_only: false,
    }
}

fn nesting_to_proto(nesting: NestingMode) -> i32 {
    use crate::proto::schema::nested_block::NestingMode as ProtoNesting;
    match nesting {
        NestingMode::Single => ProtoNesting::Single as i32,
        NestingMode::List => ProtoNesting::List as i32,
        NestingMode::Set => ProtoNesting::Set as i32,
        NestingMode::Map => ProtoNesting::Map as i32,
        NestingMode::Group => ProtoNesting::Group as i32,
    }
}

fn nested_block_to_proto(block: &NestedBlock) -> proto::schema::NestedBlock {
    proto::schema::NestedBlock {
        type_name: block.type_name.clone(),
        block: Some(block_to_proto(&block.block)),
        nesting: nesting_to_proto(block.nesting),
        min_items: block.min_items,
        max_items: block.max_items,
    }
}

fn block_to_proto(block: &Block) -> proto::schema::Block {
    proto::schema::Block {
        version: block.version,
        attributes: block.attributes.iter().map(attribute_to_proto).collect(),
        block_types: block.block_types.iter().map(nested_block_to_proto).collect(),
        description: block.description.clone(),
        description_kind: proto::StringKind::Plain as i32,
        deprecated: block.deprecated,
    }
}

fn schema_to_proto(schema: &Schema) -> proto::Schema {
    proto::Schema {
        version: schema.version,
        block: Some(block_to_proto(&schema.block)),
    }
}

fn path_to_proto(path: &AttributePath) -> proto::AttributePath {
    use crate::proto::attribute_path::step::Selector;

    proto::AttributePath {
        steps: path
            .steps
            .iter()
            .map(|step| proto::attribute_path::Step {
                selector: Some(match step {
                    AttributePathStep::AttributeName(name) => {
                        Selector::AttributeName(name.clone())
                    }
                    AttributePathStep::ElementKeyString(key) => {
                        Selector::ElementKeyString(key.clone())
                    }
                    AttributePathStep::ElementKeyInt(idx) => Selector::ElementKeyInt(*idx),
                }),
            })
            .collect(),
    }
}

fn diagnostics_to_proto(diagnostics: Vec<Diagnostic>) -> Vec<proto::Diagnostic> {
    diagnostics
        .into_iter()
        .map(|d| proto::Diagnostic {
            severity: match d.severity {
                DiagnosticSeverity::Error => proto::diagnostic::Severity::Error as i32,
                DiagnosticSeverity::Warning => proto::diagnostic::Severity::Warning as i32,
            },
            summary: d.summary,
            detail: d.detail,
            attribute: d.attribute.as_ref().map(path_to_proto),
        })
        .collect()
}

#[allow(clippy::result_large_err)]
fn decode_dynamic(
    value: &Option<proto::DynamicValue>,
) -> std::result::Result<DynamicValue, Status> {
    let value = match value {
        Some(v) => v,
        None => return Ok(DynamicValue::null()),
    };

    if !value.msgpack.is_empty() {
        DynamicValue::decode_msgpack(&value.msgpack)
            .map_err(|e| Status::invalid_argument(e.to_string()))
    } else if !value.json.is_empty() {
        DynamicValue::decode_json(&value.json)
            .map_err(|e| Status::invalid_argument(e.to_string()))
    } else {
        Ok(DynamicValue::null())
    }
}

#[allow(clippy::result_large_err)]
fn encode_dynamic(value: &DynamicValue) -> std::result::Result<proto::DynamicValue, Status> {
    Ok(proto::DynamicValue {
        msgpack: value
            .encode_msgpack()
            .map_err(|e| Status::internal(e.to_string()))?,
        json: vec![],
    })
}

/// Schema-driven validation of required attributes, undeclared attributes,
/// and declared types. Unknown values pass; they are resolved later in the
/// plan.
fn validate_against_schema(config: &DynamicValue, schema: &Schema) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let values = match &config.value {
        Dynamic::Map(values) => values,
        // Unknown or null config cannot be checked yet.
        _ => return diagnostics,
    };

    for attr in &schema.block.attributes {
        if attr.required {
            let missing = matches!(values.get(&attr.name), None | Some(Dynamic::Null));
            if missing {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Missing required attribute: {}", attr.name),
                        format!("The attribute '{}' must be set", attr.name),
                    )
                    .with_attribute(AttributePath::new(&attr.name)),
                );
            }
        }
    }

    for (name, value) in values {
        match schema.attribute(name) {
            Some(attr) => {
                if !value_matches_type(value, &attr.r#type) {
                    diagnostics.push(
                        Diagnostic::error(
                            format!("Type mismatch for attribute: {}", name),
                            format!(
                                "The attribute '{}' expects {:?} but got {}",
                                name,
                                attr.r#type,
                                value.type_name()
                            ),
                        )
                        .with_attribute(AttributePath::new(name)),
                    );
                }
            }
            None if schema.block_type(name).is_some() => {
                // Nested block entries are validated by the resource.
            }
            None => {
                diagnostics.push(
                    Diagnostic::error(
                        format!("Unknown attribute: {}", name),
                        format!("The attribute '{}' is not declared in the schema", name),
                    )
                    .with_attribute(AttributePath::new(name)),
                );
            }
        }
    }

    diagnostics
}

fn value_matches_type(value: &Dynamic, expected: &AttributeType) -> bool {
    match (value, expected) {
        (Dynamic::Null, _) | (Dynamic::Unknown, _) => true,
        (Dynamic::String(_), AttributeType::String) => true,
        (Dynamic::Number(_), AttributeType::Number) => true,
        (Dynamic::Bool(_), AttributeType::Bool) => true,
        (Dynamic::List(items), AttributeType::List(elem))
        | (Dynamic::List(items), AttributeType::Set(elem)) => {
            items.iter().all(|item| value_matches_type(item, elem))
        }
        (Dynamic::Map(entries), AttributeType::Map(elem)) => {
            entries.values().all(|item| value_matches_type(item, elem))
        }
        (Dynamic::Map(entries), AttributeType::Object(fields)) => {
            fields.iter().all(|(name, field_type)| match entries.get(name) {
                Some(value) => value_matches_type(value, field_type),
                None => true,
            })
        }
        _ => false,
    }
}
