#![deny(missing_docs)]

//! # Operation Registry
//!
//! The registration surface for HTTP routes and MQTT operations. Bodies and
//! parameters name their Rust type explicitly through [`TypeRef`]; every type
//! they reach is tagged with a usage record and a protocol flag as soon as the
//! operation is accepted.

pub mod mqtt;
pub mod routes;

pub use mqtt::{
    parse_topic, MessageSpec, MqttOperationInfo, MqttPublicationInfo, MqttSubscriptionInfo,
    TopicParamInfo, TopicParamSpec,
};
pub use routes::{
    parse_route_path, HttpMethod, ParamInfo, ParamLocation, ParamSpec, PathParam, RouteInfo,
    RouteSpec,
};

use crate::catalog::{FieldType, TypeCatalog};
use crate::database::DatabaseInfo;
use crate::document::{assemble_documentation, ApiDocumentation, ApiInfo};
use crate::error::{AppError, AppResult};
use crate::graph::build_reference_graph;
use crate::representation::generate_representations;
use crate::type_mapping::{mapping_message, RustToJsonMapper, TypeMapper};
use crate::usage::normalize_usages;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::info;

/// A Rust type expression naming the wire type of a body or parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeRef(String);

impl TypeRef {
    /// The type of `T`, as reported by [`std::any::type_name`].
    pub fn of<T: ?Sized>() -> Self {
        Self(std::any::type_name::<T>().to_string())
    }

    /// A type written as source text, e.g. `Vec<Status>`.
    pub fn named(rust_type: impl Into<String>) -> Self {
        Self(rust_type.into())
    }

    /// The type expression.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TypeRef {
    fn default() -> Self {
        Self::named("String")
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A request, response or message body as declared by its author.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    /// Payload type. Responses without a type have no content.
    #[serde(rename = "type", default)]
    pub type_ref: Option<TypeRef>,
    /// Documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Named examples.
    #[serde(default)]
    pub examples: IndexMap<String, Value>,
}

impl BodySpec {
    /// A body of type `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self::typed(TypeRef::of::<T>())
    }

    /// A body of the named type.
    pub fn named(rust_type: impl Into<String>) -> Self {
        Self::typed(TypeRef::named(rust_type))
    }

    /// A body of the given type.
    pub fn typed(type_ref: TypeRef) -> Self {
        Self {
            type_ref: Some(type_ref),
            ..Self::default()
        }
    }

    /// A response without content.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a named example.
    pub fn with_example(mut self, name: impl Into<String>, example: Value) -> Self {
        self.examples.insert(name.into(), example);
        self
    }

    /// Adds a named example from any serializable value.
    pub fn with_serialized_example<T: Serialize>(
        self,
        name: impl Into<String>,
        example: &T,
    ) -> AppResult<Self> {
        let value = serde_json::to_value(example)?;
        Ok(self.with_example(name, value))
    }
}

/// A validated body.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyInfo {
    /// The declared Rust type.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rust_type: Option<String>,
    /// Resolved type descriptor.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Named examples.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, Value>,
}

/// The type catalog plus every registered operation.
#[derive(Debug)]
pub struct ApiRegistry {
    catalog: TypeCatalog,
    mapper: Box<dyn TypeMapper>,
    operation_ids: BTreeSet<String>,
    /// Operation id by method and OpenAPI path.
    route_keys: BTreeMap<(HttpMethod, String), String>,
    routes: BTreeMap<String, RouteInfo>,
    publications: BTreeMap<String, MqttOperationInfo>,
    subscriptions: BTreeMap<String, MqttOperationInfo>,
}

impl ApiRegistry {
    /// Creates a registry over `catalog` using the default type mapper.
    pub fn new(catalog: TypeCatalog) -> Self {
        Self::with_mapper(catalog, Box::new(RustToJsonMapper::new()))
    }

    /// Creates a registry resolving operation types with `mapper`.
    pub fn with_mapper(catalog: TypeCatalog, mapper: Box<dyn TypeMapper>) -> Self {
        Self {
            catalog,
            mapper,
            operation_ids: BTreeSet::new(),
            route_keys: BTreeMap::new(),
            routes: BTreeMap::new(),
            publications: BTreeMap::new(),
            subscriptions: BTreeMap::new(),
        }
    }

    /// The type catalog.
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Registered routes by operation id.
    pub fn routes(&self) -> &BTreeMap<String, RouteInfo> {
        &self.routes
    }

    /// Registered publications by operation id.
    pub fn publications(&self) -> &BTreeMap<String, MqttOperationInfo> {
        &self.publications
    }

    /// Registered subscriptions by operation id.
    pub fn subscriptions(&self) -> &BTreeMap<String, MqttOperationInfo> {
        &self.subscriptions
    }

    /// Builds the reference graph, sorts usage records and generates the
    /// representations of every type, then assembles the documentation.
    pub fn finalize(
        &mut self,
        info: &ApiInfo,
        database: Option<DatabaseInfo>,
    ) -> AppResult<ApiDocumentation> {
        build_reference_graph(&mut self.catalog)?;
        normalize_usages(&mut self.catalog);
        let examples = self.collect_examples();
        generate_representations(&mut self.catalog, &examples)?;
        info!(
            types = self.catalog.len(),
            routes = self.routes.len(),
            publications = self.publications.len(),
            subscriptions = self.subscriptions.len(),
            "Registry finalized"
        );
        Ok(assemble_documentation(self, info, database))
    }

    /// Examples registered for bodies whose type is exactly a cataloged type.
    fn collect_examples(&self) -> BTreeMap<String, Vec<Value>> {
        let bodies = self
            .routes
            .values()
            .flat_map(|r| r.request.iter().chain(r.responses.values()))
            .chain(self.publications.values().map(|p| &p.message))
            .chain(self.subscriptions.values().map(|s| &s.message));

        let mut examples: BTreeMap<String, Vec<Value>> = BTreeMap::new();
        for body in bodies {
            if let Some(name) = body.field_type.as_ref().and_then(FieldType::type_name) {
                examples
                    .entry(name.to_string())
                    .or_default()
                    .extend(body.examples.values().cloned());
            }
        }
        examples
    }

    fn check_operation_id(&self, operation_id: &str) -> AppResult<()> {
        if operation_id.trim().is_empty() {
            return Err(AppError::registration(operation_id, "operation id is required"));
        }
        if self.operation_ids.contains(operation_id) {
            return Err(AppError::DuplicateOperation(operation_id.to_string()));
        }
        Ok(())
    }

    fn resolve_type(&self, operation_id: &str, type_ref: &TypeRef) -> AppResult<FieldType> {
        let mut ft = self.mapper.map(type_ref.as_str()).map_err(|e| {
            AppError::registration(
                operation_id,
                format!("type '{}': {}", type_ref, mapping_message(e)),
            )
        })?;
        self.catalog.resolve_type(&mut ft).map_err(|msg| {
            AppError::registration(operation_id, format!("type '{}': {}", type_ref, msg))
        })?;
        Ok(ft)
    }

    fn body_info(&self, operation_id: &str, spec: &BodySpec) -> AppResult<BodyInfo> {
        let field_type = match &spec.type_ref {
            Some(type_ref) => Some(self.resolve_type(operation_id, type_ref)?),
            None => None,
        };
        Ok(BodyInfo {
            rust_type: spec.type_ref.as_ref().map(TypeRef::to_string),
            field_type,
            description: spec.description.clone(),
            examples: spec.examples.clone(),
        })
    }
}
