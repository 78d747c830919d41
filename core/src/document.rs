#![deny(missing_docs)]

//! # Document Assembly
//!
//! Merges the catalog, the operation registries and the database dump into the
//! JSON documentation, builds the OpenAPI 3.0.3 document and writes both.

use crate::catalog::TypeInfo;
use crate::database::DatabaseInfo;
use crate::error::AppResult;
use crate::registry::{ApiRegistry, BodyInfo, MqttOperationInfo, ParamInfo, RouteInfo};
use crate::schema_generator::{render_annotated, render_components, render_field_type};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use tracing::info;

/// OpenAPI version emitted by [`build_openapi`].
pub const OPENAPI_VERSION: &str = "3.0.3";

/// API metadata for both outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiInfo {
    /// The title of the API.
    pub title: String,
    /// The version of the API.
    pub version: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional contact information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<ApiContact>,
    /// Servers the API is reachable at.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<ApiServer>,
}

impl ApiInfo {
    /// Creates a new ApiInfo with required fields.
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            description: None,
            contact: None,
            servers: Vec::new(),
        }
    }

    /// Sets an optional description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets optional contact metadata.
    pub fn with_contact(mut self, contact: ApiContact) -> Self {
        self.contact = Some(contact);
        self
    }

    /// Adds a server definition.
    pub fn with_server(mut self, server: ApiServer) -> Self {
        self.servers.push(server);
        self
    }
}

/// Contact metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApiContact {
    /// The identifying name of the contact person/organization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The URL for the contact information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// The email address of the contact person/organization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl ApiContact {
    /// Creates an empty contact object.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the contact name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the contact URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the contact email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// A server entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiServer {
    /// Server URL.
    pub url: String,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ApiServer {
    /// Creates a server with the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// MQTT operations by id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MqttDocumentation {
    /// Messages the service publishes.
    pub publications: BTreeMap<String, MqttOperationInfo>,
    /// Messages the service consumes.
    pub subscriptions: BTreeMap<String, MqttOperationInfo>,
}

/// The JSON documentation file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiDocumentation {
    /// API metadata.
    pub api: ApiInfo,
    /// Types by name.
    pub types: BTreeMap<String, TypeInfo>,
    /// HTTP routes by operation id.
    pub http: BTreeMap<String, RouteInfo>,
    /// MQTT operations.
    pub mqtt: MqttDocumentation,
    /// Database schema dump.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseInfo>,
}

/// Snapshots the registry into the documentation object.
pub fn assemble_documentation(
    registry: &ApiRegistry,
    info: &ApiInfo,
    database: Option<DatabaseInfo>,
) -> ApiDocumentation {
    ApiDocumentation {
        api: info.clone(),
        types: registry.catalog().types().clone(),
        http: registry.routes().clone(),
        mqtt: MqttDocumentation {
            publications: registry.publications().clone(),
            subscriptions: registry.subscriptions().clone(),
        },
        database,
    }
}

/// Builds the OpenAPI document. Only types reachable from HTTP operations are
/// emitted under `components.schemas`.
pub fn build_openapi(registry: &ApiRegistry, info: &ApiInfo) -> AppResult<Value> {
    let mut doc = Map::new();
    doc.insert("openapi".to_string(), json!(OPENAPI_VERSION));
    doc.insert("info".to_string(), info_value(info)?);
    if !info.servers.is_empty() {
        doc.insert("servers".to_string(), serde_json::to_value(&info.servers)?);
    }

    let tags: BTreeSet<&str> = registry
        .routes()
        .values()
        .filter_map(|r| r.group.as_deref())
        .collect();
    if !tags.is_empty() {
        let entries: Vec<Value> = tags.iter().map(|t| json!({ "name": t })).collect();
        doc.insert("tags".to_string(), Value::Array(entries));
    }

    let mut paths: BTreeMap<&str, Map<String, Value>> = BTreeMap::new();
    for route in registry.routes().values() {
        paths
            .entry(route.openapi_path.as_str())
            .or_default()
            .insert(route.method.openapi_key().to_string(), build_operation(route));
    }
    let paths: Map<String, Value> = paths
        .into_iter()
        .map(|(path, item)| (path.to_string(), Value::Object(item)))
        .collect();
    doc.insert("paths".to_string(), Value::Object(paths));

    let schemas = render_components(registry.catalog().iter().filter(|t| t.used_by_http))?;
    doc.insert("components".to_string(), json!({ "schemas": schemas }));

    Ok(Value::Object(doc))
}

fn info_value(info: &ApiInfo) -> AppResult<Value> {
    let mut obj = Map::new();
    obj.insert("title".to_string(), json!(info.title));
    obj.insert("version".to_string(), json!(info.version));
    if let Some(desc) = &info.description {
        obj.insert("description".to_string(), json!(desc));
    }
    if let Some(contact) = &info.contact {
        obj.insert("contact".to_string(), serde_json::to_value(contact)?);
    }
    Ok(Value::Object(obj))
}

fn build_operation(route: &RouteInfo) -> Value {
    let mut op = Map::new();
    op.insert("operationId".to_string(), json!(route.operation_id));
    op.insert("summary".to_string(), json!(route.summary));

    let description = match (&route.description, &route.deprecated) {
        (Some(desc), Some(dep)) => Some(format!("{}\n\nDeprecated: {}", desc, dep)),
        (None, Some(dep)) => Some(format!("Deprecated: {}", dep)),
        (desc, None) => desc.clone(),
    };
    if let Some(desc) = description {
        op.insert("description".to_string(), json!(desc));
    }
    if let Some(group) = &route.group {
        op.insert("tags".to_string(), json!([group]));
    }
    if route.deprecated.is_some() {
        op.insert("deprecated".to_string(), json!(true));
    }

    if !route.params.is_empty() {
        let params = route.params.iter().map(build_parameter).collect::<Vec<_>>();
        op.insert("parameters".to_string(), Value::Array(params));
    }

    if let Some(body) = &route.request {
        let mut request = Map::new();
        if let Some(desc) = &body.description {
            request.insert("description".to_string(), json!(desc));
        }
        request.insert("required".to_string(), json!(true));
        if let Some(content) = body_content(body) {
            request.insert("content".to_string(), content);
        }
        op.insert("requestBody".to_string(), Value::Object(request));
    }

    let mut responses = Map::new();
    for (status, body) in &route.responses {
        let mut response = Map::new();
        let desc = body
            .description
            .clone()
            .unwrap_or_else(|| status_reason(*status).to_string());
        response.insert("description".to_string(), json!(desc));
        if let Some(content) = body_content(body) {
            response.insert("content".to_string(), content);
        }
        responses.insert(status.to_string(), Value::Object(response));
    }
    op.insert("responses".to_string(), Value::Object(responses));

    Value::Object(op)
}

fn build_parameter(param: &ParamInfo) -> Value {
    let mut obj = Map::new();
    obj.insert("name".to_string(), json!(param.name));
    obj.insert("in".to_string(), json!(param.location.as_str()));
    obj.insert("required".to_string(), json!(param.required));
    if let Some(desc) = &param.description {
        obj.insert("description".to_string(), json!(desc));
    }

    let mut schema = render_annotated(&param.field_type, None, false);
    if let Some(pattern) = &param.pattern {
        if schema.get("$ref").is_some() {
            schema = json!({ "allOf": [schema] });
        }
        if let Value::Object(map) = &mut schema {
            map.insert("pattern".to_string(), json!(pattern));
        }
    }
    obj.insert("schema".to_string(), schema);

    if let Some(example) = &param.example {
        obj.insert("example".to_string(), example.clone());
    }
    Value::Object(obj)
}

fn body_content(body: &BodyInfo) -> Option<Value> {
    let field_type = body.field_type.as_ref()?;
    let mut media = Map::new();
    media.insert("schema".to_string(), render_field_type(field_type));
    if !body.examples.is_empty() {
        let examples: Map<String, Value> = body
            .examples
            .iter()
            .map(|(name, value)| (name.clone(), json!({ "value": value })))
            .collect();
        media.insert("examples".to_string(), Value::Object(examples));
    }
    Some(json!({ "application/json": media }))
}

/// Default response description for a status code.
pub fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        410 => "Gone",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Response",
    }
}

/// Writes the documentation as indented JSON and the OpenAPI document as YAML,
/// creating parent directories as needed.
pub fn write_outputs(
    documentation: &ApiDocumentation,
    openapi: &Value,
    json_path: &Path,
    yaml_path: &Path,
) -> AppResult<()> {
    let json = serde_json::to_string_pretty(documentation)?;
    let yaml = serde_yaml::to_string(openapi)?;

    for path in [json_path, yaml_path] {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
    }
    fs::write(json_path, json)?;
    fs::write(yaml_path, yaml)?;

    info!(
        json = %json_path.display(),
        yaml = %yaml_path.display(),
        "Documentation written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use crate::registry::{BodySpec, HttpMethod, MessageSpec, ParamSpec, RouteSpec, TypeRef};
    use crate::type_mapping::RustToJsonMapper;
    use pretty_assertions::assert_eq;

    fn registry() -> ApiRegistry {
        let catalog = parse_source(
            r#"
            pub enum Status { OK, NotFound, Error }
            pub struct Device { pub id: String, pub status: Status }
            pub struct Reading { pub value: f64 }
            "#,
            &RustToJsonMapper::new(),
        )
        .unwrap();
        let mut registry = ApiRegistry::new(catalog);
        registry
            .register_route(
                RouteSpec::new("getDevice", HttpMethod::Get, "/devices/{id:[a-z0-9]+}")
                    .with_summary("Fetch a device")
                    .with_group("devices")
                    .with_param(ParamSpec::path("id").with_description("Device id"))
                    .with_response(
                        200,
                        BodySpec::named("Device")
                            .with_example("ok", json!({ "id": "d1", "status": "OK" })),
                    )
                    .with_response(404, BodySpec::empty()),
            )
            .unwrap();
        registry
            .register_publication(
                MessageSpec::new("reading", "devices/{id}/reading", BodySpec::named("Reading"))
                    .with_summary("Reading"),
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_openapi_document() {
        let registry = registry();
        let info = ApiInfo::new("Devices", "1.0.0").with_server(ApiServer::new("/api"));
        let doc = build_openapi(&registry, &info).unwrap();

        assert_eq!(doc["openapi"], "3.0.3");
        assert_eq!(doc["servers"], json!([{ "url": "/api" }]));
        assert_eq!(doc["tags"], json!([{ "name": "devices" }]));

        let op = &doc["paths"]["/devices/{id}"]["get"];
        assert_eq!(op["operationId"], "getDevice");
        assert_eq!(
            op["parameters"][0],
            json!({
                "name": "id",
                "in": "path",
                "required": true,
                "description": "Device id",
                "schema": { "type": "string", "pattern": "[a-z0-9]+" }
            })
        );
        assert_eq!(
            op["responses"]["200"]["content"]["application/json"]["schema"],
            json!({ "$ref": "#/components/schemas/Device" })
        );
        assert_eq!(op["responses"]["404"], json!({ "description": "Not Found" }));

        let schemas = doc["components"]["schemas"].as_object().unwrap();
        let names: Vec<_> = schemas.keys().cloned().collect();
        assert_eq!(names, vec!["Device", "Status"]);
        assert_eq!(schemas["Status"]["enum"], json!(["OK", "NotFound", "Error"]));
    }

    #[test]
    fn test_documentation_and_outputs() {
        let mut registry = registry();
        let info = ApiInfo::new("Devices", "1.0.0");
        let documentation = registry.finalize(&info, None).unwrap();
        let openapi = build_openapi(&registry, &info).unwrap();

        assert_eq!(documentation.http.len(), 1);
        assert_eq!(documentation.mqtt.publications.len(), 1);
        assert!(documentation.types["Reading"].used_by_mqtt);
        assert_eq!(documentation.types["Status"].referenced_by, vec!["Device"]);
        assert_eq!(
            documentation.types["Device"]
                .representations
                .as_ref()
                .unwrap()
                .example,
            json!({ "id": "d1", "status": "OK" })
        );

        let dir = tempfile::tempdir().unwrap();
        let json_path = dir.path().join("out/docs.json");
        let yaml_path = dir.path().join("out/openapi.yaml");
        write_outputs(&documentation, &openapi, &json_path, &yaml_path).unwrap();

        let written: Value =
            serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
        let keys: Vec<_> = written.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["api", "types", "http", "mqtt"]);
        assert_eq!(
            written["mqtt"]["publications"]["reading"]["topicMQTT"],
            "devices/+/reading"
        );

        let yaml: Value =
            serde_yaml::from_str(&fs::read_to_string(&yaml_path).unwrap()).unwrap();
        assert_eq!(yaml["openapi"], "3.0.3");
    }

    #[test]
    fn test_typed_parameter_schema() {
        let mut registry = registry();
        registry
            .register_route(
                RouteSpec::new("byStatus", HttpMethod::Get, "/devices")
                    .with_summary("Filter")
                    .with_param(ParamSpec::query("status").with_type(TypeRef::named("Status")))
                    .with_response(200, BodySpec::named("Vec<Device>")),
            )
            .unwrap();
        let doc = build_openapi(&registry, &ApiInfo::new("x", "1")).unwrap();
        let op = &doc["paths"]["/devices"]["get"];
        assert_eq!(
            op["parameters"][0]["schema"],
            json!({ "$ref": "#/components/schemas/Status" })
        );
        assert_eq!(op["parameters"][0]["required"], json!(false));
    }

    #[test]
    fn test_pattern_kept_on_referenced_parameter() {
        let mut registry = registry();
        registry
            .register_route(
                RouteSpec::new("byStatusPath", HttpMethod::Get, "/statuses/{status:[A-Za-z]+}")
                    .with_summary("Devices in a status")
                    .with_param(ParamSpec::path("status").with_type(TypeRef::named("Status")))
                    .with_response(200, BodySpec::named("Vec<Device>")),
            )
            .unwrap();
        let doc = build_openapi(&registry, &ApiInfo::new("x", "1")).unwrap();
        assert_eq!(
            doc["paths"]["/statuses/{status}"]["get"]["parameters"][0]["schema"],
            json!({
                "allOf": [{ "$ref": "#/components/schemas/Status" }],
                "pattern": "[A-Za-z]+"
            })
        );
    }

    #[test]
    fn test_contact_in_info() {
        let info = ApiInfo::new("Devices", "1.0.0")
            .with_contact(ApiContact::new().with_name("Ops").with_email("ops@example.test"));
        let doc = build_openapi(&registry(), &info).unwrap();
        assert_eq!(
            doc["info"]["contact"],
            json!({ "name": "Ops", "email": "ops@example.test" })
        );
    }

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(201), "Created");
        assert_eq!(status_reason(299), "Response");
    }
}
