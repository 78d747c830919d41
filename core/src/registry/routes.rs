//! # HTTP Routes
//!
//! Route registration: paths with placeholders (`/devices/{id}`, `/files/{name:[a-z]+}`),
//! parameters and bodies.

use crate::catalog::{FieldType, UsageInfo, UsageRole};
use crate::error::{AppError, AppResult};
use crate::registry::{ApiRegistry, BodyInfo, BodySpec, TypeRef};
use crate::usage::{attach_usage, Protocol};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// HTTP verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl HttpMethod {
    /// Lowercase key used in OpenAPI path items.
    pub fn openapi_key(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.openapi_key().to_uppercase())
    }
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    /// A `{placeholder}` of the path.
    Path,
    /// A query string parameter.
    Query,
    /// A request header.
    Header,
}

impl ParamLocation {
    /// The OpenAPI `in` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
        }
    }
}

/// A parameter as declared by the route author.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: String,
    /// Location.
    #[serde(rename = "in")]
    pub location: ParamLocation,
    /// Whether the parameter must be sent. Path parameters always are.
    #[serde(default)]
    pub required: bool,
    /// Value type.
    #[serde(rename = "type", default)]
    pub type_ref: TypeRef,
    /// Documentation.
    #[serde(default)]
    pub description: Option<String>,
    /// Example value.
    #[serde(default)]
    pub example: Option<Value>,
}

impl ParamSpec {
    fn new(name: impl Into<String>, location: ParamLocation) -> Self {
        Self {
            name: name.into(),
            location,
            required: location == ParamLocation::Path,
            type_ref: TypeRef::default(),
            description: None,
            example: None,
        }
    }

    /// A path parameter (string unless typed otherwise).
    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Path)
    }

    /// An optional query parameter.
    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Query)
    }

    /// An optional header.
    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, ParamLocation::Header)
    }

    /// Sets the value type.
    pub fn with_type(mut self, type_ref: TypeRef) -> Self {
        self.type_ref = type_ref;
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets an example value.
    pub fn with_example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Marks the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// A route as declared by the route author.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSpec {
    /// Unique operation id.
    pub operation_id: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// Path with `{param}` or `{param:regex}` placeholders.
    pub path: String,
    /// One-line summary.
    #[serde(default)]
    pub summary: String,
    /// Longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Group (OpenAPI tag).
    #[serde(default)]
    pub group: Option<String>,
    /// Deprecation message.
    #[serde(default)]
    pub deprecated: Option<String>,
    /// Parameters.
    #[serde(default)]
    pub params: Vec<ParamSpec>,
    /// Request body.
    #[serde(default)]
    pub request: Option<BodySpec>,
    /// Responses by status code.
    #[serde(default)]
    pub responses: BTreeMap<u16, BodySpec>,
}

impl RouteSpec {
    /// Creates a route with the required identity fields.
    pub fn new(operation_id: impl Into<String>, method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            operation_id: operation_id.into(),
            method,
            path: path.into(),
            summary: String::new(),
            description: None,
            group: None,
            deprecated: None,
            params: Vec::new(),
            request: None,
            responses: BTreeMap::new(),
        }
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Marks the route deprecated.
    pub fn with_deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = Some(message.into());
        self
    }

    /// Adds a parameter.
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Sets the request body.
    pub fn with_request(mut self, body: BodySpec) -> Self {
        self.request = Some(body);
        self
    }

    /// Adds a response.
    pub fn with_response(mut self, status: u16, body: BodySpec) -> Self {
        self.responses.insert(status, body);
        self
    }
}

/// A validated parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamInfo {
    /// Parameter name.
    pub name: String,
    /// Location.
    #[serde(rename = "in")]
    pub location: ParamLocation,
    /// Whether the parameter must be sent.
    pub required: bool,
    /// The declared Rust type.
    pub rust_type: String,
    /// Resolved type descriptor.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Regex constraint from the path (`{id:[0-9]+}`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Example value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// A registered route.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    /// Unique operation id.
    pub operation_id: String,
    /// HTTP method.
    pub method: HttpMethod,
    /// The path as registered with the router.
    pub path: String,
    /// The path with regex constraints removed.
    pub openapi_path: String,
    /// Summary.
    pub summary: String,
    /// Description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Deprecation message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    /// Parameters, path parameters first in path order.
    pub params: Vec<ParamInfo>,
    /// Request body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<BodyInfo>,
    /// Responses by status code.
    pub responses: BTreeMap<u16, BodyInfo>,
}

/// A `{name}` or `{name:regex}` segment of a route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParam {
    /// Placeholder name.
    pub name: String,
    /// Regex constraint.
    pub pattern: Option<String>,
}

/// Parses a route path into its OpenAPI form and placeholders.
///
/// Braces inside a regex (`{id:[0-9]{3}}`) are balanced by depth.
pub fn parse_route_path(path: &str) -> Result<(String, Vec<PathParam>), String> {
    if !path.starts_with('/') {
        return Err(format!("path '{}' must start with '/'", path));
    }

    let mut openapi = String::with_capacity(path.len());
    let mut params: Vec<PathParam> = Vec::new();
    let mut chars = path.char_indices();

    while let Some((start, c)) = chars.next() {
        match c {
            '{' => {
                let mut depth = 1;
                let mut end = None;
                for (idx, inner) in chars.by_ref() {
                    match inner {
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                end = Some(idx);
                                break;
                            }
                        }
                        _ => {}
                    }
                }
                let end = end.ok_or_else(|| format!("unbalanced '{{' in path '{}'", path))?;
                let body = &path[start + 1..end];
                let (name, pattern) = match body.split_once(':') {
                    Some((name, pattern)) => (name, Some(pattern.to_string())),
                    None => (body, None),
                };
                if name.is_empty() {
                    return Err(format!("empty parameter name in path '{}'", path));
                }
                if params.iter().any(|p| p.name == name) {
                    return Err(format!("parameter '{}' appears twice in path '{}'", name, path));
                }
                openapi.push('{');
                openapi.push_str(name);
                openapi.push('}');
                params.push(PathParam {
                    name: name.to_string(),
                    pattern,
                });
            }
            '}' => return Err(format!("unbalanced '}}' in path '{}'", path)),
            other => openapi.push(other),
        }
    }

    Ok((openapi, params))
}

impl ApiRegistry {
    /// Validates and registers a route.
    ///
    /// Nothing is recorded when validation fails.
    pub fn register_route(&mut self, spec: RouteSpec) -> AppResult<()> {
        let id = spec.operation_id.clone();
        self.check_operation_id(&id)?;
        if spec.summary.trim().is_empty() {
            return Err(AppError::registration(&id, "summary is required"));
        }

        let (openapi_path, path_params) =
            parse_route_path(&spec.path).map_err(|msg| AppError::registration(&id, msg))?;
        let route_key = (spec.method, openapi_path.clone());
        if let Some(existing) = self.route_keys.get(&route_key) {
            return Err(AppError::registration(
                &id,
                format!(
                    "{} {} is already registered as '{}'",
                    spec.method, openapi_path, existing
                ),
            ));
        }

        let mut seen = BTreeSet::new();
        for param in &spec.params {
            if !seen.insert((param.location, param.name.as_str())) {
                return Err(AppError::registration(
                    &id,
                    format!(
                        "{} parameter '{}' is declared twice",
                        param.location.as_str(),
                        param.name
                    ),
                ));
            }
            if param.location == ParamLocation::Path
                && !path_params.iter().any(|p| p.name == param.name)
            {
                return Err(AppError::registration(
                    &id,
                    format!("path parameter '{}' does not appear in the path", param.name),
                ));
            }
        }

        let mut params = Vec::with_capacity(spec.params.len());
        for placeholder in &path_params {
            let declared = spec
                .params
                .iter()
                .find(|p| p.location == ParamLocation::Path && p.name == placeholder.name)
                .ok_or_else(|| {
                    AppError::registration(
                        &id,
                        format!("path parameter '{}' is not documented", placeholder.name),
                    )
                })?;
            let mut info = self.param_info(&id, declared)?;
            info.required = true;
            info.pattern = placeholder.pattern.clone();
            params.push(info);
        }
        for param in spec
            .params
            .iter()
            .filter(|p| p.location != ParamLocation::Path)
        {
            params.push(self.param_info(&id, param)?);
        }

        if spec.responses.is_empty() {
            return Err(AppError::registration(&id, "at least one response is required"));
        }
        let request = match &spec.request {
            Some(body) if body.type_ref.is_none() => {
                return Err(AppError::registration(&id, "request body needs a type"))
            }
            Some(body) => Some(self.body_info(&id, body)?),
            None => None,
        };
        let mut responses = BTreeMap::new();
        for (status, body) in &spec.responses {
            if !(100..=599).contains(status) {
                return Err(AppError::registration(
                    &id,
                    format!("invalid status code {}", status),
                ));
            }
            responses.insert(*status, self.body_info(&id, body)?);
        }

        let usage = |role| UsageInfo {
            operation_id: id.clone(),
            role,
        };
        for param in &params {
            attach_usage(
                &mut self.catalog,
                &param.field_type,
                &usage(UsageRole::Parameter),
                Protocol::Http,
            );
        }
        if let Some(ft) = request.as_ref().and_then(|b| b.field_type.as_ref()) {
            attach_usage(&mut self.catalog, ft, &usage(UsageRole::Request), Protocol::Http);
        }
        for ft in responses.values().filter_map(|b| b.field_type.as_ref()) {
            attach_usage(&mut self.catalog, ft, &usage(UsageRole::Response), Protocol::Http);
        }

        debug!(operation_id = %id, method = %spec.method, path = %spec.path, "Registered route");
        self.operation_ids.insert(id.clone());
        self.route_keys.insert(route_key, id.clone());
        self.routes.insert(
            id.clone(),
            RouteInfo {
                operation_id: id,
                method: spec.method,
                path: spec.path,
                openapi_path,
                summary: spec.summary,
                description: spec.description,
                group: spec.group,
                deprecated: spec.deprecated,
                params,
                request,
                responses,
            },
        );
        Ok(())
    }

    fn param_info(&self, operation_id: &str, spec: &ParamSpec) -> AppResult<ParamInfo> {
        Ok(ParamInfo {
            name: spec.name.clone(),
            location: spec.location,
            required: spec.required,
            rust_type: spec.type_ref.to_string(),
            field_type: self.resolve_type(operation_id, &spec.type_ref)?,
            pattern: None,
            description: spec.description.clone(),
            example: spec.example.clone(),
        })
    }
}
