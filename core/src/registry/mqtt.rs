//! # MQTT Operations
//!
//! Publications and subscriptions. Topics are documented with `{param}`
//! placeholders and handed to the broker with `+` wildcards.

use crate::catalog::{FieldType, UsageInfo, UsageRole};
use crate::error::{AppError, AppResult};
use crate::registry::{ApiRegistry, BodyInfo, BodySpec, TypeRef};
use crate::usage::{attach_usage, Protocol};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Highest QoS level defined by MQTT.
pub const MAX_QOS: u8 = 2;

/// Documentation of one topic placeholder.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopicParamSpec {
    /// Placeholder name.
    pub name: String,
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

impl TopicParamSpec {
    /// A string placeholder.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_ref: TypeRef::default(),
            description: None,
            example: None,
        }
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
}

/// A publication or subscription as declared by its author.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSpec {
    /// Unique operation id.
    pub operation_id: String,
    /// Topic with `{param}` placeholders.
    pub topic: String,
    /// One-line summary.
    #[serde(default)]
    pub summary: String,
    /// Longer description.
    #[serde(default)]
    pub description: Option<String>,
    /// Group.
    #[serde(default)]
    pub group: Option<String>,
    /// Deprecation message.
    #[serde(default)]
    pub deprecated: Option<String>,
    /// Quality of service.
    #[serde(default)]
    pub qos: u8,
    /// Retained flag.
    #[serde(default)]
    pub retained: bool,
    /// Placeholder documentation. Undocumented placeholders are strings.
    #[serde(default)]
    pub params: Vec<TopicParamSpec>,
    /// The payload.
    pub message: BodySpec,
}

impl MessageSpec {
    /// Creates an operation with the required identity fields.
    pub fn new(operation_id: impl Into<String>, topic: impl Into<String>, message: BodySpec) -> Self {
        Self {
            operation_id: operation_id.into(),
            topic: topic.into(),
            summary: String::new(),
            description: None,
            group: None,
            deprecated: None,
            qos: 0,
            retained: false,
            params: Vec::new(),
            message,
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

    /// Marks the operation deprecated.
    pub fn with_deprecated(mut self, message: impl Into<String>) -> Self {
        self.deprecated = Some(message.into());
        self
    }

    /// Sets the QoS level.
    pub fn with_qos(mut self, qos: u8) -> Self {
        self.qos = qos;
        self
    }

    /// Sets the retained flag.
    pub fn retained(mut self) -> Self {
        self.retained = true;
        self
    }

    /// Documents a placeholder.
    pub fn with_param(mut self, param: TopicParamSpec) -> Self {
        self.params.push(param);
        self
    }
}

/// A validated topic placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicParamInfo {
    /// Placeholder name.
    pub name: String,
    /// The declared Rust type.
    pub rust_type: String,
    /// Resolved type descriptor.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Example value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
}

/// A registered publication or subscription.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MqttOperationInfo {
    /// Unique operation id.
    pub operation_id: String,
    /// Documented topic.
    pub topic: String,
    /// Broker topic with `+` wildcards.
    #[serde(rename = "topicMQTT")]
    pub topic_mqtt: String,
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
    /// Quality of service.
    pub qos: u8,
    /// Retained flag.
    pub retained: bool,
    /// Placeholders in topic order.
    pub params: Vec<TopicParamInfo>,
    /// The payload.
    pub message: BodyInfo,
}

/// A message the service publishes.
pub type MqttPublicationInfo = MqttOperationInfo;

/// A message the service consumes.
pub type MqttSubscriptionInfo = MqttOperationInfo;

/// Splits a documented topic into the broker topic and its placeholder names.
///
/// `/devices/{deviceID}/sensors/{sensorType}` becomes `devices/+/sensors/+`
/// with `deviceID` and `sensorType`.
pub fn parse_topic(topic: &str) -> Result<(String, Vec<String>), String> {
    let trimmed = topic.strip_prefix('/').unwrap_or(topic);
    if trimmed.is_empty() {
        return Err("topic is empty".to_string());
    }

    let mut levels = Vec::new();
    let mut params: Vec<String> = Vec::new();
    for level in trimmed.split('/') {
        if level.contains('+') || level.contains('#') {
            return Err(format!(
                "topic '{}' must use {{param}} placeholders instead of wildcards",
                topic
            ));
        }
        let is_placeholder = level.starts_with('{') && level.ends_with('}') && level.len() > 2;
        if is_placeholder {
            let name = &level[1..level.len() - 1];
            if name.contains('{') || name.contains('}') {
                return Err(format!("malformed placeholder '{}' in topic '{}'", level, topic));
            }
            if params.iter().any(|p| p == name) {
                return Err(format!("placeholder '{}' appears twice in topic '{}'", name, topic));
            }
            params.push(name.to_string());
            levels.push("+");
        } else if level.contains('{') || level.contains('}') {
            return Err(format!(
                "placeholder in '{}' must fill a whole topic level in '{}'",
                level, topic
            ));
        } else {
            levels.push(level);
        }
    }

    Ok((levels.join("/"), params))
}

impl ApiRegistry {
    /// Validates and registers a message the service publishes.
    pub fn register_publication(&mut self, spec: MessageSpec) -> AppResult<()> {
        let info = self.mqtt_operation(spec, UsageRole::Publication)?;
        self.publications.insert(info.operation_id.clone(), info);
        Ok(())
    }

    /// Validates and registers a message the service consumes.
    pub fn register_subscription(&mut self, spec: MessageSpec) -> AppResult<()> {
        let info = self.mqtt_operation(spec, UsageRole::Subscription)?;
        self.subscriptions.insert(info.operation_id.clone(), info);
        Ok(())
    }

    fn mqtt_operation(&mut self, spec: MessageSpec, role: UsageRole) -> AppResult<MqttOperationInfo> {
        let id = spec.operation_id.clone();
        self.check_operation_id(&id)?;
        if spec.summary.trim().is_empty() {
            return Err(AppError::registration(&id, "summary is required"));
        }
        if spec.qos > MAX_QOS {
            return Err(AppError::registration(
                &id,
                format!("QoS must be 0, 1 or 2, got {}", spec.qos),
            ));
        }

        let (topic_mqtt, names) =
            parse_topic(&spec.topic).map_err(|msg| AppError::registration(&id, msg))?;
        if let Some(extra) = spec.params.iter().find(|p| !names.contains(&p.name)) {
            return Err(AppError::registration(
                &id,
                format!("parameter '{}' does not appear in the topic", extra.name),
            ));
        }

        let mut params = Vec::with_capacity(names.len());
        for name in &names {
            let declared = spec.params.iter().find(|p| &p.name == name);
            let type_ref = declared.map(|p| p.type_ref.clone()).unwrap_or_default();
            params.push(TopicParamInfo {
                name: name.clone(),
                rust_type: type_ref.to_string(),
                field_type: self.resolve_type(&id, &type_ref)?,
                description: declared.and_then(|p| p.description.clone()),
                example: declared.and_then(|p| p.example.clone()),
            });
        }

        if spec.message.type_ref.is_none() {
            return Err(AppError::registration(&id, "message needs a type"));
        }
        let message = self.body_info(&id, &spec.message)?;

        for param in &params {
            attach_usage(
                &mut self.catalog,
                &param.field_type,
                &UsageInfo {
                    operation_id: id.clone(),
                    role: UsageRole::Parameter,
                },
                Protocol::Mqtt,
            );
        }
        if let Some(ft) = &message.field_type {
            attach_usage(
                &mut self.catalog,
                ft,
                &UsageInfo {
                    operation_id: id.clone(),
                    role,
                },
                Protocol::Mqtt,
            );
        }

        debug!(operation_id = %id, topic = %topic_mqtt, "Registered MQTT operation");
        self.operation_ids.insert(id.clone());
        Ok(MqttOperationInfo {
            operation_id: id,
            topic: spec.topic,
            topic_mqtt,
            summary: spec.summary,
            description: spec.description,
            group: spec.group,
            deprecated: spec.deprecated,
            qos: spec.qos,
            retained: spec.retained,
            params,
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_translation() {
        let (mqtt, params) = parse_topic("/devices/{deviceID}/sensors/{sensorType}").unwrap();
        assert_eq!(mqtt, "devices/+/sensors/+");
        assert_eq!(params, vec!["deviceID", "sensorType"]);

        let (mqtt, params) = parse_topic("status/online").unwrap();
        assert_eq!(mqtt, "status/online");
        assert!(params.is_empty());
    }

    #[test]
    fn test_topic_rejections() {
        assert!(parse_topic("/").is_err());
        assert!(parse_topic("devices/+/status").is_err());
        assert!(parse_topic("devices/#").is_err());
        assert!(parse_topic("devices/id-{id}").is_err());
        assert!(parse_topic("a/{x}/b/{x}").is_err());
    }
}
