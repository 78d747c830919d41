use apidoc_core::{
    build_openapi, dump_schema, parse_directory, write_outputs, ApiInfo, ApiRegistry, AppError,
    BodySpec, HttpMethod, MessageSpec, ParamSpec, RouteSpec, RustToJsonMapper, TopicParamSpec,
    TypeRef,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;

const MODELS: &str = r#"
use serde::{Deserialize, Serialize};

/// Outcome of a device operation.
#[derive(Serialize, Deserialize)]
pub struct Status(pub String);

impl Status {
    pub const OK: Status = Status("OK");
    pub const NOT_FOUND: Status = Status("NotFound");
    pub const ERROR: Status = Status("Error");
}

/// A registered device.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub device_id: Uuid,
    pub name: String,
    pub last_seen: Option<DateTime<Utc>>,
    pub sensors: Vec<Sensor>,
}
"#;

const SENSORS: &str = r#"
/// A sensor mounted on a device.
pub struct Sensor {
    pub kind: SensorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Temperature,
    /// Deprecated: use Temperature
    Thermal,
}

pub struct Reading {
    pub value: f64,
    pub labels: std::collections::BTreeMap<String, String>,
}

pub struct Internal {
    pub secret: String,
}
"#;

fn registry() -> ApiRegistry {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("models.rs"), MODELS).unwrap();
    fs::create_dir(dir.path().join("sensors")).unwrap();
    fs::write(dir.path().join("sensors/mod.rs"), SENSORS).unwrap();

    let catalog = parse_directory(dir.path(), &RustToJsonMapper::new()).unwrap();
    ApiRegistry::new(catalog)
}

#[test]
fn test_status_response_scenario() {
    let mut registry = registry();
    registry
        .register_route(
            RouteSpec::new("getStatus", HttpMethod::Get, "/status")
                .with_summary("Service status")
                .with_response(200, BodySpec::named("Status")),
        )
        .unwrap();

    let doc = build_openapi(&registry, &ApiInfo::new("Devices", "1.0.0")).unwrap();
    let status = &doc["components"]["schemas"]["Status"];
    assert_eq!(status["type"], "string");
    assert_eq!(status["enum"], json!(["OK", "NotFound", "Error"]));
    assert!(registry.catalog().get("Status").unwrap().used_by_http);
}

#[test]
fn test_mqtt_topic_scenario() {
    let mut registry = registry();
    registry
        .register_publication(
            MessageSpec::new(
                "sensorReading",
                "/devices/{deviceID}/sensors/{sensorType}",
                BodySpec::named("Reading"),
            )
            .with_summary("Periodic sensor reading")
            .with_param(TopicParamSpec::new("sensorType").with_type(TypeRef::named("SensorKind"))),
        )
        .unwrap();

    let publication = &registry.publications()["sensorReading"];
    assert_eq!(publication.topic_mqtt, "devices/+/sensors/+");
    let names: Vec<_> = publication.params.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["deviceID", "sensorType"]);
    assert!(registry.catalog().get("SensorKind").unwrap().used_by_mqtt);
    assert!(!registry.catalog().get("SensorKind").unwrap().used_by_http);
}

#[test]
fn test_full_pipeline_outputs() {
    let mut registry = registry();
    registry
        .register_route(
            RouteSpec::new("getDevice", HttpMethod::Get, "/devices/{deviceID}")
                .with_summary("Fetch a device")
                .with_group("devices")
                .with_param(ParamSpec::path("deviceID").with_type(TypeRef::named("Uuid")))
                .with_response(
                    200,
                    BodySpec::named("Device").with_example(
                        "full",
                        json!({
                            "deviceId": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
                            "name": "boiler",
                            "lastSeen": null,
                            "sensors": [{ "kind": "temperature" }]
                        }),
                    ),
                )
                .with_response(404, BodySpec::named("Status")),
        )
        .unwrap();
    registry
        .register_subscription(
            MessageSpec::new("deviceCommand", "devices/{deviceID}/commands", BodySpec::named("Status"))
                .with_summary("Command acknowledgements")
                .with_qos(1),
        )
        .unwrap();

    let migrations = tempfile::tempdir().unwrap();
    fs::write(
        migrations.path().join("001_init.sql"),
        "CREATE TABLE devices (id TEXT PRIMARY KEY, name TEXT NOT NULL);",
    )
    .unwrap();
    let database = dump_schema(migrations.path()).unwrap();

    let info = ApiInfo::new("Devices", "1.0.0").with_description("Device management API");
    let documentation = registry.finalize(&info, Some(database)).unwrap();
    let openapi = build_openapi(&registry, &info).unwrap();

    let device = &documentation.types["Device"];
    assert_eq!(device.references, vec!["Sensor"]);
    assert_eq!(documentation.types["Sensor"].referenced_by, vec!["Device"]);
    assert_eq!(documentation.types["SensorKind"].referenced_by, vec!["Sensor"]);
    assert!(documentation.types["SensorKind"].used_by_http);
    assert!(!documentation.types["Internal"].used_by_http);
    assert!(documentation.types["Status"].used_by_mqtt);

    let usages: Vec<_> = documentation.types["Status"]
        .usages
        .iter()
        .map(|u| u.operation_id.as_str())
        .collect();
    assert_eq!(usages, vec!["deviceCommand", "getDevice"]);

    let schemas = openapi["components"]["schemas"].as_object().unwrap();
    let names: Vec<_> = schemas.keys().cloned().collect();
    assert_eq!(names, vec!["Device", "Sensor", "SensorKind", "Status"]);
    assert_eq!(
        schemas["Device"]["required"],
        json!(["deviceId", "name", "sensors"])
    );
    assert_eq!(
        schemas["SensorKind"]["description"],
        "Possible values:\n- `temperature`\n- `thermal` (Deprecated: use Temperature)"
    );

    let representations = device.representations.as_ref().unwrap();
    assert_eq!(representations.example["name"], "boiler");
    assert!(representations.typescript.contains("lastSeen?: string | null;"));
    assert!(representations.source.contains("pub struct Device"));

    let out = tempfile::tempdir().unwrap();
    let json_path = out.path().join("docs/api.json");
    let yaml_path = out.path().join("docs/openapi.yaml");
    write_outputs(&documentation, &openapi, &json_path, &yaml_path).unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(written["database"]["tableCount"], 1);
    assert_eq!(written["http"]["getDevice"]["openapiPath"], "/devices/{deviceID}");
    assert_eq!(written["types"]["Status"]["kind"], "stringEnum");

    let yaml = fs::read_to_string(&yaml_path).unwrap();
    assert!(yaml.contains("openapi: 3.0.3"));
}

#[test]
fn test_parse_errors_reported_together() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("bad.rs"),
        r#"
        pub struct Callback { pub run: fn() }
        pub struct Any { pub value: Box<dyn std::any::Any> }
        pub struct Mode(pub String);
        impl Mode {
            pub const A: Mode = Mode("a");
            const B: Mode = Mode("b");
        }
        "#,
    )
    .unwrap();

    let err = parse_directory(dir.path(), &RustToJsonMapper::new()).unwrap_err();
    match err {
        AppError::Multiple(errors) => {
            assert_eq!(errors.len(), 3);
            let text = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("\n");
            assert!(text.contains("'Callback'"));
            assert!(text.contains("'Any'"));
            assert!(text.contains("mixes pub and private"));
        }
        other => panic!("expected joined errors, got {}", other),
    }
}
