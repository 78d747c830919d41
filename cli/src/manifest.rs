//! # Operations Manifest
//!
//! Declarative list of routes, publications and subscriptions, read from YAML
//! or JSON and registered in one pass.

use apidoc_core::error::{AppError, AppResult};
use apidoc_core::registry::{ApiRegistry, MessageSpec, RouteSpec};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Every operation the documented service exposes.
#[derive(Debug, Default, Deserialize)]
pub struct OperationsManifest {
    /// HTTP routes.
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
    /// MQTT messages the service publishes.
    #[serde(default)]
    pub publications: Vec<MessageSpec>,
    /// MQTT messages the service consumes.
    #[serde(default)]
    pub subscriptions: Vec<MessageSpec>,
}

/// Reads a manifest. `.yaml` / `.yml` files are YAML, anything else JSON.
pub fn load_manifest(path: &Path) -> AppResult<OperationsManifest> {
    let content = fs::read_to_string(path).map_err(|e| {
        AppError::General(format!(
            "Failed to read operations manifest {:?}: {}",
            path, e
        ))
    })?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
    let manifest = match ext {
        "yaml" | "yml" => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };
    Ok(manifest)
}

/// Registers every operation. A rejected operation does not stop the others;
/// all rejections are returned together.
pub fn register_all(registry: &mut ApiRegistry, manifest: OperationsManifest) -> AppResult<()> {
    let mut errors = Vec::new();
    let total = manifest.routes.len() + manifest.publications.len() + manifest.subscriptions.len();

    for route in manifest.routes {
        if let Err(e) = registry.register_route(route) {
            warn!(error = %e, "Route rejected");
            errors.push(e);
        }
    }
    for publication in manifest.publications {
        if let Err(e) = registry.register_publication(publication) {
            warn!(error = %e, "Publication rejected");
            errors.push(e);
        }
    }
    for subscription in manifest.subscriptions {
        if let Err(e) = registry.register_subscription(subscription) {
            warn!(error = %e, "Subscription rejected");
            errors.push(e);
        }
    }

    info!(
        registered = total - errors.len(),
        rejected = errors.len(),
        "Operations registered"
    );
    AppError::join(errors)
}
