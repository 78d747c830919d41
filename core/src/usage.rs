//! # Usage Tracking
//!
//! Records which operations use a type and marks everything reachable from it
//! as used by HTTP or MQTT.

use crate::catalog::{FieldType, TypeCatalog, UsageInfo};
use crate::graph::direct_references;
use serde::Serialize;

/// Transport an operation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// REST routes.
    Http,
    /// MQTT publications and subscriptions.
    Mqtt,
}

/// Marks `name` and every type it transitively references as used by `protocol`.
///
/// Already-marked types stop the walk, so repeated calls and cycles are harmless.
pub fn mark_used(catalog: &mut TypeCatalog, name: &str, protocol: Protocol) {
    let mut pending = vec![name.to_string()];

    while let Some(current) = pending.pop() {
        let Some(info) = catalog.get_mut(&current) else {
            continue;
        };
        let flag = match protocol {
            Protocol::Http => &mut info.used_by_http,
            Protocol::Mqtt => &mut info.used_by_mqtt,
        };
        if *flag {
            continue;
        }
        *flag = true;
        pending.extend(direct_references(info));
    }
}

/// Attaches `usage` to every named type inside `field_type` and marks them.
pub fn attach_usage(
    catalog: &mut TypeCatalog,
    field_type: &FieldType,
    usage: &UsageInfo,
    protocol: Protocol,
) {
    for name in field_type.named_types() {
        if let Some(info) = catalog.get_mut(&name) {
            info.usages.push(usage.clone());
        }
        mark_used(catalog, &name, protocol);
    }
}

/// Sorts and deduplicates every usage list.
pub fn normalize_usages(catalog: &mut TypeCatalog) {
    for info in catalog.iter_mut() {
        info.usages.sort();
        info.usages.dedup();
    }
}
