//! # Reference Graph
//!
//! Fills `references` and `referenced_by` on every cataloged type.

use crate::catalog::{TypeCatalog, TypeInfo};
use crate::error::{AppError, AppResult};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Named types appearing in the fields (or alias target) of `info`.
pub fn direct_references(info: &TypeInfo) -> BTreeSet<String> {
    info.field_types()
        .flat_map(|ft| ft.named_types())
        .collect()
}

/// Computes the forward and inverse reference lists.
///
/// Cycles are legal, including a type referencing itself.
pub fn build_reference_graph(catalog: &mut TypeCatalog) -> AppResult<()> {
    let mut forward: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut errors = Vec::new();

    for info in catalog.iter() {
        let refs = direct_references(info);
        for name in &refs {
            if !catalog.contains(name) {
                errors.push(AppError::type_error(
                    &info.name,
                    format!("references uncataloged type '{}'", name),
                ));
            }
        }
        forward.insert(info.name.clone(), refs);
    }
    AppError::join(errors)?;

    let mut inverse: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (from, targets) in &forward {
        for to in targets {
            inverse.entry(to.clone()).or_default().insert(from.clone());
        }
    }

    for info in catalog.iter_mut() {
        info.references = forward
            .remove(&info.name)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
        info.referenced_by = inverse
            .remove(&info.name)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
    }

    debug!(types = catalog.len(), "Reference graph built");
    Ok(())
}
