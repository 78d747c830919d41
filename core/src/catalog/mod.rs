//! # Type Catalog
//!
//! The container every pipeline stage reads from and writes to: a sorted map
//! of type name to [`TypeInfo`], plus the syntax items each type was declared by.

pub mod models;

pub use models::{
    EnumLiteral, EnumValue, FieldInfo, FieldType, JsonType, Representations, TypeInfo, TypeKind,
    TypeShape, UsageInfo, UsageRole,
};

use crate::error::{AppError, AppResult};
use std::collections::{BTreeMap, BTreeSet};

/// Name → type mapping with the declaring syntax items.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: BTreeMap<String, TypeInfo>,
    sources: BTreeMap<String, Vec<syn::Item>>,
}

impl TypeCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a type. A name may only be declared once.
    pub fn insert(&mut self, info: TypeInfo) -> AppResult<()> {
        if self.types.contains_key(&info.name) {
            return Err(AppError::type_error(
                &info.name,
                "type is declared more than once",
            ));
        }
        self.types.insert(info.name.clone(), info);
        Ok(())
    }

    /// Looks up a type.
    pub fn get(&self, name: &str) -> Option<&TypeInfo> {
        self.types.get(name)
    }

    /// Looks up a type mutably.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut TypeInfo> {
        self.types.get_mut(name)
    }

    /// Whether the type is cataloged.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of cataloged types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Sorted type names.
    pub fn names(&self) -> Vec<String> {
        self.types.keys().cloned().collect()
    }

    /// Iterates types in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.types.values()
    }

    /// Iterates types mutably in name order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TypeInfo> {
        self.types.values_mut()
    }

    /// The underlying sorted map.
    pub fn types(&self) -> &BTreeMap<String, TypeInfo> {
        &self.types
    }

    /// Records a syntax item contributing to the declaration of `name`.
    pub fn record_source(&mut self, name: &str, item: syn::Item) {
        self.sources.entry(name.to_string()).or_default().push(item);
    }

    /// The syntax items recorded for `name`.
    pub fn sources(&self, name: &str) -> Option<&[syn::Item]> {
        self.sources.get(name).map(Vec::as_slice)
    }

    /// Rewrites references to enum types into enum references and reports
    /// every reference that does not name a cataloged type.
    pub fn resolve_references(&mut self) -> AppResult<()> {
        let enums: BTreeSet<String> = self
            .types
            .values()
            .filter(|t| t.is_enum())
            .map(|t| t.name.clone())
            .collect();
        let known: BTreeSet<String> = self.types.keys().cloned().collect();
        let string_keys: BTreeSet<String> = self
            .types
            .values()
            .filter(|t| t.is_string_keyable())
            .map(|t| t.name.clone())
            .collect();
        let names = KnownNames {
            enums: &enums,
            known: &known,
            string_keys: &string_keys,
        };

        let mut errors = Vec::new();
        for info in self.types.values_mut() {
            let owner = info.name.clone();
            let field_names: Vec<String> = info.fields.iter().map(|f| f.name.clone()).collect();
            let has_alias = info.alias_of.is_some();

            for (idx, ft) in info.field_types_mut().enumerate() {
                let location = if has_alias && idx == field_names.len() {
                    "aliased type".to_string()
                } else {
                    format!("field '{}'", field_names[idx])
                };
                resolve_field_type(ft, &names, &owner, &location, &mut errors);
            }
        }
        AppError::join(errors)
    }

    /// Resolves a descriptor built outside the catalog, such as an operation
    /// body or parameter type. Returns the first unknown name as an error.
    pub fn resolve_type(&self, ft: &mut FieldType) -> Result<(), String> {
        match &mut ft.shape {
            TypeShape::Primitive { .. } => Ok(()),
            TypeShape::Array { items } => self.resolve_type(items),
            TypeShape::Map { key, values } => {
                if let Some(key) = key {
                    match self.types.get(key.as_str()) {
                        None => return Err(format!("unknown type '{}'", key)),
                        Some(info) if !info.is_string_keyable() => {
                            return Err(format!(
                                "map key '{}' is not a string enum or string alias",
                                key
                            ))
                        }
                        Some(_) => {}
                    }
                }
                self.resolve_type(values)
            }
            TypeShape::Reference { name } | TypeShape::Enum { name } => {
                let Some(info) = self.types.get(name.as_str()) else {
                    return Err(format!("unknown type '{}'", name));
                };
                ft.shape = if info.is_enum() {
                    TypeShape::Enum {
                        name: info.name.clone(),
                    }
                } else {
                    TypeShape::Reference {
                        name: info.name.clone(),
                    }
                };
                Ok(())
            }
        }
    }
}

struct KnownNames<'a> {
    enums: &'a BTreeSet<String>,
    known: &'a BTreeSet<String>,
    string_keys: &'a BTreeSet<String>,
}

fn resolve_field_type(
    ft: &mut FieldType,
    names: &KnownNames<'_>,
    owner: &str,
    location: &str,
    errors: &mut Vec<AppError>,
) {
    match &mut ft.shape {
        TypeShape::Primitive { .. } => {}
        TypeShape::Array { items } => resolve_field_type(items, names, owner, location, errors),
        TypeShape::Map { key, values } => {
            if let Some(key) = key {
                if !names.known.contains(key.as_str()) {
                    errors.push(AppError::type_error(
                        owner,
                        format!("{} references unknown type '{}'", location, key),
                    ));
                } else if !names.string_keys.contains(key.as_str()) {
                    errors.push(AppError::type_error(
                        owner,
                        format!(
                            "{} uses '{}' as a map key; keys must be string enums or string aliases",
                            location, key
                        ),
                    ));
                }
            }
            resolve_field_type(values, names, owner, location, errors)
        }
        TypeShape::Reference { name } => {
            if names.enums.contains(name.as_str()) {
                ft.shape = TypeShape::Enum { name: name.clone() };
            } else if !names.known.contains(name.as_str()) {
                errors.push(AppError::type_error(
                    owner,
                    format!("{} references unknown type '{}'", location, name),
                ));
            }
        }
        TypeShape::Enum { name } => {
            if !names.enums.contains(name.as_str()) {
                errors.push(AppError::type_error(
                    owner,
                    format!("{} references '{}' which is not an enum", location, name),
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(name: &str, fields: Vec<(&str, FieldType)>) -> TypeInfo {
        let mut info = TypeInfo::new(name, TypeKind::Object);
        for (field, ft) in fields {
            info.fields.push(FieldInfo {
                name: field.into(),
                rust_name: field.into(),
                nullable: ft.nullable,
                required: !ft.nullable,
                field_type: ft,
                display: String::new(),
                description: None,
                deprecated: None,
            });
        }
        info
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut catalog = TypeCatalog::new();
        catalog.insert(TypeInfo::new("A", TypeKind::Object)).unwrap();
        let err = catalog
            .insert(TypeInfo::new("A", TypeKind::Alias))
            .unwrap_err();
        assert!(err.to_string().contains("declared more than once"));
    }

    #[test]
    fn test_resolve_rewrites_enum_references() {
        let mut catalog = TypeCatalog::new();
        catalog
            .insert(TypeInfo::new("Status", TypeKind::StringEnum))
            .unwrap();
        catalog
            .insert(object(
                "Reply",
                vec![(
                    "statuses",
                    FieldType::array(FieldType::reference("Status")),
                )],
            ))
            .unwrap();

        catalog.resolve_references().unwrap();

        let reply = catalog.get("Reply").unwrap();
        match &reply.fields[0].field_type.shape {
            TypeShape::Array { items } => {
                assert_eq!(
                    items.shape,
                    TypeShape::Enum {
                        name: "Status".into()
                    }
                );
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_reports_all_unknown_references() {
        let mut catalog = TypeCatalog::new();
        catalog
            .insert(object("A", vec![("x", FieldType::reference("Missing"))]))
            .unwrap();
        catalog
            .insert(object("B", vec![("y", FieldType::reference("Gone"))]))
            .unwrap();

        let err = catalog.resolve_references().unwrap_err();
        match err {
            AppError::Multiple(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected joined errors, got {}", other),
        }
    }

    #[test]
    fn test_map_keys_must_be_string_like() {
        let mut catalog = TypeCatalog::new();
        catalog.insert(TypeInfo::new("Region", TypeKind::StringEnum)).unwrap();
        catalog.insert(object("Point", vec![])).unwrap();
        catalog
            .insert(object(
                "Stats",
                vec![
                    ("byRegion", FieldType::keyed_map("Region", FieldType::reference("Point"))),
                    ("byPoint", FieldType::keyed_map("Point", FieldType::reference("Region"))),
                ],
            ))
            .unwrap();

        let err = catalog.resolve_references().unwrap_err();
        let text = err.to_string();
        assert!(text.contains("field 'byPoint' uses 'Point' as a map key"));
        assert!(!text.contains("byRegion"));

        let mut ft = FieldType::keyed_map("Point", FieldType::reference("Region"));
        assert!(catalog.resolve_type(&mut ft).unwrap_err().contains("map key 'Point'"));
    }

    #[test]
    fn test_resolve_external_descriptor() {
        let mut catalog = TypeCatalog::new();
        catalog
            .insert(TypeInfo::new("Status", TypeKind::StringEnum))
            .unwrap();

        let mut ft = FieldType::array(FieldType::reference("Status"));
        catalog.resolve_type(&mut ft).unwrap();
        assert_eq!(
            ft.named_types().into_iter().collect::<Vec<_>>(),
            vec!["Status".to_string()]
        );
        assert!(matches!(
            ft.shape,
            TypeShape::Array { ref items } if matches!(items.shape, TypeShape::Enum { .. })
        ));

        let mut missing = FieldType::reference("Nope");
        assert_eq!(
            catalog.resolve_type(&mut missing),
            Err("unknown type 'Nope'".to_string())
        );
    }
}
