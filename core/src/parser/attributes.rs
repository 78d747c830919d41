//! # Attribute Operations
//!
//! internal logic for parsing `#[serde(...)]`, `#[deprecated]` and `#[cfg(...)]` attributes.

use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutyKebabCase, ToShoutySnakeCase, ToSnakeCase,
    ToUpperCamelCase,
};
use regex::Regex;
use std::sync::OnceLock;

/// Serde `rename_all` rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    /// `lowercase`
    Lower,
    /// `UPPERCASE`
    Upper,
    /// `PascalCase`
    Pascal,
    /// `camelCase`
    Camel,
    /// `snake_case`
    Snake,
    /// `SCREAMING_SNAKE_CASE`
    ScreamingSnake,
    /// `kebab-case`
    Kebab,
    /// `SCREAMING-KEBAB-CASE`
    ScreamingKebab,
}

impl RenameRule {
    /// Parses the serde spelling of a rule.
    pub fn parse(rule: &str) -> Option<Self> {
        match rule {
            "lowercase" => Some(RenameRule::Lower),
            "UPPERCASE" => Some(RenameRule::Upper),
            "PascalCase" => Some(RenameRule::Pascal),
            "camelCase" => Some(RenameRule::Camel),
            "snake_case" => Some(RenameRule::Snake),
            "SCREAMING_SNAKE_CASE" => Some(RenameRule::ScreamingSnake),
            "kebab-case" => Some(RenameRule::Kebab),
            "SCREAMING-KEBAB-CASE" => Some(RenameRule::ScreamingKebab),
            _ => None,
        }
    }

    /// Applies the rule to a field or variant name.
    pub fn apply(&self, name: &str) -> String {
        match self {
            RenameRule::Lower => name.to_lowercase(),
            RenameRule::Upper => name.to_uppercase(),
            RenameRule::Pascal => name.to_upper_camel_case(),
            RenameRule::Camel => name.to_lower_camel_case(),
            RenameRule::Snake => name.to_snake_case(),
            RenameRule::ScreamingSnake => name.to_shouty_snake_case(),
            RenameRule::Kebab => name.to_kebab_case(),
            RenameRule::ScreamingKebab => name.to_shouty_kebab_case(),
        }
    }
}

/// Serde configuration extracted from a single item, field or variant.
#[derive(Default, Debug)]
pub struct AttrInfo {
    /// The rename value if present.
    pub rename: Option<String>,
    /// The raw `rename_all` value if present.
    pub rename_all: Option<String>,
    /// `skip` / `skip_serializing`.
    pub is_skipped: bool,
    /// `default` / `skip_serializing_if`: the field may be absent.
    pub is_optional: bool,
    /// `flatten`.
    pub is_flattened: bool,
}

/// Analyzes attributes to find `serde` configuration.
pub fn extract_attributes(attrs: &[syn::Attribute]) -> AttrInfo {
    let mut info = AttrInfo::default();

    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        if let syn::Meta::List(list) = &attr.meta {
            parse_attribute_content(&list.tokens.to_string(), &mut info);
        }
    }

    info
}

/// Parses the inner content of a serde attribute.
fn parse_attribute_content(content: &str, info: &mut AttrInfo) {
    static RENAME_RE: OnceLock<Regex> = OnceLock::new();
    let rename_re = RENAME_RE
        .get_or_init(|| Regex::new(r#"\brename\s*=\s*"([^"]+)""#).expect("Invalid regex"));

    static RENAME_ALL_RE: OnceLock<Regex> = OnceLock::new();
    let rename_all_re = RENAME_ALL_RE
        .get_or_init(|| Regex::new(r#"\brename_all\s*=\s*"([^"]+)""#).expect("Invalid regex"));

    static SKIP_RE: OnceLock<Regex> = OnceLock::new();
    let skip_re = SKIP_RE
        .get_or_init(|| Regex::new(r#"\b(skip|skip_serializing)\b"#).expect("Invalid regex"));

    static OPTIONAL_RE: OnceLock<Regex> = OnceLock::new();
    let optional_re = OPTIONAL_RE
        .get_or_init(|| Regex::new(r#"\b(default|skip_serializing_if)\b"#).expect("Invalid regex"));

    static FLATTEN_RE: OnceLock<Regex> = OnceLock::new();
    let flatten_re =
        FLATTEN_RE.get_or_init(|| Regex::new(r#"\bflatten\b"#).expect("Invalid regex"));

    if let Some(val) = rename_re.captures(content).and_then(|caps| caps.get(1)) {
        info.rename = Some(val.as_str().to_string());
    }

    if let Some(val) = rename_all_re.captures(content).and_then(|caps| caps.get(1)) {
        info.rename_all = Some(val.as_str().to_string());
    }

    if skip_re.is_match(content) {
        info.is_skipped = true;
    }

    if optional_re.is_match(content) {
        info.is_optional = true;
    }

    if flatten_re.is_match(content) {
        info.is_flattened = true;
    }
}

/// Reads `#[deprecated]` attributes.
///
/// Returns `Ok(None)` without the attribute and `Ok(Some(note))` with a note.
/// A `#[deprecated]` that carries no message is an error.
pub fn deprecated_note(attrs: &[syn::Attribute]) -> Result<Option<String>, String> {
    static NOTE_RE: OnceLock<Regex> = OnceLock::new();
    let note_re =
        NOTE_RE.get_or_init(|| Regex::new(r#"\bnote\s*=\s*"([^"]*)""#).expect("Invalid regex"));

    for attr in attrs {
        if !attr.path().is_ident("deprecated") {
            continue;
        }
        let note = match &attr.meta {
            syn::Meta::Path(_) => None,
            syn::Meta::NameValue(nv) => match &nv.value {
                syn::Expr::Lit(syn::ExprLit {
                    lit: syn::Lit::Str(s),
                    ..
                }) => Some(s.value()),
                _ => None,
            },
            syn::Meta::List(list) => note_re
                .captures(&list.tokens.to_string())
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string()),
        };
        return match note.map(|n| n.trim().to_string()) {
            Some(n) if !n.is_empty() => Ok(Some(n)),
            _ => Err("#[deprecated] needs a note explaining the replacement".to_string()),
        };
    }
    Ok(None)
}

/// Whether the attributes gate the item behind `#[cfg(test)]`.
pub fn is_test_only(attrs: &[syn::Attribute]) -> bool {
    static TEST_RE: OnceLock<Regex> = OnceLock::new();
    let test_re = TEST_RE.get_or_init(|| Regex::new(r#"\btest\b"#).expect("Invalid regex"));

    attrs.iter().any(|attr| {
        attr.path().is_ident("cfg")
            && matches!(&attr.meta, syn::Meta::List(list) if test_re.is_match(&list.tokens.to_string()))
    })
}
