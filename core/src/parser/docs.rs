//! # Documentation
//!
//! Doc comment extraction and the `Deprecated:` marker convention.

use crate::parser::attributes::deprecated_note;
use regex::Regex;
use std::sync::OnceLock;

/// Description and deprecation message of a documented element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Documentation {
    /// Cleaned description.
    pub description: Option<String>,
    /// Deprecation message.
    pub deprecated: Option<String>,
}

/// Helper to extract `///` comments (`#[doc = "..."]` attributes).
pub fn extract_doc_comment(attrs: &[syn::Attribute]) -> Option<String> {
    let mut lines = Vec::new();

    for attr in attrs {
        let syn::Meta::NameValue(nv) = &attr.meta else {
            continue;
        };
        if !nv.path.is_ident("doc") {
            continue;
        }
        if let syn::Expr::Lit(syn::ExprLit {
            lit: syn::Lit::Str(s),
            ..
        }) = &nv.value
        {
            let text = s.value();
            lines.push(match text.strip_prefix(' ') {
                Some(stripped) => stripped.to_owned(),
                None => text,
            });
        }
    }

    let joined = lines.join("\n").trim().to_string();
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

/// Splits a description on a case-insensitive `Deprecated:` marker.
///
/// Returns `(description, deprecation)`. A marker followed by nothing is an error.
pub fn split_deprecation(
    description: Option<String>,
) -> Result<(Option<String>, Option<String>), String> {
    static MARKER_RE: OnceLock<Regex> = OnceLock::new();
    let marker_re =
        MARKER_RE.get_or_init(|| Regex::new(r"(?i)deprecated:").expect("Invalid regex"));

    let Some(text) = description else {
        return Ok((None, None));
    };
    let Some(found) = marker_re.find(&text) else {
        return Ok((Some(text), None));
    };

    let message = text[found.end()..].trim();
    if message.is_empty() {
        return Err("deprecation marker is not followed by a message".to_string());
    }
    let before = text[..found.start()].trim();
    let description = if before.is_empty() {
        None
    } else {
        Some(before.to_string())
    };
    Ok((description, Some(message.to_string())))
}

/// Collects description and deprecation from doc comments and `#[deprecated]`.
///
/// The doc comment marker wins over the attribute when both are present.
pub fn documentation(attrs: &[syn::Attribute]) -> Result<Documentation, String> {
    let (description, marker) = split_deprecation(extract_doc_comment(attrs))?;
    let attribute = deprecated_note(attrs)?;
    Ok(Documentation {
        description,
        deprecated: marker.or(attribute),
    })
}
