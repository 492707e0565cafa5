//! Typed bundle descriptor parser.
//!
//! A descriptor is a line-oriented `key="value"` file (`bundle.conf`) inside
//! each bundle directory. Known keys map to typed fields with explicit
//! defaults; unknown keys are retained for [`config_value`] lookups and are
//! ignored by contract, never an error.
//!
//! [`config_value`]: crate::registry::BundleRegistry::config_value

use crate::error::RegistryError;

/// Default execution/tie-break priority when a descriptor omits `order`.
pub const DEFAULT_ORDER: i32 = 50;

/// Parsed bundle metadata.
///
/// Created by scanning disk at registry-load time; immutable for the
/// process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleDescriptor {
    /// Unique id, equal to the bundle's source directory name.
    pub id: String,
    /// Human-readable name (`name` key; defaults to the id).
    pub display_name: String,
    /// One-line description (`description` key; defaults to empty).
    pub description: String,
    /// Execution/tie-break priority (`order` key; default 50).
    pub order: i32,
    /// Ids of bundles that must be applied first (`requires` key,
    /// comma-separated, declared order preserved).
    pub requires: Vec<String>,
    /// Hidden from listings (`hidden` key; default false).
    pub hidden: bool,
    /// Eligible for installation (`enabled` key; default true).
    pub enabled: bool,
    /// All raw key/value pairs in file order, including unknown keys.
    pub raw: Vec<(String, String)>,
}

impl BundleDescriptor {
    /// A descriptor with every field defaulted, for bundle directories that
    /// carry no `bundle.conf`.
    #[must_use]
    pub fn with_defaults(id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: id.to_string(),
            description: String::new(),
            order: DEFAULT_ORDER,
            requires: Vec::new(),
            hidden: false,
            enabled: true,
            raw: Vec::new(),
        }
    }

    /// Look up a raw descriptor value by key (first occurrence wins).
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.raw
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse descriptor content for the bundle `id`.
///
/// # Errors
///
/// Returns [`RegistryError::Descriptor`] if a non-comment line is not a
/// `key=value` pair. Malformed typed values (`order`, booleans) fall back
/// to their defaults rather than failing the whole bundle.
pub fn parse(id: &str, path: &std::path::Path, content: &str) -> Result<BundleDescriptor, RegistryError> {
    let mut descriptor = BundleDescriptor::with_defaults(id);

    for (line_num, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, value)) = trimmed.split_once('=') else {
            return Err(RegistryError::Descriptor {
                path: path.to_path_buf(),
                message: format!("not a key=value pair at line {}: {trimmed}", line_num + 1),
            });
        };
        let key = key.trim();
        let value = unquote(value.trim());

        match key {
            "name" => descriptor.display_name = value.to_string(),
            "description" => descriptor.description = value.to_string(),
            "order" => {
                descriptor.order = value.parse().unwrap_or(DEFAULT_ORDER);
            }
            "requires" => {
                descriptor.requires = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "hidden" => descriptor.hidden = parse_bool(value, false),
            "enabled" => descriptor.enabled = parse_bool(value, true),
            _ => {} // unknown keys are data, not errors
        }
        descriptor.raw.push((key.to_string(), value.to_string()));
    }

    Ok(descriptor)
}

/// Strip one layer of matching single or double quotes.
fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return value.get(1..value.len() - 1).unwrap_or(value);
        }
    }
    value
}

/// Lenient boolean parse: `true`/`false` (any case), otherwise the default.
fn parse_bool(value: &str, default: bool) -> bool {
    match value.to_ascii_lowercase().as_str() {
        "true" => true,
        "false" => false,
        _ => default,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::path::Path;

    fn parse_str(id: &str, content: &str) -> Result<BundleDescriptor, RegistryError> {
        parse(id, Path::new("bundle.conf"), content)
    }

    #[test]
    fn empty_content_yields_defaults() {
        let d = parse_str("vim", "").unwrap();
        assert_eq!(d, BundleDescriptor::with_defaults("vim"));
        assert_eq!(d.order, DEFAULT_ORDER);
        assert!(d.enabled);
        assert!(!d.hidden);
    }

    #[test]
    fn full_descriptor() {
        let content = r#"
name="Vim editor"
description="Editor config and plugins"
order=10
requires=core, shell
hidden=false
enabled=true
"#;
        let d = parse_str("vim", content).unwrap();
        assert_eq!(d.display_name, "Vim editor");
        assert_eq!(d.description, "Editor config and plugins");
        assert_eq!(d.order, 10);
        assert_eq!(d.requires, vec!["core", "shell"]);
        assert!(!d.hidden);
        assert!(d.enabled);
    }

    #[test]
    fn comments_and_blank_lines_skipped() {
        let d = parse_str("x", "# a comment\n\nname=\"X\"\n").unwrap();
        assert_eq!(d.display_name, "X");
    }

    #[test]
    fn unknown_keys_retained_not_rejected() {
        let d = parse_str("x", "flavour=\"spicy\"\n").unwrap();
        assert_eq!(d.value("flavour"), Some("spicy"));
        assert_eq!(d.value("missing"), None);
    }

    #[test]
    fn requires_preserves_declared_order() {
        let d = parse_str("x", "requires=b, a, c\n").unwrap();
        assert_eq!(d.requires, vec!["b", "a", "c"]);
    }

    #[test]
    fn malformed_order_falls_back_to_default() {
        let d = parse_str("x", "order=soon\n").unwrap();
        assert_eq!(d.order, DEFAULT_ORDER);
    }

    #[test]
    fn malformed_bool_falls_back_to_default() {
        let d = parse_str("x", "enabled=maybe\nhidden=maybe\n").unwrap();
        assert!(d.enabled);
        assert!(!d.hidden);
    }

    #[test]
    fn line_without_equals_is_an_error() {
        let err = parse_str("x", "name=\"ok\"\njust some words\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn single_quotes_stripped() {
        let d = parse_str("x", "name='Quoted'\n").unwrap();
        assert_eq!(d.display_name, "Quoted");
    }

    #[test]
    fn unquoted_values_accepted() {
        let d = parse_str("x", "name=Plain\n").unwrap();
        assert_eq!(d.display_name, "Plain");
    }

    #[test]
    fn empty_requires_yields_empty_list() {
        let d = parse_str("x", "requires=\n").unwrap();
        assert!(d.requires.is_empty());
    }

    #[test]
    fn enabled_false_parsed() {
        let d = parse_str("x", "enabled=false\n").unwrap();
        assert!(!d.enabled);
    }

    #[test]
    fn bool_parse_case_insensitive() {
        let d = parse_str("x", "hidden=TRUE\n").unwrap();
        assert!(d.hidden);
    }
}
