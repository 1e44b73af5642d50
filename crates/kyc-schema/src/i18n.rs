//! # Localized Messages
//!
//! Violations carry message keys, never display text. A [`Translate`]
//! implementation turns an ordered list of candidate keys into text; the
//! bundled [`MessageCatalog`] reads a namespaced YAML catalog.
//!
//! Lookup for a violation on `controllerIds.0.value` of kind `required`:
//!
//! 1. `onboarding:fields.controllerIds.value.validation.required`
//! 2. `common:validation.required`

use std::collections::HashMap;
use std::path::Path;

use serde_yaml::Value as Yaml;

use crate::error::SchemaError;
use crate::validate::Violation;

const BUILTIN_EN: &str = include_str!("../config/messages.en.yaml");

/// Message lookup. Total: an unknown key set still yields a string.
pub trait Translate: Send + Sync {
    /// Text of the first key in `keys` that has a message, with `{name}`
    /// placeholders replaced from `params`. When no key matches, the last
    /// key is returned verbatim.
    fn translate(&self, keys: &[String], params: &[(&str, String)]) -> String;
}

/// Flattened `namespace:dotted.key` → message map.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    messages: HashMap<String, String>,
}

impl MessageCatalog {
    /// The bundled English catalog.
    pub fn builtin_en() -> Result<Self, SchemaError> {
        Self::from_yaml_str("messages.en.yaml", BUILTIN_EN)
    }

    /// Parse a catalog document.
    pub fn from_yaml_str(name: &str, yaml: &str) -> Result<Self, SchemaError> {
        let doc: Yaml = serde_yaml::from_str(yaml).map_err(|e| SchemaError::SchemaLoadError {
            schema_name: name.to_string(),
            reason: format!("invalid message catalog: {e}"),
        })?;
        let Yaml::Mapping(namespaces) = doc else {
            return Err(SchemaError::SchemaLoadError {
                schema_name: name.to_string(),
                reason: "message catalog must be a mapping of namespaces".into(),
            });
        };
        let mut messages = HashMap::new();
        for (ns, body) in &namespaces {
            if let Some(ns) = ns.as_str() {
                flatten(&format!("{ns}:"), body, &mut messages);
            }
        }
        Ok(Self { messages })
    }

    /// Read a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&path.display().to_string(), &yaml)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn flatten(prefix: &str, node: &Yaml, out: &mut HashMap<String, String>) {
    match node {
        Yaml::Mapping(map) => {
            for (k, v) in map {
                let Some(k) = k.as_str() else { continue };
                let key = if prefix.ends_with(':') {
                    format!("{prefix}{k}")
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&key, v, out);
            }
        }
        Yaml::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        _ => {}
    }
}

impl Translate for MessageCatalog {
    fn translate(&self, keys: &[String], params: &[(&str, String)]) -> String {
        let Some(template) = keys.iter().find_map(|k| self.get(k)) else {
            return keys.last().cloned().unwrap_or_default();
        };
        params
            .iter()
            .fold(template.to_string(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}

/// Candidate message keys for `violation`, most specific first.
pub fn message_keys(violation: &Violation) -> Vec<String> {
    let kind = violation.kind.message_key();
    let field: Vec<&str> = violation
        .field
        .split('.')
        .filter(|s| !s.is_empty() && s.parse::<usize>().is_err())
        .collect();
    let mut keys = Vec::with_capacity(2);
    if !field.is_empty() {
        keys.push(format!("onboarding:fields.{}.validation.{kind}", field.join(".")));
    }
    keys.push(format!("common:validation.{kind}"));
    keys
}

/// Localized text for `violation`.
pub fn localize(violation: &Violation, translator: &dyn Translate) -> String {
    let params: Vec<(&str, String)> = violation
        .kind
        .count()
        .map(|n| vec![("count", n.to_string())])
        .unwrap_or_default();
    translator.translate(&message_keys(violation), &params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::ViolationKind;
    use std::io::Write;

    fn violation(field: &str, kind: ViolationKind) -> Violation {
        Violation::refinement("test", field, kind, "")
    }

    #[test]
    fn field_specific_message_wins() {
        let catalog = MessageCatalog::builtin_en().unwrap();
        let v = violation("organizationIds", ViolationKind::TooMany { limit: 6 });
        assert_eq!(localize(&v, &catalog), "You can add up to 6 identifiers");
    }

    #[test]
    fn falls_back_to_common_messages() {
        let catalog = MessageCatalog::builtin_en().unwrap();
        let v = violation("controllerFirstName", ViolationKind::Required);
        assert_eq!(localize(&v, &catalog), "This field is required");
        let v = violation("controllerFirstName", ViolationKind::TooLong { limit: 40 });
        assert_eq!(localize(&v, &catalog), "Enter no more than 40 characters");
    }

    #[test]
    fn indices_are_dropped_from_field_keys() {
        let v = violation("controllerIds.0.value", ViolationKind::Required);
        assert_eq!(
            message_keys(&v),
            [
                "onboarding:fields.controllerIds.value.validation.required",
                "common:validation.required"
            ]
        );
    }

    #[test]
    fn unknown_keys_yield_the_last_key() {
        let catalog = MessageCatalog::default();
        let v = violation("x", ViolationKind::Custom { code: "odd".into() });
        assert_eq!(localize(&v, &catalog), "common:validation.odd");
    }

    #[test]
    fn loads_catalog_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "common:\n  validation:\n    required: Obligatoire").unwrap();
        let catalog = MessageCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("common:validation.required"), Some("Obligatoire"));
    }

    #[test]
    fn rejects_non_mapping_catalogs() {
        assert!(MessageCatalog::from_yaml_str("x", "- a\n- b").is_err());
    }
}
