//! # Field Configuration Registry
//!
//! Maps every logical form-field name to its API path, its base rule, its
//! ordered conditional overrides, and an optional value transform.
//!
//! The built-in registry is declared in `config/fields.yaml` and embedded
//! into the binary. An alternative registry can be loaded from any path
//! for testing or for a deployment with different field rules.
//!
//! ## Invariants
//!
//! - Names are unique. Declaration order is preserved for iteration, so
//!   mapping and error translation visit fields in a stable order.
//! - Every mapped field (not `exclude_from_mapping`) has a path.
//! - Array-only rule keys (`min_items`, `max_items`, `required_items`,
//!   `default_append_value`) and `sub_fields` appear only on array fields.
//! - Looking up an unregistered name is a [`ConfigError`], never a default.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use kyc_core::{ClientContext, ConfigError, FieldPath};

use crate::evaluate::evaluate_rule;
use crate::rule::{fold_rules, ArrayFieldRule, ConditionalRule, EffectiveRule, RulePatch};
use crate::transform::{ErrorRewrite, ValueTransform};

const BUILTIN_FIELDS: &str = include_str!("../config/fields.yaml");

/// Whether a field holds one value or a list of entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Scalar,
    Array,
}

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldConfig {
    pub name: String,
    /// Path below the party object, e.g. `organizationDetails.addresses`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<FieldPath>,
    #[serde(default)]
    pub kind: FieldKind,
    pub base_rule: RulePatch,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_rules: Vec<ConditionalRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<ValueTransform>,
    /// Form-only field, never read from or written to the API.
    #[serde(default)]
    pub exclude_from_mapping: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_rewrite: Option<ErrorRewrite>,
    /// Rules for the properties of each array entry.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_fields: BTreeMap<String, SubFieldConfig>,
}

impl FieldConfig {
    pub fn is_array(&self) -> bool {
        self.kind == FieldKind::Array
    }

    /// Whether the value mapper reads and writes this field.
    pub fn is_mapped(&self) -> bool {
        !self.exclude_from_mapping && self.path.is_some()
    }
}

/// Rules for one property of an array field's entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubFieldConfig {
    #[serde(default)]
    pub kind: FieldKind,
    pub base_rule: RulePatch,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditional_rules: Vec<ConditionalRule>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_fields: BTreeMap<String, SubFieldConfig>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryDocument {
    fields: Vec<FieldConfig>,
}

/// The loaded, validated field registry.
#[derive(Debug, Clone)]
pub struct FieldRegistry {
    fields: Vec<FieldConfig>,
    index: HashMap<String, usize>,
}

impl FieldRegistry {
    /// The registry compiled into the crate from `config/fields.yaml`.
    ///
    /// # Errors
    ///
    /// Only if the embedded document is invalid, which the crate's own
    /// tests rule out.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml_str(BUILTIN_FIELDS)
    }

    /// Parse and validate a registry document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let doc: RegistryDocument =
            serde_yaml::from_str(yaml).map_err(|e| ConfigError::InvalidRegistry {
                reason: e.to_string(),
            })?;
        Self::from_fields(doc.fields)
    }

    /// Load a registry document from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::InvalidRegistry {
                reason: format!("cannot read {}: {e}", path.display()),
            })?;
        let registry = Self::from_yaml_str(&content)?;
        tracing::debug!(path = %path.display(), fields = registry.len(), "loaded field registry");
        Ok(registry)
    }

    /// Build a registry from already-constructed entries, validating them.
    pub fn from_fields(fields: Vec<FieldConfig>) -> Result<Self, ConfigError> {
        let mut index = HashMap::with_capacity(fields.len());
        for (position, field) in fields.iter().enumerate() {
            validate_field(field)?;
            if index.insert(field.name.clone(), position).is_some() {
                return Err(ConfigError::DuplicateField {
                    field: field.name.clone(),
                });
            }
        }
        Ok(Self { fields, index })
    }

    /// Look up a field by name.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownField`] when the name is not registered.
    pub fn get(&self, name: &str) -> Result<&FieldConfig, ConfigError> {
        self.index
            .get(name)
            .map(|&i| &self.fields[i])
            .ok_or_else(|| ConfigError::UnknownField {
                field: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldConfig> {
        self.fields.iter()
    }

    /// Fields the value mapper reads and writes, in declaration order.
    pub fn mapped(&self) -> impl Iterator<Item = &FieldConfig> {
        self.fields.iter().filter(|f| f.is_mapped())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Effective rule of `name` under `ctx`.
    pub fn rule(&self, name: &str, ctx: &ClientContext) -> Result<EffectiveRule, ConfigError> {
        Ok(evaluate_rule(self.get(name)?, ctx))
    }

    /// Effective rule of an array field.
    ///
    /// # Errors
    ///
    /// [`ConfigError::NotArrayField`] when `name` is a scalar field.
    pub fn array_rule(&self, name: &str, ctx: &ClientContext) -> Result<ArrayFieldRule, ConfigError> {
        match self.rule(name, ctx)? {
            EffectiveRule::Array(rule) => Ok(rule),
            EffectiveRule::Field(_) => Err(ConfigError::NotArrayField {
                field: name.to_string(),
            }),
        }
    }

    /// Effective rule for a nested form path such as `controllerIds.0.idType`.
    ///
    /// The first segment names the registry field; following key segments
    /// descend through `sub_fields`; index segments are skipped. A
    /// sub-field of a hidden parent is hidden as well.
    pub fn rule_for_path(
        &self,
        path: &FieldPath,
        ctx: &ClientContext,
    ) -> Result<EffectiveRule, ConfigError> {
        let mut segments = path.segments().iter();
        let head = segments.next().ok_or_else(|| ConfigError::UnknownField {
            field: String::new(),
        })?;
        let field = self.get(&head.key)?;
        let mut rule = evaluate_rule(field, ctx);
        let mut children = &field.sub_fields;

        for segment in segments.filter(|s| !s.is_index) {
            let sub = children
                .get(&segment.key)
                .ok_or_else(|| ConfigError::UnknownField {
                    field: path.to_string(),
                })?;
            let parent_hidden = rule.is_hidden();
            let folded = fold_rules(&sub.base_rule, &sub.conditional_rules, ctx);
            rule = match sub.kind {
                FieldKind::Scalar => EffectiveRule::scalar(folded),
                FieldKind::Array => EffectiveRule::array(folded),
            };
            if parent_hidden {
                rule = rule.into_hidden();
            }
            children = &sub.sub_fields;
        }
        Ok(rule)
    }
}

fn validate_field(field: &FieldConfig) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidField {
        field: field.name.clone(),
        reason: reason.to_string(),
    };
    if field.name.is_empty() {
        return Err(invalid("field name is empty"));
    }
    if field.base_rule.visibility.is_none() {
        return Err(invalid("base_rule must set a visibility"));
    }
    if !field.exclude_from_mapping && field.path.is_none() {
        return Err(invalid("mapped field has no path"));
    }
    if field.kind == FieldKind::Scalar {
        if field.base_rule.has_array_keys()
            || field.conditional_rules.iter().any(|c| c.rule.has_array_keys())
        {
            return Err(invalid("array rule keys on a scalar field"));
        }
        if !field.sub_fields.is_empty() {
            return Err(invalid("sub_fields on a scalar field"));
        }
    }
    validate_sub_fields(&field.name, &field.sub_fields)
}

fn validate_sub_fields(
    parent: &str,
    subs: &BTreeMap<String, SubFieldConfig>,
) -> Result<(), ConfigError> {
    for (name, sub) in subs {
        let qualified = format!("{parent}.{name}");
        let invalid = |reason: &str| ConfigError::InvalidField {
            field: qualified.clone(),
            reason: reason.to_string(),
        };
        if sub.base_rule.visibility.is_none() {
            return Err(invalid("base_rule must set a visibility"));
        }
        if sub.kind == FieldKind::Scalar {
            if sub.base_rule.has_array_keys()
                || sub.conditional_rules.iter().any(|c| c.rule.has_array_keys())
            {
                return Err(invalid("array rule keys on a scalar field"));
            }
            if !sub.sub_fields.is_empty() {
                return Err(invalid("sub_fields on a scalar field"));
            }
        }
        validate_sub_fields(&qualified, &sub.sub_fields)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Visibility;
    use std::io::Write;

    fn builtin() -> FieldRegistry {
        FieldRegistry::builtin().unwrap()
    }

    #[test]
    fn builtin_registry_loads() {
        let registry = builtin();
        assert!(registry.len() >= 25);
        assert!(registry.contains("organizationName"));
        assert!(registry.contains("controllerIds"));
        assert!(registry.get("organizationIds").unwrap().is_array());
    }

    #[test]
    fn unknown_field_is_a_config_error() {
        let err = builtin()
            .rule("favouriteColour", &ClientContext::default())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownField {
                field: "favouriteColour".into()
            }
        );
    }

    #[test]
    fn array_rule_on_scalar_is_a_config_error() {
        let err = builtin()
            .array_rule("organizationName", &ClientContext::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::NotArrayField { .. }));
    }

    #[test]
    fn dba_name_hidden_for_canadian_merchant_services() {
        let registry = builtin();
        let ca = ClientContext::default()
            .with_product("MERCHANT_SERVICES")
            .with_jurisdiction("CA");
        let us = ClientContext::default()
            .with_product("MERCHANT_SERVICES")
            .with_jurisdiction("US");
        assert_eq!(
            registry.rule("dbaName", &ca).unwrap().visibility(),
            Visibility::Hidden
        );
        assert_eq!(
            registry.rule("dbaName", &us).unwrap().visibility(),
            Visibility::Visible
        );
    }

    #[test]
    fn organization_ids_bounds_follow_entity_type() {
        let registry = builtin();
        let llc = ClientContext::default().with_entity_type("LIMITED_LIABILITY_COMPANY");
        let rule = registry.array_rule("organizationIds", &llc).unwrap();
        assert_eq!((rule.min_items, rule.max_items), (Some(1), Some(6)));

        let sole = ClientContext::default().with_entity_type("SOLE_PROPRIETORSHIP");
        let rule = registry.array_rule("organizationIds", &sole).unwrap();
        assert_eq!(rule.min_items, Some(0));
    }

    #[test]
    fn nature_of_ownership_only_on_owner_screen() {
        let registry = builtin();
        let ctx = ClientContext::default();
        assert!(registry.rule("natureOfOwnership", &ctx).unwrap().is_hidden());
        let owner = ctx.with_screen("owner-stepper");
        let rule = registry.rule("natureOfOwnership", &owner).unwrap();
        assert!(!rule.is_hidden());
        assert!(rule.is_required());
    }

    #[test]
    fn rule_for_path_descends_sub_fields() {
        let registry = builtin();
        let ctx = ClientContext::default().with_product("EMBEDDED_PAYMENTS");
        let path = FieldPath::parse("controllerIds.0.expiryDate").unwrap();
        let rule = registry.rule_for_path(&path, &ctx).unwrap();
        assert!(rule.is_hidden());

        let path = FieldPath::parse("controllerIds[0].value").unwrap();
        let rule = registry.rule_for_path(&path, &ctx).unwrap();
        assert!(!rule.is_hidden());

        let bad = FieldPath::parse("controllerIds.0.shoeSize").unwrap();
        assert!(matches!(
            registry.rule_for_path(&bad, &ctx),
            Err(ConfigError::UnknownField { .. })
        ));
    }

    #[test]
    fn sub_fields_inherit_hidden_parent() {
        let registry = builtin();
        let sole = ClientContext::default().with_entity_type("SOLE_PROPRIETORSHIP");
        let path = FieldPath::parse("controllerIds.0.value").unwrap();
        assert!(registry.rule_for_path(&path, &sole).unwrap().is_hidden());
    }

    #[test]
    fn load_rejects_duplicates() {
        let yaml = r#"
fields:
  - name: a
    path: a
    base_rule: { visibility: visible }
  - name: a
    path: b
    base_rule: { visibility: visible }
"#;
        assert_eq!(
            FieldRegistry::from_yaml_str(yaml).unwrap_err(),
            ConfigError::DuplicateField { field: "a".into() }
        );
    }

    #[test]
    fn load_rejects_unmapped_field_without_flag() {
        let yaml = r#"
fields:
  - name: a
    base_rule: { visibility: visible }
"#;
        assert!(matches!(
            FieldRegistry::from_yaml_str(yaml).unwrap_err(),
            ConfigError::InvalidField { .. }
        ));
    }

    #[test]
    fn load_rejects_array_keys_on_scalar() {
        let yaml = r#"
fields:
  - name: a
    path: a
    base_rule: { visibility: visible }
    conditional_rules:
      - condition: { jurisdiction: [CA] }
        rule: { max_items: 3 }
"#;
        let err = FieldRegistry::from_yaml_str(yaml).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidField {
                field: "a".into(),
                reason: "array rule keys on a scalar field".into()
            }
        );
    }

    #[test]
    fn load_rejects_missing_base_visibility() {
        let yaml = r#"
fields:
  - name: a
    path: a
    base_rule: { required: true }
"#;
        assert!(FieldRegistry::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "fields:\n  - name: nickname\n    path: individualDetails.nickname\n    base_rule: {{ visibility: visible, required: true }}"
        )
        .unwrap();
        let registry = FieldRegistry::load(file.path()).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry
            .rule("nickname", &ClientContext::default())
            .unwrap()
            .is_required());
    }

    #[test]
    fn load_missing_file_is_invalid_registry() {
        let dir = tempfile::tempdir().unwrap();
        let err = FieldRegistry::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRegistry { .. }));
    }

    #[test]
    fn iteration_preserves_declaration_order() {
        let registry = builtin();
        let names: Vec<&str> = registry.iter().take(3).map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["organizationName", "organizationTypeHierarchy", "countryOfFormation"]
        );
        assert!(registry.mapped().all(|f| f.path.is_some()));
        assert!(!registry.mapped().any(|f| f.name == "solePropHasEin"));
    }
}
