//! Rule evaluation and context-aware form defaults.

use serde_json::Value;

use kyc_core::{ClientContext, ConfigError, FormValues};

use crate::registry::{FieldConfig, FieldKind, FieldRegistry};
use crate::rule::{fold_rules, EffectiveRule};

/// Effective rule of one field under `ctx`.
///
/// The base rule is folded with every matching conditional rule in
/// declaration order; the field's kind selects the rule shape.
pub fn evaluate_rule(config: &FieldConfig, ctx: &ClientContext) -> EffectiveRule {
    let folded = fold_rules(&config.base_rule, &config.conditional_rules, ctx);
    let rule = match config.kind {
        FieldKind::Scalar => EffectiveRule::scalar(folded),
        FieldKind::Array => EffectiveRule::array(folded),
    };
    tracing::trace!(field = %config.name, %ctx, visibility = %rule.visibility(), "evaluated field rule");
    rule
}

/// Initial values for a form made of `names`.
///
/// Hidden fields are left out entirely. Every other field takes its
/// existing value, else the rule's default, else `""` (`[]` for arrays).
///
/// # Errors
///
/// [`ConfigError::UnknownField`] if any name is not registered.
pub fn default_form_values<'a>(
    registry: &FieldRegistry,
    names: impl IntoIterator<Item = &'a str>,
    ctx: &ClientContext,
    existing: &FormValues,
) -> Result<FormValues, ConfigError> {
    let mut out = FormValues::new();
    for name in names {
        let config = registry.get(name)?;
        let rule = evaluate_rule(config, ctx);
        if rule.is_hidden() {
            continue;
        }
        let value = existing
            .get(name)
            .filter(|v| !v.is_null())
            .or(rule.default_value())
            .cloned()
            .unwrap_or_else(|| match config.kind {
                FieldKind::Scalar => Value::String(String::new()),
                FieldKind::Array => Value::Array(Vec::new()),
            });
        out.insert(name.to_string(), value);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Visibility;
    use serde_json::json;

    fn registry() -> FieldRegistry {
        FieldRegistry::builtin().unwrap()
    }

    #[test]
    fn dba_name_scenario() {
        let registry = registry();
        let config = registry.get("dbaName").unwrap();
        let ca = ClientContext::default()
            .with_product("MERCHANT_SERVICES")
            .with_jurisdiction("CA");
        assert_eq!(evaluate_rule(config, &ca).visibility(), Visibility::Hidden);
        let us = ca.clone().with_jurisdiction("US");
        assert_eq!(evaluate_rule(config, &us).visibility(), Visibility::Visible);
    }

    #[test]
    fn sole_proprietor_organization_name_defaults() {
        let registry = registry();
        let sole = ClientContext::default().with_entity_type("SOLE_PROPRIETORSHIP");
        let rule = registry.rule("organizationName", &sole).unwrap();
        assert_eq!(rule.visibility(), Visibility::Readonly);
        assert!(!rule.is_required());
        assert_eq!(rule.default_value(), Some(&json!("N/A")));
    }

    #[test]
    fn defaults_prefer_existing_then_rule_then_blank() {
        let registry = registry();
        let sole = ClientContext::default().with_entity_type("SOLE_PROPRIETORSHIP");
        let mut existing = FormValues::new();
        existing.insert("yearOfFormation".into(), json!("2019"));

        let values = default_form_values(
            &registry,
            ["organizationName", "yearOfFormation", "dbaName", "organizationIds"],
            &sole,
            &existing,
        )
        .unwrap();
        assert_eq!(values["organizationName"], json!("N/A"));
        assert_eq!(values["yearOfFormation"], json!("2019"));
        assert_eq!(values["dbaName"], json!(""));
        assert_eq!(values["organizationIds"], json!([]));
    }

    #[test]
    fn defaults_drop_hidden_fields() {
        let registry = registry();
        let values = default_form_values(
            &registry,
            ["natureOfOwnership", "controllerFirstName"],
            &ClientContext::default(),
            &FormValues::new(),
        )
        .unwrap();
        assert!(!values.contains_key("natureOfOwnership"));
        assert!(values.contains_key("controllerFirstName"));
    }

    #[test]
    fn defaults_fail_fast_on_unknown_names() {
        let err = default_form_values(
            &registry(),
            ["organizationName", "nope"],
            &ClientContext::default(),
            &FormValues::new(),
        )
        .unwrap_err();
        assert_eq!(err, ConfigError::UnknownField { field: "nope".into() });
    }
}
