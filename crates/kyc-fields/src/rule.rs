//! # Field Rules
//!
//! A field's behavior under a given client context is described by a
//! base rule plus an ordered list of conditional overrides. Both are
//! [`RulePatch`]es: every key is optional, and folding applies them in
//! order with last-write-wins per key.
//!
//! ```text
//! base_rule ──▶ cond[0] (if matches) ──▶ cond[1] (if matches) ──▶ ... ──▶ EffectiveRule
//! ```
//!
//! There is no priority or veto between conditions. A later matching
//! override always beats an earlier one for the keys it sets, and leaves
//! the other keys alone.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use kyc_core::ClientContext;

// ─── Visibility ──────────────────────────────────────────────────────

/// How a field is presented. Only `Hidden` affects validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Shown and editable.
    #[default]
    Visible,
    /// Not rendered; cannot block submission.
    Hidden,
    /// Shown, not editable, value still submitted.
    Disabled,
    /// Shown as static text.
    Readonly,
}

impl Visibility {
    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden)
    }

    /// Whether the user can change the value.
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Visible)
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Disabled => "disabled",
            Self::Readonly => "readonly",
        };
        f.write_str(s)
    }
}

// ─── Rule layers ─────────────────────────────────────────────────────

/// One layer of a field rule. Keys left `None` do not override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RulePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// Selects an alternative label/description set for the field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_token_override_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// How many leading entries are mandatory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_items: Option<u64>,
    /// Template for a newly appended array entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_append_value: Option<Value>,
}

impl RulePatch {
    /// Overwrite every key that `layer` sets.
    pub fn apply(&mut self, layer: &RulePatch) {
        fn take<T: Clone>(slot: &mut Option<T>, from: &Option<T>) {
            if let Some(v) = from {
                *slot = Some(v.clone());
            }
        }
        take(&mut self.visibility, &layer.visibility);
        take(&mut self.required, &layer.required);
        take(&mut self.default_value, &layer.default_value);
        take(
            &mut self.content_token_override_key,
            &layer.content_token_override_key,
        );
        take(&mut self.min_items, &layer.min_items);
        take(&mut self.max_items, &layer.max_items);
        take(&mut self.required_items, &layer.required_items);
        take(&mut self.default_append_value, &layer.default_append_value);
    }

    /// Whether any array-only key is set.
    pub fn has_array_keys(&self) -> bool {
        self.min_items.is_some()
            || self.max_items.is_some()
            || self.required_items.is_some()
            || self.default_append_value.is_some()
    }
}

/// Context constraints of a conditional rule. An absent list means
/// "don't care"; a present list matches when it contains the context's
/// value. A present list never matches an absent context value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_id: Option<Vec<String>>,
}

impl RuleCondition {
    pub fn matches(&self, ctx: &ClientContext) -> bool {
        fn one(allowed: &Option<Vec<String>>, actual: &Option<String>) -> bool {
            match (allowed, actual) {
                (None, _) => true,
                (Some(list), Some(value)) => list.iter().any(|v| v == value),
                (Some(_), None) => false,
            }
        }
        one(&self.product, &ctx.product)
            && one(&self.jurisdiction, &ctx.jurisdiction)
            && one(&self.entity_type, &ctx.entity_type)
            && one(&self.screen_id, &ctx.screen_id)
    }
}

/// An override applied when its condition matches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConditionalRule {
    pub condition: RuleCondition,
    pub rule: RulePatch,
}

/// Fold `conditional` layers over `base` for `ctx`.
///
/// Pure: neither input is modified and the result is a fresh value.
pub fn fold_rules(base: &RulePatch, conditional: &[ConditionalRule], ctx: &ClientContext) -> RulePatch {
    let mut effective = base.clone();
    for (position, layer) in conditional.iter().enumerate() {
        if layer.condition.matches(ctx) {
            tracing::trace!(position, "conditional rule matched");
            effective.apply(&layer.rule);
        }
    }
    effective
}

// ─── Effective rules ─────────────────────────────────────────────────

/// Resolved rule of a scalar field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRule {
    pub visibility: Visibility,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_token_override_key: Option<String>,
}

/// Resolved rule of a repeatable field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayFieldRule {
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_append_value: Option<Value>,
}

/// The outcome of rule evaluation for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffectiveRule {
    Field(FieldRule),
    Array(ArrayFieldRule),
}

impl EffectiveRule {
    /// Build a scalar rule from a folded patch.
    pub fn scalar(patch: RulePatch) -> Self {
        Self::Field(FieldRule {
            visibility: patch.visibility.unwrap_or_default(),
            required: patch.required.unwrap_or(false),
            default_value: patch.default_value,
            content_token_override_key: patch.content_token_override_key,
        })
    }

    /// Build an array rule from a folded patch.
    pub fn array(patch: RulePatch) -> Self {
        Self::Array(ArrayFieldRule {
            visibility: patch.visibility.unwrap_or_default(),
            min_items: patch.min_items,
            max_items: patch.max_items,
            required_items: patch.required_items,
            default_value: patch.default_value,
            default_append_value: patch.default_append_value,
        })
    }

    pub fn visibility(&self) -> Visibility {
        match self {
            Self::Field(r) => r.visibility,
            Self::Array(r) => r.visibility,
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.visibility().is_hidden()
    }

    /// The same rule with visibility forced to hidden.
    pub fn into_hidden(self) -> Self {
        match self {
            Self::Field(mut r) => {
                r.visibility = Visibility::Hidden;
                Self::Field(r)
            }
            Self::Array(mut r) => {
                r.visibility = Visibility::Hidden;
                Self::Array(r)
            }
        }
    }

    pub fn default_value(&self) -> Option<&Value> {
        match self {
            Self::Field(r) => r.default_value.as_ref(),
            Self::Array(r) => r.default_value.as_ref(),
        }
    }

    pub fn as_array(&self) -> Option<&ArrayFieldRule> {
        match self {
            Self::Array(r) => Some(r),
            Self::Field(_) => None,
        }
    }

    /// Whether the user must supply a value. For arrays, whether at least
    /// one entry is mandatory.
    pub fn is_required(&self) -> bool {
        match self {
            Self::Field(r) => r.required && !r.visibility.is_hidden(),
            Self::Array(r) => {
                !r.visibility.is_hidden()
                    && r.required_items.or(r.min_items).unwrap_or(0) > 0
            }
        }
    }
}
