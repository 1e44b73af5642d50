//! # Cross-Field Refinements
//!
//! Checks that JSON Schema cannot express on its own: a field required only
//! when another field has a given value, unique keys across array items,
//! and date checks relative to today.
//!
//! Refinements run after the base schema accepts the values, and only over
//! fields the context does not hide. Step schemas declare them under the
//! `x-refinements` keyword; dynamic schemas attach them directly.

use std::collections::HashSet;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use kyc_core::FormValues;

use crate::validate::{Violation, ViolationKind};

/// A cross-field check over a whole form.
pub trait Refinement: Send + Sync + fmt::Debug {
    /// Stable name, used as the violation's schema path.
    fn name(&self) -> &str;

    /// Fields the check reports against. A refinement whose fields are all
    /// hidden is skipped.
    fn fields(&self) -> Vec<&str>;

    /// Violations of `values`, evaluated as of `today`.
    fn check(&self, values: &FormValues, today: NaiveDate) -> Vec<Violation>;
}

/// Predicate over one form value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", deny_unknown_fields)]
pub enum Condition {
    Equals { field: String, value: Value },
    NotEquals { field: String, value: Value },
    /// Absent, `null`, `false` or `""`.
    Falsy { field: String },
}

impl Condition {
    pub fn holds(&self, values: &FormValues) -> bool {
        match self {
            Self::Equals { field, value } => values.get(field) == Some(value),
            Self::NotEquals { field, value } => values.get(field) != Some(value),
            Self::Falsy { field } => is_falsy(values.get(field)),
        }
    }
}

/// The refinements step schemas can declare.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum BuiltinRefinement {
    /// `field` must be non-blank whenever every condition in `when` holds.
    RequiredWhen { field: String, when: Vec<Condition> },
    /// No two items of array `field` may share the same `key` value.
    UniqueItemKey { field: String, key: String },
    /// `field` is an ISO date of birth, not in the future, giving an age
    /// within `min..=max` years.
    AgeRange { field: String, min: u32, max: u32 },
    /// `field` is a year no later than the current one.
    YearNotInFuture { field: String },
}

impl Refinement for BuiltinRefinement {
    fn name(&self) -> &str {
        match self {
            Self::RequiredWhen { .. } => "required_when",
            Self::UniqueItemKey { .. } => "unique_item_key",
            Self::AgeRange { .. } => "age_range",
            Self::YearNotInFuture { .. } => "year_not_in_future",
        }
    }

    fn fields(&self) -> Vec<&str> {
        match self {
            Self::RequiredWhen { field, .. }
            | Self::UniqueItemKey { field, .. }
            | Self::AgeRange { field, .. }
            | Self::YearNotInFuture { field } => vec![field.as_str()],
        }
    }

    fn check(&self, values: &FormValues, today: NaiveDate) -> Vec<Violation> {
        let fail = |field: &str, kind: ViolationKind, message: String| {
            vec![Violation::refinement(self.name(), field, kind, message)]
        };
        match self {
            Self::RequiredWhen { field, when } => {
                if when.iter().all(|c| c.holds(values)) && is_blank(values.get(field)) {
                    return fail(field, ViolationKind::Required, format!("{field} is required"));
                }
                Vec::new()
            }
            Self::UniqueItemKey { field, key } => {
                let Some(items) = values.get(field).and_then(Value::as_array) else {
                    return Vec::new();
                };
                let mut seen = HashSet::new();
                let duplicate = items
                    .iter()
                    .filter_map(|item| item.get(key.as_str()))
                    .filter(|v| !is_blank(Some(*v)))
                    .any(|v| !seen.insert(v.to_string()));
                if duplicate {
                    return fail(
                        field,
                        ViolationKind::Custom { code: "uniqueTypes".into() },
                        format!("each item of {field} must have a different {key}"),
                    );
                }
                Vec::new()
            }
            Self::AgeRange { field, min, max } => {
                let Some(raw) = values.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
                else {
                    return Vec::new();
                };
                let Ok(born) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") else {
                    return fail(field, ViolationKind::Format, format!("{raw} is not a valid date"));
                };
                if born > today {
                    return fail(
                        field,
                        ViolationKind::Custom { code: "future".into() },
                        format!("{raw} is in the future"),
                    );
                }
                let age = age_on(born, today);
                if age < *min {
                    return fail(
                        field,
                        ViolationKind::Custom { code: "tooYoung".into() },
                        format!("age must be at least {min}"),
                    );
                }
                if age > *max {
                    return fail(
                        field,
                        ViolationKind::Custom { code: "tooOld".into() },
                        format!("age must be at most {max}"),
                    );
                }
                Vec::new()
            }
            Self::YearNotInFuture { field } => {
                let year = values.get(field).and_then(|v| match v {
                    Value::String(s) => s.parse::<i32>().ok(),
                    Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
                    _ => None,
                });
                match year {
                    Some(year) if year > today.year() => fail(
                        field,
                        ViolationKind::Custom { code: "future".into() },
                        format!("{year} is in the future"),
                    ),
                    _ => Vec::new(),
                }
            }
        }
    }
}

/// Whole years between `born` and `today`.
pub fn age_on(born: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    u32::try_from(years).unwrap_or(0)
}

/// Absent, `null`, `""` or `[]`.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(a)) => a.is_empty(),
        Some(_) => false,
    }
}

fn is_falsy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(v: Value) -> FormValues {
        match v {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[test]
    fn required_when_all_conditions_hold() {
        let rule: BuiltinRefinement = serde_json::from_value(json!({
            "kind": "required_when",
            "field": "organizationIdEin",
            "when": [
                { "op": "equals", "field": "countryOfFormation", "value": "US" },
                { "op": "not_equals", "field": "solePropHasEin", "value": "no" }
            ]
        }))
        .unwrap();

        let missing = values(json!({ "countryOfFormation": "US", "organizationIdEin": "" }));
        let violations = rule.check(&missing, today());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "organizationIdEin");
        assert_eq!(violations[0].kind, ViolationKind::Required);

        let opted_out = values(json!({ "countryOfFormation": "US", "solePropHasEin": "no" }));
        assert!(rule.check(&opted_out, today()).is_empty());

        let abroad = values(json!({ "countryOfFormation": "CA" }));
        assert!(rule.check(&abroad, today()).is_empty());
    }

    #[test]
    fn falsy_condition_treats_unchecked_boxes_as_false() {
        let rule = BuiltinRefinement::RequiredWhen {
            field: "website".into(),
            when: vec![Condition::Falsy { field: "websiteNotAvailable".into() }],
        };
        assert_eq!(rule.check(&values(json!({ "website": "" })), today()).len(), 1);
        assert!(rule
            .check(&values(json!({ "websiteNotAvailable": true })), today())
            .is_empty());
    }

    #[test]
    fn unique_item_key_flags_duplicates() {
        let rule = BuiltinRefinement::UniqueItemKey {
            field: "organizationIds".into(),
            key: "idType".into(),
        };
        let dup = values(json!({ "organizationIds": [
            { "idType": "EIN", "value": "1" }, { "idType": "EIN", "value": "2" }
        ]}));
        assert_eq!(
            rule.check(&dup, today())[0].kind,
            ViolationKind::Custom { code: "uniqueTypes".into() }
        );
        let ok = values(json!({ "organizationIds": [
            { "idType": "EIN" }, { "idType": "LEI" }
        ]}));
        assert!(rule.check(&ok, today()).is_empty());
    }

    #[test]
    fn age_range_bounds() {
        let rule = BuiltinRefinement::AgeRange { field: "birthDate".into(), min: 18, max: 120 };
        let check = |d: &str| rule.check(&values(json!({ "birthDate": d })), today());
        assert!(check("2006-06-15").is_empty());
        assert_eq!(
            check("2006-06-16")[0].kind,
            ViolationKind::Custom { code: "tooYoung".into() }
        );
        assert_eq!(check("2030-01-01")[0].kind, ViolationKind::Custom { code: "future".into() });
        assert_eq!(check("1900-01-01")[0].kind, ViolationKind::Custom { code: "tooOld".into() });
        assert_eq!(check("15/06/1990")[0].kind, ViolationKind::Format);
        assert!(check("").is_empty());
    }

    #[test]
    fn year_not_in_future() {
        let rule = BuiltinRefinement::YearNotInFuture { field: "yearOfFormation".into() };
        assert!(rule
            .check(&values(json!({ "yearOfFormation": "2024" })), today())
            .is_empty());
        assert_eq!(rule.check(&values(json!({ "yearOfFormation": "2025" })), today()).len(), 1);
    }

    #[test]
    fn age_counts_whole_years() {
        let born = NaiveDate::from_ymd_opt(2000, 2, 29).unwrap();
        assert_eq!(age_on(born, NaiveDate::from_ymd_opt(2018, 2, 28).unwrap()), 17);
        assert_eq!(age_on(born, NaiveDate::from_ymd_opt(2018, 3, 1).unwrap()), 18);
    }
}
