//! # Schema Filter
//!
//! Rewrites a step's base schema for a concrete [`ClientContext`].
//!
//! ## Invariants
//!
//! - A hidden field is never required and accepts `""` in addition to
//!   whatever the base schema allowed, so hidden values never block a
//!   submission.
//! - An array field's `minItems`/`maxItems` are replaced by the effective
//!   rule's bounds; a bound the rule leaves unset is removed.
//! - An array field is listed in `required` exactly when its effective
//!   minimum is positive and it is not hidden.
//! - Scalar `required` flags do not alter the schema: step schemas encode
//!   optionality themselves and conditional requirements are refinements.
//! - Output depends only on the inputs; filtering the same schema twice
//!   under the same context yields identical schemas.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Value};

use kyc_core::{ClientContext, FieldPath};
use kyc_fields::{ArrayFieldRule, EffectiveRule, FieldRegistry, SubFieldConfig};

use crate::error::SchemaError;
use crate::form::FormSchema;

/// Filter `schema` for `ctx`, then apply the optional `refine` step.
///
/// # Errors
///
/// [`SchemaError::Config`] when the schema names a field the registry does
/// not know, and [`SchemaError::InvalidFormSchema`] when an array rule
/// targets a property that is not typed as an array.
pub fn filter_schema(
    schema: &FormSchema,
    registry: &FieldRegistry,
    ctx: &ClientContext,
    refine: Option<&dyn Fn(FormSchema) -> FormSchema>,
) -> Result<FormSchema, SchemaError> {
    let mut json = schema.json().clone();
    let mut filter = Filter {
        registry,
        ctx,
        schema_name: schema.name(),
        hidden: BTreeSet::new(),
    };
    let names: Vec<String> = schema.field_names().map(str::to_string).collect();
    for name in &names {
        let config = registry.get(name)?;
        filter.property(&mut json, name, &FieldPath::root().child(name.as_str()), &config.sub_fields)?;
    }

    tracing::debug!(
        schema = %schema.name(),
        %ctx,
        hidden = filter.hidden.len(),
        "filtered form schema"
    );
    let hidden = filter.hidden;
    let filtered = FormSchema::assemble(
        schema.name().to_string(),
        json,
        schema.refinements().to_vec(),
        hidden,
    )?;
    Ok(match refine {
        Some(refine) => refine(filtered),
        None => filtered,
    })
}

struct Filter<'a> {
    registry: &'a FieldRegistry,
    ctx: &'a ClientContext,
    schema_name: &'a str,
    hidden: BTreeSet<String>,
}

impl Filter<'_> {
    /// Filter property `key` of the object schema `object`.
    fn property(
        &mut self,
        object: &mut Value,
        key: &str,
        path: &FieldPath,
        sub_fields: &BTreeMap<String, SubFieldConfig>,
    ) -> Result<(), SchemaError> {
        let rule = self.registry.rule_for_path(path, self.ctx)?;
        if object.get("properties").and_then(|p| p.get(key)).is_none() {
            return Ok(());
        }

        if let EffectiveRule::Array(array) = &rule {
            {
                let prop = &mut object["properties"][key];
                self.rewrite_bounds(prop, array, path)?;
                if let Some(items) = prop.get_mut("items") {
                    self.items(items, path, sub_fields)?;
                }
            }
            let needed = array.min_items.unwrap_or(0) > 0 && !rule.is_hidden();
            set_required(object, key, needed);
        }

        if rule.is_hidden() {
            set_required(object, key, false);
            let prop = &mut object["properties"][key];
            let original = prop.take();
            *prop = json!({ "anyOf": [original, { "const": "" }] });
            self.hidden.insert(without_indices(path));
        }
        Ok(())
    }

    /// Filter the registered sub-fields of an array's item schema.
    fn items(
        &mut self,
        items: &mut Value,
        path: &FieldPath,
        sub_fields: &BTreeMap<String, SubFieldConfig>,
    ) -> Result<(), SchemaError> {
        let keys: Vec<String> = items
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .keys()
                    .filter(|k| sub_fields.contains_key(k.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        for key in keys {
            if let Some(sub) = sub_fields.get(&key) {
                self.property(items, &key, &path.at(0).child(key.as_str()), &sub.sub_fields)?;
            }
        }
        Ok(())
    }

    fn rewrite_bounds(
        &self,
        prop: &mut Value,
        rule: &ArrayFieldRule,
        path: &FieldPath,
    ) -> Result<(), SchemaError> {
        let is_array = prop.get("type").and_then(Value::as_str) == Some("array");
        let Some(obj) = prop.as_object_mut().filter(|_| is_array) else {
            return Err(SchemaError::InvalidFormSchema {
                schema_name: self.schema_name.to_string(),
                reason: format!("'{path}' has an array rule but is not typed as an array"),
            });
        };
        for (keyword, bound) in [("minItems", rule.min_items), ("maxItems", rule.max_items)] {
            match bound {
                Some(n) => {
                    obj.insert(keyword.to_string(), json!(n));
                }
                None => {
                    obj.remove(keyword);
                }
            }
        }
        Ok(())
    }
}

fn set_required(object: &mut Value, key: &str, required: bool) {
    let Some(obj) = object.as_object_mut() else {
        return;
    };
    let mut names: Vec<Value> = obj
        .get("required")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    names.retain(|n| n.as_str() != Some(key));
    if required {
        names.push(Value::String(key.to_string()));
    }
    if names.is_empty() {
        obj.remove("required");
    } else {
        obj.insert("required".to_string(), Value::Array(names));
    }
}

fn without_indices(path: &FieldPath) -> String {
    path.segments()
        .iter()
        .filter(|s| !s.is_index)
        .map(|s| s.key.as_str())
        .collect::<Vec<_>>()
        .join(".")
}
