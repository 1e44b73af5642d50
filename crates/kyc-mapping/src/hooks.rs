//! Pre-submit value hooks.
//!
//! A step may adjust its form values right before they are mapped into a
//! request body. Hooks are declarative so flows can be described as data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use kyc_core::FormValues;

/// An adjustment applied to form values before submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum PreSubmitHook {
    /// Remove `drop` when `field` equals `value`.
    DropWhenEquals {
        field: String,
        value: Value,
        drop: Vec<String>,
    },
    /// Always remove `fields`.
    Drop { fields: Vec<String> },
}

impl PreSubmitHook {
    /// The EIN is not sent when a sole proprietor says they have none.
    pub fn drop_ein_without_ein() -> Self {
        Self::DropWhenEquals {
            field: "solePropHasEin".into(),
            value: Value::String("no".into()),
            drop: vec!["organizationIdEin".into()],
        }
    }

    pub fn apply(&self, mut values: FormValues) -> FormValues {
        match self {
            Self::DropWhenEquals { field, value, drop } => {
                if values.get(field) == Some(value) {
                    for name in drop {
                        values.remove(name);
                    }
                }
            }
            Self::Drop { fields } => {
                for name in fields {
                    values.remove(name);
                }
            }
        }
        values
    }
}
