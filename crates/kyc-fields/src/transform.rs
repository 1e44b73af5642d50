//! # Value Transforms
//!
//! Some form fields do not hold the API value verbatim: a phone number is
//! one `+E.164` string in the form but a `{countryCode, phoneNumber}` pair
//! in the API, an address is one object in the form but an entry of a
//! typed address list in the API.
//!
//! Transforms are a closed set selected by name in the registry YAML:
//!
//! ```yaml
//! transform:
//!   kind: address
//!   address_type: BUSINESS_ADDRESS
//! ```
//!
//! Both directions are total: they return `None` when the input does not
//! have the expected shape, and the mapper treats `None` as "absent".

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use kyc_core::{FieldPath, PathSegment};

use crate::phone::split_e164;

/// Organization types grouped under "registered business".
const REGISTERED_BUSINESS_TYPES: &[&str] = &[
    "LIMITED_LIABILITY_COMPANY",
    "LIMITED_LIABILITY_PARTNERSHIP",
    "C_CORPORATION",
    "S_CORPORATION",
    "GENERAL_PARTNERSHIP",
    "LIMITED_PARTNERSHIP",
    "PARTNERSHIP",
];

const SOLE_PROPRIETORSHIP: &str = "SOLE_PROPRIETORSHIP";

/// Form keys of the three address lines, in API order.
pub const ADDRESS_LINE_KEYS: [&str; 3] = [
    "primaryAddressLine",
    "secondaryAddressLine",
    "tertiaryAddressLine",
];

/// A named bidirectional conversion between API and form values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueTransform {
    /// Maps the server's placeholder organization name to `""`.
    PlaceholderName { placeholder: String },
    /// `organizationType` ↔ `{generalOrganizationType, specificOrganizationType}`.
    OrganizationTypeHierarchy,
    /// Extracts the value of the identity with `id_type` from an identity
    /// list; writes back a single-entry list.
    IdentityValue { id_type: String, issuer: String },
    /// `"yes"` / `"no"` depending on whether an identity with `id_type` exists.
    HasIdentity { id_type: String },
    /// Industry code ↔ `{codeType, code}`.
    IndustryCode { code_type: String },
    /// `{phoneType, countryCode, phoneNumber}` ↔ `{phoneType, phoneNumber: "+E164"}`.
    Phone,
    /// The address of `address_type` from an address list ↔ a flat address
    /// object with three named lines.
    Address { address_type: String },
    /// Boolean negation.
    Negate,
}

impl ValueTransform {
    /// Convert an API value into its form representation.
    pub fn from_response(&self, api: &Value) -> Option<Value> {
        match self {
            Self::PlaceholderName { placeholder } => match api {
                Value::String(s) if s == placeholder => Some(json!("")),
                other => Some(other.clone()),
            },
            Self::OrganizationTypeHierarchy => {
                let specific = api.as_str()?;
                let general = if specific == SOLE_PROPRIETORSHIP {
                    SOLE_PROPRIETORSHIP
                } else if REGISTERED_BUSINESS_TYPES.contains(&specific) {
                    "REGISTERED_BUSINESS"
                } else {
                    "OTHER"
                };
                Some(json!({
                    "generalOrganizationType": general,
                    "specificOrganizationType": specific,
                }))
            }
            Self::IdentityValue { id_type, .. } => {
                let value = find_identity(api, id_type)
                    .and_then(|id| id.get("value"))
                    .cloned()
                    .unwrap_or_else(|| json!(""));
                Some(value)
            }
            Self::HasIdentity { id_type } => {
                let ids = api.as_array()?;
                let found = ids
                    .iter()
                    .any(|id| id.get("idType").and_then(Value::as_str) == Some(id_type));
                Some(json!(if found { "yes" } else { "no" }))
            }
            Self::IndustryCode { .. } => api.get("code").cloned(),
            Self::Phone => {
                let code = api.get("countryCode").and_then(Value::as_str).unwrap_or("");
                let number = api.get("phoneNumber").and_then(Value::as_str)?;
                let mut out = Map::new();
                if let Some(kind) = api.get("phoneType") {
                    out.insert("phoneType".into(), kind.clone());
                }
                out.insert("phoneNumber".into(), json!(format!("{code}{number}")));
                Some(Value::Object(out))
            }
            Self::Address { address_type } => {
                let list = api.as_array()?;
                let found = list
                    .iter()
                    .find(|a| a.get("addressType").and_then(Value::as_str) == Some(address_type));
                Some(address_to_form(address_type, found))
            }
            Self::Negate => api.as_bool().map(|b| json!(!b)),
        }
    }

    /// Convert a form value into its API representation.
    ///
    /// One-way transforms (`PlaceholderName`, `HasIdentity`) pass the value
    /// through unchanged.
    pub fn to_request(&self, form: &Value) -> Option<Value> {
        match self {
            Self::PlaceholderName { .. } | Self::HasIdentity { .. } => Some(form.clone()),
            Self::OrganizationTypeHierarchy => form.get("specificOrganizationType").cloned(),
            Self::IdentityValue { id_type, issuer } => Some(json!([{
                "issuer": issuer,
                "idType": id_type,
                "value": form,
            }])),
            Self::IndustryCode { code_type } => Some(json!({
                "codeType": code_type,
                "code": form,
            })),
            Self::Phone => {
                let raw = form.get("phoneNumber").and_then(Value::as_str).unwrap_or("");
                let (code, national) = match split_e164(raw) {
                    Some(split) => (split.country_code, split.national_number),
                    None => (String::new(), String::new()),
                };
                let mut out = Map::new();
                if let Some(kind) = form.get("phoneType") {
                    out.insert("phoneType".into(), kind.clone());
                }
                out.insert("countryCode".into(), json!(code));
                out.insert("phoneNumber".into(), json!(national));
                Some(Value::Object(out))
            }
            Self::Address { address_type } => {
                let fields = form.as_object()?;
                Some(json!([address_to_request(address_type, fields)]))
            }
            Self::Negate => form.as_bool().map(|b| json!(!b)),
        }
    }
}

fn find_identity<'v>(ids: &'v Value, id_type: &str) -> Option<&'v Value> {
    ids.as_array()?
        .iter()
        .find(|id| id.get("idType").and_then(Value::as_str) == Some(id_type))
}

fn address_to_form(address_type: &str, found: Option<&Value>) -> Value {
    let text = |key: &str| -> Value {
        found
            .and_then(|a| a.get(key))
            .cloned()
            .unwrap_or_else(|| json!(""))
    };
    let line = |i: usize| -> Value {
        found
            .and_then(|a| a.get("addressLines"))
            .and_then(|lines| lines.get(i))
            .cloned()
            .unwrap_or_else(|| json!(""))
    };
    let mut out = Map::new();
    out.insert("addressType".into(), json!(address_type));
    for key in ["city", "state", "postalCode", "country"] {
        out.insert(key.into(), text(key));
    }
    for (i, key) in ADDRESS_LINE_KEYS.iter().enumerate() {
        out.insert((*key).into(), line(i));
    }
    Value::Object(out)
}

fn address_to_request(address_type: &str, fields: &Map<String, Value>) -> Value {
    let mut out = Map::new();
    for (key, value) in fields {
        if !ADDRESS_LINE_KEYS.contains(&key.as_str()) {
            out.insert(key.clone(), value.clone());
        }
    }
    out.insert("addressType".into(), json!(address_type));
    let lines: Vec<Value> = ADDRESS_LINE_KEYS
        .iter()
        .filter_map(|key| fields.get(*key))
        .filter(|v| !v.is_null() && v.as_str() != Some(""))
        .cloned()
        .collect();
    out.insert("addressLines".into(), Value::Array(lines));
    Value::Object(out)
}

// ─── Error field rewrites ────────────────────────────────────────────

/// Renames the tail of a server error path into the form's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorRewrite {
    /// `addressLines.N` → the named line key for N in 0..=2.
    AddressLines,
}

impl ErrorRewrite {
    /// Rewrite the path suffix that follows a field's registry path.
    pub fn apply(&self, suffix: &FieldPath) -> FieldPath {
        match self {
            Self::AddressLines => {
                let segments = suffix.segments();
                let n = segments.len();
                if n >= 2 && segments[n - 2].key == "addressLines" {
                    if let Some(key) = segments[n - 1]
                        .as_index()
                        .and_then(|i| ADDRESS_LINE_KEYS.get(i))
                    {
                        let mut out = segments[..n - 2].to_vec();
                        out.push(PathSegment::key(*key));
                        return FieldPath::from_segments(out);
                    }
                }
                suffix.clone()
            }
        }
    }
}
