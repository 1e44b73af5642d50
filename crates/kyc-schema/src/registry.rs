//! # Schema Registry
//!
//! Named step schemas. The built-in set is embedded at compile time; a
//! deployment can load its own set from a directory of `*.schema.json`
//! files, keyed by the file name without the `.schema.json` suffix.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::error::SchemaError;
use crate::form::FormSchema;

const SCHEMA_SUFFIX: &str = ".schema.json";

const BUILTIN: &[(&str, &str)] = &[
    ("gateway", include_str!("../schemas/gateway.schema.json")),
    ("personal-details", include_str!("../schemas/personal-details.schema.json")),
    ("identity-document", include_str!("../schemas/identity-document.schema.json")),
    ("contact-details", include_str!("../schemas/contact-details.schema.json")),
    ("industry", include_str!("../schemas/industry.schema.json")),
    ("company-identification", include_str!("../schemas/company-identification.schema.json")),
    ("customer-facing-details", include_str!("../schemas/customer-facing-details.schema.json")),
    ("contact-info", include_str!("../schemas/contact-info.schema.json")),
];

/// Compiled step schemas by name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, FormSchema>,
}

impl SchemaRegistry {
    /// The embedded step schemas.
    pub fn builtin() -> Result<Self, SchemaError> {
        let mut registry = Self::default();
        for (name, raw) in BUILTIN {
            registry.insert(parse(name, raw)?)?;
        }
        Ok(registry)
    }

    /// Load every `*.schema.json` file in `dir`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::SchemaLoadError`] if the directory cannot be read or a
    /// file is not valid JSON; build errors as for [`FormSchema::new`].
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| SchemaError::SchemaLoadError {
            schema_name: dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        let mut registry = Self::default();
        for entry in entries {
            let path = entry?.path();
            let Some(name) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_suffix(SCHEMA_SUFFIX))
            else {
                continue;
            };
            let raw = std::fs::read_to_string(&path)?;
            registry.insert(parse(name, &raw)?)?;
        }
        tracing::debug!(dir = %dir.display(), count = registry.len(), "loaded step schemas");
        Ok(registry)
    }

    /// Add a schema; names must be unique.
    pub fn insert(&mut self, schema: FormSchema) -> Result<(), SchemaError> {
        if self.schemas.contains_key(schema.name()) {
            return Err(SchemaError::SchemaLoadError {
                schema_name: schema.name().to_string(),
                reason: "schema name registered twice".into(),
            });
        }
        self.schemas.insert(schema.name().to_string(), schema);
        Ok(())
    }

    /// Look up a schema by name.
    pub fn get(&self, name: &str) -> Result<&FormSchema, SchemaError> {
        self.schemas.get(name).ok_or_else(|| SchemaError::SchemaLoadError {
            schema_name: name.to_string(),
            reason: "schema not registered".into(),
        })
    }

    /// Names of all loaded schemas, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn parse(name: &str, raw: &str) -> Result<FormSchema, SchemaError> {
    let json: Value = serde_json::from_str(raw).map_err(|e| SchemaError::SchemaLoadError {
        schema_name: name.to_string(),
        reason: format!("invalid JSON: {e}"),
    })?;
    FormSchema::new(name, json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use kyc_core::{ClientContext, FormValues};
    use kyc_fields::FieldRegistry;
    use serde_json::json;

    use crate::filter::filter_schema;

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
    fn builtin_schemas_compile() {
        let registry = SchemaRegistry::builtin().unwrap();
        assert_eq!(registry.len(), BUILTIN.len());
        assert!(registry.get("company-identification").is_ok());
        assert!(registry.get("nope").is_err());
    }

    #[test]
    fn builtin_schemas_only_name_registered_fields() {
        let schemas = SchemaRegistry::builtin().unwrap();
        let fields = FieldRegistry::builtin().unwrap();
        for name in schemas.names() {
            let schema = schemas.get(name).unwrap();
            for field in schema.field_names() {
                assert!(fields.contains(field), "{name} names unregistered field {field}");
            }
            filter_schema(schema, &fields, &ClientContext::default(), None).unwrap();
        }
    }

    #[test]
    fn load_dir_reads_schema_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("custom.schema.json"),
            r#"{ "type": "object", "properties": { "dbaName": { "type": "string" } } }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let registry = SchemaRegistry::load_dir(dir.path()).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), ["custom"]);
    }

    #[test]
    fn load_dir_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.schema.json"), "{").unwrap();
        let err = SchemaRegistry::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, SchemaError::SchemaLoadError { .. }));
    }

    #[test]
    fn website_required_unless_not_available() {
        let schemas = SchemaRegistry::builtin().unwrap();
        let fields = FieldRegistry::builtin().unwrap();
        let schema = filter_schema(
            schemas.get("customer-facing-details").unwrap(),
            &fields,
            &ClientContext::default(),
            None,
        )
        .unwrap();

        let missing = values(json!({ "dbaName": "Acme", "website": "", "websiteNotAvailable": false }));
        let err = schema.safe_parse_on(&missing, today()).unwrap_err();
        assert!(err.violations().unwrap().has_field("website"));

        let opted_out = values(json!({ "dbaName": "Acme", "website": "", "websiteNotAvailable": true }));
        assert!(schema.safe_parse_on(&opted_out, today()).is_ok());
    }

    #[test]
    fn hidden_dba_name_skips_its_refinement() {
        let schemas = SchemaRegistry::builtin().unwrap();
        let fields = FieldRegistry::builtin().unwrap();
        let ctx = ClientContext::default()
            .with_product("MERCHANT_SERVICES")
            .with_jurisdiction("CA");
        let schema =
            filter_schema(schemas.get("customer-facing-details").unwrap(), &fields, &ctx, None)
                .unwrap();
        let form = values(json!({ "website": "https://acme.example", "websiteNotAvailable": false }));
        assert!(schema.safe_parse_on(&form, today()).is_ok());
    }

    #[test]
    fn ein_required_for_us_companies_unless_declined() {
        let schemas = SchemaRegistry::builtin().unwrap();
        let fields = FieldRegistry::builtin().unwrap();
        let sole = ClientContext::default().with_entity_type("SOLE_PROPRIETORSHIP");
        let schema =
            filter_schema(schemas.get("company-identification").unwrap(), &fields, &sole, None)
                .unwrap();
        let base = json!({
            "organizationName": "N/A",
            "yearOfFormation": "2015",
            "countryOfFormation": "US",
            "organizationIdEin": ""
        });

        let mut yes = values(base.clone());
        yes.insert("solePropHasEin".into(), json!("yes"));
        let err = schema.safe_parse_on(&yes, today()).unwrap_err();
        assert!(err.violations().unwrap().has_field("organizationIdEin"));

        let mut no = values(base);
        no.insert("solePropHasEin".into(), json!("no"));
        assert!(schema.safe_parse_on(&no, today()).is_ok());
    }

    #[test]
    fn year_of_formation_rules() {
        let schemas = SchemaRegistry::builtin().unwrap();
        let fields = FieldRegistry::builtin().unwrap();
        let schema = filter_schema(
            schemas.get("company-identification").unwrap(),
            &fields,
            &ClientContext::default(),
            None,
        )
        .unwrap();
        let form = |year: &str| {
            values(json!({
                "organizationName": "Acme Inc",
                "yearOfFormation": year,
                "countryOfFormation": "CA"
            }))
        };
        assert!(schema.safe_parse_on(&form("2019"), today()).is_ok());
        assert!(schema.safe_parse_on(&form("1799"), today()).is_err());
        assert!(schema.safe_parse_on(&form("2099"), today()).is_err());
    }
}
