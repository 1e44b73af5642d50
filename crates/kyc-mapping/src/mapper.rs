//! # Value Mapper
//!
//! Converts between the flat form-value map of one party and the nested
//! client API shapes.
//!
//! ## Invariants
//!
//! - Reads and writes resolve the same [`FieldPath`]: a field registered at
//!   `individualDetails.firstName` is read from
//!   `parties.{i}.individualDetails.firstName` and written to
//!   `{parties|addParties}.{i}.individualDetails.firstName`.
//! - A path that resolves to nothing, or to an empty list, yields no form
//!   value at all. Defaults are the caller's concern.
//! - `""` and `null` form values are never written to a request body.
//! - Every form value must name a registered field. Building a request body
//!   from an unregistered name fails with
//!   [`kyc_core::ConfigError::UnknownField`];
//!   form-only fields are registered with `excludeFromMapping`.
//! - Fields excluded from mapping are neither read nor written.
//! - Writes run in registry declaration order, so when two fields share a
//!   path the later-declared one wins.

use std::fmt;

use serde_json::Value;

use kyc_core::{ClientResponse, FieldPath, FormValues, PartyId, PartyResponse};
use kyc_fields::{FieldConfig, FieldRegistry};

use crate::error::MappingError;

/// The party list a request body writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayKey {
    /// Update existing parties.
    Parties,
    /// Create new parties.
    AddParties,
}

impl ArrayKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parties => "parties",
            Self::AddParties => "addParties",
        }
    }

    /// `{array_key}.{index}` as a path prefix.
    pub fn prefix(&self, index: usize) -> FieldPath {
        FieldPath::root().child(self.as_str()).at(index)
    }
}

impl fmt::Display for ArrayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps form values to and from API shapes using a field registry.
#[derive(Debug, Clone, Copy)]
pub struct ValueMapper<'r> {
    registry: &'r FieldRegistry,
}

impl<'r> ValueMapper<'r> {
    pub fn new(registry: &'r FieldRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r FieldRegistry {
        self.registry
    }

    // ─── Response → form ────────────────────────────────────────────

    /// Form values of the party `party_id` within `client`.
    ///
    /// An absent id or an id not found among the parties yields an empty
    /// map.
    pub fn to_form_values(
        &self,
        client: &ClientResponse,
        party_id: Option<&PartyId>,
    ) -> Result<FormValues, MappingError> {
        let Some(index) = party_id.and_then(|id| client.party_index(id)) else {
            return Ok(FormValues::new());
        };
        let root = serde_json::to_value(client)?;
        Ok(self.read(&root, &ArrayKey::Parties.prefix(index)))
    }

    /// Form values of a single party object.
    pub fn party_to_form_values(&self, party: &PartyResponse) -> Result<FormValues, MappingError> {
        let root = serde_json::to_value(party)?;
        Ok(self.read(&root, &FieldPath::root()))
    }

    /// Read every mapped field below `prefix` in `root`.
    pub fn read(&self, root: &Value, prefix: &FieldPath) -> FormValues {
        let mut out = FormValues::new();
        for (config, path) in self.mapped() {
            let Some(raw) = prefix.join(path).get(root) else {
                continue;
            };
            if raw.is_null() || raw.as_array().is_some_and(Vec::is_empty) {
                continue;
            }
            let value = match &config.transform {
                Some(transform) => transform.from_response(raw),
                None => Some(raw.clone()),
            };
            if let Some(value) = value {
                out.insert(config.name.clone(), value);
            }
        }
        out
    }

    // ─── Form → request ─────────────────────────────────────────────

    /// Request body writing `values` into `{array_key}.{party_index}` of
    /// `base`.
    ///
    /// # Errors
    ///
    /// [`MappingError::Config`] when a key of `values` is not registered;
    /// [`MappingError::Write`] when a write collides with `base`.
    pub fn to_request_body(
        &self,
        values: &FormValues,
        party_index: usize,
        array_key: ArrayKey,
        base: Value,
    ) -> Result<Value, MappingError> {
        self.write(values, &array_key.prefix(party_index), base)
    }

    /// Request body for a direct single-party update.
    pub fn to_party_request_body(
        &self,
        values: &FormValues,
        base: Value,
    ) -> Result<Value, MappingError> {
        self.write(values, &FieldPath::root(), base)
    }

    fn write(&self, values: &FormValues, prefix: &FieldPath, base: Value) -> Result<Value, MappingError> {
        let mut body = if base.is_null() {
            Value::Object(Default::default())
        } else {
            base
        };
        for name in values.keys() {
            self.registry.get(name)?;
        }
        for (config, path) in self.mapped() {
            let Some(value) = values.get(&config.name).filter(|v| is_present(v)) else {
                continue;
            };
            let value = match &config.transform {
                Some(transform) => transform.to_request(value),
                None => Some(value.clone()),
            };
            let Some(value) = value else { continue };
            prefix
                .join(path)
                .set(&mut body, value)
                .map_err(|source| MappingError::Write {
                    field: config.name.clone(),
                    source,
                })?;
        }
        Ok(body)
    }

    fn mapped(&self) -> impl Iterator<Item = (&'r FieldConfig, &'r FieldPath)> {
        self.registry
            .mapped()
            .filter_map(|config| config.path.as_ref().map(|path| (config, path)))
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kyc_core::ConfigError;
    use serde_json::json;

    fn registry() -> FieldRegistry {
        FieldRegistry::builtin().unwrap()
    }

    fn client() -> ClientResponse {
        serde_json::from_value(json!({
            "id": "0030000131",
            "status": "NEW",
            "products": ["EMBEDDED_PAYMENTS"],
            "parties": [
                {
                    "id": "2000000111",
                    "partyType": "ORGANIZATION",
                    "roles": ["CLIENT"],
                    "email": "ops@acme.example",
                    "organizationDetails": {
                        "organizationName": "PLACEHOLDER_ORG_NAME",
                        "organizationType": "LIMITED_LIABILITY_COMPANY",
                        "countryOfFormation": "US",
                        "yearOfFormation": "2015",
                        "industry": { "codeType": "NAICS", "code": "541511" },
                        "organizationIds": [{ "idType": "EIN", "issuer": "US", "value": "123456789" }],
                        "phone": { "phoneType": "BUSINESS_PHONE", "countryCode": "+1", "phoneNumber": "7606812444" },
                        "websiteAvailable": false,
                        "addresses": [{
                            "addressType": "BUSINESS_ADDRESS",
                            "addressLines": ["90 Main St", "Suite 2"],
                            "city": "Springfield",
                            "state": "IL",
                            "postalCode": "62701",
                            "country": "US"
                        }],
                        "jurisdiction": "US"
                    }
                },
                {
                    "id": "2000000112",
                    "partyType": "INDIVIDUAL",
                    "roles": ["CONTROLLER"],
                    "individualDetails": {
                        "firstName": "Ada",
                        "lastName": "Lovelace",
                        "individualIds": []
                    }
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn reads_the_requested_party() {
        let registry = registry();
        let mapper = ValueMapper::new(&registry);
        let values = mapper
            .to_form_values(&client(), Some(&PartyId::from("2000000111")))
            .unwrap();
        assert_eq!(values["organizationName"], json!(""));
        assert_eq!(
            values["organizationTypeHierarchy"],
            json!({
                "generalOrganizationType": "REGISTERED_BUSINESS",
                "specificOrganizationType": "LIMITED_LIABILITY_COMPANY"
            })
        );
        assert_eq!(values["industry"], json!("541511"));
        assert_eq!(values["organizationIdEin"], json!("123456789"));
        assert_eq!(values["organizationPhone"]["phoneNumber"], json!("+17606812444"));
        assert_eq!(values["websiteNotAvailable"], json!(true));
        assert_eq!(values["organizationAddress"]["secondaryAddressLine"], json!("Suite 2"));
        assert_eq!(values["organizationEmail"], json!("ops@acme.example"));
        assert!(!values.contains_key("solePropHasEin"));
        assert!(!values.contains_key("controllerFirstName"));
    }

    #[test]
    fn empty_lists_and_missing_paths_are_omitted() {
        let registry = registry();
        let mapper = ValueMapper::new(&registry);
        let values = mapper
            .to_form_values(&client(), Some(&PartyId::from("2000000112")))
            .unwrap();
        assert_eq!(values["controllerFirstName"], json!("Ada"));
        assert!(!values.contains_key("controllerIds"));
        assert!(!values.contains_key("controllerMiddleName"));
    }

    #[test]
    fn unknown_party_yields_empty_values() {
        let registry = registry();
        let mapper = ValueMapper::new(&registry);
        assert!(mapper
            .to_form_values(&client(), Some(&PartyId::from("nope")))
            .unwrap()
            .is_empty());
        assert!(mapper.to_form_values(&client(), None).unwrap().is_empty());
    }

    #[test]
    fn party_scoped_read_skips_the_wrapping() {
        let registry = registry();
        let mapper = ValueMapper::new(&registry);
        let client = client();
        let values = mapper.party_to_form_values(&client.parties[1]).unwrap();
        assert_eq!(values["controllerLastName"], json!("Lovelace"));
    }

    #[test]
    fn writes_into_the_party_array_and_skips_blanks() {
        let registry = registry();
        let mapper = ValueMapper::new(&registry);
        let mut values = FormValues::new();
        values.insert("controllerFirstName".into(), json!("Ada"));
        values.insert("controllerMiddleName".into(), json!(""));
        values.insert("controllerLastName".into(), Value::Null);
        values.insert("controllerPhone".into(), json!({ "phoneType": "MOBILE_PHONE", "phoneNumber": "+447911123456" }));
        values.insert("solePropHasEin".into(), json!("yes"));

        let body = mapper
            .to_request_body(&values, 0, ArrayKey::AddParties, json!({ "addParties": [{ "partyType": "INDIVIDUAL" }] }))
            .unwrap();
        assert_eq!(
            body,
            json!({ "addParties": [{
                "partyType": "INDIVIDUAL",
                "individualDetails": {
                    "firstName": "Ada",
                    "phone": { "phoneType": "MOBILE_PHONE", "countryCode": "+44", "phoneNumber": "7911123456" }
                }
            }]})
        );
    }

    #[test]
    fn unregistered_form_key_is_a_configuration_error() {
        let registry = registry();
        let mapper = ValueMapper::new(&registry);
        let mut values = FormValues::new();
        values.insert("controllerFirstNme".into(), json!("Ada"));

        let err = mapper
            .to_request_body(&values, 0, ArrayKey::Parties, Value::Null)
            .unwrap_err();
        assert!(matches!(
            err,
            MappingError::Config(ConfigError::UnknownField { ref field }) if field == "controllerFirstNme"
        ));
        assert!(matches!(
            mapper.to_party_request_body(&values, Value::Null),
            Err(MappingError::Config(_))
        ));
    }

    #[test]
    fn party_request_body_has_no_wrapping() {
        let registry = registry();
        let mapper = ValueMapper::new(&registry);
        let mut values = FormValues::new();
        values.insert("websiteNotAvailable".into(), json!(true));
        values.insert("organizationIdEin".into(), json!("987654321"));
        let body = mapper.to_party_request_body(&values, Value::Null).unwrap();
        assert_eq!(
            body,
            json!({ "organizationDetails": {
                "websiteAvailable": false,
                "organizationIds": [{ "issuer": "US", "idType": "EIN", "value": "987654321" }]
            }})
        );
    }

    #[test]
    fn write_conflicts_name_the_field() {
        let registry = registry();
        let mapper = ValueMapper::new(&registry);
        let mut values = FormValues::new();
        values.insert("controllerFirstName".into(), json!("Ada"));
        let err = mapper
            .to_party_request_body(&values, json!({ "individualDetails": "oops" }))
            .unwrap_err();
        assert!(matches!(err, MappingError::Write { ref field, .. } if field == "controllerFirstName"));
    }

    mod round_trip {
        use super::*;
        use proptest::prelude::*;

        /// Fields mapped without a transform.
        const PLAIN: &[&str] = &[
            "countryOfFormation",
            "yearOfFormation",
            "dbaName",
            "organizationDescription",
            "website",
            "controllerFirstName",
            "controllerMiddleName",
            "controllerLastName",
            "controllerJobTitle",
            "birthDate",
        ];

        proptest! {
            #[test]
            fn plain_fields_survive_read_write_read(
                texts in prop::collection::vec("[A-Za-z0-9 ]{1,12}", PLAIN.len())
            ) {
                let registry = registry();
                let mapper = ValueMapper::new(&registry);

                let mut party = json!({ "id": "P1", "partyType": "ORGANIZATION" });
                for (name, text) in PLAIN.iter().zip(&texts) {
                    let path = registry.get(name).unwrap().path.clone().unwrap();
                    path.set(&mut party, json!(text)).unwrap();
                }
                let client: ClientResponse =
                    serde_json::from_value(json!({ "id": "C1", "parties": [party] })).unwrap();
                let id = PartyId::from("P1");

                let first = mapper.to_form_values(&client, Some(&id)).unwrap();
                let mut body = mapper
                    .to_request_body(&first, 0, ArrayKey::Parties, Value::Null)
                    .unwrap();
                body["id"] = json!("C1");
                body["parties"][0]["id"] = json!("P1");
                let rebuilt: ClientResponse = serde_json::from_value(body).unwrap();
                let second = mapper.to_form_values(&rebuilt, Some(&id)).unwrap();

                for name in PLAIN {
                    prop_assert_eq!(first.get(*name), second.get(*name));
                }
                prop_assert_eq!(first.len(), second.len());
            }
        }
    }
}
