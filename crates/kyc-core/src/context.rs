//! # Client Context
//!
//! The `{product, jurisdiction, entityType}` tuple that selects which
//! conditional field rules apply. It is derived from the latest fetched
//! client on every evaluation and never persisted.
//!
//! An optional `screen_id` component lets rules vary by the screen a form
//! is rendered on (the same personal-details form asks for the nature of
//! ownership only when editing a beneficial owner).

use serde::{Deserialize, Serialize};

use crate::client::{ClientResponse, PartyResponse};

/// Derived context for rule evaluation. Absent components match only
/// conditions that do not constrain them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jurisdiction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_id: Option<String>,
}

impl ClientContext {
    /// Derive the context from a fetched client.
    ///
    /// - `product` is the first entry of `products`.
    /// - `jurisdiction` and `entity_type` come from the organization party's
    ///   `organizationDetails.jurisdiction` and `organizationType`.
    ///
    /// A missing client yields the empty context.
    pub fn resolve(client: Option<&ClientResponse>) -> Self {
        let Some(client) = client else {
            return Self::default();
        };
        let mut ctx = client
            .organization_party()
            .map(Self::from_organization)
            .unwrap_or_default();
        ctx.product = client.products.first().cloned();
        ctx
    }

    /// Jurisdiction and entity type of a single organization party.
    pub fn from_organization(party: &PartyResponse) -> Self {
        let details = party.organization_details.as_ref();
        Self {
            product: None,
            jurisdiction: details.and_then(|d| d.jurisdiction.clone()),
            entity_type: details.and_then(|d| d.organization_type.clone()),
            screen_id: None,
        }
    }

    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }

    pub fn with_jurisdiction(mut self, jurisdiction: impl Into<String>) -> Self {
        self.jurisdiction = Some(jurisdiction.into());
        self
    }

    pub fn with_entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    /// The same context, scoped to the screen a form is rendered on.
    pub fn with_screen(mut self, screen_id: impl Into<String>) -> Self {
        self.screen_id = Some(screen_id.into());
        self
    }
}

impl std::fmt::Display for ClientContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "product={} jurisdiction={} entityType={}",
            show(&self.product),
            show(&self.jurisdiction),
            show(&self.entity_type)
        )?;
        if let Some(screen) = &self.screen_id {
            write!(f, " screen={screen}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_from_organization_party() {
        let client: ClientResponse = serde_json::from_value(json!({
            "id": "c1",
            "products": ["MERCHANT_SERVICES", "EMBEDDED_PAYMENTS"],
            "parties": [
                {"id": "p0", "partyType": "INDIVIDUAL", "roles": ["CONTROLLER"]},
                {
                    "id": "p1",
                    "partyType": "ORGANIZATION",
                    "roles": ["CLIENT"],
                    "organizationDetails": {
                        "organizationType": "SOLE_PROPRIETORSHIP",
                        "jurisdiction": "CA"
                    }
                }
            ]
        }))
        .unwrap();

        let ctx = ClientContext::resolve(Some(&client));
        assert_eq!(ctx.product.as_deref(), Some("MERCHANT_SERVICES"));
        assert_eq!(ctx.jurisdiction.as_deref(), Some("CA"));
        assert_eq!(ctx.entity_type.as_deref(), Some("SOLE_PROPRIETORSHIP"));
        assert_eq!(ctx.screen_id, None);
    }

    #[test]
    fn missing_client_or_organization_gives_partial_context() {
        assert_eq!(ClientContext::resolve(None), ClientContext::default());

        let client: ClientResponse = serde_json::from_value(json!({
            "id": "c1",
            "products": ["EMBEDDED_PAYMENTS"],
            "parties": []
        }))
        .unwrap();
        let ctx = ClientContext::resolve(Some(&client));
        assert_eq!(ctx, ClientContext::default().with_product("EMBEDDED_PAYMENTS"));
    }

    #[test]
    fn display_is_compact() {
        let ctx = ClientContext::default()
            .with_jurisdiction("US")
            .with_screen("owner-stepper");
        assert_eq!(
            ctx.to_string(),
            "product=- jurisdiction=US entityType=- screen=owner-stepper"
        );
    }
}
