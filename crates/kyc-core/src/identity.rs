//! # Identifier Newtypes
//!
//! The client-management API issues opaque string identifiers. Wrapping
//! them prevents passing a party id where a client id is expected.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Access the raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

string_id!(
    /// Identifier of an onboarding client (the application as a whole).
    ClientId
);

string_id!(
    /// Identifier of a party (organization or individual) on a client.
    PartyId
);

string_id!(
    /// Identifier of a document request raised against a client or party.
    DocumentRequestId
);

string_id!(
    /// Identifier of a due-diligence question.
    QuestionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_transparently() {
        let id = PartyId::new("2000000111");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"2000000111\"");
        let back: PartyId = serde_json::from_str("\"2000000111\"").unwrap();
        assert_eq!(back, id);
        assert_eq!(id.to_string(), "2000000111");
    }
}
