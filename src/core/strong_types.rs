// Strong Types - Newtype identifiers for every persisted entity
// Keeps a FieldId from ever being passed where a SchemaId is expected

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Get the raw UUID value
            pub fn value(self) -> Uuid {
                self.0
            }

            /// Parse a stored or user-supplied identifier
            pub fn parse(raw: &str) -> Result<Self, String> {
                Uuid::parse_str(raw)
                    .map(Self)
                    .map_err(|e| format!("invalid {} '{}': {}", $label, raw, e))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id!(
    /// Identifier of a bookmark list, the owner of fields, schemas, tags and videos
    ListId,
    "list id"
);
uuid_id!(
    /// Identifier of a user-defined custom field
    FieldId,
    "field id"
);
uuid_id!(
    /// Identifier of a field schema
    SchemaId,
    "schema id"
);
uuid_id!(TagId, "tag id");
uuid_id!(VideoId, "video id");
uuid_id!(ValueId, "value id");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = FieldId::new();
        let b = FieldId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_round_trips_through_display() {
        let id = SchemaId::new();
        let parsed: SchemaId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = VideoId::parse("not-a-uuid").unwrap_err();
        assert!(err.starts_with("invalid video id"));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = TagId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }
}
