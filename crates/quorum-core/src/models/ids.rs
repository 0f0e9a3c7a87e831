//! Identifier newtypes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new unique ID using UUID v7
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Get the string representation of this ID
            #[must_use]
            pub fn as_str(&self) -> String {
                self.0.to_string()
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
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s.trim())?))
            }
        }
    };
}

define_id!(
    /// Identifier of an idea (the proposal suggestions attach to)
    IdeaId
);
define_id!(
    /// Identifier of a suggestion
    SuggestionId
);
define_id!(
    /// Identifier of a user (author, actor, resolver)
    UserId
);
define_id!(
    /// Identifier of a persisted suggestion conflict
    ConflictId
);
define_id!(
    /// Identifier of a persisted merge record
    MergeId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique() {
        assert_ne!(SuggestionId::new(), SuggestionId::new());
    }

    #[test]
    fn test_id_parse_roundtrip_trims_whitespace() {
        let id = MergeId::new();
        let parsed: MergeId = format!("  {id} ").parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = UserId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }

    #[test]
    fn test_invalid_id_rejected() {
        assert!("not-a-uuid".parse::<IdeaId>().is_err());
    }
}
