//! Domain identifier types
//!
//! Entities are addressed by stable UUID newtypes. Relationships between
//! entities (file metadata → data file, lock → user, category → file metadata)
//! are expressed through these ids rather than object pointers.
//!
//! [`GlobalId`] is the persistent identifier triple (protocol, authority,
//! local identifier) registered with an external registry.

use crate::domain::errors::IdentifierError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random id
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID
            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            /// Returns the inner UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
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
                Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|e| format!("Invalid {} '{}': {}", stringify!($name), s, e))
            }
        }
    };
}

entity_id!(
    /// Dataset identity
    DatasetId
);
entity_id!(
    /// Dataset version identity
    VersionId
);
entity_id!(
    /// Data file identity
    DataFileId
);
entity_id!(
    /// File metadata identity (one per file per version)
    FileMetadataId
);
entity_id!(
    /// Dataset lock identity
    LockId
);
entity_id!(
    /// Authenticated user identity
    UserId
);
entity_id!(
    /// User notification identity
    NotificationId
);

/// Persistent identifier triple
///
/// Rendered as `{protocol}:{authority}/{identifier}`, e.g. `doi:10.5072/FK2ABCDEF`.
///
/// # Examples
///
/// ```
/// use cairn::domain::ids::GlobalId;
///
/// let id: GlobalId = "doi:10.5072/FK2ABCDEF".parse().unwrap();
/// assert_eq!(id.protocol, "doi");
/// assert_eq!(id.authority, "10.5072");
/// assert_eq!(id.identifier, "FK2ABCDEF");
/// assert_eq!(id.to_string(), "doi:10.5072/FK2ABCDEF");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalId {
    /// Protocol, e.g. `doi` or `hdl`
    pub protocol: String,

    /// Naming authority, e.g. `10.5072`
    pub authority: String,

    /// Local identifier below the authority (may contain `/` for file ids)
    pub identifier: String,
}

impl GlobalId {
    /// Creates a new global id, rejecting empty parts
    pub fn new(
        protocol: impl Into<String>,
        authority: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Result<Self, IdentifierError> {
        let id = Self {
            protocol: protocol.into(),
            authority: authority.into(),
            identifier: identifier.into(),
        };
        if id.protocol.trim().is_empty()
            || id.authority.trim().is_empty()
            || id.identifier.trim().is_empty()
        {
            return Err(IdentifierError::InvalidGlobalId(format!(
                "protocol, authority and identifier must be non-empty: {id}"
            )));
        }
        Ok(id)
    }

    /// Returns a copy with a different local identifier
    pub fn with_identifier(&self, identifier: impl Into<String>) -> Self {
        Self {
            protocol: self.protocol.clone(),
            authority: self.authority.clone(),
            identifier: identifier.into(),
        }
    }

    /// Authority and identifier without protocol (`10.5072/FK2ABCDEF`)
    pub fn authority_and_identifier(&self) -> String {
        format!("{}/{}", self.authority, self.identifier)
    }
}

impl fmt::Display for GlobalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.protocol, self.authority, self.identifier)
    }
}

impl FromStr for GlobalId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (protocol, rest) = s
            .split_once(':')
            .ok_or_else(|| IdentifierError::InvalidGlobalId(s.to_string()))?;
        let (authority, identifier) = rest
            .split_once('/')
            .ok_or_else(|| IdentifierError::InvalidGlobalId(s.to_string()))?;
        Self::new(protocol, authority, identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_unique() {
        assert_ne!(DatasetId::new(), DatasetId::new());
    }

    #[test]
    fn test_entity_id_round_trips_through_display() {
        let id = DataFileId::new();
        let parsed: DataFileId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_entity_id_invalid() {
        let err = "not-a-uuid".parse::<LockId>().unwrap_err();
        assert!(err.contains("LockId"));
    }

    #[test]
    fn test_global_id_parse_file_identifier() {
        let id: GlobalId = "doi:10.5072/FK2ABCDEF/3".parse().unwrap();
        assert_eq!(id.identifier, "FK2ABCDEF/3");
        assert_eq!(id.authority_and_identifier(), "10.5072/FK2ABCDEF/3");
    }

    #[test]
    fn test_global_id_invalid() {
        assert!("10.5072/FK2".parse::<GlobalId>().is_err());
        assert!("doi:10.5072".parse::<GlobalId>().is_err());
        assert!(GlobalId::new("doi", "", "X").is_err());
    }

    #[test]
    fn test_global_id_with_identifier() {
        let id = GlobalId::new("doi", "10.5072", "FK2AAAAAA").unwrap();
        let other = id.with_identifier("FK2BBBBBB");
        assert_eq!(other.protocol, "doi");
        assert_eq!(other.identifier, "FK2BBBBBB");
    }

    #[test]
    fn test_global_id_serialization() {
        let id = GlobalId::new("hdl", "1902.1", "10045").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        let back: GlobalId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
