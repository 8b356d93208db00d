use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("invalid identifier '{value}': expected 64 hex chars")]
    Invalid { value: String },
}

/// Derives a 32-byte identifier from a human-readable label.
///
/// Identifier derivation is a convenience for callers; the core treats all
/// identifiers as uninterpreted keys.
fn hash_label(label: &str) -> [u8; 32] {
    let digest = Sha256::digest(label.as_bytes());
    digest.into()
}

macro_rules! opaque_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; 32]);

        impl $name {
            pub const ZERO: $name = $name([0u8; 32]);

            pub const fn from_bytes(bytes: [u8; 32]) -> Self {
                $name(bytes)
            }

            pub fn from_label(label: &str) -> Self {
                $name(hash_label(label))
            }

            pub fn from_hex(value: impl AsRef<str>) -> Result<Self, IdError> {
                let value = value.as_ref();
                let invalid = || IdError::Invalid {
                    value: value.to_string(),
                };
                let raw = hex::decode(value).map_err(|_| invalid())?;
                let bytes: [u8; 32] = raw.try_into().map_err(|_| invalid())?;
                Ok($name(bytes))
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self)
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $name::from_hex(s).map_err(serde::de::Error::custom)
            }
        }

        impl FromStr for $name {
            type Err = IdError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::from_hex(s)
            }
        }
    };
}

opaque_id!(
    /// Grouping key under which app identifiers are registered.
    AppNamespace
);
opaque_id!(
    /// Opaque identifier for a logical application within an organization.
    AppId
);
opaque_id!(
    /// Opaque identifier naming a class of privileged action.
    Role
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_derivation_is_stable() {
        assert_eq!(AppId::from_label("vault"), AppId::from_label("vault"));
        assert_ne!(AppId::from_label("vault"), AppId::from_label("voting"));
    }

    #[test]
    fn same_label_different_types_share_bytes_but_not_identity() {
        // Identifier kinds are separate types even when derived from the
        // same label; the compiler keeps them apart.
        let ns = AppNamespace::from_label("base");
        let id = AppId::from_label("base");
        assert_eq!(ns.as_bytes(), id.as_bytes());
    }

    #[test]
    fn hex_round_trip() {
        let role = Role::from_label("APP_MANAGER_ROLE");
        let parsed = Role::from_hex(role.to_string()).unwrap();
        assert_eq!(role, parsed);
        assert!(Role::from_hex("abcd").is_err());
    }
}
