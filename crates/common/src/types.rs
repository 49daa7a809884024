use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates the identifier from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Stock keeping unit. Identifies a product and every batch of it.
    Sku
);

string_id!(
    /// Reference of a stock batch. Unique across all products.
    BatchRef
);

string_id!(
    /// Customer order identifier carried by order lines.
    OrderId
);

/// Version number of a product aggregate, used for optimistic concurrency control.
///
/// Starts at 0 for a new product and is bumped once per successful allocation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    /// Creates a new version from a raw value.
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the initial version (0) for a new product.
    pub fn initial() -> Self {
        Self(0)
    }

    /// Returns the next version.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the raw version value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Version {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Version> for i64 {
    fn from(version: Version) -> Self {
        version.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_ids_compare_by_value() {
        assert_eq!(Sku::new("RED-CHAIR"), Sku::from("RED-CHAIR"));
        assert_ne!(BatchRef::new("batch-001"), BatchRef::new("batch-002"));
    }

    #[test]
    fn string_id_display_is_raw_value() {
        assert_eq!(OrderId::new("order-1").to_string(), "order-1");
        assert_eq!(Sku::new("LAMP").as_str(), "LAMP");
    }

    #[test]
    fn string_id_serializes_transparently() {
        let json = serde_json::to_string(&BatchRef::new("b1")).unwrap();
        assert_eq!(json, "\"b1\"");
        let back: BatchRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, BatchRef::new("b1"));
    }

    #[test]
    fn version_starts_at_zero_and_increments() {
        let version = Version::initial();
        assert_eq!(version.as_i64(), 0);
        assert_eq!(version.next(), Version::new(1));
        assert_eq!(version.next().next().as_i64(), 2);
    }
}
