//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.
//!
//! IDs are opaque strings. Catalog product IDs and user IDs both come from
//! systems we don't own (the catalog importer and the identity provider), so
//! we never assume a numeric format.

/// Errors that can occur when parsing an ID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The input was empty or whitespace.
    #[error("id cannot be empty")]
    Empty,
    /// The input is a serialized "missing value" marker such as `undefined`.
    #[error("id is a missing-value marker: {0}")]
    MissingMarker(String),
}

/// Literal strings that upstream clients send when an ID was never set.
const MISSING_MARKERS: &[&str] = &["undefined", "null"];

/// Check whether a raw ID string is usable as an entity reference.
///
/// # Errors
///
/// Returns `IdError::Empty` for blank input and `IdError::MissingMarker` for
/// `"undefined"` / `"null"`.
pub fn validate_raw_id(raw: &str) -> Result<(), IdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdError::Empty);
    }
    if MISSING_MARKERS.contains(&trimmed) {
        return Err(IdError::MissingMarker(trimmed.to_owned()));
    }
    Ok(())
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Construction: `parse()` (validated) and `From<String>` / `From<&str>` (unchecked)
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations as `TEXT` (with `postgres` feature)
///
/// Unchecked construction exists because IDs also arrive from trusted storage
/// and session state; code handling untrusted identities should call
/// [`is_valid`](UserId::is_valid) or use `parse()`.
///
/// # Example
///
/// ```rust
/// # use sugarloaf_core::define_id;
/// define_id!(UserId);
/// define_id!(OrderId);
///
/// let user_id = UserId::parse("u1").unwrap();
/// let order_id = OrderId::from("u1");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = order_id;
/// # let _ = (user_id, order_id);
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse a validated ID from a raw string.
            ///
            /// # Errors
            ///
            /// Returns an error if the input is blank or a missing-value marker.
            pub fn parse(raw: &str) -> ::core::result::Result<Self, $crate::types::id::IdError> {
                $crate::types::id::validate_raw_id(raw)?;
                Ok(Self(raw.trim().to_owned()))
            }

            /// Whether this ID would pass [`parse`](Self::parse).
            #[must_use]
            pub fn is_valid(&self) -> bool {
                $crate::types::id::validate_raw_id(&self.0).is_ok()
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(ProductId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let id = UserId::parse("u1").unwrap();
        assert_eq!(id.as_str(), "u1");
        assert!(id.is_valid());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id = ProductId::parse("  p1 ").unwrap();
        assert_eq!(id.as_str(), "p1");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(UserId::parse(""), Err(IdError::Empty));
        assert_eq!(UserId::parse("   "), Err(IdError::Empty));
    }

    #[test]
    fn test_parse_rejects_missing_markers() {
        assert!(matches!(
            UserId::parse("undefined"),
            Err(IdError::MissingMarker(_))
        ));
        assert!(matches!(
            UserId::parse("null"),
            Err(IdError::MissingMarker(_))
        ));
    }

    #[test]
    fn test_unchecked_construction_reports_validity() {
        assert!(!UserId::from("undefined").is_valid());
        assert!(!UserId::from(String::new()).is_valid());
        assert!(UserId::from("65f0c1").is_valid());
    }

    #[test]
    fn test_serde_transparent() {
        let id = ProductId::from("p1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p1\"");
        let parsed: ProductId = serde_json::from_str("\"p1\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_display() {
        assert_eq!(UserId::from("u42").to_string(), "u42");
    }
}
