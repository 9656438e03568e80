//! Macro for defining strongly-typed identifier newtypes.
//!
//! Asset keys, check names and job names share one invariant: a non-empty
//! lowercase identifier (`[a-z0-9_]`, not starting with a digit). The macro
//! generates the struct, validation, and the usual string-like trait impls.

/// Return `true` if `s` is a valid pipeline identifier.
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Define a strongly-typed identifier newtype.
///
/// Generates:
/// - The struct with `Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize`
/// - Custom `Deserialize` (rejects invalid identifiers)
/// - `try_new()` (returns Option), `as_str()`
/// - `Display`, `AsRef<str>`, `Deref<Target=str>`, `Borrow<str>`
/// - `PartialEq<str>`, `PartialEq<&str>`
macro_rules! define_identifier {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $Name::try_new(s).ok_or_else(|| {
                    serde::de::Error::custom(concat!(
                        stringify!($Name),
                        " must be a lowercase identifier"
                    ))
                })
            }
        }

        impl $Name {
            /// Try to create a new instance, returning `None` unless the
            /// value is a lowercase identifier.
            pub fn try_new(name: impl Into<String>) -> Option<Self> {
                let s = name.into();
                $crate::newtype_string::is_identifier(&s).then_some(Self(s))
            }

            /// Return the underlying name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $Name {
            fn as_ref(&self) -> &str { &self.0 }
        }

        impl std::ops::Deref for $Name {
            type Target = str;
            fn deref(&self) -> &str { &self.0 }
        }

        impl std::borrow::Borrow<str> for $Name {
            fn borrow(&self) -> &str { &self.0 }
        }

        impl PartialEq<str> for $Name {
            fn eq(&self, other: &str) -> bool { self.0 == other }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool { self.0 == *other }
        }
    };
}

define_identifier! {
    /// Name of an asset (a partitioned pipeline stage)
    pub struct AssetKey;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_rules() {
        assert!(is_identifier("raw_asset"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("agg2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2agg"));
        assert!(!is_identifier("Raw"));
        assert!(!is_identifier("raw-asset"));
    }

    #[test]
    fn test_asset_key_serde() {
        let key = AssetKey::try_new("cleaned_asset").unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"cleaned_asset\"");
        assert!(serde_json::from_str::<AssetKey>("\"Not Valid\"").is_err());
        assert_eq!(key, "cleaned_asset");
    }
}
