//! URL-safe slugs derived from product names.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A normalized, URL-safe identifier derived from a display name.
///
/// Derivation is deterministic: the same name always yields the same slug.
/// A product's slug is re-derived whenever its name changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a display name.
    ///
    /// Lowercases, maps runs of whitespace and separator punctuation to a
    /// single `-`, and drops every other non-alphanumeric character. Fails
    /// only when nothing URL-safe survives.
    pub fn derive(name: &str) -> Result<Self, DomainError> {
        let mut out = String::with_capacity(name.len());
        let mut pending_dash = false;

        for ch in name.trim().chars() {
            if ch.is_alphanumeric() {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                for lower in ch.to_lowercase() {
                    out.push(lower);
                }
            } else if ch.is_whitespace() || matches!(ch, '-' | '_' | '/' | '.') {
                pending_dash = true;
            }
            // Everything else (quotes, emoji, etc.) is dropped outright.
        }

        if out.is_empty() {
            return Err(DomainError::validation(
                "name has no URL-safe characters to slugify",
            ));
        }

        Ok(Self(out))
    }

    /// Wrap an already-normalized slug (e.g. read back from storage).
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Slug {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn derive_lowercases_and_dashes() {
        assert_eq!(Slug::derive("Blue Suede Shoes").unwrap().as_str(), "blue-suede-shoes");
    }

    #[test]
    fn derive_collapses_separator_runs() {
        assert_eq!(Slug::derive("  A  -  B  ").unwrap().as_str(), "a-b");
    }

    #[test]
    fn derive_drops_punctuation() {
        assert_eq!(Slug::derive("Tom's \"Best\" Widget!").unwrap().as_str(), "toms-best-widget");
    }

    #[test]
    fn derive_rejects_empty_result() {
        assert!(Slug::derive("!!!").is_err());
        assert!(Slug::derive("   ").is_err());
    }

    proptest! {
        /// Same name always yields the same slug.
        #[test]
        fn derive_is_deterministic(name in "[A-Za-z0-9 ]{1,64}") {
            prop_assume!(name.trim().chars().any(|c| c.is_alphanumeric()));
            let a = Slug::derive(&name).unwrap();
            let b = Slug::derive(&name).unwrap();
            prop_assert_eq!(a, b);
        }

        /// Slugifying a slug is a no-op (normalization is idempotent).
        #[test]
        fn derive_is_idempotent(name in "[A-Za-z0-9 ]{1,64}") {
            prop_assume!(name.trim().chars().any(|c| c.is_alphanumeric()));
            let once = Slug::derive(&name).unwrap();
            let twice = Slug::derive(once.as_str()).unwrap();
            prop_assert_eq!(once, twice);
        }

        /// Output only ever contains lowercase alphanumerics and dashes.
        #[test]
        fn derive_output_is_url_safe(name in ".{1,64}") {
            if let Ok(slug) = Slug::derive(&name) {
                prop_assert!(slug.as_str().chars().all(|c| c == '-' || c.is_alphanumeric()));
                prop_assert!(!slug.as_str().starts_with('-'));
                prop_assert!(!slug.as_str().ends_with('-'));
            }
        }
    }
}
