//! Attribute key normalization.
//!
//! Every schema owns a [`KeyPolicy`] that decides how attribute keys are
//! canonicalized, both at declaration time and when a construction-input map is
//! consumed. The canonical form is always a snake_case identifier: lowercase
//! ASCII letters, digits and underscores, starting with a letter or underscore.
//!
//! [`KeyCase`] handles the output side: the snapshot query surface can render
//! canonical keys in a different casing (`keys_as`).

use crate::error::{AttrError, Result};

/// How a schema treats incoming attribute keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
    /// Keys are canonicalized before use: trimmed, lowercased, hyphens turned
    /// into underscores. `" Flag-Name "` and `"flag_name"` address the same
    /// attribute.
    #[default]
    Lenient,

    /// Keys must already be canonical snake_case identifiers. Anything else is
    /// rejected at declaration time and silently ignored in construction input.
    Symbol,
}

/// Output casing for snapshot keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCase {
    Snake,
    Kebab,
    Camel,
    Pascal,
}

/// Canonicalize a declaration key under the given policy.
///
/// Fails with [`AttrError::InvalidKey`] when the key cannot be brought into
/// canonical form (empty, bad characters, or — under [`KeyPolicy::Symbol`] —
/// not already canonical).
pub fn normalize(key: &str, policy: KeyPolicy) -> Result<String> {
    match policy {
        KeyPolicy::Lenient => {
            let candidate: String = key
                .trim()
                .chars()
                .map(|ch| match ch {
                    '-' => '_',
                    other => other.to_ascii_lowercase(),
                })
                .collect();
            check_canonical(key, &candidate)?;
            Ok(candidate)
        }
        KeyPolicy::Symbol => {
            check_canonical(key, key)?;
            Ok(key.to_string())
        }
    }
}

/// Canonicalize a construction-input key, dropping keys the policy rejects.
///
/// Unlike [`normalize`], this never fails: an input key that cannot match any
/// declared attribute simply falls out of the map.
pub fn normalize_input(key: &str, policy: KeyPolicy) -> Option<String> {
    normalize(key, policy).ok()
}

fn check_canonical(original: &str, candidate: &str) -> Result<()> {
    let invalid = |reason: String| AttrError::InvalidKey {
        key: original.to_string(),
        reason,
    };

    let mut chars = candidate.chars();
    let first = chars
        .next()
        .ok_or_else(|| invalid("key cannot be empty".into()))?;

    if !(first.is_ascii_lowercase() || first == '_') {
        return Err(invalid(format!(
            "must start with a lowercase letter or underscore, found '{}'",
            first
        )));
    }

    for ch in chars {
        if !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_') {
            return Err(invalid(format!(
                "contains invalid character '{}' (only lowercase letters, digits, and underscores allowed)",
                ch
            )));
        }
    }

    Ok(())
}

/// Render a canonical snake_case key in the requested casing.
pub fn convert(key: &str, case: KeyCase) -> String {
    match case {
        KeyCase::Snake => key.to_string(),
        KeyCase::Kebab => key.replace('_', "-"),
        KeyCase::Camel => camelize(key, false),
        KeyCase::Pascal => camelize(key, true),
    }
}

fn camelize(key: &str, capitalize_first: bool) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = capitalize_first;
    for ch in key.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_normalizes_case_whitespace_and_hyphens() {
        assert_eq!(normalize(" Flag-Name ", KeyPolicy::Lenient).unwrap(), "flag_name");
        assert_eq!(normalize("a", KeyPolicy::Lenient).unwrap(), "a");
        assert_eq!(normalize("A_B2", KeyPolicy::Lenient).unwrap(), "a_b2");
    }

    #[test]
    fn lenient_rejects_unsalvageable_keys() {
        assert!(normalize("", KeyPolicy::Lenient).is_err());
        assert!(normalize("   ", KeyPolicy::Lenient).is_err());
        assert!(normalize("7seas", KeyPolicy::Lenient).is_err());
        assert!(normalize("a b", KeyPolicy::Lenient).is_err());
        assert!(normalize("a.b", KeyPolicy::Lenient).is_err());
    }

    #[test]
    fn symbol_policy_requires_canonical_keys() {
        assert_eq!(normalize("flag_name", KeyPolicy::Symbol).unwrap(), "flag_name");
        assert_eq!(normalize("_x", KeyPolicy::Symbol).unwrap(), "_x");

        assert!(normalize("Flag", KeyPolicy::Symbol).is_err());
        assert!(normalize("flag-name", KeyPolicy::Symbol).is_err());
        assert!(normalize(" flag", KeyPolicy::Symbol).is_err());
    }

    #[test]
    fn input_keys_drop_instead_of_failing() {
        assert_eq!(normalize_input("Flag", KeyPolicy::Symbol), None);
        assert_eq!(
            normalize_input("Flag", KeyPolicy::Lenient),
            Some("flag".to_string())
        );
        assert_eq!(normalize_input("a.b", KeyPolicy::Lenient), None);
    }

    #[test]
    fn casing_conversions() {
        assert_eq!(convert("created_at", KeyCase::Snake), "created_at");
        assert_eq!(convert("created_at", KeyCase::Kebab), "created-at");
        assert_eq!(convert("created_at", KeyCase::Camel), "createdAt");
        assert_eq!(convert("created_at", KeyCase::Pascal), "CreatedAt");
        assert_eq!(convert("a", KeyCase::Camel), "a");
    }
}
