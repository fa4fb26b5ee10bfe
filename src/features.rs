//! Feature composition.
//!
//! Schemas opt into cross-cutting behaviors by attaching a [`FeatureBundle`]: a
//! canonical, immutable set of [`Feature`] axes. Bundles are memoized for the
//! lifetime of the process — requesting the same set twice (in any order, any
//! casing) returns the *identical* `&'static` bundle, so "do these two schemas
//! carry the same behaviors" is a pointer comparison.
//!
//! Canonicalization: a strict axis supersedes its plain form. Requesting
//! `initialize` together with `initialize_strict` collapses to the strict one,
//! and likewise for `accept` vs `accept_strict`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use once_cell::sync::Lazy;

use crate::error::{AttrError, Result};

/// One behavior axis a schema can opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Feature {
    Accept,
    AcceptStrict,
    Diff,
    ExternalValidations,
    Initialize,
    InitializeStrict,
    KeysAsSymbol,
}

/// Every requestable feature name, sorted; unknown-name errors enumerate this.
pub const FEATURE_NAMES: &[&str] = &[
    "accept",
    "accept_strict",
    "diff",
    "external_validations",
    "initialize",
    "initialize_strict",
    "keys_as_symbol",
];

impl Feature {
    pub fn name(&self) -> &'static str {
        match self {
            Feature::Accept => "accept",
            Feature::AcceptStrict => "accept_strict",
            Feature::Diff => "diff",
            Feature::ExternalValidations => "external_validations",
            Feature::Initialize => "initialize",
            Feature::InitializeStrict => "initialize_strict",
            Feature::KeysAsSymbol => "keys_as_symbol",
        }
    }

    fn named(name: &str) -> Option<Feature> {
        match name {
            "accept" => Some(Feature::Accept),
            "accept_strict" => Some(Feature::AcceptStrict),
            "diff" => Some(Feature::Diff),
            "external_validations" => Some(Feature::ExternalValidations),
            "initialize" => Some(Feature::Initialize),
            "initialize_strict" => Some(Feature::InitializeStrict),
            "keys_as_symbol" => Some(Feature::KeysAsSymbol),
            _ => None,
        }
    }
}

/// An immutable, cached composition of features.
///
/// Obtained from [`with`], [`without`], [`all`], or [`base`] — never
/// constructed directly. Two bundles are interchangeable exactly when they are
/// the same reference.
#[derive(Debug)]
pub struct FeatureBundle {
    key: String,
    features: BTreeSet<Feature>,
}

impl FeatureBundle {
    /// The canonical cache key: surviving feature names, sorted and joined.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.features.iter().map(Feature::name).collect()
    }

    /// Exact membership, after canonicalization.
    pub fn has(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Membership where a strict axis implies its plain form.
    pub fn enables(&self, feature: Feature) -> bool {
        if self.has(feature) {
            return true;
        }
        match feature {
            Feature::Initialize => self.has(Feature::InitializeStrict),
            Feature::Accept => self.has(Feature::AcceptStrict),
            _ => false,
        }
    }
}

static BUNDLES: Lazy<Mutex<HashMap<String, &'static FeatureBundle>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// The bundle for the requested feature names.
///
/// Names are case-insensitive and deduplicated. An empty request or an unknown
/// name is an error.
pub fn with(names: &[&str]) -> Result<&'static FeatureBundle> {
    if names.is_empty() {
        return Err(AttrError::EmptyFeatureRequest);
    }
    let features = parse(names)?;
    Ok(lookup(canonicalize(features)))
}

/// The bundle containing every axis *except* the requested ones.
///
/// The complement is taken over the full axis list, so excluding only a
/// strict variant leaves its plain form in place. Excluding a plain axis also
/// excludes its strict variant (strict implies plain). An empty remainder
/// yields the base bundle.
pub fn without(names: &[&str]) -> Result<&'static FeatureBundle> {
    if names.is_empty() {
        return Err(AttrError::EmptyFeatureRequest);
    }
    let excluded = parse(names)?;

    let mut remainder = every_axis();
    for feature in &excluded {
        remainder.remove(feature);
        match feature {
            Feature::Initialize => {
                remainder.remove(&Feature::InitializeStrict);
            }
            Feature::Accept => {
                remainder.remove(&Feature::AcceptStrict);
            }
            _ => {}
        }
    }

    Ok(lookup(canonicalize(remainder)))
}

/// The bundle with every axis (strict variants superseding plain ones).
pub fn all() -> &'static FeatureBundle {
    lookup(canonicalize(every_axis()))
}

fn every_axis() -> BTreeSet<Feature> {
    [
        Feature::Accept,
        Feature::AcceptStrict,
        Feature::Diff,
        Feature::ExternalValidations,
        Feature::Initialize,
        Feature::InitializeStrict,
        Feature::KeysAsSymbol,
    ]
    .into_iter()
    .collect()
}

/// The no-extra-features bundle.
pub fn base() -> &'static FeatureBundle {
    lookup(BTreeSet::new())
}

fn parse(names: &[&str]) -> Result<BTreeSet<Feature>> {
    names
        .iter()
        .map(|raw| {
            let name = raw.trim().to_ascii_lowercase();
            Feature::named(&name).ok_or_else(|| AttrError::UnknownFeature(raw.to_string()))
        })
        .collect()
}

fn canonicalize(mut features: BTreeSet<Feature>) -> BTreeSet<Feature> {
    if features.contains(&Feature::InitializeStrict) {
        features.remove(&Feature::Initialize);
    }
    if features.contains(&Feature::AcceptStrict) {
        features.remove(&Feature::Accept);
    }
    features
}

fn lookup(features: BTreeSet<Feature>) -> &'static FeatureBundle {
    let key = features
        .iter()
        .map(Feature::name)
        .collect::<Vec<_>>()
        .join("+");

    let mut cache = BUNDLES.lock().expect("feature bundle cache poisoned");
    *cache
        .entry(key.clone())
        .or_insert_with(|| Box::leak(Box::new(FeatureBundle { key, features })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equivalent_requests_share_one_bundle() {
        let a = with(&["diff", "initialize"]).unwrap();
        let b = with(&["INITIALIZE", "diFF"]).unwrap();
        let c = with(&["initialize", "diff", "diff"]).unwrap();

        assert!(std::ptr::eq(a, b));
        assert!(std::ptr::eq(a, c));
        assert_eq!(a.key(), "diff+initialize");
    }

    #[test]
    fn strict_supersedes_plain() {
        let strict_only = with(&["initialize_strict"]).unwrap();
        let both = with(&["initialize", "initialize_strict"]).unwrap();

        assert!(std::ptr::eq(strict_only, both));
        assert!(!both.has(Feature::Initialize));
        assert!(both.has(Feature::InitializeStrict));
        assert!(both.enables(Feature::Initialize));
    }

    #[test]
    fn accept_strict_supersedes_accept() {
        let bundle = with(&["accept", "accept_strict", "diff"]).unwrap();

        assert_eq!(bundle.key(), "accept_strict+diff");
        assert!(bundle.enables(Feature::Accept));
        assert!(!bundle.has(Feature::Accept));
    }

    #[test]
    fn unknown_names_error_and_enumerate_options() {
        let err = with(&["diff", "bogus"]).unwrap_err();
        let message = err.to_string();

        assert!(message.contains("invalid feature name `bogus`"));
        for name in FEATURE_NAMES {
            assert!(message.contains(name), "missing {} in {}", name, message);
        }
    }

    #[test]
    fn empty_requests_are_rejected() {
        assert!(with(&[]).is_err());
        assert!(without(&[]).is_err());
    }

    #[test]
    fn without_drops_the_strict_variant_with_the_plain_axis() {
        let bundle = without(&["initialize"]).unwrap();

        assert!(!bundle.enables(Feature::Initialize));
        assert!(!bundle.has(Feature::InitializeStrict));
        assert!(bundle.has(Feature::Diff));
        assert!(bundle.has(Feature::AcceptStrict));
    }

    #[test]
    fn without_only_the_strict_variant_keeps_the_plain_axis() {
        let bundle = without(&["accept_strict"]).unwrap();

        assert!(bundle.has(Feature::Accept));
        assert!(!bundle.has(Feature::AcceptStrict));
        assert!(bundle.has(Feature::InitializeStrict));
    }

    #[test]
    fn without_everything_is_the_base_bundle() {
        let bundle = without(&[
            "accept",
            "diff",
            "external_validations",
            "initialize",
            "keys_as_symbol",
        ])
        .unwrap();

        assert!(std::ptr::eq(bundle, base()));
        assert_eq!(bundle.key(), "");
        assert!(bundle.names().is_empty());
    }

    #[test]
    fn all_contains_every_axis_with_strict_winning() {
        let bundle = all();

        assert!(bundle.has(Feature::AcceptStrict));
        assert!(bundle.has(Feature::InitializeStrict));
        assert!(bundle.has(Feature::Diff));
        assert!(bundle.has(Feature::ExternalValidations));
        assert!(bundle.has(Feature::KeysAsSymbol));
        assert!(!bundle.has(Feature::Accept));
        assert!(!bundle.has(Feature::Initialize));

        assert!(std::ptr::eq(all(), all()));
    }
}
