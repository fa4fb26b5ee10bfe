//! External validation integration.
//!
//! The crate treats outside validation frameworks as an opaque collaborator
//! behind the [`ExternalValidations`] trait. A schema built with the
//! `external_validations` feature and a registered collaborator will feed it
//! every declared external rule at build time and run it after each
//! materialization, merging its errors into the record's error map. When the
//! feature is requested but no collaborator is attached, the integration
//! degrades to a no-op.

use std::collections::BTreeMap;

use crate::value::AttrMap;

/// Contract for an external validation framework.
pub trait ExternalValidations: Send + Sync {
    /// Register a named validation rule for an attribute. Called once per
    /// declared rule when the schema is built.
    fn add_rule(&self, attribute: &str, rule: &str);

    /// Run every registered validation against the materialized attributes,
    /// returning collected error messages keyed by attribute name.
    fn run(&self, attributes: &AttrMap) -> BTreeMap<String, String>;
}
