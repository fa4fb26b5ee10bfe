//! # attrkit
//!
//! attrkit is a **declarative attribute layer** for host types: typed,
//! defaulted, validated, diffable instance state without hand-written
//! accessor boilerplate. A host type attaches a [`Schema`] — built once, up
//! front, through a fluent builder — and constructs immutable [`Record`]s
//! from plain input maps.
//!
//! ## The three moving parts
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Schema (schema/)                                           │
//! │  - Ordered registry of attribute definitions                │
//! │  - Defaults, requiredness, accept/reject rules, freeze      │
//! │    modes, visibility                                        │
//! │  - Derivation: extend() snapshots a parent registry         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ materialize(input)
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Record (record/)                                           │
//! │  - Immutable: built once, never reassigned                  │
//! │  - Public snapshot + slicing/selection queries              │
//! │  - "Mutation" = with_attribute() → a brand-new record       │
//! │  - diff() computes per-attribute changes on demand          │
//! └─────────────────────────────────────────────────────────────┘
//!                              ▲
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Features (features)                                        │
//! │  - Cross-cutting behaviors as canonical, cached bundles     │
//! │  - strict axes supersede plain ones; equal requests are     │
//! │    pointer-equal                                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick example
//!
//! ```
//! use attrkit::{attr_map, features, AttrOptions, Schema, Value};
//!
//! let sum = Schema::builder("Sum")
//!     .features(features::with(&["initialize"]).unwrap())
//!     .attribute("a", AttrOptions::new().default(2)).unwrap()
//!     .attribute("b", AttrOptions::new().default(2)).unwrap()
//!     .build();
//!
//! let both_defaulted = sum.materialize(attr_map! {}).unwrap();
//! let a = both_defaulted.get("a").and_then(Value::as_int).unwrap();
//! let b = both_defaulted.get("b").and_then(Value::as_int).unwrap();
//! assert_eq!(a + b, 4);
//!
//! let one_given = sum.materialize(attr_map! { "a" => 1 }).unwrap();
//! assert_eq!(one_given.get("a"), Some(&Value::from(1)));
//! assert_eq!(one_given.get("b"), Some(&Value::from(2)));
//! ```
//!
//! ## Design rules
//!
//! - **Schemas are explicit objects** with a build-once lifecycle, passed by
//!   handle — never implicit global state. Derived schemas copy their parent's
//!   registry; the parent can never be mutated through a child.
//! - **Records are immutable.** Construction either returns a fully resolved,
//!   validated record or an error; no half-built record escapes.
//! - **Rules are data.** Validation rules and default rules are explicit sum
//!   types chosen at schema-build time, not discovered per value.
//! - **Features compose.** Behavior bundles are canonicalized and memoized, so
//!   bundle identity is reference identity.
//!
//! ## Module overview
//!
//! - [`schema`]: registry, declaration builder, derivation, option parsing
//! - [`record`]: materialization pipeline, query surface, diffing
//! - [`features`]: behavior-bundle composition and cache
//! - [`value`]: the dynamic [`Value`] payload and its JSON interop
//! - [`validate`]: accept/reject rules and messages
//! - [`key`]: key policies and output casing
//! - [`external`]: integration seam for outside validation frameworks
//! - [`error`]: error types

pub mod error;
pub mod external;
pub mod features;
pub mod key;
pub mod record;
pub mod schema;
pub mod validate;
pub mod value;

pub use error::{AttrError, Result};
pub use external::ExternalValidations;
pub use features::{Feature, FeatureBundle};
pub use key::{KeyCase, KeyPolicy};
pub use record::{Changes, Delta, Record, Select};
pub use schema::{
    AttrOptions, AttributeDef, DefaultRule, FreezeMode, Schema, SchemaBuilder, SchemaExtender,
    Visibility,
};
pub use validate::{Polarity, Predicate, Rule, Validation};
pub use value::{AttrMap, Callable, Data, Value, ValueKind};

/// Build an [`AttrMap`] from `key => value` pairs.
///
/// Values go through [`Value::from`], so plain literals work:
///
/// ```
/// use attrkit::{attr_map, Value};
///
/// let input = attr_map! { "a" => 1, "name" => "x" };
/// assert_eq!(input.get("a"), Some(&Value::from(1)));
/// ```
#[macro_export]
macro_rules! attr_map {
    () => { $crate::AttrMap::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::AttrMap::new();
        $( map.insert(($key).to_string(), $crate::Value::from($value)); )+
        map
    }};
}
