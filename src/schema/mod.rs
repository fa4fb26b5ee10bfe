//! Schema registry: per-type attribute definitions.
//!
//! A [`Schema`] is the single source of truth for a host type's attributes —
//! an ordered registry of [`AttributeDef`] entries plus the feature bundle the
//! type opted into. Schemas are built once through [`SchemaBuilder`], are
//! immutable afterwards, and are cheap to clone (records hold the schema they
//! were built from).
//!
//! Deriving a schema from another one goes through [`Schema::extend`], which
//! starts the derived registry from a value-semantics snapshot of the parent:
//! the child can add and *overwrite* entries without ever touching the parent.
//! The overwrite capability only exists on [`SchemaExtender`] — a fresh
//! [`SchemaBuilder`] has no way to force-set an already-declared name.

mod def;
mod options;
pub(crate) mod resolve;

pub use def::{AttrOptions, AttributeDef, DefaultRule, FreezeMode, Visibility};
pub use options::OPTION_KEYS;

use std::fmt;
use std::sync::Arc;

use crate::error::{AttrError, Result};
use crate::external::ExternalValidations;
use crate::features::{self, Feature, FeatureBundle};
use crate::key::{self, KeyPolicy};
use crate::record::Record;
use crate::value::{AttrMap, Value};

struct Inner {
    name: String,
    defs: Vec<AttributeDef>,
    bundle: &'static FeatureBundle,
    external: Option<Arc<dyn ExternalValidations>>,
}

/// An immutable attribute registry for one host type.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<Inner>,
}

impl Schema {
    /// Start a fresh schema.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            defs: Vec::new(),
            bundle: features::base(),
            external: None,
        }
    }

    /// Derive a new schema from this one.
    ///
    /// The extender starts with an independent copy of this schema's
    /// definitions, bundle, and collaborator; changes made through it never
    /// affect `self`.
    pub fn extend(&self, name: impl Into<String>) -> SchemaExtender {
        SchemaExtender {
            builder: SchemaBuilder {
                name: name.into(),
                defs: self.inner.defs.clone(),
                bundle: self.inner.bundle,
                external: self.inner.external.clone(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Declared attribute names, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.inner.defs.iter().map(AttributeDef::name).collect()
    }

    pub fn definitions(&self) -> &[AttributeDef] {
        &self.inner.defs
    }

    /// Look a definition up, normalizing the key under the schema's policy.
    pub fn definition(&self, name: &str) -> Option<&AttributeDef> {
        let key = key::normalize_input(name, self.key_policy())?;
        self.inner.defs.iter().find(|def| def.name() == key)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.definition(name).is_some()
    }

    /// Names that must be present in construction input, in declaration order.
    ///
    /// Explicitly required attributes always count; under strict
    /// initialization every attribute without a default counts too.
    pub fn required_names(&self) -> Vec<&str> {
        let all_without_default = self.inner.bundle.has(Feature::InitializeStrict);
        self.inner
            .defs
            .iter()
            .filter(|def| def.required() || (all_without_default && def.default().is_none()))
            .map(AttributeDef::name)
            .collect()
    }

    pub fn features(&self) -> &'static FeatureBundle {
        self.inner.bundle
    }

    pub fn key_policy(&self) -> KeyPolicy {
        if self.inner.bundle.has(Feature::KeysAsSymbol) {
            KeyPolicy::Symbol
        } else {
            KeyPolicy::Lenient
        }
    }

    pub(crate) fn external(&self) -> Option<&Arc<dyn ExternalValidations>> {
        self.inner.external.as_ref()
    }

    /// Whether two schema handles refer to the same registry.
    pub fn same_as(&self, other: &Schema) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Build a record from a construction-input map.
    pub fn materialize(&self, input: AttrMap) -> Result<Record> {
        crate::record::materialize(self, input)
    }

    /// Build a record from a JSON object.
    ///
    /// Anything other than an object is the classic non-mapping construction
    /// error.
    pub fn materialize_json(&self, json: serde_json::Value) -> Result<Record> {
        match json {
            serde_json::Value::Object(entries) => {
                let input = entries
                    .into_iter()
                    .map(|(key, val)| (key, Value::from_json(val)))
                    .collect();
                self.materialize(input)
            }
            other => Err(AttrError::NotAMap(json_kind(&other))),
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.inner.name)
            .field("attributes", &self.names())
            .field("features", &self.inner.bundle.names())
            .finish()
    }
}

fn json_kind(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "a map",
    }
}

/// Builder for a fresh [`Schema`].
///
/// Select features before declaring attributes: the active bundle decides the
/// key policy declarations are normalized under.
pub struct SchemaBuilder {
    name: String,
    defs: Vec<AttributeDef>,
    bundle: &'static FeatureBundle,
    external: Option<Arc<dyn ExternalValidations>>,
}

impl SchemaBuilder {
    /// Attach a feature bundle (see [`crate::features`]).
    pub fn features(mut self, bundle: &'static FeatureBundle) -> Self {
        self.bundle = bundle;
        self
    }

    /// Attach the external-validations collaborator.
    pub fn external_validator(mut self, collaborator: Arc<dyn ExternalValidations>) -> Self {
        self.external = Some(collaborator);
        self
    }

    /// Declare one attribute. The first declaration of a name wins; declaring
    /// it again is a metadata no-op.
    pub fn attribute(mut self, name: &str, opts: AttrOptions) -> Result<Self> {
        self.declare(name, opts)?;
        Ok(self)
    }

    /// Declare several attributes sharing one option set.
    pub fn attributes(mut self, names: &[&str], shared: AttrOptions) -> Result<Self> {
        for name in names {
            self.declare(name, shared.clone())?;
        }
        Ok(self)
    }

    /// Declare one attribute from a dynamic option map (see
    /// [`AttrOptions::from_map`]).
    pub fn attribute_from_map(self, name: &str, map: &AttrMap) -> Result<Self> {
        let opts = AttrOptions::from_map(map)?;
        self.attribute(name, opts)
    }

    pub fn build(self) -> Schema {
        if let Some(external) = &self.external {
            if self.bundle.has(Feature::ExternalValidations) {
                for def in &self.defs {
                    for rule in def.external_rules() {
                        external.add_rule(def.name(), rule);
                    }
                }
            }
        }

        Schema {
            inner: Arc::new(Inner {
                name: self.name,
                defs: self.defs,
                bundle: self.bundle,
                external: self.external,
            }),
        }
    }

    fn key_policy(&self) -> KeyPolicy {
        if self.bundle.has(Feature::KeysAsSymbol) {
            KeyPolicy::Symbol
        } else {
            KeyPolicy::Lenient
        }
    }

    fn declare(&mut self, name: &str, opts: AttrOptions) -> Result<()> {
        let key = key::normalize(name, self.key_policy())?;
        if self.defs.iter().any(|def| def.name() == key) {
            return Ok(());
        }
        self.defs.push(opts.into_def(key));
        Ok(())
    }

    fn overwrite_entry(&mut self, name: &str, opts: AttrOptions) -> Result<()> {
        let key = key::normalize(name, self.key_policy())?;
        let def = opts.into_def(key.clone());
        match self.defs.iter().position(|existing| existing.name() == key) {
            Some(position) => self.defs[position] = def,
            None => self.defs.push(def),
        }
        Ok(())
    }
}

/// Builder for a schema derived from an existing one.
///
/// Everything a [`SchemaBuilder`] can do, plus the force path: [`overwrite`]
/// replaces inherited metadata in place (last write wins), keeping the
/// attribute's original declaration position.
///
/// [`overwrite`]: SchemaExtender::overwrite
pub struct SchemaExtender {
    builder: SchemaBuilder,
}

impl std::fmt::Debug for SchemaExtender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaExtender").finish_non_exhaustive()
    }
}

impl SchemaExtender {
    pub fn features(mut self, bundle: &'static FeatureBundle) -> Self {
        self.builder = self.builder.features(bundle);
        self
    }

    pub fn external_validator(mut self, collaborator: Arc<dyn ExternalValidations>) -> Self {
        self.builder = self.builder.external_validator(collaborator);
        self
    }

    /// Declare a new attribute; a no-op for names the parent already declared.
    pub fn attribute(mut self, name: &str, opts: AttrOptions) -> Result<Self> {
        self.builder.declare(name, opts)?;
        Ok(self)
    }

    pub fn attributes(mut self, names: &[&str], shared: AttrOptions) -> Result<Self> {
        for name in names {
            self.builder.declare(name, shared.clone())?;
        }
        Ok(self)
    }

    /// Force-set metadata for a name, declared or not.
    pub fn overwrite(mut self, name: &str, opts: AttrOptions) -> Result<Self> {
        self.builder.overwrite_entry(name, opts)?;
        Ok(self)
    }

    /// Force-set metadata for several names at once.
    pub fn overwrite_many(mut self, entries: Vec<(&str, AttrOptions)>) -> Result<Self> {
        if entries.is_empty() {
            return Err(AttrError::EmptyOverwrite);
        }
        for (name, opts) in entries {
            self.builder.overwrite_entry(name, opts)?;
        }
        Ok(self)
    }

    pub fn build(self) -> Schema {
        self.builder.build()
    }
}
