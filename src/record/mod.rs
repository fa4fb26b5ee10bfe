//! Materialized instances and their query surface.
//!
//! A [`Record`] is the immutable result of running a construction-input map
//! through a schema: every declared attribute resolved, validated, and stored.
//! Public attributes are mirrored into the externally visible snapshot;
//! private and protected values are stored but kept out of it. There is no
//! mutating surface — "changing" a record means building a new one through
//! [`Record::with_attribute`] or [`Record::with_attributes`].

mod diff;
mod materialize;

pub use diff::{Changes, Delta};
pub(crate) use materialize::materialize;

use crate::error::{AttrError, Result};
use crate::features::Feature;
use crate::key::{self, KeyCase};
use crate::schema::{Schema, Visibility};
use crate::value::{AttrMap, Value};

/// One materialized instance of a schema.
#[derive(Debug, Clone)]
pub struct Record {
    schema: Schema,
    stored: AttrMap,
    snapshot: AttrMap,
    errors: Vec<(String, String)>,
}

impl Record {
    pub(crate) fn assemble(
        schema: Schema,
        stored: AttrMap,
        snapshot: AttrMap,
        errors: Vec<(String, String)>,
    ) -> Record {
        Record {
            schema,
            stored,
            snapshot,
            errors,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Declared attribute names, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.schema.names()
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.schema.has_attribute(name)
    }

    /// The public snapshot: every public attribute, `Nil` when unset.
    pub fn attributes(&self) -> &AttrMap {
        &self.snapshot
    }

    /// Start a snapshot query (slicing, extra entries, output casing).
    pub fn select(&self) -> Select<'_> {
        Select {
            record: self,
            only: None,
            with: Vec::new(),
            without: Vec::new(),
            keys_as: None,
        }
    }

    /// Look an attribute up leniently: `None` for undeclared names, the stored
    /// value otherwise — visibility does not hide a value from this accessor.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let def = self.schema.definition(name)?;
        self.stored.get(def.name())
    }

    /// [`get`](Record::get) with a transform applied to the found value.
    pub fn get_with<T>(&self, name: &str, f: impl FnOnce(&Value) -> T) -> Option<T> {
        self.get(name).map(f)
    }

    /// Look an attribute up strictly, distinguishing undefined names from
    /// declared-but-inaccessible ones.
    pub fn fetch(&self, name: &str) -> Result<&Value> {
        let def = self
            .schema
            .definition(name)
            .ok_or_else(|| AttrError::UndefinedAttribute(name.to_string()))?;

        match def.visibility() {
            Visibility::Private => Err(AttrError::PrivateAttribute(def.name().to_string())),
            Visibility::Protected => Err(AttrError::ProtectedAttribute(def.name().to_string())),
            Visibility::Public => Ok(self
                .stored
                .get(def.name())
                .expect("declared attributes are always assigned")),
        }
    }

    // --- accept surface ---

    /// Validation errors, as (name, message) pairs in declaration order.
    pub fn errors(&self) -> &[(String, String)] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn error_for(&self, name: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|(errored, _)| errored == name)
            .map(|(_, message)| message.as_str())
    }

    /// Names that failed validation, in declaration order.
    pub fn rejected_names(&self) -> Vec<&str> {
        self.errors.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Declared names minus the rejected ones, in declaration order.
    pub fn accepted_names(&self) -> Vec<&str> {
        self.schema
            .names()
            .into_iter()
            .filter(|name| self.error_for(name).is_none())
            .collect()
    }

    // --- mutation via construction ---

    /// Build a new record with one attribute replaced.
    ///
    /// The merged map of stored values and the override runs through the full
    /// materialization pipeline; `self` is untouched. Requires the
    /// `initialize` axis.
    pub fn with_attribute(&self, name: &str, value: impl Into<Value>) -> Result<Record> {
        let mut overrides = AttrMap::new();
        overrides.insert(name.to_string(), value.into());
        self.with_attributes(overrides)
    }

    /// Build a new record with several attributes replaced.
    pub fn with_attributes(&self, overrides: AttrMap) -> Result<Record> {
        if !self.schema.features().enables(Feature::Initialize) {
            return Err(AttrError::FeatureDisabled("initialize"));
        }

        let mut merged = self.stored.clone();
        for (raw, value) in overrides {
            // keys the policy rejects cannot address an attribute; skip them
            if let Some(key) = key::normalize_input(&raw, self.schema.key_policy()) {
                merged.insert(key, value);
            }
        }
        self.schema.materialize(merged)
    }

    // --- diff ---

    /// Compute the attribute differences between two records of the same
    /// schema. Requires the `diff` axis.
    pub fn diff(&self, other: &Record) -> Result<Changes> {
        if !self.schema.features().has(Feature::Diff) {
            return Err(AttrError::FeatureDisabled("diff"));
        }
        if !self.schema.same_as(&other.schema) {
            return Err(AttrError::SchemaMismatch(self.schema.name().to_string()));
        }
        Ok(Changes::between(self, other))
    }
}

/// Snapshot query builder returned by [`Record::select`].
pub struct Select<'a> {
    record: &'a Record,
    only: Option<Vec<String>>,
    with: Vec<(String, Value)>,
    without: Vec<String>,
    keys_as: Option<KeyCase>,
}

impl<'a> Select<'a> {
    /// Restrict the result to these attribute names.
    pub fn only(mut self, names: &[&str]) -> Self {
        let policy = self.record.schema.key_policy();
        self.only = Some(
            names
                .iter()
                .filter_map(|name| key::normalize_input(name, policy))
                .collect(),
        );
        self
    }

    /// Add an extra, caller-computed entry to the result.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.with.push((name.to_string(), value.into()));
        self
    }

    /// Drop these attribute names from the result.
    pub fn without(mut self, names: &[&str]) -> Self {
        let policy = self.record.schema.key_policy();
        self.without.extend(
            names
                .iter()
                .filter_map(|name| key::normalize_input(name, policy)),
        );
        self
    }

    /// Render result keys in a different casing.
    pub fn keys_as(mut self, case: KeyCase) -> Self {
        self.keys_as = Some(case);
        self
    }

    pub fn collect(self) -> AttrMap {
        let mut result = AttrMap::new();

        match &self.only {
            Some(names) => {
                for name in names {
                    if let Some(value) = self.record.snapshot.get(name) {
                        result.insert(name.clone(), value.clone());
                    }
                }
            }
            None => result = self.record.snapshot.clone(),
        }

        for name in &self.without {
            result.remove(name);
        }

        for (name, value) in self.with {
            result.insert(name, value);
        }

        match self.keys_as {
            None => result,
            Some(case) => result
                .into_iter()
                .map(|(name, value)| (key::convert(&name, case), value))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attr_map;
    use crate::features;
    use crate::schema::AttrOptions;
    use crate::validate::Rule;
    use crate::value::ValueKind;

    fn person() -> Record {
        Schema::builder("Person")
            .features(features::with(&["initialize", "accept"]).unwrap())
            .attribute("name", AttrOptions::new().reject(Rule::Predicate(crate::validate::Predicate::Empty)))
            .unwrap()
            .attribute("age", AttrOptions::new().default(0))
            .unwrap()
            .attribute("secret", AttrOptions::new().private().default("s3cr3t"))
            .unwrap()
            .attribute("lineage", AttrOptions::new().protected())
            .unwrap()
            .build()
            .materialize(attr_map! { "name" => "Rodrigo", "age" => 33 })
            .unwrap()
    }

    #[test]
    fn snapshot_covers_public_attributes_only() {
        let record = person();

        let snapshot = record.attributes();
        assert_eq!(snapshot.get("name"), Some(&Value::str("Rodrigo")));
        assert_eq!(snapshot.get("age"), Some(&Value::from(33)));
        assert!(!snapshot.contains_key("secret"));
        assert!(!snapshot.contains_key("lineage"));
    }

    #[test]
    fn lenient_lookup_sees_private_values_strict_lookup_refuses() {
        let record = person();

        assert_eq!(record.get("secret"), Some(&Value::str("s3cr3t")));
        assert_eq!(record.get("missing"), None);

        assert_eq!(record.fetch("name").unwrap(), &Value::str("Rodrigo"));
        assert_eq!(
            record.fetch("missing").unwrap_err().to_string(),
            "undefined attribute `missing`"
        );
        assert_eq!(
            record.fetch("secret").unwrap_err().to_string(),
            "tried to access a private attribute `secret`"
        );
        assert_eq!(
            record.fetch("lineage").unwrap_err().to_string(),
            "tried to access a protected attribute `lineage`"
        );
    }

    #[test]
    fn get_with_transforms_the_found_value() {
        let record = person();

        let doubled = record.get_with("age", |v| v.as_int().unwrap() * 2);
        assert_eq!(doubled, Some(66));
        assert_eq!(record.get_with("missing", |_| 1), None);
    }

    #[test]
    fn select_slices_extends_and_recases() {
        let record = person();

        let sliced = record.select().only(&["age"]).collect();
        assert_eq!(sliced.len(), 1);
        assert_eq!(sliced.get("age"), Some(&Value::from(33)));

        let extended = record
            .select()
            .only(&["age"])
            .with("age_next_year", 34)
            .collect();
        assert_eq!(extended.get("age_next_year"), Some(&Value::from(34)));

        let trimmed = record.select().without(&["age"]).collect();
        assert!(trimmed.contains_key("name"));
        assert!(!trimmed.contains_key("age"));

        let schema = Schema::builder("Cased")
            .attribute("created_at", AttrOptions::new().default("now"))
            .unwrap()
            .build();
        let cased = schema
            .materialize(AttrMap::new())
            .unwrap()
            .select()
            .keys_as(KeyCase::Camel)
            .collect();
        assert!(cased.contains_key("createdAt"));
    }

    #[test]
    fn with_attribute_builds_a_fresh_record() {
        let record = person();
        let older = record.with_attribute("age", 34).unwrap();

        assert_eq!(older.get("age"), Some(&Value::from(34)));
        assert_eq!(record.get("age"), Some(&Value::from(33)));
        // private values survive the rebuild
        assert_eq!(older.get("secret"), Some(&Value::str("s3cr3t")));
    }

    #[test]
    fn with_attributes_requires_the_initialize_axis() {
        let schema = Schema::builder("Bare")
            .attribute("a", AttrOptions::new())
            .unwrap()
            .build();
        let record = schema.materialize(AttrMap::new()).unwrap();

        let err = record.with_attribute("a", 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "the `initialize` feature is not enabled for this schema"
        );
    }

    #[test]
    fn rejected_and_accepted_names_partition_declarations() {
        let schema = Schema::builder("Calc")
            .features(features::with(&["accept"]).unwrap())
            .attribute("a", AttrOptions::new().accept(Rule::Kind(ValueKind::Int)))
            .unwrap()
            .attribute("b", AttrOptions::new().accept(Rule::Kind(ValueKind::Int)))
            .unwrap()
            .attribute("operator", AttrOptions::new().reject(Rule::Kind(ValueKind::Int)))
            .unwrap()
            .build();

        let good = schema
            .materialize(attr_map! { "a" => 1, "b" => 2, "operator" => "+" })
            .unwrap();
        assert!(!good.has_errors());
        assert_eq!(good.rejected_names(), Vec::<&str>::new());
        assert_eq!(good.accepted_names(), ["a", "b", "operator"]);

        let bad = schema
            .materialize(attr_map! { "a" => "1", "b" => 2, "operator" => 0 })
            .unwrap();
        assert!(bad.has_errors());
        assert_eq!(bad.rejected_names(), ["a", "operator"]);
        assert_eq!(bad.accepted_names(), ["b"]);
        assert_eq!(bad.error_for("a"), Some("expected to be a kind of Int"));
    }
}
