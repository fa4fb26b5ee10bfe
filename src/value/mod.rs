//! Attribute value types.
//!
//! [`Value`] is the runtime representation of everything an attribute can hold.
//! The payload itself is the [`Data`] enum; heap-backed kinds (`Str`, `List`,
//! `Map`) share their storage through `Arc`, which gives the crate a meaningful
//! notion of value identity ([`Value::shares_storage`]) on top of plain
//! equality.
//!
//! Two extra pieces of per-value state ride along with the payload:
//!
//! - a **frozen** flag, set by the freeze policies of attribute definitions;
//! - **annotations**, a small named map attached to a value at runtime.
//!   [`Value::dup`] copies the payload into fresh storage and drops them,
//!   [`Value::deep_clone`] copies and keeps them.
//!
//! Equality ignores both: two values are equal when their payloads are.

mod json;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A construction-input or snapshot map: canonical key → value.
pub type AttrMap = BTreeMap<String, Value>;

/// The payload of a [`Value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
    /// The absent value. Attributes declared but never set hold `Nil`.
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Arc<Vec<Value>>),
    Map(Arc<AttrMap>),
    Timestamp(DateTime<Utc>),
    /// Reference to another entity by id.
    Ref(Uuid),
    /// A function stored as data.
    Callable(Callable),
}

/// The data tag of a [`Value`], used by kind-based validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Nil,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    Timestamp,
    Ref,
    Callable,
}

impl ValueKind {
    /// Look a kind up by name, case-insensitively.
    pub fn named(name: &str) -> Option<ValueKind> {
        match name.to_ascii_lowercase().as_str() {
            "nil" => Some(ValueKind::Nil),
            "bool" => Some(ValueKind::Bool),
            "int" => Some(ValueKind::Int),
            "float" => Some(ValueKind::Float),
            "str" => Some(ValueKind::Str),
            "list" => Some(ValueKind::List),
            "map" => Some(ValueKind::Map),
            "timestamp" => Some(ValueKind::Timestamp),
            "ref" => Some(ValueKind::Ref),
            "callable" => Some(ValueKind::Callable),
            _ => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Nil => "Nil",
            ValueKind::Bool => "Bool",
            ValueKind::Int => "Int",
            ValueKind::Float => "Float",
            ValueKind::Str => "Str",
            ValueKind::List => "List",
            ValueKind::Map => "Map",
            ValueKind::Timestamp => "Timestamp",
            ValueKind::Ref => "Ref",
            ValueKind::Callable => "Callable",
        };
        f.write_str(name)
    }
}

/// A function kept as attribute data.
///
/// Compared by identity: two callables are equal only when they are the same
/// function object.
#[derive(Clone)]
pub struct Callable(Arc<dyn Fn(&[Value]) -> Value + Send + Sync>);

impl Callable {
    pub fn new(f: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
        Callable(Arc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Value {
        (self.0)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callable(..)")
    }
}

impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A dynamic attribute value: payload plus frozen flag plus annotations.
#[derive(Debug, Clone)]
pub struct Value {
    data: Data,
    frozen: bool,
    notes: Option<Arc<AttrMap>>,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Value {
    pub fn nil() -> Self {
        Value::from_data(Data::Nil)
    }

    pub fn str(s: impl AsRef<str>) -> Self {
        Value::from_data(Data::Str(Arc::from(s.as_ref())))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::from_data(Data::List(Arc::new(items)))
    }

    pub fn map(entries: AttrMap) -> Self {
        Value::from_data(Data::Map(Arc::new(entries)))
    }

    pub fn callable(f: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
        Value::from_data(Data::Callable(Callable::new(f)))
    }

    pub(crate) fn from_data(data: Data) -> Self {
        Value {
            data,
            frozen: false,
            notes: None,
        }
    }

    /// The payload, for matching.
    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn kind(&self) -> ValueKind {
        match self.data {
            Data::Nil => ValueKind::Nil,
            Data::Bool(_) => ValueKind::Bool,
            Data::Int(_) => ValueKind::Int,
            Data::Float(_) => ValueKind::Float,
            Data::Str(_) => ValueKind::Str,
            Data::List(_) => ValueKind::List,
            Data::Map(_) => ValueKind::Map,
            Data::Timestamp(_) => ValueKind::Timestamp,
            Data::Ref(_) => ValueKind::Ref,
            Data::Callable(_) => ValueKind::Callable,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self.data, Data::Nil)
    }

    /// `Nil` and `false` are falsy; everything else is truthy.
    pub fn truthy(&self) -> bool {
        !matches!(self.data, Data::Nil | Data::Bool(false))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            Data::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.data {
            Data::Int(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.data {
            Data::Float(x) => Some(x),
            Data::Int(n) => Some(n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            Data::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match &self.data {
            Data::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&AttrMap> {
        match &self.data {
            Data::Map(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self.data {
            Data::Timestamp(at) => Some(at),
            _ => None,
        }
    }

    pub fn as_ref_id(&self) -> Option<Uuid> {
        match self.data {
            Data::Ref(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match &self.data {
            Data::Callable(f) => Some(f),
            _ => None,
        }
    }

    // --- identity, freezing, annotations ---

    /// Whether two values are backed by the same storage.
    ///
    /// Heap-backed kinds compare their `Arc` pointers; inline scalars have no
    /// separate storage and fall back to payload equality.
    pub fn shares_storage(&self, other: &Value) -> bool {
        match (&self.data, &other.data) {
            (Data::Str(a), Data::Str(b)) => Arc::ptr_eq(a, b),
            (Data::List(a), Data::List(b)) => Arc::ptr_eq(a, b),
            (Data::Map(a), Data::Map(b)) => Arc::ptr_eq(a, b),
            (Data::Callable(a), Data::Callable(b)) => a == b,
            (a, b) => a == b,
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Mark this value frozen, keeping its storage and annotations.
    pub fn freeze(mut self) -> Value {
        self.frozen = true;
        self
    }

    /// Copy the payload into fresh storage, dropping annotations.
    ///
    /// The copy is shallow: list and map elements still share their own
    /// storage with the original's elements. Callables cannot be copied and
    /// keep their identity.
    pub fn dup(&self) -> Value {
        Value::from_data(self.copy_data())
    }

    /// Copy the payload into fresh storage, keeping annotations.
    pub fn deep_clone(&self) -> Value {
        Value {
            data: self.copy_data(),
            frozen: false,
            notes: self.notes.clone(),
        }
    }

    fn copy_data(&self) -> Data {
        match &self.data {
            Data::Str(s) => Data::Str(Arc::from(&**s)),
            Data::List(items) => Data::List(Arc::new(items.as_ref().clone())),
            Data::Map(entries) => Data::Map(Arc::new(entries.as_ref().clone())),
            other => other.clone(),
        }
    }

    /// Attach a named annotation, returning the updated value.
    pub fn annotate(mut self, name: impl Into<String>, note: impl Into<Value>) -> Value {
        let mut notes = match self.notes.take() {
            Some(existing) => existing.as_ref().clone(),
            None => AttrMap::new(),
        };
        notes.insert(name.into(), note.into());
        self.notes = Some(Arc::new(notes));
        self
    }

    pub fn note(&self, name: &str) -> Option<&Value> {
        self.notes.as_ref().and_then(|notes| notes.get(name))
    }

    pub fn has_notes(&self) -> bool {
        self.notes.as_ref().is_some_and(|notes| !notes.is_empty())
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::nil()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::from_data(Data::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::from_data(Data::Int(n))
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::from_data(Data::Int(n.into()))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::from_data(Data::Float(x))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<AttrMap> for Value {
    fn from(entries: AttrMap) -> Self {
        Value::map(entries)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(at: DateTime<Utc>) -> Self {
        Value::from_data(Data::Timestamp(at))
    }
}

impl From<Uuid> for Value {
    fn from(id: Uuid) -> Self {
        Value::from_data(Data::Ref(id))
    }
}

impl<V: Into<Value>> From<Option<V>> for Value {
    fn from(opt: Option<V>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::nil(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_frozenness_and_annotations() {
        let plain = Value::str("x");
        let frozen = Value::str("x").freeze();
        let noted = Value::str("x").annotate("origin", "test");

        assert_eq!(plain, frozen);
        assert_eq!(plain, noted);
        assert_ne!(plain, Value::str("y"));
    }

    #[test]
    fn freeze_keeps_storage_and_sets_the_flag() {
        let original = Value::str("payload");
        let frozen = original.clone().freeze();

        assert!(frozen.is_frozen());
        assert!(!original.is_frozen());
        assert!(frozen.shares_storage(&original));
    }

    #[test]
    fn dup_copies_storage_and_drops_annotations() {
        let original = Value::str("payload").annotate("origin", "test");
        let duplicate = original.dup();

        assert_eq!(duplicate, original);
        assert!(!duplicate.shares_storage(&original));
        assert!(original.note("origin").is_some());
        assert!(duplicate.note("origin").is_none());
    }

    #[test]
    fn deep_clone_copies_storage_and_keeps_annotations() {
        let original = Value::str("payload").annotate("origin", "test");
        let clone = original.deep_clone();

        assert_eq!(clone, original);
        assert!(!clone.shares_storage(&original));
        assert_eq!(clone.note("origin"), Some(&Value::str("test")));
    }

    #[test]
    fn scalar_identity_falls_back_to_equality() {
        assert!(Value::from(1).shares_storage(&Value::from(1)));
        assert!(!Value::from(1).shares_storage(&Value::from(2)));
        assert!(Value::nil().shares_storage(&Value::nil()));
    }

    #[test]
    fn callables_compare_by_identity() {
        let f = Value::callable(|_| Value::from(1));
        let g = Value::callable(|_| Value::from(1));

        assert_eq!(f, f.clone());
        assert_ne!(f, g);
        assert_eq!(f.as_callable().unwrap().call(&[]), Value::from(1));
    }

    #[test]
    fn truthiness() {
        assert!(!Value::nil().truthy());
        assert!(!Value::from(false).truthy());
        assert!(Value::from(0).truthy());
        assert!(Value::str("").truthy());
        assert!(Value::from(true).truthy());
    }

    #[test]
    fn kind_reports_the_data_tag() {
        assert_eq!(Value::nil().kind(), ValueKind::Nil);
        assert_eq!(Value::from(1).kind(), ValueKind::Int);
        assert_eq!(Value::from(1.5).kind(), ValueKind::Float);
        assert_eq!(Value::str("s").kind(), ValueKind::Str);
        assert_eq!(Value::list(vec![]).kind(), ValueKind::List);
        assert_eq!(Value::callable(|_| Value::nil()).kind(), ValueKind::Callable);
    }

    #[test]
    fn option_conversion_maps_none_to_nil() {
        assert_eq!(Value::from(None::<i64>), Value::nil());
        assert_eq!(Value::from(Some(3)), Value::from(3));
    }
}
