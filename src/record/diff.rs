//! Attribute diffing between records of one schema.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::key;
use crate::record::Record;
use crate::schema::Schema;
use crate::value::Value;

/// One changed attribute: the value on each side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delta {
    pub from: Value,
    pub to: Value,
}

/// The computed set of differing attributes between two records.
///
/// Derived, read-only data: computed on demand by [`Record::diff`], never
/// stored on the records themselves. Differences cover the public snapshot.
#[derive(Debug, Clone)]
pub struct Changes {
    schema: Schema,
    differences: BTreeMap<String, Delta>,
}

impl Changes {
    pub(crate) fn between(from: &Record, to: &Record) -> Changes {
        let mut differences = BTreeMap::new();

        for (name, from_value) in from.attributes() {
            let to_value = to.attributes().get(name).cloned().unwrap_or_default();
            if *from_value != to_value {
                differences.insert(
                    name.clone(),
                    Delta {
                        from: from_value.clone(),
                        to: to_value,
                    },
                );
            }
        }

        Changes {
            schema: from.schema().clone(),
            differences,
        }
    }

    pub fn differences(&self) -> &BTreeMap<String, Delta> {
        &self.differences
    }

    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn is_present(&self) -> bool {
        !self.is_empty()
    }

    /// Whether the named attribute changed at all.
    pub fn changed(&self, name: &str) -> bool {
        self.delta(name).is_some()
    }

    /// Whether the named attribute changed exactly from `from` to `to`.
    pub fn changed_from_to(&self, name: &str, from: &Value, to: &Value) -> bool {
        self.delta(name)
            .is_some_and(|delta| delta.from == *from && delta.to == *to)
    }

    pub fn delta(&self, name: &str) -> Option<&Delta> {
        let key = key::normalize_input(name, self.schema.key_policy())?;
        self.differences.get(&key)
    }
}
