//! JSON interop for [`Value`].
//!
//! Conversion from JSON is total; conversion to JSON fails for callables and
//! non-finite floats, which have no JSON representation. Timestamps render as
//! RFC 3339 strings and refs as hyphenated UUID strings.

use std::collections::BTreeMap;

use serde::de::Deserializer;
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};

use super::{Data, Value};
use crate::error::{AttrError, Result};

impl Value {
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::nil(),
            serde_json::Value::Bool(b) => Value::from(b),
            serde_json::Value::Number(n) => {
                if let Some(int) = n.as_i64() {
                    Value::from(int)
                } else {
                    Value::from(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::str(s),
            serde_json::Value::Array(items) => {
                Value::list(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(entries) => Value::map(
                entries
                    .into_iter()
                    .map(|(key, val)| (key, Value::from_json(val)))
                    .collect::<BTreeMap<_, _>>(),
            ),
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value> {
        match self.data() {
            Data::Nil => Ok(serde_json::Value::Null),
            Data::Bool(b) => Ok(serde_json::Value::from(*b)),
            Data::Int(n) => Ok(serde_json::Value::from(*n)),
            Data::Float(x) => serde_json::Number::from_f64(*x)
                .map(serde_json::Value::Number)
                .ok_or(AttrError::UnserializableValue("non-finite float")),
            Data::Str(s) => Ok(serde_json::Value::from(&**s)),
            Data::List(items) => items
                .iter()
                .map(Value::to_json)
                .collect::<Result<Vec<_>>>()
                .map(serde_json::Value::Array),
            Data::Map(entries) => entries
                .iter()
                .map(|(key, val)| val.to_json().map(|json| (key.clone(), json)))
                .collect::<Result<serde_json::Map<_, _>>>()
                .map(serde_json::Value::Object),
            Data::Timestamp(at) => Ok(serde_json::Value::from(at.to_rfc3339())),
            Data::Ref(id) => Ok(serde_json::Value::from(id.to_string())),
            Data::Callable(_) => Err(AttrError::UnserializableValue("callable")),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let json = self.to_json().map_err(S::Error::custom)?;
        json.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from_json)
    }
}
