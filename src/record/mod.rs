//! Record module - host values, records and the typed record view
//!
//! A `Record` is the host's unit of storage: a set of named bins holding
//! already-decoded `Value`s. The `RecordView` reads and writes the bins this
//! crate cares about as typed fields.

use crate::state_machine::OutputState;
use crate::{Error, Result};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

pub mod view;

pub use view::{RecordView, bins};

/// A host value, as passed in bins and call arguments
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Bytes(Vec<u8>),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Bytes(_) => "bytes",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Convert from plain JSON
    ///
    /// Strings prefixed with `0x` are decoded as bytes. Non-integer numbers
    /// are rejected since the host has no float bins here.
    pub fn from_json(json: &JsonValue) -> Result<Self> {
        Ok(match json {
            JsonValue::Null => Value::Nil,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Int(
                n.as_i64()
                    .ok_or_else(|| Error::internal(format!("not an integer: {}", n)))?,
            ),
            JsonValue::String(s) => match s.strip_prefix("0x") {
                Some(digits) => Value::Bytes(
                    hex::decode(digits)
                        .map_err(|e| Error::internal(format!("bad hex {:?}: {}", s, e)))?,
                ),
                None => Value::Str(s.clone()),
            },
            JsonValue::Array(items) => Value::List(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            JsonValue::Object(fields) => Value::Map(
                fields
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), Value::from_json(v)?)))
                    .collect::<Result<BTreeMap<_, _>>>()?,
            ),
        })
    }

    /// Convert to plain JSON (bytes become `0x`-prefixed hex strings)
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Nil => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::from(*i),
            Value::Bytes(b) => JsonValue::String(format!("0x{}", hex::encode(b))),
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(fields) => JsonValue::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<JsonMap<_, _>>(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// One persisted record: a set of named bins
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    bins: BTreeMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bin: &str) -> Option<&Value> {
        self.bins.get(bin)
    }

    pub fn set(&mut self, bin: impl Into<String>, value: Value) {
        self.bins.insert(bin.into(), value);
    }

    pub fn remove(&mut self, bin: &str) -> Option<Value> {
        self.bins.remove(bin)
    }

    pub fn bin_names(&self) -> impl Iterator<Item = &str> {
        self.bins.keys().map(String::as_str)
    }

    /// Create a fresh UTXO record: all outputs unspent, unlocked, nothing spent
    pub fn with_outputs(count: usize) -> Self {
        let mut record = Self::new();
        let unspent = Value::Map(BTreeMap::from([(
            bins::STATE.to_string(),
            Value::str(OutputState::Unspent.name()),
        )]));
        record.set(bins::LOCKED, Value::Bool(false));
        record.set(bins::CONFLICTING, Value::Bool(false));
        record.set(bins::SPENT_COUNT, Value::Int(0));
        record.set(bins::OUTPUTS, Value::List(vec![unspent; count]));
        record
    }

    /// Deterministic serialization of the whole record
    pub fn to_bytes(&self) -> Vec<u8> {
        // Object keys come out sorted, so equal records give equal bytes
        self.to_json().to_string().into_bytes()
    }

    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.bins
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }

    pub fn from_json(json: &JsonValue) -> Result<Self> {
        match Value::from_json(json)? {
            Value::Map(bins) => Ok(Self { bins }),
            other => Err(Error::internal(format!(
                "record must be a JSON object, got {}",
                other.type_name()
            ))),
        }
    }

    /// Load a record from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let json: JsonValue =
            serde_json::from_str(&contents).map_err(|e| Error::RecordFile {
                file: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Self::from_json(&json).map_err(|e| Error::RecordFile {
            file: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Write the record to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.to_json())?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_record() {
        let record = Record::with_outputs(3);
        assert_eq!(record.get(bins::LOCKED), Some(&Value::Bool(false)));
        assert_eq!(record.get(bins::SPENT_COUNT), Some(&Value::Int(0)));
        assert_eq!(
            record.get(bins::OUTPUTS).and_then(Value::as_list).map(<[_]>::len),
            Some(3)
        );
    }

    #[test]
    fn test_json_conversion() {
        let json = json!({"ref": "0xdeadbeef", "name": "abc", "n": 7, "list": [true, null]});
        let value = Value::from_json(&json).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map["ref"], Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(map["name"], Value::str("abc"));
        assert_eq!(map["n"], Value::Int(7));
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_json_rejects_floats_and_bad_hex() {
        assert!(Value::from_json(&json!(1.5)).is_err());
        assert!(Value::from_json(&json!("0xzz")).is_err());
    }

    #[test]
    fn test_to_bytes_is_deterministic() {
        let mut a = Record::new();
        a.set("b", Value::Int(1));
        a.set("a", Value::Int(2));
        let mut b = Record::new();
        b.set("a", Value::Int(2));
        b.set("b", Value::Int(1));
        assert_eq!(a.to_bytes(), b.to_bytes());
    }

    #[test]
    fn test_record_from_json_requires_object() {
        assert!(Record::from_json(&json!([1, 2])).is_err());
        let record = Record::from_json(&json!({"locked": false})).unwrap();
        assert_eq!(record.bin_names().collect::<Vec<_>>(), vec!["locked"]);
    }
}
