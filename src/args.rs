//! Positional call arguments
//!
//! Arguments arrive already decoded as host `Value`s. These helpers pick them
//! apart by position; a missing or mistyped argument rejects the call.

use crate::error::ValidationError;
use crate::record::{Value, bins};
use crate::state_machine::BlockRef;

type Validation<T> = std::result::Result<T, ValidationError>;

/// Borrowed argument list of one call
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(values: &'a [Value]) -> Self {
        Self { values }
    }

    fn get(&self, position: usize) -> Validation<&'a Value> {
        match self.values.get(position) {
            None | Some(Value::Nil) => Err(ValidationError::invalid_argument(position, "missing")),
            Some(value) => Ok(value),
        }
    }

    fn mistyped(position: usize, expected: &str, got: &Value) -> ValidationError {
        ValidationError::invalid_argument(
            position,
            format!("expected {}, got {}", expected, got.type_name()),
        )
    }

    pub fn bool(&self, position: usize) -> Validation<bool> {
        let value = self.get(position)?;
        value
            .as_bool()
            .ok_or_else(|| Self::mistyped(position, "bool", value))
    }

    /// Non-empty opaque reference bytes
    pub fn bytes(&self, position: usize) -> Validation<Vec<u8>> {
        let value = self.get(position)?;
        match value.as_bytes() {
            Some([]) => Err(ValidationError::invalid_argument(position, "empty reference")),
            Some(bytes) => Ok(bytes.to_vec()),
            None => Err(Self::mistyped(position, "bytes", value)),
        }
    }

    /// A list of output indices
    pub fn indices(&self, position: usize) -> Validation<Vec<usize>> {
        let value = self.get(position)?;
        let items = value
            .as_list()
            .ok_or_else(|| Self::mistyped(position, "list of ints", value))?;

        items
            .iter()
            .map(|item| match item {
                Value::Int(n) => usize::try_from(*n).map_err(|_| {
                    ValidationError::invalid_argument(position, format!("negative index {}", n))
                }),
                other => Err(Self::mistyped(position, "int index", other)),
            })
            .collect()
    }

    /// A block reference: `{ "blockId": int, "height": int }`
    pub fn block_ref(&self, position: usize) -> Validation<BlockRef> {
        let value = self.get(position)?;
        let fields = value
            .as_map()
            .ok_or_else(|| Self::mistyped(position, "block map", value))?;

        let field = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_int)
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    ValidationError::invalid_argument(position, format!("block '{}' missing or invalid", key))
                })
        };

        Ok(BlockRef {
            block_id: field(bins::BLOCK_ID)?,
            height: field(bins::HEIGHT)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_indices() {
        let values = vec![Value::List(vec![Value::Int(0), Value::Int(2)])];
        assert_eq!(Args::new(&values).indices(0), Ok(vec![0, 2]));

        let values = vec![Value::List(vec![Value::Int(-1)])];
        assert!(matches!(
            Args::new(&values).indices(0),
            Err(ValidationError::InvalidArgument { position: 0, .. })
        ));

        let values = vec![Value::Int(3)];
        assert!(Args::new(&values).indices(0).is_err());
    }

    #[test]
    fn test_missing_and_nil_arguments() {
        let values = vec![Value::Bool(true), Value::Nil];
        let args = Args::new(&values);
        assert_eq!(args.bool(0), Ok(true));
        assert!(args.bool(1).is_err());
        assert!(args.bool(2).is_err());
    }

    #[test]
    fn test_bytes_rejects_empty_and_strings() {
        let values = vec![Value::Bytes(vec![]), Value::str("abc"), Value::Bytes(vec![1])];
        let args = Args::new(&values);
        assert!(args.bytes(0).is_err());
        assert!(args.bytes(1).is_err());
        assert_eq!(args.bytes(2), Ok(vec![1]));
    }

    #[test]
    fn test_block_ref() {
        let block = Value::Map(BTreeMap::from([
            (bins::BLOCK_ID.to_string(), Value::Int(4)),
            (bins::HEIGHT.to_string(), Value::Int(900)),
        ]));
        let values = vec![block];
        assert_eq!(
            Args::new(&values).block_ref(0),
            Ok(BlockRef {
                block_id: 4,
                height: 900
            })
        );

        let values = vec![Value::Map(BTreeMap::new())];
        assert!(Args::new(&values).block_ref(0).is_err());
    }
}
