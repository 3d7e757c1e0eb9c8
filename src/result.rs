//! Call results
//!
//! A successful call returns a map with `status = "OK"` and the updated
//! counters. A failed call returns only the error message as a plain string;
//! callers branch on `success`, never on the shape of `value`.

use crate::Error;
use crate::record::Value;
use crate::state_machine::UtxoRecord;
use std::collections::BTreeMap;

/// Success marker placed in the `status` field
pub const STATUS_OK: &str = "OK";

/// Payload of a successful operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub spent_count: u64,
    pub output_count: usize,
    pub all_spent: bool,
    pub locked: bool,
    /// Indices named by an index operation
    pub affected: Option<Vec<usize>>,
}

impl Outcome {
    pub fn from_record(record: &UtxoRecord, affected: Option<Vec<usize>>) -> Self {
        Self {
            spent_count: record.spent_count,
            output_count: record.outputs.len(),
            all_spent: record.all_spent(),
            locked: record.locked,
            affected,
        }
    }

    /// Encode as the success payload
    pub fn to_value(&self) -> Result<Value, Error> {
        let int = |n: u64, field: &str| {
            i64::try_from(n).map_err(|_| Error::internal(format!("{} {} overflows", field, n)))
        };

        let mut fields = BTreeMap::new();
        fields.insert("status".to_string(), Value::str(STATUS_OK));
        fields.insert(
            "spentCount".to_string(),
            Value::Int(int(self.spent_count, "spentCount")?),
        );
        fields.insert(
            "outputCount".to_string(),
            Value::Int(int(self.output_count as u64, "outputCount")?),
        );
        fields.insert("allSpent".to_string(), Value::Bool(self.all_spent));
        fields.insert("locked".to_string(), Value::Bool(self.locked));
        if let Some(affected) = &self.affected {
            let indices = affected
                .iter()
                .map(|&i| int(i as u64, "index").map(Value::Int))
                .collect::<Result<Vec<_>, _>>()?;
            fields.insert("affected".to_string(), Value::List(indices));
        }
        Ok(Value::Map(fields))
    }
}

/// What the entry point hands back to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    pub success: bool,
    pub value: Value,
}

impl CallResult {
    /// Build the result of a finished call
    pub fn build(outcome: Result<Value, Error>) -> Self {
        match outcome {
            Ok(value) => Self {
                success: true,
                value,
            },
            Err(err) => Self::failure(&err),
        }
    }

    pub fn failure(err: &Error) -> Self {
        Self {
            success: false,
            value: Value::Str(err.to_string()),
        }
    }

    /// Error message of a failed call
    pub fn message(&self) -> Option<&str> {
        if self.success {
            None
        } else {
            self.value.as_str()
        }
    }

    /// Look up a field of a successful payload
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.value.as_map().and_then(|fields| fields.get(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn test_success_is_a_map_with_status() {
        let mut record = UtxoRecord::with_outputs(2);
        record.outputs[0].state = crate::state_machine::OutputState::Spent;
        record.spent_count = 1;

        let result = CallResult::build(Outcome::from_record(&record, Some(vec![0])).to_value());
        assert!(result.success);
        assert_eq!(result.field("status"), Some(&Value::str("OK")));
        assert_eq!(result.field("spentCount"), Some(&Value::Int(1)));
        assert_eq!(result.field("outputCount"), Some(&Value::Int(2)));
        assert_eq!(result.field("allSpent"), Some(&Value::Bool(false)));
        assert_eq!(
            result.field("affected"),
            Some(&Value::List(vec![Value::Int(0)]))
        );
        assert_eq!(result.message(), None);
    }

    #[test]
    fn test_failure_is_a_plain_message() {
        let result = CallResult::build(Err(ValidationError::Locked.into()));
        assert!(!result.success);
        assert_eq!(result.value, Value::str("record is locked"));
        assert_eq!(result.message(), Some("record is locked"));
        assert_eq!(result.field("status"), None);
    }

    #[test]
    fn test_record_level_outcome_has_no_affected() {
        let record = UtxoRecord::with_outputs(1);
        let result = CallResult::build(Outcome::from_record(&record, None).to_value());
        assert_eq!(result.field("affected"), None);
    }
}
