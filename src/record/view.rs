//! Typed view over the bins of one record
//!
//! The view only translates between bins and the typed `UtxoRecord`. It does
//! not validate state: that belongs to the state machine.

use crate::bail_internal;
use crate::record::{Record, Value};
use crate::state_machine::{
    BlockRef, Change, ChangeSet, OutputState, OwnerRef, TxRef, UtxoEntry, UtxoRecord,
};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Bin and field names of the persisted layout
pub mod bins {
    pub const LOCKED: &str = "locked";
    pub const MINED: &str = "mined";
    pub const CONFLICTING: &str = "conflicting";
    pub const SPENT_COUNT: &str = "spentCount";
    pub const OUTPUTS: &str = "outputs";

    // Per-output map fields
    pub const STATE: &str = "state";
    pub const SPENDING_REF: &str = "spendingRef";
    pub const OWNER: &str = "owner";
    pub const FROZEN_FROM: &str = "frozenFrom";

    // Mined block map fields
    pub const BLOCK_ID: &str = "blockId";
    pub const HEIGHT: &str = "height";
}

/// Read/write adapter over one borrowed record
pub struct RecordView<'a> {
    record: &'a mut Record,
}

impl<'a> RecordView<'a> {
    pub fn new(record: &'a mut Record) -> Self {
        Self { record }
    }

    /// Decode the typed snapshot from the bins
    pub fn load(&self) -> Result<UtxoRecord> {
        let outputs = self
            .outputs_list()?
            .iter()
            .enumerate()
            .map(|(index, value)| decode_entry(index, value))
            .collect::<Result<Vec<_>>>()?;

        Ok(UtxoRecord {
            locked: self.flag(bins::LOCKED)?,
            mined: self.mined()?,
            conflicting: self.flag(bins::CONFLICTING)?,
            spent_count: self.spent_count()?,
            outputs,
        })
    }

    /// Write a buffered change set back to the bins.
    ///
    /// All new bin values are staged first and only then written, so a
    /// failure while encoding leaves the record untouched.
    pub fn commit(&mut self, changes: &ChangeSet) -> Result<()> {
        let mut staged: Vec<(&'static str, Option<Value>)> = Vec::new();
        let mut outputs: Option<Vec<Value>> = None;

        for change in &changes.changes {
            match change {
                Change::Locked(value) => staged.push((bins::LOCKED, Some(Value::Bool(*value)))),
                Change::Conflicting(value) => {
                    staged.push((bins::CONFLICTING, Some(Value::Bool(*value))))
                }
                Change::Mined(block) => staged.push((bins::MINED, block.map(encode_block))),
                Change::SpentCount(count) => {
                    let count = i64::try_from(*count)
                        .map_err(|_| Error::internal(format!("spent count {} overflows", count)))?;
                    staged.push((bins::SPENT_COUNT, Some(Value::Int(count))));
                }
                Change::Output(entry) => {
                    let mut list = match outputs.take() {
                        Some(list) => list,
                        None => self.outputs_list()?.to_vec(),
                    };
                    let Some(slot) = list.get_mut(entry.index) else {
                        bail_internal!("output {} missing from bin '{}'", entry.index, bins::OUTPUTS);
                    };
                    *slot = encode_entry(entry);
                    outputs = Some(list);
                }
            }
        }
        if let Some(list) = outputs {
            staged.push((bins::OUTPUTS, Some(Value::List(list))));
        }

        for (bin, value) in staged {
            match value {
                Some(value) => self.record.set(bin, value),
                None => {
                    self.record.remove(bin);
                }
            }
        }
        Ok(())
    }

    /// Overwrite every bin from a typed snapshot
    pub fn store(&mut self, utxo: &UtxoRecord) -> Result<()> {
        let spent_count = i64::try_from(utxo.spent_count)
            .map_err(|_| Error::internal(format!("spent count {} overflows", utxo.spent_count)))?;

        self.record.set(bins::LOCKED, Value::Bool(utxo.locked));
        self.record.set(bins::CONFLICTING, Value::Bool(utxo.conflicting));
        self.record.set(bins::SPENT_COUNT, Value::Int(spent_count));
        self.record.set(
            bins::OUTPUTS,
            Value::List(utxo.outputs.iter().map(encode_entry).collect()),
        );
        match utxo.mined {
            Some(block) => self.record.set(bins::MINED, encode_block(block)),
            None => {
                self.record.remove(bins::MINED);
            }
        }
        Ok(())
    }

    fn outputs_list(&self) -> Result<&[Value]> {
        match self.record.get(bins::OUTPUTS) {
            None | Some(Value::Nil) => Ok(&[]),
            Some(Value::List(items)) => Ok(items),
            Some(other) => bail_internal!(
                "bin '{}' must be a list, got {}",
                bins::OUTPUTS,
                other.type_name()
            ),
        }
    }

    fn flag(&self, bin: &str) -> Result<bool> {
        match self.record.get(bin) {
            None | Some(Value::Nil) => Ok(false),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => bail_internal!("bin '{}' must be a bool, got {}", bin, other.type_name()),
        }
    }

    fn spent_count(&self) -> Result<u64> {
        match self.record.get(bins::SPENT_COUNT) {
            None | Some(Value::Nil) => Ok(0),
            Some(Value::Int(n)) => u64::try_from(*n).map_err(|_| {
                Error::internal(format!("bin '{}' is negative: {}", bins::SPENT_COUNT, n))
            }),
            Some(other) => bail_internal!(
                "bin '{}' must be an int, got {}",
                bins::SPENT_COUNT,
                other.type_name()
            ),
        }
    }

    fn mined(&self) -> Result<Option<BlockRef>> {
        match self.record.get(bins::MINED) {
            None | Some(Value::Nil) => Ok(None),
            Some(Value::Map(fields)) => Ok(Some(BlockRef {
                block_id: u32_field(fields, bins::BLOCK_ID, bins::MINED)?,
                height: u32_field(fields, bins::HEIGHT, bins::MINED)?,
            })),
            Some(other) => bail_internal!(
                "bin '{}' must be a map, got {}",
                bins::MINED,
                other.type_name()
            ),
        }
    }
}

fn u32_field(fields: &BTreeMap<String, Value>, key: &str, bin: &str) -> Result<u32> {
    fields
        .get(key)
        .and_then(Value::as_int)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| Error::internal(format!("bin '{}' has no valid '{}'", bin, key)))
}

fn bytes_field(fields: &BTreeMap<String, Value>, key: &str, index: usize) -> Result<Option<Vec<u8>>> {
    match fields.get(key) {
        None | Some(Value::Nil) => Ok(None),
        Some(Value::Bytes(bytes)) => Ok(Some(bytes.clone())),
        Some(other) => bail_internal!(
            "output {} field '{}' must be bytes, got {}",
            index,
            key,
            other.type_name()
        ),
    }
}

fn state_field(fields: &BTreeMap<String, Value>, key: &str, index: usize) -> Result<Option<OutputState>> {
    match fields.get(key) {
        None | Some(Value::Nil) => Ok(None),
        Some(Value::Str(name)) => OutputState::from_name(name)
            .map(Some)
            .ok_or_else(|| Error::internal(format!("output {} has unknown {} {:?}", index, key, name))),
        Some(other) => bail_internal!(
            "output {} field '{}' must be a string, got {}",
            index,
            key,
            other.type_name()
        ),
    }
}

fn decode_entry(index: usize, value: &Value) -> Result<UtxoEntry> {
    let Value::Map(fields) = value else {
        bail_internal!("output {} must be a map, got {}", index, value.type_name());
    };
    let state = state_field(fields, bins::STATE, index)?
        .ok_or_else(|| Error::internal(format!("output {} has no state", index)))?;
    let frozen_from = state_field(fields, bins::FROZEN_FROM, index)?;
    if frozen_from == Some(OutputState::Frozen) {
        bail_internal!("output {} cannot be frozen from frozen", index);
    }

    Ok(UtxoEntry {
        index,
        state,
        spending_ref: bytes_field(fields, bins::SPENDING_REF, index)?.map(TxRef),
        owner: bytes_field(fields, bins::OWNER, index)?.map(OwnerRef),
        frozen_from,
    })
}

fn encode_entry(entry: &UtxoEntry) -> Value {
    let mut fields = BTreeMap::new();
    fields.insert(bins::STATE.to_string(), Value::str(entry.state.name()));
    if let Some(TxRef(bytes)) = &entry.spending_ref {
        fields.insert(bins::SPENDING_REF.to_string(), Value::Bytes(bytes.clone()));
    }
    if let Some(OwnerRef(bytes)) = &entry.owner {
        fields.insert(bins::OWNER.to_string(), Value::Bytes(bytes.clone()));
    }
    if let Some(state) = entry.frozen_from {
        fields.insert(bins::FROZEN_FROM.to_string(), Value::str(state.name()));
    }
    Value::Map(fields)
}

fn encode_block(block: BlockRef) -> Value {
    Value::Map(BTreeMap::from([
        (bins::BLOCK_ID.to_string(), Value::Int(i64::from(block.block_id))),
        (bins::HEIGHT.to_string(), Value::Int(i64::from(block.height))),
    ]))
}
