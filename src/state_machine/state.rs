//! Output and record state representation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a single output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputState {
    #[default]
    Unspent,
    Spent,
    Frozen,
}

impl OutputState {
    pub fn name(&self) -> &'static str {
        match self {
            OutputState::Unspent => "unspent",
            OutputState::Spent => "spent",
            OutputState::Frozen => "frozen",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "unspent" => Some(OutputState::Unspent),
            "spent" => Some(OutputState::Spent),
            "frozen" => Some(OutputState::Frozen),
            _ => None,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            OutputState::Unspent => "lightgreen",
            OutputState::Spent => "lightblue",
            OutputState::Frozen => "yellow",
        }
    }
}

impl fmt::Display for OutputState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-output operations that change an output's state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryOp {
    Spend,
    Unspend,
    Freeze,
    Unfreeze,
}

impl EntryOp {
    pub fn name(&self) -> &'static str {
        match self {
            EntryOp::Spend => "spend",
            EntryOp::Unspend => "unspend",
            EntryOp::Freeze => "freeze",
            EntryOp::Unfreeze => "unfreeze",
        }
    }
}

/// Every legal (from, op, to) move of a single output.
///
/// Unfreeze appears twice: it returns the output to whatever state it was
/// frozen from.
pub const TRANSITIONS: &[(OutputState, EntryOp, OutputState)] = &[
    (OutputState::Unspent, EntryOp::Spend, OutputState::Spent),
    (OutputState::Spent, EntryOp::Unspend, OutputState::Unspent),
    (OutputState::Unspent, EntryOp::Freeze, OutputState::Frozen),
    (OutputState::Spent, EntryOp::Freeze, OutputState::Frozen),
    (OutputState::Frozen, EntryOp::Unfreeze, OutputState::Unspent),
    (OutputState::Frozen, EntryOp::Unfreeze, OutputState::Spent),
];

/// Whether `op` may be applied to an output currently in `from`
pub fn is_allowed(from: OutputState, op: EntryOp) -> bool {
    TRANSITIONS.iter().any(|&(f, o, _)| f == from && o == op)
}

/// Reference to the transaction that spends an output
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxRef(pub Vec<u8>);

/// Owner of an output, changed by reassignment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerRef(pub Vec<u8>);

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl fmt::Display for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// The block a transaction was mined in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRef {
    pub block_id: u32,
    pub height: u32,
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "block {} @ {}", self.block_id, self.height)
    }
}

/// One output of the transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoEntry {
    pub index: usize,
    pub state: OutputState,
    pub spending_ref: Option<TxRef>,
    pub owner: Option<OwnerRef>,
    /// State the output held before it was frozen
    pub frozen_from: Option<OutputState>,
}

impl UtxoEntry {
    pub fn unspent(index: usize) -> Self {
        Self {
            index,
            state: OutputState::Unspent,
            spending_ref: None,
            owner: None,
            frozen_from: None,
        }
    }

    pub fn is_spent(&self) -> bool {
        self.state == OutputState::Spent
    }
}

/// Typed snapshot of one UTXO record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UtxoRecord {
    pub locked: bool,
    pub mined: Option<BlockRef>,
    pub conflicting: bool,
    pub spent_count: u64,
    pub outputs: Vec<UtxoEntry>,
}

impl UtxoRecord {
    /// Fresh record with `count` unspent outputs
    pub fn with_outputs(count: usize) -> Self {
        Self {
            outputs: (0..count).map(UtxoEntry::unspent).collect(),
            ..Self::default()
        }
    }

    /// Number of outputs actually in the Spent state
    pub fn count_spent(&self) -> u64 {
        self.outputs.iter().filter(|e| e.is_spent()).count() as u64
    }

    pub fn all_spent(&self) -> bool {
        !self.outputs.is_empty() && self.count_spent() == self.outputs.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names_round_trip() {
        for state in [OutputState::Unspent, OutputState::Spent, OutputState::Frozen] {
            assert_eq!(OutputState::from_name(state.name()), Some(state));
        }
        assert_eq!(OutputState::from_name("locked"), None);
    }

    #[test]
    fn test_transition_table() {
        assert!(is_allowed(OutputState::Unspent, EntryOp::Spend));
        assert!(!is_allowed(OutputState::Spent, EntryOp::Spend));
        assert!(!is_allowed(OutputState::Frozen, EntryOp::Spend));
        assert!(!is_allowed(OutputState::Unspent, EntryOp::Unspend));
        assert!(!is_allowed(OutputState::Frozen, EntryOp::Freeze));
        assert!(!is_allowed(OutputState::Unspent, EntryOp::Unfreeze));
    }

    #[test]
    fn test_frozen_only_leaves_via_unfreeze() {
        let exits: Vec<_> = TRANSITIONS
            .iter()
            .filter(|(from, _, _)| *from == OutputState::Frozen)
            .map(|(_, op, _)| *op)
            .collect();
        assert!(!exits.is_empty());
        assert!(exits.iter().all(|op| *op == EntryOp::Unfreeze));
    }

    #[test]
    fn test_fresh_record() {
        let record = UtxoRecord::with_outputs(3);
        assert_eq!(record.outputs.len(), 3);
        assert_eq!(record.outputs[2].index, 2);
        assert_eq!(record.count_spent(), 0);
        assert!(!record.all_spent());
        assert!(!record.locked);
    }
}
