//! Transition representation

use crate::state_machine::{BlockRef, OwnerRef, TxRef, UtxoEntry};

/// A requested record-level operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    SetLocked(bool),
    Spend { indices: Vec<usize>, tx_ref: TxRef },
    Unspend { indices: Vec<usize> },
    Freeze { indices: Vec<usize> },
    Unfreeze { indices: Vec<usize> },
    Reassign { indices: Vec<usize>, owner: OwnerRef },
    SetMined(BlockRef),
    SetConflicting(bool),
}

impl Transition {
    /// Function name this transition is dispatched under
    pub fn name(&self) -> &'static str {
        match self {
            Transition::SetLocked(_) => "setLocked",
            Transition::Spend { .. } => "spend",
            Transition::Unspend { .. } => "unspend",
            Transition::Freeze { .. } => "freeze",
            Transition::Unfreeze { .. } => "unfreeze",
            Transition::Reassign { .. } => "reassign",
            Transition::SetMined(_) => "setMined",
            Transition::SetConflicting(_) => "setConflicting",
        }
    }

    /// Only the lock toggle itself may run on a locked record
    pub fn bypasses_lock(&self) -> bool {
        matches!(self, Transition::SetLocked(_))
    }

    /// Output indices named by the call, if it takes any
    pub fn indices(&self) -> Option<&[usize]> {
        match self {
            Transition::Spend { indices, .. }
            | Transition::Unspend { indices }
            | Transition::Freeze { indices }
            | Transition::Unfreeze { indices }
            | Transition::Reassign { indices, .. } => Some(indices),
            _ => None,
        }
    }
}

/// A single buffered mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Locked(bool),
    Mined(Option<BlockRef>),
    Conflicting(bool),
    SpentCount(u64),
    Output(UtxoEntry),
}

/// The full mutation set of one validated call, applied all at once
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, change: Change) {
        self.changes.push(change);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Indices of the outputs touched by this change set
    pub fn touched_outputs(&self) -> Vec<usize> {
        self.changes
            .iter()
            .filter_map(|c| match c {
                Change::Output(entry) => Some(entry.index),
                _ => None,
            })
            .collect()
    }
}
