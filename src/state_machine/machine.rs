//! Transition rules
//!
//! Every call is validated in full against the unmutated snapshot before a
//! single change is produced. Planning returns the complete `ChangeSet`; the
//! record is only written once planning has succeeded.

use crate::error::ValidationError;
use crate::record::{Record, RecordView, Value};
use crate::result::Outcome;
use crate::state_machine::{
    Change, ChangeSet, EntryOp, OutputState, Transition, UtxoEntry, UtxoRecord, is_allowed,
};
use crate::Result;
use std::collections::HashSet;

type Validation<T> = std::result::Result<T, ValidationError>;

impl UtxoRecord {
    /// Check the record-level invariant at the start of a call
    pub fn check_invariants(&self) -> Validation<()> {
        let actual = self.count_spent();
        if actual != self.spent_count {
            return Err(ValidationError::SpentCountMismatch {
                recorded: self.spent_count,
                actual,
            });
        }
        Ok(())
    }

    /// Validate `transition` and build its mutation set
    pub fn plan(&self, transition: &Transition) -> Validation<ChangeSet> {
        if self.locked && !transition.bypasses_lock() {
            return Err(ValidationError::Locked);
        }

        let mut changes = ChangeSet::new();
        match transition {
            Transition::SetLocked(value) => changes.push(Change::Locked(*value)),
            Transition::SetMined(block) => changes.push(Change::Mined(Some(*block))),
            Transition::SetConflicting(value) => changes.push(Change::Conflicting(*value)),
            Transition::Spend { indices, tx_ref } => {
                self.plan_entries(&mut changes, indices, Some(EntryOp::Spend), |entry| {
                    entry.state = OutputState::Spent;
                    entry.spending_ref = Some(tx_ref.clone());
                })?
            }
            Transition::Unspend { indices } => {
                self.plan_entries(&mut changes, indices, Some(EntryOp::Unspend), |entry| {
                    entry.state = OutputState::Unspent;
                    entry.spending_ref = None;
                })?
            }
            Transition::Freeze { indices } => {
                self.plan_entries(&mut changes, indices, Some(EntryOp::Freeze), |entry| {
                    entry.frozen_from = Some(entry.state);
                    entry.state = OutputState::Frozen;
                })?
            }
            Transition::Unfreeze { indices } => {
                self.plan_entries(&mut changes, indices, Some(EntryOp::Unfreeze), |entry| {
                    entry.state = match entry.frozen_from.take() {
                        Some(OutputState::Spent) => OutputState::Spent,
                        _ => OutputState::Unspent,
                    };
                    if entry.state == OutputState::Unspent {
                        entry.spending_ref = None;
                    }
                })?
            }
            Transition::Reassign { indices, owner } => {
                self.plan_entries(&mut changes, indices, None, |entry| {
                    entry.owner = Some(owner.clone());
                })?
            }
        }
        Ok(changes)
    }

    /// Validate every listed index, then buffer the updated entries and the
    /// resulting spent count.
    fn plan_entries(
        &self,
        changes: &mut ChangeSet,
        indices: &[usize],
        op: Option<EntryOp>,
        update: impl Fn(&mut UtxoEntry),
    ) -> Validation<()> {
        self.resolve_indices(indices)?;
        if let Some(op) = op {
            for &index in indices {
                let state = self.outputs[index].state;
                if !is_allowed(state, op) {
                    return Err(rejection(op, state, index));
                }
            }
        }

        let mut spent_before = 0u64;
        let mut spent_after = 0u64;
        for &index in indices {
            let mut entry = self.outputs[index].clone();
            spent_before += u64::from(entry.is_spent());
            update(&mut entry);
            spent_after += u64::from(entry.is_spent());
            changes.push(Change::Output(entry));
        }

        // Counted from the entries themselves; indices are distinct, so
        // spent_before never exceeds count_spent()
        let spent_count = self.count_spent() - spent_before + spent_after;
        if spent_count != self.spent_count {
            changes.push(Change::SpentCount(spent_count));
        }
        Ok(())
    }

    /// Reject empty, out-of-range or repeated indices
    fn resolve_indices(&self, indices: &[usize]) -> Validation<()> {
        if indices.is_empty() {
            return Err(ValidationError::EmptyIndices);
        }
        let mut seen = HashSet::with_capacity(indices.len());
        for &index in indices {
            if index >= self.outputs.len() {
                return Err(ValidationError::IndexOutOfRange {
                    index,
                    len: self.outputs.len(),
                });
            }
            if !seen.insert(index) {
                return Err(ValidationError::DuplicateIndex(index));
            }
        }
        Ok(())
    }

    /// Apply a planned change set to this snapshot
    pub fn apply(&mut self, changes: &ChangeSet) {
        for change in &changes.changes {
            match change {
                Change::Locked(value) => self.locked = *value,
                Change::Mined(block) => self.mined = *block,
                Change::Conflicting(value) => self.conflicting = *value,
                Change::SpentCount(count) => self.spent_count = *count,
                Change::Output(entry) => self.outputs[entry.index] = entry.clone(),
            }
        }
    }
}

/// Why `op` may not run on an output in `state`
fn rejection(op: EntryOp, state: OutputState, index: usize) -> ValidationError {
    match (op, state) {
        (EntryOp::Freeze, _) => ValidationError::AlreadyFrozen(index),
        (EntryOp::Unfreeze, _) => ValidationError::NotFrozen(index),
        (_, OutputState::Frozen) => ValidationError::Frozen(index),
        (EntryOp::Spend, _) => ValidationError::AlreadySpent(index),
        (EntryOp::Unspend, _) => ValidationError::NotSpent(index),
    }
}

/// Run one transition against a host record.
///
/// Loads the typed snapshot, validates, builds the success payload and only
/// then commits the buffered change set. On any error the record is left
/// exactly as it was passed in.
pub fn execute(record: &mut Record, transition: &Transition) -> Result<Value> {
    let mut view = RecordView::new(record);
    let mut snapshot = view.load()?;
    // setLocked only needs the record to exist, so an inconsistent record
    // can still be unlocked
    if !matches!(transition, Transition::SetLocked(_)) {
        snapshot.check_invariants()?;
    }

    let changes = snapshot.plan(transition)?;
    snapshot.apply(&changes);
    let affected = transition.indices().map(<[usize]>::to_vec);
    let payload = Outcome::from_record(&snapshot, affected).to_value()?;

    tracing::trace!(
        "{}: committing {} change(s) to outputs {:?}",
        transition.name(),
        changes.len(),
        changes.touched_outputs()
    );
    view.commit(&changes)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_machine::{BlockRef, OwnerRef, TxRef};

    fn tx(n: u8) -> TxRef {
        TxRef(vec![n; 32])
    }

    fn spend(indices: &[usize], n: u8) -> Transition {
        Transition::Spend {
            indices: indices.to_vec(),
            tx_ref: tx(n),
        }
    }

    fn run(record: &mut UtxoRecord, transition: Transition) -> Validation<()> {
        let changes = record.plan(&transition)?;
        record.apply(&changes);
        Ok(())
    }

    #[test]
    fn test_spend_sets_state_and_count() {
        let mut record = UtxoRecord::with_outputs(3);
        run(&mut record, spend(&[1], 7)).unwrap();
        assert_eq!(record.outputs[1].state, OutputState::Spent);
        assert_eq!(record.outputs[1].spending_ref, Some(tx(7)));
        assert_eq!(record.spent_count, 1);
        assert!(record.check_invariants().is_ok());
    }

    #[test]
    fn test_double_spend_rejected() {
        let mut record = UtxoRecord::with_outputs(2);
        run(&mut record, spend(&[0], 1)).unwrap();
        assert_eq!(
            record.plan(&spend(&[0], 1)),
            Err(ValidationError::AlreadySpent(0))
        );
        assert_eq!(record.spent_count, 1);
    }

    #[test]
    fn test_partial_failure_plans_nothing() {
        let mut record = UtxoRecord::with_outputs(3);
        run(&mut record, spend(&[2], 1)).unwrap();
        let before = record.clone();
        assert_eq!(
            record.plan(&spend(&[0, 1, 2], 2)),
            Err(ValidationError::AlreadySpent(2))
        );
        assert_eq!(record, before);
    }

    #[test]
    fn test_index_checks() {
        let record = UtxoRecord::with_outputs(2);
        assert_eq!(
            record.plan(&spend(&[0, 2], 1)),
            Err(ValidationError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            record.plan(&spend(&[1, 1], 1)),
            Err(ValidationError::DuplicateIndex(1))
        );
        assert_eq!(
            record.plan(&Transition::Freeze { indices: vec![] }),
            Err(ValidationError::EmptyIndices)
        );
    }

    #[test]
    fn test_lock_guard() {
        let mut record = UtxoRecord::with_outputs(1);
        run(&mut record, Transition::SetLocked(true)).unwrap();

        let guarded = [
            spend(&[0], 1),
            Transition::Unspend { indices: vec![0] },
            Transition::Freeze { indices: vec![0] },
            Transition::Unfreeze { indices: vec![0] },
            Transition::Reassign {
                indices: vec![0],
                owner: OwnerRef(vec![9]),
            },
            Transition::SetMined(BlockRef {
                block_id: 1,
                height: 10,
            }),
            Transition::SetConflicting(true),
        ];
        for transition in guarded {
            assert_eq!(record.plan(&transition), Err(ValidationError::Locked));
        }

        run(&mut record, Transition::SetLocked(false)).unwrap();
        assert!(!record.locked);
        run(&mut record, spend(&[0], 1)).unwrap();
    }

    #[test]
    fn test_freeze_blocks_spend() {
        let mut record = UtxoRecord::with_outputs(1);
        run(&mut record, Transition::Freeze { indices: vec![0] }).unwrap();
        assert_eq!(record.plan(&spend(&[0], 1)), Err(ValidationError::Frozen(0)));
        assert_eq!(
            record.plan(&Transition::Freeze { indices: vec![0] }),
            Err(ValidationError::AlreadyFrozen(0))
        );
        run(&mut record, Transition::Unfreeze { indices: vec![0] }).unwrap();
        run(&mut record, spend(&[0], 1)).unwrap();
        assert_eq!(record.spent_count, 1);
    }

    #[test]
    fn test_unfreeze_restores_spent_state() {
        let mut record = UtxoRecord::with_outputs(2);
        run(&mut record, spend(&[0], 3)).unwrap();
        run(&mut record, Transition::Freeze { indices: vec![0, 1] }).unwrap();
        assert_eq!(record.spent_count, 0);
        assert!(record.check_invariants().is_ok());

        run(&mut record, Transition::Unfreeze { indices: vec![0, 1] }).unwrap();
        assert_eq!(record.outputs[0].state, OutputState::Spent);
        assert_eq!(record.outputs[0].spending_ref, Some(tx(3)));
        assert_eq!(record.outputs[1].state, OutputState::Unspent);
        assert_eq!(record.outputs[1].frozen_from, None);
        assert_eq!(record.spent_count, 1);
    }

    #[test]
    fn test_unspend_and_unfreeze_require_state() {
        let mut record = UtxoRecord::with_outputs(2);
        assert_eq!(
            record.plan(&Transition::Unspend { indices: vec![0] }),
            Err(ValidationError::NotSpent(0))
        );
        assert_eq!(
            record.plan(&Transition::Unfreeze { indices: vec![1] }),
            Err(ValidationError::NotFrozen(1))
        );
        run(&mut record, Transition::Freeze { indices: vec![1] }).unwrap();
        assert_eq!(
            record.plan(&Transition::Unspend { indices: vec![1] }),
            Err(ValidationError::Frozen(1))
        );
    }

    #[test]
    fn test_reassign_keeps_state() {
        let mut record = UtxoRecord::with_outputs(2);
        run(&mut record, Transition::Freeze { indices: vec![1] }).unwrap();
        run(
            &mut record,
            Transition::Reassign {
                indices: vec![0, 1],
                owner: OwnerRef(vec![0xab]),
            },
        )
        .unwrap();
        assert_eq!(record.outputs[0].owner, Some(OwnerRef(vec![0xab])));
        assert_eq!(record.outputs[0].state, OutputState::Unspent);
        assert_eq!(record.outputs[1].state, OutputState::Frozen);
    }

    #[test]
    fn test_record_flags() {
        let mut record = UtxoRecord::with_outputs(1);
        let block = BlockRef {
            block_id: 5,
            height: 812_000,
        };
        run(&mut record, Transition::SetMined(block)).unwrap();
        run(&mut record, Transition::SetConflicting(true)).unwrap();
        assert_eq!(record.mined, Some(block));
        assert!(record.conflicting);
    }

    #[test]
    fn test_unfreeze_without_prior_state_returns_unspent() {
        let mut record = UtxoRecord::with_outputs(2);
        record.outputs[0].state = OutputState::Frozen;
        record.outputs[0].spending_ref = Some(tx(4));
        record.outputs[1].state = OutputState::Frozen;
        record.outputs[1].frozen_from = Some(OutputState::Frozen);

        run(&mut record, Transition::Unfreeze { indices: vec![0, 1] }).unwrap();
        for entry in &record.outputs {
            assert_eq!(entry.state, OutputState::Unspent);
            assert_eq!(entry.spending_ref, None);
            assert_eq!(entry.frozen_from, None);
        }
        assert_eq!(record.spent_count, 0);
    }

    #[test]
    fn test_plan_recounts_from_entries() {
        let mut record = UtxoRecord::with_outputs(2);
        record.outputs[0].state = OutputState::Spent;
        record.outputs[1].state = OutputState::Spent;
        record.spent_count = 0;

        let changes = record
            .plan(&Transition::Unspend { indices: vec![0] })
            .unwrap();
        record.apply(&changes);
        assert_eq!(record.spent_count, 1);
        assert!(record.check_invariants().is_ok());
    }

    #[test]
    fn test_spent_count_mismatch_detected() {
        let mut record = UtxoRecord::with_outputs(1);
        record.spent_count = 1;
        assert_eq!(
            record.check_invariants(),
            Err(ValidationError::SpentCountMismatch {
                recorded: 1,
                actual: 0
            })
        );
    }
}
