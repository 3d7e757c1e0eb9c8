//! State machine module - UTXO lifecycle rules for a single record

pub mod graph;
pub mod machine;
pub mod state;
pub mod transition;

// Re-export key types
pub use graph::{GraphStats, LifecycleGraph};
pub use machine::execute;
pub use state::{
    BlockRef, EntryOp, OutputState, OwnerRef, TRANSITIONS, TxRef, UtxoEntry, UtxoRecord,
    is_allowed,
};
pub use transition::{Change, ChangeSet, Transition};
