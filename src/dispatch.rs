//! Dispatch table and entry point
//!
//! The host resolves a module and function name to `apply`, passing the
//! record it holds exclusively for the duration of the call. The record and
//! arguments are only borrowed: nothing here outlives the call.

use crate::args::Args;
use crate::record::{Record, Value};
use crate::result::CallResult;
use crate::state_machine::{OwnerRef, Transition, TxRef, execute};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

/// A named operation on one record
pub type Handler = fn(&mut Record, Args<'_>) -> Result<Value>;

/// Capability interface the host calls into
pub trait Hooks {
    /// Run `function` against `record` with already-decoded `args`
    fn apply(&self, function: Option<&str>, record: &mut Record, args: &[Value]) -> CallResult;
}

/// Name to handler mapping, read-only once built
#[derive(Clone)]
pub struct Registry {
    handlers: HashMap<&'static str, Handler>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("functions", &self.names())
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        let entries: [(&'static str, Handler); 8] = [
            ("setLocked", set_locked),
            ("spend", spend),
            ("unspend", unspend),
            ("freeze", freeze),
            ("unfreeze", unfreeze),
            ("reassign", reassign),
            ("setMined", set_mined),
            ("setConflicting", set_conflicting),
        ];
        Self {
            handlers: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).copied()
    }

    /// Registered function names, sorted
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Resolve and run one call
    pub fn dispatch(&self, function: Option<&str>, record: &mut Record, args: &[Value]) -> Result<Value> {
        let name = match function {
            Some(name) if !name.is_empty() => name,
            _ => return Err(Error::Input),
        };
        let handler = self.get(name).ok_or_else(|| Error::unknown_function(name))?;
        handler(record, Args::new(args))
    }
}

/// The UTXO lifecycle module as registered with the host.
///
/// Owns the dispatch table; dropping the module tears it down.
#[derive(Debug, Clone, Default)]
pub struct UtxoModule {
    registry: Registry,
}

impl UtxoModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Hooks for UtxoModule {
    fn apply(&self, function: Option<&str>, record: &mut Record, args: &[Value]) -> CallResult {
        tracing::debug!("apply {:?} with {} arg(s)", function, args.len());

        let result = CallResult::build(self.registry.dispatch(function, record, args));
        if let Some(message) = result.message() {
            tracing::debug!("{:?} rejected: {}", function, message);
        }
        result
    }
}

/// Process-wide module, built on first use
static MODULE: LazyLock<UtxoModule> = LazyLock::new(|| {
    tracing::debug!("building UTXO dispatch table");
    UtxoModule::new()
});

/// Entry point: run `function` against `record` using the process-wide module
pub fn apply(function: Option<&str>, record: &mut Record, args: &[Value]) -> CallResult {
    MODULE.apply(function, record, args)
}

// Handlers

fn set_locked(record: &mut Record, args: Args<'_>) -> Result<Value> {
    execute(record, &Transition::SetLocked(args.bool(0)?))
}

fn spend(record: &mut Record, args: Args<'_>) -> Result<Value> {
    let transition = Transition::Spend {
        indices: args.indices(0)?,
        tx_ref: TxRef(args.bytes(1)?),
    };
    execute(record, &transition)
}

fn unspend(record: &mut Record, args: Args<'_>) -> Result<Value> {
    let indices = args.indices(0)?;
    execute(record, &Transition::Unspend { indices })
}

fn freeze(record: &mut Record, args: Args<'_>) -> Result<Value> {
    let indices = args.indices(0)?;
    execute(record, &Transition::Freeze { indices })
}

fn unfreeze(record: &mut Record, args: Args<'_>) -> Result<Value> {
    let indices = args.indices(0)?;
    execute(record, &Transition::Unfreeze { indices })
}

fn reassign(record: &mut Record, args: Args<'_>) -> Result<Value> {
    let transition = Transition::Reassign {
        indices: args.indices(0)?,
        owner: OwnerRef(args.bytes(1)?),
    };
    execute(record, &transition)
}

fn set_mined(record: &mut Record, args: Args<'_>) -> Result<Value> {
    execute(record, &Transition::SetMined(args.block_ref(0)?))
}

fn set_conflicting(record: &mut Record, args: Args<'_>) -> Result<Value> {
    execute(record, &Transition::SetConflicting(args.bool(0)?))
}
