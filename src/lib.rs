//! UTXO Lifecycle
//!
//! Single-record state machine tracking the spend, freeze, lock and mining
//! status of a transaction's outputs.
//!
//! This library provides functionality for:
//! - Dispatching a named function call against one exclusively-held record
//! - Validating every precondition before touching the record (all or nothing)
//! - Reading and writing the record's bins through a typed view
//! - Returning a structured success payload or a plain error message
//!
//! ```
//! use utxo_lifecycle::{Record, Value, apply};
//!
//! let mut record = Record::with_outputs(3);
//! let result = apply(
//!     Some("spend"),
//!     &mut record,
//!     &[Value::List(vec![Value::Int(0)]), Value::Bytes(vec![0xab; 32])],
//! );
//! assert!(result.success);
//! ```

pub mod args;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod record;
pub mod result;
pub mod state_machine;

pub use config::Config;
pub use dispatch::{Hooks, UtxoModule, apply};
pub use error::{Error, ErrorKind, Result, ValidationError};
pub use record::{Record, Value};
pub use result::CallResult;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given log level
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
