//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::{Config, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod output;

/// UTXO lifecycle CLI
#[derive(Parser, Debug)]
#[command(name = "utxo-lifecycle")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a fresh record file with unspent outputs
    Init {
        /// Record file to create
        path: PathBuf,

        /// Number of outputs
        #[arg(short = 'n', long, default_value = "1")]
        outputs: usize,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Run one function against a record file
    Apply {
        /// Record file
        record: PathBuf,

        /// Function name (spend, unspend, freeze, ...)
        function: String,

        /// Arguments as a JSON array; `0x` strings are bytes
        #[arg(short, long)]
        args: Option<String>,

        /// Output format (overrides config)
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,

        /// Do not write the record back
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the typed state of a record file
    Inspect {
        /// Record file
        record: PathBuf,

        /// Output format (overrides config)
        #[arg(short, long, value_enum)]
        output: Option<OutputFormat>,
    },

    /// Print the per-output lifecycle graph
    Transitions {
        /// Graph format
        #[arg(short, long, value_enum, default_value = "dot")]
        format: GraphFormat,

        /// Also write a timestamped .dot file
        #[arg(long)]
        export: bool,
    },
}

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text table
    Table,
}

/// Lifecycle graph formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    /// DOT format (Graphviz)
    Dot,
    /// Plain text table
    Table,
}

impl OutputFormat {
    /// Explicit flag first, then the configured default
    pub fn resolve(flag: Option<OutputFormat>, config: &Config) -> OutputFormat {
        flag.or_else(|| OutputFormat::from_str(&config.output.format, true).ok())
            .unwrap_or(OutputFormat::Table)
    }
}

/// Execute the CLI command
pub fn execute(args: Cli, config: Config) -> Result<()> {
    match args.command {
        Commands::Init {
            path,
            outputs,
            force,
        } => commands::init::execute(path, outputs, force),
        Commands::Apply {
            record,
            function,
            args,
            output,
            dry_run,
        } => commands::apply::execute(
            record,
            &function,
            args.as_deref(),
            OutputFormat::resolve(output, &config),
            dry_run || !config.record.write_back,
        ),
        Commands::Inspect { record, output } => {
            commands::inspect::execute(record, OutputFormat::resolve(output, &config))
        }
        Commands::Transitions { format, export } => {
            commands::transitions::execute(format, export.then(|| config.export_directory()))
        }
    }
}
