//! CLI command implementations
//!
//! This module contains the implementation for each CLI command.

use crate::record::Value;
use crate::{Error, Result};
use anyhow::Context;
use serde_json::Value as JsonValue;

/// Parse `--args` JSON into host values
fn parse_call_args(raw: Option<&str>) -> Result<Vec<Value>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let json: JsonValue =
        serde_json::from_str(raw).context("--args is not valid JSON")?;
    let JsonValue::Array(items) = json else {
        return Err(anyhow::anyhow!("--args must be a JSON array").into());
    };
    items.iter().map(Value::from_json).collect()
}

/// Init command implementation
pub mod init {
    use super::*;
    use crate::record::{Record, RecordView};
    use crate::state_machine::UtxoRecord;
    use std::path::PathBuf;

    /// Execute the init command
    pub fn execute(path: PathBuf, outputs: usize, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(Error::Config(format!(
                "{:?} already exists, pass --force to overwrite",
                path
            )));
        }

        let mut record = Record::new();
        RecordView::new(&mut record).store(&UtxoRecord::with_outputs(outputs))?;
        record.save(&path)?;

        tracing::info!("Created record {:?} with {} outputs", path, outputs);
        Ok(())
    }
}

/// Apply command implementation
pub mod apply {
    use super::*;
    use crate::cli::{OutputFormat, output};
    use crate::dispatch;
    use crate::record::Record;
    use std::path::PathBuf;

    /// Execute the apply command
    pub fn execute(
        path: PathBuf,
        function: &str,
        raw_args: Option<&str>,
        format: OutputFormat,
        dry_run: bool,
    ) -> Result<()> {
        let mut record = Record::from_file(&path)?;
        let args = parse_call_args(raw_args)?;
        tracing::debug!("Calling {} with {:?}", function, args);

        let result = dispatch::apply(Some(function), &mut record, &args);
        output::write_result(&mut std::io::stdout().lock(), &result, format)?;

        if !result.success {
            return Err(anyhow::anyhow!("{} failed", function).into());
        }
        if dry_run {
            tracing::info!("Dry run, record {:?} left unchanged", path);
        } else {
            record.save(&path)?;
            tracing::info!("Record {:?} updated", path);
        }
        Ok(())
    }
}

/// Inspect command implementation
pub mod inspect {
    use super::*;
    use crate::cli::{OutputFormat, output};
    use crate::record::{Record, RecordView};
    use std::path::PathBuf;

    /// Execute the inspect command
    pub fn execute(path: PathBuf, format: OutputFormat) -> Result<()> {
        let mut record = Record::from_file(&path)?;
        let utxo = RecordView::new(&mut record).load()?;
        if let Err(e) = utxo.check_invariants() {
            tracing::warn!("Record {:?} is inconsistent: {}", path, e);
        }
        output::write_record(&mut std::io::stdout().lock(), &utxo, format)
    }
}

/// Transitions command implementation
pub mod transitions {
    use super::*;
    use crate::cli::{GraphFormat, output};
    use crate::state_machine::LifecycleGraph;
    use std::io::Write;
    use std::path::PathBuf;

    /// Execute the transitions command
    pub fn execute(format: GraphFormat, export_dir: Option<PathBuf>) -> Result<()> {
        let graph = LifecycleGraph::build();
        let mut out = std::io::stdout().lock();
        match format {
            GraphFormat::Dot => write!(out, "{}", graph.to_dot())?,
            GraphFormat::Table => output::write_transitions(&mut out, &graph)?,
        }

        if let Some(dir) = export_dir {
            let path = graph.export_dot(dir)?;
            writeln!(out, "Graph exported to {}", path.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_call_args() {
        let args = parse_call_args(Some(r#"[[0, 1], "0x0a0b", true]"#)).unwrap();
        assert_eq!(
            args,
            vec![
                Value::List(vec![Value::Int(0), Value::Int(1)]),
                Value::Bytes(vec![0x0a, 0x0b]),
                Value::Bool(true),
            ]
        );
        assert!(parse_call_args(None).unwrap().is_empty());
    }

    #[test]
    fn test_parse_call_args_rejects_non_arrays() {
        assert!(matches!(
            parse_call_args(Some(r#"{"a": 1}"#)),
            Err(Error::Other(_))
        ));
        assert!(parse_call_args(Some("[1,")).is_err());
    }

    #[test]
    fn test_apply_and_init_on_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("record.json");

        init::execute(path.clone(), 2, true).unwrap();
        assert!(init::execute(path.clone(), 2, false).is_err());

        apply::execute(
            path.clone(),
            "spend",
            Some(r#"[[1], "0x01"]"#),
            crate::cli::OutputFormat::Json,
            false,
        )
        .unwrap();

        let mut record = crate::record::Record::from_file(&path).unwrap();
        let utxo = crate::record::RecordView::new(&mut record).load().unwrap();
        assert_eq!(utxo.spent_count, 1);

        // Rejected calls leave the file alone
        let before = std::fs::read(&path).unwrap();
        assert!(
            apply::execute(
                path.clone(),
                "spend",
                Some(r#"[[1], "0x01"]"#),
                crate::cli::OutputFormat::Json,
                false,
            )
            .is_err()
        );
        assert_eq!(std::fs::read(&path).unwrap(), before);
    }
}
