//! Output formatting module
//!
//! This module handles formatting call results, records and the lifecycle
//! graph for the terminal.

use crate::cli::OutputFormat;
use crate::record::Value;
use crate::result::CallResult;
use crate::state_machine::{LifecycleGraph, UtxoRecord};
use crate::Result;
use petgraph::visit::EdgeRef;
use serde_json::json;

/// Output a call result
pub fn write_result(
    w: &mut impl std::io::Write,
    result: &CallResult,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let output = json!({
                "success": result.success,
                "value": result.value.to_json(),
            });
            serde_json::to_writer_pretty(&mut *w, &output)?;
            writeln!(w)?;
        }
        OutputFormat::Table => match &result.value {
            Value::Map(fields) if result.success => {
                writeln!(w, "Success")?;
                for (name, value) in fields {
                    writeln!(w, "  {:<12} {}", name, value)?;
                }
            }
            value => writeln!(w, "Failed: {}", value.as_str().unwrap_or_default())?,
        },
    }
    Ok(())
}

/// Output the typed state of a record
pub fn write_record(
    w: &mut impl std::io::Write,
    record: &UtxoRecord,
    format: OutputFormat,
) -> Result<()> {
    if format == OutputFormat::Json {
        serde_json::to_writer_pretty(&mut *w, record)?;
        writeln!(w)?;
        return Ok(());
    }

    writeln!(w, "UTXO Record")?;
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w, "  Locked:      {}", record.locked)?;
    writeln!(w, "  Conflicting: {}", record.conflicting)?;
    writeln!(
        w,
        "  Mined:       {}",
        record
            .mined
            .map(|b| b.to_string())
            .unwrap_or_else(|| "no".to_string())
    )?;
    writeln!(w, "  Spent:       {}/{}", record.spent_count, record.outputs.len())?;
    writeln!(w)?;

    if !record.outputs.is_empty() {
        writeln!(w, "{:-<80}", "")?;
        writeln!(w, "{:>5} {:<8} {:<32} {:<20}", "Out#", "State", "Spending Tx", "Owner")?;
        writeln!(w, "{:-<80}", "")?;

        for entry in &record.outputs {
            let spending = entry
                .spending_ref
                .as_ref()
                .map(|r| shorten(&r.to_string(), 30))
                .unwrap_or_else(|| "-".to_string());
            let owner = entry
                .owner
                .as_ref()
                .map(|o| shorten(&o.to_string(), 18))
                .unwrap_or_else(|| "-".to_string());

            writeln!(
                w,
                "{:>5} {:<8} {:<32} {:<20}",
                entry.index,
                entry.state.name(),
                spending,
                owner
            )?;
        }
        writeln!(w)?;
    }

    Ok(())
}

/// Output the lifecycle transitions as a table
pub fn write_transitions(w: &mut impl std::io::Write, graph: &LifecycleGraph) -> Result<()> {
    writeln!(w, "{:<10} {:<10} {:<10}", "From", "Operation", "To")?;
    writeln!(w, "{:-<32}", "")?;
    for edge in graph.graph.edge_references() {
        writeln!(
            w,
            "{:<10} {:<10} {:<10}",
            graph.graph[edge.source()].name(),
            edge.weight().name(),
            graph.graph[edge.target()].name()
        )?;
    }
    Ok(())
}

fn shorten(s: &str, max: usize) -> String {
    if s.len() > max {
        format!("{}...", &s[..max - 3])
    } else {
        s.to_string()
    }
}
