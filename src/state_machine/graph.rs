//! Lifecycle graph
//!
//! Renders the per-output transition table as a petgraph graph for DOT
//! export and reachability checks.

use crate::Result;
use crate::state_machine::{EntryOp, OutputState, TRANSITIONS};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The per-output lifecycle as a directed graph.
///
/// Nodes are output states, edges are the operations that move an output
/// from one state to another. Built from `TRANSITIONS`, so it always mirrors
/// the rules the state machine enforces.
pub struct LifecycleGraph {
    pub graph: DiGraph<OutputState, EntryOp>,

    /// Lookup from state to its node
    pub state_index: HashMap<OutputState, NodeIndex>,
}

impl Default for LifecycleGraph {
    fn default() -> Self {
        Self::build()
    }
}

impl LifecycleGraph {
    pub fn build() -> Self {
        let mut graph = DiGraph::new();
        let mut state_index = HashMap::new();

        for state in [OutputState::Unspent, OutputState::Spent, OutputState::Frozen] {
            state_index.insert(state, graph.add_node(state));
        }
        for &(from, op, to) in TRANSITIONS {
            graph.add_edge(state_index[&from], state_index[&to], op);
        }

        Self { graph, state_index }
    }

    /// Operations that lead out of `state`
    pub fn exits(&self, state: OutputState) -> Vec<EntryOp> {
        let Some(&idx) = self.state_index.get(&state) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|edge| *edge.weight())
            .collect()
    }

    /// States `op` can move an output in `state` to
    pub fn targets(&self, state: OutputState, op: EntryOp) -> Vec<OutputState> {
        let Some(&idx) = self.state_index.get(&state) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .filter(|edge| *edge.weight() == op)
            .map(|edge| self.graph[edge.target()])
            .collect()
    }

    /// Whether some sequence of operations leads from `from` to `to`
    pub fn reachable(&self, from: OutputState, to: OutputState) -> bool {
        match (self.state_index.get(&from), self.state_index.get(&to)) {
            (Some(&a), Some(&b)) => petgraph::algo::has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    /// Export to DOT format for Graphviz
    pub fn to_dot(&self) -> String {
        let mut dot = "digraph OutputLifecycle {\n".to_string();
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=filled];\n\n");

        for idx in self.graph.node_indices() {
            let state = self.graph[idx];
            dot.push_str(&format!(
                "  \"{}\" [label=\"{}\", fillcolor=\"{}\"];\n",
                state.name(),
                state.name(),
                state.color()
            ));
        }

        dot.push('\n');

        for edge in self.graph.edge_references() {
            dot.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                self.graph[edge.source()].name(),
                self.graph[edge.target()].name(),
                edge.weight().name()
            ));
        }

        dot.push_str("}\n");
        dot
    }

    /// Write the DOT rendering to `{timestamp}.lifecycle.dot` under `dir`
    pub fn export_dot(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let filename = format!("{}.lifecycle.dot", chrono::Utc::now().format("%Y%m%d%H%M%S"));
        let path = dir.as_ref().join(filename);
        std::fs::write(&path, self.to_dot())?;
        tracing::info!("Lifecycle graph exported to {:?}", path);
        Ok(path)
    }

    /// Get graph statistics
    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_states: self.graph.node_count(),
            total_transitions: self.graph.edge_count(),
            has_cycles: petgraph::algo::is_cyclic_directed(&self.graph),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GraphStats {
    pub total_states: usize,
    pub total_transitions: usize,
    pub has_cycles: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_mirrors_table() {
        let graph = LifecycleGraph::build();
        let stats = graph.stats();
        assert_eq!(stats.total_states, 3);
        assert_eq!(stats.total_transitions, TRANSITIONS.len());
        assert!(stats.has_cycles);
    }

    #[test]
    fn test_frozen_exits_only_via_unfreeze() {
        let graph = LifecycleGraph::build();
        let exits = graph.exits(OutputState::Frozen);
        assert_eq!(exits.len(), 2);
        assert!(exits.iter().all(|op| *op == EntryOp::Unfreeze));

        let mut targets = graph.targets(OutputState::Frozen, EntryOp::Unfreeze);
        targets.sort_by_key(|s| s.name());
        assert_eq!(targets, vec![OutputState::Spent, OutputState::Unspent]);
    }

    #[test]
    fn test_every_state_reachable_from_unspent() {
        let graph = LifecycleGraph::build();
        for state in [OutputState::Spent, OutputState::Frozen] {
            assert!(graph.reachable(OutputState::Unspent, state));
            assert!(graph.reachable(state, OutputState::Unspent));
        }
    }

    #[test]
    fn test_to_dot_output() {
        let dot = LifecycleGraph::build().to_dot();
        assert!(dot.contains("digraph OutputLifecycle"));
        assert!(dot.contains("\"unspent\" -> \"spent\" [label=\"spend\"]"));
        assert!(dot.contains("yellow"));
    }
}
