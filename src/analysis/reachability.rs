//! Reachability of states from the initial configuration

use super::diagnostics::Diagnostic;
use crate::statechart::{StateChart, StateRef};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;
use std::collections::HashMap;

/// Activation graph: an edge `a -> b` means `b` can become active after `a`
pub struct ActivationGraph {
    pub graph: DiGraph<StateRef, ()>,
    index: HashMap<StateRef, NodeIndex>,
}

impl ActivationGraph {
    pub fn new(chart: &StateChart) -> Self {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for state in chart.state_refs() {
            index.insert(state, graph.add_node(state));
        }

        for state in chart.state_refs() {
            let from = index[&state];
            // Entering a state enters the default child of every region
            for &region in &chart.state(state).regions {
                if let Some(child) = chart.initial_state(region) {
                    graph.add_edge(from, index[&child], ());
                }
            }
            // Entering a nested target also activates its ancestors
            if let Some(parent) = chart.parent_state(state) {
                graph.add_edge(from, index[&parent], ());
            }
        }

        for transition in chart.transition_refs() {
            let t = chart.transition(transition);
            if let (Some(source), Some(target)) = (t.source, t.target) {
                graph.add_edge(index[&source], index[&target], ());
            }
        }

        Self { graph, index }
    }

    /// States reachable from the chart root, in discovery order
    pub fn reachable(&self, chart: &StateChart) -> Vec<StateRef> {
        let mut found = Vec::new();
        let mut bfs = Bfs::new(&self.graph, self.index[&chart.root]);
        while let Some(node) = bfs.next(&self.graph) {
            found.push(self.graph[node]);
        }
        found
    }
}

/// Warn about every state the chart can never enter
pub fn unreachable_states(chart: &StateChart) -> Vec<Diagnostic> {
    let graph = ActivationGraph::new(chart);
    let reachable = graph.reachable(chart);
    chart
        .state_refs()
        .filter(|s| !reachable.contains(s))
        .map(|s| {
            Diagnostic::warning(
                &chart.name,
                format!("state '{}' is unreachable", chart.state(s).long_name),
            )
        })
        .collect()
}
