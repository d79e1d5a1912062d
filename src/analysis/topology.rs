use crate::store::{NodeId, Registry};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::BTreeMap;

/// Structural census of a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologySummary {
    pub nodes: usize,
    /// Dependency -> reaction edges (inputs, catalysts and regulators).
    pub causal_edges: usize,
    /// Strongly connected components the engine has to relax through:
    /// more than one node, or a single node feeding itself.
    pub feedback_components: usize,
    /// Size of the largest feedback component (0 if the graph is acyclic).
    pub largest_component: usize,
    pub kind_counts: BTreeMap<&'static str, usize>,
}

/// Builds the causal graph: an edge from every dependency to the reaction
/// that consumes it. Graph indices coincide with `NodeId` indices.
pub fn causal_graph(registry: &Registry) -> DiGraph<NodeId, ()> {
    let mut graph = DiGraph::with_capacity(registry.count(), 0);
    for id in registry.node_ids() {
        graph.add_node(id);
    }
    for (id, reaction) in registry.reactions() {
        for dep in reaction.dependencies() {
            graph.add_edge(NodeIndex::new(dep.index()), NodeIndex::new(id.index()), ());
        }
    }
    graph
}

pub fn summarize(registry: &Registry) -> TopologySummary {
    let graph = causal_graph(registry);

    let feedback: Vec<usize> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|scc| scc.len())
        .collect();

    TopologySummary {
        nodes: graph.node_count(),
        causal_edges: graph.edge_count(),
        feedback_components: feedback.len(),
        largest_component: feedback.iter().copied().max().unwrap_or(0),
        kind_counts: registry.kind_counts(),
    }
}
