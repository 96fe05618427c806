//! Cycle checks for canvas graphs.
//!
//! Edges are checked one at a time as they are proposed: a new edge
//! `source -> target` closes a cycle exactly when `source` is reachable from
//! `target` through existing outgoing edges.

use crate::edge::Edge;
use crate::node::Node;
use petgraph::graphmap::DiGraphMap;
use std::collections::{HashMap, HashSet};

/// Returns true if adding `source -> target` to `edges` would create a
/// directed cycle. A self loop always does.
///
/// Uses an explicit stack, so graphs that already contain unrelated cycles
/// are handled and the call stack does not grow with the graph.
#[must_use]
pub fn would_create_cycle(edges: &[Edge], source: &str, target: &str) -> bool {
    if source == target {
        return true;
    }

    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in edges {
        outgoing
            .entry(edge.source.as_str())
            .or_default()
            .push(edge.target.as_str());
    }

    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack = vec![target];
    while let Some(current) = stack.pop() {
        if !visited.insert(current) {
            continue;
        }
        for &next in outgoing.get(current).into_iter().flatten() {
            if next == source {
                return true;
            }
            if !visited.contains(next) {
                stack.push(next);
            }
        }
    }
    false
}

/// Returns true if the graph formed by `nodes` and `edges` has a directed cycle.
///
/// Edges whose endpoints are not in `nodes` are ignored.
#[must_use]
pub fn has_cycle(nodes: &[Node], edges: &[Edge]) -> bool {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
    for node in nodes {
        graph.add_node(node.id().as_str());
    }
    for edge in edges {
        let (source, target) = (edge.source.as_str(), edge.target.as_str());
        if graph.contains_node(source) && graph.contains_node(target) {
            graph.add_edge(source, target, ());
        }
    }
    petgraph::algo::is_cyclic_directed(&graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeType, Position};

    fn chain(pairs: &[(&str, &str)]) -> Vec<Edge> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (s, t))| Edge::new(format!("e{i}"), *s, *t))
            .collect()
    }

    #[test]
    fn self_loop_is_a_cycle() {
        assert!(would_create_cycle(&[], "A", "A"));
    }

    #[test]
    fn back_edge_closes_cycle() {
        let edges = chain(&[("T", "A"), ("A", "B")]);
        assert!(would_create_cycle(&edges, "B", "T"));
        assert!(!would_create_cycle(&edges, "T", "B"));
    }

    #[test]
    fn target_without_outgoers_passes() {
        let edges = chain(&[("A", "B")]);
        assert!(!would_create_cycle(&edges, "A", "C"));
    }

    #[test]
    fn existing_unrelated_cycle_does_not_loop_forever() {
        let edges = chain(&[("X", "Y"), ("Y", "X"), ("A", "X")]);
        assert!(!would_create_cycle(&edges, "B", "A"));
        assert!(would_create_cycle(&edges, "X", "A"));
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        let edges = chain(&[("A", "B"), ("A", "C"), ("B", "D")]);
        assert!(!would_create_cycle(&edges, "C", "D"));
    }

    #[test]
    fn has_cycle_detects_loops() {
        let nodes: Vec<Node> = ["A", "B", "C"]
            .into_iter()
            .map(|id| Node::of_type(id, NodeType::Transformer, Position::default()))
            .collect();
        assert!(!has_cycle(&nodes, &chain(&[("A", "B"), ("B", "C")])));
        assert!(has_cycle(&nodes, &chain(&[("A", "B"), ("B", "C"), ("C", "A")])));
        // Edges to unknown nodes are ignored.
        assert!(!has_cycle(&nodes, &chain(&[("A", "Z"), ("Z", "A")])));
    }
}
