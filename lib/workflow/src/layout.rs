//! Layered auto-layout for workflow canvases.
//!
//! The layout runs in four phases:
//!   1. Back edges found by depth-first search are set aside so malformed,
//!      cyclic input can still be ranked
//!   2. Rank assignment by longest path from the sources (bounded relaxation)
//!   3. Ordering within ranks: components in input order, isolated nodes
//!      last, then barycenter sweeps that keep the ordering with the fewest
//!      crossings
//!   4. Coordinates: rank on the main axis, order on the cross axis, every
//!      rank centred against the widest one
//!
//! Layout is a pure function of its input: identical nodes, edges and
//! options give identical positions. Positions are top-left corners.

use crate::edge::Edge;
use crate::error::LayoutError;
use crate::node::{Node, Position};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::unionfind::UnionFind;
use petgraph::visit::{DfsEvent, EdgeRef, depth_first_search};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// The axis along which ranks are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LayoutDirection {
    #[default]
    #[serde(rename = "TB")]
    TopToBottom,
    #[serde(rename = "BT")]
    BottomToTop,
    #[serde(rename = "LR")]
    LeftToRight,
    #[serde(rename = "RL")]
    RightToLeft,
}

impl LayoutDirection {
    /// Returns the short name (`TB`, `BT`, `LR`, `RL`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TopToBottom => "TB",
            Self::BottomToTop => "BT",
            Self::LeftToRight => "LR",
            Self::RightToLeft => "RL",
        }
    }

    /// Returns true when ranks advance along the x axis.
    #[must_use]
    pub const fn is_horizontal(&self) -> bool {
        matches!(self, Self::LeftToRight | Self::RightToLeft)
    }

    const fn is_reversed(&self) -> bool {
        matches!(self, Self::BottomToTop | Self::RightToLeft)
    }
}

impl fmt::Display for LayoutDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayoutDirection {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TB" | "TD" => Ok(Self::TopToBottom),
            "BT" => Ok(Self::BottomToTop),
            "LR" => Ok(Self::LeftToRight),
            "RL" => Ok(Self::RightToLeft),
            _ => Err(LayoutError::UnknownDirection {
                name: s.to_string(),
            }),
        }
    }
}

/// Layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutOptions {
    pub direction: LayoutDirection,
    /// Width of every node box.
    pub node_width: f64,
    /// Height of every node box.
    pub node_height: f64,
    /// Gap between consecutive ranks.
    pub rank_gap: f64,
    /// Gap between neighbours within a rank.
    pub node_gap: f64,
    /// Crossing-reduction sweeps; rank relaxation may use
    /// `max_iterations * (nodes + 1)` passes.
    pub max_iterations: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            direction: LayoutDirection::default(),
            node_width: 172.0,
            node_height: 36.0,
            rank_gap: 50.0,
            node_gap: 50.0,
            max_iterations: 24,
        }
    }
}

impl LayoutOptions {
    /// Sets the direction.
    #[must_use]
    pub fn with_direction(mut self, direction: LayoutDirection) -> Self {
        self.direction = direction;
        self
    }
}

/// Repositioned nodes plus the untouched edges.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutResult {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Computes node positions for a canvas.
#[derive(Debug, Clone, Default)]
pub struct LayoutEngine {
    options: LayoutOptions,
}

impl LayoutEngine {
    #[must_use]
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> &LayoutOptions {
        &self.options
    }

    /// Lays out the graph, falling back to the input positions if the
    /// layout does not converge.
    #[must_use]
    pub fn layout(&self, nodes: &[Node], edges: &[Edge]) -> LayoutResult {
        match self.try_layout(nodes, edges) {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    error = %err,
                    nodes = nodes.len(),
                    "layout failed, keeping previous positions"
                );
                LayoutResult {
                    nodes: nodes.to_vec(),
                    edges: edges.to_vec(),
                }
            }
        }
    }

    /// Lays out the graph.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::NonConvergence`] if rank assignment exceeds its
    /// iteration budget.
    pub fn try_layout(&self, nodes: &[Node], edges: &[Edge]) -> Result<LayoutResult, LayoutError> {
        let positions = compute_positions(nodes, edges, &self.options)?;
        let nodes = nodes
            .iter()
            .zip(positions)
            .map(|(node, position)| {
                let mut node = node.clone();
                node.position = position;
                node
            })
            .collect();
        Ok(LayoutResult {
            nodes,
            edges: edges.to_vec(),
        })
    }
}

fn compute_positions(
    nodes: &[Node],
    edges: &[Edge],
    options: &LayoutOptions,
) -> Result<Vec<Position>, LayoutError> {
    if nodes.is_empty() {
        return Ok(Vec::new());
    }

    let graph = LayoutGraph::build(nodes, edges);
    let ranks = graph.assign_ranks(options.max_iterations)?;
    let mut order = graph.initial_order(&ranks);
    let crossings = graph.minimize_crossings(&mut order, &ranks, options.max_iterations);
    debug!(
        nodes = nodes.len(),
        ranks = order.len(),
        crossings,
        direction = %options.direction,
        "computed layout"
    );
    Ok(assign_coordinates(&order, nodes.len(), options))
}

/// Index-based working graph. Node `i` is `nodes[i]` of the input.
struct LayoutGraph {
    n: usize,
    /// Edges used for ranking, back edges removed, in input order.
    forward: Vec<(usize, usize)>,
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    /// Smallest node index in each node's weakly connected component.
    component: Vec<usize>,
    /// Nodes with no usable edges at all.
    isolated: Vec<bool>,
}

impl LayoutGraph {
    fn build(nodes: &[Node], edges: &[Edge]) -> Self {
        let n = nodes.len();
        let index: HashMap<&str, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id().as_str(), i))
            .collect();

        let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(n, edges.len());
        for _ in 0..n {
            graph.add_node(());
        }
        let mut components = UnionFind::new(n);
        let mut isolated = vec![true; n];
        for edge in edges {
            let (Some(&s), Some(&t)) = (
                index.get(edge.source.as_str()),
                index.get(edge.target.as_str()),
            ) else {
                continue;
            };
            if s == t {
                continue;
            }
            graph.update_edge(NodeIndex::new(s), NodeIndex::new(t), ());
            components.union(s, t);
            isolated[s] = false;
            isolated[t] = false;
        }

        let mut back_edges = HashSet::new();
        depth_first_search(&graph, graph.node_indices(), |event| {
            if let DfsEvent::BackEdge(u, v) = event {
                back_edges.insert((u.index(), v.index()));
            }
        });
        if !back_edges.is_empty() {
            debug!(count = back_edges.len(), "ignoring back edges for ranking");
        }

        let forward: Vec<(usize, usize)> = graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
            .filter(|pair| !back_edges.contains(pair))
            .collect();
        let mut successors = vec![Vec::new(); n];
        let mut predecessors = vec![Vec::new(); n];
        for &(s, t) in &forward {
            successors[s].push(t);
            predecessors[t].push(s);
        }

        let mut first_in_component: HashMap<usize, usize> = HashMap::new();
        let component = (0..n)
            .map(|i| *first_in_component.entry(components.find(i)).or_insert(i))
            .collect();

        Self {
            n,
            forward,
            successors,
            predecessors,
            component,
            isolated,
        }
    }

    /// Longest-path ranks: sources and isolated nodes are rank 0, every
    /// other node sits one rank below its deepest predecessor.
    fn assign_ranks(&self, max_iterations: usize) -> Result<Vec<usize>, LayoutError> {
        let budget = max_iterations.saturating_mul(self.n + 1);
        let mut ranks = vec![0usize; self.n];
        for _ in 0..budget {
            let mut changed = false;
            for &(s, t) in &self.forward {
                if ranks[t] < ranks[s] + 1 {
                    ranks[t] = ranks[s] + 1;
                    changed = true;
                }
            }
            if !changed {
                return Ok(ranks);
            }
        }
        Err(LayoutError::NonConvergence { iterations: budget })
    }

    fn initial_order(&self, ranks: &[usize]) -> Vec<Vec<usize>> {
        let rank_count = ranks.iter().copied().max().unwrap_or(0) + 1;
        let mut nodes: Vec<usize> = (0..self.n).collect();
        nodes.sort_by_key(|&v| (self.isolated[v], self.component[v], v));

        let mut order = vec![Vec::new(); rank_count];
        for v in nodes {
            order[ranks[v]].push(v);
        }
        order
    }

    /// Alternating barycenter sweeps, keeping the best ordering found.
    /// Returns the final crossing count.
    fn minimize_crossings(
        &self,
        order: &mut Vec<Vec<usize>>,
        ranks: &[usize],
        max_iterations: usize,
    ) -> usize {
        let mut best_crossings = self.crossings(order, ranks);
        if order.len() <= 1 {
            return best_crossings;
        }

        let mut best_order = order.clone();
        for _ in 0..max_iterations {
            if best_crossings == 0 {
                break;
            }
            for rank in 1..order.len() {
                self.reorder_rank(order, rank, &self.predecessors);
            }
            for rank in (0..order.len() - 1).rev() {
                self.reorder_rank(order, rank, &self.successors);
            }

            let crossings = self.crossings(order, ranks);
            if crossings < best_crossings {
                best_crossings = crossings;
                best_order = order.clone();
            } else {
                break;
            }
        }
        *order = best_order;
        best_crossings
    }

    /// Sorts one rank by the mean position of each node's neighbours.
    /// Nodes without neighbours keep their current slot as their score.
    fn reorder_rank(&self, order: &mut [Vec<usize>], rank: usize, neighbours: &[Vec<usize>]) {
        let slot = slots(order, self.n);
        let mut scored: Vec<(usize, f64)> = order[rank]
            .iter()
            .map(|&v| {
                let adjacent = &neighbours[v];
                let score = if adjacent.is_empty() {
                    slot[v] as f64
                } else {
                    adjacent.iter().map(|&u| slot[u] as f64).sum::<f64>() / adjacent.len() as f64
                };
                (v, score)
            })
            .collect();

        scored.sort_by(|a, b| {
            self.isolated[a.0]
                .cmp(&self.isolated[b.0])
                .then(a.1.total_cmp(&b.1))
                .then(slot[a.0].cmp(&slot[b.0]))
        });
        order[rank] = scored.into_iter().map(|(v, _)| v).collect();
    }

    /// Counts crossings between edges joining adjacent ranks.
    fn crossings(&self, order: &[Vec<usize>], ranks: &[usize]) -> usize {
        let slot = slots(order, self.n);
        let mut total = 0;
        for rank in 0..order.len().saturating_sub(1) {
            let pairs: Vec<(usize, usize)> = self
                .forward
                .iter()
                .filter(|&&(s, t)| ranks[s] == rank && ranks[t] == rank + 1)
                .map(|&(s, t)| (slot[s], slot[t]))
                .collect();
            for (i, &(a1, b1)) in pairs.iter().enumerate() {
                for &(a2, b2) in &pairs[i + 1..] {
                    if (a1 < a2 && b1 > b2) || (a1 > a2 && b1 < b2) {
                        total += 1;
                    }
                }
            }
        }
        total
    }
}

/// Position of every node within its rank.
fn slots(order: &[Vec<usize>], n: usize) -> Vec<usize> {
    let mut slot = vec![0; n];
    for rank_nodes in order {
        for (i, &v) in rank_nodes.iter().enumerate() {
            slot[v] = i;
        }
    }
    slot
}

fn assign_coordinates(order: &[Vec<usize>], n: usize, options: &LayoutOptions) -> Vec<Position> {
    let horizontal = options.direction.is_horizontal();
    let (main_size, cross_size) = if horizontal {
        (options.node_width, options.node_height)
    } else {
        (options.node_height, options.node_width)
    };
    let rank_step = main_size + options.rank_gap;
    let order_step = cross_size + options.node_gap;

    let span = |count: usize| {
        if count == 0 {
            0.0
        } else {
            count as f64 * cross_size + (count - 1) as f64 * options.node_gap
        }
    };
    let widest = span(order.iter().map(Vec::len).max().unwrap_or(0));
    let last_rank = order.len().saturating_sub(1);

    let mut positions = vec![Position::default(); n];
    for (rank, rank_nodes) in order.iter().enumerate() {
        let rank_index = if options.direction.is_reversed() {
            last_rank - rank
        } else {
            rank
        };
        let main = rank_index as f64 * rank_step;
        let shift = (widest - span(rank_nodes.len())) / 2.0;
        for (i, &v) in rank_nodes.iter().enumerate() {
            let cross = shift + i as f64 * order_step;
            positions[v] = if horizontal {
                Position::new(main, cross)
            } else {
                Position::new(cross, main)
            };
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;

    fn nodes(ids: &[&str]) -> Vec<Node> {
        ids.iter()
            .map(|id| Node::of_type(*id, NodeType::Transformer, Position::new(-1.0, -1.0)))
            .collect()
    }

    fn edges(pairs: &[(&str, &str)]) -> Vec<Edge> {
        pairs
            .iter()
            .enumerate()
            .map(|(i, (s, t))| Edge::new(format!("e{i}"), *s, *t))
            .collect()
    }

    fn position_of(result: &LayoutResult, id: &str) -> Position {
        result
            .nodes
            .iter()
            .find(|n| n.id() == id)
            .map(|n| n.position)
            .unwrap_or_else(|| panic!("node {id} missing"))
    }

    fn assert_no_overlap(result: &LayoutResult, options: &LayoutOptions) {
        for (i, a) in result.nodes.iter().enumerate() {
            for b in &result.nodes[i + 1..] {
                let apart_x = (a.position.x - b.position.x).abs() >= options.node_width;
                let apart_y = (a.position.y - b.position.y).abs() >= options.node_height;
                assert!(apart_x || apart_y, "{} overlaps {}", a.id(), b.id());
            }
        }
    }

    #[test]
    fn disconnected_nodes_share_rank_zero() {
        let engine = LayoutEngine::default();
        let result = engine.layout(&nodes(&["A", "B", "C"]), &[]);

        let (a, b, c) = (
            position_of(&result, "A"),
            position_of(&result, "B"),
            position_of(&result, "C"),
        );
        assert_eq!(a.y, 0.0);
        assert_eq!(b.y, 0.0);
        assert_eq!(c.y, 0.0);
        assert!(a.x < b.x && b.x < c.x);
        assert_no_overlap(&result, engine.options());
    }

    #[test]
    fn layout_is_deterministic() {
        let input_nodes = nodes(&["T", "A", "B", "C", "D"]);
        let input_edges = edges(&[("T", "A"), ("T", "B"), ("A", "C"), ("B", "C"), ("C", "D")]);
        let engine = LayoutEngine::default();

        let first = engine.layout(&input_nodes, &input_edges);
        let second = engine.layout(&input_nodes, &input_edges);
        assert_eq!(first, second);
    }

    #[test]
    fn top_to_bottom_chain_advances_in_y() {
        let options = LayoutOptions::default();
        let result = LayoutEngine::new(options.clone())
            .layout(&nodes(&["T", "A", "B"]), &edges(&[("T", "A"), ("A", "B")]));

        let step = options.node_height + options.rank_gap;
        assert_eq!(position_of(&result, "T").y, 0.0);
        assert_eq!(position_of(&result, "A").y, step);
        assert_eq!(position_of(&result, "B").y, 2.0 * step);
        assert_eq!(position_of(&result, "T").x, position_of(&result, "B").x);
    }

    #[test]
    fn left_to_right_chain_advances_in_x() {
        let options = LayoutOptions::default().with_direction(LayoutDirection::LeftToRight);
        let result = LayoutEngine::new(options.clone())
            .layout(&nodes(&["T", "A"]), &edges(&[("T", "A")]));

        assert_eq!(position_of(&result, "T").x, 0.0);
        assert_eq!(
            position_of(&result, "A").x,
            options.node_width + options.rank_gap
        );
        assert_eq!(position_of(&result, "T").y, position_of(&result, "A").y);
    }

    #[test]
    fn reversed_directions_flip_ranks() {
        let input_nodes = nodes(&["T", "A"]);
        let input_edges = edges(&[("T", "A")]);

        let bt =
            LayoutEngine::new(LayoutOptions::default().with_direction(LayoutDirection::BottomToTop))
                .layout(&input_nodes, &input_edges);
        assert!(position_of(&bt, "T").y > position_of(&bt, "A").y);

        let rl =
            LayoutEngine::new(LayoutOptions::default().with_direction(LayoutDirection::RightToLeft))
                .layout(&input_nodes, &input_edges);
        assert!(position_of(&rl, "T").x > position_of(&rl, "A").x);
    }

    #[test]
    fn isolated_nodes_come_after_connected_components() {
        let result = LayoutEngine::default()
            .layout(&nodes(&["X", "A", "B"]), &edges(&[("A", "B")]));

        assert_eq!(position_of(&result, "X").y, 0.0);
        assert!(position_of(&result, "A").x < position_of(&result, "X").x);
    }

    #[test]
    fn barycenter_sweeps_remove_crossings() {
        // Initial order puts C before D, which crosses A->D and B->C.
        let result = LayoutEngine::default().layout(
            &nodes(&["T", "A", "B", "C", "D"]),
            &edges(&[("T", "A"), ("T", "B"), ("A", "D"), ("B", "C")]),
        );

        assert!(position_of(&result, "A").x < position_of(&result, "B").x);
        assert!(position_of(&result, "D").x < position_of(&result, "C").x);
    }

    #[test]
    fn cyclic_input_still_lays_out() {
        let engine = LayoutEngine::default();
        let result = engine.try_layout(
            &nodes(&["A", "B", "C"]),
            &edges(&[("A", "B"), ("B", "C"), ("C", "A")]),
        );

        let result = result.expect("back edges are ignored");
        assert_no_overlap(&result, engine.options());
    }

    #[test]
    fn non_convergence_keeps_previous_positions() {
        let options = LayoutOptions {
            max_iterations: 0,
            ..LayoutOptions::default()
        };
        let engine = LayoutEngine::new(options);
        let input_nodes = nodes(&["A", "B"]);
        let input_edges = edges(&[("A", "B")]);

        assert!(matches!(
            engine.try_layout(&input_nodes, &input_edges),
            Err(LayoutError::NonConvergence { .. })
        ));
        let result = engine.layout(&input_nodes, &input_edges);
        assert_eq!(result.nodes, input_nodes);
    }

    #[test]
    fn edges_to_unknown_nodes_are_ignored() {
        let input_edges = edges(&[("A", "ghost")]);
        let result = LayoutEngine::default().layout(&nodes(&["A"]), &input_edges);

        assert_eq!(position_of(&result, "A"), Position::new(0.0, 0.0));
        assert_eq!(result.edges, input_edges);
    }

    #[test]
    fn empty_graph_lays_out_to_nothing() {
        let result = LayoutEngine::default().layout(&[], &[]);
        assert!(result.nodes.is_empty());
    }

    #[test]
    fn direction_parses_short_names() {
        assert_eq!("lr".parse::<LayoutDirection>(), Ok(LayoutDirection::LeftToRight));
        assert_eq!("TB".parse::<LayoutDirection>(), Ok(LayoutDirection::TopToBottom));
        assert!("diagonal".parse::<LayoutDirection>().is_err());
        assert_eq!(
            serde_json::to_string(&LayoutDirection::RightToLeft).expect("serialize"),
            "\"RL\""
        );
    }
}
