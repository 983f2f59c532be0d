//! Graph construction.
//!
//! Builds the three per-layer directed graphs, the multiplex aggregate
//! (edge weight = number of layers carrying the tie), and the undirected
//! collapse of the aggregate used for community detection. All four share
//! the roster's vertex ordering and are never mutated after construction.

use indexmap::IndexMap;
use serde::Serialize;

use lexnet_graph_algorithms::{DiGraphView, UGraphView};

use crate::data::{Dataset, Relation};

/// One tie layer as a directed graph over roster indices
#[derive(Debug, Clone)]
pub struct LayerGraph {
    pub relation: Relation,
    pub view: DiGraphView,
}

/// A directed aggregate edge: how many layers carry the tie, and which
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateEdge {
    pub from: usize,
    pub to: usize,
    pub weight: u32,
    pub layers: Vec<Relation>,
}

/// The multiplex aggregate graph
#[derive(Debug, Clone)]
pub struct AggregateGraph {
    pub edges: Vec<AggregateEdge>,
    pub view: DiGraphView,
}

/// Build the three layer graphs over the roster's vertex set
pub fn build_layers(dataset: &Dataset) -> Vec<LayerGraph> {
    let n = dataset.roster.len();
    dataset
        .layers
        .iter()
        .map(|layer| LayerGraph {
            relation: layer.relation,
            view: DiGraphView::from_edges(n, &layer.edges),
        })
        .collect()
}

/// Union the layers into the aggregate graph: edges grouped by
/// (from, to), weighted by the number of distinct layers carrying the
/// tie, labeled with the layer names.
pub fn build_aggregate(dataset: &Dataset) -> AggregateGraph {
    let mut grouped: IndexMap<(usize, usize), Vec<Relation>> = IndexMap::new();
    for layer in &dataset.layers {
        for &(from, to) in &layer.edges {
            grouped.entry((from, to)).or_default().push(layer.relation);
        }
    }

    let edges: Vec<AggregateEdge> = grouped
        .into_iter()
        .map(|((from, to), layers)| AggregateEdge {
            from,
            to,
            weight: layers.len() as u32,
            layers,
        })
        .collect();

    let weighted: Vec<(usize, usize, f64)> = edges
        .iter()
        .map(|e| (e.from, e.to, e.weight as f64))
        .collect();
    let view = DiGraphView::from_weighted_edges(dataset.roster.len(), &weighted);

    AggregateGraph { edges, view }
}

/// Collapse the directed aggregate to an undirected weighted graph:
/// reciprocal directed edges sum their weights into one undirected edge.
pub fn collapse_undirected(aggregate: &AggregateGraph, node_count: usize) -> UGraphView {
    let weighted: Vec<(usize, usize, f64)> = aggregate
        .edges
        .iter()
        .map(|e| (e.from, e.to, e.weight as f64))
        .collect();
    UGraphView::from_weighted_edges(node_count, &weighted)
}
