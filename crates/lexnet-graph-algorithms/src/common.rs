//! Shared graph views for algorithm execution.
//!
//! Provides dense, integer-indexed, read-only views of a network in
//! Compressed Sparse Row (CSR) form. Callers are responsible for mapping
//! their domain identifiers onto the dense index range `0..node_count`.

/// A directed graph snapshot in CSR form.
///
/// Edges are stored twice (by source and by target) so that successor and
/// predecessor scans are both O(degree). Targets within a row are sorted,
/// which makes `has_edge` a binary search.
#[derive(Debug, Clone)]
pub struct DiGraphView {
    node_count: usize,
    /// Offsets into `out_targets`. Size = node_count + 1
    out_offsets: Vec<usize>,
    out_targets: Vec<usize>,
    /// Offsets into `in_sources`. Size = node_count + 1
    in_offsets: Vec<usize>,
    in_sources: Vec<usize>,
    /// Edge weights aligned with `out_targets`; `None` for unit weights
    weights: Option<Vec<f64>>,
}

impl DiGraphView {
    /// Build a view from an edge list. Duplicate edges collapse to one;
    /// self-loops and out-of-range endpoints panic (callers validate first).
    pub fn from_edges(node_count: usize, edges: &[(usize, usize)]) -> Self {
        let weighted: Vec<(usize, usize, f64)> =
            edges.iter().map(|&(u, v)| (u, v, 1.0)).collect();
        let mut view = Self::from_weighted_edges(node_count, &weighted);
        view.weights = None;
        view
    }

    /// Build a weighted view. Duplicate (u, v) pairs keep the first weight.
    pub fn from_weighted_edges(node_count: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut sorted: Vec<(usize, usize, f64)> = edges.to_vec();
        for &(u, v, _) in &sorted {
            assert!(u < node_count && v < node_count, "edge endpoint out of range");
            assert!(u != v, "self-loop in edge list");
        }
        sorted.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        sorted.dedup_by_key(|e| (e.0, e.1));

        let mut out_offsets = Vec::with_capacity(node_count + 1);
        let mut out_targets = Vec::with_capacity(sorted.len());
        let mut weights = Vec::with_capacity(sorted.len());
        out_offsets.push(0);
        let mut row = 0;
        for &(u, v, w) in &sorted {
            while row < u {
                out_offsets.push(out_targets.len());
                row += 1;
            }
            out_targets.push(v);
            weights.push(w);
        }
        while out_offsets.len() <= node_count {
            out_offsets.push(out_targets.len());
        }

        // Incoming CSR: bucket sources by target
        let mut in_degree = vec![0usize; node_count];
        for &(_, v, _) in &sorted {
            in_degree[v] += 1;
        }
        let mut in_offsets = Vec::with_capacity(node_count + 1);
        in_offsets.push(0);
        for v in 0..node_count {
            in_offsets.push(in_offsets[v] + in_degree[v]);
        }
        let mut cursor = in_offsets.clone();
        let mut in_sources = vec![0usize; sorted.len()];
        for &(u, v, _) in &sorted {
            in_sources[cursor[v]] = u;
            cursor[v] += 1;
        }

        DiGraphView {
            node_count,
            out_offsets,
            out_targets,
            in_offsets,
            in_sources,
            weights: Some(weights),
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn edge_count(&self) -> usize {
        self.out_targets.len()
    }

    pub fn out_degree(&self, idx: usize) -> usize {
        self.out_offsets[idx + 1] - self.out_offsets[idx]
    }

    pub fn in_degree(&self, idx: usize) -> usize {
        self.in_offsets[idx + 1] - self.in_offsets[idx]
    }

    /// Outgoing neighbors of a node, sorted ascending
    pub fn successors(&self, idx: usize) -> &[usize] {
        &self.out_targets[self.out_offsets[idx]..self.out_offsets[idx + 1]]
    }

    /// Incoming neighbors of a node
    pub fn predecessors(&self, idx: usize) -> &[usize] {
        &self.in_sources[self.in_offsets[idx]..self.in_offsets[idx + 1]]
    }

    pub fn has_edge(&self, u: usize, v: usize) -> bool {
        self.successors(u).binary_search(&v).is_ok()
    }

    /// Weights for outgoing edges of a node, aligned with `successors`
    pub fn successor_weights(&self, idx: usize) -> Option<&[f64]> {
        self.weights
            .as_ref()
            .map(|w| &w[self.out_offsets[idx]..self.out_offsets[idx + 1]])
    }

    /// Weight of the edge (u, v); 1.0 for unweighted views, None when the
    /// edge does not exist
    pub fn edge_weight(&self, u: usize, v: usize) -> Option<f64> {
        let pos = self.successors(u).binary_search(&v).ok()?;
        Some(match &self.weights {
            Some(w) => w[self.out_offsets[u] + pos],
            None => 1.0,
        })
    }

    pub fn out_degree_sequence(&self) -> Vec<usize> {
        (0..self.node_count).map(|i| self.out_degree(i)).collect()
    }

    pub fn in_degree_sequence(&self) -> Vec<usize> {
        (0..self.node_count).map(|i| self.in_degree(i)).collect()
    }

    /// All edges as (source, target) pairs
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.edge_count());
        for u in 0..self.node_count {
            for &v in self.successors(u) {
                out.push((u, v));
            }
        }
        out
    }
}

/// An undirected weighted graph snapshot in CSR form.
///
/// Each undirected edge {u, v} is stored in both rows, so `degree` counts
/// incident edges and `total_weight` is the sum over undirected edges.
#[derive(Debug, Clone)]
pub struct UGraphView {
    node_count: usize,
    offsets: Vec<usize>,
    targets: Vec<usize>,
    weights: Vec<f64>,
    total_weight: f64,
}

impl UGraphView {
    /// Build from undirected weighted edges; each {u, v} listed once.
    /// Duplicate pairs sum their weights.
    pub fn from_weighted_edges(node_count: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut merged: std::collections::BTreeMap<(usize, usize), f64> =
            std::collections::BTreeMap::new();
        for &(u, v, w) in edges {
            assert!(u < node_count && v < node_count, "edge endpoint out of range");
            assert!(u != v, "self-loop in edge list");
            let key = if u < v { (u, v) } else { (v, u) };
            *merged.entry(key).or_insert(0.0) += w;
        }

        let mut adjacency: Vec<Vec<(usize, f64)>> = vec![Vec::new(); node_count];
        let mut total_weight = 0.0;
        for (&(u, v), &w) in &merged {
            adjacency[u].push((v, w));
            adjacency[v].push((u, w));
            total_weight += w;
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::new();
        let mut weights = Vec::new();
        offsets.push(0);
        for row in adjacency {
            for (v, w) in row {
                targets.push(v);
                weights.push(w);
            }
            offsets.push(targets.len());
        }

        UGraphView {
            node_count,
            offsets,
            targets,
            weights,
            total_weight,
        }
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    /// Sum of weights over undirected edges
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.offsets[idx + 1] - self.offsets[idx]
    }

    pub fn weighted_degree(&self, idx: usize) -> f64 {
        self.neighbor_weights(idx).iter().sum()
    }

    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.targets[self.offsets[idx]..self.offsets[idx + 1]]
    }

    pub fn neighbor_weights(&self, idx: usize) -> &[f64] {
        &self.weights[self.offsets[idx]..self.offsets[idx + 1]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csr_roundtrip() {
        let view = DiGraphView::from_edges(4, &[(0, 1), (1, 0), (1, 2), (3, 2), (0, 1)]);
        assert_eq!(view.node_count(), 4);
        assert_eq!(view.edge_count(), 4); // duplicate (0,1) collapsed
        assert_eq!(view.successors(1), &[0, 2]);
        assert_eq!(view.predecessors(2), &[1, 3]);
        assert!(view.has_edge(0, 1));
        assert!(!view.has_edge(2, 1));
        assert_eq!(view.out_degree_sequence(), vec![1, 2, 0, 1]);
        assert_eq!(view.in_degree_sequence(), vec![1, 1, 2, 0]);
    }

    #[test]
    fn undirected_merges_parallel_edges() {
        let view = UGraphView::from_weighted_edges(3, &[(0, 1, 2.0), (1, 0, 1.0), (1, 2, 1.0)]);
        assert_eq!(view.edge_count(), 2);
        assert_eq!(view.total_weight(), 4.0);
        assert_eq!(view.degree(1), 2);
        assert_eq!(view.weighted_degree(1), 4.0);
    }
}
