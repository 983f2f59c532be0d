//! Descriptive statistics for directed graphs.
//!
//! All four measures are exact and deterministic. Conventions:
//! - mean geodesic length averages over ordered pairs with a finite
//!   directed path only; unreachable pairs are excluded
//! - transitivity ignores edge direction

use std::collections::VecDeque;

use super::common::DiGraphView;

/// The four descriptive measures reported for every network.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GraphMetrics {
    pub density: f64,
    /// Mean directed geodesic over reachable ordered pairs; NaN when no
    /// ordered pair is reachable
    pub mean_path_length: f64,
    pub reciprocity: f64,
    pub transitivity: f64,
}

/// Compute all four descriptive measures in one pass.
pub fn compute_metrics(view: &DiGraphView) -> GraphMetrics {
    GraphMetrics {
        density: density(view),
        mean_path_length: mean_path_length(view),
        reciprocity: reciprocity(view),
        transitivity: transitivity(view),
    }
}

/// |E| / (|V|·(|V|-1)); 0 for graphs with fewer than two nodes
pub fn density(view: &DiGraphView) -> f64 {
    let n = view.node_count();
    if n < 2 {
        return 0.0;
    }
    view.edge_count() as f64 / (n as f64 * (n as f64 - 1.0))
}

/// Mean directed shortest-path length over ordered pairs with a finite
/// path. Returns NaN when the graph has no reachable ordered pair.
pub fn mean_path_length(view: &DiGraphView) -> f64 {
    let n = view.node_count();
    let mut total = 0u64;
    let mut pairs = 0u64;
    let mut dist = vec![usize::MAX; n];
    let mut queue = VecDeque::new();

    for source in 0..n {
        dist.iter_mut().for_each(|d| *d = usize::MAX);
        dist[source] = 0;
        queue.clear();
        queue.push_back(source);
        while let Some(u) = queue.pop_front() {
            for &v in view.successors(u) {
                if dist[v] == usize::MAX {
                    dist[v] = dist[u] + 1;
                    queue.push_back(v);
                }
            }
        }
        for (target, &d) in dist.iter().enumerate() {
            if target != source && d != usize::MAX {
                total += d as u64;
                pairs += 1;
            }
        }
    }

    if pairs == 0 {
        f64::NAN
    } else {
        total as f64 / pairs as f64
    }
}

/// Fraction of edges (u, v) whose reverse (v, u) also exists.
/// 0 for an empty graph.
pub fn reciprocity(view: &DiGraphView) -> f64 {
    let m = view.edge_count();
    if m == 0 {
        return 0.0;
    }
    let mut reciprocated = 0usize;
    for u in 0..view.node_count() {
        for &v in view.successors(u) {
            if view.has_edge(v, u) {
                reciprocated += 1;
            }
        }
    }
    reciprocated as f64 / m as f64
}

/// Global transitivity: closed triads over all triads, on the
/// direction-collapsed graph. 0 when no node has two neighbors.
pub fn transitivity(view: &DiGraphView) -> f64 {
    let n = view.node_count();

    // Direction-collapsed neighbor sets, sorted for binary search
    let mut neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for u in 0..n {
        for &v in view.successors(u) {
            neighbors[u].push(v);
            neighbors[v].push(u);
        }
    }
    for row in neighbors.iter_mut() {
        row.sort_unstable();
        row.dedup();
    }

    let mut triangles = 0u64;
    let mut triads = 0u64;
    for v in 0..n {
        let nb = &neighbors[v];
        let deg = nb.len() as u64;
        if deg < 2 {
            continue;
        }
        triads += deg * (deg - 1) / 2;
        for i in 0..nb.len() {
            for j in (i + 1)..nb.len() {
                if neighbors[nb[i]].binary_search(&nb[j]).is_ok() {
                    triangles += 1;
                }
            }
        }
    }

    if triads == 0 {
        0.0
    } else {
        triangles as f64 / triads as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DiGraphView;

    #[test]
    fn density_matches_definition() {
        // 4 nodes, 5 edges: 5 / 12
        let view = DiGraphView::from_edges(4, &[(0, 1), (1, 0), (1, 2), (2, 3), (3, 0)]);
        assert!((density(&view) - 5.0 / 12.0).abs() < 1e-12);
    }

    #[test]
    fn reciprocity_of_mutual_dyad_is_one() {
        let view = DiGraphView::from_edges(2, &[(0, 1), (1, 0)]);
        assert_eq!(reciprocity(&view), 1.0);
    }

    #[test]
    fn reciprocity_mixed() {
        // (0,1) reciprocated, (1,2) not: 2 of 3 edges have a reverse
        let view = DiGraphView::from_edges(3, &[(0, 1), (1, 0), (1, 2)]);
        assert!((reciprocity(&view) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn mean_path_skips_unreachable_pairs() {
        // 0 -> 1 -> 2, node 3 isolated.
        // Finite pairs: (0,1)=1, (0,2)=2, (1,2)=1 -> mean 4/3
        let view = DiGraphView::from_edges(4, &[(0, 1), (1, 2)]);
        assert!((mean_path_length(&view) - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn mean_path_nan_without_edges() {
        let view = DiGraphView::from_edges(3, &[]);
        assert!(mean_path_length(&view).is_nan());
    }

    #[test]
    fn transitivity_of_triangle_is_one() {
        let view = DiGraphView::from_edges(3, &[(0, 1), (1, 2), (2, 0)]);
        assert_eq!(transitivity(&view), 1.0);
    }

    #[test]
    fn transitivity_of_path_is_zero() {
        let view = DiGraphView::from_edges(3, &[(0, 1), (1, 2)]);
        assert_eq!(transitivity(&view), 0.0);
    }

    #[test]
    fn metrics_stay_in_unit_interval() {
        let view = DiGraphView::from_edges(5, &[(0, 1), (1, 2), (2, 0), (3, 4), (4, 3), (0, 3)]);
        let m = compute_metrics(&view);
        assert!(m.density >= 0.0 && m.density <= 1.0);
        assert!(m.reciprocity >= 0.0 && m.reciprocity <= 1.0);
        assert!(m.transitivity >= 0.0 && m.transitivity <= 1.0);
    }
}
