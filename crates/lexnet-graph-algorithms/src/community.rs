//! Community detection.
//!
//! Three candidate methods, all deterministic given a seed:
//! - `label_propagation`: flow-style propagation on the directed graph
//! - `louvain`: greedy multilevel modularity optimization on the
//!   undirected weighted graph
//! - `refine_connected`: splits internally disconnected communities of an
//!   existing partition, so every final community is connected — the
//!   guarantee the greedy method lacks

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::common::{DiGraphView, UGraphView};

const MAX_PASSES: usize = 100;

/// A node-to-community assignment. Labels are canonicalized to
/// 0..community_count in order of first appearance, so every node carries
/// exactly one label.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Partition {
    labels: Vec<usize>,
    community_count: usize,
}

impl Partition {
    pub fn from_labels(raw: Vec<usize>) -> Self {
        let mut remap: BTreeMap<usize, usize> = BTreeMap::new();
        let mut labels = Vec::with_capacity(raw.len());
        let mut next = 0;
        for label in raw {
            let canonical = *remap.entry(label).or_insert_with(|| {
                let id = next;
                next += 1;
                id
            });
            labels.push(canonical);
        }
        Partition {
            labels,
            community_count: next,
        }
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    pub fn community_count(&self) -> usize {
        self.community_count
    }

    pub fn label(&self, node: usize) -> usize {
        self.labels[node]
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    pub fn is_single_community(&self) -> bool {
        self.community_count <= 1
    }

    /// Community sizes indexed by label
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.community_count];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }

    /// Member lists indexed by label
    pub fn communities(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.community_count];
        for (node, &label) in self.labels.iter().enumerate() {
            members[label].push(node);
        }
        members
    }
}

/// Weighted modularity of a partition on an undirected graph.
///
/// Q = sum_c [ w_c / m - (s_c / 2m)^2 ] with w_c the intra-community
/// weight, s_c the total weighted degree of the community, m the total
/// edge weight. 0 for an empty graph.
pub fn modularity(view: &UGraphView, partition: &Partition) -> f64 {
    let m = view.total_weight();
    if m == 0.0 {
        return 0.0;
    }

    let k = partition.community_count();
    let mut intra = vec![0.0f64; k];
    let mut degree = vec![0.0f64; k];
    for u in 0..view.node_count() {
        let cu = partition.label(u);
        degree[cu] += view.weighted_degree(u);
        for (&v, &w) in view.neighbors(u).iter().zip(view.neighbor_weights(u)) {
            if u < v && partition.label(v) == cu {
                intra[cu] += w;
            }
        }
    }

    let two_m = 2.0 * m;
    (0..k)
        .map(|c| intra[c] / m - (degree[c] / two_m).powi(2))
        .sum()
}

/// Directed, weighted label propagation.
///
/// Every node starts in its own community and repeatedly adopts the label
/// carrying the most edge weight among its in- and out-neighbors, until a
/// full sweep changes nothing. Sweep order is shuffled from `seed`; ties
/// break toward the smaller label so runs reproduce exactly.
pub fn label_propagation(view: &DiGraphView, seed: u64) -> Partition {
    let n = view.node_count();
    let mut labels: Vec<usize> = (0..n).collect();
    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    for _ in 0..MAX_PASSES {
        order.shuffle(&mut rng);
        let mut changed = false;
        for &node in &order {
            let mut tally: BTreeMap<usize, f64> = BTreeMap::new();
            for &v in view.successors(node) {
                let w = view.edge_weight(node, v).unwrap_or(1.0);
                *tally.entry(labels[v]).or_insert(0.0) += w;
            }
            for &u in view.predecessors(node) {
                let w = view.edge_weight(u, node).unwrap_or(1.0);
                *tally.entry(labels[u]).or_insert(0.0) += w;
            }
            if tally.is_empty() {
                continue;
            }
            // BTreeMap iteration is ascending, so > keeps the smallest
            // label among ties
            let mut best_label = labels[node];
            let mut best_weight = f64::NEG_INFINITY;
            for (&label, &weight) in &tally {
                if weight > best_weight {
                    best_weight = weight;
                    best_label = label;
                }
            }
            if best_label != labels[node] {
                labels[node] = best_label;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    Partition::from_labels(labels)
}

/// Greedy multilevel modularity optimization (Louvain).
///
/// Local moving until no node improves modularity, then the communities
/// collapse into super-nodes and the process repeats on the smaller
/// graph. Deterministic: fixed sweep order, ordered adjacency maps.
pub fn louvain(view: &UGraphView) -> Partition {
    let n = view.node_count();
    let two_m = 2.0 * view.total_weight();
    if two_m == 0.0 {
        return Partition::from_labels((0..n).collect());
    }

    // Level graph: ordered adjacency + collapsed intra weight per node
    let mut adjacency: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); n];
    for u in 0..n {
        for (&v, &w) in view.neighbors(u).iter().zip(view.neighbor_weights(u)) {
            adjacency[u].insert(v, w);
        }
    }
    let mut self_weight = vec![0.0f64; n];

    // membership[original node] = node index at the current level
    let mut membership: Vec<usize> = (0..n).collect();

    loop {
        let level_n = adjacency.len();
        let labels = local_move(&adjacency, &self_weight, two_m);
        for slot in membership.iter_mut() {
            *slot = labels[*slot];
        }

        let community_count = labels.iter().copied().max().map_or(0, |c| c + 1);
        if community_count == level_n {
            break;
        }

        // Aggregate communities into super-nodes
        let mut next_adjacency: Vec<BTreeMap<usize, f64>> = vec![BTreeMap::new(); community_count];
        let mut next_self = vec![0.0f64; community_count];
        for (u, row) in adjacency.iter().enumerate() {
            next_self[labels[u]] += self_weight[u];
            for (&v, &w) in row {
                if u < v {
                    let (cu, cv) = (labels[u], labels[v]);
                    if cu == cv {
                        next_self[cu] += w;
                    } else {
                        *next_adjacency[cu].entry(cv).or_insert(0.0) += w;
                        *next_adjacency[cv].entry(cu).or_insert(0.0) += w;
                    }
                }
            }
        }
        adjacency = next_adjacency;
        self_weight = next_self;
    }

    Partition::from_labels(membership)
}

/// One round of local moving; returns canonicalized community labels for
/// the level's nodes.
fn local_move(
    adjacency: &[BTreeMap<usize, f64>],
    self_weight: &[f64],
    two_m: f64,
) -> Vec<usize> {
    let n = adjacency.len();
    // Weighted degree; a collapsed self-loop of weight w contributes 2w
    let degree: Vec<f64> = (0..n)
        .map(|i| adjacency[i].values().sum::<f64>() + 2.0 * self_weight[i])
        .collect();

    let mut community: Vec<usize> = (0..n).collect();
    let mut community_degree = degree.clone();

    for _ in 0..MAX_PASSES {
        let mut moved = false;
        for node in 0..n {
            let home = community[node];
            community_degree[home] -= degree[node];

            // Edge weight from node into each neighboring community
            let mut weight_to: BTreeMap<usize, f64> = BTreeMap::new();
            weight_to.insert(home, 0.0);
            for (&v, &w) in &adjacency[node] {
                *weight_to.entry(community[v]).or_insert(0.0) += w;
            }

            let mut best_comm = home;
            let mut best_gain = f64::NEG_INFINITY;
            for (&cand, &w_in) in &weight_to {
                let gain = w_in - community_degree[cand] * degree[node] / two_m;
                if gain > best_gain {
                    best_gain = gain;
                    best_comm = cand;
                }
            }

            community_degree[best_comm] += degree[node];
            if best_comm != home {
                community[node] = best_comm;
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }

    Partition::from_labels(community).labels().to_vec()
}

/// Union-Find with path compression and union by rank.
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        UnionFind {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        if self.parent[i] != i {
            self.parent[i] = self.find(self.parent[i]);
        }
        self.parent[i]
    }

    fn union(&mut self, i: usize, j: usize) {
        let root_i = self.find(i);
        let root_j = self.find(j);
        if root_i != root_j {
            if self.rank[root_i] < self.rank[root_j] {
                self.parent[root_i] = root_j;
            } else if self.rank[root_i] > self.rank[root_j] {
                self.parent[root_j] = root_i;
            } else {
                self.parent[root_j] = root_i;
                self.rank[root_i] += 1;
            }
        }
    }
}

/// Split every community of `partition` into its connected components on
/// `view`, so each resulting community is internally connected. Leaves
/// already-connected communities untouched.
pub fn refine_connected(view: &UGraphView, partition: &Partition) -> Partition {
    let n = view.node_count();
    let mut uf = UnionFind::new(n);
    for u in 0..n {
        for &v in view.neighbors(u) {
            if u < v && partition.label(u) == partition.label(v) {
                uf.union(u, v);
            }
        }
    }

    // (old label, component root) pairs become the refined labels
    let mut remap: BTreeMap<(usize, usize), usize> = BTreeMap::new();
    let mut labels = Vec::with_capacity(n);
    for node in 0..n {
        let key = (partition.label(node), uf.find(node));
        let next = remap.len();
        let label = *remap.entry(key).or_insert(next);
        labels.push(label);
    }
    Partition::from_labels(labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{DiGraphView, UGraphView};

    fn two_cliques() -> UGraphView {
        // Two triangles bridged by a single weak edge
        UGraphView::from_weighted_edges(
            6,
            &[
                (0, 1, 1.0),
                (1, 2, 1.0),
                (2, 0, 1.0),
                (3, 4, 1.0),
                (4, 5, 1.0),
                (5, 3, 1.0),
                (2, 3, 1.0),
            ],
        )
    }

    #[test]
    fn partition_canonicalizes_labels() {
        let p = Partition::from_labels(vec![7, 7, 3, 7, 3]);
        assert_eq!(p.labels(), &[0, 0, 1, 0, 1]);
        assert_eq!(p.community_count(), 2);
        assert_eq!(p.sizes(), vec![3, 2]);
    }

    #[test]
    fn every_node_has_exactly_one_label() {
        let p = louvain(&two_cliques());
        assert_eq!(p.node_count(), 6);
        let total: usize = p.sizes().iter().sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn louvain_separates_two_cliques() {
        let p = louvain(&two_cliques());
        assert_eq!(p.community_count(), 2);
        assert_eq!(p.label(0), p.label(1));
        assert_eq!(p.label(1), p.label(2));
        assert_eq!(p.label(3), p.label(4));
        assert_ne!(p.label(0), p.label(3));
    }

    #[test]
    fn modularity_prefers_the_clique_split() {
        let view = two_cliques();
        let split = Partition::from_labels(vec![0, 0, 0, 1, 1, 1]);
        let lumped = Partition::from_labels(vec![0; 6]);
        assert!(modularity(&view, &split) > modularity(&view, &lumped));
        // single community: Q = w/m - 1 = 0 only if... lumped Q is
        // 1 - 1 = 0 since all weight is internal
        assert!((modularity(&view, &lumped) - 0.0).abs() < 1e-12);
    }

    #[test]
    fn label_propagation_is_reproducible() {
        let view = DiGraphView::from_edges(
            6,
            &[(0, 1), (1, 0), (1, 2), (2, 0), (3, 4), (4, 5), (5, 3)],
        );
        let a = label_propagation(&view, 99);
        let b = label_propagation(&view, 99);
        assert_eq!(a, b);
        assert_eq!(a.node_count(), 6);
    }

    #[test]
    fn refinement_splits_disconnected_community() {
        // Nodes 0-1 and 4-5 forced into one community with no path
        // between them inside the community
        let view = UGraphView::from_weighted_edges(
            6,
            &[(0, 1, 1.0), (2, 3, 1.0), (4, 5, 1.0), (1, 2, 1.0), (3, 4, 1.0)],
        );
        let forced = Partition::from_labels(vec![0, 0, 1, 1, 0, 0]);
        let refined = refine_connected(&view, &forced);
        assert_eq!(refined.community_count(), 3);
        assert_eq!(refined.label(0), refined.label(1));
        assert_eq!(refined.label(4), refined.label(5));
        assert_ne!(refined.label(0), refined.label(4));
    }

    #[test]
    fn refinement_keeps_connected_partitions() {
        let view = two_cliques();
        let p = louvain(&view);
        let refined = refine_connected(&view, &p);
        assert_eq!(refined.community_count(), p.community_count());
    }
}
