//! Mutable network state for the tie-toggle sampler.
//!
//! A dense adjacency matrix sized for tens of nodes: O(1) membership and
//! toggle, O(n) neighbor scans, which is what the change-statistic loops
//! want.

use lexnet_graph_algorithms::DiGraphView;

#[derive(Debug, Clone)]
pub struct NetState {
    n: usize,
    adj: Vec<bool>,
    out_deg: Vec<usize>,
    in_deg: Vec<usize>,
    edge_count: usize,
}

impl NetState {
    pub fn empty(n: usize) -> Self {
        NetState {
            n,
            adj: vec![false; n * n],
            out_deg: vec![0; n],
            in_deg: vec![0; n],
            edge_count: 0,
        }
    }

    pub fn from_view(view: &DiGraphView) -> Self {
        let mut state = NetState::empty(view.node_count());
        for (u, v) in view.edges() {
            state.toggle(u, v);
        }
        state
    }

    pub fn to_view(&self) -> DiGraphView {
        DiGraphView::from_edges(self.n, &self.edges())
    }

    pub fn node_count(&self) -> usize {
        self.n
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Ordered dyad count: the number of possible directed edges
    pub fn dyad_count(&self) -> usize {
        self.n * (self.n - 1)
    }

    pub fn has(&self, u: usize, v: usize) -> bool {
        self.adj[u * self.n + v]
    }

    pub fn out_degree(&self, u: usize) -> usize {
        self.out_deg[u]
    }

    pub fn in_degree(&self, v: usize) -> usize {
        self.in_deg[v]
    }

    /// Flip the edge (u, v), keeping degree counts in sync
    pub fn toggle(&mut self, u: usize, v: usize) {
        debug_assert!(u != v, "self-loop toggle");
        let slot = u * self.n + v;
        if self.adj[slot] {
            self.adj[slot] = false;
            self.out_deg[u] -= 1;
            self.in_deg[v] -= 1;
            self.edge_count -= 1;
        } else {
            self.adj[slot] = true;
            self.out_deg[u] += 1;
            self.in_deg[v] += 1;
            self.edge_count += 1;
        }
    }

    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::with_capacity(self.edge_count);
        for u in 0..self.n {
            for v in 0..self.n {
                if u != v && self.has(u, v) {
                    out.push((u, v));
                }
            }
        }
        out
    }

    /// Outgoing two-path shared partners of the ordered pair (u, v):
    /// nodes k with u->k and k->v
    pub fn shared_partners(&self, u: usize, v: usize) -> usize {
        (0..self.n)
            .filter(|&k| k != u && k != v && self.has(u, k) && self.has(k, v))
            .count()
    }
}
