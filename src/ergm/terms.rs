//! Model terms: sufficient statistics and their change values.
//!
//! Each term knows its full statistic on a network state and the change
//! in that statistic when a currently-absent edge (i, j) is added. The
//! sampler and the pseudolikelihood both work exclusively through change
//! values, so the two must agree; `statistics` is the ground truth the
//! tests check incremental updates against.
//!
//! Shared partners are counted as outgoing two-paths: k is a shared
//! partner of the edge (i, j) when i->k and k->j.

use super::state::NetState;

#[derive(Debug, Clone)]
pub enum Term {
    /// Edge count: the density baseline
    Edges,
    /// Numeric main effect: sum of sender plus receiver value over edges
    NodeCov { label: String, values: Vec<f64> },
    /// Receiver main effect of one factor level
    NodeInFactor { label: String, indicator: Vec<bool> },
    /// Sender main effect of one factor level
    NodeOutFactor { label: String, indicator: Vec<bool> },
    /// Homophily: count of edges whose endpoints share a category
    NodeMatch { label: String, codes: Vec<usize> },
    /// Reciprocity: count of mutual dyads
    Mutual,
    /// Geometrically-weighted edgewise shared partners, fixed decay
    Gwesp { decay: f64 },
}

impl Term {
    pub fn label(&self) -> String {
        match self {
            Term::Edges => "edges".to_string(),
            Term::NodeCov { label, .. } => format!("nodecov.{label}"),
            Term::NodeInFactor { label, .. } => format!("nodeifactor.{label}"),
            Term::NodeOutFactor { label, .. } => format!("nodeofactor.{label}"),
            Term::NodeMatch { label, .. } => format!("nodematch.{label}"),
            Term::Mutual => "mutual".to_string(),
            Term::Gwesp { decay } => format!("gwesp({decay})"),
        }
    }

    /// Full statistic on `state`
    pub fn statistic(&self, state: &NetState) -> f64 {
        match self {
            Term::Edges => state.edge_count() as f64,
            Term::NodeCov { values, .. } => fold_edges(state, |i, j| values[i] + values[j]),
            Term::NodeInFactor { indicator, .. } => {
                fold_edges(state, |_, j| if indicator[j] { 1.0 } else { 0.0 })
            }
            Term::NodeOutFactor { indicator, .. } => {
                fold_edges(state, |i, _| if indicator[i] { 1.0 } else { 0.0 })
            }
            Term::NodeMatch { codes, .. } => {
                fold_edges(state, |i, j| if codes[i] == codes[j] { 1.0 } else { 0.0 })
            }
            Term::Mutual => {
                let n = state.node_count();
                let mut mutual = 0usize;
                for i in 0..n {
                    for j in (i + 1)..n {
                        if state.has(i, j) && state.has(j, i) {
                            mutual += 1;
                        }
                    }
                }
                mutual as f64
            }
            Term::Gwesp { decay } => {
                fold_edges(state, |i, j| gwesp_weight(*decay, state.shared_partners(i, j)))
            }
        }
    }

    /// Change in the statistic when the absent edge (i, j) is added.
    /// The caller guarantees (i, j) is not present in `state`.
    pub fn change(&self, state: &NetState, i: usize, j: usize) -> f64 {
        debug_assert!(!state.has(i, j), "change statistic on a present edge");
        match self {
            Term::Edges => 1.0,
            Term::NodeCov { values, .. } => values[i] + values[j],
            Term::NodeInFactor { indicator, .. } => {
                if indicator[j] {
                    1.0
                } else {
                    0.0
                }
            }
            Term::NodeOutFactor { indicator, .. } => {
                if indicator[i] {
                    1.0
                } else {
                    0.0
                }
            }
            Term::NodeMatch { codes, .. } => {
                if codes[i] == codes[j] {
                    1.0
                } else {
                    0.0
                }
            }
            Term::Mutual => {
                if state.has(j, i) {
                    1.0
                } else {
                    0.0
                }
            }
            Term::Gwesp { decay } => {
                let decay = *decay;
                // The new edge arrives with its own shared partners
                let mut delta = gwesp_weight(decay, state.shared_partners(i, j));
                for k in 0..state.node_count() {
                    if k == i || k == j {
                        continue;
                    }
                    // (i, j) completes a two-path i->j->k for the edge (i, k)
                    if state.has(i, k) && state.has(j, k) {
                        let esp = state.shared_partners(i, k);
                        delta += gwesp_weight(decay, esp + 1) - gwesp_weight(decay, esp);
                    }
                    // (i, j) completes a two-path k->i->j for the edge (k, j)
                    if state.has(k, j) && state.has(k, i) {
                        let esp = state.shared_partners(k, j);
                        delta += gwesp_weight(decay, esp + 1) - gwesp_weight(decay, esp);
                    }
                }
                delta
            }
        }
    }
}

fn fold_edges<F: Fn(usize, usize) -> f64>(state: &NetState, f: F) -> f64 {
    let n = state.node_count();
    let mut total = 0.0;
    for i in 0..n {
        for j in 0..n {
            if i != j && state.has(i, j) {
                total += f(i, j);
            }
        }
    }
    total
}

/// Weight of one edge with k shared partners under geometric weighting:
/// e^d (1 - (1 - e^{-d})^k)
fn gwesp_weight(decay: f64, k: usize) -> f64 {
    let base = 1.0 - (-decay).exp();
    decay.exp() * (1.0 - base.powi(k as i32))
}

/// A named set of terms fit to one network
#[derive(Debug, Clone)]
pub struct Model {
    pub label: String,
    terms: Vec<Term>,
}

impl Model {
    pub fn new(label: impl Into<String>, terms: Vec<Term>) -> Self {
        Model {
            label: label.into(),
            terms,
        }
    }

    pub fn dim(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn term_labels(&self) -> Vec<String> {
        self.terms.iter().map(|t| t.label()).collect()
    }

    pub fn statistics(&self, state: &NetState) -> Vec<f64> {
        self.terms.iter().map(|t| t.statistic(state)).collect()
    }

    /// Change statistics for adding the absent edge (i, j), written into
    /// `out` (length `dim`)
    pub fn change_stats(&self, state: &NetState, i: usize, j: usize, out: &mut [f64]) {
        for (slot, term) in out.iter_mut().zip(&self.terms) {
            *slot = term.change(state, i, j);
        }
    }
}
