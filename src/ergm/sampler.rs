//! Metropolis tie-toggle sampler.
//!
//! One step proposes flipping a uniformly random ordered dyad and accepts
//! with probability min(1, exp(theta . delta)), where delta is the change
//! in the sufficient statistics. The running statistics vector is updated
//! incrementally from the same change values, so a draw's statistics cost
//! nothing to read.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::state::NetState;
use super::terms::Model;

pub struct Sampler<'a> {
    model: &'a Model,
    theta: Vec<f64>,
    state: NetState,
    stats: Vec<f64>,
    delta: Vec<f64>,
    rng: ChaCha8Rng,
}

impl<'a> Sampler<'a> {
    pub fn new(model: &'a Model, theta: &[f64], state: NetState, seed: u64) -> Self {
        assert_eq!(theta.len(), model.dim(), "one coefficient per term");
        let stats = model.statistics(&state);
        Sampler {
            model,
            theta: theta.to_vec(),
            delta: vec![0.0; model.dim()],
            state,
            stats,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// One proposal; returns whether it was accepted
    pub fn step(&mut self) -> bool {
        let n = self.state.node_count();
        let i = self.rng.gen_range(0..n);
        let mut j = self.rng.gen_range(0..n - 1);
        if j >= i {
            j += 1;
        }

        let present = self.state.has(i, j);
        if present {
            // Evaluate the change on the graph without the edge; removal
            // is the negated addition
            self.state.toggle(i, j);
        }
        self.model.change_stats(&self.state, i, j, &mut self.delta);

        let mut log_ratio = 0.0;
        for (t, d) in self.theta.iter().zip(&self.delta) {
            log_ratio += t * d;
        }
        if present {
            log_ratio = -log_ratio;
        }

        let accept = log_ratio >= 0.0 || self.rng.gen::<f64>() < log_ratio.exp();
        match (present, accept) {
            (false, true) => {
                self.state.toggle(i, j);
                for (s, d) in self.stats.iter_mut().zip(&self.delta) {
                    *s += d;
                }
            }
            (false, false) => {}
            (true, true) => {
                // edge stays removed
                for (s, d) in self.stats.iter_mut().zip(&self.delta) {
                    *s -= d;
                }
            }
            (true, false) => {
                self.state.toggle(i, j);
            }
        }
        accept
    }

    pub fn run(&mut self, steps: usize) {
        for _ in 0..steps {
            self.step();
        }
    }

    pub fn statistics(&self) -> &[f64] {
        &self.stats
    }

    pub fn state(&self) -> &NetState {
        &self.state
    }
}
