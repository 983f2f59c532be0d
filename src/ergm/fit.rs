//! Estimation: pseudolikelihood start values, MCMLE refinement, Wald
//! inference.
//!
//! The fitting loop follows the standard stochastic-approximation recipe:
//! simulate a sample of networks at the current coefficients, compare the
//! simulated mean of the sufficient statistics to the observed vector,
//! take an approximate Newton step through the simulated covariance, and
//! stop when every t-ratio falls under the tolerance. A chain that
//! collapses to the empty or complete graph, or a statistic whose
//! simulated variance vanishes away from its observed value, is reported
//! as degeneracy rather than returned as a fit.

use ndarray::{Array1, Array2, Axis};
use statrs::function::erf::erfc;
use tracing::{debug, info, warn};

use super::sampler::Sampler;
use super::state::NetState;
use super::terms::Model;
use super::{ErgmError, ErgmResult};

/// 97.5% normal quantile for the Wald interval
const Z_975: f64 = 1.959_963_984_540_054;

const MPLE_MAX_ITER: usize = 50;
const MPLE_GRAD_TOL: f64 = 1e-8;
/// Newton steps are clamped to this max-norm per MCMLE iteration
const MAX_STEP: f64 = 0.5;

/// Simulation sizes and stopping rules for one fit
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub burn_in: usize,
    pub interval: usize,
    pub sample_size: usize,
    pub max_iterations: usize,
    /// Convergence threshold on the worst |t-ratio|
    pub tolerance: f64,
    pub seed: u64,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            burn_in: 50_000,
            interval: 1_000,
            sample_size: 500,
            max_iterations: 30,
            tolerance: 0.15,
            seed: 0,
        }
    }
}

/// One coefficient with its Wald inference
#[derive(Debug, Clone, serde::Serialize)]
pub struct CoefRow {
    pub term: String,
    pub estimate: f64,
    pub std_err: f64,
    pub z: f64,
    pub p_value: f64,
    /// exp(estimate), exactly
    pub odds_ratio: f64,
    /// 95% Wald interval computed on the log scale, exponentiated
    pub or_ci_low: f64,
    pub or_ci_high: f64,
}

/// A converged fit
#[derive(Debug, Clone, serde::Serialize)]
pub struct Fit {
    pub model: String,
    pub network: String,
    pub coefficients: Vec<CoefRow>,
    pub iterations: usize,
    pub sample_size: usize,
}

/// Wald rows from estimates and standard errors
pub fn inference_rows(labels: &[String], theta: &[f64], std_err: &[f64]) -> Vec<CoefRow> {
    labels
        .iter()
        .zip(theta.iter().zip(std_err))
        .map(|(label, (&estimate, &se))| {
            let z = estimate / se;
            CoefRow {
                term: label.clone(),
                estimate,
                std_err: se,
                z,
                p_value: erfc(z.abs() / std::f64::consts::SQRT_2),
                odds_ratio: estimate.exp(),
                or_ci_low: (estimate - Z_975 * se).exp(),
                or_ci_high: (estimate + Z_975 * se).exp(),
            }
        })
        .collect()
}

/// Maximum pseudolikelihood estimate: logistic regression of tie
/// presence on the change statistics, by Newton-Raphson.
pub fn mple(model: &Model, observed: &NetState) -> ErgmResult<Vec<f64>> {
    let n = observed.node_count();
    let p = model.dim();
    let rows = n * (n - 1);

    let mut x = Array2::<f64>::zeros((rows, p));
    let mut y = Array1::<f64>::zeros(rows);
    let mut change = vec![0.0; p];
    let mut working = observed.clone();
    let mut row = 0;
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let present = working.has(i, j);
            if present {
                working.toggle(i, j);
            }
            model.change_stats(&working, i, j, &mut change);
            if present {
                working.toggle(i, j);
            }
            for (col, &value) in change.iter().enumerate() {
                x[[row, col]] = value;
            }
            y[row] = if present { 1.0 } else { 0.0 };
            row += 1;
        }
    }

    let mut beta = Array1::<f64>::zeros(p);
    for _ in 0..MPLE_MAX_ITER {
        let eta = x.dot(&beta);
        let mu = eta.mapv(|e| 1.0 / (1.0 + (-e).exp()));
        let gradient = x.t().dot(&(&y - &mu));
        if gradient.iter().all(|g| g.abs() < MPLE_GRAD_TOL) {
            break;
        }
        let weights = mu.mapv(|m| m * (1.0 - m));
        // X^T W X without materializing the diagonal
        let xw = &x * &weights.clone().insert_axis(Axis(1));
        let hessian = xw.t().dot(&x);
        let step = solve(hessian, gradient).ok_or_else(|| ErgmError::Singular {
            model: model.label.clone(),
        })?;
        beta += &step;
        if beta.iter().any(|b| !b.is_finite() || b.abs() > 50.0) {
            return Err(ErgmError::MpleDiverged {
                model: model.label.clone(),
            });
        }
    }

    Ok(beta.to_vec())
}

/// Fit a model to an observed network by MCMLE, starting from the
/// pseudolikelihood estimate.
pub fn fit(
    model: &Model,
    network: &str,
    observed: &NetState,
    config: &FitConfig,
) -> ErgmResult<Fit> {
    let observed_stats = model.statistics(observed);
    let mut theta = mple(model, observed)?;
    debug!(model = %model.label, start = ?theta, "pseudolikelihood start values");

    let p = model.dim();
    let full = observed.dyad_count();

    for iteration in 1..=config.max_iterations {
        let mut sampler = Sampler::new(
            model,
            &theta,
            observed.clone(),
            config.seed.wrapping_add(iteration as u64),
        );
        sampler.run(config.burn_in);

        let mut sample = Array2::<f64>::zeros((config.sample_size, p));
        let mut boundary = 0usize;
        for s in 0..config.sample_size {
            sampler.run(config.interval);
            let edge_count = sampler.state().edge_count();
            if edge_count == 0 || edge_count == full {
                boundary += 1;
            }
            for (col, &value) in sampler.statistics().iter().enumerate() {
                sample[[s, col]] = value;
            }
        }

        if boundary * 2 > config.sample_size {
            return Err(ErgmError::Degenerate {
                model: model.label.clone(),
                reason: format!(
                    "{boundary} of {} draws hit the empty or complete graph",
                    config.sample_size
                ),
            });
        }

        let mean = sample.sum_axis(Axis(0)) / config.sample_size as f64;
        let centered = &sample - &mean.clone().insert_axis(Axis(0));
        let covariance = centered.t().dot(&centered) / (config.sample_size as f64 - 1.0);

        let mut worst_t = 0.0f64;
        for k in 0..p {
            let sd = covariance[[k, k]].sqrt();
            let diff = observed_stats[k] - mean[k];
            if sd < 1e-9 {
                if diff.abs() > 1e-9 {
                    return Err(ErgmError::Degenerate {
                        model: model.label.clone(),
                        reason: format!(
                            "statistic {} is stuck away from its observed value",
                            model.term_labels()[k]
                        ),
                    });
                }
                continue;
            }
            worst_t = worst_t.max(diff.abs() / sd);
        }
        debug!(model = %model.label, iteration, worst_t, "MCMLE iteration");

        if worst_t < config.tolerance {
            let information = invert(&covariance).ok_or_else(|| ErgmError::Singular {
                model: model.label.clone(),
            })?;
            let std_err: Vec<f64> = (0..p).map(|k| information[[k, k]].sqrt()).collect();
            info!(model = %model.label, iteration, "MCMLE converged");
            return Ok(Fit {
                model: model.label.clone(),
                network: network.to_string(),
                coefficients: inference_rows(&model.term_labels(), &theta, &std_err),
                iterations: iteration,
                sample_size: config.sample_size,
            });
        }

        let diff = Array1::from_iter((0..p).map(|k| observed_stats[k] - mean[k]));
        let mut step = solve(covariance, diff).ok_or_else(|| ErgmError::Singular {
            model: model.label.clone(),
        })?;
        let max_component = step.iter().fold(0.0f64, |acc, s| acc.max(s.abs()));
        if max_component > MAX_STEP {
            step *= MAX_STEP / max_component;
        }
        for (t, s) in theta.iter_mut().zip(step.iter()) {
            *t += s;
        }
    }

    warn!(model = %model.label, "MCMLE failed to converge");
    Err(ErgmError::NotConverged {
        model: model.label.clone(),
        iterations: config.max_iterations,
    })
}

/// Solve a . x = b by Gaussian elimination with partial pivoting.
/// None for a numerically singular system.
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let p = a.nrows();
    for col in 0..p {
        let mut pivot = col;
        for r in (col + 1)..p {
            if a[[r, col]].abs() > a[[pivot, col]].abs() {
                pivot = r;
            }
        }
        if a[[pivot, col]].abs() < 1e-12 {
            return None;
        }
        if pivot != col {
            for c in 0..p {
                a.swap([col, c], [pivot, c]);
            }
            b.swap(col, pivot);
        }
        for r in (col + 1)..p {
            let factor = a[[r, col]] / a[[col, col]];
            for c in col..p {
                a[[r, c]] -= factor * a[[col, c]];
            }
            b[r] -= factor * b[col];
        }
    }

    let mut x = Array1::<f64>::zeros(p);
    for row in (0..p).rev() {
        let mut accum = b[row];
        for c in (row + 1)..p {
            accum -= a[[row, c]] * x[c];
        }
        x[row] = accum / a[[row, row]];
    }
    Some(x)
}

/// Matrix inverse via column-wise solves
fn invert(a: &Array2<f64>) -> Option<Array2<f64>> {
    let p = a.nrows();
    let mut inverse = Array2::<f64>::zeros((p, p));
    for col in 0..p {
        let mut unit = Array1::<f64>::zeros(p);
        unit[col] = 1.0;
        let column = solve(a.clone(), unit)?;
        for row in 0..p {
            inverse[[row, col]] = column[row];
        }
    }
    Some(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ergm::terms::Term;
    use lexnet_graph_algorithms::DiGraphView;

    #[test]
    fn solve_recovers_known_system() {
        let a = Array2::from_shape_vec((2, 2), vec![2.0, 1.0, 1.0, 3.0]).unwrap();
        let b = Array1::from_vec(vec![5.0, 10.0]);
        let x = solve(a, b).unwrap();
        assert!((x[0] - 1.0).abs() < 1e-10);
        assert!((x[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn singular_system_is_rejected() {
        let a = Array2::from_shape_vec((2, 2), vec![1.0, 2.0, 2.0, 4.0]).unwrap();
        let b = Array1::from_vec(vec![1.0, 2.0]);
        assert!(solve(a, b).is_none());
    }

    #[test]
    fn invert_matches_hand_computation() {
        let a = Array2::from_shape_vec((2, 2), vec![4.0, 7.0, 2.0, 6.0]).unwrap();
        let inv = invert(&a).unwrap();
        // det = 10; inverse = [[0.6, -0.7], [-0.2, 0.4]]
        assert!((inv[[0, 0]] - 0.6).abs() < 1e-10);
        assert!((inv[[0, 1]] + 0.7).abs() < 1e-10);
        assert!((inv[[1, 0]] + 0.2).abs() < 1e-10);
        assert!((inv[[1, 1]] - 0.4).abs() < 1e-10);
    }

    #[test]
    fn edges_only_mple_is_the_logit_of_density() {
        // With only the edges term the pseudolikelihood is an
        // intercept-only logistic regression: estimate = logit(density)
        let view = DiGraphView::from_edges(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
        let observed = NetState::from_view(&view);
        let model = Model::new("edges", vec![Term::Edges]);
        let theta = mple(&model, &observed).unwrap();
        let density: f64 = 6.0 / 30.0;
        let expected = (density / (1.0 - density)).ln();
        assert!((theta[0] - expected).abs() < 1e-6, "got {}", theta[0]);
    }

    #[test]
    fn odds_ratio_is_exactly_exp_of_estimate() {
        let rows = inference_rows(
            &["edges".to_string(), "mutual".to_string()],
            &[-1.3862943611198906, 0.75],
            &[0.2, 0.31],
        );
        for row in &rows {
            assert_eq!(row.odds_ratio, row.estimate.exp());
            assert!(row.or_ci_low < row.odds_ratio && row.odds_ratio < row.or_ci_high);
            assert!(row.p_value > 0.0 && row.p_value < 1.0);
        }
        assert!((rows[0].odds_ratio - 0.25).abs() < 1e-12);
    }

    #[test]
    fn mcmle_recovers_density_on_a_small_graph() {
        // Edges-only model: MCMLE must reproduce the observed edge count
        // in expectation, so the estimate stays near logit(density)
        let view = DiGraphView::from_edges(
            7,
            &[
                (0, 1),
                (1, 2),
                (2, 3),
                (3, 4),
                (4, 5),
                (5, 6),
                (6, 0),
                (0, 3),
                (2, 5),
                (1, 4),
            ],
        );
        let observed = NetState::from_view(&view);
        let model = Model::new("edges", vec![Term::Edges]);
        let config = FitConfig {
            burn_in: 2_000,
            interval: 50,
            sample_size: 400,
            max_iterations: 20,
            tolerance: 0.2,
            seed: 31,
        };
        let fit = fit(&model, "toy", &observed, &config).unwrap();
        let density: f64 = 10.0 / 42.0;
        let expected = (density / (1.0 - density)).ln();
        let row = &fit.coefficients[0];
        assert!(
            (row.estimate - expected).abs() < 0.6,
            "estimate {} expected {}",
            row.estimate,
            expected
        );
        assert!(row.std_err > 0.0);
        assert_eq!(row.odds_ratio, row.estimate.exp());
    }
}
