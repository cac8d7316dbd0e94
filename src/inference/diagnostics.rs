//! Fit diagnostics for both engines.
//!
//! Nothing here raises: a MAP run that hit its iteration cap or chains that
//! have not mixed are reported through `converged = false`.
use ndarray::{Array1, Array2, Axis, s};

use crate::optimization::loglik_optimizer::FnEvalMap;

/// Default split-R̂ threshold for declaring MCMC convergence.
pub const DEFAULT_R_HAT_THRESHOLD: f64 = 1.1;

#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostics {
    Map(MapDiagnostics),
    Mcmc(McmcDiagnostics),
    /// Parameters supplied directly, no inference run.
    Fixed,
}

impl Diagnostics {
    pub fn converged(&self) -> bool {
        match self {
            Diagnostics::Map(d) => d.converged,
            Diagnostics::Mcmc(d) => d.converged,
            Diagnostics::Fixed => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapDiagnostics {
    /// Log-posterior at the estimate.
    pub log_posterior: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Solver termination reason.
    pub status: String,
    pub grad_norm: Option<f64>,
    pub fn_evals: FnEvalMap,
    /// L-BFGS restarts after the solver exited early.
    pub restarts: usize,
    /// Laplace standard errors in `θ`-space, when requested and available.
    pub standard_errors: Option<Array1<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct McmcDiagnostics {
    pub draws_per_chain: Vec<usize>,
    pub acceptance_rate: Vec<f64>,
    pub non_finite_proposals: Vec<usize>,
    /// Chains not run because their start had a non-finite log-density. The
    /// per-chain vectors above cover the remaining chains in order.
    pub skipped_chains: Vec<usize>,
    /// Split-R̂ per `θ` coordinate.
    pub r_hat: Array1<f64>,
    pub r_hat_threshold: f64,
    pub converged: bool,
}

impl McmcDiagnostics {
    pub fn max_r_hat(&self) -> f64 {
        self.r_hat.iter().copied().fold(f64::NAN, f64::max)
    }
}

/// Split-R̂ (Gelman et al.) per column of the chains' `n × p` draw matrices.
///
/// Each chain is cut into two halves (the middle draw is dropped when `n` is
/// odd). Coordinates with zero within-sequence variance get `1` when the
/// sequences agree and `∞` otherwise. Fewer than two draws per half yields
/// `NaN`.
pub fn split_r_hat(chains: &[Array2<f64>]) -> Array1<f64> {
    let p = chains.first().map_or(0, |c| c.ncols());
    let half = chains.iter().map(|c| c.nrows() / 2).min().unwrap_or(0);
    if half < 2 {
        return Array1::from_elem(p, f64::NAN);
    }
    let sequences: Vec<Array2<f64>> = chains
        .iter()
        .flat_map(|c| {
            let n = c.nrows();
            [c.slice(s![..half, ..]).to_owned(), c.slice(s![n - half.., ..]).to_owned()]
        })
        .collect();
    let m = sequences.len() as f64;
    let n = half as f64;

    Array1::from_iter((0..p).map(|j| {
        let means: Vec<f64> = sequences.iter().map(|q| q.column(j).sum() / n).collect();
        let vars: Vec<f64> = sequences
            .iter()
            .zip(&means)
            .map(|(q, mu)| q.column(j).iter().map(|x| (x - mu).powi(2)).sum::<f64>() / (n - 1.0))
            .collect();
        let grand = means.iter().sum::<f64>() / m;
        let between = n / (m - 1.0) * means.iter().map(|mu| (mu - grand).powi(2)).sum::<f64>();
        let within = vars.iter().sum::<f64>() / m;
        if within <= 0.0 {
            return if between <= 0.0 { 1.0 } else { f64::INFINITY };
        }
        let var_plus = (n - 1.0) / n * within + between / n;
        (var_plus / within).sqrt()
    }))
}

/// Stack chains row-wise.
pub(crate) fn merge_chains(chains: &[Array2<f64>]) -> Array2<f64> {
    let views: Vec<_> = chains.iter().map(|c| c.view()).collect();
    ndarray::concatenate(Axis(0), &views).unwrap_or_else(|_| Array2::zeros((0, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, StandardNormal};

    fn normal_chain(rng: &mut StdRng, n: usize, shift: f64) -> Array2<f64> {
        Array2::from_shape_fn((n, 1), |_| {
            let z: f64 = StandardNormal.sample(rng);
            z + shift
        })
    }

    #[test]
    // Purpose
    // -------
    // Independent draws from one distribution give R̂ close to 1; chains
    // stuck in different places give a large R̂.
    //
    // Given
    // -----
    // - Four N(0, 1) chains of 500 draws; two chains shifted by ±3.
    //
    // Expect
    // ------
    // - R̂ < 1.05 in the first case, > 1.5 in the second.
    fn r_hat_separates_mixed_and_stuck_chains() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(11);
        let mixed: Vec<_> = (0..4).map(|_| normal_chain(&mut rng, 500, 0.0)).collect();
        let stuck = vec![normal_chain(&mut rng, 500, -3.0), normal_chain(&mut rng, 500, 3.0)];

        // Act
        let good = split_r_hat(&mixed);
        let bad = split_r_hat(&stuck);

        // Assert
        assert!(good[0] < 1.05, "r_hat = {}", good[0]);
        assert!(bad[0] > 1.5, "r_hat = {}", bad[0]);
    }

    #[test]
    // Purpose
    // -------
    // Degenerate inputs do not produce spurious convergence.
    //
    // Given
    // -----
    // - Constant identical chains; chains of 3 draws.
    //
    // Expect
    // ------
    // - R̂ = 1 for identical constants; NaN when halves are too short.
    fn degenerate_chains() {
        // Arrange
        let constant = vec![Array2::from_elem((10, 1), 2.0), Array2::from_elem((10, 1), 2.0)];
        let short = vec![Array2::zeros((3, 2))];

        // Act
        let flat = split_r_hat(&constant);
        let tiny = split_r_hat(&short);

        // Assert
        assert_eq!(flat[0], 1.0);
        assert!(tiny.iter().all(|v| v.is_nan()));
        assert_eq!(tiny.len(), 2);
    }
}
