//! inference::laplace — Laplace standard errors at a MAP estimate.
//!
//! Purpose
//! -------
//! Approximate posterior uncertainty around `θ̂` by the curvature of the
//! log-posterior: `Cov(θ) ≈ (−∇²ℓ(θ̂))⁺`. Everything is in unconstrained
//! `θ`-space.
//!
//! Key behaviors
//! -------------
//! - The Hessian comes from [`scalar_hessian`] (central differences of the
//!   log-posterior, then a symmetrized Hessian of that gradient map).
//! - It is copied into a `nalgebra::DMatrix` ([`fill_dmatrix`]) and inverted
//!   through a symmetric eigendecomposition, dropping eigenvalues at or below
//!   [`EIGEN_EPS`].
//!
//! Conventions
//! -----------
//! - No explicit inverse is formed. Flat directions contribute nothing to the
//!   variance instead of producing infinities.
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};

use crate::inference::errors::{InferenceError, InferenceResult};
use crate::optimization::errors::OptResult;
use crate::optimization::loglik_optimizer::Theta;
use crate::optimization::loglik_optimizer::finite_diff::scalar_hessian;
use crate::optimization::numerical_stability::transformations::EIGEN_EPS;

/// laplace_covariance — pseudoinverse of the negative log-posterior Hessian.
///
/// Parameters
/// ----------
/// - `log_posterior`: fallible objective `θ ↦ ℓ(θ)`; must be finite in a
///   neighborhood of `theta_hat`.
/// - `theta_hat`: the MAP estimate in `θ`-space.
///
/// Returns
/// -------
/// `n × n` covariance `Σ_{k: λ_k > EIGEN_EPS} q_k q_kᵀ / λ_k` where
/// `J = −H = Q Λ Qᵀ`.
///
/// Errors
/// ------
/// - Evaluation errors raised by `log_posterior` during differencing.
/// - [`InferenceError::DegenerateCurvature`] when no eigenvalue of `J` is
///   positive (e.g. `θ̂` is not a local maximum).
pub fn laplace_covariance<V>(log_posterior: V, theta_hat: &Theta) -> InferenceResult<Array2<f64>>
where
    V: Fn(&Theta) -> OptResult<f64>,
{
    let n = theta_hat.len();
    let hess = scalar_hessian(log_posterior, theta_hat)?;
    let mut obs_info = DMatrix::<f64>::zeros(n, n);
    fill_dmatrix(&hess.mapv(|h| -h), &mut obs_info);
    solve_for_cov(obs_info, n)
}

/// Square roots of the diagonal of [`laplace_covariance`].
pub fn laplace_standard_errors<V>(log_posterior: V, theta_hat: &Theta) -> InferenceResult<Array1<f64>>
where
    V: Fn(&Theta) -> OptResult<f64>,
{
    let cov = laplace_covariance(log_posterior, theta_hat)?;
    Ok(cov.diag().mapv(f64::sqrt))
}

/// Copy a symmetric `ndarray` matrix into a preallocated `DMatrix`.
fn fill_dmatrix(src: &Array2<f64>, dst: &mut DMatrix<f64>) {
    let n = src.ncols();
    for j in 0..n {
        for i in j..n {
            dst[(i, j)] = src[[i, j]];
            dst[(j, i)] = src[[j, i]];
        }
    }
}

fn solve_for_cov(obs_info: DMatrix<f64>, n: usize) -> InferenceResult<Array2<f64>> {
    let eigen = obs_info.symmetric_eigen();
    let q = eigen.eigenvectors;
    let kept: Vec<(usize, f64)> = eigen
        .eigenvalues
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, lambda)| *lambda > EIGEN_EPS)
        .collect();
    if kept.is_empty() {
        return Err(InferenceError::DegenerateCurvature);
    }
    let mut cov = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let v: f64 = kept.iter().map(|&(k, lambda)| q[(i, k)] * q[(j, k)] / lambda).sum();
            cov[[i, j]] = v;
            cov[[j, i]] = v;
        }
    }
    Ok(cov)
}
