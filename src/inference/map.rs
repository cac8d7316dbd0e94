//! MAP engine: L-BFGS on the log-posterior through the optimizer layer.
use tracing::{debug, warn};

use crate::inference::diagnostics::MapDiagnostics;
use crate::inference::errors::InferenceResult;
use crate::inference::laplace::laplace_standard_errors;
use crate::optimization::loglik_optimizer::{
    LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Theta, Tolerances, maximize,
};

#[derive(Debug, Clone, PartialEq)]
pub struct MapEngine {
    pub options: MLEOptions,
    /// Compute Laplace standard errors at the estimate.
    pub laplace: bool,
    /// L-BFGS restarts allowed after a failed line search.
    pub max_restarts: usize,
    /// Relative gradient norm, `‖∇ℓ‖ / (1 + |ℓ|)`, under which a run that
    /// cannot make further line-search progress counts as converged.
    pub stall_grad_tol: f64,
}

impl Default for MapEngine {
    /// More–Thuente L-BFGS, gradient tolerance 1e-6, 1000 iterations,
    /// three restarts.
    fn default() -> Self {
        let options = MLEOptions {
            tols: Tolerances { tol_grad: Some(1e-6), tol_cost: None, max_iter: Some(1000) },
            ..MLEOptions::default()
        };
        Self::new(options)
    }
}

impl MapEngine {
    pub fn new(options: MLEOptions) -> Self {
        Self { options, laplace: false, max_restarts: 3, stall_grad_tol: 1e-4 }
    }

    pub fn with_laplace(mut self, laplace: bool) -> Self {
        self.laplace = laplace;
        self
    }

    pub fn with_max_restarts(mut self, max_restarts: usize) -> Self {
        self.max_restarts = max_restarts;
        self
    }

    /// Maximize `density` from `theta0`.
    ///
    /// When L-BFGS exits on a failed line search, it is restarted from the
    /// last accepted point with the other line search, up to `max_restarts`
    /// times, while each restart improves the log-posterior. Hitting the
    /// iteration cap or exhausting restarts is reported through
    /// `MapDiagnostics::converged`, not as an error. A failed Laplace step
    /// leaves `standard_errors` empty.
    pub fn run<F: LogLikelihood>(
        &self, density: &F, theta0: Theta, data: &F::Data,
    ) -> InferenceResult<(Theta, MapDiagnostics)> {
        let mut out = maximize(density, theta0, data, &self.options)?;
        let mut iterations = out.iterations;
        let mut fn_evals = out.fn_evals.clone();
        let mut line_searcher = self.options.line_searcher;
        let mut restarts = 0;
        while !out.converged && out.solver_exited() && restarts < self.max_restarts {
            restarts += 1;
            line_searcher = match line_searcher {
                LineSearcher::MoreThuente => LineSearcher::HagerZhang,
                LineSearcher::HagerZhang => LineSearcher::MoreThuente,
            };
            debug!(restart = restarts, status = %out.status, ?line_searcher, "restarting MAP");
            let options = MLEOptions { line_searcher, ..self.options.clone() };
            let retry = match maximize(density, out.theta_hat.clone(), data, &options) {
                Ok(retry) => retry,
                Err(err) => {
                    warn!(error = %err, "MAP restart failed");
                    break;
                }
            };
            iterations += retry.iterations;
            for (key, count) in &retry.fn_evals {
                *fn_evals.entry(key.clone()).or_insert(0) += count;
            }
            let improved = retry.value > out.value;
            if retry.converged || improved {
                out = retry;
            }
            if !improved {
                break;
            }
        }
        let converged = out.converged || self.stalled_at_mode(&out);
        if !converged {
            warn!(status = %out.status, iterations, restarts, "MAP did not converge");
        }
        let standard_errors = if self.laplace {
            match laplace_standard_errors(|t: &Theta| density.value(t, data), &out.theta_hat) {
                Ok(se) => Some(se),
                Err(err) => {
                    warn!(error = %err, "Laplace standard errors unavailable");
                    None
                }
            }
        } else {
            None
        };
        debug!(log_posterior = out.value, iterations, restarts, "MAP finished");
        let diagnostics = MapDiagnostics {
            log_posterior: out.value,
            iterations,
            converged,
            status: out.status,
            grad_norm: out.grad_norm,
            fn_evals,
            restarts,
            standard_errors,
        };
        Ok((out.theta_hat, diagnostics))
    }

    /// Line search exhausted with the gradient at finite-difference noise level.
    fn stalled_at_mode(&self, out: &OptimOutcome) -> bool {
        out.solver_exited()
            && out.grad_norm.is_some_and(|g| g <= self.stall_grad_tol * (1.0 + out.value.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};

    struct Bowl;

    impl LogLikelihood for Bowl {
        type Data = Array1<f64>;

        fn value(&self, theta: &Theta, center: &Array1<f64>) -> OptResult<f64> {
            let d = theta - center;
            Ok(-0.5 * (4.0 * d[0] * d[0] + d[1] * d[1]))
        }

        fn check(&self, _: &Theta, _: &Array1<f64>) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // MAP finds the mode and, on request, its Laplace standard errors.
    //
    // Given
    // -----
    // - `ℓ(θ) = −½ (4 d₀² + d₁²)`, `d = θ − c`, `c = [0.5, −1]`.
    //
    // Expect
    // ------
    // - Estimate `c`, converged, standard errors `[0.5, 1]`.
    fn map_reports_mode_and_standard_errors() {
        // Arrange
        let engine = MapEngine::default().with_laplace(true);

        // Act
        let (theta, diag) = engine.run(&Bowl, array![0.0, 0.0], &array![0.5, -1.0]).unwrap();

        // Assert
        assert_relative_eq!(theta[0], 0.5, epsilon = 1e-5);
        assert_relative_eq!(theta[1], -1.0, epsilon = 1e-5);
        assert!(diag.converged);
        let se = diag.standard_errors.unwrap();
        assert_relative_eq!(se[0], 0.5, epsilon = 1e-3);
        assert_relative_eq!(se[1], 1.0, epsilon = 1e-3);
    }

    #[test]
    // Purpose
    // -------
    // Running out of iterations is a diagnostic, not an error.
    //
    // Given
    // -----
    // - `max_iter = 1`, an unreachable gradient tolerance and a distant
    //   start on the anisotropic bowl.
    //
    // Expect
    // ------
    // - `Ok` with one iteration and `converged == false`.
    fn iteration_cap_is_reported() {
        // Arrange
        let tols = Tolerances::new(Some(1e-12), None, Some(1)).unwrap();
        let opts = MLEOptions { tols, ..MLEOptions::default() };
        let engine = MapEngine::new(opts);

        // Act
        let (_, diag) = engine.run(&Bowl, array![50.0, -50.0], &array![0.5, -1.0]).unwrap();

        // Assert
        assert_eq!(diag.iterations, 1);
        assert!(!diag.converged || diag.grad_norm.unwrap_or(0.0) < 1e-12);
    }

    /// Finite only left of `θ₀ = 1`; the unconstrained mode sits past the edge.
    struct Cliff;

    impl LogLikelihood for Cliff {
        type Data = ();

        fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
            if theta[0] < 1.0 { Ok(-(theta[0] - 5.0).powi(2)) } else { Ok(f64::NEG_INFINITY) }
        }

        fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // A failed line search is a recoverable outcome: the engine retries,
    // then reports non-convergence with the solver status.
    //
    // Given
    // -----
    // - `ℓ(θ) = −(θ − 5)²` for `θ < 1`, `−∞` beyond, started at `θ = 0`
    //   where the gradient is 10.
    //
    // Expect
    // ------
    // - `Ok`, `converged == false`, a `SolverExit` status, at least one
    //   restart and a finite estimate left of the edge.
    fn failed_line_search_is_reported_not_raised() {
        // Arrange
        let engine = MapEngine::default();

        // Act
        let (theta, diag) = engine.run(&Cliff, array![0.0], &()).unwrap();

        // Assert
        assert!(!diag.converged);
        assert!(diag.status.starts_with("SolverExit"), "status = {}", diag.status);
        assert!((1..=engine.max_restarts).contains(&diag.restarts));
        assert!(theta[0].is_finite() && theta[0] < 1.0);
        assert!(diag.log_posterior.is_finite());
    }

    #[test]
    // Purpose
    // -------
    // A clean run does not restart.
    //
    // Given
    // -----
    // - The anisotropic bowl from the origin.
    //
    // Expect
    // ------
    // - Zero restarts.
    fn converged_run_does_not_restart() {
        // Arrange
        let engine = MapEngine::default();

        // Act
        let (_, diag) = engine.run(&Bowl, array![0.0, 0.0], &array![0.5, -1.0]).unwrap();

        // Assert
        assert!(diag.converged);
        assert_eq!(diag.restarts, 0);
    }
}
