//! Entry point: maximize a [`LogLikelihood`] with L-BFGS.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, LogLikelihood, MLEOptions},
    },
};

/// Maximize `ℓ(θ)` starting from `theta0`.
///
/// Runs `f.check` on the starting point, wraps `(f, data)` in an
/// [`ArgMinAdapter`] minimizing `-ℓ`, builds L-BFGS with the line search in
/// `opts` and delegates to [`run_lbfgs`].
///
/// # Errors
/// - Anything `f.check` rejects.
/// - Solver construction and runtime failures (line search, evaluation
///   errors raised by `f.value`).
///
/// # Example
/// ```no_run
/// use effect_engine::optimization::errors::OptResult;
/// use effect_engine::optimization::loglik_optimizer::{LogLikelihood, MLEOptions, Theta, maximize};
/// use ndarray::array;
///
/// struct Bowl;
/// impl LogLikelihood for Bowl {
///     type Data = ();
///     fn value(&self, theta: &Theta, _: &()) -> OptResult<f64> {
///         Ok(-theta.dot(theta))
///     }
///     fn check(&self, _: &Theta, _: &()) -> OptResult<()> {
///         Ok(())
///     }
/// }
///
/// let out = maximize(&Bowl, array![0.1, -0.2], &(), &MLEOptions::default())?;
/// assert!(out.converged);
/// # Ok::<(), effect_engine::optimization::errors::OptError>(())
/// ```
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptError;
    use crate::optimization::loglik_optimizer::Tolerances;
    use approx::assert_relative_eq;
    use ndarray::{Array1, array};

    /// Gaussian log-density kernel centered at `data`.
    struct Centered;

    impl LogLikelihood for Centered {
        type Data = Array1<f64>;

        fn value(&self, theta: &Theta, center: &Array1<f64>) -> OptResult<f64> {
            Ok(-0.5 * (theta - center).mapv(|d| d * d).sum())
        }

        fn check(&self, theta: &Theta, center: &Array1<f64>) -> OptResult<()> {
            if theta.len() != center.len() {
                return Err(OptError::InvalidThetaInput {
                    index: theta.len(),
                    value: f64::NAN,
                    reason: "length mismatch",
                });
            }
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // Both line searches locate the maximum of a concave quadratic.
    //
    // Given
    // -----
    // - Center `[1.5, -2.0]`, start at zero.
    //
    // Expect
    // ------
    // - `theta_hat ≈ center`, `value ≈ 0`, `converged`.
    fn maximize_finds_quadratic_peak_with_both_line_searches() {
        // Arrange
        let center = array![1.5, -2.0];
        for ls in [LineSearcher::MoreThuente, LineSearcher::HagerZhang] {
            let opts = MLEOptions { line_searcher: ls, ..MLEOptions::default() };

            // Act
            let out = maximize(&Centered, Array1::zeros(2), &center, &opts).unwrap();

            // Assert
            assert!(out.converged, "{ls:?} did not converge: {}", out.status);
            assert_relative_eq!(out.theta_hat[0], 1.5, epsilon = 1e-4);
            assert_relative_eq!(out.theta_hat[1], -2.0, epsilon = 1e-4);
            assert_relative_eq!(out.value, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // A one-iteration budget on a far start is reported as not converged.
    //
    // Given
    // -----
    // - `max_iter = 1`, no gradient tolerance reachable in one step from a
    //   distant start on an anisotropic bowl.
    //
    // Expect
    // ------
    // - `converged == false`.
    fn maximize_reports_iteration_cap() {
        // Arrange
        let center = array![100.0, -50.0, 25.0];
        let tols = Tolerances::new(Some(1e-12), None, Some(1)).unwrap();
        let opts = MLEOptions::new(tols, LineSearcher::MoreThuente, false, None).unwrap();

        // Act
        let out = maximize(&Centered, array![0.0, 0.0, 0.0], &center, &opts).unwrap();

        // Assert
        assert_eq!(out.iterations, 1);
        assert!(!out.converged || out.grad_norm.unwrap_or(0.0) < 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // `check` runs before the solver.
    //
    // Given
    // -----
    // - A starting point of the wrong length.
    //
    // Expect
    // ------
    // - `InvalidThetaInput`.
    fn maximize_runs_check_first() {
        // Arrange
        let center = array![1.0, 2.0];

        // Act
        let res = maximize(&Centered, array![0.0], &center, &MLEOptions::default());

        // Assert
        assert!(matches!(res, Err(OptError::InvalidThetaInput { .. })));
    }
}
