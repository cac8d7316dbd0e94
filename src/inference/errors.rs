//! Errors for the inference engines.
//!
//! MAP non-convergence and poor MCMC mixing are not errors: they are reported
//! through diagnostics on the returned
//! [`FittedParams`](super::FittedParams). The variants here cover invalid
//! engine configuration and evaluation failures that prevent any estimate
//! from being produced.
use thiserror::Error;

use crate::effects::errors::EffectError;
use crate::optimization::errors::OptError;

pub type InferenceResult<T> = Result<T, InferenceError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    // ---- Configuration ----
    #[error("Invalid MCMC setting {name} = {value}: {reason}")]
    InvalidMcmcSetting { name: &'static str, value: f64, reason: &'static str },

    #[error("Invalid quantile {q}: must lie in [0, 1]")]
    InvalidQuantile { q: f64 },

    // ---- Sampling ----
    #[error("Log-density is not finite at the starting point of any of the {chains} chains")]
    NoFiniteStart { chains: usize },

    #[error("Posterior has no draws")]
    NoDraws,

    #[error("Draw has length {found}, layout expects {expected}")]
    DrawLength { expected: usize, found: usize },

    // ---- Laplace approximation ----
    #[error("Laplace covariance is not positive along any direction")]
    DegenerateCurvature,

    // ---- Wrapped ----
    #[error(transparent)]
    Optimization(#[from] OptError),

    #[error(transparent)]
    Effect(#[from] EffectError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Optimizer errors keep their message when wrapped.
    //
    // Given
    // -----
    // - `OptError::MissingThetaHat`.
    //
    // Expect
    // ------
    // - Same message through `InferenceError::Optimization`.
    fn optimizer_errors_are_transparent() {
        // Act
        let err: InferenceError = OptError::MissingThetaHat.into();

        // Assert
        assert_eq!(err.to_string(), OptError::MissingThetaHat.to_string());
    }
}
