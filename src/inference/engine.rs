//! Engine dispatch and the fitted-parameter container shared by MAP and
//! MCMC.
//!
//! A MAP estimate is stored as a draw collection of size one, so every
//! consumer (prediction, decomposition, budget optimization) iterates draws
//! without caring which engine produced them.
use ndarray::{Array1, Array2, Axis};
use tracing::info;

use crate::context::RunContext;
use crate::effects::core::{ParamLayout, ParamSet};
use crate::inference::diagnostics::Diagnostics;
use crate::inference::errors::{InferenceError, InferenceResult};
use crate::inference::map::MapEngine;
use crate::inference::mcmc::McmcEngine;
use crate::optimization::loglik_optimizer::{LogLikelihood, Theta};

#[derive(Debug, Clone)]
pub enum InferenceEngine {
    Map(MapEngine),
    Mcmc(McmcEngine),
}

impl Default for InferenceEngine {
    fn default() -> Self {
        InferenceEngine::Map(MapEngine::default())
    }
}

impl InferenceEngine {
    pub fn map() -> Self {
        Self::default()
    }

    pub fn mcmc(n_warmup: usize, n_draws: usize, n_chains: usize) -> InferenceResult<Self> {
        Ok(InferenceEngine::Mcmc(McmcEngine::new(n_warmup, n_draws, n_chains)?))
    }

    /// Whether the density should include the log-Jacobian of the parameter
    /// bijections. MAP works with the constrained-space posterior.
    pub fn uses_jacobian(&self) -> bool {
        matches!(self, InferenceEngine::Mcmc(_))
    }

    /// Estimate `θ` under `density`.
    pub fn infer<F>(
        &self, density: &F, layout: &ParamLayout, theta0: Theta, data: &F::Data, ctx: &RunContext,
    ) -> InferenceResult<FittedParams>
    where
        F: LogLikelihood + Sync,
        F::Data: Sync,
    {
        match self {
            InferenceEngine::Map(engine) => {
                let (theta, diag) = engine.run(density, theta0, data)?;
                info!(
                    log_posterior = diag.log_posterior,
                    iterations = diag.iterations,
                    converged = diag.converged,
                    "MAP estimate"
                );
                FittedParams::new(layout.clone(), theta.insert_axis(Axis(0)), Diagnostics::Map(diag))
            }
            InferenceEngine::Mcmc(engine) => {
                let (draws, diag) = engine.run(density, theta0, data, ctx)?;
                info!(
                    draws = draws.nrows(),
                    max_r_hat = diag.max_r_hat(),
                    converged = diag.converged,
                    "MCMC sampling"
                );
                FittedParams::new(layout.clone(), draws, Diagnostics::Mcmc(diag))
            }
        }
    }
}

/// Draws of the unconstrained parameter vector plus how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedParams {
    layout: ParamLayout,
    /// `n_draws × dim`, in `θ`-space.
    draws: Array2<f64>,
    diagnostics: Diagnostics,
}

impl FittedParams {
    /// # Errors
    /// - [`InferenceError::NoDraws`] for an empty draw matrix.
    /// - [`InferenceError::DrawLength`] when draws do not match the layout.
    pub fn new(layout: ParamLayout, draws: Array2<f64>, diagnostics: Diagnostics) -> InferenceResult<Self> {
        if draws.nrows() == 0 {
            return Err(InferenceError::NoDraws);
        }
        if draws.ncols() != layout.dim() {
            return Err(InferenceError::DrawLength { expected: layout.dim(), found: draws.ncols() });
        }
        Ok(Self { layout, draws, diagnostics })
    }

    /// A single fixed `θ`.
    pub fn from_point(layout: ParamLayout, theta: Theta) -> InferenceResult<Self> {
        Self::new(layout, theta.insert_axis(Axis(0)), Diagnostics::Fixed)
    }

    /// Pin constrained values given per owner and parameter name.
    pub fn from_param_set(layout: ParamLayout, set: &ParamSet) -> InferenceResult<Self> {
        let theta = layout.pack(set)?;
        Self::from_point(layout, theta)
    }

    pub fn layout(&self) -> &ParamLayout {
        &self.layout
    }

    pub fn draws(&self) -> &Array2<f64> {
        &self.draws
    }

    pub fn n_draws(&self) -> usize {
        self.draws.nrows()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn converged(&self) -> bool {
        self.diagnostics.converged()
    }

    pub fn draw_theta(&self, draw: usize) -> Theta {
        self.draws.row(draw).to_owned()
    }

    pub fn draw_params(&self, draw: usize) -> InferenceResult<ParamSet> {
        Ok(self.layout.unpack(&self.draw_theta(draw))?)
    }

    /// `n_draws × dim` constrained values.
    pub fn constrained_draws(&self) -> InferenceResult<Array2<f64>> {
        let mut out = Array2::zeros(self.draws.raw_dim());
        for (mut row, theta) in out.axis_iter_mut(Axis(0)).zip(self.draws.axis_iter(Axis(0))) {
            row.assign(&self.layout.to_constrained(&theta.to_owned())?);
        }
        Ok(out)
    }

    /// `θ` of the posterior mean of the constrained values.
    pub fn point_theta(&self) -> InferenceResult<Theta> {
        let mean = self.constrained_draws()?.mean_axis(Axis(0)).ok_or(InferenceError::NoDraws)?;
        Ok(self.layout.from_constrained(&mean)?)
    }

    pub fn point_params(&self) -> InferenceResult<ParamSet> {
        Ok(self.layout.unpack(&self.point_theta()?)?)
    }

    /// Point value of one parameter, `None` when the layout has no such entry.
    pub fn point_value(&self, owner: &str, name: &str) -> Option<Array1<f64>> {
        self.point_params().ok()?.value(owner, name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::core::{EffectParams, ParamSpec, Prior};
    use approx::assert_relative_eq;
    use ndarray::array;

    fn layout() -> ParamLayout {
        let mut layout = ParamLayout::new();
        layout.push_owner("media", vec![ParamSpec::scalar("decay", Prior::Beta { alpha: 2.0, beta: 2.0 })]);
        layout.push_owner("likelihood", vec![ParamSpec::scalar("noise_scale", Prior::HalfNormal { scale: 0.5 })]);
        layout
    }

    #[test]
    // Purpose
    // -------
    // Point summaries average constrained draws, not raw `θ`.
    //
    // Given
    // -----
    // - Two draws whose decays are 0.2 and 0.6 and noise 1 and 3.
    //
    // Expect
    // ------
    // - Point decay 0.4 and noise 2.
    fn point_params_average_constrained_values() {
        // Arrange
        let layout = layout();
        let rows: Vec<Theta> = [(0.2, 1.0), (0.6, 3.0)]
            .iter()
            .map(|&(d, s)| {
                let mut set = ParamSet::default();
                set.insert("media", EffectParams::default().with("decay", array![d]));
                set.insert("likelihood", EffectParams::default().with("noise_scale", array![s]));
                layout.pack(&set).unwrap()
            })
            .collect();
        let draws = ndarray::stack(Axis(0), &[rows[0].view(), rows[1].view()]).unwrap();
        let fitted = FittedParams::new(layout, draws, Diagnostics::Fixed).unwrap();

        // Act
        let point = fitted.point_params().unwrap();

        // Assert
        assert_relative_eq!(point.value("media", "decay").unwrap()[0], 0.4, epsilon = 1e-9);
        assert_relative_eq!(point.value("likelihood", "noise_scale").unwrap()[0], 2.0, epsilon = 1e-9);
        assert_eq!(fitted.n_draws(), 2);
    }

    #[test]
    // Purpose
    // -------
    // Draw matrices must match the layout.
    //
    // Given
    // -----
    // - Zero rows; three columns for a two-coordinate layout.
    //
    // Expect
    // ------
    // - `NoDraws` and `DrawLength`.
    fn draws_are_checked_against_layout() {
        // Act
        let empty = FittedParams::new(layout(), Array2::zeros((0, 2)), Diagnostics::Fixed);
        let wide = FittedParams::new(layout(), Array2::zeros((1, 3)), Diagnostics::Fixed);

        // Assert
        assert_eq!(empty, Err(InferenceError::NoDraws));
        assert_eq!(wide, Err(InferenceError::DrawLength { expected: 2, found: 3 }));
    }
}
