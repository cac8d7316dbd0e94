//! Lift-test likelihood augmentation.
//!
//! Wraps a column-wise effect without changing its contribution. During
//! fitting each observation adds
//! `likelihood_scale · ln N(lift | f(x_end) - f(x_start), prior_scale)`, where
//! `f` is the wrapped effect evaluated at the observation period with that
//! period's inputs replaced by the start or end spend. Earlier periods keep
//! their observed inputs, so carry-over effects see the real history.
//!
//! `lift` and `prior_scale` are in raw target units and are divided by the
//! frozen `y_scale` at initialize.
use ndarray::{ArrayView1, s};
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal};

use crate::effects::core::{ConfigValue, EffectParams, Prepared, ScaleFactors, TimeIndex};
use crate::effects::effect::Effect;
use crate::effects::errors::{EffectError, EffectResult};
use crate::effects::kinds::ColumnTransform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiftObservation {
    pub time: i64,
    /// Spend per selected column before the change.
    pub x_start: Vec<f64>,
    /// Spend per selected column after the change.
    pub x_end: Vec<f64>,
    pub lift: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiftTestLikelihood {
    pub inner: Box<Effect>,
    pub observations: Vec<LiftObservation>,
    pub prior_scale: f64,
    #[serde(default = "unit")]
    pub likelihood_scale: f64,
    #[serde(skip)]
    y_scale: Option<f64>,
}

fn unit() -> f64 {
    1.0
}

impl LiftTestLikelihood {
    pub fn new(inner: Effect, observations: Vec<LiftObservation>, prior_scale: f64) -> Self {
        Self {
            inner: Box::new(inner),
            observations,
            prior_scale,
            likelihood_scale: unit(),
            y_scale: None,
        }
    }

    pub fn with_likelihood_scale(mut self, likelihood_scale: f64) -> Self {
        self.likelihood_scale = likelihood_scale;
        self
    }

    pub fn validate(&self, effect: &str) -> EffectResult<()> {
        if self.inner.as_transform().is_none() {
            return Err(EffectError::InvalidWrappedEffect {
                effect: effect.to_string(),
                kind: self.inner.kind_name(),
            });
        }
        if self.observations.is_empty() {
            return Err(invalid(effect, "at least one observation is required"));
        }
        check_scale(effect, "prior_scale", self.prior_scale)?;
        check_scale(effect, "likelihood_scale", self.likelihood_scale)?;
        if self.observations.iter().any(|o| !o.lift.is_finite()) {
            return Err(invalid(effect, "lift values must be finite"));
        }
        self.inner.validate(effect)
    }

    pub fn initialize(
        &mut self, effect: &str, index: &TimeIndex, n_cols: usize, scale: &ScaleFactors,
    ) -> EffectResult<()> {
        for obs in &self.observations {
            if obs.x_start.len() != n_cols || obs.x_end.len() != n_cols {
                return Err(invalid(
                    effect,
                    &format!(
                        "observation at {} has {}/{} spend values, effect selects {n_cols} columns",
                        obs.time,
                        obs.x_start.len(),
                        obs.x_end.len()
                    ),
                ));
            }
            if index.position(obs.time).is_none() {
                return Err(invalid(effect, &format!("period {} is outside the training index", obs.time)));
            }
        }
        self.y_scale = Some(scale.y_scale);
        Ok(())
    }

    /// Inner contribution at `time` with that row's inputs replaced by `x`.
    fn response_at(
        transform: &dyn ColumnTransform, prepared: &Prepared, pos: usize, x: &[f64],
        params: &EffectParams,
    ) -> EffectResult<f64> {
        let mut rows = prepared.inputs.slice(s![..=pos, ..]).to_owned();
        rows.row_mut(pos).assign(&ArrayView1::from(x));
        Ok(transform.contribution(&rows, params)?[pos])
    }

    pub fn aux_log_density(
        &self, effect: &str, prepared: &Prepared, params: &EffectParams,
    ) -> EffectResult<f64> {
        let y_scale = self.y_scale.ok_or_else(|| EffectError::NotInitialized { effect: effect.to_string() })?;
        let transform = self.inner.as_transform().ok_or_else(|| EffectError::InvalidWrappedEffect {
            effect: effect.to_string(),
            kind: self.inner.kind_name(),
        })?;
        let density = Normal::new(0.0, self.prior_scale / y_scale)?;
        let mut total = 0.0;
        for obs in &self.observations {
            let pos = prepared
                .index
                .position(obs.time)
                .ok_or_else(|| invalid(effect, &format!("period {} is not in the horizon", obs.time)))?;
            let high = Self::response_at(transform, prepared, pos, &obs.x_end, params)?;
            let low = Self::response_at(transform, prepared, pos, &obs.x_start, params)?;
            total += density.ln_pdf(obs.lift / y_scale - (high - low));
        }
        Ok(self.likelihood_scale * total)
    }

    pub fn set_option(&mut self, effect: &str, option: &str, value: &ConfigValue) -> EffectResult<()> {
        match option {
            "prior_scale" => self.prior_scale = value.as_positive(effect, option)?,
            "likelihood_scale" => self.likelihood_scale = value.as_positive(effect, option)?,
            _ => return self.inner.set_option(effect, option, value),
        }
        Ok(())
    }
}

pub(crate) fn check_scale(effect: &str, option: &str, value: f64) -> EffectResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(EffectError::InvalidOption {
            effect: effect.to_string(),
            option: option.to_string(),
            reason: "must be positive".into(),
        });
    }
    Ok(())
}

fn invalid(effect: &str, reason: &str) -> EffectError {
    EffectError::InvalidAugmentation { effect: effect.to_string(), reason: reason.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::core::TargetSeries;
    use crate::effects::kinds::{LinearEffect, TrendEffect};
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2, array};

    fn lift_on_linear(lift: f64) -> LiftTestLikelihood {
        LiftTestLikelihood::new(
            Effect::Linear(LinearEffect::default()),
            vec![LiftObservation { time: 2, x_start: vec![1.0], x_end: vec![3.0], lift }],
            0.5,
        )
    }

    fn prepared() -> Prepared {
        Prepared { index: TimeIndex::range(0, 4).unwrap(), inputs: Array2::from_elem((4, 1), 1.0) }
    }

    fn unit_scale() -> ScaleFactors {
        let target = TargetSeries::new(TimeIndex::range(0, 4).unwrap(), Array1::from_elem(4, 1.0)).unwrap();
        ScaleFactors::from_training(&target, false)
    }

    #[test]
    // Purpose
    // -------
    // For a linear effect the predicted delta is `coef · (x_end - x_start)`.
    //
    // Given
    // -----
    // - coef 2, spend 1 → 3, observed lift 4, prior_scale 0.5, y_scale 1.
    //
    // Expect
    // ------
    // - Aux term equals `ln N(4 | 4, 0.5)`.
    fn lift_density_is_centered_on_predicted_delta() {
        // Arrange
        let mut lift = lift_on_linear(4.0);
        lift.initialize("tv", &TimeIndex::range(0, 4).unwrap(), 1, &unit_scale()).unwrap();
        let params = EffectParams::default().with("coefs", array![2.0]);

        // Act
        let aux = lift.aux_log_density("tv", &prepared(), &params).unwrap();

        // Assert
        assert_relative_eq!(aux, Normal::new(0.0, 0.5).unwrap().ln_pdf(0.0), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // The aux density prefers coefficients implied by the lift.
    //
    // Given
    // -----
    // - Observed lift 4 over a spend change of 2.
    //
    // Expect
    // ------
    // - Density at coef 2 exceeds density at coef 0.5.
    fn lift_density_prefers_implied_slope() {
        // Arrange
        let mut lift = lift_on_linear(4.0);
        lift.initialize("tv", &TimeIndex::range(0, 4).unwrap(), 1, &unit_scale()).unwrap();

        // Act
        let at_truth = lift
            .aux_log_density("tv", &prepared(), &EffectParams::default().with("coefs", array![2.0]))
            .unwrap();
        let off = lift
            .aux_log_density("tv", &prepared(), &EffectParams::default().with("coefs", array![0.5]))
            .unwrap();

        // Assert
        assert!(at_truth > off);
    }

    #[test]
    // Purpose
    // -------
    // Observations must match the selection width and the training index, and
    // only column-wise effects can be wrapped.
    //
    // Given
    // -----
    // - Two-column spend for a one-column selection; an out-of-range period;
    //   a trend as the wrapped effect.
    //
    // Expect
    // ------
    // - `InvalidAugmentation` twice, then `InvalidWrappedEffect`.
    fn lift_rejects_bad_observations_and_wrapped_kinds() {
        // Arrange
        let index = TimeIndex::range(0, 4).unwrap();
        let mut wide = lift_on_linear(1.0);
        wide.observations[0].x_end = vec![1.0, 2.0];
        let mut late = lift_on_linear(1.0);
        late.observations[0].time = 99;
        let trend = LiftTestLikelihood::new(Effect::Trend(TrendEffect::flat()), lift_on_linear(1.0).observations, 1.0);

        // Act / Assert
        assert!(matches!(
            wide.initialize("tv", &index, 1, &unit_scale()),
            Err(EffectError::InvalidAugmentation { .. })
        ));
        assert!(matches!(
            late.initialize("tv", &index, 1, &unit_scale()),
            Err(EffectError::InvalidAugmentation { .. })
        ));
        assert!(matches!(trend.validate("tv"), Err(EffectError::InvalidWrappedEffect { kind: "trend", .. })));
    }
}
