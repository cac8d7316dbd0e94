//! Exact-attribution likelihood augmentation.
//!
//! Wraps an effect without changing its contribution and, during fitting,
//! adds `likelihood_scale · Σ_t ln N(reference[t] | contribution[t], prior_scale)`
//! over the reference periods that fall inside the fitted horizon. The
//! reference series and `prior_scale` are in raw target units.
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal};

use crate::effects::core::{ConfigValue, ScaleFactors, TimeIndex};
use crate::effects::effect::Effect;
use crate::effects::errors::{EffectError, EffectResult};
use crate::effects::kinds::lift::check_scale;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExactAttributionLikelihood {
    pub inner: Box<Effect>,
    /// `(period, attributed contribution)` pairs.
    pub reference: Vec<(i64, f64)>,
    pub prior_scale: f64,
    #[serde(default = "unit")]
    pub likelihood_scale: f64,
    #[serde(skip)]
    y_scale: Option<f64>,
}

fn unit() -> f64 {
    1.0
}

impl ExactAttributionLikelihood {
    pub fn new(inner: Effect, reference: Vec<(i64, f64)>, prior_scale: f64) -> Self {
        Self { inner: Box::new(inner), reference, prior_scale, likelihood_scale: unit(), y_scale: None }
    }

    pub fn with_likelihood_scale(mut self, likelihood_scale: f64) -> Self {
        self.likelihood_scale = likelihood_scale;
        self
    }

    pub fn validate(&self, effect: &str) -> EffectResult<()> {
        if matches!(
            self.inner.as_ref(),
            Effect::Trend(_) | Effect::LiftTest(_) | Effect::ExactAttribution(_)
        ) {
            return Err(EffectError::InvalidWrappedEffect {
                effect: effect.to_string(),
                kind: self.inner.kind_name(),
            });
        }
        check_scale(effect, "prior_scale", self.prior_scale)?;
        check_scale(effect, "likelihood_scale", self.likelihood_scale)?;
        if self.reference.iter().any(|(_, v)| !v.is_finite()) {
            return Err(EffectError::InvalidAugmentation {
                effect: effect.to_string(),
                reason: "reference values must be finite".into(),
            });
        }
        self.inner.validate(effect)
    }

    pub fn initialize(&mut self, effect: &str, index: &TimeIndex, scale: &ScaleFactors) -> EffectResult<()> {
        if !self.reference.iter().any(|(t, _)| index.position(*t).is_some()) {
            return Err(EffectError::InvalidAugmentation {
                effect: effect.to_string(),
                reason: "reference series does not overlap the training index".into(),
            });
        }
        self.y_scale = Some(scale.y_scale);
        Ok(())
    }

    pub fn aux_log_density(
        &self, effect: &str, index: &TimeIndex, contribution: &Array1<f64>,
    ) -> EffectResult<f64> {
        let y_scale = self.y_scale.ok_or_else(|| EffectError::NotInitialized { effect: effect.to_string() })?;
        let density = Normal::new(0.0, self.prior_scale / y_scale)?;
        let total: f64 = self
            .reference
            .iter()
            .filter_map(|&(t, value)| index.position(t).map(|pos| (pos, value)))
            .map(|(pos, value)| density.ln_pdf(value / y_scale - contribution[pos]))
            .sum();
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
