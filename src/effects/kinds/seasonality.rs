//! Fourier seasonality on raw period labels.
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::effects::core::{ConfigValue, EffectParams, ParamSpec, Prepared, Prior, TimeIndex};
use crate::effects::errors::{EffectError, EffectResult};

/// `Σ_k a_k sin(2πkt/P) + b_k cos(2πkt/P)` for `k = 1..=order`,
/// coefficients `~ Normal(0, prior_scale)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FourierSeasonality {
    pub period: f64,
    pub order: usize,
    #[serde(default = "default_prior_scale")]
    pub prior_scale: f64,
}

fn default_prior_scale() -> f64 {
    0.1
}

impl FourierSeasonality {
    pub fn new(period: f64, order: usize) -> Self {
        Self { period, order, prior_scale: default_prior_scale() }
    }

    pub fn validate(&self, effect: &str) -> EffectResult<()> {
        let bad = |option: &str, reason: &str| EffectError::InvalidOption {
            effect: effect.to_string(),
            option: option.to_string(),
            reason: reason.to_string(),
        };
        if !(self.period.is_finite() && self.period > 0.0) {
            return Err(bad("period", "must be positive"));
        }
        if self.order == 0 {
            return Err(bad("order", "must be at least 1"));
        }
        if !(self.prior_scale.is_finite() && self.prior_scale > 0.0) {
            return Err(bad("prior_scale", "must be positive"));
        }
        Ok(())
    }

    pub fn param_specs(&self) -> EffectResult<Vec<ParamSpec>> {
        Ok(vec![ParamSpec::vector("coefs", Prior::normal(0.0, self.prior_scale)?, 2 * self.order)])
    }

    /// `T × 2·order` design: sine then cosine column for each harmonic.
    pub fn prepare(&self, index: &TimeIndex) -> Prepared {
        let labels = index.labels();
        let inputs = Array2::from_shape_fn((labels.len(), 2 * self.order), |(i, j)| {
            let k = (j / 2 + 1) as f64;
            let angle = 2.0 * PI * k * labels[i] as f64 / self.period;
            if j % 2 == 0 { angle.sin() } else { angle.cos() }
        });
        Prepared { index: index.clone(), inputs }
    }

    pub fn apply(&self, prepared: &Prepared, params: &EffectParams) -> EffectResult<Array1<f64>> {
        let coefs = params.get("coefs")?;
        if coefs.len() != prepared.inputs.ncols() {
            return Err(EffectError::ParamLength {
                expected: prepared.inputs.ncols(),
                found: coefs.len(),
            });
        }
        Ok(prepared.inputs.dot(coefs))
    }

    pub fn set_option(&mut self, effect: &str, option: &str, value: &ConfigValue) -> EffectResult<()> {
        match option {
            "period" => self.period = value.as_positive(effect, option)?,
            "order" => self.order = value.as_count(effect, option)?,
            "prior_scale" => self.prior_scale = value.as_positive(effect, option)?,
            _ => {
                return Err(EffectError::UnknownOption { kind: "seasonality", option: option.into() });
            }
        }
        self.validate(effect)
    }
}
