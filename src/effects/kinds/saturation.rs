//! Hill saturation: `max_effect · x^s / (h^s + x^s)` on `x · input_scale`.
//!
//! Evaluated as `max_effect / (1 + exp(s · (ln h - ln x)))` for `x > 0`,
//! exactly 0 at `x <= 0`. Non-decreasing in `x` for positive parameters.
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::effects::core::{ConfigValue, EffectParams, ParamSpec, Prior};
use crate::effects::errors::{EffectError, EffectResult};
use crate::effects::kinds::ColumnTransform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HillSaturation {
    #[serde(default = "default_input_scale")]
    pub input_scale: f64,
    #[serde(default = "default_half_max_prior")]
    pub half_max_prior: Prior,
    #[serde(default = "default_slope_prior")]
    pub slope_prior: Prior,
    #[serde(default = "default_max_effect_prior")]
    pub max_effect_prior: Prior,
}

fn default_input_scale() -> f64 {
    1.0
}

fn default_half_max_prior() -> Prior {
    Prior::Gamma { shape: 2.0, rate: 1.0 }
}

fn default_slope_prior() -> Prior {
    Prior::Gamma { shape: 2.0, rate: 2.0 }
}

fn default_max_effect_prior() -> Prior {
    Prior::HalfNormal { scale: 1.0 }
}

impl Default for HillSaturation {
    fn default() -> Self {
        Self {
            input_scale: default_input_scale(),
            half_max_prior: default_half_max_prior(),
            slope_prior: default_slope_prior(),
            max_effect_prior: default_max_effect_prior(),
        }
    }
}

/// Hill curve at a single (already scaled) input.
pub fn hill(x: f64, half_max: f64, slope: f64, max_effect: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    max_effect / (1.0 + (slope * (half_max.ln() - x.ln())).exp())
}

impl HillSaturation {
    pub fn with_priors(half_max: Prior, slope: Prior, max_effect: Prior) -> Self {
        Self { half_max_prior: half_max, slope_prior: slope, max_effect_prior: max_effect, ..Self::default() }
    }

    pub fn validate(&self, effect: &str) -> EffectResult<()> {
        if !(self.input_scale.is_finite() && self.input_scale > 0.0) {
            return Err(EffectError::InvalidOption {
                effect: effect.to_string(),
                option: "input_scale".into(),
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }

    pub fn set_option(&mut self, effect: &str, option: &str, value: &ConfigValue) -> EffectResult<()> {
        match option {
            "input_scale" => self.input_scale = value.as_positive(effect, option)?,
            "half_max_prior" => self.half_max_prior = value.as_prior(effect, option)?,
            "slope_prior" => self.slope_prior = value.as_prior(effect, option)?,
            "max_effect_prior" => self.max_effect_prior = value.as_prior(effect, option)?,
            _ => {
                return Err(EffectError::UnknownOption { kind: "saturation", option: option.into() });
            }
        }
        Ok(())
    }
}

impl ColumnTransform for HillSaturation {
    fn param_specs(&self, _n_cols: usize) -> Vec<ParamSpec> {
        vec![
            ParamSpec::scalar("half_max", self.half_max_prior),
            ParamSpec::scalar("slope", self.slope_prior),
            ParamSpec::scalar("max_effect", self.max_effect_prior),
        ]
    }

    fn transform(&self, x: &Array2<f64>, params: &EffectParams) -> EffectResult<Array2<f64>> {
        let h = params.scalar("half_max")?;
        let s = params.scalar("slope")?;
        let m = params.scalar("max_effect")?;
        Ok(x.mapv(|v| hill(v * self.input_scale, h, s, m)))
    }
}
