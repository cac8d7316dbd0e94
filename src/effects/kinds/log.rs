//! Log effect: `scale · ln(max(rate·x + 1, 1e-8))`, applied per column.
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::effects::core::{ConfigValue, EffectParams, ParamSpec, Prior};
use crate::effects::errors::{EffectError, EffectResult};
use crate::effects::kinds::ColumnTransform;
use crate::optimization::numerical_stability::LOG_FLOOR;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEffect {
    #[serde(default = "unit_gamma")]
    pub scale_prior: Prior,
    #[serde(default = "unit_gamma")]
    pub rate_prior: Prior,
}

fn unit_gamma() -> Prior {
    Prior::Gamma { shape: 1.0, rate: 1.0 }
}

impl Default for LogEffect {
    fn default() -> Self {
        Self { scale_prior: unit_gamma(), rate_prior: unit_gamma() }
    }
}

impl LogEffect {
    pub fn set_option(&mut self, effect: &str, option: &str, value: &ConfigValue) -> EffectResult<()> {
        match option {
            "scale_prior" => self.scale_prior = value.as_prior(effect, option)?,
            "rate_prior" => self.rate_prior = value.as_prior(effect, option)?,
            _ => return Err(EffectError::UnknownOption { kind: "log", option: option.into() }),
        }
        Ok(())
    }
}

impl ColumnTransform for LogEffect {
    fn param_specs(&self, _n_cols: usize) -> Vec<ParamSpec> {
        vec![ParamSpec::scalar("scale", self.scale_prior), ParamSpec::scalar("rate", self.rate_prior)]
    }

    fn transform(&self, x: &Array2<f64>, params: &EffectParams) -> EffectResult<Array2<f64>> {
        let scale = params.scalar("scale")?;
        let rate = params.scalar("rate")?;
        Ok(x.mapv(|v| scale * (rate * v + 1.0).max(LOG_FLOOR).ln()))
    }
}
