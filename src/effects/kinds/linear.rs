//! Linear effect: one coefficient per selected column.
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::effects::core::{ConfigValue, EffectParams, ParamSpec, Prior};
use crate::effects::errors::{EffectError, EffectResult};
use crate::effects::kinds::ColumnTransform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearEffect {
    #[serde(default = "default_prior")]
    pub prior: Prior,
}

fn default_prior() -> Prior {
    Prior::Normal { loc: 0.0, scale: 0.1 }
}

impl Default for LinearEffect {
    fn default() -> Self {
        Self { prior: default_prior() }
    }
}

impl LinearEffect {
    pub fn with_prior(prior: Prior) -> Self {
        Self { prior }
    }

    pub fn set_option(&mut self, effect: &str, option: &str, value: &ConfigValue) -> EffectResult<()> {
        match option {
            "prior" => self.prior = value.as_prior(effect, option)?,
            _ => return Err(EffectError::UnknownOption { kind: "linear", option: option.into() }),
        }
        Ok(())
    }
}

impl ColumnTransform for LinearEffect {
    fn param_specs(&self, n_cols: usize) -> Vec<ParamSpec> {
        if n_cols == 0 {
            return Vec::new();
        }
        vec![ParamSpec::vector("coefs", self.prior, n_cols)]
    }

    fn transform(&self, x: &Array2<f64>, params: &EffectParams) -> EffectResult<Array2<f64>> {
        if x.ncols() == 0 {
            return Ok(x.clone());
        }
        let coefs = params.get("coefs")?;
        if coefs.len() != x.ncols() {
            return Err(EffectError::ParamLength { expected: x.ncols(), found: coefs.len() });
        }
        Ok(x * coefs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Each column is scaled by its own coefficient.
    //
    // Given
    // -----
    // - x = [[1, 2], [3, 4]], coefs = [10, -1].
    //
    // Expect
    // ------
    // - [[10, -2], [30, -4]].
    fn linear_scales_columns() {
        // Arrange
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        let params = EffectParams::default().with("coefs", array![10.0, -1.0]);

        // Act
        let out = LinearEffect::default().transform(&x, &params).unwrap();

        // Assert
        assert_eq!(out, array![[10.0, -2.0], [30.0, -4.0]]);
    }
}
