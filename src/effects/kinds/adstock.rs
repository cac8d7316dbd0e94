//! Geometric adstock: `c[t] = x[t] + decay · c[t-1]`, `c[-1] = 0`.
//!
//! One forward pass per column, no look-ahead. With `normalize` the output is
//! multiplied by `1 - decay`, so a constant input keeps its level in steady
//! state. The recursion restarts at the first row it is given; at predict
//! time it is recomputed over the full history unless `no_horizon_drift` is
//! set, in which case a horizon that differs from the fitted one is a data
//! error.
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::effects::core::{ConfigValue, EffectParams, ParamSpec, Prior, TimeIndex};
use crate::effects::errors::{EffectError, EffectResult};
use crate::effects::kinds::ColumnTransform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometricAdstock {
    #[serde(default = "default_decay_prior")]
    pub decay_prior: Prior,
    #[serde(default)]
    pub normalize: bool,
    #[serde(default)]
    pub no_horizon_drift: bool,
    /// `(start label, length)` of the training horizon.
    #[serde(skip)]
    fit_window: Option<(i64, usize)>,
}

fn default_decay_prior() -> Prior {
    Prior::Beta { alpha: 2.0, beta: 2.0 }
}

impl Default for GeometricAdstock {
    fn default() -> Self {
        Self {
            decay_prior: default_decay_prior(),
            normalize: false,
            no_horizon_drift: false,
            fit_window: None,
        }
    }
}

impl GeometricAdstock {
    pub fn strict(mut self) -> Self {
        self.no_horizon_drift = true;
        self
    }

    pub fn normalized(mut self) -> Self {
        self.normalize = true;
        self
    }

    pub fn initialize(&mut self, index: &TimeIndex) {
        self.fit_window = Some((index.start(), index.len()));
    }

    pub fn check_horizon(&self, effect: &str, index: &TimeIndex) -> EffectResult<()> {
        match self.fit_window {
            Some((fit_start, fit_len))
                if self.no_horizon_drift && (fit_start != index.start() || fit_len != index.len()) =>
            {
                Err(EffectError::HorizonDrift {
                    effect: effect.to_string(),
                    fit_start,
                    fit_len,
                    start: index.start(),
                    len: index.len(),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn set_option(&mut self, effect: &str, option: &str, value: &ConfigValue) -> EffectResult<()> {
        match option {
            "decay_prior" => self.decay_prior = value.as_prior(effect, option)?,
            "normalize" => self.normalize = value.as_bool(effect, option)?,
            "no_horizon_drift" => self.no_horizon_drift = value.as_bool(effect, option)?,
            _ => return Err(EffectError::UnknownOption { kind: "adstock", option: option.into() }),
        }
        Ok(())
    }
}

impl ColumnTransform for GeometricAdstock {
    fn param_specs(&self, _n_cols: usize) -> Vec<ParamSpec> {
        vec![ParamSpec::scalar("decay", self.decay_prior)]
    }

    fn transform(&self, x: &Array2<f64>, params: &EffectParams) -> EffectResult<Array2<f64>> {
        let decay = params.scalar("decay")?;
        let gain = if self.normalize { 1.0 - decay } else { 1.0 };
        let mut out = Array2::zeros(x.raw_dim());
        for (src, mut dst) in x.columns().into_iter().zip(out.columns_mut()) {
            let mut carry = 0.0;
            for (xi, di) in src.iter().zip(dst.iter_mut()) {
                carry = xi + decay * carry;
                *di = gain * carry;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The recursion and its degenerate decay = 0 case.
    // - Steady-state normalization.
    // - The strict horizon-drift policy.
    // -------------------------------------------------------------------------

    fn decay(d: f64) -> EffectParams {
        EffectParams::default().with("decay", array![d])
    }

    #[test]
    // Purpose
    // -------
    // Output satisfies `c[t] = x[t] + d·c[t-1]` column by column.
    //
    // Given
    // -----
    // - Two columns, decay 0.5.
    //
    // Expect
    // ------
    // - The recursion holds for every row after the first; `c[0] = x[0]`.
    fn adstock_follows_recursion() {
        // Arrange
        let x = array![[1.0, 0.0], [0.0, 2.0], [3.0, 0.0], [0.0, 0.0]];

        // Act
        let c = GeometricAdstock::default().transform(&x, &decay(0.5)).unwrap();

        // Assert
        for j in 0..2 {
            assert_eq!(c[[0, j]], x[[0, j]]);
            for t in 1..4 {
                assert_relative_eq!(c[[t, j]], x[[t, j]] + 0.5 * c[[t - 1, j]], epsilon = 1e-12);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Zero decay returns the input unchanged.
    //
    // Given
    // -----
    // - Arbitrary input, decay 0.
    //
    // Expect
    // ------
    // - Output equals input.
    fn zero_decay_is_identity() {
        // Arrange
        let x = array![[1.0], [5.0], [-2.0]];

        // Act
        let c = GeometricAdstock::default().transform(&x, &decay(0.0)).unwrap();

        // Assert
        assert_eq!(c, x);
    }

    #[test]
    // Purpose
    // -------
    // Normalized adstock of a long constant input converges to the input.
    //
    // Given
    // -----
    // - 200 periods of 3.0, decay 0.8, `normalize = true`.
    //
    // Expect
    // ------
    // - Last value ≈ 3.0.
    fn normalized_adstock_keeps_steady_state_level() {
        // Arrange
        let x = Array2::from_elem((200, 1), 3.0);

        // Act
        let c = GeometricAdstock::default().normalized().transform(&x, &decay(0.8)).unwrap();

        // Assert
        assert_relative_eq!(c[[199, 0]], 3.0, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // The strict flag turns a changed horizon into a data error; the default
    // policy accepts it.
    //
    // Given
    // -----
    // - Fitted on labels 0..10, asked for 0..15.
    //
    // Expect
    // ------
    // - `HorizonDrift` when strict, Ok otherwise.
    fn strict_flag_rejects_horizon_drift() {
        // Arrange
        let fit = TimeIndex::range(0, 10).unwrap();
        let longer = TimeIndex::range(0, 15).unwrap();
        let mut strict = GeometricAdstock::default().strict();
        let mut lenient = GeometricAdstock::default();
        strict.initialize(&fit);
        lenient.initialize(&fit);

        // Act / Assert
        assert!(strict.check_horizon("tv", &fit).is_ok());
        assert!(matches!(
            strict.check_horizon("tv", &longer),
            Err(EffectError::HorizonDrift { fit_len: 10, len: 15, .. })
        ));
        assert!(lenient.check_horizon("tv", &longer).is_ok());
    }
}
