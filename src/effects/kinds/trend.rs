//! Trend component: flat, linear or piecewise-linear in normalized time.
//!
//! Time is `t̃ = (t - t_origin) / t_span`, so the training range maps to
//! `[0, 1]`. The piecewise form is continuous:
//! `offset + slope·t̃ + Σ_j δ_j · max(t̃ - c_j, 0)`, with changepoints `c_j`
//! spread evenly over the first `changepoint_range` of the training range and
//! `δ_j ~ Laplace(0, changepoint_prior_scale)`.
//!
//! Level/offset priors default to `Normal(mean(ỹ), 1)` where `ỹ` is the
//! normalized training target, resolved once at `initialize`.
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::effects::core::{
    ConfigValue, EffectParams, ParamSpec, Prepared, Prior, ScaleFactors, TargetSeries, TimeIndex,
};
use crate::effects::errors::{EffectError, EffectResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum TrendShape {
    Flat,
    Linear,
    PiecewiseLinear { n_changepoints: usize, changepoint_range: f64, changepoint_prior_scale: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendEffect {
    pub shape: TrendShape,
    #[serde(default)]
    pub level_prior: Option<Prior>,
    #[serde(default)]
    pub slope_prior: Option<Prior>,
    #[serde(skip)]
    fitted: Option<FittedTrend>,
}

#[derive(Debug, Clone, PartialEq)]
struct FittedTrend {
    level_prior: Prior,
    slope_prior: Prior,
    changepoints: Vec<f64>,
}

impl TrendEffect {
    pub fn flat() -> Self {
        Self::with_shape(TrendShape::Flat)
    }

    pub fn linear() -> Self {
        Self::with_shape(TrendShape::Linear)
    }

    pub fn piecewise_linear(n_changepoints: usize, changepoint_range: f64, prior_scale: f64) -> Self {
        Self::with_shape(TrendShape::PiecewiseLinear {
            n_changepoints,
            changepoint_range,
            changepoint_prior_scale: prior_scale,
        })
    }

    fn with_shape(shape: TrendShape) -> Self {
        Self { shape, level_prior: None, slope_prior: None, fitted: None }
    }

    pub fn with_level_prior(mut self, prior: Prior) -> Self {
        self.level_prior = Some(prior);
        self
    }

    pub fn with_slope_prior(mut self, prior: Prior) -> Self {
        self.slope_prior = Some(prior);
        self
    }

    pub fn validate(&self, effect: &str) -> EffectResult<()> {
        for p in self.level_prior.iter().chain(self.slope_prior.iter()) {
            p.validate()?;
        }
        if let TrendShape::PiecewiseLinear { changepoint_range, changepoint_prior_scale, .. } =
            self.shape
        {
            if !(changepoint_range > 0.0 && changepoint_range <= 1.0) {
                return Err(invalid(effect, "changepoint_range", "must lie in (0, 1]"));
            }
            if !(changepoint_prior_scale.is_finite() && changepoint_prior_scale > 0.0) {
                return Err(invalid(effect, "changepoint_prior_scale", "must be positive"));
            }
        }
        Ok(())
    }

    /// Resolve data-driven default priors and changepoint locations.
    pub fn initialize(&mut self, target: &TargetSeries, scale: &ScaleFactors) -> EffectResult<()> {
        let mean = target.values().mean().unwrap_or(0.0) / scale.y_scale;
        let level_prior = match self.level_prior {
            Some(p) => p,
            None => Prior::normal(mean, 1.0)?,
        };
        let slope_prior = match self.slope_prior {
            Some(p) => p,
            None => Prior::normal(0.0, 1.0)?,
        };
        let changepoints = match self.shape {
            TrendShape::PiecewiseLinear { n_changepoints, changepoint_range, .. } => (0
                ..n_changepoints)
                .map(|j| changepoint_range * (j + 1) as f64 / (n_changepoints + 1) as f64)
                .collect(),
            _ => Vec::new(),
        };
        self.fitted = Some(FittedTrend { level_prior, slope_prior, changepoints });
        Ok(())
    }

    fn state(&self, effect: &str) -> EffectResult<&FittedTrend> {
        self.fitted.as_ref().ok_or_else(|| EffectError::NotInitialized { effect: effect.to_string() })
    }

    pub fn param_specs(&self, effect: &str) -> EffectResult<Vec<ParamSpec>> {
        let state = self.state(effect)?;
        let mut specs = vec![ParamSpec::scalar("level", state.level_prior)];
        match self.shape {
            TrendShape::Flat => {}
            TrendShape::Linear => specs.push(ParamSpec::scalar("slope", state.slope_prior)),
            TrendShape::PiecewiseLinear { n_changepoints, changepoint_prior_scale, .. } => {
                specs.push(ParamSpec::scalar("slope", state.slope_prior));
                if n_changepoints > 0 {
                    specs.push(ParamSpec::vector(
                        "deltas",
                        Prior::laplace(0.0, changepoint_prior_scale)?,
                        n_changepoints,
                    ));
                }
            }
        }
        Ok(specs)
    }

    /// One column of normalized time.
    pub fn prepare(&self, index: &TimeIndex, scale: &ScaleFactors) -> Prepared {
        let t = Array1::from(scale.normalized_times(index));
        let inputs = t.insert_axis(ndarray::Axis(1));
        Prepared { index: index.clone(), inputs }
    }

    pub fn apply(
        &self, effect: &str, prepared: &Prepared, params: &EffectParams,
    ) -> EffectResult<Array1<f64>> {
        let t = prepared.inputs.column(0);
        let level = params.scalar("level")?;
        match self.shape {
            TrendShape::Flat => Ok(Array1::from_elem(t.len(), level)),
            TrendShape::Linear => {
                let slope = params.scalar("slope")?;
                Ok(t.mapv(|x| level + slope * x))
            }
            TrendShape::PiecewiseLinear { n_changepoints, .. } => {
                let slope = params.scalar("slope")?;
                let state = self.state(effect)?;
                let mut out = t.mapv(|x| level + slope * x);
                if n_changepoints > 0 {
                    let deltas = params.get("deltas")?;
                    let hinge = hinge_matrix(&t.to_owned(), &state.changepoints);
                    out += &hinge.dot(deltas);
                }
                Ok(out)
            }
        }
    }

    pub fn set_option(&mut self, effect: &str, option: &str, value: &ConfigValue) -> EffectResult<()> {
        match option {
            "level_prior" => self.level_prior = Some(value.as_prior(effect, option)?),
            "slope_prior" => self.slope_prior = Some(value.as_prior(effect, option)?),
            "n_changepoints" | "changepoint_range" | "changepoint_prior_scale" => {
                let TrendShape::PiecewiseLinear {
                    n_changepoints,
                    changepoint_range,
                    changepoint_prior_scale,
                } = &mut self.shape
                else {
                    return Err(EffectError::UnknownOption { kind: "trend", option: option.into() });
                };
                match option {
                    "n_changepoints" => *n_changepoints = value.as_count(effect, option)?,
                    "changepoint_range" => *changepoint_range = value.as_positive(effect, option)?,
                    _ => *changepoint_prior_scale = value.as_positive(effect, option)?,
                }
            }
            _ => return Err(EffectError::UnknownOption { kind: "trend", option: option.into() }),
        }
        self.fitted = None;
        self.validate(effect)
    }
}

/// `H[t, j] = max(t̃_t - c_j, 0)`.
fn hinge_matrix(t: &Array1<f64>, changepoints: &[f64]) -> Array2<f64> {
    Array2::from_shape_fn((t.len(), changepoints.len()), |(i, j)| (t[i] - changepoints[j]).max(0.0))
}

fn invalid(effect: &str, option: &str, reason: &str) -> EffectError {
    EffectError::InvalidOption {
        effect: effect.to_string(),
        option: option.to_string(),
        reason: reason.to_string(),
    }
}
