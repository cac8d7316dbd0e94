//! effects::effect — the closed set of effect kinds and their lifecycle.
//!
//! Purpose
//! -------
//! [`Effect`] is a tagged variant over every concrete effect. The pipeline
//! drives each node through the same three phases:
//!
//! 1. `initialize` once against the training data (data-driven priors,
//!    frozen horizon, normalized augmentation data);
//! 2. `prepare` for a horizon, turning the node's selected columns into a
//!    [`Prepared`] input matrix (pure, no randomness);
//! 3. `apply` with constrained parameters and the upstream components the
//!    node depends on, producing a contribution in normalized units.
//!
//! `aux_log_density` adds the likelihood-augmentation term of lift-test and
//! exact-attribution effects and is zero for every other kind.
//!
//! Conventions
//! -----------
//! - Column-wise kinds (linear, log, adstock, saturation, chained) act on
//!   the `T × k` selection and contribute its row sum.
//! - Composite, lift-test and exact-attribution kinds wrap a child effect and
//!   expose the child's parameters unchanged.
//! - Every error carries the node id passed in as `id`.
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::effects::core::{
    ApplicationMode, ConfigValue, EffectParams, ParamSpec, Prepared, Prior, ScaleFactors,
    Support, TargetSeries, TimeIndex, Upstream,
};
use crate::effects::errors::{EffectError, EffectResult};
use crate::effects::kinds::{
    ChainedEffect, ColumnTransform, CompositeEffect, ExactAttributionLikelihood,
    FourierSeasonality, GeometricAdstock, HillSaturation, LiftTestLikelihood, LinearEffect,
    LogEffect, TrendEffect,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Effect {
    Trend(TrendEffect),
    Seasonality(FourierSeasonality),
    Linear(LinearEffect),
    Log(LogEffect),
    Adstock(GeometricAdstock),
    Saturation(HillSaturation),
    Chained(ChainedEffect),
    Composite(CompositeEffect),
    LiftTest(LiftTestLikelihood),
    ExactAttribution(ExactAttributionLikelihood),
}

impl Effect {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Effect::Trend(_) => "trend",
            Effect::Seasonality(_) => "seasonality",
            Effect::Linear(_) => "linear",
            Effect::Log(_) => "log",
            Effect::Adstock(_) => "adstock",
            Effect::Saturation(_) => "saturation",
            Effect::Chained(_) => "chained",
            Effect::Composite(_) => "composite",
            Effect::LiftTest(_) => "lift_test",
            Effect::ExactAttribution(_) => "exact_attribution",
        }
    }

    /// Log effects default to multiplicative application, wrappers inherit
    /// from their child, everything else is additive.
    pub fn default_mode(&self) -> ApplicationMode {
        match self {
            Effect::Log(_) => ApplicationMode::Multiplicative,
            Effect::Composite(c) => c.inner.default_mode(),
            Effect::LiftTest(l) => l.inner.default_mode(),
            Effect::ExactAttribution(e) => e.inner.default_mode(),
            _ => ApplicationMode::Additive,
        }
    }

    pub fn as_transform(&self) -> Option<&dyn ColumnTransform> {
        match self {
            Effect::Linear(e) => Some(e as &dyn ColumnTransform),
            Effect::Log(e) => Some(e as &dyn ColumnTransform),
            Effect::Adstock(e) => Some(e as &dyn ColumnTransform),
            Effect::Saturation(e) => Some(e as &dyn ColumnTransform),
            Effect::Chained(e) => Some(e as &dyn ColumnTransform),
            _ => None,
        }
    }

    /// Whether `prepare` consumes the node's selected columns.
    pub fn reads_columns(&self) -> bool {
        match self {
            Effect::Trend(_) | Effect::Seasonality(_) => false,
            Effect::Composite(c) => c.inner.reads_columns(),
            Effect::LiftTest(l) => l.inner.reads_columns(),
            Effect::ExactAttribution(e) => e.inner.reads_columns(),
            _ => true,
        }
    }

    /// Upstream id a composite (possibly wrapped) combines with.
    pub fn composite_base(&self) -> Option<&str> {
        match self {
            Effect::Composite(c) => Some(c.base.as_str()),
            Effect::ExactAttribution(e) => e.inner.composite_base(),
            _ => None,
        }
    }

    pub fn validate(&self, id: &str) -> EffectResult<()> {
        match self {
            Effect::Trend(t) => t.validate(id),
            Effect::Seasonality(s) => s.validate(id),
            Effect::Linear(l) => l.prior.validate(),
            Effect::Log(l) => {
                require_support(id, "scale_prior", &l.scale_prior, Support::Positive)?;
                require_support(id, "rate_prior", &l.rate_prior, Support::Positive)
            }
            Effect::Adstock(a) => {
                require_support(id, "decay_prior", &a.decay_prior, Support::UnitInterval)
            }
            Effect::Saturation(s) => {
                s.validate(id)?;
                require_support(id, "half_max_prior", &s.half_max_prior, Support::Positive)?;
                require_support(id, "slope_prior", &s.slope_prior, Support::Positive)?;
                require_support(id, "max_effect_prior", &s.max_effect_prior, Support::Positive)
            }
            Effect::Chained(c) => c.validate(),
            Effect::Composite(c) => c.validate(id),
            Effect::LiftTest(l) => l.validate(id),
            Effect::ExactAttribution(e) => e.validate(id),
        }
    }

    /// Bind to the training data. Idempotent for identical inputs.
    pub fn initialize(
        &mut self, id: &str, target: &TargetSeries, n_cols: usize, scale: &ScaleFactors,
    ) -> EffectResult<()> {
        let index = target.index();
        match self {
            Effect::Trend(t) => t.initialize(target, scale),
            Effect::Adstock(a) => {
                a.initialize(index);
                Ok(())
            }
            Effect::Chained(c) => {
                c.initialize(index);
                Ok(())
            }
            Effect::Composite(c) => c.inner.initialize(id, target, n_cols, scale),
            Effect::LiftTest(l) => {
                l.inner.initialize(id, target, n_cols, scale)?;
                l.initialize(id, index, n_cols, scale)
            }
            Effect::ExactAttribution(e) => {
                e.inner.initialize(id, target, n_cols, scale)?;
                e.initialize(id, index, scale)
            }
            Effect::Seasonality(_) | Effect::Linear(_) | Effect::Log(_) | Effect::Saturation(_) => {
                Ok(())
            }
        }
    }

    pub fn param_specs(&self, id: &str, n_cols: usize) -> EffectResult<Vec<ParamSpec>> {
        match self {
            Effect::Trend(t) => t.param_specs(id),
            Effect::Seasonality(s) => s.param_specs(),
            Effect::Composite(c) => c.inner.param_specs(id, n_cols),
            Effect::LiftTest(l) => l.inner.param_specs(id, n_cols),
            Effect::ExactAttribution(e) => e.inner.param_specs(id, n_cols),
            other => match other.as_transform() {
                Some(t) => Ok(t.param_specs(n_cols)),
                None => Ok(Vec::new()),
            },
        }
    }

    /// `inputs` holds the node's selected columns over `index`.
    pub fn prepare(
        &self, id: &str, inputs: Array2<f64>, index: &TimeIndex, scale: &ScaleFactors,
    ) -> EffectResult<Prepared> {
        if inputs.nrows() != index.len() {
            return Err(EffectError::ShapeMismatch {
                context: "effect inputs",
                expected: index.len(),
                found: inputs.nrows(),
            });
        }
        match self {
            Effect::Trend(t) => Ok(t.prepare(index, scale)),
            Effect::Seasonality(s) => Ok(s.prepare(index)),
            Effect::Composite(c) => c.inner.prepare(id, inputs, index, scale),
            Effect::LiftTest(l) => l.inner.prepare(id, inputs, index, scale),
            Effect::ExactAttribution(e) => e.inner.prepare(id, inputs, index, scale),
            Effect::Adstock(a) => {
                a.check_horizon(id, index)?;
                Ok(Prepared { index: index.clone(), inputs })
            }
            Effect::Chained(c) => {
                c.check_horizon(id, index)?;
                Ok(Prepared { index: index.clone(), inputs })
            }
            Effect::Linear(_) | Effect::Log(_) | Effect::Saturation(_) => {
                Ok(Prepared { index: index.clone(), inputs })
            }
        }
    }

    /// Contribution in normalized units.
    pub fn apply(
        &self, id: &str, prepared: &Prepared, upstream: &Upstream, params: &EffectParams,
    ) -> EffectResult<Array1<f64>> {
        match self {
            Effect::Trend(t) => t.apply(id, prepared, params),
            Effect::Seasonality(s) => s.apply(prepared, params),
            Effect::Composite(c) => {
                let inner = c.inner.apply(id, prepared, upstream, params)?;
                c.combine(id, inner, upstream)
            }
            Effect::LiftTest(l) => l.inner.apply(id, prepared, upstream, params),
            Effect::ExactAttribution(e) => e.inner.apply(id, prepared, upstream, params),
            other => match other.as_transform() {
                Some(t) => t.contribution(&prepared.inputs, params),
                None => Err(EffectError::InvalidWrappedEffect { effect: id.to_string(), kind: other.kind_name() }),
            },
        }
    }

    /// Likelihood-augmentation term; zero for ordinary effects.
    pub fn aux_log_density(
        &self, id: &str, prepared: &Prepared, params: &EffectParams, contribution: &Array1<f64>,
    ) -> EffectResult<f64> {
        match self {
            Effect::LiftTest(l) => l.aux_log_density(id, prepared, params),
            Effect::ExactAttribution(e) => e.aux_log_density(id, &prepared.index, contribution),
            _ => Ok(0.0),
        }
    }

    pub fn set_option(&mut self, id: &str, option: &str, value: &ConfigValue) -> EffectResult<()> {
        match self {
            Effect::Trend(t) => t.set_option(id, option, value)?,
            Effect::Seasonality(s) => s.set_option(id, option, value)?,
            Effect::Linear(l) => l.set_option(id, option, value)?,
            Effect::Log(l) => l.set_option(id, option, value)?,
            Effect::Adstock(a) => a.set_option(id, option, value)?,
            Effect::Saturation(s) => s.set_option(id, option, value)?,
            Effect::Chained(c) => c.set_option(id, option, value)?,
            Effect::Composite(c) => c.set_option(id, option, value)?,
            Effect::LiftTest(l) => l.set_option(id, option, value)?,
            Effect::ExactAttribution(e) => e.set_option(id, option, value)?,
        }
        self.validate(id)
    }
}

fn require_support(id: &str, option: &str, prior: &Prior, support: Support) -> EffectResult<()> {
    prior.validate()?;
    if prior.support() != support {
        return Err(EffectError::InvalidOption {
            effect: id.to_string(),
            option: option.to_string(),
            reason: format!("prior support must be {support:?}, got {:?}", prior.support()),
        });
    }
    Ok(())
}

impl From<TrendEffect> for Effect {
    fn from(value: TrendEffect) -> Self {
        Effect::Trend(value)
    }
}

impl From<FourierSeasonality> for Effect {
    fn from(value: FourierSeasonality) -> Self {
        Effect::Seasonality(value)
    }
}

impl From<LinearEffect> for Effect {
    fn from(value: LinearEffect) -> Self {
        Effect::Linear(value)
    }
}

impl From<LogEffect> for Effect {
    fn from(value: LogEffect) -> Self {
        Effect::Log(value)
    }
}

impl From<GeometricAdstock> for Effect {
    fn from(value: GeometricAdstock) -> Self {
        Effect::Adstock(value)
    }
}

impl From<HillSaturation> for Effect {
    fn from(value: HillSaturation) -> Self {
        Effect::Saturation(value)
    }
}

impl From<ChainedEffect> for Effect {
    fn from(value: ChainedEffect) -> Self {
        Effect::Chained(value)
    }
}

impl From<CompositeEffect> for Effect {
    fn from(value: CompositeEffect) -> Self {
        Effect::Composite(value)
    }
}

impl From<LiftTestLikelihood> for Effect {
    fn from(value: LiftTestLikelihood) -> Self {
        Effect::LiftTest(value)
    }
}

impl From<ExactAttributionLikelihood> for Effect {
    fn from(value: ExactAttributionLikelihood) -> Self {
        Effect::ExactAttribution(value)
    }
}
