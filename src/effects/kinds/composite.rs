//! Composite effect: an inner effect combined with an upstream component.
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::effects::core::{ConfigValue, Upstream};
use crate::effects::effect::Effect;
use crate::effects::errors::{EffectError, EffectResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// `inner · upstream[base]`
    Multiply,
    /// `inner + upstream[base]`
    Add,
}

/// `contribution = inner ∘ upstream[base]`. The base is referred to by id
/// and must be a declared dependency of the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeEffect {
    pub inner: Box<Effect>,
    pub base: String,
    pub combinator: Combinator,
}

impl CompositeEffect {
    pub fn new(inner: Effect, base: impl Into<String>, combinator: Combinator) -> Self {
        Self { inner: Box::new(inner), base: base.into(), combinator }
    }

    pub fn validate(&self, effect: &str) -> EffectResult<()> {
        match self.inner.as_ref() {
            Effect::Trend(_)
            | Effect::Composite(_)
            | Effect::LiftTest(_)
            | Effect::ExactAttribution(_) => Err(EffectError::InvalidWrappedEffect {
                effect: effect.to_string(),
                kind: self.inner.kind_name(),
            }),
            inner => inner.validate(effect),
        }
    }

    pub fn combine(
        &self, effect: &str, inner: Array1<f64>, upstream: &Upstream,
    ) -> EffectResult<Array1<f64>> {
        let base = upstream.get(&self.base).ok_or_else(|| EffectError::MissingUpstream {
            effect: effect.to_string(),
            base: self.base.clone(),
        })?;
        if base.len() != inner.len() {
            return Err(EffectError::ShapeMismatch {
                context: "composite base",
                expected: inner.len(),
                found: base.len(),
            });
        }
        Ok(match self.combinator {
            Combinator::Multiply => inner * base,
            Combinator::Add => inner + base,
        })
    }

    pub fn set_option(&mut self, effect: &str, option: &str, value: &ConfigValue) -> EffectResult<()> {
        self.inner.set_option(effect, option, value)
    }
}
