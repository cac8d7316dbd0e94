//! Chained effect: named column-wise steps applied in sequence.
//!
//! Step `i`'s `T × k` output is step `i + 1`'s input; the contribution is the
//! row sum of the last step's output. Step parameters are exposed under
//! `step/param` and the chain adds none of its own.
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::effects::core::{ConfigValue, EffectParams, ParamSpec, TimeIndex};
use crate::effects::effect::Effect;
use crate::effects::errors::{EffectError, EffectResult};
use crate::effects::kinds::ColumnTransform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStep {
    pub name: String,
    pub effect: Effect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainedEffect {
    pub steps: Vec<ChainStep>,
}

impl ChainedEffect {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn then(mut self, name: impl Into<String>, effect: Effect) -> Self {
        self.steps.push(ChainStep { name: name.into(), effect });
        self
    }

    pub fn validate(&self) -> EffectResult<()> {
        if self.steps.is_empty() {
            return Err(EffectError::EmptyChain);
        }
        let mut seen = BTreeSet::new();
        for step in &self.steps {
            if !seen.insert(step.name.as_str()) {
                return Err(EffectError::DuplicateStep { step: step.name.clone() });
            }
            if matches!(step.effect, Effect::Chained(_)) || step.effect.as_transform().is_none() {
                return Err(EffectError::InvalidChainStep {
                    step: step.name.clone(),
                    kind: step.effect.kind_name(),
                });
            }
            step.effect.validate(&step.name)?;
        }
        Ok(())
    }

    pub fn initialize(&mut self, index: &TimeIndex) {
        for step in &mut self.steps {
            if let Effect::Adstock(adstock) = &mut step.effect {
                adstock.initialize(index);
            }
        }
    }

    pub fn check_horizon(&self, effect: &str, index: &TimeIndex) -> EffectResult<()> {
        for step in &self.steps {
            if let Effect::Adstock(adstock) = &step.effect {
                adstock.check_horizon(&format!("{effect}.{}", step.name), index)?;
            }
        }
        Ok(())
    }

    /// Routes `"<step>.<option>"` to the named step.
    pub fn set_option(&mut self, effect: &str, option: &str, value: &ConfigValue) -> EffectResult<()> {
        let Some((step_name, step_option)) = option.split_once('.') else {
            return Err(EffectError::UnknownOption { kind: "chained", option: option.into() });
        };
        let step = self
            .steps
            .iter_mut()
            .find(|s| s.name == step_name)
            .ok_or_else(|| EffectError::UnknownOption { kind: "chained", option: option.into() })?;
        step.effect.set_option(&format!("{effect}.{step_name}"), step_option, value)
    }

    fn step_transform(step: &ChainStep) -> EffectResult<&dyn ColumnTransform> {
        step.effect.as_transform().ok_or_else(|| EffectError::InvalidChainStep {
            step: step.name.clone(),
            kind: step.effect.kind_name(),
        })
    }
}

impl Default for ChainedEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnTransform for ChainedEffect {
    fn param_specs(&self, n_cols: usize) -> Vec<ParamSpec> {
        self.steps
            .iter()
            .filter_map(|step| step.effect.as_transform().map(|t| (step, t)))
            .flat_map(|(step, t)| {
                t.param_specs(n_cols).into_iter().map(|spec| spec.namespaced(&step.name)).collect::<Vec<_>>()
            })
            .collect()
    }

    fn transform(&self, x: &Array2<f64>, params: &EffectParams) -> EffectResult<Array2<f64>> {
        let mut current = x.clone();
        for step in &self.steps {
            let transform = Self::step_transform(step)?;
            current = transform.transform(&current, &params.child(&step.name))?;
        }
        Ok(current)
    }
}
