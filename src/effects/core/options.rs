//! Typed values for flat `"<effect_id>.<option>"` overrides.
use serde::{Deserialize, Serialize};

use crate::effects::core::priors::Prior;
use crate::effects::errors::{EffectError, EffectResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Prior(Prior),
}

impl ConfigValue {
    pub fn as_float(&self, effect: &str, option: &str) -> EffectResult<f64> {
        match *self {
            ConfigValue::Float(v) if v.is_finite() => Ok(v),
            ConfigValue::Int(v) => Ok(v as f64),
            _ => Err(mismatch(effect, option, "expected a finite number")),
        }
    }

    pub fn as_positive(&self, effect: &str, option: &str) -> EffectResult<f64> {
        let v = self.as_float(effect, option)?;
        if v <= 0.0 {
            return Err(mismatch(effect, option, "expected a positive number"));
        }
        Ok(v)
    }

    pub fn as_bool(&self, effect: &str, option: &str) -> EffectResult<bool> {
        match *self {
            ConfigValue::Bool(b) => Ok(b),
            _ => Err(mismatch(effect, option, "expected a boolean")),
        }
    }

    pub fn as_count(&self, effect: &str, option: &str) -> EffectResult<usize> {
        match *self {
            ConfigValue::Int(v) if v > 0 => Ok(v as usize),
            _ => Err(mismatch(effect, option, "expected a positive integer")),
        }
    }

    pub fn as_prior(&self, effect: &str, option: &str) -> EffectResult<Prior> {
        match self {
            ConfigValue::Prior(p) => {
                p.validate()?;
                Ok(*p)
            }
            _ => Err(mismatch(effect, option, "expected a prior")),
        }
    }
}

fn mismatch(effect: &str, option: &str, reason: &str) -> EffectError {
    EffectError::InvalidOption {
        effect: effect.to_string(),
        option: option.to_string(),
        reason: reason.to_string(),
    }
}
