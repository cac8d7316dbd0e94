//! Flat key → value overrides applied to a built pipeline.
//!
//! Keys are `"<effect_id>.<option>"`; options of a chained step are
//! `"<effect_id>.<step>.<option>"`. The trend and the likelihood are addressed
//! as `"trend.<option>"` and `"likelihood.<option>"`. Every key must land on
//! a known option of a known owner.
use std::collections::BTreeMap;
use tracing::debug;

use crate::effects::core::ConfigValue;
use crate::effects::errors::EffectError;
use crate::pipeline::builder::Pipeline;
use crate::pipeline::errors::{PipelineError, PipelineResult};
use crate::pipeline::graph::TREND_ID;
use crate::pipeline::likelihood::LIKELIHOOD_ID;

pub type Overrides = BTreeMap<String, ConfigValue>;

impl Pipeline {
    /// A copy of this pipeline with `overrides` applied and every structural
    /// rule re-checked.
    ///
    /// # Errors
    /// - [`PipelineError::UnknownOverrideKey`] for a malformed key, an
    ///   unknown owner or an option the owner does not have.
    /// - [`PipelineError::InvalidOverride`] for a value of the wrong type or
    ///   out of range.
    /// - Any error [`PipelineBuilder::build`](super::PipelineBuilder::build)
    ///   raises on the modified declaration.
    pub fn reconfigured(&self, overrides: &Overrides) -> PipelineResult<Pipeline> {
        let mut trend = self.trend().clone();
        let mut nodes = self.nodes().to_vec();
        let mut likelihood = *self.likelihood();

        for (key, value) in overrides {
            let Some((owner, option)) = key.split_once('.') else {
                return Err(PipelineError::UnknownOverrideKey { key: key.clone() });
            };
            let applied = match owner {
                TREND_ID => trend.set_option(TREND_ID, option, value),
                LIKELIHOOD_ID => likelihood.set_option(option, value),
                id => match nodes.iter_mut().find(|n| n.id == id) {
                    Some(node) => node.effect.set_option(id, option, value),
                    None => return Err(PipelineError::UnknownOverrideKey { key: key.clone() }),
                },
            };
            applied.map_err(|err| classify(key, err))?;
            debug!(key = %key, value = ?value, "override applied");
        }

        let mut builder = Pipeline::builder()
            .with_trend(trend)
            .with_likelihood(likelihood)
            .scale_target(self.scale_target())
            .exclusive_columns(self.exclusive_columns());
        for node in nodes {
            builder = builder.with_effect(node);
        }
        builder.build()
    }
}

fn classify(key: &str, err: EffectError) -> PipelineError {
    match err {
        EffectError::UnknownOption { .. } => PipelineError::UnknownOverrideKey { key: key.to_string() },
        EffectError::InvalidOption { reason, .. } => {
            PipelineError::InvalidOverride { key: key.to_string(), reason }
        }
        other => PipelineError::InvalidOverride { key: key.to_string(), reason: other.to_string() },
    }
}
