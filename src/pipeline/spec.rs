//! Declarative pipeline description in JSON.
//!
//! A [`PipelineSpec`] is the serializable form of a [`Pipeline`] plus an
//! optional override table applied after construction. Building a spec runs
//! the same validation as the programmatic builder.
use serde::{Deserialize, Serialize};

use crate::effects::kinds::TrendEffect;
use crate::pipeline::builder::{EffectNode, Pipeline};
use crate::pipeline::errors::PipelineResult;
use crate::pipeline::likelihood::TargetLikelihood;
use crate::pipeline::overrides::Overrides;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub trend: TrendEffect,
    #[serde(default)]
    pub effects: Vec<EffectNode>,
    #[serde(default)]
    pub likelihood: TargetLikelihood,
    #[serde(default = "default_true")]
    pub scale_target: bool,
    #[serde(default)]
    pub exclusive_columns: bool,
    #[serde(default, skip_serializing_if = "Overrides::is_empty")]
    pub overrides: Overrides,
}

impl PipelineSpec {
    /// # Errors
    /// [`PipelineError::Spec`](super::PipelineError::Spec) for malformed JSON
    /// or unknown effect kinds.
    pub fn from_json(text: &str) -> PipelineResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> PipelineResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Build the declared pipeline, then apply `overrides`.
    pub fn build(&self) -> PipelineResult<Pipeline> {
        let mut builder = Pipeline::builder()
            .with_trend(self.trend.clone())
            .with_likelihood(self.likelihood)
            .scale_target(self.scale_target)
            .exclusive_columns(self.exclusive_columns);
        for node in &self.effects {
            builder = builder.with_effect(node.clone());
        }
        let pipeline = builder.build()?;
        if self.overrides.is_empty() {
            Ok(pipeline)
        } else {
            pipeline.reconfigured(&self.overrides)
        }
    }
}

impl Pipeline {
    /// Serializable form of this pipeline, without overrides.
    pub fn to_spec(&self) -> PipelineSpec {
        PipelineSpec {
            trend: self.trend().clone(),
            effects: self.nodes().to_vec(),
            likelihood: *self.likelihood(),
            scale_target: self.scale_target(),
            exclusive_columns: self.exclusive_columns(),
            overrides: Overrides::new(),
        }
    }

    pub fn from_json(text: &str) -> PipelineResult<Self> {
        PipelineSpec::from_json(text)?.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::core::Prior;
    use crate::effects::effect::Effect;
    use crate::pipeline::errors::PipelineError;
    use crate::pipeline::likelihood::NoiseScale;

    const SPEC: &str = r#"{
        "trend": { "shape": { "shape": "linear" } },
        "effects": [
            {
                "id": "media",
                "effect": {
                    "kind": "chained",
                    "steps": [
                        { "name": "adstock", "effect": { "kind": "adstock" } },
                        { "name": "saturation", "effect": { "kind": "saturation" } }
                    ]
                },
                "selector": { "select": "names", "value": ["tv"] }
            }
        ],
        "likelihood": { "family": { "family": "normal" }, "noise": { "fixed": 0.1 } },
        "overrides": {
            "media.adstock.decay_prior": { "dist": "beta", "alpha": 3.0, "beta": 1.0 }
        }
    }"#;

    #[test]
    // Purpose
    // -------
    // A JSON description builds a validated pipeline with overrides applied.
    //
    // Given
    // -----
    // - A linear trend, one chained media node and one prior override.
    //
    // Expect
    // ------
    // - One node, fixed noise 0.1, adstock decay prior Beta(3, 1), scaling on.
    fn json_builds_pipeline_with_overrides() {
        // Act
        let pipeline = Pipeline::from_json(SPEC).unwrap();

        // Assert
        assert_eq!(pipeline.nodes().len(), 1);
        assert!(pipeline.scale_target());
        assert_eq!(pipeline.likelihood().noise, NoiseScale::Fixed(0.1));
        let Effect::Chained(chain) = &pipeline.nodes()[0].effect else {
            panic!("expected a chained effect");
        };
        let Effect::Adstock(adstock) = &chain.steps[0].effect else {
            panic!("expected an adstock step");
        };
        assert_eq!(adstock.decay_prior, Prior::Beta { alpha: 3.0, beta: 1.0 });
    }

    #[test]
    // Purpose
    // -------
    // `to_spec` survives a JSON round trip.
    //
    // Given
    // -----
    // - The pipeline built from the sample description.
    //
    // Expect
    // ------
    // - Serializing and rebuilding yields an equal pipeline.
    fn to_spec_round_trips() {
        // Arrange
        let pipeline = Pipeline::from_json(SPEC).unwrap();

        // Act
        let text = pipeline.to_spec().to_json().unwrap();
        let rebuilt = Pipeline::from_json(&text).unwrap();

        // Assert
        assert_eq!(rebuilt, pipeline);
    }

    #[test]
    // Purpose
    // -------
    // Unknown effect kinds and broken references are reported.
    //
    // Given
    // -----
    // - A node of kind "wavelet"; a node depending on "ghost".
    //
    // Expect
    // ------
    // - `Spec` and `UnknownDependency` respectively.
    fn invalid_descriptions_are_rejected() {
        // Arrange
        let unknown_kind = r#"{ "trend": { "shape": { "shape": "flat" } },
            "effects": [ { "id": "w", "effect": { "kind": "wavelet" } } ] }"#;
        let bad_dep = r#"{ "trend": { "shape": { "shape": "flat" } },
            "effects": [ { "id": "s", "effect": { "kind": "saturation" },
                           "selector": { "select": "names", "value": ["tv"] },
                           "depends_on": ["ghost"] } ] }"#;

        // Act
        let kind = Pipeline::from_json(unknown_kind);
        let dep = Pipeline::from_json(bad_dep);

        // Assert
        assert!(matches!(kind, Err(PipelineError::Spec { .. })));
        assert!(matches!(dep, Err(PipelineError::UnknownDependency { .. })));
    }
}
