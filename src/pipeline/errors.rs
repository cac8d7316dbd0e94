//! Errors raised while building, reconfiguring, binding and fitting a
//! pipeline.
//!
//! Construction problems (duplicate or reserved ids, dependency cycles,
//! unknown references, overlapping selections) are reported by
//! [`PipelineBuilder::build`](super::PipelineBuilder::build) before any data is
//! seen. Effect-level data errors and inference failures are wrapped so that
//! every pipeline entry point returns [`PipelineResult<T>`].
use thiserror::Error;

use crate::effects::errors::EffectError;
use crate::inference::errors::InferenceError;
use crate::optimization::errors::OptError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    // ---- Construction ----
    #[error("Duplicate effect id '{id}'")]
    DuplicateId { id: String },

    #[error("Effect id '{id}' is reserved")]
    ReservedId { id: String },

    #[error("Pipeline has no trend")]
    MissingTrend,

    #[error("Effect '{id}' is a trend; the pipeline trend is set with `with_trend`")]
    DuplicateTrend { id: String },

    #[error("Pipeline has no target likelihood")]
    MissingLikelihood,

    #[error("Effect '{effect}' depends on undeclared id '{dependency}'")]
    UnknownDependency { effect: String, dependency: String },

    #[error("Composite effect '{effect}' refers to undeclared base '{base}'")]
    UnknownBase { effect: String, base: String },

    #[error("Dependency cycle among effects: {}", ids.join(", "))]
    Cycle { ids: Vec<String> },

    #[error("Column '{column}' is selected by both '{first}' and '{second}'")]
    OverlappingSelectors { column: String, first: String, second: String },

    // ---- Overrides & declarative specs ----
    #[error("Unknown override key '{key}'")]
    UnknownOverrideKey { key: String },

    #[error("Invalid override '{key}': {reason}")]
    InvalidOverride { key: String, reason: String },

    #[error("Invalid pipeline spec: {text}")]
    Spec { text: String },

    // ---- Data ----
    #[error("Index mismatch in {context}: {reason}")]
    IndexMismatch { context: &'static str, reason: String },

    // ---- Wrapped ----
    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Optimization(#[from] OptError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Spec { text: err.to_string() }
    }
}
