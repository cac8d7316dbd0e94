//! pipeline — declaration, fitting and prediction of an effect model.
//!
//! Purpose
//! -------
//! Compose a trend and named effects into a validated dependency graph, fit
//! its parameters against a target series with an
//! [`InferenceEngine`](crate::inference::InferenceEngine), and predict with
//! a full per-effect [`Decomposition`].
//!
//! Key behaviors
//! -------------
//! - [`PipelineBuilder::build`] checks ids, references, cycles and column
//!   overlap before any data is seen.
//! - [`Pipeline::fit`] binds selectors and data-driven defaults to the
//!   training frame and returns an immutable [`FittedPipeline`].
//! - [`FittedPipeline::predict`] evaluates every draw and recomposes the mean
//!   from its parts.
//! - [`Pipeline::reconfigured`] and [`PipelineSpec`] provide flat overrides
//!   and a JSON description.
//!
//! Conventions
//! -----------
//! - Effects evaluate in normalized target units; decompositions report raw
//!   units except for multiplicative effects, which stay dimensionless.
//! - The trend is addressed as `"trend"`, the likelihood as `"likelihood"`.

pub mod builder;
pub mod decomposition;
pub mod errors;
pub mod graph;
pub mod likelihood;
pub mod model;
pub mod overrides;
pub mod spec;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::builder::{EffectNode, Pipeline, PipelineBuilder, RESERVED_IDS};
pub use self::decomposition::{Decomposition, MEAN_ID, OBS_ID};
pub use self::errors::{PipelineError, PipelineResult};
pub use self::graph::{TREND_ID, evaluation_order};
pub use self::likelihood::{LIKELIHOOD_ID, LikelihoodFamily, NoiseScale, TargetLikelihood};
pub use self::model::{BoundNode, BoundPipeline, FittedPipeline, ModelDensity, PreparedInputs, TrainingData};
pub use self::overrides::Overrides;
pub use self::spec::PipelineSpec;

pub mod prelude {
    pub use super::builder::{EffectNode, Pipeline};
    pub use super::decomposition::Decomposition;
    pub use super::errors::{PipelineError, PipelineResult};
    pub use super::likelihood::TargetLikelihood;
    pub use super::model::FittedPipeline;
    pub use super::spec::PipelineSpec;
}
