//! effects — building blocks of a decomposition pipeline.
//!
//! - [`core`]: data containers, selectors, priors, parameter layout and
//!   normalization constants.
//! - [`kinds`]: concrete effects.
//! - [`effect`]: the closed [`Effect`](effect::Effect) variant that the
//!   pipeline drives.
//! - [`errors`]: configuration and data errors.

pub mod core;
pub mod effect;
pub mod errors;
pub mod kinds;

pub mod prelude {
    pub use super::core::{
        ApplicationMode, ColumnSelector, ConfigValue, EffectParams, ExogFrame, ParamLayout,
        ParamSet, ParamSpec, Prior, ScaleFactors, Support, TargetSeries, TimeIndex,
    };
    pub use super::effect::Effect;
    pub use super::errors::{EffectError, EffectResult};
    pub use super::kinds::{
        ChainedEffect, Combinator, CompositeEffect, ExactAttributionLikelihood,
        FourierSeasonality, GeometricAdstock, HillSaturation, LiftObservation, LiftTestLikelihood,
        LinearEffect, LogEffect, TrendEffect, TrendShape,
    };
}
