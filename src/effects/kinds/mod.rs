//! effects::kinds — concrete effect implementations.
//!
//! Trend and seasonality derive their inputs from the time index. Linear,
//! log, adstock and saturation are column-wise transforms over the selected
//! exogenous columns and share the [`ColumnTransform`] seam, which is what
//! chained effects compose and what lift tests measure. Composite, lift-test
//! and exact-attribution effects wrap another effect.

pub mod adstock;
pub mod attribution;
pub mod chained;
pub mod composite;
pub mod lift;
pub mod linear;
pub mod log;
pub mod saturation;
pub mod seasonality;
pub mod trend;

use ndarray::{Array1, Array2, Axis};

use crate::effects::core::{EffectParams, ParamSpec};
use crate::effects::errors::EffectResult;

pub use self::adstock::GeometricAdstock;
pub use self::attribution::ExactAttributionLikelihood;
pub use self::chained::{ChainStep, ChainedEffect};
pub use self::composite::{Combinator, CompositeEffect};
pub use self::lift::{LiftObservation, LiftTestLikelihood};
pub use self::linear::LinearEffect;
pub use self::log::LogEffect;
pub use self::saturation::HillSaturation;
pub use self::seasonality::FourierSeasonality;
pub use self::trend::{TrendEffect, TrendShape};

/// A transform that maps a `T × k` input matrix to a `T × k` output matrix.
pub trait ColumnTransform {
    fn param_specs(&self, n_cols: usize) -> Vec<ParamSpec>;

    fn transform(&self, x: &Array2<f64>, params: &EffectParams) -> EffectResult<Array2<f64>>;

    /// Row sum of [`ColumnTransform::transform`].
    fn contribution(&self, x: &Array2<f64>, params: &EffectParams) -> EffectResult<Array1<f64>> {
        Ok(self.transform(x, params)?.sum_axis(Axis(1)))
    }
}
