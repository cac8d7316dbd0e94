//! effects::core — containers, selectors, priors, parameter layout and the
//! normalization constants shared by every effect.

pub mod data;
pub mod options;
pub mod params;
pub mod priors;
pub mod scale;
pub mod selector;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use self::data::{ExogFrame, TargetSeries, TimeIndex};
pub use self::options::ConfigValue;
pub use self::params::{EffectParams, LayoutEntry, ParamLayout, ParamSet, ParamSpec};
pub use self::priors::{Prior, Support};
pub use self::scale::ScaleFactors;
pub use self::selector::ColumnSelector;

/// How a contribution folds into the running mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationMode {
    /// `mean += c`
    Additive,
    /// `mean *= 1 + c`
    Multiplicative,
}

impl ApplicationMode {
    pub fn fold(self, mean: &mut Array1<f64>, contribution: &Array1<f64>) {
        match self {
            ApplicationMode::Additive => *mean += contribution,
            ApplicationMode::Multiplicative => {
                mean.zip_mut_with(contribution, |m, c| *m *= 1.0 + c)
            }
        }
    }
}

/// Transformed inputs of one effect over one horizon.
///
/// `inputs` is `T × k`: the selected raw columns for input-driven effects,
/// or derived time features for trend and seasonality.
#[derive(Debug, Clone, PartialEq)]
pub struct Prepared {
    pub index: TimeIndex,
    pub inputs: Array2<f64>,
}

/// Partial decomposition visible to an effect: contributions of the ids it
/// depends on, in normalized units.
pub type Upstream = BTreeMap<String, Array1<f64>>;
