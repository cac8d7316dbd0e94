//! Decision-variable transforms: unconstrained `z` ↦ allocation matrix.
//!
//! An allocation is `channels × periods` spend over the decision horizon.
//! Every transform maps onto non-negative spend, so the solver never sees a
//! bound constraint.
//!
//! - `PerChannel`: one softplus total per channel, spread over the horizon by
//!   the baseline pattern.
//! - `TotalSplit`: one softplus total split across channels by fixed ratios,
//!   then spread by the baseline pattern.
//! - `PerChannelPerPeriod`: one softplus value per cell.
//! - `Identity`: `max(z, 0)` per cell.
//!
//! [`AllocationSpace::project`] keeps `z` above the point where the
//! transform flattens out, so a solver restarted from a projected iterate
//! always sees a usable gradient.
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::budget::errors::{BudgetError, BudgetResult};
use crate::optimization::numerical_stability::{safe_softplus, safe_softplus_inv};

/// Smallest spend per decision variable, as a fraction of its baseline
/// share, that [`AllocationSpace::project`] lets `z` reach.
const MIN_SPEND_FRACTION: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Parametrization {
    #[default]
    PerChannel,
    TotalSplit {
        ratios: Vec<f64>,
    },
    PerChannelPerPeriod,
    Identity,
}

/// A [`Parametrization`] bound to a channel set and a horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationSpace {
    parametrization: Parametrization,
    /// `channels × periods`; every row sums to one.
    pattern: Array2<f64>,
    /// Normalized split ratios; empty unless `TotalSplit`.
    shares: Array1<f64>,
    /// Lower bound applied by `project`.
    z_floor: f64,
}

impl AllocationSpace {
    /// Bind `parametrization` to the shape and spend pattern of `baseline`.
    ///
    /// Channels with no baseline spend are spread uniformly.
    ///
    /// # Errors
    /// - [`BudgetError::RatioLength`] / [`BudgetError::InvalidRatios`] for
    ///   `TotalSplit` ratios that do not describe one share per channel.
    pub fn new(parametrization: Parametrization, baseline: &Array2<f64>) -> BudgetResult<Self> {
        let (n_channels, n_periods) = baseline.dim();
        let mut pattern = Array2::from_elem((n_channels, n_periods), 1.0 / n_periods.max(1) as f64);
        for (mut row, base) in pattern.axis_iter_mut(Axis(0)).zip(baseline.axis_iter(Axis(0))) {
            let clipped = base.mapv(|x| x.max(0.0));
            let total = clipped.sum();
            if total > 0.0 && total.is_finite() {
                row.assign(&(clipped / total));
            }
        }

        let shares = match &parametrization {
            Parametrization::TotalSplit { ratios } => {
                if ratios.len() != n_channels {
                    return Err(BudgetError::RatioLength { expected: n_channels, found: ratios.len() });
                }
                let sum: f64 = ratios.iter().sum();
                if ratios.iter().any(|r| !r.is_finite() || *r < 0.0) || sum <= 0.0 {
                    return Err(BudgetError::InvalidRatios);
                }
                Array1::from_iter(ratios.iter().map(|r| r / sum))
            }
            _ => Array1::zeros(0),
        };
        let mut space = Self { parametrization, pattern, shares, z_floor: 0.0 };
        if space.parametrization != Parametrization::Identity {
            let total = baseline.iter().map(|x| x.max(0.0)).sum::<f64>();
            let per_variable = if total > 0.0 && total.is_finite() { total / space.dim().max(1) as f64 } else { 1.0 };
            space.z_floor = safe_softplus_inv(MIN_SPEND_FRACTION * per_variable);
        }
        Ok(space)
    }

    pub fn parametrization(&self) -> &Parametrization {
        &self.parametrization
    }

    pub fn n_channels(&self) -> usize {
        self.pattern.nrows()
    }

    pub fn n_periods(&self) -> usize {
        self.pattern.ncols()
    }

    /// Length of `z`.
    pub fn dim(&self) -> usize {
        match self.parametrization {
            Parametrization::PerChannel => self.n_channels(),
            Parametrization::TotalSplit { .. } => 1,
            Parametrization::PerChannelPerPeriod | Parametrization::Identity => {
                self.n_channels() * self.n_periods()
            }
        }
    }

    /// Allocation for decision vector `z` (`z.len() == dim()`).
    pub fn to_allocation(&self, z: &Array1<f64>) -> Array2<f64> {
        let (c, h) = self.pattern.dim();
        match self.parametrization {
            Parametrization::PerChannel => {
                let totals = z.mapv(safe_softplus).insert_axis(Axis(1));
                &self.pattern * &totals
            }
            Parametrization::TotalSplit { .. } => {
                let total = safe_softplus(z[0]);
                let totals = (&self.shares * total).insert_axis(Axis(1));
                &self.pattern * &totals
            }
            Parametrization::PerChannelPerPeriod => {
                Array2::from_shape_fn((c, h), |(i, t)| safe_softplus(z[i * h + t]))
            }
            Parametrization::Identity => Array2::from_shape_fn((c, h), |(i, t)| z[i * h + t].max(0.0)),
        }
    }

    /// Clamp `z` to the floor below which the transform's slope vanishes:
    /// `0` for `Identity`, a `1e-6` baseline share for the softplus forms.
    pub fn project(&self, z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| v.max(self.z_floor))
    }

    /// A decision vector whose allocation approximates `allocation`.
    ///
    /// Exact for cell-wise transforms; the per-channel transforms keep only
    /// the totals.
    pub fn to_unconstrained(&self, allocation: &Array2<f64>) -> Array1<f64> {
        match self.parametrization {
            Parametrization::PerChannel => allocation.sum_axis(Axis(1)).mapv(safe_softplus_inv),
            Parametrization::TotalSplit { .. } => Array1::from_elem(1, safe_softplus_inv(allocation.sum())),
            Parametrization::PerChannelPerPeriod => allocation.iter().map(|&x| safe_softplus_inv(x)).collect(),
            Parametrization::Identity => allocation.iter().map(|&x| x.max(0.0)).collect(),
        }
    }
}
