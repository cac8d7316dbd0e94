//! Per-component breakdown of a forecast.
//!
//! Every component is stored as a `draws × T` matrix: one row for a MAP fit,
//! one row per posterior draw for MCMC. The trend, additive effects, `"mean"`
//! and `"obs"` are in raw target units; multiplicative effects stay
//! dimensionless (they scale the running mean by `1 + c`).
use ndarray::{Array1, Array2, Axis};
use std::collections::BTreeMap;

use crate::effects::core::{ApplicationMode, TimeIndex};
use crate::inference::errors::InferenceError;
use crate::pipeline::errors::{PipelineError, PipelineResult};
use crate::pipeline::graph::TREND_ID;

/// Component name of the aggregate mean.
pub const MEAN_ID: &str = "mean";
/// Component name of the observation draws.
pub const OBS_ID: &str = "obs";

/// Relative tolerance of the recomposition check.
const RECOMPOSE_TOL: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    index: TimeIndex,
    /// Effect ids with their application modes, in evaluation order.
    effects: Vec<(String, ApplicationMode)>,
    components: BTreeMap<String, Array2<f64>>,
}

impl Decomposition {
    /// Assemble from per-draw rows. `effects[i]` pairs with column `i` of each
    /// `rows.effects` entry.
    ///
    /// # Panics
    /// If folding the components does not reproduce `"mean"`.
    pub(crate) fn from_rows(
        index: TimeIndex, effects: Vec<(String, ApplicationMode)>, rows: DecompositionRows,
    ) -> Self {
        let mut components = BTreeMap::new();
        components.insert(TREND_ID.to_string(), stack(&rows.trend));
        components.insert(MEAN_ID.to_string(), stack(&rows.mean));
        components.insert(OBS_ID.to_string(), stack(&rows.obs));
        for (j, (id, _)) in effects.iter().enumerate() {
            let per_draw: Vec<Array1<f64>> = rows.effects.iter().map(|r| r[j].clone()).collect();
            components.insert(id.clone(), stack(&per_draw));
        }
        let out = Self { index, effects, components };
        for draw in 0..out.n_draws() {
            assert!(out.recomposes(draw), "decomposition does not reproduce the mean at draw {draw}");
        }
        out
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    /// Component names: trend, effects in evaluation order, `"mean"`, `"obs"`.
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(TREND_ID)
            .chain(self.effects.iter().map(|(id, _)| id.as_str()))
            .chain([MEAN_ID, OBS_ID])
            .collect()
    }

    pub fn n_draws(&self) -> usize {
        self.components.get(MEAN_ID).map_or(0, |m| m.nrows())
    }

    pub fn mode(&self, name: &str) -> Option<ApplicationMode> {
        self.effects.iter().find(|(id, _)| id == name).map(|(_, m)| *m)
    }

    /// `draws × T` values of a component.
    pub fn draws(&self, name: &str) -> Option<&Array2<f64>> {
        self.components.get(name)
    }

    /// Mean over draws.
    pub fn point(&self, name: &str) -> Option<Array1<f64>> {
        self.components.get(name).and_then(|m| m.mean_axis(Axis(0)))
    }

    /// Per-period quantile over draws, linearly interpolated between order
    /// statistics.
    ///
    /// `Ok(None)` for an unknown component.
    ///
    /// # Errors
    /// [`InferenceError::InvalidQuantile`] for `q` outside `[0, 1]`.
    pub fn quantile(&self, name: &str, q: f64) -> PipelineResult<Option<Array1<f64>>> {
        if !(0.0..=1.0).contains(&q) {
            return Err(PipelineError::Inference(InferenceError::InvalidQuantile { q }));
        }
        Ok(self.components.get(name).map(|m| {
            Array1::from_iter(m.axis_iter(Axis(1)).map(|col| {
                let mut sorted = col.to_vec();
                sorted.sort_by(f64::total_cmp);
                interpolate(&sorted, q)
            }))
        }))
    }

    /// Fold trend and effects of one draw in evaluation order.
    pub fn recompose(&self, draw: usize) -> Option<Array1<f64>> {
        let mut mean = self.components.get(TREND_ID)?.row(draw).to_owned();
        for (id, mode) in &self.effects {
            let c = self.components.get(id)?.row(draw).to_owned();
            mode.fold(&mut mean, &c);
        }
        Some(mean)
    }

    fn recomposes(&self, draw: usize) -> bool {
        let (Some(folded), Some(mean)) = (self.recompose(draw), self.components.get(MEAN_ID)) else {
            return false;
        };
        folded
            .iter()
            .zip(mean.row(draw).iter())
            .all(|(a, b)| (a - b).abs() <= RECOMPOSE_TOL * (1.0 + b.abs()))
    }
}

/// Raw-unit rows collected per draw before assembly.
#[derive(Debug, Default)]
pub(crate) struct DecompositionRows {
    pub trend: Vec<Array1<f64>>,
    pub effects: Vec<Vec<Array1<f64>>>,
    pub mean: Vec<Array1<f64>>,
    pub obs: Vec<Array1<f64>>,
}

fn stack(rows: &[Array1<f64>]) -> Array2<f64> {
    let t = rows.first().map_or(0, |r| r.len());
    let mut out = Array2::zeros((rows.len(), t));
    for (mut dst, src) in out.axis_iter_mut(Axis(0)).zip(rows) {
        dst.assign(src);
    }
    out
}

fn interpolate(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let pos = q * (n - 1) as f64;
            let lo = pos.floor() as usize;
            let hi = (lo + 1).min(n - 1);
            let w = pos - lo as f64;
            sorted[lo] * (1.0 - w) + sorted[hi] * w
        }
    }
}
