//! Frozen normalization constants computed from the training target.
use crate::effects::core::data::{TargetSeries, TimeIndex};

/// `y_scale` maps raw target units to the normalized space the priors live
/// in; `t_origin` / `t_span` map period labels to trend time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub y_scale: f64,
    pub t_origin: f64,
    pub t_span: f64,
}

impl ScaleFactors {
    /// `y_scale = max |y|`, or 1 when scaling is disabled or the series is
    /// identically zero. Time spans the training index (1 for a single period).
    pub fn from_training(target: &TargetSeries, scale_target: bool) -> Self {
        let max_abs = target.values().iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let y_scale = if scale_target && max_abs > 0.0 { max_abs } else { 1.0 };
        let index = target.index();
        let span = (index.end() - index.start()) as f64;
        Self {
            y_scale,
            t_origin: index.start() as f64,
            t_span: if span > 0.0 { span } else { 1.0 },
        }
    }

    pub fn normalized_time(&self, t: i64) -> f64 {
        (t as f64 - self.t_origin) / self.t_span
    }

    pub fn normalized_times(&self, index: &TimeIndex) -> Vec<f64> {
        index.labels().iter().map(|&t| self.normalized_time(t)).collect()
    }
}
