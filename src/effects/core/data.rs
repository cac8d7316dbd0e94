//! effects::core::data — validated containers for targets and exogenous inputs.
//!
//! Purpose
//! -------
//! Give every effect and the model assembler the same guarantees about their
//! inputs: a strictly increasing integer time index, finite values, and unique
//! column names.
//!
//! Key behaviors
//! -------------
//! - [`TimeIndex`] labels periods with `i64` and resolves labels to row
//!   positions by binary search.
//! - [`TargetSeries`] pairs an index with a finite `Array1`.
//! - [`ExogFrame`] pairs an index with named, finite `Array2` columns
//!   (rows = periods) and extracts the sub-matrix an effect selected.
//!
//! Invariants & assumptions
//! ------------------------
//! - Construction is the only validation point; all accessors assume the
//!   invariants hold.
//! - Frames are immutable to effects. The budget layer edits a private copy
//!   through [`ExogFrame::set_cell`].
use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::collections::HashSet;
use std::ops::Range;

use crate::effects::errors::{EffectError, EffectResult};

/// Strictly increasing period labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeIndex {
    labels: Vec<i64>,
}

impl TimeIndex {
    pub fn new(labels: Vec<i64>) -> EffectResult<Self> {
        if labels.is_empty() {
            return Err(EffectError::EmptyIndex);
        }
        if let Some(w) = labels.windows(2).find(|w| w[1] <= w[0]) {
            return Err(EffectError::UnsortedIndex { prev: w[0], next: w[1] });
        }
        Ok(Self { labels })
    }

    /// `start, start + 1, ..., start + len - 1`.
    pub fn range(start: i64, len: usize) -> EffectResult<Self> {
        Self::new((0..len as i64).map(|i| start + i).collect())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    pub fn start(&self) -> i64 {
        self.labels[0]
    }

    pub fn end(&self) -> i64 {
        self.labels[self.labels.len() - 1]
    }

    /// Row position of label `t`, if present.
    pub fn position(&self, t: i64) -> Option<usize> {
        self.labels.binary_search(&t).ok()
    }

    /// Rows whose labels fall in `[start, end]`.
    pub fn window(&self, start: i64, end: i64) -> Range<usize> {
        let lo = self.labels.partition_point(|&t| t < start);
        let hi = self.labels.partition_point(|&t| t <= end);
        lo..hi.max(lo)
    }
}

/// Observed target values on a time index.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSeries {
    index: TimeIndex,
    values: Array1<f64>,
}

impl TargetSeries {
    pub fn new(index: TimeIndex, values: Array1<f64>) -> EffectResult<Self> {
        if values.len() != index.len() {
            return Err(EffectError::ShapeMismatch {
                context: "target values",
                expected: index.len(),
                found: values.len(),
            });
        }
        if let Some(row) = values.iter().position(|v| !v.is_finite()) {
            return Err(EffectError::NonFiniteData { row, column: 0, value: values[row] });
        }
        Ok(Self { index, values })
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }
}

/// Named exogenous columns on a time index.
#[derive(Debug, Clone, PartialEq)]
pub struct ExogFrame {
    index: TimeIndex,
    columns: Vec<String>,
    values: Array2<f64>,
}

impl ExogFrame {
    pub fn new(index: TimeIndex, columns: Vec<String>, values: Array2<f64>) -> EffectResult<Self> {
        if values.nrows() != index.len() {
            return Err(EffectError::ShapeMismatch {
                context: "exogenous rows",
                expected: index.len(),
                found: values.nrows(),
            });
        }
        if values.ncols() != columns.len() {
            return Err(EffectError::ShapeMismatch {
                context: "exogenous columns",
                expected: columns.len(),
                found: values.ncols(),
            });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = columns.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(EffectError::DuplicateColumn { column: dup.clone() });
        }
        if let Some(((row, column), &value)) = values.indexed_iter().find(|(_, v)| !v.is_finite())
        {
            return Err(EffectError::NonFiniteData { row, column, value });
        }
        Ok(Self { index, columns, values })
    }

    /// A frame with no columns, for pipelines without exogenous inputs.
    pub fn empty(index: TimeIndex) -> Self {
        let rows = index.len();
        Self { index, columns: Vec::new(), values: Array2::zeros((rows, 0)) }
    }

    pub fn index(&self) -> &TimeIndex {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        self.column_index(name).map(|j| self.values.column(j))
    }

    /// `T × k` matrix of `columns`, in the given order.
    ///
    /// # Errors
    /// [`EffectError::MissingColumn`] naming `effect` and the first absent column.
    pub fn select(&self, effect: &str, columns: &[String]) -> EffectResult<Array2<f64>> {
        let idx = columns
            .iter()
            .map(|c| {
                self.column_index(c).ok_or_else(|| EffectError::MissingColumn {
                    effect: effect.to_string(),
                    column: c.clone(),
                })
            })
            .collect::<EffectResult<Vec<usize>>>()?;
        Ok(self.values.select(Axis(1), &idx))
    }

    /// Overwrite one cell. Callers guarantee `value` is finite.
    pub fn set_cell(&mut self, row: usize, column: usize, value: f64) {
        self.values[[row, column]] = value;
    }
}
