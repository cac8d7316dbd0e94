//! Errors for budget allocation problems.
//!
//! Only malformed problems and evaluation failures are errors. An
//! unreachable constraint or a solver that runs out of iterations is reported
//! through [`BudgetStatus`](super::BudgetStatus) on the returned solution.
use thiserror::Error;

use crate::effects::errors::EffectError;
use crate::inference::errors::InferenceError;
use crate::optimization::errors::OptError;
use crate::pipeline::errors::PipelineError;

pub type BudgetResult<T> = Result<T, BudgetError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BudgetError {
    // ---- Problem definition ----
    #[error("No decision channels given")]
    NoChannels,

    #[error("Channel '{channel}' is listed twice")]
    DuplicateChannel { channel: String },

    #[error("Channel '{channel}' is not a column of the exogenous frame")]
    UnknownChannel { channel: String },

    #[error("Channel '{channel}' is not read by any effect of the fitted pipeline")]
    UnresponsiveChannel { channel: String },

    #[error("Decision horizon {start}..={end} selects no periods of the frame")]
    EmptyHorizon { start: i64, end: i64 },

    #[error("Split ratios: expected {expected} entries, found {found}")]
    RatioLength { expected: usize, found: usize },

    #[error("Split ratios must be non-negative, finite and not all zero")]
    InvalidRatios,

    #[error("Constraint {index} is invalid: {reason}")]
    InvalidConstraint { index: usize, reason: &'static str },

    #[error("Invalid solver setting {name} = {value}: {reason}")]
    InvalidSolverSetting { name: &'static str, value: f64, reason: &'static str },

    // ---- Wrapped ----
    #[error(transparent)]
    Effect(#[from] EffectError),

    #[error(transparent)]
    Optimization(#[from] OptError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
