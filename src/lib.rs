//! effect_engine — composable additive/multiplicative time-series effect
//! models with MAP/MCMC fitting and budget allocation.
//!
//! Purpose
//! -------
//! Serve as the crate root. A forecasting model is declared as a trend plus
//! named effects wired into a dependency graph, fitted against a target
//! series, and queried for forecasts, per-effect decompositions and spend
//! allocations.
//!
//! Key behaviors
//! -------------
//! - [`effects`]: trend, seasonality, regressors, adstock, saturation,
//!   chained and composite effects, and likelihood augmentations from lift
//!   tests and attribution estimates.
//! - [`pipeline`]: validated construction, overrides, JSON specs, fitting
//!   and decomposition.
//! - [`inference`]: MAP (L-BFGS, optional Laplace errors) and MCMC
//!   (parallel chains, split-R̂) behind one engine type.
//! - [`budget`]: augmented-Lagrangian allocation over a fitted pipeline.
//! - [`optimization`]: the argmin-backed maximizer and stable bijections
//!   shared by fitting and allocation.
//!
//! Invariants & assumptions
//! ------------------------
//! - Pipelines are immutable once built; fitting returns a new
//!   [`pipeline::FittedPipeline`] that is `Send + Sync`.
//! - Results are deterministic for a fixed [`context::RunContext`] seed.
//!
//! Conventions
//! -----------
//! - Effects evaluate in normalized target units; decompositions and budget
//!   responses are reported in raw units.
//! - Every area has its own `errors.rs` with an `XResult<T>` alias; no public
//!   entry point panics on recoverable input.
//! - Logging goes through `tracing` inside the caller's
//!   [`context::RunContext`] span; the library never installs a subscriber.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; end-to-end recovery, decomposition
//!   and allocation scenarios live under `tests/`.

pub mod budget;
pub mod context;
pub mod effects;
pub mod inference;
pub mod optimization;
pub mod pipeline;

pub mod prelude {
    pub use crate::budget::prelude::*;
    pub use crate::context::RunContext;
    pub use crate::effects::prelude::*;
    pub use crate::inference::prelude::*;
    pub use crate::pipeline::prelude::*;
}
