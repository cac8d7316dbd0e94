//! optimization — objective maximizer, stable transforms and the optimizer
//! error surface.
//!
//! Purpose
//! -------
//! Shared numerical machinery for the fitting and budget layers: an
//! argmin-backed L-BFGS maximizer with finite-difference fallbacks
//! (`loglik_optimizer`), bijections between unconstrained and constrained
//! parameters (`numerical_stability`), and `errors::OptError`.
//!
//! Conventions
//! -----------
//! - Solvers maximize `ℓ(θ)` by minimizing `-ℓ(θ)`; outcomes are reported in
//!   `ℓ` units.
//! - Public entrypoints return `OptResult<T>`; raw argmin errors never leak.
//! - This layer logs only at debug/trace level through `tracing`; run-level
//!   reporting belongs to the callers' spans.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
    pub use super::numerical_stability::prelude::*;
}
