//! loglik_optimizer — argmin-backed maximizer for smooth objectives.
//!
//! Purpose
//! -------
//! One maximization routine shared by every fitting and search step in the
//! crate: MAP estimation of a pipeline's log-posterior and each inner solve of
//! the budget optimizer's augmented Lagrangian. Callers implement
//! [`LogLikelihood`] and call [`maximize`].
//!
//! Key behaviors
//! -------------
//! - [`adapter::ArgMinAdapter`] turns `ℓ(θ)` into the argmin cost `-ℓ(θ)`.
//! - [`maximize`] checks the start, builds L-BFGS with the chosen line search
//!   ([`builders`]) and runs it ([`run::run_lbfgs`]).
//! - Gradients fall back to finite differences ([`finite_diff`]) when the
//!   objective does not provide one. Every model in this crate relies on it.
//!
//! Invariants & assumptions
//! ------------------------
//! - Objectives report invalid inputs as
//!   [`OptError`](crate::optimization::errors::OptError) values, never panics.
//! - Configuration ([`Tolerances`], [`MLEOptions`]) is validated at
//!   construction.
//! - Hitting the iteration cap is a non-converged outcome, not a success.
//!
//! Conventions
//! -----------
//! - `θ` is unconstrained; mapping to constrained parameters lives in the
//!   model layer.
//! - [`OptimOutcome::value`] is expressed in objective units (`ℓ`), not cost.
//!
//! Testing notes
//! -------------
//! - Submodule tests cover sign conventions, builders, finite differences,
//!   validation and outcome normalization.
//! - Pipeline and budget integration tests exercise [`maximize`] end to end.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Hessian, Theta};

pub mod prelude {
    pub use super::api::maximize;
    pub use super::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
    pub use super::types::{Cost, Grad, Theta};
}
