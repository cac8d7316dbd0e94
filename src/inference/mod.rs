//! inference — MAP and MCMC engines behind one interface.
//!
//! Purpose
//! -------
//! Turn an opaque log-density over the unconstrained parameter vector `θ`
//! into [`FittedParams`]: a single estimate (MAP) or an ordered collection of
//! posterior draws (MCMC), plus diagnostics.
//!
//! Key behaviors
//! -------------
//! - [`InferenceEngine::Map`] maximizes the log-posterior with the argmin
//!   L-BFGS layer in `optimization` and can attach Laplace standard errors.
//! - [`InferenceEngine::Mcmc`] runs chains of an injected [`Sampler`] in
//!   parallel and reports split-R̂.
//! - Non-convergence is reported in [`Diagnostics`], never raised.
//!
//! Conventions
//! -----------
//! - All engines work in `θ`-space; mapping to constrained values is done by
//!   the [`ParamLayout`](crate::effects::core::ParamLayout) stored in
//!   [`FittedParams`].

pub mod diagnostics;
pub mod engine;
pub mod errors;
pub mod laplace;
pub mod map;
pub mod mcmc;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::diagnostics::{Diagnostics, MapDiagnostics, McmcDiagnostics, split_r_hat};
pub use self::engine::{FittedParams, InferenceEngine};
pub use self::errors::{InferenceError, InferenceResult};
pub use self::laplace::{laplace_covariance, laplace_standard_errors};
pub use self::map::MapEngine;
pub use self::mcmc::{ChainOutput, McmcEngine, RandomWalkMetropolis, Sampler};

pub mod prelude {
    pub use super::diagnostics::{Diagnostics, MapDiagnostics, McmcDiagnostics};
    pub use super::engine::{FittedParams, InferenceEngine};
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::map::MapEngine;
    pub use super::mcmc::{McmcEngine, RandomWalkMetropolis, Sampler};
}
