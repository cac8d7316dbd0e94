//! numerical_stability — overflow-safe transforms between unconstrained and
//! constrained parameter spaces.
//!
//! Purpose
//! -------
//! Every latent parameter of a pipeline is optimized or sampled on ℝ and
//! mapped into its prior's support here: identity for real support,
//! softplus for positive support, logistic for the unit interval. The budget
//! parametrizations reuse softplus to keep spend strictly positive.
//!
//! Conventions
//! -----------
//! - Forward maps take `θ ∈ ℝ`; inverses take constrained values.
//! - `*_log_jacobian` functions return `ln |dy/dθ|` at `θ`, added to the
//!   log-density only when sampling.

pub mod transformations;

pub use self::transformations::{
    EIGEN_EPS, LOG_FLOOR, LOGIT_EPS, logistic_log_jacobian, logit, safe_ln_softplus, safe_logistic,
    safe_softplus, safe_softplus_inv, softplus_log_jacobian,
};

pub mod prelude {
    pub use super::transformations::{
        EIGEN_EPS, LOG_FLOOR, LOGIT_EPS, logit, safe_logistic, safe_softplus, safe_softplus_inv,
    };
}
