//! loglik_optimizer::types — numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Keep `ndarray` and argmin generics in one place so the rest of the
//! optimizer (and the model, inference and budget layers that feed it) speak
//! in terms of `Theta`, `Grad`, `Hessian` and `Cost`.
//!
//! Conventions
//! -----------
//! - `Theta` is the unconstrained parameter vector. For the forecasting model
//!   it is the flat latent layout of a bound pipeline; for the budget solver
//!   it is the unconstrained allocation vector `z`.
//! - `Cost` is the scalar handed to argmin (`-ℓ`).
//! - `Hessian` is dense `dim × dim`.
//!
//! Testing notes
//! -------------
//! - Aliases only; exercised by the surrounding optimizer tests.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

pub type Theta = Array1<f64>;

pub type Grad = Array1<f64>;

pub type Hessian = Array2<f64>;

pub type Cost = f64;

/// Argmin's evaluation counters (`"cost_count"`, `"gradient_count"`, ...).
pub type FnEvalMap = HashMap<String, u64>;

/// Default L-BFGS history size.
pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
