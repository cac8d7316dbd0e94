//! Finite-difference derivatives for objectives without analytic gradients.
//!
//! - [`run_fd_diff`]: forward-difference gradient with error capture.
//! - [`compute_hessian`]: central-difference Hessian of a gradient map,
//!   falling back to forward differences when the central one is not finite.
//! - [`scalar_hessian`]: Hessian of a fallible scalar objective by nested
//!   central differences with step `ε^{1/4}`. Used for Laplace standard errors.
//!
//! Objectives may fail mid-sweep. `finitediff` closures must return `f64`, so
//! the first error is parked in a `RefCell` and the closure returns `NaN`; the
//! caller re-raises it afterwards.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        Grad, Theta,
        types::Hessian,
        validation::{validate_grad, validate_hessian},
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// Forward-difference gradient of `func` at `theta`.
///
/// Clears `closure_err` first; if `func` parked an error during the sweep it
/// is returned instead of the gradient.
///
/// # Errors
/// - The captured evaluation error.
/// - [`OptError::InvalidGradient`] when an entry is non-finite.
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

/// Hessian of the gradient map `f` at `theta`, symmetrized.
///
/// # Errors
/// Validation errors when neither the central nor the forward scheme yields a
/// finite `dim × dim` matrix.
pub fn compute_hessian<F: Fn(&Theta) -> Grad>(f: &F, theta: &Theta) -> OptResult<Hessian> {
    let dim = theta.len();
    let mut hess = theta.central_hessian(f);
    if validate_hessian(&hess, dim).is_err() {
        hess = theta.forward_hessian(f);
        validate_hessian(&hess, dim)?;
    }
    symmetrize_hess(&mut hess);
    Ok(hess)
}

/// Hessian of a fallible scalar objective at `theta`.
///
/// Gradients are central differences of `value`; the Hessian is taken over
/// that gradient map with [`compute_hessian`]. `finitediff` steps by `√ε` in
/// its argument, so both sweeps run over `u` with `θ = theta + u · ε^{-1/4}`;
/// each step is then `ε^{1/4}` in `θ` and the rounding error of the nested
/// differences stays near `√ε |f|`.
///
/// # Errors
/// - The first error raised by `value` during any sweep.
/// - Validation errors from [`compute_hessian`].
pub fn scalar_hessian<V>(value: V, theta: &Theta) -> OptResult<Hessian>
where
    V: Fn(&Theta) -> OptResult<f64>,
{
    let closure_err: RefCell<Option<OptError>> = RefCell::new(None);
    let scalar = |x: &Theta| -> f64 {
        match value(x) {
            Ok(v) if v.is_finite() => v,
            Ok(v) => {
                park(&closure_err, OptError::NonFiniteCost { value: v });
                f64::NAN
            }
            Err(e) => {
                park(&closure_err, e);
                f64::NAN
            }
        }
    };
    let scale = hessian_step_scale();
    let scaled = |u: &Theta| -> f64 { scalar(&(theta + &(u * scale))) };
    let grad_map = |u: &Theta| -> Grad { u.central_diff(&scaled) };
    let hess = compute_hessian(&grad_map, &Theta::zeros(theta.len()));
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    Ok(hess? / (scale * scale))
}

/// Ratio of the `ε^{1/4}` second-difference step to finitediff's `√ε` step.
fn hessian_step_scale() -> f64 {
    f64::EPSILON.powf(-0.25)
}

fn park(slot: &RefCell<Option<OptError>>, err: OptError) {
    let mut slot = slot.borrow_mut();
    if slot.is_none() {
        *slot = Some(err);
    }
}

/// Average each off-diagonal pair in place.
fn symmetrize_hess(hess: &mut Hessian) {
    for i in 0..hess.nrows() {
        for j in 0..i {
            let avg = 0.5 * (hess[[i, j]] + hess[[j, i]]);
            hess[[i, j]] = avg;
            hess[[j, i]] = avg;
        }
    }
}
