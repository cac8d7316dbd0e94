//! Prior distributions for latent effect parameters.
//!
//! A [`Prior`] knows its [`Support`], its log-density on the constrained
//! scale (delegated to `statrs`), and its mean (the starting point of every
//! fit). The support decides the bijection used to move between optimizer
//! space `θ ∈ ℝ` and the constrained value.
//!
//! Fitting evaluates priors through [`Prior::ln_pdf_theta`], which stays
//! finite where softplus and logistic saturate in `f64`.
use serde::{Deserialize, Serialize};
use statrs::distribution::{Beta, Continuous, Gamma, Laplace, LogNormal, Normal};
use statrs::function::beta::ln_beta;
use statrs::function::gamma::ln_gamma;
use std::f64::consts::{LN_2, PI};

use crate::effects::errors::{EffectError, EffectResult};
use crate::optimization::numerical_stability::{
    logistic_log_jacobian, logit, safe_ln_softplus, safe_logistic, safe_softplus,
    safe_softplus_inv, softplus_log_jacobian,
};

/// `|θ|` beyond which the bijections are treated as saturated.
const SATURATION: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Support {
    Real,
    Positive,
    UnitInterval,
}

impl Support {
    /// Map `θ ∈ ℝ` into the support.
    pub fn to_constrained(self, theta: f64) -> f64 {
        match self {
            Support::Real => theta,
            Support::Positive => safe_softplus(theta),
            Support::UnitInterval => safe_logistic(theta),
        }
    }

    pub fn to_unconstrained(self, value: f64) -> f64 {
        match self {
            Support::Real => value,
            Support::Positive => safe_softplus_inv(value),
            Support::UnitInterval => logit(value),
        }
    }

    /// `ln |d to_constrained / dθ|` at `θ`.
    pub fn log_jacobian(self, theta: f64) -> f64 {
        match self {
            Support::Real => 0.0,
            Support::Positive => softplus_log_jacobian(theta),
            Support::UnitInterval => logistic_log_jacobian(theta),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dist", rename_all = "snake_case")]
pub enum Prior {
    Normal { loc: f64, scale: f64 },
    HalfNormal { scale: f64 },
    /// Shape / rate parametrization.
    Gamma { shape: f64, rate: f64 },
    Beta { alpha: f64, beta: f64 },
    LogNormal { loc: f64, scale: f64 },
    Laplace { loc: f64, scale: f64 },
}

impl Prior {
    pub fn normal(loc: f64, scale: f64) -> EffectResult<Self> {
        Prior::Normal { loc, scale }.validated()
    }

    pub fn half_normal(scale: f64) -> EffectResult<Self> {
        Prior::HalfNormal { scale }.validated()
    }

    pub fn gamma(shape: f64, rate: f64) -> EffectResult<Self> {
        Prior::Gamma { shape, rate }.validated()
    }

    pub fn beta(alpha: f64, beta: f64) -> EffectResult<Self> {
        Prior::Beta { alpha, beta }.validated()
    }

    pub fn log_normal(loc: f64, scale: f64) -> EffectResult<Self> {
        Prior::LogNormal { loc, scale }.validated()
    }

    pub fn laplace(loc: f64, scale: f64) -> EffectResult<Self> {
        Prior::Laplace { loc, scale }.validated()
    }

    /// Location parameters must be finite; scale/shape parameters finite and
    /// strictly positive.
    pub fn validate(&self) -> EffectResult<()> {
        let (locs, positives): (Vec<f64>, Vec<f64>) = match *self {
            Prior::Normal { loc, scale }
            | Prior::LogNormal { loc, scale }
            | Prior::Laplace { loc, scale } => (vec![loc], vec![scale]),
            Prior::HalfNormal { scale } => (vec![], vec![scale]),
            Prior::Gamma { shape, rate } => (vec![], vec![shape, rate]),
            Prior::Beta { alpha, beta } => (vec![], vec![alpha, beta]),
        };
        if locs.iter().any(|v| !v.is_finite()) {
            return Err(EffectError::InvalidPrior {
                prior: format!("{self:?}"),
                reason: "location must be finite",
            });
        }
        if positives.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(EffectError::InvalidPrior {
                prior: format!("{self:?}"),
                reason: "scale and shape parameters must be finite and positive",
            });
        }
        Ok(())
    }

    fn validated(self) -> EffectResult<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn support(&self) -> Support {
        match self {
            Prior::Normal { .. } | Prior::Laplace { .. } => Support::Real,
            Prior::HalfNormal { .. } | Prior::Gamma { .. } | Prior::LogNormal { .. } => {
                Support::Positive
            }
            Prior::Beta { .. } => Support::UnitInterval,
        }
    }

    pub fn mean(&self) -> f64 {
        match *self {
            Prior::Normal { loc, .. } | Prior::Laplace { loc, .. } => loc,
            Prior::HalfNormal { scale } => scale * (2.0 / PI).sqrt(),
            Prior::Gamma { shape, rate } => shape / rate,
            Prior::Beta { alpha, beta } => alpha / (alpha + beta),
            Prior::LogNormal { loc, scale } => (loc + 0.5 * scale * scale).exp(),
        }
    }

    /// Log-density at a constrained value; `-∞` outside the support.
    ///
    /// # Errors
    /// [`EffectError::Distribution`] when statrs rejects the parameters.
    pub fn ln_pdf(&self, x: f64) -> EffectResult<f64> {
        Ok(match *self {
            Prior::Normal { loc, scale } => Normal::new(loc, scale)?.ln_pdf(x),
            Prior::HalfNormal { scale } => {
                if x < 0.0 {
                    f64::NEG_INFINITY
                } else {
                    LN_2 + Normal::new(0.0, scale)?.ln_pdf(x)
                }
            }
            Prior::Gamma { shape, rate } => Gamma::new(shape, rate)?.ln_pdf(x),
            Prior::Beta { alpha, beta } => Beta::new(alpha, beta)?.ln_pdf(x),
            Prior::LogNormal { loc, scale } => LogNormal::new(loc, scale)?.ln_pdf(x),
            Prior::Laplace { loc, scale } => Laplace::new(loc, scale)?.ln_pdf(x),
        })
    }

    /// Log-density of `support().to_constrained(theta)`, finite for every
    /// finite `θ`.
    ///
    /// Inside the unsaturated range this is [`Prior::ln_pdf`]. Where
    /// softplus or logistic round to `0` or `1`, or the statrs density
    /// underflows, the same density is written in `θ` through
    /// `ln σ(θ) = -softplus(-θ)`, `ln(1 - σ(θ)) = -softplus(θ)` and
    /// `ln softplus(θ)`.
    ///
    /// # Errors
    /// [`EffectError::Distribution`] when statrs rejects the parameters.
    pub fn ln_pdf_theta(&self, theta: f64) -> EffectResult<f64> {
        let support = self.support();
        let saturated = match support {
            Support::Real => false,
            Support::Positive => theta < -SATURATION,
            Support::UnitInterval => theta.abs() > SATURATION,
        };
        if !saturated {
            let value = self.ln_pdf(support.to_constrained(theta))?;
            if value.is_finite() {
                return Ok(value);
            }
        }
        self.ln_pdf_log_space(theta)
    }

    fn ln_pdf_log_space(&self, theta: f64) -> EffectResult<f64> {
        Ok(match *self {
            Prior::Normal { loc, scale } => Normal::new(loc, scale)?.ln_pdf(theta),
            Prior::HalfNormal { scale } => LN_2 + Normal::new(0.0, scale)?.ln_pdf(safe_softplus(theta)),
            Prior::Gamma { shape, rate } => {
                shape * rate.ln() - ln_gamma(shape) + (shape - 1.0) * safe_ln_softplus(theta)
                    - rate * safe_softplus(theta)
            }
            Prior::Beta { alpha, beta } => {
                -(alpha - 1.0) * safe_softplus(-theta) - (beta - 1.0) * safe_softplus(theta)
                    - ln_beta(alpha, beta)
            }
            Prior::LogNormal { loc, scale } => {
                let ln_x = safe_ln_softplus(theta);
                Normal::new(loc, scale)?.ln_pdf(ln_x) - ln_x
            }
            Prior::Laplace { loc, scale } => -(2.0 * scale).ln() - (theta - loc).abs() / scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Agreement of `ln_pdf_theta` with the statrs density inside the
    //   unsaturated range, and its finiteness and continuity in the tails.
    // - Support handling, validation and bijection round-trips.
    // -------------------------------------------------------------------------

    fn families() -> [Prior; 6] {
        [
            Prior::normal(0.1, 2.0).unwrap(),
            Prior::half_normal(1.0).unwrap(),
            Prior::gamma(2.5, 1.5).unwrap(),
            Prior::beta(2.0, 3.0).unwrap(),
            Prior::log_normal(-0.5, 0.7).unwrap(),
            Prior::laplace(0.0, 0.2).unwrap(),
        ]
    }

    #[test]
    // Purpose
    // -------
    // Away from saturation the θ-space density is the statrs density of the
    // constrained value.
    //
    // Given
    // -----
    // - Every family at θ in {-3, 0, 2.5}.
    //
    // Expect
    // ------
    // - `ln_pdf_theta(θ) == ln_pdf(to_constrained(θ))` to 1e-12.
    fn theta_density_matches_constrained_density() {
        for prior in families() {
            for theta in [-3.0, 0.0, 2.5] {
                // Act
                let by_theta = prior.ln_pdf_theta(theta).unwrap();
                let by_value = prior.ln_pdf(prior.support().to_constrained(theta)).unwrap();

                // Assert
                assert_relative_eq!(by_theta, by_value, epsilon = 1e-12);
            }
        }
    }

    #[test]
    // Purpose
    // -------
    // Saturated bijections never produce an infinite log-prior.
    //
    // Given
    // -----
    // - `Beta(2, 2)` at θ = ±40 (logistic rounds to 0 or 1).
    // - `Gamma(3, 0.5)` and `LogNormal(0, 1)` at θ = -800 (softplus
    //   underflows).
    // - `Laplace(0, 0.01)` at θ = 20 (the statrs density underflows).
    //
    // Expect
    // ------
    // - Finite values matching the densities written in θ:
    //   Beta `-40 + ln 6`, Gamma `3 ln 0.5 - ln 2 - 1600`, Laplace
    //   `-ln 0.02 - 2000`.
    fn saturated_bijections_keep_log_prior_finite() {
        // Arrange
        let beta = Prior::beta(2.0, 2.0).unwrap();
        let gamma = Prior::gamma(3.0, 0.5).unwrap();
        let log_normal = Prior::log_normal(0.0, 1.0).unwrap();
        let laplace = Prior::laplace(0.0, 0.01).unwrap();

        // Act
        let beta_hi = beta.ln_pdf_theta(40.0).unwrap();
        let beta_lo = beta.ln_pdf_theta(-40.0).unwrap();
        let gamma_lo = gamma.ln_pdf_theta(-800.0).unwrap();
        let log_normal_lo = log_normal.ln_pdf_theta(-800.0).unwrap();
        let laplace_far = laplace.ln_pdf_theta(20.0).unwrap();

        // Assert
        assert_eq!(beta.ln_pdf(beta.support().to_constrained(40.0)).unwrap(), f64::NEG_INFINITY);
        assert_relative_eq!(beta_hi, -40.0 + 6f64.ln(), epsilon = 1e-9);
        assert_relative_eq!(beta_lo, -40.0 + 6f64.ln(), epsilon = 1e-9);
        assert_relative_eq!(gamma_lo, 3.0 * 0.5f64.ln() - 2f64.ln() - 1600.0, epsilon = 1e-9);
        assert!(log_normal_lo.is_finite());
        assert_relative_eq!(laplace_far, -(0.02f64.ln()) - 2000.0, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Switching to the log-space form at the saturation cutoff is seamless.
    //
    // Given
    // -----
    // - `Beta(2, 3)` just inside and just outside θ = ±20.
    // - `Gamma(2.5, 1.5)` just inside and just outside θ = -20.
    //
    // Expect
    // ------
    // - Values on either side agree to 1e-6.
    fn log_space_form_is_continuous_at_cutoff() {
        // Arrange
        let beta = Prior::beta(2.0, 3.0).unwrap();
        let gamma = Prior::gamma(2.5, 1.5).unwrap();
        let d = 1e-9;

        // Act / Assert
        for edge in [-SATURATION, SATURATION] {
            assert_relative_eq!(
                beta.ln_pdf_theta(edge - d).unwrap(),
                beta.ln_pdf_theta(edge + d).unwrap(),
                epsilon = 1e-6
            );
        }
        assert_relative_eq!(
            gamma.ln_pdf_theta(-SATURATION - d).unwrap(),
            gamma.ln_pdf_theta(-SATURATION + d).unwrap(),
            epsilon = 1e-6
        );
    }

    #[test]
    // Purpose
    // -------
    // Out-of-support values get zero density, invalid parameters are
    // rejected at construction, and statrs rejections surface as errors.
    //
    // Given
    // -----
    // - Beta at 1.0, Gamma at -1.0, `Normal(0, 0)`, `Gamma(NaN, 1)`.
    // - An unvalidated `Normal { scale: -1 }` evaluated directly.
    //
    // Expect
    // ------
    // - `-∞` densities, `InvalidPrior` and `Distribution` errors.
    fn support_and_validation() {
        // Act / Assert
        assert_eq!(Prior::beta(2.0, 2.0).unwrap().ln_pdf(1.0).unwrap(), f64::NEG_INFINITY);
        assert_eq!(Prior::gamma(1.5, 1.0).unwrap().ln_pdf(-1.0).unwrap(), f64::NEG_INFINITY);
        assert!(matches!(Prior::normal(0.0, 0.0), Err(EffectError::InvalidPrior { .. })));
        assert!(matches!(Prior::gamma(f64::NAN, 1.0), Err(EffectError::InvalidPrior { .. })));
        let unchecked = Prior::Normal { loc: 0.0, scale: -1.0 };
        assert!(matches!(unchecked.ln_pdf(0.0), Err(EffectError::Distribution { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Prior means mapped to θ and back are unchanged.
    //
    // Given
    // -----
    // - `Beta(2, 2)`, `Gamma(2, 0.2)`, `Normal(-1, 1)`.
    //
    // Expect
    // ------
    // - `to_constrained(to_unconstrained(mean)) ≈ mean`.
    fn means_round_trip_through_support_bijections() {
        // Arrange
        let priors = [
            Prior::beta(2.0, 2.0).unwrap(),
            Prior::gamma(2.0, 0.2).unwrap(),
            Prior::normal(-1.0, 1.0).unwrap(),
        ];

        // Act / Assert
        for p in priors {
            let s = p.support();
            assert_relative_eq!(s.to_constrained(s.to_unconstrained(p.mean())), p.mean(), epsilon = 1e-9);
        }
    }
}
