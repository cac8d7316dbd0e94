//! Observation model of the target series.
//!
//! `y_t ~ Family(mean_t, σ)` in normalized units, with `σ` either latent
//! (prior on the `"likelihood"` owner, parameter `noise_scale`) or fixed.
use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, StudentT};
use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Normal, StudentsT};

use crate::effects::core::{ConfigValue, EffectParams, ParamSpec, Prior, Support};
use crate::effects::errors::{EffectError, EffectResult};

/// Owner name of likelihood parameters in the layout.
pub const LIKELIHOOD_ID: &str = "likelihood";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum LikelihoodFamily {
    Normal,
    StudentT { df: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseScale {
    Latent(Prior),
    Fixed(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetLikelihood {
    pub family: LikelihoodFamily,
    pub noise: NoiseScale,
}

impl Default for TargetLikelihood {
    fn default() -> Self {
        Self::normal()
    }
}

impl TargetLikelihood {
    /// Normal family, `σ ~ HalfNormal(0.5)`.
    pub fn normal() -> Self {
        Self {
            family: LikelihoodFamily::Normal,
            noise: NoiseScale::Latent(Prior::HalfNormal { scale: 0.5 }),
        }
    }

    pub fn student_t(df: f64) -> Self {
        Self { family: LikelihoodFamily::StudentT { df }, ..Self::normal() }
    }

    pub fn with_noise_prior(mut self, prior: Prior) -> Self {
        self.noise = NoiseScale::Latent(prior);
        self
    }

    /// Pin `σ` (normalized units).
    pub fn with_fixed_noise(mut self, sigma: f64) -> Self {
        self.noise = NoiseScale::Fixed(sigma);
        self
    }

    pub fn validate(&self) -> EffectResult<()> {
        if let LikelihoodFamily::StudentT { df } = self.family {
            if !(df.is_finite() && df > 0.0) {
                return Err(invalid("df", "degrees of freedom must be positive"));
            }
        }
        match self.noise {
            NoiseScale::Latent(prior) => {
                prior.validate()?;
                if prior.support() != Support::Positive {
                    return Err(invalid("noise_scale", "noise prior must have positive support"));
                }
            }
            NoiseScale::Fixed(sigma) => {
                if !(sigma.is_finite() && sigma > 0.0) {
                    return Err(invalid("noise_scale", "fixed noise scale must be positive"));
                }
            }
        }
        Ok(())
    }

    pub fn param_specs(&self) -> Vec<ParamSpec> {
        match self.noise {
            NoiseScale::Latent(prior) => vec![ParamSpec::scalar("noise_scale", prior)],
            NoiseScale::Fixed(_) => Vec::new(),
        }
    }

    pub fn noise_scale(&self, params: &EffectParams) -> EffectResult<f64> {
        match self.noise {
            NoiseScale::Latent(_) => params.scalar("noise_scale"),
            NoiseScale::Fixed(sigma) => Ok(sigma),
        }
    }

    /// `Σ_t ln p(y_t | mean_t, σ)`, evaluated on residuals with a
    /// zero-centered statrs density.
    ///
    /// # Errors
    /// [`EffectError::Distribution`] when `σ` or `df` is rejected by statrs.
    pub fn log_likelihood(&self, y: &Array1<f64>, mean: &Array1<f64>, sigma: f64) -> EffectResult<f64> {
        let residuals = y.iter().zip(mean.iter()).map(|(&yi, &mi)| yi - mi);
        Ok(match self.family {
            LikelihoodFamily::Normal => {
                let density = Normal::new(0.0, sigma)?;
                residuals.map(|r| density.ln_pdf(r)).sum()
            }
            LikelihoodFamily::StudentT { df } => {
                let density = StudentsT::new(0.0, sigma, df)?;
                residuals.map(|r| density.ln_pdf(r)).sum()
            }
        })
    }

    /// One observation draw around `mean`.
    pub fn sample<R: Rng + ?Sized>(
        &self, mean: &Array1<f64>, sigma: f64, rng: &mut R,
    ) -> EffectResult<Array1<f64>> {
        match self.family {
            LikelihoodFamily::Normal => Ok(mean.mapv(|m| {
                let z: f64 = StandardNormal.sample(rng);
                m + sigma * z
            })),
            LikelihoodFamily::StudentT { df } => {
                let dist = StudentT::new(df).map_err(|_| invalid("df", "degrees of freedom must be positive"))?;
                Ok(mean.mapv(|m| m + sigma * dist.sample(rng)))
            }
        }
    }

    /// `noise_scale` accepts a number (fixed) or a prior (latent); `df`
    /// applies to the Student-t family only.
    pub fn set_option(&mut self, option: &str, value: &ConfigValue) -> EffectResult<()> {
        match (option, value) {
            ("noise_scale", ConfigValue::Prior(p)) => self.noise = NoiseScale::Latent(*p),
            ("noise_scale", v) => self.noise = NoiseScale::Fixed(v.as_positive(LIKELIHOOD_ID, option)?),
            ("df", v) => match &mut self.family {
                LikelihoodFamily::StudentT { df } => *df = v.as_positive(LIKELIHOOD_ID, option)?,
                LikelihoodFamily::Normal => {
                    return Err(invalid("df", "normal likelihood has no degrees of freedom"));
                }
            },
            _ => return Err(EffectError::UnknownOption { kind: "likelihood", option: option.into() }),
        }
        self.validate()
    }
}

fn invalid(option: &str, reason: &str) -> EffectError {
    EffectError::InvalidOption {
        effect: LIKELIHOOD_ID.to_string(),
        option: option.to_string(),
        reason: reason.to_string(),
    }
}
