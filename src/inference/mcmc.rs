//! inference::mcmc — sampling engine with an injected [`Sampler`].
//!
//! Purpose
//! -------
//! Draw from an opaque log-density over `θ`. The engine owns chain layout,
//! seeding and merging; the sampler owns the transition kernel.
//!
//! Key behaviors
//! -------------
//! - Chains run concurrently on the rayon pool. Chain `c` is seeded with
//!   `ctx.child_seed(c)` and starts from the common start point plus
//!   `N(0, init_jitter²)` noise, so results depend only on the seed.
//! - The start point is the MAP estimate when `init_at_map` is set and the
//!   optimizer succeeds, and the supplied `θ₀` otherwise.
//! - Errors raised by the density during sampling count as rejected
//!   proposals (log-density `-∞`) and are tallied as non-finite proposals.
//! - A chain whose jittered start has a non-finite log-density is skipped
//!   and listed in `McmcDiagnostics::skipped_chains`; the run fails only
//!   when every chain is skipped.
//! - Split-R̂ halves each chain, so a single chain can be declared
//!   converged.
//!
//! Invariants & assumptions
//! ------------------------
//! - Each chain that runs retains exactly `n_draws` draws after `n_warmup`
//!   adaptation steps.
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, StandardNormal};
use rayon::prelude::*;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::context::RunContext;
use crate::inference::diagnostics::{
    DEFAULT_R_HAT_THRESHOLD, McmcDiagnostics, merge_chains, split_r_hat,
};
use crate::inference::errors::{InferenceError, InferenceResult};
use crate::optimization::loglik_optimizer::{LogLikelihood, MLEOptions, Theta, maximize};

/// Log-density callback handed to a [`Sampler`]; `-∞` marks an invalid point.
pub type LogDensityFn<'a> = dyn Fn(&Theta) -> f64 + Sync + 'a;

/// Transition kernel strategy.
pub trait Sampler: Debug + Send + Sync {
    /// Run one chain from `start`: `n_warmup` adaptation steps, then
    /// `n_draws` retained states.
    fn run_chain(
        &self, log_density: &LogDensityFn<'_>, start: Theta, n_warmup: usize, n_draws: usize,
        rng: &mut StdRng,
    ) -> ChainOutput;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutput {
    /// `n_draws × dim`.
    pub draws: Array2<f64>,
    /// Accepted proposals among the retained steps.
    pub accepted: usize,
    pub non_finite: usize,
}

/// Adaptive random-walk Metropolis.
///
/// Proposals are `θ + s·σ ⊙ z` with `z ~ N(0, I)`. During warm-up the global
/// step `s` follows a Robbins–Monro recursion on `ln s` toward
/// `target_acceptance`, and the per-coordinate scales `σ` track the running
/// standard deviation of the warm-up states. Both are frozen afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomWalkMetropolis {
    pub initial_step: f64,
    pub target_acceptance: f64,
}

impl Default for RandomWalkMetropolis {
    fn default() -> Self {
        Self { initial_step: 0.1, target_acceptance: 0.234 }
    }
}

/// Warm-up states needed before the running variance replaces unit scales.
const MIN_SCALE_SAMPLES: usize = 50;

impl Sampler for RandomWalkMetropolis {
    fn run_chain(
        &self, log_density: &LogDensityFn<'_>, start: Theta, n_warmup: usize, n_draws: usize,
        rng: &mut StdRng,
    ) -> ChainOutput {
        let dim = start.len();
        let mut state = start;
        let mut current = log_density(&state);
        let mut log_step = self.initial_step.ln();
        let mut scales = Array1::<f64>::ones(dim);
        let mut welford = Welford::new(dim);
        let mut draws = Array2::<f64>::zeros((n_draws, dim));
        let mut accepted = 0;
        let mut non_finite = 0;

        for i in 0..n_warmup + n_draws {
            let step = log_step.exp();
            let proposal = Array1::from_iter(state.iter().zip(scales.iter()).map(|(&x, &sd)| {
                let z: f64 = StandardNormal.sample(rng);
                x + step * sd * z
            }));
            let candidate = log_density(&proposal);
            let accept_prob = if candidate.is_finite() {
                (candidate - current).exp().min(1.0)
            } else {
                non_finite += 1;
                0.0
            };
            let u: f64 = rng.random();
            let accept = u < accept_prob;
            if accept {
                state = proposal;
                current = candidate;
            }

            if i < n_warmup {
                let gain = 1.0 / ((i + 1) as f64).powf(0.6);
                log_step += gain * (accept_prob - self.target_acceptance);
                welford.push(&state);
                if welford.count >= MIN_SCALE_SAMPLES {
                    scales = welford.std().mapv(|sd| sd.max(1e-4));
                }
            } else {
                if accept {
                    accepted += 1;
                }
                draws.row_mut(i - n_warmup).assign(&state);
            }
        }
        ChainOutput { draws, accepted, non_finite }
    }
}

/// Running mean/variance per coordinate.
struct Welford {
    count: usize,
    mean: Array1<f64>,
    m2: Array1<f64>,
}

impl Welford {
    fn new(dim: usize) -> Self {
        Self { count: 0, mean: Array1::zeros(dim), m2: Array1::zeros(dim) }
    }

    fn push(&mut self, x: &Array1<f64>) {
        self.count += 1;
        let n = self.count as f64;
        for j in 0..x.len() {
            let delta = x[j] - self.mean[j];
            self.mean[j] += delta / n;
            self.m2[j] += delta * (x[j] - self.mean[j]);
        }
    }

    fn std(&self) -> Array1<f64> {
        let denom = (self.count.max(2) - 1) as f64;
        self.m2.mapv(|v| (v / denom).sqrt())
    }
}

/// MCMC engine configuration.
#[derive(Debug, Clone)]
pub struct McmcEngine {
    pub n_warmup: usize,
    pub n_draws: usize,
    pub n_chains: usize,
    pub init_jitter: f64,
    pub init_at_map: bool,
    pub r_hat_threshold: f64,
    pub sampler: Arc<dyn Sampler>,
}

impl Default for McmcEngine {
    fn default() -> Self {
        Self {
            n_warmup: 1000,
            n_draws: 1000,
            n_chains: 4,
            init_jitter: 0.1,
            init_at_map: true,
            r_hat_threshold: DEFAULT_R_HAT_THRESHOLD,
            sampler: Arc::new(RandomWalkMetropolis::default()),
        }
    }
}

impl McmcEngine {
    /// # Errors
    /// [`InferenceError::InvalidMcmcSetting`] when `n_draws` or `n_chains` is
    /// zero.
    pub fn new(n_warmup: usize, n_draws: usize, n_chains: usize) -> InferenceResult<Self> {
        let engine = Self { n_warmup, n_draws, n_chains, ..Self::default() };
        engine.validate()?;
        Ok(engine)
    }

    pub fn with_sampler(mut self, sampler: Arc<dyn Sampler>) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_r_hat_threshold(mut self, threshold: f64) -> Self {
        self.r_hat_threshold = threshold;
        self
    }

    pub fn with_init_at_map(mut self, init_at_map: bool) -> Self {
        self.init_at_map = init_at_map;
        self
    }

    pub fn validate(&self) -> InferenceResult<()> {
        if self.n_draws == 0 {
            return Err(setting("n_draws", 0.0, "at least one draw must be retained"));
        }
        if self.n_chains == 0 {
            return Err(setting("n_chains", 0.0, "at least one chain is required"));
        }
        if !(self.init_jitter.is_finite() && self.init_jitter >= 0.0) {
            return Err(setting("init_jitter", self.init_jitter, "must be finite and non-negative"));
        }
        if !(self.r_hat_threshold.is_finite() && self.r_hat_threshold >= 1.0) {
            return Err(setting("r_hat_threshold", self.r_hat_threshold, "must be at least 1"));
        }
        Ok(())
    }

    /// Run all chains and merge their draws chain by chain.
    ///
    /// # Errors
    /// [`InferenceError::NoFiniteStart`] when no chain has a finite start.
    pub fn run<F>(
        &self, density: &F, theta0: Theta, data: &F::Data, ctx: &RunContext,
    ) -> InferenceResult<(Array2<f64>, McmcDiagnostics)>
    where
        F: LogLikelihood + Sync,
        F::Data: Sync,
    {
        self.validate()?;
        density.check(&theta0, data)?;
        let start = if self.init_at_map {
            match maximize(density, theta0.clone(), data, &MLEOptions::default()) {
                Ok(out) => out.theta_hat,
                Err(err) => {
                    warn!(error = %err, "MAP initialization failed; starting chains at θ₀");
                    theta0
                }
            }
        } else {
            theta0
        };

        let log_density = |theta: &Theta| -> f64 {
            match density.value(theta, data) {
                Ok(v) if v.is_finite() => v,
                _ => f64::NEG_INFINITY,
            }
        };
        let jitter = Normal::new(0.0, self.init_jitter.max(f64::MIN_POSITIVE))
            .map_err(|_| setting("init_jitter", self.init_jitter, "must be finite and non-negative"))?;

        let outputs: Vec<Result<ChainOutput, f64>> = (0..self.n_chains)
            .into_par_iter()
            .map(|chain| {
                let mut rng = StdRng::seed_from_u64(ctx.child_seed(chain as u64));
                let chain_start = if self.init_jitter > 0.0 {
                    start.mapv(|x| x + jitter.sample(&mut rng))
                } else {
                    start.clone()
                };
                let value = log_density(&chain_start);
                if !value.is_finite() {
                    return Err(value);
                }
                Ok(self.sampler.run_chain(&log_density, chain_start, self.n_warmup, self.n_draws, &mut rng))
            })
            .collect();

        let mut skipped_chains = Vec::new();
        let mut ran = Vec::with_capacity(outputs.len());
        for (chain, output) in outputs.into_iter().enumerate() {
            match output {
                Ok(out) => ran.push(out),
                Err(value) => {
                    warn!(chain, value, "non-finite log-density at chain start; chain skipped");
                    skipped_chains.push(chain);
                }
            }
        }
        if ran.is_empty() {
            return Err(InferenceError::NoFiniteStart { chains: self.n_chains });
        }

        let chains: Vec<Array2<f64>> = ran.iter().map(|o| o.draws.clone()).collect();
        let r_hat = split_r_hat(&chains);
        let converged = r_hat.iter().all(|r| r.is_finite() && *r <= self.r_hat_threshold);
        let diagnostics = McmcDiagnostics {
            draws_per_chain: ran.iter().map(|o| o.draws.nrows()).collect(),
            acceptance_rate: ran.iter().map(|o| o.accepted as f64 / self.n_draws as f64).collect(),
            non_finite_proposals: ran.iter().map(|o| o.non_finite).collect(),
            skipped_chains,
            r_hat,
            r_hat_threshold: self.r_hat_threshold,
            converged,
        };
        for (chain, rate) in diagnostics.acceptance_rate.iter().enumerate() {
            debug!(chain, acceptance = rate, "chain finished");
        }
        Ok((merge_chains(&chains), diagnostics))
    }
}

fn setting(name: &'static str, value: f64, reason: &'static str) -> InferenceError {
    InferenceError::InvalidMcmcSetting { name, value, reason }
}
