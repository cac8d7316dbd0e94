//! context — explicit logging handle and seed for one run.
//!
//! Purpose
//! -------
//! Carry a `tracing::Span` and a base seed into every fit, predict and
//! optimize call instead of relying on global state. The library emits
//! `tracing` events inside the span and never installs a subscriber.
//!
//! Key behaviors
//! -------------
//! - [`RunContext::child_seed`] derives independent, reproducible seeds for
//!   sub-streams (MCMC chains, predictive draws) from the base seed.
//! - [`RunContext::rng`] builds a `StdRng` for a sub-stream.
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::Span;

/// Sub-stream used for predictive observation draws.
pub(crate) const PREDICT_STREAM: u64 = 0x0b5;

#[derive(Debug, Clone)]
pub struct RunContext {
    span: Span,
    seed: u64,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new("run", 0)
    }
}

impl RunContext {
    /// Context with an `info`-level span labelled `label`.
    pub fn new(label: &str, seed: u64) -> Self {
        let span = tracing::info_span!("effect_engine", run = %label, seed);
        Self { span, seed }
    }

    /// Context reusing a caller-owned span.
    pub fn with_span(span: Span, seed: u64) -> Self {
        Self { span, seed }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// SplitMix64 of `seed ⊕ stream`.
    pub fn child_seed(&self, stream: u64) -> u64 {
        let mut z = self.seed ^ stream.wrapping_mul(0x9E37_79B9_7F4A_7C15);
        z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    pub fn rng(&self, stream: u64) -> StdRng {
        StdRng::seed_from_u64(self.child_seed(stream))
    }
}
