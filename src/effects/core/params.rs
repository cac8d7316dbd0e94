//! effects::core::params — latent parameter declarations and the flat layout
//! that maps them to and from the optimizer vector `θ`.
//!
//! Purpose
//! -------
//! Effects declare what they need as [`ParamSpec`]s. The model assembler
//! stacks the declarations of every owner (trend, effects in evaluation
//! order, then the likelihood) into a [`ParamLayout`]. The layout is the only
//! place that knows how a constrained parameter sits inside `θ`.
//!
//! Key behaviors
//! -------------
//! - `unpack`: `θ` → [`ParamSet`] of constrained values, keyed by owner and
//!   parameter name.
//! - `pack`: the inverse, used to pin a pipeline to known parameter values.
//! - `log_prior`: sum of prior log-densities of the constrained values,
//!   optionally plus the log-Jacobian of the bijections.
//! - `initial_theta`: every parameter at its prior mean (init-to-mean).
//!
//! Conventions
//! -----------
//! - Child parameters of chained effects are named `step/param`.
//! - Coordinate names are `owner.param[i]`.
use ndarray::Array1;
use std::collections::BTreeMap;

use crate::effects::core::priors::Prior;
use crate::effects::errors::{EffectError, EffectResult};
use crate::optimization::loglik_optimizer::Theta;

/// One named latent parameter (scalar when `size == 1`).
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub prior: Prior,
    pub size: usize,
}

impl ParamSpec {
    pub fn scalar(name: impl Into<String>, prior: Prior) -> Self {
        Self { name: name.into(), prior, size: 1 }
    }

    pub fn vector(name: impl Into<String>, prior: Prior, size: usize) -> Self {
        Self { name: name.into(), prior, size }
    }

    /// Same spec under `step/name`.
    pub fn namespaced(&self, step: &str) -> Self {
        Self { name: format!("{step}/{}", self.name), ..self.clone() }
    }
}

/// Constrained values of one owner's parameters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EffectParams {
    values: BTreeMap<String, Array1<f64>>,
}

impl EffectParams {
    pub fn insert(&mut self, name: impl Into<String>, value: Array1<f64>) {
        self.values.insert(name.into(), value);
    }

    pub fn with(mut self, name: impl Into<String>, value: Array1<f64>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> EffectResult<&Array1<f64>> {
        self.values.get(name).ok_or_else(|| EffectError::MissingParam { name: name.to_string() })
    }

    pub fn scalar(&self, name: &str) -> EffectResult<f64> {
        self.get(name)?.first().copied().ok_or_else(|| EffectError::MissingParam {
            name: name.to_string(),
        })
    }

    /// Parameters of chained step `step`, with the `step/` prefix stripped.
    pub fn child(&self, step: &str) -> EffectParams {
        let prefix = format!("{step}/");
        let values = self
            .values
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(prefix.as_str()).map(|n| (n.to_string(), v.clone())))
            .collect();
        EffectParams { values }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Array1<f64>)> {
        self.values.iter()
    }
}

/// Constrained parameters of a whole pipeline, keyed by owner id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamSet {
    owners: BTreeMap<String, EffectParams>,
}

impl ParamSet {
    pub fn insert(&mut self, owner: impl Into<String>, params: EffectParams) {
        self.owners.insert(owner.into(), params);
    }

    /// Parameters of `owner`; owners without latent parameters get an empty set.
    pub fn owner(&self, owner: &str) -> &EffectParams {
        static EMPTY: std::sync::OnceLock<EffectParams> = std::sync::OnceLock::new();
        self.owners.get(owner).unwrap_or_else(|| EMPTY.get_or_init(EffectParams::default))
    }

    pub fn value(&self, owner: &str, name: &str) -> Option<&Array1<f64>> {
        self.owners.get(owner).and_then(|p| p.values.get(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutEntry {
    pub owner: String,
    pub spec: ParamSpec,
    pub offset: usize,
}

/// Flat ordering of every latent parameter of a bound pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamLayout {
    entries: Vec<LayoutEntry>,
    dim: usize,
}

impl ParamLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_owner(&mut self, owner: &str, specs: Vec<ParamSpec>) {
        for spec in specs {
            let size = spec.size;
            self.entries.push(LayoutEntry { owner: owner.to_string(), spec, offset: self.dim });
            self.dim += size;
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn coordinate_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .flat_map(|e| (0..e.spec.size).map(move |i| format!("{}.{}[{i}]", e.owner, e.spec.name)))
            .collect()
    }

    pub fn initial_theta(&self) -> Theta {
        let mut theta = Theta::zeros(self.dim);
        for e in &self.entries {
            let start = e.spec.prior.support().to_unconstrained(e.spec.prior.mean());
            theta.slice_mut(ndarray::s![e.offset..e.offset + e.spec.size]).fill(start);
        }
        theta
    }

    fn check_len(&self, theta: &Theta) -> EffectResult<()> {
        if theta.len() != self.dim {
            return Err(EffectError::ParamLength { expected: self.dim, found: theta.len() });
        }
        Ok(())
    }

    /// Constrained parameters at `θ`.
    pub fn unpack(&self, theta: &Theta) -> EffectResult<ParamSet> {
        self.check_len(theta)?;
        let mut set = ParamSet::default();
        for e in &self.entries {
            let support = e.spec.prior.support();
            let values = theta
                .slice(ndarray::s![e.offset..e.offset + e.spec.size])
                .mapv(|t| support.to_constrained(t));
            set.owners.entry(e.owner.clone()).or_default().insert(e.spec.name.clone(), values);
        }
        Ok(set)
    }

    /// `θ` holding the constrained values in `set`.
    ///
    /// # Errors
    /// [`EffectError::MissingParam`] / [`EffectError::ParamLength`] when `set`
    /// lacks an entry or has the wrong size for it.
    pub fn pack(&self, set: &ParamSet) -> EffectResult<Theta> {
        let mut theta = Theta::zeros(self.dim);
        for e in &self.entries {
            let name = format!("{}.{}", e.owner, e.spec.name);
            let values = set
                .value(&e.owner, &e.spec.name)
                .ok_or(EffectError::MissingParam { name })?;
            if values.len() != e.spec.size {
                return Err(EffectError::ParamLength { expected: e.spec.size, found: values.len() });
            }
            let support = e.spec.prior.support();
            for (i, v) in values.iter().enumerate() {
                theta[e.offset + i] = support.to_unconstrained(*v);
            }
        }
        Ok(theta)
    }

    /// Flat constrained values at `θ`, in layout order.
    pub fn to_constrained(&self, theta: &Theta) -> EffectResult<Array1<f64>> {
        self.check_len(theta)?;
        let mut out = theta.clone();
        for e in &self.entries {
            let support = e.spec.prior.support();
            out.slice_mut(ndarray::s![e.offset..e.offset + e.spec.size])
                .mapv_inplace(|t| support.to_constrained(t));
        }
        Ok(out)
    }

    /// Inverse of [`ParamLayout::to_constrained`].
    pub fn from_constrained(&self, values: &Array1<f64>) -> EffectResult<Theta> {
        self.check_len(values)?;
        let mut theta = values.clone();
        for e in &self.entries {
            let support = e.spec.prior.support();
            theta
                .slice_mut(ndarray::s![e.offset..e.offset + e.spec.size])
                .mapv_inplace(|v| support.to_unconstrained(v));
        }
        Ok(theta)
    }

    /// `Σ ln p(value)` over all coordinates, plus `Σ ln |J|` when `jacobian`.
    pub fn log_prior(&self, theta: &Theta, jacobian: bool) -> EffectResult<f64> {
        self.check_len(theta)?;
        let mut total = 0.0;
        for e in &self.entries {
            let support = e.spec.prior.support();
            for &t in theta.slice(ndarray::s![e.offset..e.offset + e.spec.size]).iter() {
                total += e.spec.prior.ln_pdf_theta(t)?;
                if jacobian {
                    total += support.log_jacobian(t);
                }
            }
        }
        Ok(total)
    }
}
