//! pipeline::model — binds a declared pipeline to training data and
//! assembles the generative forward pass.
//!
//! Purpose
//! -------
//! Turn a [`Pipeline`] plus training data into (a) a log-posterior over `θ`
//! consumed by the inference engines and (b) a forecast function
//! `θ ↦ {component: series}` used by prediction and budget optimization.
//!
//! Key behaviors
//! -------------
//! - [`BoundPipeline::bind`] freezes the scale factors, resolves every
//!   node's column selection against the training frame, initializes
//!   effects and stacks their parameter declarations into a
//!   [`ParamLayout`] (trend, effects in evaluation order, likelihood).
//! - [`BoundPipeline::forward`] evaluates the trend and then each effect in
//!   evaluation order, handing it the contributions of the ids it depends on,
//!   and folds contributions into the running mean per application mode.
//! - [`BoundPipeline::log_posterior`] = log-prior (+ log-Jacobian for MCMC)
//!   + target log-likelihood + every augmentation term.
//! - [`FittedPipeline::predict`] runs the forward pass once per posterior
//!   draw, samples observation noise and returns a [`Decomposition`] in raw
//!   units.
//!
//! Invariants & assumptions
//! ------------------------
//! - Selections are resolved once, at bind time. Prediction frames must carry
//!   every bound column; a missing one is reported with the effect id.
//! - Scale factors and fitted parameters are immutable after creation, so a
//!   [`FittedPipeline`] can be shared across threads.
use ndarray::Array1;
use tracing::{debug, info};

use crate::context::{PREDICT_STREAM, RunContext};
use crate::effects::core::{
    ApplicationMode, ExogFrame, ParamLayout, ParamSet, Prepared, ScaleFactors, TargetSeries,
    TimeIndex, Upstream,
};
use crate::effects::effect::Effect;
use crate::effects::errors::EffectResult;
use crate::effects::kinds::TrendEffect;
use crate::inference::{FittedParams, InferenceEngine};
use crate::optimization::errors::OptResult;
use crate::optimization::loglik_optimizer::LogLikelihood;
use crate::optimization::loglik_optimizer::Theta;
use crate::optimization::loglik_optimizer::validation::{validate_theta_input, validate_value};
use crate::pipeline::builder::Pipeline;
use crate::pipeline::decomposition::{Decomposition, DecompositionRows};
use crate::pipeline::errors::{PipelineError, PipelineResult};
use crate::pipeline::graph::TREND_ID;
use crate::pipeline::likelihood::{LIKELIHOOD_ID, TargetLikelihood};

/// One effect node after binding.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundNode {
    pub id: String,
    pub effect: Effect,
    pub mode: ApplicationMode,
    /// Resolved column selection, in selection order.
    pub columns: Vec<String>,
    pub depends_on: Vec<String>,
}

/// A pipeline bound to its training data.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundPipeline {
    trend: TrendEffect,
    /// Evaluation order.
    nodes: Vec<BoundNode>,
    likelihood: TargetLikelihood,
    scale: ScaleFactors,
    layout: ParamLayout,
    training_index: TimeIndex,
}

/// Prepared inputs of the trend and every node over one horizon.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedInputs {
    pub index: TimeIndex,
    pub trend: Prepared,
    pub nodes: Vec<Prepared>,
}

/// Normalized target plus prepared training inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingData {
    pub y_norm: Array1<f64>,
    pub inputs: PreparedInputs,
}

/// Normalized-unit outputs of one forward evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardPass {
    pub trend: Array1<f64>,
    /// One contribution per node, in evaluation order.
    pub components: Vec<Array1<f64>>,
    pub mean: Array1<f64>,
}

impl BoundPipeline {
    /// Bind `pipeline` to a training target and its exogenous frame.
    ///
    /// # Errors
    /// - [`PipelineError::IndexMismatch`] when the frame is not on the
    ///   target's index.
    /// - Selector, initialization and preparation errors carrying the
    ///   effect id.
    pub fn bind(
        pipeline: &Pipeline, target: &TargetSeries, exog: &ExogFrame,
    ) -> PipelineResult<(Self, TrainingData)> {
        if exog.index() != target.index() {
            return Err(PipelineError::IndexMismatch {
                context: "fit",
                reason: describe_mismatch(target.index(), exog.index()),
            });
        }
        let scale = ScaleFactors::from_training(target, pipeline.scale_target());

        let mut trend = pipeline.trend().clone();
        trend.initialize(target, &scale)?;
        let mut layout = ParamLayout::new();
        layout.push_owner(TREND_ID, trend.param_specs(TREND_ID)?);

        let mut nodes = Vec::with_capacity(pipeline.nodes().len());
        for node in pipeline.ordered_nodes() {
            let columns = if node.effect.reads_columns() {
                node.selector.resolve(&node.id, exog.columns())?
            } else {
                Vec::new()
            };
            let mut effect = node.effect.clone();
            effect.initialize(&node.id, target, columns.len(), &scale)?;
            layout.push_owner(&node.id, effect.param_specs(&node.id, columns.len())?);
            debug!(effect = %node.id, kind = effect.kind_name(), columns = ?columns, "effect bound");
            nodes.push(BoundNode {
                id: node.id.clone(),
                mode: node.mode(),
                effect,
                columns,
                depends_on: node.depends_on.clone(),
            });
        }
        layout.push_owner(LIKELIHOOD_ID, pipeline.likelihood().param_specs());

        let model = Self {
            trend,
            nodes,
            likelihood: *pipeline.likelihood(),
            scale,
            layout,
            training_index: target.index().clone(),
        };
        let inputs = model.prepare(exog)?;
        let y_norm = target.values() / scale.y_scale;
        Ok((model, TrainingData { y_norm, inputs }))
    }

    pub fn trend(&self) -> &TrendEffect {
        &self.trend
    }

    /// Bound nodes in evaluation order.
    pub fn nodes(&self) -> &[BoundNode] {
        &self.nodes
    }

    pub fn node_position(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    pub fn likelihood(&self) -> &TargetLikelihood {
        &self.likelihood
    }

    pub fn scale(&self) -> &ScaleFactors {
        &self.scale
    }

    pub fn layout(&self) -> &ParamLayout {
        &self.layout
    }

    pub fn training_index(&self) -> &TimeIndex {
        &self.training_index
    }

    pub fn effect_modes(&self) -> Vec<(String, ApplicationMode)> {
        self.nodes.iter().map(|n| (n.id.clone(), n.mode)).collect()
    }

    /// Prepare the trend and every node over `exog`'s index.
    pub fn prepare(&self, exog: &ExogFrame) -> EffectResult<PreparedInputs> {
        let trend = self.trend.prepare(exog.index(), &self.scale);
        let nodes = self
            .nodes
            .iter()
            .map(|node| self.prepare_node(node, exog))
            .collect::<EffectResult<Vec<_>>>()?;
        Ok(PreparedInputs { index: exog.index().clone(), trend, nodes })
    }

    pub(crate) fn prepare_node(&self, node: &BoundNode, exog: &ExogFrame) -> EffectResult<Prepared> {
        let inputs = exog.select(&node.id, &node.columns)?;
        node.effect.prepare(&node.id, inputs, exog.index(), &self.scale)
    }

    pub fn forward(&self, inputs: &PreparedInputs, params: &ParamSet) -> EffectResult<ForwardPass> {
        self.forward_cached(inputs, params, None)
    }

    /// Forward pass reusing `cache.0`'s contribution for every node `i` with
    /// `!cache.1[i]`.
    pub(crate) fn forward_cached(
        &self, inputs: &PreparedInputs, params: &ParamSet, cache: Option<(&ForwardPass, &[bool])>,
    ) -> EffectResult<ForwardPass> {
        let trend = self.trend.apply(TREND_ID, &inputs.trend, params.owner(TREND_ID))?;
        let mut mean = trend.clone();
        let mut components: Vec<Array1<f64>> = Vec::with_capacity(self.nodes.len());

        for (i, (node, prepared)) in self.nodes.iter().zip(&inputs.nodes).enumerate() {
            let contribution = match cache {
                Some((cached, fresh)) if !fresh[i] => cached.components[i].clone(),
                _ => {
                    let upstream: Upstream = node
                        .depends_on
                        .iter()
                        .filter_map(|dep| {
                            let c = if dep == TREND_ID {
                                Some(&trend)
                            } else {
                                self.node_position(dep).and_then(|j| components.get(j))
                            };
                            c.map(|c| (dep.clone(), c.clone()))
                        })
                        .collect();
                    node.effect.apply(&node.id, prepared, &upstream, params.owner(&node.id))?
                }
            };
            node.mode.fold(&mut mean, &contribution);
            components.push(contribution);
        }
        Ok(ForwardPass { trend, components, mean })
    }

    /// `ln p(θ) + ln p(y | θ) + Σ aux`, with the log-Jacobian of the
    /// parameter bijections when `jacobian`.
    pub fn log_posterior(&self, data: &TrainingData, theta: &Theta, jacobian: bool) -> EffectResult<f64> {
        let log_prior = self.layout.log_prior(theta, jacobian)?;
        let params = self.layout.unpack(theta)?;
        let pass = self.forward(&data.inputs, &params)?;
        let sigma = self.likelihood.noise_scale(params.owner(LIKELIHOOD_ID))?;
        let mut total = log_prior + self.likelihood.log_likelihood(&data.y_norm, &pass.mean, sigma)?;
        for ((node, prepared), contribution) in
            self.nodes.iter().zip(&data.inputs.nodes).zip(&pass.components)
        {
            total += node.effect.aux_log_density(&node.id, prepared, params.owner(&node.id), contribution)?;
        }
        Ok(total)
    }

    /// Nodes whose output can change when any of `channels` changes: nodes
    /// reading one of them, and (transitively) nodes depending on those.
    pub fn responsive_nodes(&self, channels: &[String]) -> Vec<bool> {
        let mut fresh = vec![false; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            let reads = node.columns.iter().any(|c| channels.contains(c));
            let upstream = node
                .depends_on
                .iter()
                .any(|d| self.node_position(d).is_some_and(|j| fresh[j]));
            fresh[i] = reads || upstream;
        }
        fresh
    }

    /// Raw-unit rows of one forward pass with sampled observations.
    fn push_draw(
        &self, inputs: &PreparedInputs, params: &ParamSet, rng: &mut rand::rngs::StdRng,
        rows: &mut DecompositionRows,
    ) -> EffectResult<()> {
        let pass = self.forward(inputs, params)?;
        let sigma = self.likelihood.noise_scale(params.owner(LIKELIHOOD_ID))?;
        let obs = self.likelihood.sample(&pass.mean, sigma, rng)?;
        let y = self.scale.y_scale;
        rows.trend.push(&pass.trend * y);
        rows.effects.push(
            self.nodes
                .iter()
                .zip(&pass.components)
                .map(|(node, c)| match node.mode {
                    ApplicationMode::Additive => c * y,
                    ApplicationMode::Multiplicative => c.clone(),
                })
                .collect(),
        );
        rows.mean.push(&pass.mean * y);
        rows.obs.push(obs * y);
        Ok(())
    }
}

/// The model-side log-posterior as a [`LogLikelihood`] over `θ`.
#[derive(Debug, Clone, Copy)]
pub struct ModelDensity<'a> {
    model: &'a BoundPipeline,
    jacobian: bool,
}

impl<'a> ModelDensity<'a> {
    pub fn new(model: &'a BoundPipeline, jacobian: bool) -> Self {
        Self { model, jacobian }
    }
}

impl LogLikelihood for ModelDensity<'_> {
    type Data = TrainingData;

    fn value(&self, theta: &Theta, data: &TrainingData) -> OptResult<f64> {
        Ok(self.model.log_posterior(data, theta, self.jacobian)?)
    }

    /// `θ` must match the layout and give a finite log-posterior.
    fn check(&self, theta: &Theta, data: &TrainingData) -> OptResult<()> {
        validate_theta_input(theta, self.model.layout.dim())?;
        validate_value(self.value(theta, data)?)
    }
}

/// A bound pipeline with its fitted parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedPipeline {
    model: BoundPipeline,
    params: FittedParams,
}

impl FittedPipeline {
    pub fn model(&self) -> &BoundPipeline {
        &self.model
    }

    pub fn params(&self) -> &FittedParams {
        &self.params
    }

    pub fn scale(&self) -> &ScaleFactors {
        &self.model.scale
    }

    /// Decomposition over `exog`'s index, one row per posterior draw.
    ///
    /// # Errors
    /// - Missing bound columns in `exog` and disallowed horizon drift, with
    ///   the effect id.
    /// - Evaluation errors of the forward pass.
    ///
    /// # Panics
    /// If the assembled components do not fold back to `"mean"`.
    pub fn predict(&self, exog: &ExogFrame, ctx: &RunContext) -> PipelineResult<Decomposition> {
        let _entered = ctx.span().enter();
        let inputs = self.model.prepare(exog)?;
        let mut rng = ctx.rng(PREDICT_STREAM);
        let mut rows = DecompositionRows::default();
        for draw in 0..self.params.n_draws() {
            let params = self.params.draw_params(draw)?;
            self.model.push_draw(&inputs, &params, &mut rng, &mut rows)?;
        }
        info!(periods = exog.index().len(), draws = self.params.n_draws(), "prediction");
        Ok(Decomposition::from_rows(exog.index().clone(), self.model.effect_modes(), rows))
    }

    /// [`FittedPipeline::predict`] for pipelines without exogenous inputs.
    pub fn predict_index(&self, index: &TimeIndex, ctx: &RunContext) -> PipelineResult<Decomposition> {
        self.predict(&ExogFrame::empty(index.clone()), ctx)
    }

    /// Raw-unit mean at the point estimate, without observation noise.
    pub fn point_mean(&self, exog: &ExogFrame) -> PipelineResult<Array1<f64>> {
        let inputs = self.model.prepare(exog)?;
        let params = self.params.point_params()?;
        let pass = self.model.forward(&inputs, &params)?;
        Ok(pass.mean * self.model.scale.y_scale)
    }
}

impl Pipeline {
    /// Fit on `target` (and `exog`, when the pipeline reads columns).
    ///
    /// # Errors
    /// Binding errors (see [`BoundPipeline::bind`]) and inference failures.
    /// MAP non-convergence and poor MCMC mixing are reported through the
    /// diagnostics of the returned parameters.
    pub fn fit(
        &self, target: &TargetSeries, exog: Option<&ExogFrame>, engine: &InferenceEngine,
        ctx: &RunContext,
    ) -> PipelineResult<FittedPipeline> {
        let _entered = ctx.span().enter();
        let empty;
        let exog = match exog {
            Some(frame) => frame,
            None => {
                empty = ExogFrame::empty(target.index().clone());
                &empty
            }
        };
        let (model, data) = BoundPipeline::bind(self, target, exog)?;
        info!(
            effects = model.nodes.len(),
            params = model.layout.dim(),
            periods = target.index().len(),
            "fitting pipeline"
        );
        let density = ModelDensity::new(&model, engine.uses_jacobian());
        let theta0 = model.layout.initial_theta();
        let params = engine.infer(&density, &model.layout, theta0, &data, ctx)?;
        Ok(FittedPipeline { model, params })
    }

    /// Bind to the training data and pin constrained parameter values
    /// instead of fitting.
    pub fn with_params(
        &self, target: &TargetSeries, exog: Option<&ExogFrame>, params: &ParamSet,
    ) -> PipelineResult<FittedPipeline> {
        let empty;
        let exog = match exog {
            Some(frame) => frame,
            None => {
                empty = ExogFrame::empty(target.index().clone());
                &empty
            }
        };
        let (model, _) = BoundPipeline::bind(self, target, exog)?;
        let params = FittedParams::from_param_set(model.layout.clone(), params)?;
        Ok(FittedPipeline { model, params })
    }
}

fn describe_mismatch(target: &TimeIndex, exog: &TimeIndex) -> String {
    format!(
        "target covers {}..={} ({} periods), exogenous frame covers {}..={} ({} periods)",
        target.start(),
        target.end(),
        target.len(),
        exog.start(),
        exog.end(),
        exog.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use statrs::distribution::{Continuous, Normal};
    use crate::effects::core::{ColumnSelector, EffectParams};
    use crate::effects::errors::EffectError;
    use crate::effects::kinds::{Combinator, CompositeEffect, LinearEffect};
    use crate::pipeline::builder::EffectNode;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // - Binding: index checks, selector resolution, layout order.
    // - Forward pass, cached forward pass and responsive-node detection.
    // - Log-posterior assembly and prediction with pinned parameters.
    // -------------------------------------------------------------------------

    fn data() -> (TargetSeries, ExogFrame) {
        let index = TimeIndex::range(0, 4).unwrap();
        let target = TargetSeries::new(index.clone(), array![3.0, 5.0, 7.0, 9.0]).unwrap();
        let exog = ExogFrame::new(
            index,
            vec!["x".into(), "z".into()],
            array![[1.0, 0.5], [2.0, 0.0], [3.0, 1.0], [4.0, 0.5]],
        )
        .unwrap();
        (target, exog)
    }

    fn linear_pipeline() -> Pipeline {
        Pipeline::builder()
            .with_trend(TrendEffect::flat())
            .with_effect(
                EffectNode::new("media", LinearEffect::default()).with_selector(ColumnSelector::names(["x"])),
            )
            .with_likelihood(TargetLikelihood::normal().with_fixed_noise(0.5))
            .scale_target(false)
            .build()
            .unwrap()
    }

    fn pinned(level: f64, coef: f64) -> ParamSet {
        let mut set = ParamSet::default();
        set.insert(TREND_ID, EffectParams::default().with("level", array![level]));
        set.insert("media", EffectParams::default().with("coefs", array![coef]));
        set
    }

    #[test]
    // Purpose
    // -------
    // The log-posterior is log-prior plus the target log-likelihood.
    //
    // Given
    // -----
    // - Flat trend + linear effect on `x`, fixed σ = 0.5, no target scaling.
    // - `level = 1`, `coef = 2`, which reproduce `y = 1 + 2x` exactly.
    //
    // Expect
    // ------
    // - Mean equals `y`; value = `log_prior(θ) + 4 ln N(0 | 0, 0.5)`.
    // - Layout order: trend then media, no likelihood parameter.
    fn log_posterior_adds_prior_and_likelihood() {
        // Arrange
        let (target, exog) = data();
        let (model, train) = BoundPipeline::bind(&linear_pipeline(), &target, &exog).unwrap();
        let theta = model.layout().pack(&pinned(1.0, 2.0)).unwrap();

        // Act
        let params = model.layout().unpack(&theta).unwrap();
        let pass = model.forward(&train.inputs, &params).unwrap();
        let value = model.log_posterior(&train, &theta, false).unwrap();

        // Assert
        assert_eq!(model.layout().coordinate_names(), vec!["trend.level[0]", "media.coefs[0]"]);
        for (m, y) in pass.mean.iter().zip(target.values().iter()) {
            assert_relative_eq!(*m, *y, epsilon = 1e-12);
        }
        let expected = model.layout().log_prior(&theta, false).unwrap() + 4.0 * Normal::new(0.0, 0.5).unwrap().ln_pdf(0.0);
        assert_relative_eq!(value, expected, epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // The sampling density differs from the MAP density by the log-Jacobian.
    //
    // Given
    // -----
    // - The linear pipeline with a latent noise scale (softplus bijection).
    //
    // Expect
    // ------
    // - `with − without == Σ log-Jacobian` as reported by the layout.
    fn jacobian_only_changes_sampling_density() {
        // Arrange
        let pipeline = linear_pipeline()
            .to_builder()
            .with_likelihood(TargetLikelihood::normal())
            .build()
            .unwrap();
        let (target, exog) = data();
        let (model, train) = BoundPipeline::bind(&pipeline, &target, &exog).unwrap();
        let theta = model.layout().initial_theta();

        // Act
        let plain = ModelDensity::new(&model, false).value(&theta, &train).unwrap();
        let with_jac = ModelDensity::new(&model, true).value(&theta, &train).unwrap();

        // Assert
        let layout = model.layout();
        let jac = layout.log_prior(&theta, true).unwrap() - layout.log_prior(&theta, false).unwrap();
        assert_relative_eq!(with_jac - plain, jac, epsilon = 1e-10);
        assert!(jac != 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Binding rejects frames off the target index and missing columns.
    //
    // Given
    // -----
    // - A frame shifted by one period; a selector naming "tv".
    //
    // Expect
    // ------
    // - `IndexMismatch`; `MissingColumn` naming the effect.
    fn bind_checks_index_and_columns() {
        // Arrange
        let (target, exog) = data();
        let shifted = ExogFrame::new(
            TimeIndex::range(1, 4).unwrap(),
            exog.columns().to_vec(),
            exog.values().clone(),
        )
        .unwrap();
        let tv = Pipeline::builder()
            .with_trend(TrendEffect::flat())
            .with_effect(EffectNode::new("media", LinearEffect::default()).with_selector(ColumnSelector::names(["tv"])))
            .with_likelihood(TargetLikelihood::normal())
            .build()
            .unwrap();

        // Act
        let mismatch = BoundPipeline::bind(&linear_pipeline(), &target, &shifted);
        let missing = BoundPipeline::bind(&tv, &target, &exog);

        // Assert
        assert!(matches!(mismatch, Err(PipelineError::IndexMismatch { .. })));
        assert!(matches!(
            missing,
            Err(PipelineError::Effect(EffectError::MissingColumn { effect, column })) if effect == "media" && column == "tv"
        ));
    }

    #[test]
    // Purpose
    // -------
    // Responsive nodes follow column reads and dependencies, and a cached
    // forward pass matches a full one.
    //
    // Given
    // -----
    // - a: linear on x; b: composite (linear on z) × a; c: linear on z.
    // - Channels [x].
    //
    // Expect
    // ------
    // - Responsive [a, b] but not c.
    // - Forward pass from a stale cache for c only equals the full pass.
    fn cached_forward_matches_full_forward() {
        // Arrange
        let pipeline = Pipeline::builder()
            .with_trend(TrendEffect::flat())
            .with_effect(EffectNode::new("a", LinearEffect::default()).with_selector(ColumnSelector::names(["x"])))
            .with_effect(
                EffectNode::new("b", CompositeEffect::new(LinearEffect::default().into(), "a", Combinator::Multiply))
                    .with_selector(ColumnSelector::names(["z"])),
            )
            .with_effect(EffectNode::new("c", LinearEffect::default()).with_selector(ColumnSelector::names(["z"])))
            .with_likelihood(TargetLikelihood::normal().with_fixed_noise(1.0))
            .build()
            .unwrap();
        let (target, exog) = data();
        let (model, train) = BoundPipeline::bind(&pipeline, &target, &exog).unwrap();
        let mut set = ParamSet::default();
        set.insert(TREND_ID, EffectParams::default().with("level", array![0.5]));
        set.insert("a", EffectParams::default().with("coefs", array![0.1]));
        set.insert("b", EffectParams::default().with("coefs", array![0.2]));
        set.insert("c", EffectParams::default().with("coefs", array![-0.3]));

        // Act
        let fresh = model.responsive_nodes(&["x".to_string()]);
        let full = model.forward(&train.inputs, &set).unwrap();
        let cached = model.forward_cached(&train.inputs, &set, Some((&full, &fresh))).unwrap();

        // Assert
        assert_eq!(fresh, vec![true, true, false]);
        assert_eq!(cached, full);
        let b = &full.components[1];
        let expected = array![0.5, 0.0, 1.0, 0.5] * 0.2 * (array![1.0, 2.0, 3.0, 4.0] * 0.1);
        for (got, want) in b.iter().zip(expected.iter()) {
            assert_relative_eq!(*got, *want, epsilon = 1e-12);
        }
    }

    #[test]
    // Purpose
    // -------
    // Prediction with pinned parameters is deterministic for a seed and its
    // mean is the noiseless forward pass in raw units.
    //
    // Given
    // -----
    // - Linear pipeline pinned at `level = 1`, `coef = 2`; target scaling on.
    //
    // Expect
    // ------
    // - One draw; `mean == 1 + 2x`; equal `obs` for equal seeds.
    fn predict_pinned_parameters() {
        // Arrange
        let pipeline = linear_pipeline().to_builder().scale_target(true).build().unwrap();
        let (target, exog) = data();
        let y_scale = 9.0;
        let fitted = pipeline.with_params(&target, Some(&exog), &pinned(1.0 / y_scale, 2.0 / y_scale)).unwrap();

        // Act
        let a = fitted.predict(&exog, &RunContext::new("a", 5)).unwrap();
        let b = fitted.predict(&exog, &RunContext::new("b", 5)).unwrap();
        let point = fitted.point_mean(&exog).unwrap();

        // Assert
        assert_eq!(a.n_draws(), 1);
        let mean = a.point("mean").unwrap();
        for ((m, p), y) in mean.iter().zip(point.iter()).zip(target.values().iter()) {
            assert_relative_eq!(*m, *y, epsilon = 1e-10);
            assert_relative_eq!(*p, *y, epsilon = 1e-10);
        }
        assert_eq!(a.draws("obs"), b.draws("obs"));
        assert_eq!(a.draws("obs").map(|d| d.nrows()), Some(1));
    }
}
