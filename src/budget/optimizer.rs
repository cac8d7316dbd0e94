//! Augmented-Lagrangian budget allocation over a fitted pipeline.
//!
//! Purpose
//! -------
//! Find spend for a set of decision channels over a horizon that optimizes an
//! [`Objective`] under [`BudgetConstraint`]s, using the fitted forward pass at
//! the point estimate as the response model.
//!
//! Key behaviors
//! -------------
//! - Only effects that read a decision channel (and effects depending on
//!   them) are re-evaluated per candidate; every other contribution is taken
//!   from one cached forward pass.
//! - Each outer iteration maximizes the augmented Lagrangian in the
//!   unconstrained decision space with the L-BFGS `maximize` layer, then
//!   updates multipliers and grows the penalty while violation stalls.
//! - Inner solutions are projected onto the region where the
//!   parametrization keeps its slope. An infeasible outer iterate is
//!   re-solved from the best feasible allocation seen so far.
//! - Infeasibility and non-convergence are reported in [`BudgetStatus`].
//!   `Infeasible` means no iterate, the start included, met the
//!   constraints; otherwise the best feasible allocation is returned.
//!
//! Invariants & assumptions
//! ------------------------
//! - The exogenous frame covers history and horizon so recursive effects
//!   carry state into the horizon.
//! - Allocations are non-negative by construction of the
//!   [`Parametrization`]; a negative entry panics.
use ndarray::{Array1, Array2, ArrayView1, s};
use std::ops::Range;
use tracing::{debug, info, warn};

use crate::budget::constraints::{BudgetConstraint, ConstraintReport};
use crate::budget::errors::{BudgetError, BudgetResult};
use crate::budget::objective::{Evaluation, Objective};
use crate::budget::parametrization::{AllocationSpace, Parametrization};
use crate::context::RunContext;
use crate::effects::core::{ExogFrame, ParamSet, TimeIndex};
use crate::effects::errors::EffectResult;
use crate::optimization::errors::OptResult;
use crate::optimization::loglik_optimizer::validation::{validate_theta_input, validate_value};
use crate::optimization::loglik_optimizer::{LogLikelihood, MLEOptions, Theta, Tolerances, maximize};
use crate::pipeline::model::{BoundPipeline, ForwardPass, PreparedInputs};
use crate::pipeline::FittedPipeline;

/// Outer-loop settings of the augmented-Lagrangian solver.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    pub max_outer: usize,
    /// Largest accepted relative constraint violation.
    pub feasibility_tol: f64,
    pub initial_penalty: f64,
    pub penalty_growth: f64,
    pub max_penalty: f64,
    /// Relative change of the scaled objective between outer iterations
    /// below which the outer loop stops.
    pub objective_tol: f64,
    pub inner: MLEOptions,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_outer: 30,
            feasibility_tol: 1e-4,
            initial_penalty: 10.0,
            penalty_growth: 10.0,
            max_penalty: 1e8,
            objective_tol: 1e-6,
            inner: MLEOptions {
                tols: Tolerances { tol_grad: Some(1e-7), tol_cost: None, max_iter: Some(200) },
                ..MLEOptions::default()
            },
        }
    }
}

impl SolverOptions {
    pub fn validate(&self) -> BudgetResult<()> {
        let checks = [
            ("max_outer", self.max_outer as f64, self.max_outer >= 1, "must be at least 1"),
            ("feasibility_tol", self.feasibility_tol, self.feasibility_tol > 0.0, "must be positive"),
            ("initial_penalty", self.initial_penalty, self.initial_penalty > 0.0, "must be positive"),
            ("penalty_growth", self.penalty_growth, self.penalty_growth > 1.0, "must exceed 1"),
            (
                "max_penalty",
                self.max_penalty,
                self.max_penalty >= self.initial_penalty,
                "must be at least the initial penalty",
            ),
            ("objective_tol", self.objective_tol, self.objective_tol > 0.0, "must be positive"),
        ];
        for (name, value, ok, reason) in checks {
            if !ok || !value.is_finite() {
                return Err(BudgetError::InvalidSolverSetting { name, value, reason });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    /// Feasible and the outer loop converged.
    Optimal,
    /// A constraint is still violated beyond tolerance.
    Infeasible,
    /// Feasible, but the solver stopped before converging.
    NonConverged,
}

/// Result of one allocation run.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSolution {
    pub channels: Vec<String>,
    pub horizon: TimeIndex,
    /// `channels × periods`.
    pub allocation: Array2<f64>,
    pub status: BudgetStatus,
    /// Objective at the allocation, in its natural direction.
    pub objective: f64,
    /// Horizon response at the allocation, raw target units.
    pub response: f64,
    /// Horizon response at the frame's own spend.
    pub baseline_response: f64,
    pub constraints: Vec<ConstraintReport>,
    pub outer_iterations: usize,
    pub inner_iterations: usize,
}

impl BudgetSolution {
    pub fn channel_allocation(&self, channel: &str) -> Option<ArrayView1<'_, f64>> {
        let i = self.channels.iter().position(|c| c == channel)?;
        Some(self.allocation.row(i))
    }

    pub fn channel_total(&self, channel: &str) -> Option<f64> {
        self.channel_allocation(channel).map(|row| row.sum())
    }

    pub fn total_spend(&self) -> f64 {
        self.allocation.sum()
    }

    pub fn max_violation(&self) -> f64 {
        self.constraints.iter().map(|c| c.violation).fold(0.0, f64::max)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetOptimizer {
    objective: Objective,
    parametrization: Parametrization,
    constraints: Vec<BudgetConstraint>,
    options: SolverOptions,
}

impl BudgetOptimizer {
    pub fn new(objective: Objective) -> Self {
        Self {
            objective,
            parametrization: Parametrization::default(),
            constraints: Vec::new(),
            options: SolverOptions::default(),
        }
    }

    pub fn with_parametrization(mut self, parametrization: Parametrization) -> Self {
        self.parametrization = parametrization;
        self
    }

    pub fn with_constraint(mut self, constraint: BudgetConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn constraints(&self) -> &[BudgetConstraint] {
        &self.constraints
    }

    /// Allocate spend on `channels` over the labels `horizon.0..=horizon.1`
    /// of `exog`.
    ///
    /// # Errors
    /// - Malformed problems: no, duplicate, unknown or unresponsive
    ///   channels, an empty horizon, bad ratios, constraints or settings.
    /// - Evaluation errors of the forward pass on the supplied frame.
    ///
    /// # Panics
    /// If the returned allocation contains negative spend.
    pub fn optimize(
        &self, fitted: &FittedPipeline, exog: &ExogFrame, channels: &[String], horizon: (i64, i64),
        ctx: &RunContext,
    ) -> BudgetResult<BudgetSolution> {
        let _entered = ctx.span().enter();
        self.options.validate()?;
        for (i, c) in self.constraints.iter().enumerate() {
            c.validate(i, channels)?;
        }
        let rows = exog.index().window(horizon.0, horizon.1);
        if rows.is_empty() {
            return Err(BudgetError::EmptyHorizon { start: horizon.0, end: horizon.1 });
        }
        let horizon_index = TimeIndex::new(exog.index().labels()[rows.clone()].to_vec())?;

        let response_model = ResponseModel::new(fitted, exog, channels, rows)?;
        let baseline = response_model.baseline_allocation();
        let space = AllocationSpace::new(self.parametrization.clone(), &baseline)?;

        let baseline_response = response_model.response(&baseline)?;
        let zero_response = response_model.response(&Array2::zeros(baseline.raw_dim()))?;
        let baseline_eval = Evaluation { response: baseline_response, total_spend: baseline.sum() };
        let objective_scale = match self.objective {
            Objective::MaximizeResponse => reference_scale(baseline_response - zero_response, baseline_response),
            _ => reference_scale(self.objective.score(&baseline_eval, zero_response), 1.0),
        };

        let mut problem = Augmented {
            model: &response_model,
            space: &space,
            objective: self.objective,
            constraints: &self.constraints,
            channels,
            zero_response,
            objective_scale,
            multipliers: Array1::zeros(self.constraints.len()),
            penalty: self.options.initial_penalty,
        };
        let mut z = space.project(&space.to_unconstrained(&self.starting_allocation(&baseline)));
        let mut best_feasible: Option<(Theta, f64)> = None;
        {
            let (allocation, eval) = problem.evaluate(&z)?;
            let residuals = problem.relative_residuals(&allocation, &eval);
            if max_violation(&self.constraints, &residuals) <= self.options.feasibility_tol {
                best_feasible = Some((z.clone(), self.objective.score(&eval, zero_response) / objective_scale));
            }
        }

        let mut outer = 0;
        let mut inner_iterations = 0;
        let mut converged = false;
        let mut prev_violation = f64::INFINITY;
        let mut prev_score: Option<f64> = None;
        while outer < self.options.max_outer {
            outer += 1;
            let inner_ok = match maximize(&problem, z.clone(), &(), &self.options.inner) {
                Ok(out) => {
                    inner_iterations += out.iterations;
                    z = space.project(&out.theta_hat);
                    out.converged
                }
                Err(err) => {
                    warn!(error = %err, outer, "inner allocation solve failed");
                    false
                }
            };

            let (allocation, eval) = problem.evaluate(&z)?;
            let residuals = problem.relative_residuals(&allocation, &eval);
            let violation = max_violation(&self.constraints, &residuals);
            let score = self.objective.score(&eval, zero_response) / objective_scale;
            debug!(outer, score, violation, penalty = problem.penalty, "augmented Lagrangian step");

            if self.constraints.is_empty() {
                converged = inner_ok;
                break;
            }
            problem.update_multipliers(&residuals);
            let feasible = violation <= self.options.feasibility_tol;
            if feasible && best_feasible.as_ref().is_none_or(|(_, best)| score >= *best) {
                best_feasible = Some((z.clone(), score));
            }
            let stalled =
                prev_score.is_some_and(|p| (score - p).abs() <= self.options.objective_tol * (1.0 + p.abs()));
            if feasible && stalled {
                converged = true;
                break;
            }
            if !feasible {
                let at_cap = problem.penalty >= self.options.max_penalty;
                if at_cap && violation >= 0.99 * prev_violation {
                    break;
                }
                if violation > 0.25 * prev_violation || prev_violation.is_infinite() {
                    problem.penalty = (problem.penalty * self.options.penalty_growth).min(self.options.max_penalty);
                }
                if let Some((seed, _)) = &best_feasible {
                    debug!(outer, violation, "re-seeding from best feasible allocation");
                    z = seed.clone();
                }
            }
            prev_violation = violation;
            prev_score = Some(score);
        }

        let (mut allocation, mut eval) = problem.evaluate(&z)?;
        let mut residuals = problem.relative_residuals(&allocation, &eval);
        if max_violation(&self.constraints, &residuals) > self.options.feasibility_tol {
            if let Some((seed, _)) = best_feasible {
                warn!(outer, "final iterate infeasible; returning best feasible allocation");
                converged = false;
                (allocation, eval) = problem.evaluate(&seed)?;
                residuals = problem.relative_residuals(&allocation, &eval);
            }
        }
        assert!(allocation.iter().all(|&x| x >= 0.0), "allocation contains negative spend");
        let reports: Vec<ConstraintReport> = self
            .constraints
            .iter()
            .zip(&residuals)
            .map(|(c, &r)| ConstraintReport {
                constraint: c.clone(),
                value: c.residual(&allocation, channels, eval.response) + constraint_offset(c),
                violation: c.violation(r),
            })
            .collect();
        let violation = max_violation(&self.constraints, &residuals);
        let status = if violation > self.options.feasibility_tol {
            BudgetStatus::Infeasible
        } else if converged {
            BudgetStatus::Optimal
        } else {
            BudgetStatus::NonConverged
        };
        info!(
            status = ?status,
            response = eval.response,
            total_spend = eval.total_spend,
            outer,
            "budget allocation"
        );

        Ok(BudgetSolution {
            channels: channels.to_vec(),
            horizon: horizon_index,
            allocation,
            status,
            objective: self.objective.value(&eval, zero_response),
            response: eval.response,
            baseline_response,
            constraints: reports,
            outer_iterations: outer,
            inner_iterations,
        })
    }

    /// Baseline spend, or one unit per cell when the baseline is empty,
    /// rescaled onto a total-budget constraint when one is present.
    fn starting_allocation(&self, baseline: &Array2<f64>) -> Array2<f64> {
        let mut start = baseline.mapv(|x| x.max(0.0));
        if start.sum() <= 0.0 {
            start.fill(1.0);
        }
        let total = self.constraints.iter().find_map(|c| match c {
            BudgetConstraint::TotalBudget { total } => Some(*total),
            _ => None,
        });
        if let Some(total) = total {
            start *= total / start.sum();
        }
        start
    }
}

fn reference_scale(primary: f64, fallback: f64) -> f64 {
    [primary, fallback, 1.0].into_iter().map(f64::abs).find(|v| *v > 1e-8).unwrap_or(1.0)
}

fn constraint_offset(c: &BudgetConstraint) -> f64 {
    match c {
        BudgetConstraint::TotalBudget { total } | BudgetConstraint::SharedBudget { total, .. } => *total,
        BudgetConstraint::MinResponse { target } => *target,
    }
}

fn max_violation(constraints: &[BudgetConstraint], residuals: &[f64]) -> f64 {
    constraints.iter().zip(residuals).map(|(c, &r)| c.violation(r)).fold(0.0, f64::max)
}

/// Horizon response of the fitted pipeline as a function of channel spend.
struct ResponseModel<'a> {
    model: &'a BoundPipeline,
    params: ParamSet,
    frame: ExogFrame,
    /// Frame column of each decision channel.
    columns: Vec<usize>,
    rows: Range<usize>,
    fresh: Vec<bool>,
    base_inputs: PreparedInputs,
    base_pass: ForwardPass,
    y_scale: f64,
}

impl<'a> ResponseModel<'a> {
    fn new(
        fitted: &'a FittedPipeline, exog: &ExogFrame, channels: &[String], rows: Range<usize>,
    ) -> BudgetResult<Self> {
        if channels.is_empty() {
            return Err(BudgetError::NoChannels);
        }
        let model = fitted.model();
        let mut columns = Vec::with_capacity(channels.len());
        for (i, channel) in channels.iter().enumerate() {
            if channels[..i].contains(channel) {
                return Err(BudgetError::DuplicateChannel { channel: channel.clone() });
            }
            let col = exog
                .column_index(channel)
                .ok_or_else(|| BudgetError::UnknownChannel { channel: channel.clone() })?;
            if !model.nodes().iter().any(|n| n.columns.contains(channel)) {
                return Err(BudgetError::UnresponsiveChannel { channel: channel.clone() });
            }
            columns.push(col);
        }

        let params = fitted.params().point_params()?;
        let base_inputs = model.prepare(exog)?;
        let base_pass = model.forward(&base_inputs, &params)?;
        let fresh = model.responsive_nodes(channels);
        debug!(
            responsive = fresh.iter().filter(|f| **f).count(),
            cached = fresh.iter().filter(|f| !**f).count(),
            "budget response model"
        );
        Ok(Self {
            model,
            params,
            frame: exog.clone(),
            columns,
            rows,
            fresh,
            base_inputs,
            base_pass,
            y_scale: fitted.scale().y_scale,
        })
    }

    fn baseline_allocation(&self) -> Array2<f64> {
        let values = self.frame.values();
        Array2::from_shape_fn((self.columns.len(), self.rows.len()), |(i, k)| {
            values[[self.rows.start + k, self.columns[i]]]
        })
    }

    fn response(&self, allocation: &Array2<f64>) -> EffectResult<f64> {
        let mut frame = self.frame.clone();
        for (i, &col) in self.columns.iter().enumerate() {
            for (k, row) in self.rows.clone().enumerate() {
                frame.set_cell(row, col, allocation[[i, k]]);
            }
        }
        let mut inputs = self.base_inputs.clone();
        for (i, node) in self.model.nodes().iter().enumerate() {
            if self.fresh[i] {
                inputs.nodes[i] = self.model.prepare_node(node, &frame)?;
            }
        }
        let pass = self.model.forward_cached(&inputs, &self.params, Some((&self.base_pass, &self.fresh)))?;
        Ok(pass.mean.slice(s![self.rows.clone()]).sum() * self.y_scale)
    }
}

/// Augmented Lagrangian in the decision space, oriented for maximization.
struct Augmented<'a> {
    model: &'a ResponseModel<'a>,
    space: &'a AllocationSpace,
    objective: Objective,
    constraints: &'a [BudgetConstraint],
    channels: &'a [String],
    zero_response: f64,
    objective_scale: f64,
    multipliers: Array1<f64>,
    penalty: f64,
}

impl Augmented<'_> {
    fn evaluate(&self, z: &Theta) -> EffectResult<(Array2<f64>, Evaluation)> {
        let allocation = self.space.to_allocation(z);
        let response = self.model.response(&allocation)?;
        let eval = Evaluation { response, total_spend: allocation.sum() };
        Ok((allocation, eval))
    }

    fn relative_residuals(&self, allocation: &Array2<f64>, eval: &Evaluation) -> Vec<f64> {
        self.constraints
            .iter()
            .map(|c| c.residual(allocation, self.channels, eval.response) / c.magnitude())
            .collect()
    }

    /// `λ ← λ + μ h` for equalities, `λ ← max(0, λ − μ g)` for the floor.
    fn update_multipliers(&mut self, residuals: &[f64]) {
        let mu = self.penalty;
        for ((lambda, c), &r) in self.multipliers.iter_mut().zip(self.constraints).zip(residuals) {
            *lambda = if c.is_equality() { *lambda + mu * r } else { (*lambda - mu * r).max(0.0) };
        }
    }
}

impl LogLikelihood for Augmented<'_> {
    type Data = ();

    fn value(&self, z: &Theta, _: &()) -> OptResult<f64> {
        let (allocation, eval) = self.evaluate(z)?;
        let mu = self.penalty;
        let mut total = self.objective.score(&eval, self.zero_response) / self.objective_scale;
        for ((c, r), lambda) in self
            .constraints
            .iter()
            .zip(self.relative_residuals(&allocation, &eval))
            .zip(self.multipliers.iter())
        {
            if c.is_equality() {
                total -= lambda * r + 0.5 * mu * r * r;
            } else {
                let shifted = (lambda - mu * r).max(0.0);
                total -= (shifted * shifted - lambda * lambda) / (2.0 * mu);
            }
        }
        Ok(total)
    }

    fn check(&self, z: &Theta, _: &()) -> OptResult<()> {
        validate_theta_input(z, self.space.dim())?;
        validate_value(self.value(z, &())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::core::{ColumnSelector, EffectParams, TargetSeries};
    use crate::effects::kinds::{HillSaturation, TrendEffect};
    use crate::pipeline::{EffectNode, Pipeline, TargetLikelihood};
    use approx::assert_relative_eq;
    use ndarray::array;

    /// Flat level 10 plus one Hill curve per channel; `tv` saturates at 6,
    /// `search` at 3.
    fn fitted() -> (FittedPipeline, ExogFrame) {
        let index = TimeIndex::range(0, 4).unwrap();
        let exog = ExogFrame::new(
            index.clone(),
            vec!["tv".into(), "search".into()],
            array![[5.0, 5.0], [5.0, 5.0], [5.0, 5.0], [5.0, 5.0]],
        )
        .unwrap();
        let target = TargetSeries::new(index, Array1::from_elem(4, 12.0)).unwrap();
        let pipeline = Pipeline::builder()
            .with_trend(TrendEffect::flat())
            .with_effect(
                EffectNode::new("tv", HillSaturation::default()).with_selector(ColumnSelector::names(["tv"])),
            )
            .with_effect(
                EffectNode::new("search", HillSaturation::default())
                    .with_selector(ColumnSelector::names(["search"])),
            )
            .with_likelihood(TargetLikelihood::normal().with_fixed_noise(0.1))
            .scale_target(false)
            .build()
            .unwrap();
        let mut set = ParamSet::default();
        set.insert("trend", EffectParams::default().with("level", array![10.0]));
        let hill = |max: f64| {
            EffectParams::default()
                .with("half_max", array![10.0])
                .with("slope", array![1.0])
                .with("max_effect", array![max])
        };
        set.insert("tv", hill(6.0));
        set.insert("search", hill(3.0));
        set.insert("likelihood", EffectParams::default());
        (pipeline.with_params(&target, Some(&exog), &set).unwrap(), exog)
    }

    fn channels() -> Vec<String> {
        vec!["tv".into(), "search".into()]
    }

    #[test]
    // Purpose
    // -------
    // A total-budget equality is met and spend tilts to the stronger
    // channel.
    //
    // Given
    // -----
    // - Two Hill channels with equal half-max; tv saturates twice as high.
    // - Maximize response with total budget 80 over the last two periods.
    //
    // Expect
    // ------
    // - Total spend ≈ 80, tv receives more than search, status not
    //   Infeasible.
    fn total_budget_is_met() {
        // Arrange
        let (fitted, exog) = fitted();
        let optimizer = BudgetOptimizer::new(Objective::MaximizeResponse)
            .with_constraint(BudgetConstraint::TotalBudget { total: 80.0 });

        // Act
        let solution = optimizer.optimize(&fitted, &exog, &channels(), (2, 3), &RunContext::default()).unwrap();

        // Assert
        assert_ne!(solution.status, BudgetStatus::Infeasible);
        assert_relative_eq!(solution.total_spend(), 80.0, max_relative = 1e-3);
        assert!(solution.channel_total("tv").unwrap() > solution.channel_total("search").unwrap());
        assert_eq!(solution.allocation.dim(), (2, 2));
        assert!(solution.response > solution.baseline_response);
    }

    #[test]
    // Purpose
    // -------
    // A response floor above what the capped budget can buy is reported as
    // infeasible.
    //
    // Given
    // -----
    // - Total budget 10 and a floor of 1000 on a response bounded by
    //   `2 × (10 + 6 + 3)`.
    //
    // Expect
    // ------
    // - `Infeasible` with a positive violation on the floor; spend stays
    //   non-negative.
    fn unreachable_floor_is_infeasible() {
        // Arrange
        let (fitted, exog) = fitted();
        let optimizer = BudgetOptimizer::new(Objective::MaximizeResponse)
            .with_constraint(BudgetConstraint::TotalBudget { total: 10.0 })
            .with_constraint(BudgetConstraint::MinResponse { target: 1000.0 });

        // Act
        let solution = optimizer.optimize(&fitted, &exog, &channels(), (2, 3), &RunContext::default()).unwrap();

        // Assert
        assert_eq!(solution.status, BudgetStatus::Infeasible);
        assert!(solution.constraints[1].violation > 0.9);
        assert!(solution.allocation.iter().all(|&x| x >= 0.0));
    }

    #[test]
    // Purpose
    // -------
    // A spend-minimizing run that starts exactly on its response floor is
    // not reported as infeasible, even when early inner solves overshoot
    // toward zero spend.
    //
    // Given
    // -----
    // - Minimize budget subject to a floor of 26, the baseline response at
    //   spend 5 per cell over periods 2..=3.
    //
    // Expect
    // ------
    // - Status not `Infeasible`; the floor holds within tolerance; spend
    //   does not exceed the baseline 20.
    fn floor_met_at_start_stays_feasible() {
        // Arrange
        let (fitted, exog) = fitted();
        let optimizer = BudgetOptimizer::new(Objective::MinimizeBudget)
            .with_constraint(BudgetConstraint::MinResponse { target: 26.0 });

        // Act
        let solution = optimizer.optimize(&fitted, &exog, &channels(), (2, 3), &RunContext::default()).unwrap();

        // Assert
        assert_relative_eq!(solution.baseline_response, 26.0, max_relative = 1e-9);
        assert_ne!(solution.status, BudgetStatus::Infeasible);
        assert!(solution.constraints[0].violation <= 1e-4);
        assert!(solution.response >= 26.0 * (1.0 - 1e-4));
        assert!(solution.total_spend() <= 20.0 + 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Malformed problems are rejected before solving.
    //
    // Given
    // -----
    // - An unknown channel, a duplicated channel and a window outside the
    //   frame.
    //
    // Expect
    // ------
    // - `UnknownChannel`, `DuplicateChannel`, `EmptyHorizon`.
    fn malformed_problems_are_rejected() {
        // Arrange
        let (fitted, exog) = fitted();
        let optimizer = BudgetOptimizer::new(Objective::MaximizeResponse);
        let ctx = RunContext::default();

        // Act
        let unknown = optimizer.optimize(&fitted, &exog, &["radio".to_string()], (0, 3), &ctx);
        let duplicate = optimizer.optimize(&fitted, &exog, &["tv".to_string(), "tv".to_string()], (0, 3), &ctx);
        let empty = optimizer.optimize(&fitted, &exog, &channels(), (50, 60), &ctx);

        // Assert
        assert!(matches!(unknown, Err(BudgetError::UnknownChannel { .. })));
        assert!(matches!(duplicate, Err(BudgetError::DuplicateChannel { .. })));
        assert_eq!(empty, Err(BudgetError::EmptyHorizon { start: 50, end: 60 }));
    }
}
