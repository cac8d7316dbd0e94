//! Integration tests for budget allocation over a fitted pipeline.
//!
//! Purpose
//! -------
//! - Validate that allocations honor budget equalities, fixed splits and
//!   shared budgets on a MAP-fitted media pipeline.
//! - Confirm that unreachable response floors are reported, not clamped.
//!
//! Coverage
//! --------
//! - `budget::BudgetOptimizer` with `PerChannel` and `TotalSplit`
//!   parametrizations, all three constraint kinds, and the response and
//!   budget objectives.
//!
//! Exclusions
//! ----------
//! - Parametrization and constraint arithmetic, covered by unit tests.
use effect_engine::budget::{
    BudgetConstraint, BudgetOptimizer, BudgetSolution, BudgetStatus, Objective, Parametrization,
};
use effect_engine::context::RunContext;
use effect_engine::effects::core::{ColumnSelector, ExogFrame, TargetSeries, TimeIndex};
use effect_engine::effects::kinds::{ChainedEffect, GeometricAdstock, HillSaturation, TrendEffect};
use effect_engine::inference::InferenceEngine;
use effect_engine::pipeline::{EffectNode, FittedPipeline, Pipeline, TargetLikelihood};
use approx::assert_relative_eq;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const N: usize = 60;
const HORIZON: (i64, i64) = (52, 59);

/// Route `RUST_LOG`-filtered events to the test harness's captured output.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn hill(x: f64, half_max: f64, max_effect: f64) -> f64 {
    if x <= 0.0 { 0.0 } else { max_effect * x / (half_max + x) }
}

/// MAP fit of a two-channel media model on seeded data.
fn fitted() -> (FittedPipeline, ExogFrame) {
    init_logging();
    let index = TimeIndex::range(0, N).unwrap();
    let mut rng = StdRng::seed_from_u64(23);
    let mut spend = Array2::zeros((N, 2));
    for t in 0..N {
        spend[[t, 0]] = rng.random_range(5.0..35.0);
        spend[[t, 1]] = rng.random_range(5.0..35.0);
    }
    let mut carry = 0.0;
    let y: Array1<f64> = (0..N)
        .map(|t| {
            carry = spend[[t, 0]] + 0.4 * carry;
            10.0 + hill(carry, 15.0, 6.0) + hill(spend[[t, 1]], 10.0, 3.0) + rng.random_range(-0.05..0.05)
        })
        .collect();
    let exog = ExogFrame::new(index.clone(), vec!["tv".into(), "search".into()], spend).unwrap();
    let target = TargetSeries::new(index, y).unwrap();

    let tv = ChainedEffect::new()
        .then("adstock", GeometricAdstock::default().into())
        .then("saturation", HillSaturation::default().into());
    let pipeline = Pipeline::builder()
        .with_trend(TrendEffect::flat())
        .with_effect(EffectNode::new("tv", tv).with_selector(ColumnSelector::names(["tv"])))
        .with_effect(
            EffectNode::new("search", HillSaturation::default()).with_selector(ColumnSelector::names(["search"])),
        )
        .with_likelihood(TargetLikelihood::normal().with_fixed_noise(0.01))
        .build()
        .unwrap();
    let fitted = pipeline.fit(&target, Some(&exog), &InferenceEngine::map(), &RunContext::new("budget-fit", 0)).unwrap();
    (fitted, exog)
}

fn channels() -> Vec<String> {
    vec!["tv".into(), "search".into()]
}

/// Horizon sum of the fitted mean at the frame's own spend.
fn baseline_response(fitted: &FittedPipeline, exog: &ExogFrame) -> f64 {
    let rows = exog.index().window(HORIZON.0, HORIZON.1);
    fitted.point_mean(exog).unwrap().slice(ndarray::s![rows]).sum()
}

fn solve(optimizer: &BudgetOptimizer) -> BudgetSolution {
    let (fitted, exog) = fitted();
    optimizer.optimize(&fitted, &exog, &channels(), HORIZON, &RunContext::new("budget", 0)).unwrap()
}

#[test]
// Purpose
// -------
// A total-budget equality is met by a per-channel allocation.
//
// Given
// -----
// - Maximize response over periods 52..=59 with total budget 300.
//
// Expect
// ------
// - Channel totals sum to 300 (relative 1e-3); eight periods per channel;
//   no negative spend; a feasible status.
fn total_budget_equality_holds() {
    // Arrange
    let optimizer = BudgetOptimizer::new(Objective::MaximizeResponse)
        .with_constraint(BudgetConstraint::TotalBudget { total: 300.0 });

    // Act
    let solution = solve(&optimizer);

    // Assert
    assert_ne!(solution.status, BudgetStatus::Infeasible);
    let total = solution.channel_total("tv").unwrap() + solution.channel_total("search").unwrap();
    assert_relative_eq!(total, 300.0, max_relative = 1e-3);
    assert_eq!(solution.channel_allocation("tv").unwrap().len(), 8);
    assert_eq!(solution.horizon.len(), 8);
    assert!(solution.allocation.iter().all(|&x| x >= 0.0));
    assert!(solution.max_violation() <= 1e-3);
}

#[test]
// Purpose
// -------
// Fixed split ratios and shared budgets pin channel totals.
//
// Given
// -----
// - `TotalSplit { [2, 1] }` with total 300.
// - `PerChannel` with total 300 and a shared budget of 100 on tv.
//
// Expect
// ------
// - tv ≈ 200 under the split; tv ≈ 100 and search ≈ 200 under the shared
//   budget.
fn split_and_shared_budgets_pin_totals() {
    // Arrange
    let split = BudgetOptimizer::new(Objective::MaximizeResponse)
        .with_parametrization(Parametrization::TotalSplit { ratios: vec![2.0, 1.0] })
        .with_constraint(BudgetConstraint::TotalBudget { total: 300.0 });
    let shared = BudgetOptimizer::new(Objective::MaximizeResponse)
        .with_constraint(BudgetConstraint::TotalBudget { total: 300.0 })
        .with_constraint(BudgetConstraint::SharedBudget { channels: vec!["tv".into()], total: 100.0 });

    // Act
    let by_split = solve(&split);
    let by_shared = solve(&shared);

    // Assert
    assert_relative_eq!(by_split.channel_total("tv").unwrap(), 200.0, max_relative = 1e-3);
    assert_relative_eq!(by_split.channel_total("search").unwrap(), 100.0, max_relative = 1e-3);
    assert_relative_eq!(by_shared.channel_total("tv").unwrap(), 100.0, max_relative = 1e-3);
    assert_relative_eq!(by_shared.channel_total("search").unwrap(), 200.0, max_relative = 1e-3);
}

#[test]
// Purpose
// -------
// An unreachable response floor under a budget cap is infeasible.
//
// Given
// -----
// - Total budget 50 and a floor of ten times the baseline horizon response.
//
// Expect
// ------
// - `Infeasible`, the floor's report carries a large violation, and the
//   allocation is still non-negative.
fn unreachable_floor_is_infeasible() {
    // Arrange
    let (fitted, exog) = fitted();
    let ctx = RunContext::default();
    let optimizer = BudgetOptimizer::new(Objective::MaximizeResponse)
        .with_constraint(BudgetConstraint::TotalBudget { total: 50.0 })
        .with_constraint(BudgetConstraint::MinResponse { target: 10.0 * baseline_response(&fitted, &exog) });

    // Act
    let solution = optimizer.optimize(&fitted, &exog, &channels(), HORIZON, &ctx).unwrap();

    // Assert
    assert_eq!(solution.status, BudgetStatus::Infeasible);
    assert!(solution.constraints[1].violation > 0.5);
    assert!(solution.allocation.iter().all(|&x| x >= 0.0));
}

#[test]
// Purpose
// -------
// Minimizing spend under a reachable floor does not overspend.
//
// Given
// -----
// - Floor equal to the baseline horizon response.
//
// Expect
// ------
// - A feasible status, response at the floor (relative 1e-3) and no more
//   spend than the baseline.
fn minimize_budget_meets_floor() {
    // Arrange
    let (fitted, exog) = fitted();
    let ctx = RunContext::default();
    let rows = exog.index().window(HORIZON.0, HORIZON.1);
    let baseline_spend = exog.values().slice(ndarray::s![rows, ..]).sum();
    let floor = baseline_response(&fitted, &exog);
    let optimizer = BudgetOptimizer::new(Objective::MinimizeBudget)
        .with_constraint(BudgetConstraint::MinResponse { target: floor });

    // Act
    let solution = optimizer.optimize(&fitted, &exog, &channels(), HORIZON, &ctx).unwrap();

    // Assert
    assert_ne!(solution.status, BudgetStatus::Infeasible);
    assert!(solution.response >= floor * (1.0 - 1e-3));
    assert!(solution.total_spend() <= baseline_spend * 1.01);
    assert_relative_eq!(solution.objective, solution.total_spend(), max_relative = 1e-12);
}
