//! budget — spend allocation against a fitted pipeline.
//!
//! Purpose
//! -------
//! Invert a [`FittedPipeline`](crate::pipeline::FittedPipeline): choose
//! non-negative spend per channel and period that optimizes an [`Objective`]
//! subject to budget equalities and a response floor.
//!
//! Key behaviors
//! -------------
//! - [`Parametrization`] maps an unconstrained decision vector to an
//!   allocation matrix; negative spend cannot be expressed.
//! - [`BudgetOptimizer`] solves the constrained problem with an augmented
//!   Lagrangian whose inner problems run through the same L-BFGS layer as
//!   MAP fitting.
//! - Outcomes carry a [`BudgetStatus`] (`Optimal`, `Infeasible`,
//!   `NonConverged`) plus per-constraint values and violations.
//!
//! Conventions
//! -----------
//! - Responses are sums of the predicted mean over the decision horizon, in
//!   raw target units, at the point estimate of the fitted parameters.
//! - Constraint tolerances are relative to each constraint's magnitude.

pub mod constraints;
pub mod errors;
pub mod objective;
pub mod optimizer;
pub mod parametrization;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::constraints::{BudgetConstraint, ConstraintReport};
pub use self::errors::{BudgetError, BudgetResult};
pub use self::objective::{Evaluation, Objective};
pub use self::optimizer::{BudgetOptimizer, BudgetSolution, BudgetStatus, SolverOptions};
pub use self::parametrization::{AllocationSpace, Parametrization};

pub mod prelude {
    pub use super::constraints::BudgetConstraint;
    pub use super::errors::{BudgetError, BudgetResult};
    pub use super::objective::Objective;
    pub use super::optimizer::{BudgetOptimizer, BudgetSolution, BudgetStatus};
    pub use super::parametrization::Parametrization;
}
