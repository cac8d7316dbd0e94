//! Allocation constraints.
//!
//! Equalities hold when their residual is zero; the response floor holds when
//! its residual is non-negative. Residuals are divided by the constraint's
//! own magnitude before the solver sees them, so tolerances are relative.
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::budget::errors::{BudgetError, BudgetResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BudgetConstraint {
    /// Spend over all channels and periods equals `total`.
    TotalBudget { total: f64 },
    /// Spend over `channels` equals `total`.
    SharedBudget { channels: Vec<String>, total: f64 },
    /// Horizon response is at least `target`.
    MinResponse { target: f64 },
}

impl BudgetConstraint {
    pub fn is_equality(&self) -> bool {
        !matches!(self, BudgetConstraint::MinResponse { .. })
    }

    /// # Errors
    /// [`BudgetError::InvalidConstraint`] for non-positive totals, a
    /// non-finite target, or a shared budget over no or unknown channels.
    pub fn validate(&self, index: usize, channels: &[String]) -> BudgetResult<()> {
        let reason = match self {
            BudgetConstraint::TotalBudget { total } if !(total.is_finite() && *total > 0.0) => {
                Some("total must be positive and finite")
            }
            BudgetConstraint::SharedBudget { total, .. } if !(total.is_finite() && *total > 0.0) => {
                Some("total must be positive and finite")
            }
            BudgetConstraint::SharedBudget { channels: shared, .. } if shared.is_empty() => {
                Some("shared budget names no channels")
            }
            BudgetConstraint::SharedBudget { channels: shared, .. }
                if shared.iter().any(|c| !channels.contains(c)) =>
            {
                Some("shared budget names a channel outside the decision set")
            }
            BudgetConstraint::MinResponse { target } if !target.is_finite() => Some("target must be finite"),
            _ => None,
        };
        match reason {
            Some(reason) => Err(BudgetError::InvalidConstraint { index, reason }),
            None => Ok(()),
        }
    }

    /// Raw residual: `spend − total` for budgets, `response − target` for the
    /// floor.
    pub fn residual(&self, allocation: &Array2<f64>, channels: &[String], response: f64) -> f64 {
        match self {
            BudgetConstraint::TotalBudget { total } => allocation.sum() - total,
            BudgetConstraint::SharedBudget { channels: shared, total } => {
                let spend: f64 = channels
                    .iter()
                    .zip(allocation.axis_iter(Axis(0)))
                    .filter(|(c, _)| shared.contains(c))
                    .map(|(_, row)| row.sum())
                    .sum();
                spend - total
            }
            BudgetConstraint::MinResponse { target } => response - target,
        }
    }

    /// Divisor turning residuals into relative ones.
    pub fn magnitude(&self) -> f64 {
        match self {
            BudgetConstraint::TotalBudget { total } | BudgetConstraint::SharedBudget { total, .. } => *total,
            BudgetConstraint::MinResponse { target } => target.abs().max(1.0),
        }
    }

    /// Non-negative amount by which a relative residual breaks the
    /// constraint.
    pub fn violation(&self, relative_residual: f64) -> f64 {
        if self.is_equality() { relative_residual.abs() } else { (-relative_residual).max(0.0) }
    }
}

/// Value and violation of one constraint at the returned allocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintReport {
    pub constraint: BudgetConstraint,
    /// Spend for budget constraints, response for the floor.
    pub value: f64,
    /// Relative violation; zero when satisfied.
    pub violation: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn channels() -> Vec<String> {
        vec!["tv".into(), "search".into()]
    }

    #[test]
    // Purpose
    // -------
    // Residuals sum the right rows and the floor is one-sided.
    //
    // Given
    // -----
    // - Allocation rows summing to 30 (tv) and 70 (search), response 90.
    //
    // Expect
    // ------
    // - Total residual 0, shared(search = 50) residual 20, floor(100)
    //   residual −10 with relative violation 0.1, floor(80) no violation.
    fn residuals_and_violations() {
        // Arrange
        let alloc = array![[10.0, 20.0], [35.0, 35.0]];
        let total = BudgetConstraint::TotalBudget { total: 100.0 };
        let shared = BudgetConstraint::SharedBudget { channels: vec!["search".into()], total: 50.0 };
        let floor = BudgetConstraint::MinResponse { target: 100.0 };
        let low_floor = BudgetConstraint::MinResponse { target: 80.0 };

        // Act
        let r_total = total.residual(&alloc, &channels(), 90.0);
        let r_shared = shared.residual(&alloc, &channels(), 90.0);
        let r_floor = floor.residual(&alloc, &channels(), 90.0) / floor.magnitude();
        let r_low = low_floor.residual(&alloc, &channels(), 90.0) / low_floor.magnitude();

        // Assert
        assert_relative_eq!(r_total, 0.0, epsilon = 1e-12);
        assert_relative_eq!(r_shared, 20.0, epsilon = 1e-12);
        assert_relative_eq!(floor.violation(r_floor), 0.1, epsilon = 1e-12);
        assert_relative_eq!(low_floor.violation(r_low), 0.0);
    }

    #[test]
    // Purpose
    // -------
    // Malformed constraints are rejected with their position.
    //
    // Given
    // -----
    // - A zero total, a shared budget naming "radio", an infinite floor.
    //
    // Expect
    // ------
    // - `InvalidConstraint` with indices 0, 1, 2.
    fn malformed_constraints_are_rejected() {
        // Arrange
        let bad = [
            BudgetConstraint::TotalBudget { total: 0.0 },
            BudgetConstraint::SharedBudget { channels: vec!["radio".into()], total: 10.0 },
            BudgetConstraint::MinResponse { target: f64::INFINITY },
        ];

        // Act
        let errors: Vec<_> = bad.iter().enumerate().map(|(i, c)| c.validate(i, &channels())).collect();

        // Assert
        for (i, err) in errors.into_iter().enumerate() {
            assert!(matches!(err, Err(BudgetError::InvalidConstraint { index, .. }) if index == i));
        }
    }
}
