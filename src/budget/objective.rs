//! What the allocation is scored on.
use serde::{Deserialize, Serialize};

/// Spend below this is treated as no spend when computing ROI.
pub const MIN_SPEND: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    /// Sum of the predicted mean over the horizon.
    #[default]
    MaximizeResponse,
    /// `(response(x) − response(0)) / total spend`.
    MaximizeRoi,
    /// Total spend; pair with a response floor.
    MinimizeBudget,
}

/// Raw-unit outcome of one allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub response: f64,
    pub total_spend: f64,
}

impl Objective {
    /// Objective in its natural direction.
    pub fn value(&self, eval: &Evaluation, zero_response: f64) -> f64 {
        match self {
            Objective::MaximizeResponse => eval.response,
            Objective::MaximizeRoi => (eval.response - zero_response) / eval.total_spend.max(MIN_SPEND),
            Objective::MinimizeBudget => eval.total_spend,
        }
    }

    /// `value` oriented for a maximizer.
    pub fn score(&self, eval: &Evaluation, zero_response: f64) -> f64 {
        match self {
            Objective::MinimizeBudget => -self.value(eval, zero_response),
            _ => self.value(eval, zero_response),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    // Purpose
    // -------
    // Each objective reads the right quantity and orientation.
    //
    // Given
    // -----
    // - Response 120 at spend 40, response 100 at zero spend.
    //
    // Expect
    // ------
    // - Response 120, ROI 0.5, budget value 40 scored as −40.
    fn objectives_read_response_and_spend() {
        // Arrange
        let eval = Evaluation { response: 120.0, total_spend: 40.0 };

        // Act
        let response = Objective::MaximizeResponse.score(&eval, 100.0);
        let roi = Objective::MaximizeRoi.score(&eval, 100.0);
        let budget = Objective::MinimizeBudget.value(&eval, 100.0);
        let budget_score = Objective::MinimizeBudget.score(&eval, 100.0);

        // Assert
        assert_relative_eq!(response, 120.0);
        assert_relative_eq!(roi, 0.5);
        assert_relative_eq!(budget, 40.0);
        assert_relative_eq!(budget_score, -40.0);
    }
}
