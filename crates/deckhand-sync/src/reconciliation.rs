//! End-of-booking cash reconciliation
//!
//! Money is carried as `f64`, so "balanced" means the counted cash is within
//! [`BALANCE_TOLERANCE`] of what the books say should be on hand.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Largest absolute difference (in currency units) still treated as balanced
pub const BALANCE_TOLERANCE: f64 = 0.01;

/// Totals entering a reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationInput {
    pub total_advances: f64,
    pub total_expenses: f64,
    pub actual_cash: f64,
}

impl ReconciliationInput {
    pub fn calculate(&self) -> ReconciliationResult {
        reconcile(self.total_advances, self.total_expenses, self.actual_cash)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconciliationLabel {
    Balanced,
    Surplus,
    Shortage,
}

impl ReconciliationLabel {
    /// Anything not balanced and not strictly positive is a shortage,
    /// including a zero difference paired with `balanced == false`.
    pub fn classify(difference: f64, balanced: bool) -> Self {
        if balanced {
            ReconciliationLabel::Balanced
        } else if difference > 0.0 {
            ReconciliationLabel::Surplus
        } else {
            ReconciliationLabel::Shortage
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationLabel::Balanced => "Balanced",
            ReconciliationLabel::Surplus => "Surplus",
            ReconciliationLabel::Shortage => "Shortage",
        }
    }
}

impl fmt::Display for ReconciliationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationResult {
    /// Advances minus expenses; negative when overspent
    pub expected_cash: f64,
    pub actual_cash: f64,
    /// Actual minus expected
    pub difference: f64,
    pub balanced: bool,
    pub label: ReconciliationLabel,
}

/// Compare counted cash against advances minus expenses.
///
/// NaN inputs yield a NaN difference, `balanced == false` and a shortage.
pub fn reconcile(total_advances: f64, total_expenses: f64, actual_cash: f64) -> ReconciliationResult {
    let expected_cash = total_advances - total_expenses;
    let difference = actual_cash - expected_cash;
    let balanced = difference.abs() < BALANCE_TOLERANCE;

    ReconciliationResult {
        expected_cash,
        actual_cash,
        difference,
        balanced,
        label: ReconciliationLabel::classify(difference, balanced),
    }
}
