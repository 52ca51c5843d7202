// File: deckhand-sync/src/apa.rs
// Purpose: APA budget tracking over a booking's advances and expenses

use serde::Serialize;
use std::collections::BTreeMap;

use crate::ledger::{Advance, Expense, ExpenseCategory, Ledger};
use crate::reconciliation::{reconcile, ReconciliationResult};

/// Spending in one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub total: f64,
    pub count: usize,
}

/// Where the APA stands for a booking
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApaSummary {
    pub total_advances: f64,
    pub total_expenses: f64,
    /// Advances minus expenses; this is the cash that should be on board
    pub remaining: f64,
    /// Share of advances spent, 0 when nothing was advanced
    pub percent_used: f64,
    pub over_budget: bool,
    /// Largest category first
    pub by_category: Vec<CategoryTotal>,
}

impl ApaSummary {
    pub fn compute(advances: &[Advance], expenses: &[Expense]) -> Self {
        let total_advances: f64 = advances.iter().map(|a| a.amount.value()).sum();
        let total_expenses: f64 = expenses.iter().map(|e| e.amount.value()).sum();

        let percent_used = if total_advances > 0.0 {
            total_expenses / total_advances * 100.0
        } else {
            0.0
        };

        let mut grouped: BTreeMap<ExpenseCategory, CategoryTotal> = BTreeMap::new();
        for expense in expenses {
            let entry = grouped.entry(expense.category).or_insert(CategoryTotal {
                category: expense.category,
                total: 0.0,
                count: 0,
            });
            entry.total += expense.amount.value();
            entry.count += 1;
        }

        let mut by_category: Vec<CategoryTotal> = grouped.into_values().collect();
        by_category.sort_by(|a, b| b.total.total_cmp(&a.total));

        Self {
            total_advances,
            total_expenses,
            remaining: total_advances - total_expenses,
            percent_used,
            over_budget: total_expenses > total_advances,
            by_category,
        }
    }

    pub fn from_ledger(ledger: &Ledger) -> Self {
        Self::compute(&ledger.advances, &ledger.expenses)
    }

    /// Reconcile counted cash against this summary's totals
    pub fn reconcile(&self, actual_cash: f64) -> ReconciliationResult {
        reconcile(self.total_advances, self.total_expenses, actual_cash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Amount;
    use crate::reconciliation::ReconciliationLabel;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn advance(amount: f64) -> Advance {
        Advance {
            id: format!("adv-{}", amount),
            booking_id: "bk-1".to_string(),
            amount: Amount::new(amount).unwrap(),
            received_at: Utc::now(),
            note: None,
        }
    }

    fn expense(amount: f64, category: ExpenseCategory) -> Expense {
        Expense {
            id: format!("exp-{}", amount),
            booking_id: "bk-1".to_string(),
            amount: Amount::new(amount).unwrap(),
            category,
            description: String::new(),
            spent_at: Utc::now(),
            receipt_url: None,
        }
    }

    #[test]
    fn test_summary_totals_and_categories() {
        let summary = ApaSummary::compute(
            &[advance(1000.0)],
            &[
                expense(150.0, ExpenseCategory::Fuel),
                expense(200.0, ExpenseCategory::Provisioning),
                expense(50.0, ExpenseCategory::Fuel),
            ],
        );

        assert_eq!(summary.total_advances, 1000.0);
        assert_eq!(summary.total_expenses, 400.0);
        assert_eq!(summary.remaining, 600.0);
        assert_eq!(summary.percent_used, 40.0);
        assert!(!summary.over_budget);
        assert_eq!(
            summary.by_category,
            vec![
                CategoryTotal { category: ExpenseCategory::Fuel, total: 200.0, count: 2 },
                CategoryTotal { category: ExpenseCategory::Provisioning, total: 200.0, count: 1 },
            ]
        );
    }

    #[test]
    fn test_over_budget() {
        let summary = ApaSummary::compute(&[advance(100.0)], &[expense(250.0, ExpenseCategory::Marina)]);
        assert!(summary.over_budget);
        assert_eq!(summary.remaining, -150.0);
        assert_eq!(summary.percent_used, 250.0);
    }

    #[test]
    fn test_no_advances() {
        let summary = ApaSummary::compute(&[], &[expense(20.0, ExpenseCategory::Other)]);
        assert_eq!(summary.percent_used, 0.0);
        assert!(summary.over_budget);
    }

    #[test]
    fn test_reconcile_from_summary() {
        let summary = ApaSummary::compute(&[advance(1000.0)], &[expense(400.0, ExpenseCategory::Crew)]);

        assert_eq!(summary.reconcile(600.0).label, ReconciliationLabel::Balanced);
        assert_eq!(summary.reconcile(650.0).label, ReconciliationLabel::Surplus);
        assert_eq!(summary.reconcile(500.0).difference, -100.0);
    }
}
