// File: deckhand-sync/src/ledger.rs
// Purpose: Advances and expenses recorded against a booking

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A validated, non-negative, finite money amount
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Amount(f64);

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum AmountError {
    #[error("amount must be a finite number, got {0}")]
    NotFinite(f64),
    #[error("amount must not be negative, got {0}")]
    Negative(f64),
}

impl Amount {
    pub const ZERO: Amount = Amount(0.0);

    pub fn new(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            Err(AmountError::NotFinite(value))
        } else if value < 0.0 {
            Err(AmountError::Negative(value))
        } else {
            Ok(Self(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Amount {
    type Error = AmountError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for f64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// What an expense was spent on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Fuel,
    Provisioning,
    Marina,
    Crew,
    Maintenance,
    Beverages,
    #[default]
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Fuel => "fuel",
            ExpenseCategory::Provisioning => "provisioning",
            ExpenseCategory::Marina => "marina",
            ExpenseCategory::Crew => "crew",
            ExpenseCategory::Maintenance => "maintenance",
            ExpenseCategory::Beverages => "beverages",
            ExpenseCategory::Other => "other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cash advanced by guests for onboard spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advance {
    pub id: String,
    pub booking_id: String,
    pub amount: Amount,
    pub received_at: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Money spent from the APA
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub booking_id: String,
    pub amount: Amount,
    #[serde(default)]
    pub category: ExpenseCategory,
    #[serde(default)]
    pub description: String,
    pub spent_at: DateTime<Utc>,
    /// Remote URL of the receipt photo once uploaded
    #[serde(default)]
    pub receipt_url: Option<String>,
}

/// All advances and expenses of a booking
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub advances: Vec<Advance>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
}

impl Ledger {
    pub fn total_advances(&self) -> f64 {
        self.advances.iter().map(|a| a.amount.value()).sum()
    }

    pub fn total_expenses(&self) -> f64 {
        self.expenses.iter().map(|e| e.amount.value()).sum()
    }

    /// Expenses still waiting for a receipt URL
    pub fn expenses_missing_receipts(&self) -> impl Iterator<Item = &Expense> {
        self.expenses.iter().filter(|e| e.receipt_url.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_amount_validation() {
        assert_eq!(Amount::new(12.5).unwrap().value(), 12.5);
        assert_eq!(Amount::new(-1.0), Err(AmountError::Negative(-1.0)));
        assert!(matches!(Amount::new(f64::NAN), Err(AmountError::NotFinite(_))));
        assert!(matches!(Amount::new(f64::INFINITY), Err(AmountError::NotFinite(_))));
    }

    #[test]
    fn test_negative_amount_rejected_on_deserialize() {
        let result: Result<Ledger, _> = serde_json::from_value(json!({
            "advances": [{
                "id": "a1",
                "booking_id": "bk-1",
                "amount": -50.0,
                "received_at": "2026-07-01T09:00:00Z"
            }]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_ledger_totals() {
        let ledger: Ledger = serde_json::from_value(json!({
            "advances": [
                { "id": "a1", "booking_id": "bk-1", "amount": 5000.0, "received_at": "2026-07-01T09:00:00Z" },
                { "id": "a2", "booking_id": "bk-1", "amount": 1500.0, "received_at": "2026-07-03T09:00:00Z" }
            ],
            "expenses": [
                { "id": "e1", "booking_id": "bk-1", "amount": 820.5, "category": "fuel", "spent_at": "2026-07-02T12:00:00Z" },
                { "id": "e2", "booking_id": "bk-1", "amount": 300.0, "spent_at": "2026-07-02T18:00:00Z",
                  "receipt_url": "https://blobs.example/e2.jpg" }
            ]
        }))
        .unwrap();

        assert_eq!(ledger.total_advances(), 6500.0);
        assert_eq!(ledger.total_expenses(), 1120.5);
        assert_eq!(ledger.expenses[1].category, ExpenseCategory::Other);
        assert_eq!(ledger.expenses_missing_receipts().count(), 1);
    }

    #[test]
    fn test_category_defaults_to_other() {
        assert_eq!(ExpenseCategory::default(), ExpenseCategory::Other);
    }

    #[test]
    fn test_amount_display() {
        assert_eq!(Amount::new(7.5).unwrap().to_string(), "7.50");
    }
}
