//! Cash reconciliation over realistic booking ledgers

use deckhand_sync::{reconcile, ApaSummary, Ledger, ReconciliationLabel};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn week_charter() -> Ledger {
    serde_json::from_value(json!({
        "advances": [
            { "id": "a1", "booking_id": "bk-42", "amount": 8000.0, "received_at": "2026-08-01T10:00:00Z" },
            { "id": "a2", "booking_id": "bk-42", "amount": 2000.0, "received_at": "2026-08-04T10:00:00Z",
              "note": "top-up after Hvar" }
        ],
        "expenses": [
            { "id": "e1", "booking_id": "bk-42", "amount": 1250.0, "category": "fuel", "spent_at": "2026-08-02T08:00:00Z" },
            { "id": "e2", "booking_id": "bk-42", "amount": 2300.0, "category": "provisioning", "spent_at": "2026-08-01T15:00:00Z" },
            { "id": "e3", "booking_id": "bk-42", "amount": 450.0, "category": "marina", "spent_at": "2026-08-03T19:00:00Z" },
            { "id": "e4", "booking_id": "bk-42", "amount": 1000.0, "category": "fuel", "spent_at": "2026-08-05T08:00:00Z" }
        ]
    }))
    .unwrap()
}

#[test]
fn test_summary_from_ledger() {
    let summary = ApaSummary::from_ledger(&week_charter());

    assert_eq!(summary.total_advances, 10000.0);
    assert_eq!(summary.total_expenses, 5000.0);
    assert_eq!(summary.remaining, 5000.0);
    assert_eq!(summary.percent_used, 50.0);
    assert!(!summary.over_budget);

    let order: Vec<_> = summary.by_category.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(order, vec!["provisioning", "fuel", "marina"]);
}

#[rstest]
#[case(5000.0, ReconciliationLabel::Balanced)]
#[case(5000.004, ReconciliationLabel::Balanced)]
#[case(5050.0, ReconciliationLabel::Surplus)]
#[case(4900.0, ReconciliationLabel::Shortage)]
fn test_end_of_charter_count(#[case] counted: f64, #[case] label: ReconciliationLabel) {
    let result = ApaSummary::from_ledger(&week_charter()).reconcile(counted);
    assert_eq!(result.expected_cash, 5000.0);
    assert_eq!(result.label, label);
}

#[test]
fn test_difference_sign_matches_label() {
    for actual in [0.0, 10.0, 99.0, 100.0, 101.0, 250.0] {
        let result = reconcile(300.0, 200.0, actual);
        assert_eq!(result.expected_cash, 100.0);
        assert_eq!(result.difference, actual - 100.0);

        match result.label {
            ReconciliationLabel::Balanced => assert!(result.difference.abs() < 0.01),
            ReconciliationLabel::Surplus => assert!(result.difference > 0.0),
            ReconciliationLabel::Shortage => assert!(result.difference < 0.0),
        }
    }
}
