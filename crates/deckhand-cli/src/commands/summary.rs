use anyhow::{Context, Result};
use colored::Colorize;
use deckhand_sync::{ApaSummary, Ledger};
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::debug;

use super::money;
use super::reconcile::print_result;

/// Read a ledger JSON file (`{ "advances": [...], "expenses": [...] }`)
pub fn load_ledger(path: &Path) -> Result<Ledger> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read ledger: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse ledger: {}", path.display()))
}

pub fn execute(path: &Path, cash: Option<f64>, json: bool) -> Result<()> {
    let ledger = load_ledger(path)?;
    debug!(
        advances = ledger.advances.len(),
        expenses = ledger.expenses.len(),
        "Loaded ledger"
    );

    let summary = ApaSummary::from_ledger(&ledger);
    let reconciliation = cash.map(|cash| summary.reconcile(cash));

    if json {
        let output = json!({
            "summary": summary,
            "reconciliation": reconciliation,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "APA summary".bold());
    println!();
    println!("  Advances:    {}", money(summary.total_advances));
    println!("  Expenses:    {}", money(summary.total_expenses));

    let remaining = format!("  Remaining:   {}", money(summary.remaining));
    if summary.over_budget {
        println!("{}", remaining.red());
    } else {
        println!("{}", remaining);
    }
    println!("  Used:        {:.1}%", summary.percent_used);

    if !summary.by_category.is_empty() {
        println!();
        println!("{}", "By category".bold());
        for category in &summary.by_category {
            println!(
                "  {:<14} {:>12}  ({})",
                category.category.as_str(),
                money(category.total),
                category.count
            );
        }
    }

    let missing = ledger.expenses_missing_receipts().count();
    if missing > 0 {
        println!();
        println!("  {} {} expense(s) without an uploaded receipt", "⚠".yellow(), missing);
    }

    if let Some(result) = reconciliation {
        println!();
        print_result(&result);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_ledger() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "advances": [{{ "id": "a1", "booking_id": "bk-1", "amount": 1000.0, "received_at": "2026-07-01T09:00:00Z" }}],
                "expenses": [{{ "id": "e1", "booking_id": "bk-1", "amount": 400.0, "category": "crew", "spent_at": "2026-07-02T09:00:00Z" }}]
            }}"#
        )
        .unwrap();

        let ledger = load_ledger(file.path()).unwrap();
        assert_eq!(ledger.total_advances(), 1000.0);
        assert_eq!(ledger.total_expenses(), 400.0);
    }

    #[test]
    fn test_load_ledger_rejects_negative_amounts() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "expenses": [{{ "id": "e1", "booking_id": "bk-1", "amount": -5.0, "spent_at": "2026-07-02T09:00:00Z" }}] }}"#
        )
        .unwrap();

        let err = load_ledger(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse ledger"));
    }

    #[test]
    fn test_missing_file() {
        assert!(load_ledger(Path::new("/nonexistent/ledger.json")).is_err());
    }
}
