use anyhow::Result;
use colored::{ColoredString, Colorize};
use deckhand_sync::{reconcile, ReconciliationLabel, ReconciliationResult};

use super::money;

pub fn execute(advances: f64, expenses: f64, cash: f64, json: bool) -> Result<()> {
    let result = reconcile(advances, expenses, cash);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_result(&result);
    Ok(())
}

pub fn print_result(result: &ReconciliationResult) {
    println!("{}", "Cash reconciliation".bold());
    println!();
    println!("  Expected:    {}", money(result.expected_cash));
    println!("  Counted:     {}", money(result.actual_cash));
    println!("  Difference:  {}", signed(result.difference));
    println!();
    println!("  {}", label(result.label).bold());
}

fn label(label: ReconciliationLabel) -> ColoredString {
    match label {
        ReconciliationLabel::Balanced => label.as_str().green(),
        ReconciliationLabel::Surplus => label.as_str().yellow(),
        ReconciliationLabel::Shortage => label.as_str().red(),
    }
}

fn signed(value: f64) -> String {
    if value > 0.0 {
        format!("+{}", money(value))
    } else {
        money(value)
    }
}
