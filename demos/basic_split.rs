//! Basic expense-splitting example

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use splitledger_core::utils::MemoryStorage;
use splitledger_core::{Expense, HouseholdLedger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    println!("🏠 Splitledger Core - Basic Split Example\n");

    // Create a new ledger with in-memory storage
    let storage = MemoryStorage::new();
    let mut ledger = HouseholdLedger::new(storage);

    // 1. Register members and form a household
    println!("👥 Setting up the household...");
    let anna = ledger.register_member("anna".to_string()).await?;
    let ben = ledger.register_member("ben".to_string()).await?;
    let cleo = ledger.register_member("cleo".to_string()).await?;

    let flat = ledger.create_household("Flat 12".to_string(), anna.id).await?;
    ledger
        .apply_membership_change(flat.id, &[ben.id, cleo.id], &[], anna.id)
        .await?;
    println!("  ✓ '{}' with anna, ben, and cleo\n", flat.name);

    // 2. Record shared expenses
    println!("💰 Recording shared expenses...\n");

    let groceries = Expense::new(
        flat.id,
        anna.id,
        "Weekly groceries".to_string(),
        BigDecimal::from(30),
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
    );
    let generated = ledger.record_expense(groceries).await?;
    println!(
        "  ✓ Anna paid 30 for groceries -> {} splits of 10 each",
        generated.len()
    );

    let internet = Expense::new(
        flat.id,
        ben.id,
        "Internet bill".to_string(),
        BigDecimal::from(45),
        NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
    );
    ledger.record_expense(internet).await?;
    println!("  ✓ Ben paid 45 for internet -> splits of 15 each\n");

    // 3. Who owes whom, from each member's perspective
    println!("📒 Balance ledgers (positive = you owe them)...\n");
    for member in [&anna, &ben, &cleo] {
        let view = ledger.compute_ledger(flat.id, member.id).await?;
        println!("  {}'s ledger:", member.username);
        for (counterpart_id, amount) in view.ranked() {
            println!("    {} -> {}", counterpart_id, amount);
        }
        println!();
    }

    // 4. The grouped unpaid-splits view used for display
    let grouped = ledger.unpaid_splits_by_counterpart(flat.id, anna.id).await?;
    println!("🔎 Anna's unpaid splits by counterpart:");
    for (counterpart_id, splits) in &grouped {
        println!(
            "  {}: owed to anna {}, owed by anna {}, net {}",
            counterpart_id,
            splits.owed_to_viewer.len(),
            splits.owed_by_viewer.len(),
            splits.net_amount()
        );
    }
    println!();

    // 5. Check the books
    let report = ledger.validate_household_integrity(flat.id).await?;
    println!(
        "✅ Integrity: {} ({} expenses, {} splits)",
        if report.is_valid { "ok" } else { "issues found" },
        report.expense_count,
        report.split_count
    );

    Ok(())
}
