//! Settlement workflow example

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use splitledger_core::utils::MemoryStorage;
use splitledger_core::{Expense, HouseholdLedger};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "debug".into()),
        )
        .init();

    println!("🤝 Splitledger Core - Settlement Example\n");

    let storage = MemoryStorage::new();
    let mut ledger = HouseholdLedger::new(storage);

    let anna = ledger.register_member("anna".to_string()).await?;
    let ben = ledger.register_member("ben".to_string()).await?;

    let flat = ledger.create_household("Flat 12".to_string(), anna.id).await?;
    ledger
        .apply_membership_change(flat.id, &[ben.id], &[], anna.id)
        .await?;

    // Expenses in both directions
    let groceries = Expense::new(
        flat.id,
        anna.id,
        "Groceries".to_string(),
        BigDecimal::from(30),
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
    );
    ledger.record_expense(groceries).await?;

    let utilities = Expense::new(
        flat.id,
        ben.id,
        "Utilities".to_string(),
        BigDecimal::from(60),
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
    );
    let utility_splits = ledger.record_expense(utilities).await?;

    let view = ledger.compute_ledger(flat.id, anna.id).await?;
    println!(
        "Before settlement, anna's balance with ben: {}",
        view.balance_with(ben.id)
    );

    // Settle one specific split: anna pays her share of the utilities
    let anna_split = utility_splits
        .iter()
        .find(|split| split.member_id == anna.id)
        .expect("anna owes a share of the utilities");
    ledger.mark_split_paid(anna_split.id, anna.id).await?;
    println!("anna settled her utilities share of {}", anna_split.amount_owed);

    let view = ledger.compute_ledger(flat.id, anna.id).await?;
    println!(
        "After the single split, anna's balance with ben: {}",
        view.balance_with(ben.id)
    );

    // Square up everything remaining between the pair, both directions
    let settled = ledger.settle_between(flat.id, anna.id, ben.id).await?;
    println!("settle_between cleared {} remaining split(s)", settled);

    // Settlement is idempotent: running it again settles nothing
    let settled_again = ledger.settle_between(flat.id, anna.id, ben.id).await?;
    println!("running it again cleared {} split(s)", settled_again);

    let view = ledger.compute_ledger(flat.id, anna.id).await?;
    println!(
        "Ledger is {} after settlement",
        if view.is_empty() { "empty" } else { "not empty" }
    );

    Ok(())
}
