//! Integration tests for splitledger-core

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use splitledger_core::utils::{EnhancedExpenseValidator, MemoryStorage};
use splitledger_core::{
    AllowAllAuthorizer, DenyAllAuthorizer, Expense, Household, HouseholdLedger, HouseholdStorage,
    LedgerError, Member, Split,
};

fn expense_on(
    household_id: splitledger_core::HouseholdId,
    payer_id: splitledger_core::MemberId,
    description: &str,
    cost: i64,
) -> Expense {
    Expense::new(
        household_id,
        payer_id,
        description.to_string(),
        BigDecimal::from(cost),
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
    )
}

/// Storage, ledger, household, and `count` registered members
async fn setup_household(
    count: usize,
) -> (
    MemoryStorage,
    HouseholdLedger<MemoryStorage>,
    Household,
    Vec<Member>,
) {
    let storage = MemoryStorage::new();
    let mut ledger = HouseholdLedger::new(storage.clone());

    let mut members = Vec::new();
    for i in 0..count {
        let member = ledger
            .register_member(format!("member{}", i))
            .await
            .unwrap();
        members.push(member);
    }

    let household = ledger
        .create_household("Flat 12".to_string(), members[0].id)
        .await
        .unwrap();
    let extra: Vec<_> = members.iter().skip(1).map(|m| m.id).collect();
    let household = if extra.is_empty() {
        household
    } else {
        ledger
            .apply_membership_change(household.id, &extra, &[], members[0].id)
            .await
            .unwrap()
    };

    (storage, ledger, household, members)
}

#[tokio::test]
async fn test_complete_split_workflow() {
    let (_storage, mut ledger, household, members) = setup_household(3).await;
    let (anna, ben, cleo) = (members[0].id, members[1].id, members[2].id);

    // Anna pays 30: Ben and Cleo owe 10 each, Anna's share stays unrecorded
    let generated = ledger
        .record_expense(expense_on(household.id, anna, "Groceries", 30))
        .await
        .unwrap();
    assert_eq!(generated.len(), 2);
    for split in &generated {
        assert_eq!(split.amount_owed, BigDecimal::from(10));
        assert!(!split.has_paid);
    }

    let anna_view = ledger.compute_ledger(household.id, anna).await.unwrap();
    assert_eq!(anna_view.balance_with(ben), BigDecimal::from(-10));
    assert_eq!(anna_view.balance_with(cleo), BigDecimal::from(-10));

    let ben_view = ledger.compute_ledger(household.id, ben).await.unwrap();
    assert_eq!(ben_view.balance_with(anna), BigDecimal::from(10));
    assert!(!ben_view.has_entry(cleo));

    // After Anna and Ben square up, only Cleo's debt remains
    let settled = ledger.settle_between(household.id, anna, ben).await.unwrap();
    assert_eq!(settled, 1);

    let anna_view = ledger.compute_ledger(household.id, anna).await.unwrap();
    assert!(!anna_view.has_entry(ben));
    assert_eq!(anna_view.balance_with(cleo), BigDecimal::from(-10));
    assert_eq!(anna_view.len(), 1);
}

#[tokio::test]
async fn test_settle_between_is_idempotent() {
    let (_storage, mut ledger, household, members) = setup_household(3).await;
    let (anna, ben) = (members[0].id, members[1].id);

    ledger
        .record_expense(expense_on(household.id, anna, "Groceries", 30))
        .await
        .unwrap();

    let first = ledger.settle_between(household.id, anna, ben).await.unwrap();
    let splits_after_first: Vec<Split> = {
        let expenses = ledger.list_household_expenses(household.id).await.unwrap();
        ledger.get_expense_splits(expenses[0].id).await.unwrap()
    };

    let second = ledger.settle_between(household.id, anna, ben).await.unwrap();
    let splits_after_second: Vec<Split> = {
        let expenses = ledger.list_household_expenses(household.id).await.unwrap();
        ledger.get_expense_splits(expenses[0].id).await.unwrap()
    };

    assert_eq!(first, 1);
    assert_eq!(second, 0);
    assert_eq!(splits_after_first, splits_after_second);
}

#[tokio::test]
async fn test_settle_between_covers_both_directions() {
    let (_storage, mut ledger, household, members) = setup_household(3).await;
    let (anna, ben, cleo) = (members[0].id, members[1].id, members[2].id);

    // Anna pays 30 (Ben owes 10), Ben pays 60 (Anna owes 20)
    ledger
        .record_expense(expense_on(household.id, anna, "Groceries", 30))
        .await
        .unwrap();
    ledger
        .record_expense(expense_on(household.id, ben, "Utilities", 60))
        .await
        .unwrap();

    let anna_view = ledger.compute_ledger(household.id, anna).await.unwrap();
    assert_eq!(anna_view.balance_with(ben), BigDecimal::from(10));

    let settled = ledger.settle_between(household.id, anna, ben).await.unwrap();
    assert_eq!(settled, 2);

    let anna_view = ledger.compute_ledger(household.id, anna).await.unwrap();
    assert!(!anna_view.has_entry(ben));
    // Cleo's debts on both expenses are untouched
    assert_eq!(anna_view.balance_with(cleo), BigDecimal::from(-10));
    let ben_view = ledger.compute_ledger(household.id, ben).await.unwrap();
    assert_eq!(ben_view.balance_with(cleo), BigDecimal::from(-20));
}

#[tokio::test]
async fn test_ledger_symmetry() {
    let (_storage, mut ledger, household, members) = setup_household(3).await;
    let (anna, ben) = (members[0].id, members[1].id);

    ledger
        .record_expense(expense_on(household.id, anna, "Groceries", 30))
        .await
        .unwrap();
    ledger
        .record_expense(expense_on(household.id, ben, "Internet", 45))
        .await
        .unwrap();

    let anna_view = ledger.compute_ledger(household.id, anna).await.unwrap();
    let ben_view = ledger.compute_ledger(household.id, ben).await.unwrap();

    // Anna: Ben owes her 10, she owes him 15 -> net +5; Ben sees -5
    assert_eq!(anna_view.balance_with(ben), BigDecimal::from(5));
    assert_eq!(ben_view.balance_with(anna), BigDecimal::from(-5));
}

#[tokio::test]
async fn test_single_member_household() {
    let (_storage, mut ledger, household, members) = setup_household(1).await;
    let anna = members[0].id;

    let generated = ledger
        .record_expense(expense_on(household.id, anna, "Groceries", 20))
        .await
        .unwrap();
    assert!(generated.is_empty());

    let view = ledger.compute_ledger(household.id, anna).await.unwrap();
    assert!(view.is_empty());
}

#[tokio::test]
async fn test_membership_removal_blocked_by_outstanding_balance() {
    let (_storage, mut ledger, household, members) = setup_household(3).await;
    let (anna, ben) = (members[0].id, members[1].id);

    ledger
        .record_expense(expense_on(household.id, anna, "Groceries", 30))
        .await
        .unwrap();

    // Ben owes Anna, so Anna cannot remove him
    let result = ledger
        .validate_membership_change(household.id, &[], &[ben], anna)
        .await;
    assert!(matches!(
        result,
        Err(LedgerError::OutstandingBalance { member_id, .. }) if member_id == ben
    ));

    // Once they square up, the removal goes through
    ledger.settle_between(household.id, anna, ben).await.unwrap();
    let updated = ledger
        .apply_membership_change(household.id, &[], &[ben], anna)
        .await
        .unwrap();
    assert!(!updated.is_member(ben));
}

#[tokio::test]
async fn test_self_removal_rejected() {
    let (_storage, mut ledger, household, members) = setup_household(2).await;
    let anna = members[0].id;

    let result = ledger
        .apply_membership_change(household.id, &[], &[anna], anna)
        .await;
    assert!(matches!(
        result,
        Err(LedgerError::SelfRemoval(member_id)) if member_id == anna
    ));
}

#[tokio::test]
async fn test_membership_change_confirms_sets() {
    let (_storage, mut ledger, household, members) = setup_household(2).await;
    let (anna, ben) = (members[0].id, members[1].id);

    let dora = ledger.register_member("dora".to_string()).await.unwrap();

    // Ben is already a member; only Dora is a confirmed addition
    let change = ledger
        .validate_membership_change(household.id, &[ben, dora.id], &[], anna)
        .await
        .unwrap();
    assert_eq!(change.added, vec![dora.id]);
    assert!(change.removed.is_empty());

    // Unknown members cannot be added or removed
    let unknown = Uuid::new_v4();
    let result = ledger
        .validate_membership_change(household.id, &[unknown], &[], anna)
        .await;
    assert!(matches!(result, Err(LedgerError::MemberNotFound(_))));

    let result = ledger
        .validate_membership_change(household.id, &[], &[dora.id], anna)
        .await;
    assert!(matches!(result, Err(LedgerError::Validation(_))));
}

#[tokio::test]
async fn test_mark_split_paid_flow() {
    let (_storage, mut ledger, household, members) = setup_household(3).await;
    let (anna, ben) = (members[0].id, members[1].id);

    let generated = ledger
        .record_expense(expense_on(household.id, anna, "Groceries", 30))
        .await
        .unwrap();
    let ben_split = generated
        .iter()
        .find(|split| split.member_id == ben)
        .unwrap();

    ledger.mark_split_paid(ben_split.id, anna).await.unwrap();

    let anna_view = ledger.compute_ledger(household.id, anna).await.unwrap();
    assert!(!anna_view.has_entry(ben));

    // Settling an already-paid split succeeds without changing anything
    ledger.mark_split_paid(ben_split.id, anna).await.unwrap();

    // A split that does not exist is an error
    let result = ledger.mark_split_paid(Uuid::new_v4(), anna).await;
    assert!(matches!(result, Err(LedgerError::SplitNotFound(_))));
}

#[tokio::test]
async fn test_mark_split_paid_requires_authorization() {
    let (storage, mut ledger, household, members) = setup_household(3).await;
    let (anna, ben) = (members[0].id, members[1].id);

    let generated = ledger
        .record_expense(expense_on(household.id, anna, "Groceries", 30))
        .await
        .unwrap();
    let ben_split = generated
        .iter()
        .find(|split| split.member_id == ben)
        .unwrap();

    let mut denied =
        HouseholdLedger::with_authorizer(storage.clone(), Arc::new(DenyAllAuthorizer));
    let result = denied.mark_split_paid(ben_split.id, ben).await;
    assert!(matches!(result, Err(LedgerError::Unauthorized { .. })));

    // The denial left the split untouched
    let split = storage.get_split(ben_split.id).await.unwrap().unwrap();
    assert!(!split.has_paid);
}

#[tokio::test]
async fn test_update_expense_cost_regenerates_splits() {
    let (_storage, mut ledger, household, members) = setup_household(3).await;
    let (anna, ben, cleo) = (members[0].id, members[1].id, members[2].id);

    let expense = expense_on(household.id, anna, "Groceries", 30);
    let expense_id = expense.id;
    let generated = ledger.record_expense(expense).await.unwrap();

    // Ben settles his share before the cost is corrected
    let ben_split = generated
        .iter()
        .find(|split| split.member_id == ben)
        .unwrap();
    ledger.mark_split_paid(ben_split.id, anna).await.unwrap();

    let regenerated = ledger
        .update_expense_cost(expense_id, BigDecimal::from(60), anna)
        .await
        .unwrap();

    assert_eq!(regenerated.len(), 2);
    for split in &regenerated {
        assert_eq!(split.amount_owed, BigDecimal::from(20));
    }
    let ben_after = regenerated
        .iter()
        .find(|split| split.member_id == ben)
        .unwrap();
    assert!(ben_after.has_paid);

    // Only Cleo's recomputed share is outstanding
    let anna_view = ledger.compute_ledger(household.id, anna).await.unwrap();
    assert!(!anna_view.has_entry(ben));
    assert_eq!(anna_view.balance_with(cleo), BigDecimal::from(-20));
}

#[tokio::test]
async fn test_delete_expense_removes_splits() {
    let (storage, mut ledger, household, members) = setup_household(3).await;
    let (anna, ben) = (members[0].id, members[1].id);

    let expense = expense_on(household.id, anna, "Groceries", 30);
    let expense_id = expense.id;
    let generated = ledger.record_expense(expense).await.unwrap();

    ledger.delete_expense(expense_id, anna).await.unwrap();

    let view = ledger.compute_ledger(household.id, anna).await.unwrap();
    assert!(view.is_empty());
    for split in &generated {
        assert!(storage.get_split(split.id).await.unwrap().is_none());
    }
    assert!(!ledger
        .unpaid_splits_by_counterpart(household.id, anna)
        .await
        .unwrap()
        .contains_key(&ben));
}

#[tokio::test]
async fn test_unpaid_splits_grouped_by_counterpart() {
    let (_storage, mut ledger, household, members) = setup_household(3).await;
    let (anna, ben, cleo) = (members[0].id, members[1].id, members[2].id);

    ledger
        .record_expense(expense_on(household.id, anna, "Groceries", 30))
        .await
        .unwrap();
    ledger
        .record_expense(expense_on(household.id, ben, "Utilities", 60))
        .await
        .unwrap();

    let grouped = ledger
        .unpaid_splits_by_counterpart(household.id, anna)
        .await
        .unwrap();

    let with_ben = grouped.get(&ben).unwrap();
    assert_eq!(with_ben.owed_to_viewer.len(), 1);
    assert_eq!(with_ben.owed_by_viewer.len(), 1);
    // Anna owes Ben 20, Ben owes Anna 10
    assert_eq!(with_ben.net_amount(), BigDecimal::from(10));

    let with_cleo = grouped.get(&cleo).unwrap();
    assert_eq!(with_cleo.owed_to_viewer.len(), 1);
    assert!(with_cleo.owed_by_viewer.is_empty());
    assert_eq!(with_cleo.net_amount(), BigDecimal::from(-10));
}

#[tokio::test]
async fn test_delete_household_blocked_while_unpaid() {
    let (storage, mut ledger, household, members) = setup_household(2).await;
    let (anna, ben) = (members[0].id, members[1].id);

    ledger
        .record_expense(expense_on(household.id, anna, "Groceries", 30))
        .await
        .unwrap();

    let result = ledger.delete_household(household.id, anna).await;
    assert!(matches!(result, Err(LedgerError::Validation(_))));

    ledger.settle_between(household.id, anna, ben).await.unwrap();
    ledger.delete_household(household.id, anna).await.unwrap();
    assert!(storage.get_household(household.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_integrity_report_flags_tampered_split() {
    let (storage, mut ledger, household, members) = setup_household(3).await;
    let anna = members[0].id;

    let expense = expense_on(household.id, anna, "Groceries", 30);
    let expense_id = expense.id;
    ledger.record_expense(expense).await.unwrap();

    // Tamper: point one split's debtor at the payer
    let mut storage = storage;
    let splits = storage.get_expense_splits(expense_id).await.unwrap();
    let mut tampered = splits[0].clone();
    tampered.member_id = anna;
    storage.update_splits(&[tampered]).await.unwrap();

    let report = ledger
        .validate_household_integrity(household.id)
        .await
        .unwrap();
    assert!(!report.is_valid);
    assert!(!report.issues.is_empty());
}

#[tokio::test]
async fn test_expense_validation() {
    let storage = MemoryStorage::new();
    let mut ledger = HouseholdLedger::with_expense_validator(
        storage,
        Box::new(EnhancedExpenseValidator),
        Arc::new(AllowAllAuthorizer),
    );

    let anna = ledger.register_member("anna".to_string()).await.unwrap();
    let ben = ledger.register_member("ben".to_string()).await.unwrap();
    let household = ledger
        .create_household("Flat 12".to_string(), anna.id)
        .await
        .unwrap();
    ledger
        .apply_membership_change(household.id, &[ben.id], &[], anna.id)
        .await
        .unwrap();

    // Non-positive cost is rejected before anything is persisted
    let result = ledger
        .record_expense(expense_on(household.id, anna.id, "Groceries", 0))
        .await;
    assert!(matches!(result, Err(LedgerError::Validation(_))));

    // So is an empty description
    let result = ledger
        .record_expense(expense_on(household.id, anna.id, "   ", 30))
        .await;
    assert!(matches!(result, Err(LedgerError::Validation(_))));

    // And a payer from outside the household
    let outsider = ledger.register_member("outsider".to_string()).await.unwrap();
    let result = ledger
        .record_expense(expense_on(household.id, outsider.id, "Groceries", 30))
        .await;
    assert!(matches!(result, Err(LedgerError::Validation(_))));

    assert!(ledger
        .list_household_expenses(household.id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_ledger_serialization() {
    let (_storage, mut ledger, household, members) = setup_household(3).await;
    let anna = members[0].id;

    ledger
        .record_expense(expense_on(household.id, anna, "Groceries", 30))
        .await
        .unwrap();

    let view = ledger.compute_ledger(household.id, anna).await.unwrap();
    let json = serde_json::to_string(&view).unwrap();
    let roundtripped: splitledger_core::BalanceLedger = serde_json::from_str(&json).unwrap();
    assert_eq!(view, roundtripped);

    let grouped = ledger
        .unpaid_splits_by_counterpart(household.id, anna)
        .await
        .unwrap();
    let json = serde_json::to_string(&grouped).unwrap();
    assert!(json.contains("amount_owed"));
}

#[tokio::test]
async fn test_memory_storage_operations() {
    let mut storage = MemoryStorage::new();

    let member = Member::new("test".to_string());
    storage.save_member(&member).await.unwrap();

    let retrieved = storage.get_member(member.id).await.unwrap();
    assert!(retrieved.is_some());
    assert_eq!(retrieved.unwrap().username, "test");

    let mut household = Household::new("Test Household".to_string());
    household.add_member(member.id);
    storage.save_household(&household).await.unwrap();

    let listed = storage.list_member_households(member.id).await.unwrap();
    assert_eq!(listed.len(), 1);

    let expense = Expense::new(
        household.id,
        member.id,
        "Test expense".to_string(),
        BigDecimal::from(100),
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    );
    let split = Split::new(expense.id, Uuid::new_v4(), BigDecimal::from(50));
    storage
        .save_expense_with_splits(&expense, &[split.clone()])
        .await
        .unwrap();

    let retrieved_expense = storage.get_expense(expense.id).await.unwrap();
    assert!(retrieved_expense.is_some());
    assert_eq!(retrieved_expense.unwrap().description, "Test expense");
    assert_eq!(storage.get_expense_splits(expense.id).await.unwrap().len(), 1);

    // Updating a split that was never saved fails without touching the rest
    let stray = Split::new(expense.id, Uuid::new_v4(), BigDecimal::from(1));
    let result = storage.update_splits(&[split, stray]).await;
    assert!(matches!(result, Err(LedgerError::SplitNotFound(_))));
}
