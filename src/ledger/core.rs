//! Main orchestrator that coordinates households, expenses, and settlement

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::household::{HouseholdManager, MembershipChange};
use crate::ledger::balance::{BalanceLedger, BalanceManager};
use crate::ledger::expense::ExpenseManager;
use crate::ledger::settlement::SettlementManager;
use crate::traits::*;
use crate::types::*;

/// Main split-ledger system that orchestrates all household operations
pub struct HouseholdLedger<S: HouseholdStorage> {
    households: HouseholdManager<S>,
    expenses: ExpenseManager<S>,
    settlements: SettlementManager<S>,
    balances: BalanceManager<S>,
    authorizer: Arc<dyn Authorizer>,
}

impl<S: HouseholdStorage + Clone> HouseholdLedger<S> {
    /// Create a new ledger with the given storage backend and an allow-all
    /// authorizer
    pub fn new(storage: S) -> Self {
        Self::with_authorizer(storage, Arc::new(AllowAllAuthorizer))
    }

    /// Create a new ledger with a host-supplied authorizer
    pub fn with_authorizer(storage: S, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            households: HouseholdManager::with_authorizer(storage.clone(), authorizer.clone()),
            expenses: ExpenseManager::with_authorizer(storage.clone(), authorizer.clone()),
            settlements: SettlementManager::with_authorizer(storage.clone(), authorizer.clone()),
            balances: BalanceManager::new(storage),
            authorizer,
        }
    }

    /// Create a new ledger with a custom expense validator
    pub fn with_expense_validator(
        storage: S,
        validator: Box<dyn ExpenseValidator>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            households: HouseholdManager::with_authorizer(storage.clone(), authorizer.clone()),
            expenses: ExpenseManager::with_validator(storage.clone(), validator, authorizer.clone()),
            settlements: SettlementManager::with_authorizer(storage.clone(), authorizer.clone()),
            balances: BalanceManager::new(storage),
            authorizer,
        }
    }

    // Member and household operations
    /// Register a new member
    pub async fn register_member(&mut self, username: String) -> LedgerResult<Member> {
        self.households.register_member(username).await
    }

    /// Create a new household; the creator becomes its first member
    pub async fn create_household(
        &mut self,
        name: String,
        creator_id: MemberId,
    ) -> LedgerResult<Household> {
        self.households.create_household(name, creator_id).await
    }

    /// Get a household by ID
    pub async fn get_household(&self, household_id: HouseholdId) -> LedgerResult<Option<Household>> {
        self.households.get_household(household_id).await
    }

    /// List all households a member belongs to
    pub async fn list_member_households(&self, member_id: MemberId) -> LedgerResult<Vec<Household>> {
        self.households.list_member_households(member_id).await
    }

    /// Rename a household
    pub async fn rename_household(
        &mut self,
        household_id: HouseholdId,
        name: String,
        acting_member_id: MemberId,
    ) -> LedgerResult<Household> {
        self.households
            .rename_household(household_id, name, acting_member_id)
            .await
    }

    /// Delete a household, refusing while any split remains unpaid
    pub async fn delete_household(
        &mut self,
        household_id: HouseholdId,
        acting_member_id: MemberId,
    ) -> LedgerResult<()> {
        self.households
            .delete_household(household_id, acting_member_id)
            .await
    }

    /// Validate a membership diff without applying it
    pub async fn validate_membership_change(
        &self,
        household_id: HouseholdId,
        added: &[MemberId],
        removed: &[MemberId],
        viewer_id: MemberId,
    ) -> LedgerResult<MembershipChange> {
        self.households
            .validate_membership_change(household_id, added, removed, viewer_id)
            .await
    }

    /// Validate and apply a membership diff in one call
    pub async fn apply_membership_change(
        &mut self,
        household_id: HouseholdId,
        added: &[MemberId],
        removed: &[MemberId],
        viewer_id: MemberId,
    ) -> LedgerResult<Household> {
        self.households
            .apply_membership_change(household_id, added, removed, viewer_id)
            .await
    }

    // Expense operations
    /// Record a new expense and generate its splits
    pub async fn record_expense(&mut self, expense: Expense) -> LedgerResult<Vec<Split>> {
        self.expenses.record_expense(expense).await
    }

    /// Get an expense by ID
    pub async fn get_expense(&self, expense_id: ExpenseId) -> LedgerResult<Option<Expense>> {
        self.expenses.get_expense(expense_id).await
    }

    /// List all expenses belonging to a household
    pub async fn list_household_expenses(
        &self,
        household_id: HouseholdId,
    ) -> LedgerResult<Vec<Expense>> {
        self.expenses.list_household_expenses(household_id).await
    }

    /// List all splits belonging to an expense
    pub async fn get_expense_splits(&self, expense_id: ExpenseId) -> LedgerResult<Vec<Split>> {
        self.expenses.get_expense_splits(expense_id).await
    }

    /// Change an expense's cost and recompute its splits
    pub async fn update_expense_cost(
        &mut self,
        expense_id: ExpenseId,
        new_cost: BigDecimal,
        acting_member_id: MemberId,
    ) -> LedgerResult<Vec<Split>> {
        self.expenses
            .update_expense_cost(expense_id, new_cost, acting_member_id)
            .await
    }

    /// Delete an expense and all of its splits
    pub async fn delete_expense(
        &mut self,
        expense_id: ExpenseId,
        acting_member_id: MemberId,
    ) -> LedgerResult<()> {
        self.expenses
            .delete_expense(expense_id, acting_member_id)
            .await
    }

    // Settlement operations
    /// Settle every outstanding split between two members, in both
    /// directions; returns the number newly settled
    pub async fn settle_between(
        &mut self,
        household_id: HouseholdId,
        member_id: MemberId,
        counterpart_id: MemberId,
    ) -> LedgerResult<usize> {
        self.settlements
            .settle_between(household_id, member_id, counterpart_id)
            .await
    }

    /// Settle a single split on behalf of an acting member
    pub async fn mark_split_paid(
        &mut self,
        split_id: SplitId,
        acting_member_id: MemberId,
    ) -> LedgerResult<()> {
        self.settlements
            .mark_split_paid(split_id, acting_member_id)
            .await
    }

    // Balance operations
    /// Compute the net unpaid balance between the viewer and every other
    /// household member
    pub async fn compute_ledger(
        &self,
        household_id: HouseholdId,
        viewer_id: MemberId,
    ) -> LedgerResult<BalanceLedger> {
        ensure_allowed(
            self.authorizer.as_ref(),
            viewer_id,
            Action::ViewHousehold,
            Resource::Household(household_id),
        )?;
        self.balances.compute_ledger(household_id, viewer_id).await
    }

    /// Group the viewer's unpaid splits by counterpart member
    pub async fn unpaid_splits_by_counterpart(
        &self,
        household_id: HouseholdId,
        viewer_id: MemberId,
    ) -> LedgerResult<HashMap<MemberId, CounterpartSplits>> {
        ensure_allowed(
            self.authorizer.as_ref(),
            viewer_id,
            Action::ViewHousehold,
            Resource::Household(household_id),
        )?;
        self.balances
            .unpaid_splits_by_counterpart(household_id, viewer_id)
            .await
    }

    /// Validate the integrity of a household's books
    pub async fn validate_household_integrity(
        &self,
        household_id: HouseholdId,
    ) -> LedgerResult<HouseholdIntegrityReport> {
        let household = self.households.get_household_required(household_id).await?;
        let expenses = self.expenses.list_household_expenses(household_id).await?;

        let mut issues = Vec::new();
        let mut split_count = 0;
        let tolerance = BigDecimal::from(1) / BigDecimal::from(1_000_000_000);

        for expense in &expenses {
            let splits = self.expenses.get_expense_splits(expense.id).await?;
            split_count += splits.len();

            for split in &splits {
                if split.member_id == expense.payer_id {
                    issues.push(format!(
                        "Split {} names the payer of expense '{}' as its own debtor",
                        split.id, expense.description
                    ));
                }
                if split.amount_owed < BigDecimal::from(0) {
                    issues.push(format!(
                        "Split {} on expense '{}' has a negative amount",
                        split.id, expense.description
                    ));
                }
                // A paid split may reference a former member; unpaid debt
                // held by a non-member is orphaned.
                if !split.has_paid && !household.is_member(split.member_id) {
                    issues.push(format!(
                        "Unpaid split {} belongs to member {} who is no longer in the household",
                        split.id, split.member_id
                    ));
                }
            }

            let shares = BigDecimal::from(splits.len() as u64 + 1);
            let expected = &expense.cost - &expense.cost / &shares;
            let sum: BigDecimal = splits.iter().map(|s| &s.amount_owed).sum();
            if (sum - expected).abs() > tolerance {
                issues.push(format!(
                    "Splits of expense '{}' do not sum to the cost minus the payer's share",
                    expense.description
                ));
            }
        }

        Ok(HouseholdIntegrityReport {
            household_id,
            is_valid: issues.is_empty(),
            issues,
            expense_count: expenses.len(),
            split_count,
        })
    }
}

/// Report on the integrity of one household's expenses and splits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseholdIntegrityReport {
    pub household_id: HouseholdId,
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub expense_count: usize,
    pub split_count: usize,
}
