//! Expense recording and split generation

use bigdecimal::BigDecimal;
use std::sync::Arc;
use tracing::debug;

use crate::traits::*;
use crate::types::*;

/// Expense manager for recording, updating, and deleting shared expenses
///
/// Every mutation persists the expense and its splits through a single
/// storage call so the pair commits atomically.
pub struct ExpenseManager<S: HouseholdStorage> {
    storage: S,
    validator: Box<dyn ExpenseValidator>,
    authorizer: Arc<dyn Authorizer>,
}

impl<S: HouseholdStorage> ExpenseManager<S> {
    /// Create a new expense manager with default validation and an
    /// allow-all authorizer
    pub fn new(storage: S) -> Self {
        Self::with_authorizer(storage, Arc::new(AllowAllAuthorizer))
    }

    /// Create a new expense manager with a host-supplied authorizer
    pub fn with_authorizer(storage: S, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            storage,
            validator: Box::new(DefaultExpenseValidator),
            authorizer,
        }
    }

    /// Create a new expense manager with a custom validator
    pub fn with_validator(
        storage: S,
        validator: Box<dyn ExpenseValidator>,
        authorizer: Arc<dyn Authorizer>,
    ) -> Self {
        Self {
            storage,
            validator,
            authorizer,
        }
    }

    /// Record a new expense and generate its splits, atomically
    ///
    /// The cost is divided evenly across all household members; the payer
    /// bears one share but receives no split record. Returns the generated
    /// splits.
    pub async fn record_expense(&mut self, expense: Expense) -> LedgerResult<Vec<Split>> {
        self.validator.validate_expense(&expense)?;

        let household = self
            .storage
            .get_household(expense.household_id)
            .await?
            .ok_or(LedgerError::HouseholdNotFound(expense.household_id))?;

        if !household.is_member(expense.payer_id) {
            return Err(LedgerError::Validation(format!(
                "Payer {} is not a member of household '{}'",
                expense.payer_id, household.name
            )));
        }

        let generated = splits::generate(&expense, &household.member_ids);
        self.storage
            .save_expense_with_splits(&expense, &generated)
            .await?;

        debug!(
            expense = %expense.id,
            household = %expense.household_id,
            splits = generated.len(),
            "recorded expense"
        );
        Ok(generated)
    }

    /// Get an expense by ID
    pub async fn get_expense(&self, expense_id: ExpenseId) -> LedgerResult<Option<Expense>> {
        self.storage.get_expense(expense_id).await
    }

    /// Get an expense by ID, returning an error if not found
    pub async fn get_expense_required(&self, expense_id: ExpenseId) -> LedgerResult<Expense> {
        self.storage
            .get_expense(expense_id)
            .await?
            .ok_or(LedgerError::ExpenseNotFound(expense_id))
    }

    /// List all expenses belonging to a household
    pub async fn list_household_expenses(
        &self,
        household_id: HouseholdId,
    ) -> LedgerResult<Vec<Expense>> {
        self.storage.get_household_expenses(household_id).await
    }

    /// List all splits belonging to an expense
    pub async fn get_expense_splits(&self, expense_id: ExpenseId) -> LedgerResult<Vec<Split>> {
        self.storage.get_expense_splits(expense_id).await
    }

    /// Change an expense's cost and recompute its splits, atomically
    ///
    /// Share amounts are rederived from the current split count rather than
    /// current household membership, so members who joined after the
    /// expense was recorded are not pulled in. Settlement state carries
    /// over untouched.
    pub async fn update_expense_cost(
        &mut self,
        expense_id: ExpenseId,
        new_cost: BigDecimal,
        acting_member_id: MemberId,
    ) -> LedgerResult<Vec<Split>> {
        let mut expense = self.get_expense_required(expense_id).await?;
        ensure_allowed(
            self.authorizer.as_ref(),
            acting_member_id,
            Action::ChangeExpense,
            Resource::Expense(expense_id),
        )?;

        expense.cost = new_cost;
        expense.updated_at = chrono::Utc::now().naive_utc();
        self.validator.validate_expense(&expense)?;

        let existing = self.storage.get_expense_splits(expense_id).await?;
        let regenerated = splits::regenerate(&expense, &existing);
        self.storage
            .update_expense_with_splits(&expense, &regenerated)
            .await?;

        debug!(expense = %expense_id, splits = regenerated.len(), "recomputed splits after cost change");
        Ok(regenerated)
    }

    /// Delete an expense and all of its splits
    pub async fn delete_expense(
        &mut self,
        expense_id: ExpenseId,
        acting_member_id: MemberId,
    ) -> LedgerResult<()> {
        self.get_expense_required(expense_id).await?;
        ensure_allowed(
            self.authorizer.as_ref(),
            acting_member_id,
            Action::DeleteExpense,
            Resource::Expense(expense_id),
        )?;

        self.storage.delete_expense(expense_id).await
    }
}

/// Split generation for evenly divided expenses
pub mod splits {
    use super::*;

    /// Partition an expense's cost evenly across household members
    ///
    /// Each non-payer member receives one unpaid split of
    /// `cost / (debtors + 1)`; the extra share is the payer's own, which is
    /// never recorded. A household where the payer is the only member
    /// yields no splits at all.
    pub fn generate(expense: &Expense, household_member_ids: &[MemberId]) -> Vec<Split> {
        let debtors: Vec<MemberId> = household_member_ids
            .iter()
            .copied()
            .filter(|id| *id != expense.payer_id)
            .collect();

        if debtors.is_empty() {
            return Vec::new();
        }

        let share = &expense.cost / BigDecimal::from(debtors.len() as u64 + 1);
        debtors
            .into_iter()
            .map(|member_id| Split::new(expense.id, member_id, share.clone()))
            .collect()
    }

    /// Recompute split amounts after the expense's cost changed
    ///
    /// Keeps the existing split rows (identity, debtor, settlement state)
    /// and only rewrites `amount_owed` using the current split count.
    pub fn regenerate(expense: &Expense, existing: &[Split]) -> Vec<Split> {
        if existing.is_empty() {
            return Vec::new();
        }

        let share = &expense.cost / BigDecimal::from(existing.len() as u64 + 1);
        existing
            .iter()
            .map(|split| {
                let mut updated = split.clone();
                updated.amount_owed = share.clone();
                updated.updated_at = chrono::Utc::now().naive_utc();
                updated
            })
            .collect()
    }
}
