//! Settlement of splits between household members

use std::sync::Arc;
use tracing::debug;

use crate::traits::*;
use crate::types::*;

/// Settlement manager for marking splits as paid
///
/// Both operations only ever move `has_paid` from false to true, so
/// retrying either of them is safe.
pub struct SettlementManager<S: HouseholdStorage> {
    storage: S,
    authorizer: Arc<dyn Authorizer>,
}

impl<S: HouseholdStorage> SettlementManager<S> {
    /// Create a new settlement manager with an allow-all authorizer
    pub fn new(storage: S) -> Self {
        Self::with_authorizer(storage, Arc::new(AllowAllAuthorizer))
    }

    /// Create a new settlement manager with a host-supplied authorizer
    pub fn with_authorizer(storage: S, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            storage,
            authorizer,
        }
    }

    /// Settle every outstanding split between two members of a household,
    /// in both directions
    ///
    /// "We're square" settlement: splits the counterpart owes the member
    /// and splits the member owes the counterpart are all marked paid in
    /// one batch, regardless of which expense they belong to. Returns the
    /// number of splits newly settled; calling again with the same pair
    /// returns zero.
    pub async fn settle_between(
        &mut self,
        household_id: HouseholdId,
        member_id: MemberId,
        counterpart_id: MemberId,
    ) -> LedgerResult<usize> {
        self.storage
            .get_household(household_id)
            .await?
            .ok_or(LedgerError::HouseholdNotFound(household_id))?;

        let expenses = self.storage.get_household_expenses(household_id).await?;
        let mut settled = Vec::new();

        for expense in &expenses {
            // Splits between the pair only exist on expenses one of them paid
            let debtor_id = if expense.payer_id == member_id {
                counterpart_id
            } else if expense.payer_id == counterpart_id {
                member_id
            } else {
                continue;
            };

            let splits = self.storage.get_expense_splits(expense.id).await?;
            for mut split in splits {
                if split.member_id == debtor_id && split.mark_paid() {
                    settled.push(split);
                }
            }
        }

        if !settled.is_empty() {
            self.storage.update_splits(&settled).await?;
        }

        debug!(
            household = %household_id,
            member = %member_id,
            counterpart = %counterpart_id,
            settled = settled.len(),
            "settled splits between pair"
        );
        Ok(settled.len())
    }

    /// Settle a single split on behalf of an acting member
    ///
    /// The acting member must hold modification rights over the split's
    /// expense. An already-paid split is left untouched and reported as
    /// success.
    pub async fn mark_split_paid(
        &mut self,
        split_id: SplitId,
        acting_member_id: MemberId,
    ) -> LedgerResult<()> {
        let mut split = self
            .storage
            .get_split(split_id)
            .await?
            .ok_or(LedgerError::SplitNotFound(split_id))?;

        let expense = self
            .storage
            .get_expense(split.expense_id)
            .await?
            .ok_or(LedgerError::ExpenseNotFound(split.expense_id))?;

        ensure_allowed(
            self.authorizer.as_ref(),
            acting_member_id,
            Action::ChangeExpense,
            Resource::Expense(expense.id),
        )?;

        if !split.mark_paid() {
            debug!(split = %split_id, "split already settled");
            return Ok(());
        }

        self.storage.update_splits(&[split]).await
    }
}
