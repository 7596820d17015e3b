//! Household and membership management

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::ledger::balance::BalanceManager;
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::{validate_household_name, validate_username};

/// A validated membership diff, ready to apply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipChange {
    /// Members confirmed for addition
    pub added: Vec<MemberId>,
    /// Members confirmed for removal
    pub removed: Vec<MemberId>,
}

impl MembershipChange {
    /// Whether the change adds or removes anyone at all
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Household manager for membership and household lifecycle operations
pub struct HouseholdManager<S: HouseholdStorage> {
    storage: S,
    balances: BalanceManager<S>,
    authorizer: Arc<dyn Authorizer>,
}

impl<S: HouseholdStorage + Clone> HouseholdManager<S> {
    /// Create a new household manager with an allow-all authorizer
    pub fn new(storage: S) -> Self {
        Self::with_authorizer(storage, Arc::new(AllowAllAuthorizer))
    }

    /// Create a new household manager with a host-supplied authorizer
    pub fn with_authorizer(storage: S, authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            storage: storage.clone(),
            balances: BalanceManager::new(storage),
            authorizer,
        }
    }

    /// Register a new member
    pub async fn register_member(&mut self, username: String) -> LedgerResult<Member> {
        validate_username(&username)?;

        let member = Member::new(username);
        self.storage.save_member(&member).await?;
        Ok(member)
    }

    /// Get a member by ID, returning an error if not found
    pub async fn get_member_required(&self, member_id: MemberId) -> LedgerResult<Member> {
        self.storage
            .get_member(member_id)
            .await?
            .ok_or(LedgerError::MemberNotFound(member_id))
    }

    /// Create a new household; the creator becomes its first member
    pub async fn create_household(
        &mut self,
        name: String,
        creator_id: MemberId,
    ) -> LedgerResult<Household> {
        validate_household_name(&name)?;
        self.get_member_required(creator_id).await?;

        let mut household = Household::new(name);
        household.add_member(creator_id);
        self.storage.save_household(&household).await?;
        Ok(household)
    }

    /// Get a household by ID
    pub async fn get_household(&self, household_id: HouseholdId) -> LedgerResult<Option<Household>> {
        self.storage.get_household(household_id).await
    }

    /// Get a household by ID, returning an error if not found
    pub async fn get_household_required(&self, household_id: HouseholdId) -> LedgerResult<Household> {
        self.storage
            .get_household(household_id)
            .await?
            .ok_or(LedgerError::HouseholdNotFound(household_id))
    }

    /// List all households a member belongs to
    pub async fn list_member_households(&self, member_id: MemberId) -> LedgerResult<Vec<Household>> {
        self.storage.list_member_households(member_id).await
    }

    /// Rename a household
    pub async fn rename_household(
        &mut self,
        household_id: HouseholdId,
        name: String,
        acting_member_id: MemberId,
    ) -> LedgerResult<Household> {
        let mut household = self.get_household_required(household_id).await?;
        ensure_allowed(
            self.authorizer.as_ref(),
            acting_member_id,
            Action::ChangeHousehold,
            Resource::Household(household_id),
        )?;

        validate_household_name(&name)?;
        household.name = name;
        household.updated_at = chrono::Utc::now().naive_utc();
        self.storage.update_household(&household).await?;
        Ok(household)
    }

    /// Delete a household, refusing while any split remains unpaid
    ///
    /// Deleting while debt is outstanding would orphan it, the same way an
    /// unchecked membership removal would.
    pub async fn delete_household(
        &mut self,
        household_id: HouseholdId,
        acting_member_id: MemberId,
    ) -> LedgerResult<()> {
        let household = self.get_household_required(household_id).await?;
        ensure_allowed(
            self.authorizer.as_ref(),
            acting_member_id,
            Action::DeleteHousehold,
            Resource::Household(household_id),
        )?;

        let expenses = self.storage.get_household_expenses(household_id).await?;
        for expense in &expenses {
            let splits = self.storage.get_expense_splits(expense.id).await?;
            if splits.iter().any(|split| !split.has_paid) {
                return Err(LedgerError::Validation(format!(
                    "Household '{}' still has unpaid splits",
                    household.name
                )));
            }
        }

        self.storage.delete_household(household_id).await
    }

    /// Validate a membership diff without applying it
    ///
    /// Rejects self-removal (leaving is a separate flow) and the removal of
    /// any member holding a nonzero unpaid balance with the viewer, so a
    /// membership edit can never silently orphan debt. Returns the
    /// confirmed sets: additions already present are dropped, removals must
    /// currently belong, and added members must exist.
    pub async fn validate_membership_change(
        &self,
        household_id: HouseholdId,
        added: &[MemberId],
        removed: &[MemberId],
        viewer_id: MemberId,
    ) -> LedgerResult<MembershipChange> {
        let household = self.get_household_required(household_id).await?;

        for member_id in removed {
            if *member_id == viewer_id {
                return Err(LedgerError::SelfRemoval(viewer_id));
            }
            if !household.is_member(*member_id) {
                return Err(LedgerError::Validation(format!(
                    "Member {} does not belong to household '{}'",
                    member_id, household.name
                )));
            }
        }

        if !removed.is_empty() {
            let ledger = self.balances.compute_ledger(household_id, viewer_id).await?;
            for member_id in removed {
                if ledger.has_entry(*member_id) {
                    return Err(LedgerError::OutstandingBalance {
                        member_id: *member_id,
                        amount: ledger.balance_with(*member_id),
                    });
                }
            }
        }

        let mut confirmed_added = Vec::new();
        for member_id in added {
            self.get_member_required(*member_id).await?;
            if !household.is_member(*member_id) && !confirmed_added.contains(member_id) {
                confirmed_added.push(*member_id);
            }
        }

        Ok(MembershipChange {
            added: confirmed_added,
            removed: removed.to_vec(),
        })
    }

    /// Validate and apply a membership diff in one call
    ///
    /// Revalidates against current storage state immediately before the
    /// single household update, so two concurrent edits cannot both pass
    /// validation against balances the other is about to change.
    pub async fn apply_membership_change(
        &mut self,
        household_id: HouseholdId,
        added: &[MemberId],
        removed: &[MemberId],
        viewer_id: MemberId,
    ) -> LedgerResult<Household> {
        ensure_allowed(
            self.authorizer.as_ref(),
            viewer_id,
            Action::ChangeMember,
            Resource::Household(household_id),
        )?;

        let change = self
            .validate_membership_change(household_id, added, removed, viewer_id)
            .await?;

        let mut household = self.get_household_required(household_id).await?;
        for member_id in &change.added {
            household.add_member(*member_id);
        }
        for member_id in &change.removed {
            household.remove_member(*member_id);
        }

        self.storage.update_household(&household).await?;
        debug!(
            household = %household_id,
            added = change.added.len(),
            removed = change.removed.len(),
            "applied membership change"
        );
        Ok(household)
    }
}
