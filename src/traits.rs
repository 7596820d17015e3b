//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Storage abstraction for the split-ledger system
///
/// This trait allows the expense-splitting core to work with any storage
/// backend (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing
/// these methods.
///
/// Methods that touch several rows at once (`save_expense_with_splits`,
/// `update_expense_with_splits`, `update_splits`, `delete_expense`) are the
/// transaction boundaries of the system: an implementation must apply each
/// call atomically so an expense and its splits are never visible half
/// written.
#[async_trait]
pub trait HouseholdStorage: Send + Sync {
    /// Save a member to storage
    async fn save_member(&mut self, member: &Member) -> LedgerResult<()>;

    /// Get a member by ID
    async fn get_member(&self, member_id: MemberId) -> LedgerResult<Option<Member>>;

    /// Save a household to storage
    async fn save_household(&mut self, household: &Household) -> LedgerResult<()>;

    /// Get a household by ID
    async fn get_household(&self, household_id: HouseholdId) -> LedgerResult<Option<Household>>;

    /// List all households a member belongs to
    async fn list_member_households(&self, member_id: MemberId) -> LedgerResult<Vec<Household>>;

    /// Update a household
    async fn update_household(&mut self, household: &Household) -> LedgerResult<()>;

    /// Delete a household
    async fn delete_household(&mut self, household_id: HouseholdId) -> LedgerResult<()>;

    /// Save an expense together with its splits, atomically
    async fn save_expense_with_splits(
        &mut self,
        expense: &Expense,
        splits: &[Split],
    ) -> LedgerResult<()>;

    /// Get an expense by ID
    async fn get_expense(&self, expense_id: ExpenseId) -> LedgerResult<Option<Expense>>;

    /// List all expenses belonging to a household
    async fn get_household_expenses(
        &self,
        household_id: HouseholdId,
    ) -> LedgerResult<Vec<Expense>>;

    /// Update an expense together with replacement splits, atomically
    async fn update_expense_with_splits(
        &mut self,
        expense: &Expense,
        splits: &[Split],
    ) -> LedgerResult<()>;

    /// Delete an expense and all of its splits
    async fn delete_expense(&mut self, expense_id: ExpenseId) -> LedgerResult<()>;

    /// Get a split by ID
    async fn get_split(&self, split_id: SplitId) -> LedgerResult<Option<Split>>;

    /// List all splits belonging to an expense
    async fn get_expense_splits(&self, expense_id: ExpenseId) -> LedgerResult<Vec<Split>>;

    /// Update a batch of splits, atomically
    async fn update_splits(&mut self, splits: &[Split]) -> LedgerResult<()>;
}

/// Authorization decision point, supplied by the host application
///
/// The core never decides who may do what; it asks this trait with a fixed
/// action vocabulary and surfaces a denial as `LedgerError::Unauthorized`.
pub trait Authorizer: Send + Sync {
    /// Whether `member_id` may perform `action` on `resource`
    fn is_allowed(&self, member_id: MemberId, action: Action, resource: Resource) -> bool;
}

/// Check an authorization decision, logging and surfacing denials
pub(crate) fn ensure_allowed(
    authorizer: &dyn Authorizer,
    member_id: MemberId,
    action: Action,
    resource: Resource,
) -> LedgerResult<()> {
    if authorizer.is_allowed(member_id, action, resource) {
        Ok(())
    } else {
        tracing::warn!(member = %member_id, action = %action, "authorization denied");
        Err(LedgerError::Unauthorized { member_id, action })
    }
}

/// Authorizer that permits everything
///
/// Suitable for tests and single-user deployments; production hosts plug in
/// a policy backed by their permission system.
pub struct AllowAllAuthorizer;

impl Authorizer for AllowAllAuthorizer {
    fn is_allowed(&self, _member_id: MemberId, _action: Action, _resource: Resource) -> bool {
        true
    }
}

/// Authorizer that denies everything
pub struct DenyAllAuthorizer;

impl Authorizer for DenyAllAuthorizer {
    fn is_allowed(&self, _member_id: MemberId, _action: Action, _resource: Resource) -> bool {
        false
    }
}

/// Trait for implementing custom expense validation rules
pub trait ExpenseValidator: Send + Sync {
    /// Validate an expense before saving
    fn validate_expense(&self, expense: &Expense) -> LedgerResult<()>;
}

/// Default expense validator with basic rules
pub struct DefaultExpenseValidator;

impl ExpenseValidator for DefaultExpenseValidator {
    fn validate_expense(&self, expense: &Expense) -> LedgerResult<()> {
        expense.validate()
    }
}

/// Unpaid splits between a viewer and one counterpart, in both directions
///
/// Presentation view: `owed_to_viewer` holds splits on expenses the viewer
/// paid for where the counterpart is the debtor; `owed_by_viewer` the
/// reverse. All splits are unpaid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterpartSplits {
    /// The other member of the pair
    pub counterpart_id: MemberId,
    /// Unpaid splits the counterpart owes the viewer
    pub owed_to_viewer: Vec<Split>,
    /// Unpaid splits the viewer owes the counterpart
    pub owed_by_viewer: Vec<Split>,
}

impl CounterpartSplits {
    /// Net amount under the ledger sign convention: positive means the
    /// viewer owes the counterpart, negative means the counterpart owes
    /// the viewer.
    pub fn net_amount(&self) -> BigDecimal {
        let owed_by: BigDecimal = self.owed_by_viewer.iter().map(|s| &s.amount_owed).sum();
        let owed_to: BigDecimal = self.owed_to_viewer.iter().map(|s| &s.amount_owed).sum();
        owed_by - owed_to
    }
}
