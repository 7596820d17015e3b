//! Core types and data structures for the expense-splitting system

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a member
pub type MemberId = Uuid;
/// Identifier of a household
pub type HouseholdId = Uuid;
/// Identifier of an expense
pub type ExpenseId = Uuid;
/// Identifier of a split
pub type SplitId = Uuid;

/// A person who participates in households and shares expenses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Unique identifier for the member
    pub id: MemberId,
    /// Display name, unique per deployment
    pub username: String,
    /// When the member was created
    pub created_at: NaiveDateTime,
}

impl Member {
    /// Create a new member with a fresh id
    pub fn new(username: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// A named group of members that owns shared expenses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Household {
    /// Unique identifier for the household
    pub id: HouseholdId,
    /// Human-readable household name
    pub name: String,
    /// Members currently belonging to the household
    pub member_ids: Vec<MemberId>,
    /// When the household was created
    pub created_at: NaiveDateTime,
    /// When the household was last updated
    pub updated_at: NaiveDateTime,
}

impl Household {
    /// Create a new household with no members
    pub fn new(name: String) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            name,
            member_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether a member belongs to this household
    pub fn is_member(&self, member_id: MemberId) -> bool {
        self.member_ids.contains(&member_id)
    }

    /// Add a member if not already present
    pub fn add_member(&mut self, member_id: MemberId) {
        if !self.is_member(member_id) {
            self.member_ids.push(member_id);
            self.updated_at = chrono::Utc::now().naive_utc();
        }
    }

    /// Remove a member if present
    pub fn remove_member(&mut self, member_id: MemberId) {
        if let Some(pos) = self.member_ids.iter().position(|id| *id == member_id) {
            self.member_ids.remove(pos);
            self.updated_at = chrono::Utc::now().naive_utc();
        }
    }
}

/// A cost paid by one member on behalf of the household
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// Unique identifier for the expense
    pub id: ExpenseId,
    /// Household the expense belongs to
    pub household_id: HouseholdId,
    /// Member who paid the full cost up front
    pub payer_id: MemberId,
    /// What the expense was for
    pub description: String,
    /// Full cost paid by the payer; always positive
    pub cost: BigDecimal,
    /// Date the expense occurred
    pub date: NaiveDate,
    /// When the expense was created
    pub created_at: NaiveDateTime,
    /// When the expense was last updated
    pub updated_at: NaiveDateTime,
}

impl Expense {
    /// Create a new expense with a fresh id
    pub fn new(
        household_id: HouseholdId,
        payer_id: MemberId,
        description: String,
        cost: BigDecimal,
        date: NaiveDate,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            household_id,
            payer_id,
            description,
            cost,
            date,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate the expense fields
    pub fn validate(&self) -> LedgerResult<()> {
        if self.description.trim().is_empty() {
            return Err(LedgerError::Validation(
                "Expense description cannot be empty".to_string(),
            ));
        }

        if self.cost <= BigDecimal::from(0) {
            return Err(LedgerError::Validation(
                "Expense cost must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

/// One member's share of an expense they did not pay for
///
/// The payer never receives a split: their own share of the cost is simply
/// never recorded as owed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Split {
    /// Unique identifier for the split
    pub id: SplitId,
    /// Expense this split belongs to
    pub expense_id: ExpenseId,
    /// Member who owes the amount (the debtor)
    pub member_id: MemberId,
    /// Amount the debtor owes the payer
    pub amount_owed: BigDecimal,
    /// Whether the debtor has settled this split
    pub has_paid: bool,
    /// When the split was created
    pub created_at: NaiveDateTime,
    /// When the split was last updated
    pub updated_at: NaiveDateTime,
}

impl Split {
    /// Create a new unpaid split
    pub fn new(expense_id: ExpenseId, member_id: MemberId, amount_owed: BigDecimal) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            expense_id,
            member_id,
            amount_owed,
            has_paid: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Settle the split. Returns `true` if the split was newly settled,
    /// `false` if it was already paid. `has_paid` never reverts to false.
    pub fn mark_paid(&mut self) -> bool {
        if self.has_paid {
            return false;
        }
        self.has_paid = true;
        self.updated_at = chrono::Utc::now().naive_utc();
        true
    }
}

/// Actions a caller can be granted on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    ViewHousehold,
    ChangeHousehold,
    DeleteHousehold,
    ChangeExpense,
    DeleteExpense,
    ChangeMember,
}

impl Action {
    /// Stable string form, matching the permission names host apps use
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ViewHousehold => "view_household",
            Action::ChangeHousehold => "change_household",
            Action::DeleteHousehold => "delete_household",
            Action::ChangeExpense => "change_expense",
            Action::DeleteExpense => "delete_expense",
            Action::ChangeMember => "change_member",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The resource an action applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resource {
    Household(HouseholdId),
    Expense(ExpenseId),
    Member(MemberId),
}

/// Errors that can occur in the split-ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Household not found: {0}")]
    HouseholdNotFound(HouseholdId),
    #[error("Member not found: {0}")]
    MemberNotFound(MemberId),
    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),
    #[error("Split not found: {0}")]
    SplitNotFound(SplitId),
    #[error("Member {member_id} is not authorized to {action}")]
    Unauthorized { member_id: MemberId, action: Action },
    #[error("Member {0} cannot be removed by their own membership change; leaving a household is a separate flow")]
    SelfRemoval(MemberId),
    #[error("Member {member_id} has an outstanding balance of {amount}")]
    OutstandingBalance {
        member_id: MemberId,
        amount: BigDecimal,
    },
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for split-ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
