//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory storage implementation for testing and development
///
/// Multi-row mutations take each write lock once and apply every row under
/// it, so an expense and its splits commit together the way a database
/// transaction would.
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    members: Arc<RwLock<HashMap<MemberId, Member>>>,
    households: Arc<RwLock<HashMap<HouseholdId, Household>>>,
    expenses: Arc<RwLock<HashMap<ExpenseId, Expense>>>,
    splits: Arc<RwLock<HashMap<SplitId, Split>>>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self {
            members: Arc::new(RwLock::new(HashMap::new())),
            households: Arc::new(RwLock::new(HashMap::new())),
            expenses: Arc::new(RwLock::new(HashMap::new())),
            splits: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.members.write().unwrap().clear();
        self.households.write().unwrap().clear();
        self.expenses.write().unwrap().clear();
        self.splits.write().unwrap().clear();
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HouseholdStorage for MemoryStorage {
    async fn save_member(&mut self, member: &Member) -> LedgerResult<()> {
        self.members
            .write()
            .unwrap()
            .insert(member.id, member.clone());
        Ok(())
    }

    async fn get_member(&self, member_id: MemberId) -> LedgerResult<Option<Member>> {
        Ok(self.members.read().unwrap().get(&member_id).cloned())
    }

    async fn save_household(&mut self, household: &Household) -> LedgerResult<()> {
        self.households
            .write()
            .unwrap()
            .insert(household.id, household.clone());
        Ok(())
    }

    async fn get_household(&self, household_id: HouseholdId) -> LedgerResult<Option<Household>> {
        Ok(self.households.read().unwrap().get(&household_id).cloned())
    }

    async fn list_member_households(&self, member_id: MemberId) -> LedgerResult<Vec<Household>> {
        let households = self.households.read().unwrap();
        let filtered: Vec<Household> = households
            .values()
            .filter(|household| household.is_member(member_id))
            .cloned()
            .collect();
        Ok(filtered)
    }

    async fn update_household(&mut self, household: &Household) -> LedgerResult<()> {
        let mut households = self.households.write().unwrap();
        if households.contains_key(&household.id) {
            households.insert(household.id, household.clone());
            Ok(())
        } else {
            Err(LedgerError::HouseholdNotFound(household.id))
        }
    }

    async fn delete_household(&mut self, household_id: HouseholdId) -> LedgerResult<()> {
        let mut households = self.households.write().unwrap();
        if households.remove(&household_id).is_none() {
            return Err(LedgerError::HouseholdNotFound(household_id));
        }

        // Cascade: drop the household's expenses and their splits
        let mut expenses = self.expenses.write().unwrap();
        let mut splits = self.splits.write().unwrap();
        let removed: Vec<ExpenseId> = expenses
            .values()
            .filter(|expense| expense.household_id == household_id)
            .map(|expense| expense.id)
            .collect();
        for expense_id in &removed {
            expenses.remove(expense_id);
        }
        splits.retain(|_, split| !removed.contains(&split.expense_id));
        Ok(())
    }

    async fn save_expense_with_splits(
        &mut self,
        expense: &Expense,
        new_splits: &[Split],
    ) -> LedgerResult<()> {
        let mut expenses = self.expenses.write().unwrap();
        let mut splits = self.splits.write().unwrap();

        expenses.insert(expense.id, expense.clone());
        for split in new_splits {
            splits.insert(split.id, split.clone());
        }
        Ok(())
    }

    async fn get_expense(&self, expense_id: ExpenseId) -> LedgerResult<Option<Expense>> {
        Ok(self.expenses.read().unwrap().get(&expense_id).cloned())
    }

    async fn get_household_expenses(
        &self,
        household_id: HouseholdId,
    ) -> LedgerResult<Vec<Expense>> {
        let expenses = self.expenses.read().unwrap();
        let filtered: Vec<Expense> = expenses
            .values()
            .filter(|expense| expense.household_id == household_id)
            .cloned()
            .collect();
        Ok(filtered)
    }

    async fn update_expense_with_splits(
        &mut self,
        expense: &Expense,
        new_splits: &[Split],
    ) -> LedgerResult<()> {
        let mut expenses = self.expenses.write().unwrap();
        let mut splits = self.splits.write().unwrap();

        if !expenses.contains_key(&expense.id) {
            return Err(LedgerError::ExpenseNotFound(expense.id));
        }

        expenses.insert(expense.id, expense.clone());
        for split in new_splits {
            splits.insert(split.id, split.clone());
        }
        Ok(())
    }

    async fn delete_expense(&mut self, expense_id: ExpenseId) -> LedgerResult<()> {
        let mut expenses = self.expenses.write().unwrap();
        let mut splits = self.splits.write().unwrap();

        if expenses.remove(&expense_id).is_none() {
            return Err(LedgerError::ExpenseNotFound(expense_id));
        }

        splits.retain(|_, split| split.expense_id != expense_id);
        Ok(())
    }

    async fn get_split(&self, split_id: SplitId) -> LedgerResult<Option<Split>> {
        Ok(self.splits.read().unwrap().get(&split_id).cloned())
    }

    async fn get_expense_splits(&self, expense_id: ExpenseId) -> LedgerResult<Vec<Split>> {
        let splits = self.splits.read().unwrap();
        let filtered: Vec<Split> = splits
            .values()
            .filter(|split| split.expense_id == expense_id)
            .cloned()
            .collect();
        Ok(filtered)
    }

    async fn update_splits(&mut self, updated: &[Split]) -> LedgerResult<()> {
        let mut splits = self.splits.write().unwrap();

        // Verify the whole batch before touching anything
        for split in updated {
            if !splits.contains_key(&split.id) {
                return Err(LedgerError::SplitNotFound(split.id));
            }
        }

        for split in updated {
            splits.insert(split.id, split.clone());
        }
        Ok(())
    }
}
