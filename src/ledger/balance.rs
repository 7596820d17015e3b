//! Net-balance computation between household members

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::traits::*;
use crate::types::*;

/// Net unpaid balances between one member and every counterpart
///
/// An explicit accumulator returned by value; entries default to zero and
/// are only created once a split contributes to them. Sign convention:
/// a positive balance for member M means the viewer owes M, a negative
/// balance means M owes the viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceLedger {
    viewer_id: MemberId,
    balances: HashMap<MemberId, BigDecimal>,
}

impl BalanceLedger {
    /// Create an empty ledger from the viewer's perspective
    pub fn new(viewer_id: MemberId) -> Self {
        Self {
            viewer_id,
            balances: HashMap::new(),
        }
    }

    /// The member this ledger is computed for
    pub fn viewer_id(&self) -> MemberId {
        self.viewer_id
    }

    /// Fold one split into the ledger
    ///
    /// Paid splits contribute nothing. When the viewer paid the expense,
    /// the debtor's balance decreases (they owe the viewer); when the
    /// viewer is the debtor, the payer's balance increases (the viewer
    /// owes them). Splits between two other members are ignored.
    pub fn apply_split(&mut self, payer_id: MemberId, split: &Split) {
        if split.has_paid {
            return;
        }

        if payer_id == self.viewer_id {
            let entry = self
                .balances
                .entry(split.member_id)
                .or_insert_with(|| BigDecimal::from(0));
            *entry -= &split.amount_owed;
        } else if split.member_id == self.viewer_id {
            let entry = self
                .balances
                .entry(payer_id)
                .or_insert_with(|| BigDecimal::from(0));
            *entry += &split.amount_owed;
        }
    }

    /// Net balance with a specific member; zero when no entry exists
    pub fn balance_with(&self, member_id: MemberId) -> BigDecimal {
        self.balances
            .get(&member_id)
            .cloned()
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    /// Whether the ledger carries an entry for a member
    pub fn has_entry(&self, member_id: MemberId) -> bool {
        self.balances.contains_key(&member_id)
    }

    /// All entries, unordered
    pub fn entries(&self) -> &HashMap<MemberId, BigDecimal> {
        &self.balances
    }

    /// Consume the ledger and return the raw entry map
    pub fn into_entries(self) -> HashMap<MemberId, BigDecimal> {
        self.balances
    }

    /// Entries ranked by balance magnitude, largest first
    ///
    /// The fold itself guarantees no ordering; this is the ranked view
    /// consumers use for display.
    pub fn ranked(&self) -> Vec<(MemberId, BigDecimal)> {
        let mut entries: Vec<(MemberId, BigDecimal)> = self
            .balances
            .iter()
            .map(|(id, amount)| (*id, amount.clone()))
            .collect();
        entries.sort_by(|a, b| b.1.abs().cmp(&a.1.abs()));
        entries
    }

    /// Drop entries whose contributions netted out to exactly zero
    ///
    /// Keeps the contract that a key in the ledger means a nonzero unpaid
    /// balance in one direction or the other.
    pub fn prune_settled(&mut self) {
        self.balances
            .retain(|_, amount| *amount != BigDecimal::from(0));
    }

    /// Whether the ledger has no entries
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Number of counterpart entries
    pub fn len(&self) -> usize {
        self.balances.len()
    }
}

/// Balance manager for computing ledgers and unpaid-split views
pub struct BalanceManager<S: HouseholdStorage> {
    storage: S,
}

impl<S: HouseholdStorage> BalanceManager<S> {
    /// Create a new balance manager
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Get a household by ID, returning an error if not found
    async fn get_household_required(&self, household_id: HouseholdId) -> LedgerResult<Household> {
        self.storage
            .get_household(household_id)
            .await?
            .ok_or(LedgerError::HouseholdNotFound(household_id))
    }

    /// Compute the net unpaid balance between the viewer and every other
    /// household member
    ///
    /// Scans every expense and split in the household on each call. That is
    /// fine at household scale; a deployment with very large households
    /// would maintain a balance table incrementally instead.
    pub async fn compute_ledger(
        &self,
        household_id: HouseholdId,
        viewer_id: MemberId,
    ) -> LedgerResult<BalanceLedger> {
        self.get_household_required(household_id).await?;

        let mut ledger = BalanceLedger::new(viewer_id);
        let expenses = self.storage.get_household_expenses(household_id).await?;

        for expense in &expenses {
            let splits = self.storage.get_expense_splits(expense.id).await?;
            for split in &splits {
                ledger.apply_split(expense.payer_id, split);
            }
        }

        ledger.prune_settled();
        debug!(
            household = %household_id,
            viewer = %viewer_id,
            counterparts = ledger.len(),
            "computed balance ledger"
        );
        Ok(ledger)
    }

    /// Group the viewer's unpaid splits by counterpart member, covering
    /// both directions of each pair
    pub async fn unpaid_splits_by_counterpart(
        &self,
        household_id: HouseholdId,
        viewer_id: MemberId,
    ) -> LedgerResult<HashMap<MemberId, CounterpartSplits>> {
        self.get_household_required(household_id).await?;

        let mut grouped: HashMap<MemberId, CounterpartSplits> = HashMap::new();
        let expenses = self.storage.get_household_expenses(household_id).await?;

        for expense in &expenses {
            let splits = self.storage.get_expense_splits(expense.id).await?;
            for split in splits {
                if split.has_paid {
                    continue;
                }

                if expense.payer_id == viewer_id {
                    grouped
                        .entry(split.member_id)
                        .or_insert_with(|| empty_counterpart(split.member_id))
                        .owed_to_viewer
                        .push(split);
                } else if split.member_id == viewer_id {
                    grouped
                        .entry(expense.payer_id)
                        .or_insert_with(|| empty_counterpart(expense.payer_id))
                        .owed_by_viewer
                        .push(split);
                }
            }
        }

        Ok(grouped)
    }
}

fn empty_counterpart(counterpart_id: MemberId) -> CounterpartSplits {
    CounterpartSplits {
        counterpart_id,
        owed_to_viewer: Vec::new(),
        owed_by_viewer: Vec::new(),
    }
}
