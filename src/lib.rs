//! # Splitledger Core
//!
//! A storage-agnostic library for splitting shared expenses: members form
//! households, log who paid for what, and the ledger works out who owes whom.
//!
//! ## Features
//!
//! - **Even split generation**: expense costs divided across all household
//!   members, with the payer's own share left unrecorded
//! - **Balance ledgers**: per-viewer net balances folded from unpaid splits
//! - **Settlement tracking**: settle a single split or everything outstanding
//!   between two people at once, idempotently
//! - **Membership safeguards**: members with outstanding balances cannot be
//!   removed from a household
//! - **Authorization seam**: a fixed action vocabulary the host application
//!   answers, never decided inside the core
//! - **Storage abstraction**: database-agnostic design with trait-based storage
//!
//! ## Quick Start
//!
//! ```rust
//! use splitledger_core::{HouseholdLedger, Expense};
//! use splitledger_core::utils::MemoryStorage;
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = MemoryStorage::new();
//! let mut ledger = HouseholdLedger::new(storage);
//!
//! let anna = ledger.register_member("anna".to_string()).await?;
//! let ben = ledger.register_member("ben".to_string()).await?;
//!
//! let flat = ledger.create_household("Flat 12".to_string(), anna.id).await?;
//! ledger.apply_membership_change(flat.id, &[ben.id], &[], anna.id).await?;
//!
//! let expense = Expense::new(
//!     flat.id,
//!     anna.id,
//!     "Groceries".to_string(),
//!     BigDecimal::from(30),
//!     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
//! );
//! ledger.record_expense(expense).await?;
//!
//! let balances = ledger.compute_ledger(flat.id, ben.id).await?;
//! assert_eq!(balances.balance_with(anna.id), BigDecimal::from(15));
//! # Ok(())
//! # }
//! ```

pub mod household;
pub mod ledger;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use household::*;
pub use ledger::*;
pub use traits::*;
pub use types::*;

// Re-export split generation helpers for convenience
pub use ledger::expense::splits;
