//! Account and transaction core.
//!
//! Pure domain logic only: balances, overdraft rules, interest accrual,
//! execute/undo transactions and the in-memory account repository. No IO.

pub mod account;
pub mod factory;
pub mod history;
pub mod repository;
pub mod transaction;

pub use account::{Account, AccountPolicy, AccountType, accrued_interest};
pub use factory::{AccountDefaults, AccountFactory, AccountNumberSequence};
pub use history::{Direction, EntryKind, HistoryEntry};
pub use repository::{AccountRepository, AccountStore};
pub use transaction::{Transaction, TransactionKind, TransactionState};
