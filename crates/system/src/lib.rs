//! Bank facade, persistence and configuration.
//!
//! Front ends talk to [`BankSystem`]; the account rules live in
//! `bankcore-accounts`.

pub mod bank;
pub mod config;
pub mod persistence;
pub mod report;

pub use bank::{BankSystem, Receipt};
pub use config::BankConfig;
pub use persistence::{AccountFile, PersistenceError};
pub use report::{AccountSummary, AccountTable, ReportFormat};
