//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the ledger core.
pub type BankResult<T> = Result<T, BankError>;

/// Ledger-level error.
///
/// Every variant is an expected, recoverable condition that is reported back to
/// the caller. Storage and IO concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BankError {
    /// A deposit, withdrawal or transfer amount was zero or negative.
    #[error("amount must be positive (got {0})")]
    InvalidAmount(Decimal),

    /// A debit would take the account past its balance plus overdraft allowance.
    #[error("insufficient funds in {account}: requested {requested}, available {available}")]
    InsufficientFunds {
        account: String,
        requested: Decimal,
        available: Decimal,
    },

    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// `execute()` was called on a transaction that is already applied.
    #[error("transaction already executed: {0}")]
    AlreadyExecuted(String),

    /// `undo()` was called on a transaction that is not currently applied.
    #[error("transaction not executed: {0}")]
    NotExecuted(String),

    /// The factory (or a variant-specific setter) has no rule for this account type.
    #[error("unsupported account type: {0}")]
    UnsupportedAccountType(String),

    /// A construction-time invariant was violated (negative balance, rate or limit).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("account is closed: {0}")]
    AccountClosed(String),

    /// The account still holds funds (or debt) and cannot be closed or deleted.
    #[error("account {account} has non-zero balance {balance}")]
    NonZeroBalance { account: String, balance: Decimal },

    #[error("source and target account are the same: {0}")]
    SameAccountTransfer(String),

    /// The resulting balance or interest does not fit in a `Decimal`.
    #[error("arithmetic overflow on account {0}")]
    ArithmeticOverflow(String),

    /// Every account number the sequence can issue is already taken.
    #[error("account number sequence exhausted")]
    SequenceExhausted,
}

impl BankError {
    pub fn not_found(account_no: impl Into<String>) -> Self {
        Self::AccountNotFound(account_no.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub fn unsupported(kind: impl Into<String>) -> Self {
        Self::UnsupportedAccountType(kind.into())
    }

    pub fn overflow(account_no: impl Into<String>) -> Self {
        Self::ArithmeticOverflow(account_no.into())
    }

    pub fn closed(account_no: impl Into<String>) -> Self {
        Self::AccountClosed(account_no.into())
    }
}
