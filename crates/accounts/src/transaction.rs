//! Command-style transactions with execute/undo.
//!
//! A transaction names the accounts it touches by number and executes against
//! an [`AccountStore`]. It never owns the accounts. Every successful execute
//! appends a history entry to each involved account, and every successful undo
//! appends the paired reversal entry.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bankcore_core::{AccountNo, BankError, BankResult, Entity, Timestamp};

use crate::account::Account;
use crate::history::{EntryKind, HistoryEntry};
use crate::repository::AccountStore;

/// The accounts a transaction moves money between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit { account: AccountNo },
    Withdraw { account: AccountNo },
    Transfer { from: AccountNo, to: AccountNo },
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit { .. } => "Deposit",
            TransactionKind::Withdraw { .. } => "Withdrawal",
            TransactionKind::Transfer { .. } => "Transfer",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            TransactionKind::Deposit { .. } => "DEP",
            TransactionKind::Withdraw { .. } => "WDR",
            TransactionKind::Transfer { .. } => "TRF",
        }
    }
}

/// Lifecycle: `Created → Executed → (Undone → Executed → …)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    Created,
    Executed,
    Undone,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: String,
    kind: TransactionKind,
    amount: Decimal,
    timestamp: Timestamp,
    description: String,
    state: TransactionState,
}

impl Transaction {
    fn new(
        kind: TransactionKind,
        amount: Decimal,
        timestamp: Timestamp,
        description: impl Into<String>,
    ) -> Self {
        let accounts = match &kind {
            TransactionKind::Deposit { account } | TransactionKind::Withdraw { account } => {
                account.to_string()
            }
            TransactionKind::Transfer { from, to } => format!("{from}-{to}"),
        };
        let id = format!("{}-{}-{}", kind.id_prefix(), accounts, timestamp);
        Self {
            id,
            kind,
            amount,
            timestamp,
            description: description.into(),
            state: TransactionState::Created,
        }
    }

    pub fn deposit(
        account: AccountNo,
        amount: Decimal,
        timestamp: Timestamp,
        description: impl Into<String>,
    ) -> Self {
        Self::new(TransactionKind::Deposit { account }, amount, timestamp, description)
    }

    pub fn withdraw(
        account: AccountNo,
        amount: Decimal,
        timestamp: Timestamp,
        description: impl Into<String>,
    ) -> Self {
        Self::new(TransactionKind::Withdraw { account }, amount, timestamp, description)
    }

    pub fn transfer(
        from: AccountNo,
        to: AccountNo,
        amount: Decimal,
        timestamp: Timestamp,
        description: impl Into<String>,
    ) -> Self {
        Self::new(TransactionKind::Transfer { from, to }, amount, timestamp, description)
    }

    pub fn kind(&self) -> &TransactionKind {
        &self.kind
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_executed(&self) -> bool {
        self.state == TransactionState::Executed
    }

    /// Account numbers touched, source first for transfers.
    pub fn account_numbers(&self) -> Vec<&AccountNo> {
        match &self.kind {
            TransactionKind::Deposit { account } | TransactionKind::Withdraw { account } => {
                vec![account]
            }
            TransactionKind::Transfer { from, to } => vec![from, to],
        }
    }

    fn entry(
        &self,
        kind: EntryKind,
        account: &Account,
        counterparty: Option<&AccountNo>,
        at: Timestamp,
        reversal: bool,
    ) -> HistoryEntry {
        HistoryEntry {
            transaction_id: self.id.clone(),
            kind,
            amount: self.amount,
            balance_after: account.balance(),
            at,
            counterparty: counterparty.cloned(),
            reversal,
            description: self.description.clone(),
        }
    }

    /// Apply the transaction. Fails without side effects if already executed
    /// or if the underlying account operation is rejected.
    pub fn execute<S>(&mut self, store: &mut S) -> BankResult<()>
    where
        S: AccountStore + ?Sized,
    {
        if self.is_executed() {
            tracing::warn!(transaction = %self.id, "transaction already executed");
            return Err(BankError::AlreadyExecuted(self.id.clone()));
        }

        let at = self.timestamp;
        match &self.kind {
            TransactionKind::Deposit { account } => {
                let acct = store.account_mut(account)?;
                acct.deposit(self.amount)?;
                let entry = self.entry(EntryKind::Deposit, acct, None, at, false);
                acct.record(entry);
            }
            TransactionKind::Withdraw { account } => {
                let acct = store.account_mut(account)?;
                acct.withdraw(self.amount)?;
                let entry = self.entry(EntryKind::Withdrawal, acct, None, at, false);
                acct.record(entry);
            }
            TransactionKind::Transfer { from, to } => {
                let (source, target) = store.account_pair_mut(from, to)?;
                source.transfer_to(target, self.amount)?;
                let out = self.entry(EntryKind::TransferOut, source, Some(to), at, false);
                let inc = self.entry(EntryKind::TransferIn, target, Some(from), at, false);
                source.record(out);
                target.record(inc);
            }
        }

        self.state = TransactionState::Executed;
        tracing::info!(
            transaction = %self.id,
            kind = self.kind.as_str(),
            amount = %self.amount,
            "transaction executed"
        );
        Ok(())
    }

    /// Reverse an executed transaction, stamping the reversal entries with `at`.
    ///
    /// Undoing a deposit or transfer can fail with `InsufficientFunds` when the
    /// credited account has since been drawn down.
    pub fn undo<S>(&mut self, store: &mut S, at: Timestamp) -> BankResult<()>
    where
        S: AccountStore + ?Sized,
    {
        if !self.is_executed() {
            tracing::warn!(transaction = %self.id, "cannot undo: transaction not executed");
            return Err(BankError::NotExecuted(self.id.clone()));
        }

        match &self.kind {
            TransactionKind::Deposit { account } => {
                let acct = store.account_mut(account)?;
                acct.withdraw(self.amount)?;
                let entry = self.entry(EntryKind::Deposit, acct, None, at, true);
                acct.record(entry);
            }
            TransactionKind::Withdraw { account } => {
                let acct = store.account_mut(account)?;
                acct.deposit(self.amount)?;
                let entry = self.entry(EntryKind::Withdrawal, acct, None, at, true);
                acct.record(entry);
            }
            TransactionKind::Transfer { from, to } => {
                let (source, target) = store.account_pair_mut(from, to)?;
                target.transfer_to(source, self.amount)?;
                let out = self.entry(EntryKind::TransferOut, source, Some(to), at, true);
                let inc = self.entry(EntryKind::TransferIn, target, Some(from), at, true);
                source.record(out);
                target.record(inc);
            }
        }

        self.state = TransactionState::Undone;
        tracing::info!(
            transaction = %self.id,
            kind = self.kind.as_str(),
            amount = %self.amount,
            "transaction undone"
        );
        Ok(())
    }

    /// Human-readable multi-line description.
    pub fn record(&self) -> String {
        let mut lines = vec![
            format!("Transaction ID: {}", self.id),
            format!("Timestamp: {}", self.timestamp),
            format!("Description: {}", self.description),
            format!("Type: {}", self.kind.as_str()),
        ];
        match &self.kind {
            TransactionKind::Deposit { account } | TransactionKind::Withdraw { account } => {
                lines.push(format!("Account: {account}"));
            }
            TransactionKind::Transfer { from, to } => {
                lines.push(format!("From Account: {from}"));
                lines.push(format!("To Account: {to}"));
            }
        }
        lines.push(format!("Amount: ${:.2}", self.amount));
        let status = if self.is_executed() {
            "Executed"
        } else {
            "Not Executed"
        };
        lines.push(format!("Status: {status}"));
        lines.join("\n")
    }
}

impl Entity for Transaction {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
