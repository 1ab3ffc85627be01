//! Per-account history entries.
//!
//! Accounts keep history as plain values. An entry never points back at the
//! transaction that produced it; it only carries the transaction id.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bankcore_core::{AccountNo, Timestamp};

/// What happened to the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Deposit,
    Withdrawal,
    TransferIn,
    TransferOut,
    Interest,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Deposit => "Deposit",
            EntryKind::Withdrawal => "Withdrawal",
            EntryKind::TransferIn => "Transfer In",
            EntryKind::TransferOut => "Transfer Out",
            EntryKind::Interest => "Interest",
        }
    }

    fn natural_direction(&self) -> Direction {
        match self {
            EntryKind::Deposit | EntryKind::TransferIn | EntryKind::Interest => Direction::Credit,
            EntryKind::Withdrawal | EntryKind::TransferOut => Direction::Debit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    fn flip(self) -> Self {
        match self {
            Direction::Credit => Direction::Debit,
            Direction::Debit => Direction::Credit,
        }
    }
}

/// One line of an account's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub transaction_id: String,
    pub kind: EntryKind,
    /// Positive amount moved.
    pub amount: Decimal,
    /// Account balance right after this entry was applied.
    pub balance_after: Decimal,
    pub at: Timestamp,
    /// Other side of a transfer.
    pub counterparty: Option<AccountNo>,
    /// true when this entry undoes an earlier entry with the same transaction id.
    pub reversal: bool,
    pub description: String,
}

impl HistoryEntry {
    pub fn direction(&self) -> Direction {
        let natural = self.kind.natural_direction();
        if self.reversal { natural.flip() } else { natural }
    }

    /// Amount with the sign of its effect on the balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.direction() {
            Direction::Credit => self.amount,
            Direction::Debit => -self.amount,
        }
    }
}

impl core::fmt::Display for HistoryEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = if self.reversal {
            format!("{} (reversal)", self.kind.as_str())
        } else {
            self.kind.as_str().to_string()
        };
        write!(
            f,
            "{} {:<24} {:>12.2} -> {:>12.2}  [{}]",
            self.at,
            label,
            self.signed_amount(),
            self.balance_after,
            self.transaction_id
        )?;
        if let Some(other) = &self.counterparty {
            write!(f, " ({other})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(kind: EntryKind, reversal: bool) -> HistoryEntry {
        HistoryEntry {
            transaction_id: "T-1".to_string(),
            kind,
            amount: dec!(25),
            balance_after: dec!(100),
            at: Timestamp::from_ymd_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            counterparty: None,
            reversal,
            description: String::new(),
        }
    }

    #[test]
    fn reversal_flips_the_sign() {
        assert_eq!(entry(EntryKind::Deposit, false).signed_amount(), dec!(25));
        assert_eq!(entry(EntryKind::Deposit, true).signed_amount(), dec!(-25));
        assert_eq!(entry(EntryKind::TransferOut, false).signed_amount(), dec!(-25));
        assert_eq!(entry(EntryKind::TransferOut, true).direction(), Direction::Credit);
    }

    #[test]
    fn display_mentions_reversal_and_counterparty() {
        let mut e = entry(EntryKind::TransferIn, true);
        e.counterparty = Some(AccountNo::new("CHQ-001001"));
        let line = e.to_string();
        assert!(line.contains("Transfer In (reversal)"));
        assert!(line.contains("(CHQ-001001)"));
    }
}
