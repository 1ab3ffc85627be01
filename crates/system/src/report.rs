//! Account reports: text for terminals, JSON for export.

use core::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use bankcore_accounts::{Account, AccountType};
use bankcore_core::{AccountNo, OwnerId, Timestamp};

/// How the account table is rendered by the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            ReportFormat::Json
        } else {
            ReportFormat::Text
        }
    }
}

/// Snapshot of a single account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub number: AccountNo,
    pub account_type: AccountType,
    pub owner_id: OwnerId,
    pub balance: Decimal,
    pub available_funds: Decimal,
    pub interest_rate: Option<Decimal>,
    pub overdraft_limit: Option<Decimal>,
    pub last_interest_applied: Timestamp,
    pub history_entries: usize,
    pub closed: bool,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            number: account.number().clone(),
            account_type: account.account_type(),
            owner_id: account.owner_id().clone(),
            balance: account.balance(),
            available_funds: account.available_funds(),
            interest_rate: account.interest_rate(),
            overdraft_limit: account.overdraft_limit(),
            last_interest_applied: account.last_interest_applied(),
            history_entries: account.history().len(),
            closed: account.is_closed(),
        }
    }
}

impl fmt::Display for AccountSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Account Number: {}", self.number)?;
        writeln!(f, "Account Type: {}", self.account_type)?;
        writeln!(f, "Owner ID: {}", self.owner_id)?;
        writeln!(f, "Balance: ${:.2}", self.balance)?;
        writeln!(f, "Available Funds: ${:.2}", self.available_funds)?;
        if let Some(rate) = self.interest_rate {
            writeln!(f, "Interest Rate: {}%", rate * Decimal::ONE_HUNDRED)?;
        }
        if let Some(limit) = self.overdraft_limit {
            writeln!(f, "Overdraft Limit: ${limit:.2}")?;
        }
        writeln!(f, "Last Interest Applied: {}", self.last_interest_applied)?;
        writeln!(f, "History Entries: {}", self.history_entries)?;
        write!(f, "Status: {}", if self.closed { "Closed" } else { "Open" })
    }
}

/// Tabular listing of accounts, one row each.
#[derive(Debug, Clone, Default)]
pub struct AccountTable {
    rows: Vec<AccountSummary>,
}

impl AccountTable {
    pub fn new<'a, I>(accounts: I) -> Self
    where
        I: IntoIterator<Item = &'a Account>,
    {
        Self {
            rows: accounts.into_iter().map(AccountSummary::from).collect(),
        }
    }

    pub fn rows(&self) -> &[AccountSummary] {
        &self.rows
    }

    pub fn total_balance(&self) -> Decimal {
        self.rows
            .iter()
            .fold(Decimal::ZERO, |total, r| total.saturating_add(r.balance))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let output = serde_json::json!({
            "total_accounts": self.rows.len(),
            "total_balance": self.total_balance(),
            "accounts": self.rows,
        });
        serde_json::to_string_pretty(&output)
    }

    pub fn render(&self, format: ReportFormat) -> serde_json::Result<String> {
        match format {
            ReportFormat::Text => Ok(self.to_string()),
            ReportFormat::Json => self.to_json(),
        }
    }
}

impl fmt::Display for AccountTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return write!(f, "No accounts in the system.");
        }
        writeln!(
            f,
            "{:<14} {:<10} {:<16} {:>14}",
            "Account No", "Type", "Owner", "Balance"
        )?;
        writeln!(f, "{}", "-".repeat(57))?;
        for row in &self.rows {
            let marker = if row.closed { " (closed)" } else { "" };
            writeln!(
                f,
                "{:<14} {:<10} {:<16} {:>14.2}{}",
                row.number.as_str(),
                row.account_type.as_str(),
                row.owner_id.as_str(),
                row.balance,
                marker
            )?;
        }
        writeln!(f, "{}", "-".repeat(57))?;
        write!(
            f,
            "Total accounts: {}  Total balance: {:.2}",
            self.rows.len(),
            self.total_balance()
        )
    }
}
