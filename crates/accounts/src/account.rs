use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bankcore_core::{AccountNo, BankError, BankResult, Entity, OwnerId, Timestamp};

use crate::history::{EntryKind, HistoryEntry};

const DAYS_PER_YEAR: u32 = 365;

/// Account types known to the bank.
///
/// `Tfsa` is reserved: it has a number prefix but no construction rule yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Savings,
    Chequing,
    Tfsa,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "Savings",
            AccountType::Chequing => "Chequing",
            AccountType::Tfsa => "TFSA",
        }
    }

    /// Account number prefix.
    pub fn prefix(&self) -> &'static str {
        match self {
            AccountType::Savings => "SAV",
            AccountType::Chequing => "CHQ",
            AccountType::Tfsa => "TFSA",
        }
    }
}

impl core::fmt::Display for AccountType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "savings" | "sav" => Ok(AccountType::Savings),
            "chequing" | "checking" | "chq" => Ok(AccountType::Chequing),
            "tfsa" => Ok(AccountType::Tfsa),
            other => Err(BankError::unsupported(other)),
        }
    }
}

/// Variant-specific rules of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AccountPolicy {
    /// Interest-bearing, never overdrawn.
    Savings { interest_rate: Decimal },
    /// No interest, may dip below zero down to `-overdraft_limit`.
    Chequing { overdraft_limit: Decimal },
}

impl AccountPolicy {
    pub fn savings(interest_rate: Decimal) -> BankResult<Self> {
        if interest_rate < Decimal::ZERO {
            return Err(BankError::invalid_config(format!(
                "interest rate cannot be negative (got {interest_rate})"
            )));
        }
        Ok(Self::Savings { interest_rate })
    }

    pub fn chequing(overdraft_limit: Decimal) -> BankResult<Self> {
        if overdraft_limit < Decimal::ZERO {
            return Err(BankError::invalid_config(format!(
                "overdraft limit cannot be negative (got {overdraft_limit})"
            )));
        }
        Ok(Self::Chequing { overdraft_limit })
    }

    pub fn account_type(&self) -> AccountType {
        match self {
            AccountPolicy::Savings { .. } => AccountType::Savings,
            AccountPolicy::Chequing { .. } => AccountType::Chequing,
        }
    }

    /// Extra negative headroom a debit may use.
    pub fn overdraft_allowance(&self) -> Decimal {
        match self {
            AccountPolicy::Savings { .. } => Decimal::ZERO,
            AccountPolicy::Chequing { overdraft_limit } => *overdraft_limit,
        }
    }
}

/// A balance holder.
///
/// Balance invariant: `balance >= -overdraft_allowance()` after every
/// operation. Operations that would break it fail before mutating anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    number: AccountNo,
    owner_id: OwnerId,
    balance: Decimal,
    policy: AccountPolicy,
    history: Vec<HistoryEntry>,
    last_interest_applied: Timestamp,
    closed: bool,
}

impl Account {
    /// Open a new account. The opening balance must not be negative.
    pub fn open(
        number: AccountNo,
        owner_id: OwnerId,
        balance: Decimal,
        policy: AccountPolicy,
        opened_at: Timestamp,
    ) -> BankResult<Self> {
        if balance < Decimal::ZERO {
            return Err(BankError::invalid_config(format!(
                "initial balance cannot be negative (got {balance})"
            )));
        }
        Ok(Self::build(number, owner_id, balance, policy, opened_at))
    }

    /// Rebuild an account from stored state.
    ///
    /// A chequing account may come back overdrawn, but never past its limit.
    pub fn restore(
        number: AccountNo,
        owner_id: OwnerId,
        balance: Decimal,
        policy: AccountPolicy,
        loaded_at: Timestamp,
    ) -> BankResult<Self> {
        let floor = -policy.overdraft_allowance();
        if balance < floor {
            return Err(BankError::invalid_config(format!(
                "stored balance {balance} of {number} is below the allowed floor {floor}"
            )));
        }
        Ok(Self::build(number, owner_id, balance, policy, loaded_at))
    }

    fn build(
        number: AccountNo,
        owner_id: OwnerId,
        balance: Decimal,
        policy: AccountPolicy,
        at: Timestamp,
    ) -> Self {
        Self {
            number,
            owner_id,
            balance,
            policy,
            history: Vec::new(),
            last_interest_applied: at,
            closed: false,
        }
    }

    pub fn number(&self) -> &AccountNo {
        &self.number
    }

    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn policy(&self) -> &AccountPolicy {
        &self.policy
    }

    pub fn account_type(&self) -> AccountType {
        self.policy.account_type()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn last_interest_applied(&self) -> Timestamp {
        self.last_interest_applied
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn overdraft_allowance(&self) -> Decimal {
        self.policy.overdraft_allowance()
    }

    /// Balance plus overdraft headroom.
    pub fn available_funds(&self) -> Decimal {
        self.balance.saturating_add(self.overdraft_allowance())
    }

    pub fn is_overdrawn(&self) -> bool {
        self.balance < Decimal::ZERO
    }

    pub fn interest_rate(&self) -> Option<Decimal> {
        match &self.policy {
            AccountPolicy::Savings { interest_rate } => Some(*interest_rate),
            AccountPolicy::Chequing { .. } => None,
        }
    }

    pub fn overdraft_limit(&self) -> Option<Decimal> {
        match &self.policy {
            AccountPolicy::Savings { .. } => None,
            AccountPolicy::Chequing { overdraft_limit } => Some(*overdraft_limit),
        }
    }

    pub fn set_interest_rate(&mut self, rate: Decimal) -> BankResult<()> {
        match self.policy {
            AccountPolicy::Savings { .. } => {
                self.policy = AccountPolicy::savings(rate)?;
                Ok(())
            }
            AccountPolicy::Chequing { .. } => Err(BankError::unsupported(format!(
                "{} accounts have no interest rate",
                self.account_type()
            ))),
        }
    }

    /// Lowering the limit below the current debt is rejected.
    pub fn set_overdraft_limit(&mut self, limit: Decimal) -> BankResult<()> {
        match self.policy {
            AccountPolicy::Chequing { .. } => {
                let policy = AccountPolicy::chequing(limit)?;
                if self.balance < -limit {
                    return Err(BankError::invalid_config(format!(
                        "overdraft limit {limit} is below current debt of {}",
                        -self.balance
                    )));
                }
                self.policy = policy;
                Ok(())
            }
            AccountPolicy::Savings { .. } => Err(BankError::unsupported(format!(
                "{} accounts have no overdraft",
                self.account_type()
            ))),
        }
    }

    fn ensure_open(&self) -> BankResult<()> {
        if self.closed {
            return Err(BankError::closed(self.number.as_str()));
        }
        Ok(())
    }

    fn ensure_positive(amount: Decimal) -> BankResult<()> {
        if amount <= Decimal::ZERO {
            return Err(BankError::InvalidAmount(amount));
        }
        Ok(())
    }

    fn check_debit(&self, amount: Decimal) -> BankResult<()> {
        Self::ensure_positive(amount)?;
        self.ensure_open()?;
        let available = self.available_funds();
        if amount > available {
            return Err(BankError::InsufficientFunds {
                account: self.number.to_string(),
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    fn warn_if_overdrawn(&self) {
        if self.is_overdrawn() {
            tracing::warn!(
                account = %self.number,
                overdrawn_by = %(-self.balance),
                "account overdrawn"
            );
        }
    }

    /// Credit `amount`. History is recorded by the transaction, not here.
    pub fn deposit(&mut self, amount: Decimal) -> BankResult<()> {
        Self::ensure_positive(amount)?;
        self.ensure_open()?;
        self.balance = self.credited(amount)?;
        Ok(())
    }

    pub fn withdraw(&mut self, amount: Decimal) -> BankResult<()> {
        self.balance = self.debited(amount)?;
        self.warn_if_overdrawn();
        Ok(())
    }

    /// Move `amount` to `target`. Every check runs before either balance changes.
    pub fn transfer_to(&mut self, target: &mut Account, amount: Decimal) -> BankResult<()> {
        let source_balance = self.debited(amount)?;
        target.ensure_open()?;
        let target_balance = target.credited(amount)?;
        self.balance = source_balance;
        target.balance = target_balance;
        self.warn_if_overdrawn();
        Ok(())
    }

    fn credited(&self, amount: Decimal) -> BankResult<Decimal> {
        self.balance
            .checked_add(amount)
            .ok_or_else(|| BankError::overflow(self.number.as_str()))
    }

    /// Balance after debiting `amount`, if the debit is allowed.
    fn debited(&self, amount: Decimal) -> BankResult<Decimal> {
        self.check_debit(amount)?;
        self.balance
            .checked_sub(amount)
            .ok_or_else(|| BankError::overflow(self.number.as_str()))
    }

    /// Accrue simple daily interest up to `now`.
    ///
    /// Returns whether any interest was credited. Chequing accounts never
    /// accrue but still move their accrual mark forward. Overflow leaves the
    /// account untouched.
    pub fn apply_interest(&mut self, now: Timestamp) -> BankResult<bool> {
        match self.policy {
            AccountPolicy::Savings { interest_rate } => {
                let days = now.days_since(&self.last_interest_applied);
                let interest = accrued_interest(self.balance, interest_rate, days)
                    .ok_or_else(|| BankError::overflow(self.number.as_str()))?;
                if interest <= Decimal::ZERO {
                    return Ok(false);
                }
                self.balance = self.credited(interest)?;
                self.last_interest_applied = now;
                self.history.push(HistoryEntry {
                    transaction_id: format!("INT-{}-{}", self.number, now),
                    kind: EntryKind::Interest,
                    amount: interest,
                    balance_after: self.balance,
                    at: now,
                    counterparty: None,
                    reversal: false,
                    description: format!("Interest at {interest_rate} p.a. over {days} days"),
                });
                tracing::info!(
                    account = %self.number,
                    interest = %interest,
                    balance = %self.balance,
                    "applied interest"
                );
                Ok(true)
            }
            AccountPolicy::Chequing { .. } => {
                self.last_interest_applied = now;
                Ok(false)
            }
        }
    }

    /// Mark the account closed. Only a zero balance may be closed.
    pub fn close(&mut self) -> BankResult<()> {
        if !self.balance.is_zero() {
            return Err(BankError::NonZeroBalance {
                account: self.number.to_string(),
                balance: self.balance,
            });
        }
        self.closed = true;
        Ok(())
    }

    pub(crate) fn record(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }
}

impl Entity for Account {
    type Id = AccountNo;

    fn id(&self) -> &Self::Id {
        &self.number
    }
}

/// `balance * (rate / 365) * days`, or `None` if the result overflows.
pub fn accrued_interest(balance: Decimal, annual_rate: Decimal, days: Decimal) -> Option<Decimal> {
    let daily_rate = annual_rate.checked_div(Decimal::from(DAYS_PER_YEAR))?;
    balance.checked_mul(daily_rate)?.checked_mul(days)
}
