//! Account construction and number generation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bankcore_core::{AccountNo, BankError, BankResult, OwnerId, Timestamp};

use crate::account::{Account, AccountPolicy, AccountType};
use crate::repository::AccountRepository;

/// Monotonic counter behind generated account numbers.
///
/// Owned by a factory instance; there is no process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountNumberSequence {
    next: u64,
    /// Set once `u64::MAX` has been issued or observed.
    exhausted: bool,
}

impl AccountNumberSequence {
    pub const DEFAULT_START: u64 = 1000;

    pub fn starting_at(next: u64) -> Self {
        Self {
            next,
            exhausted: false,
        }
    }

    /// Value the next generated number will carry. Meaningless once exhausted.
    pub fn peek(&self) -> u64 {
        self.next
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn take(&mut self) -> BankResult<u64> {
        if self.exhausted {
            return Err(BankError::SequenceExhausted);
        }
        let value = self.next;
        match value.checked_add(1) {
            Some(next) => self.next = next,
            None => self.exhausted = true,
        }
        Ok(value)
    }

    /// Make sure the next value is greater than `observed`. Never moves backwards.
    pub fn advance_past(&mut self, observed: u64) {
        if observed < self.next {
            return;
        }
        match observed.checked_add(1) {
            Some(next) => self.next = next,
            None => self.exhausted = true,
        }
    }
}

impl Default for AccountNumberSequence {
    fn default() -> Self {
        Self::starting_at(Self::DEFAULT_START)
    }
}

/// Policy defaults applied to newly created (and restored) accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDefaults {
    pub savings_interest_rate: Decimal,
    pub chequing_overdraft_limit: Decimal,
}

impl Default for AccountDefaults {
    fn default() -> Self {
        Self {
            savings_interest_rate: Decimal::new(2, 2),
            chequing_overdraft_limit: Decimal::new(500, 0),
        }
    }
}

impl AccountDefaults {
    fn policy_for(&self, account_type: AccountType) -> BankResult<AccountPolicy> {
        match account_type {
            AccountType::Savings => AccountPolicy::savings(self.savings_interest_rate),
            AccountType::Chequing => AccountPolicy::chequing(self.chequing_overdraft_limit),
            AccountType::Tfsa => Err(BankError::unsupported(format!(
                "{} accounts are not yet implemented",
                account_type
            ))),
        }
    }

    pub fn validate(&self) -> BankResult<()> {
        AccountPolicy::savings(self.savings_interest_rate)?;
        AccountPolicy::chequing(self.chequing_overdraft_limit)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccountFactory {
    sequence: AccountNumberSequence,
    defaults: AccountDefaults,
}

impl AccountFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults(defaults: AccountDefaults) -> BankResult<Self> {
        defaults.validate()?;
        Ok(Self {
            sequence: AccountNumberSequence::default(),
            defaults,
        })
    }

    pub fn with_sequence(mut self, sequence: AccountNumberSequence) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn defaults(&self) -> &AccountDefaults {
        &self.defaults
    }

    pub fn sequence(&self) -> &AccountNumberSequence {
        &self.sequence
    }

    fn format_number(account_type: AccountType, value: u64) -> AccountNo {
        AccountNo::new(format!("{}-{:06}", account_type.prefix(), value))
    }

    /// Create a new account with a freshly drawn number.
    ///
    /// Validation happens first, so a rejected request does not use up a number.
    pub fn create(
        &mut self,
        account_type: AccountType,
        owner_id: OwnerId,
        initial_balance: Decimal,
        now: Timestamp,
    ) -> BankResult<Account> {
        let policy = self.defaults.policy_for(account_type)?;
        if initial_balance < Decimal::ZERO {
            return Err(BankError::invalid_config(format!(
                "initial balance cannot be negative (got {initial_balance})"
            )));
        }

        let number = Self::format_number(account_type, self.sequence.take()?);
        let account = Account::open(number, owner_id, initial_balance, policy, now)?;
        tracing::debug!(
            account = %account.number(),
            account_type = %account_type,
            "account constructed"
        );
        Ok(account)
    }

    /// Rebuild a stored account using the current policy defaults.
    pub fn restore(
        &self,
        account_type: AccountType,
        number: AccountNo,
        owner_id: OwnerId,
        balance: Decimal,
        now: Timestamp,
    ) -> BankResult<Account> {
        let policy = self.defaults.policy_for(account_type)?;
        Account::restore(number, owner_id, balance, policy, now)
    }

    /// Advance the counter past every number already present in `repo`.
    ///
    /// Returns the value the next created account will use.
    pub fn update_counter_from_loaded_accounts(&mut self, repo: &AccountRepository) -> u64 {
        self.reseed(repo.account_numbers())
    }

    pub fn reseed<'a, I>(&mut self, numbers: I) -> u64
    where
        I: IntoIterator<Item = &'a AccountNo>,
    {
        if let Some(max) = numbers
            .into_iter()
            .filter_map(AccountNo::numeric_suffix)
            .max()
        {
            self.sequence.advance_past(max);
        }
        tracing::debug!(next = self.sequence.peek(), "account number sequence reseeded");
        self.sequence.peek()
    }
}
