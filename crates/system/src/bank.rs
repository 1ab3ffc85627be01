//! `BankSystem`: the single entry point used by front ends.
//!
//! Every money movement follows the same path: check that the accounts exist,
//! build a [`Transaction`], execute it against the repository and hand back a
//! [`Receipt`]. A failed operation leaves every balance untouched.

use rust_decimal::Decimal;

use bankcore_accounts::{
    Account, AccountDefaults, AccountFactory, AccountRepository, AccountType, HistoryEntry,
    Transaction,
};
use bankcore_core::{
    AccountNo, BankError, BankResult, Clock, Entity, OwnerId, SystemClock, Timestamp,
};

use crate::persistence::{AccountFile, PersistenceError};
use crate::report::{AccountSummary, AccountTable};

/// Outcome of a successful money movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// The executed (or undone) transaction; keep it to undo later.
    pub transaction: Transaction,
    /// Balances of the touched accounts after the operation.
    pub balances: Vec<(AccountNo, Decimal)>,
}

impl Receipt {
    pub fn balance_of(&self, account_no: &AccountNo) -> Option<Decimal> {
        self.balances
            .iter()
            .find(|(no, _)| no == account_no)
            .map(|(_, balance)| *balance)
    }
}

#[derive(Debug)]
pub struct BankSystem<C: Clock = SystemClock> {
    accounts: AccountRepository,
    factory: AccountFactory,
    clock: C,
}

impl BankSystem<SystemClock> {
    pub fn new() -> Self {
        Self::with_parts(AccountRepository::new(), AccountFactory::new(), SystemClock)
    }
}

impl Default for BankSystem<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> BankSystem<C> {
    pub fn with_parts(accounts: AccountRepository, factory: AccountFactory, clock: C) -> Self {
        Self {
            accounts,
            factory,
            clock,
        }
    }

    /// Empty bank whose factory applies `defaults`.
    pub fn with_defaults(defaults: AccountDefaults, clock: C) -> BankResult<Self> {
        let factory = AccountFactory::with_defaults(defaults)?;
        Ok(Self::with_parts(AccountRepository::new(), factory, clock))
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn repository(&self) -> &AccountRepository {
        &self.accounts
    }

    pub fn factory(&self) -> &AccountFactory {
        &self.factory
    }

    fn require(&self, account_no: &AccountNo) -> BankResult<&Account> {
        self.accounts
            .get(account_no)
            .ok_or_else(|| BankError::not_found(account_no.as_str()))
    }

    fn require_mut(&mut self, account_no: &AccountNo) -> BankResult<&mut Account> {
        self.accounts
            .get_mut(account_no)
            .ok_or_else(|| BankError::not_found(account_no.as_str()))
    }

    fn receipt(&self, transaction: Transaction) -> Receipt {
        let balances = transaction
            .account_numbers()
            .into_iter()
            .filter_map(|no| self.accounts.get(no).map(|a| (no.clone(), a.balance())))
            .collect();
        Receipt {
            transaction,
            balances,
        }
    }

    fn run(&mut self, mut transaction: Transaction) -> BankResult<Receipt> {
        transaction
            .execute(&mut self.accounts)
            .inspect_err(|err| {
                tracing::warn!(
                    transaction = %transaction.id().as_str(),
                    error = %err,
                    "transaction rejected"
                )
            })?;
        Ok(self.receipt(transaction))
    }

    // ---- account lifecycle ----

    /// Open a new account and return its number.
    ///
    /// `overdraft_limit` overrides the default limit and is only valid for
    /// chequing accounts.
    pub fn create_account(
        &mut self,
        owner_id: impl Into<OwnerId>,
        account_type: AccountType,
        initial_balance: Decimal,
        overdraft_limit: Option<Decimal>,
    ) -> BankResult<AccountNo> {
        if let Some(limit) = overdraft_limit {
            if account_type != AccountType::Chequing {
                return Err(BankError::unsupported(format!(
                    "{account_type} accounts have no overdraft limit"
                )));
            }
            if limit < Decimal::ZERO {
                return Err(BankError::invalid_config(format!(
                    "overdraft limit cannot be negative (got {limit})"
                )));
            }
        }

        let owner_id = owner_id.into();
        let mut account =
            self.factory
                .create(account_type, owner_id, initial_balance, self.clock.now())?;
        if let Some(limit) = overdraft_limit {
            account.set_overdraft_limit(limit)?;
        }

        let number = account.number().clone();
        tracing::info!(
            account = %number,
            owner = %account.owner_id(),
            account_type = %account_type,
            balance = %initial_balance,
            "account created"
        );
        self.accounts.save(account);
        Ok(number)
    }

    /// Remove an account. Only accounts with a zero balance can be deleted.
    pub fn delete_account(&mut self, account_no: &AccountNo) -> BankResult<Account> {
        let balance = self.require(account_no)?.balance();
        if !balance.is_zero() {
            return Err(BankError::NonZeroBalance {
                account: account_no.to_string(),
                balance,
            });
        }
        let account = self.accounts.remove(account_no)?;
        tracing::info!(account = %account_no, "account deleted");
        Ok(account)
    }

    /// Close an account. It stays queryable but rejects further money movement.
    pub fn close_account(&mut self, account_no: &AccountNo) -> BankResult<()> {
        let account = self.require_mut(account_no)?;
        if account.is_closed() {
            return Ok(());
        }
        account.close()?;
        tracing::info!(account = %account_no, "account closed");
        Ok(())
    }

    pub fn set_interest_rate(&mut self, account_no: &AccountNo, rate: Decimal) -> BankResult<()> {
        self.require_mut(account_no)?.set_interest_rate(rate)
    }

    pub fn set_overdraft_limit(
        &mut self,
        account_no: &AccountNo,
        limit: Decimal,
    ) -> BankResult<()> {
        self.require_mut(account_no)?.set_overdraft_limit(limit)
    }

    // ---- money movement ----

    pub fn deposit(&mut self, account_no: &AccountNo, amount: Decimal) -> BankResult<Receipt> {
        self.require(account_no)?;
        let tx = Transaction::deposit(
            account_no.clone(),
            amount,
            self.clock.now(),
            "Deposit via Bank System",
        );
        self.run(tx)
    }

    pub fn withdraw(&mut self, account_no: &AccountNo, amount: Decimal) -> BankResult<Receipt> {
        self.require(account_no)?;
        let tx = Transaction::withdraw(
            account_no.clone(),
            amount,
            self.clock.now(),
            "Withdrawal via Bank System",
        );
        self.run(tx)
    }

    pub fn transfer(
        &mut self,
        from: &AccountNo,
        to: &AccountNo,
        amount: Decimal,
    ) -> BankResult<Receipt> {
        self.require(from)?;
        self.require(to)?;
        let tx = Transaction::transfer(
            from.clone(),
            to.clone(),
            amount,
            self.clock.now(),
            "Transfer via Bank System",
        );
        self.run(tx)
    }

    /// Reverse a transaction previously returned in a [`Receipt`].
    pub fn undo(&mut self, transaction: &mut Transaction) -> BankResult<Receipt> {
        let at = self.clock.now();
        transaction
            .undo(&mut self.accounts, at)
            .inspect_err(|err| {
                tracing::warn!(
                    transaction = %transaction.id().as_str(),
                    error = %err,
                    "undo rejected"
                )
            })?;
        Ok(self.receipt(transaction.clone()))
    }

    // ---- interest ----

    /// Accrue interest on one account up to `now`. Returns whether any was credited.
    pub fn apply_interest(&mut self, account_no: &AccountNo, now: Timestamp) -> BankResult<bool> {
        self.require_mut(account_no)?.apply_interest(now)
    }

    /// Accrue interest on every open account. Returns how many were credited.
    ///
    /// An account whose interest would overflow is logged and left untouched.
    pub fn apply_interest_all(&mut self, now: Timestamp) -> usize {
        let numbers: Vec<AccountNo> = self.accounts.account_numbers().cloned().collect();
        let mut credited = 0;
        for no in &numbers {
            let Some(account) = self.accounts.get_mut(no) else {
                continue;
            };
            if account.is_closed() {
                continue;
            }
            match account.apply_interest(now) {
                Ok(true) => credited += 1,
                Ok(false) => {}
                Err(err) => tracing::warn!(account = %no, error = %err, "interest skipped"),
            }
        }
        tracing::info!(accounts = numbers.len(), credited, "interest run finished");
        credited
    }

    // ---- queries ----

    pub fn balance(&self, account_no: &AccountNo) -> BankResult<Decimal> {
        self.accounts.balance(account_no)
    }

    pub fn accounts_by_owner(&self, owner_id: &OwnerId) -> Vec<AccountNo> {
        self.accounts.find_by_owner(owner_id)
    }

    pub fn transaction_history(&self, account_no: &AccountNo) -> BankResult<&[HistoryEntry]> {
        Ok(self.require(account_no)?.history())
    }

    pub fn account_type(&self, account_no: &AccountNo) -> BankResult<AccountType> {
        Ok(self.require(account_no)?.account_type())
    }

    pub fn owner_id(&self, account_no: &AccountNo) -> BankResult<&OwnerId> {
        Ok(self.require(account_no)?.owner_id())
    }

    pub fn account_exists(&self, account_no: &AccountNo) -> bool {
        self.accounts.exists(account_no)
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.accounts()
    }

    pub fn account_summary(&self, account_no: &AccountNo) -> BankResult<AccountSummary> {
        self.require(account_no).map(AccountSummary::from)
    }

    pub fn account_table(&self) -> AccountTable {
        AccountTable::new(self.accounts.accounts())
    }

    // ---- persistence ----

    pub fn load_from(&mut self, file: &AccountFile) -> Result<usize, PersistenceError> {
        let now = self.clock.now();
        file.load_accounts(&mut self.accounts, &mut self.factory, now)
    }

    pub fn save_to(&self, file: &AccountFile) -> Result<usize, PersistenceError> {
        file.save_accounts(&self.accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bankcore_core::FixedClock;
    use rust_decimal_macros::dec;

    fn start() -> Timestamp {
        Timestamp::from_ymd_hms(2024, 1, 1, 9, 0, 0).unwrap()
    }

    fn bank() -> BankSystem<FixedClock> {
        BankSystem::with_parts(
            AccountRepository::new(),
            AccountFactory::new(),
            FixedClock::new(start()),
        )
    }

    #[test]
    fn create_assigns_sequential_numbers() {
        let mut bank = bank();
        let a = bank
            .create_account("alice", AccountType::Savings, dec!(100), None)
            .unwrap();
        let b = bank
            .create_account("alice", AccountType::Chequing, dec!(0), None)
            .unwrap();
        assert_eq!(a.as_str(), "SAV-001000");
        assert_eq!(b.as_str(), "CHQ-001001");
        assert_eq!(bank.accounts_by_owner(&OwnerId::new("alice")), vec![b, a]);
        assert_eq!(bank.account_count(), 2);
    }

    #[test]
    fn overdraft_override_applies_to_chequing_only() {
        let mut bank = bank();
        let chq = bank
            .create_account("bob", AccountType::Chequing, dec!(0), Some(dec!(50)))
            .unwrap();
        assert_eq!(bank.repository().overdraft_limit(&chq).unwrap(), dec!(50));
        assert!(bank.withdraw(&chq, dec!(51)).is_err());
        assert_eq!(bank.withdraw(&chq, dec!(50)).unwrap().balance_of(&chq), Some(dec!(-50)));

        let err = bank
            .create_account("bob", AccountType::Savings, dec!(0), Some(dec!(10)))
            .unwrap_err();
        assert!(matches!(err, BankError::UnsupportedAccountType(_)));
        let err = bank
            .create_account("bob", AccountType::Chequing, dec!(0), Some(dec!(-1)))
            .unwrap_err();
        assert!(matches!(err, BankError::InvalidConfiguration(_)));
        assert_eq!(bank.factory().sequence().peek(), 1001);
    }

    #[test]
    fn unknown_accounts_are_reported() {
        let mut bank = bank();
        let ghost = AccountNo::new("SAV-999999");
        assert!(matches!(
            bank.deposit(&ghost, dec!(1)),
            Err(BankError::AccountNotFound(_))
        ));
        assert!(bank.balance(&ghost).is_err());
        assert!(bank.transaction_history(&ghost).is_err());
        assert!(!bank.account_exists(&ghost));
    }

    #[test]
    fn transfer_to_missing_account_changes_nothing() {
        let mut bank = bank();
        let a = bank
            .create_account("alice", AccountType::Savings, dec!(100), None)
            .unwrap();
        let err = bank
            .transfer(&a, &AccountNo::new("CHQ-424242"), dec!(10))
            .unwrap_err();
        assert!(matches!(err, BankError::AccountNotFound(_)));
        assert_eq!(bank.balance(&a).unwrap(), dec!(100));
        assert!(bank.transaction_history(&a).unwrap().is_empty());
    }

    #[test]
    fn undo_uses_clock_time_for_reversal_entries() {
        let mut bank = bank();
        let a = bank
            .create_account("alice", AccountType::Savings, dec!(100), None)
            .unwrap();
        let mut receipt = bank.deposit(&a, dec!(25)).unwrap();
        bank.clock().advance_days(1);
        let undone = bank.undo(&mut receipt.transaction).unwrap();
        assert_eq!(undone.balance_of(&a), Some(dec!(100)));

        let history = bank.transaction_history(&a).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[1].reversal);
        assert_eq!(history[1].at, start().plus(chrono::Duration::days(1)));
        assert!(matches!(
            bank.undo(&mut receipt.transaction),
            Err(BankError::NotExecuted(_))
        ));
    }

    #[test]
    fn interest_run_credits_open_savings_only() {
        let mut bank = bank();
        let sav = bank
            .create_account("alice", AccountType::Savings, dec!(3650), None)
            .unwrap();
        let chq = bank
            .create_account("bob", AccountType::Chequing, dec!(3650), None)
            .unwrap();
        let empty = bank
            .create_account("carol", AccountType::Savings, dec!(0), None)
            .unwrap();
        bank.close_account(&empty).unwrap();

        bank.clock().advance_days(10);
        let now = bank.clock().now();
        assert_eq!(bank.apply_interest_all(now), 1);
        // 3650 * 0.02 / 365 * 10
        assert_eq!(bank.balance(&sav).unwrap().round_dp(10), dec!(3652));
        assert_eq!(bank.balance(&chq).unwrap(), dec!(3650));
        assert_eq!(bank.apply_interest_all(now), 0);
    }

    #[test]
    fn interest_run_skips_account_that_would_overflow() {
        let mut bank = bank();
        let full = bank
            .create_account("alice", AccountType::Savings, Decimal::MAX, None)
            .unwrap();
        let sav = bank
            .create_account("bob", AccountType::Savings, dec!(3650), None)
            .unwrap();

        bank.clock().advance_days(10);
        let now = bank.clock().now();
        assert!(matches!(
            bank.apply_interest(&full, now),
            Err(BankError::ArithmeticOverflow(_))
        ));
        assert_eq!(bank.apply_interest_all(now), 1);
        assert_eq!(bank.balance(&full).unwrap(), Decimal::MAX);
        assert_eq!(bank.balance(&sav).unwrap().round_dp(10), dec!(3652));
    }

    #[test]
    fn summary_and_table_reflect_state() {
        let mut bank = bank();
        let a = bank
            .create_account("alice", AccountType::Savings, dec!(10), None)
            .unwrap();
        bank.deposit(&a, dec!(5)).unwrap();
        let summary = bank.account_summary(&a).unwrap();
        assert_eq!(summary.balance, dec!(15));
        assert_eq!(summary.history_entries, 1);
        assert_eq!(bank.account_table().rows().len(), 1);
    }
}
