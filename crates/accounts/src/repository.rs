//! Keyed account storage.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use bankcore_core::{AccountNo, BankError, BankResult, Entity, OwnerId};

use crate::account::Account;

/// Mutable access to accounts by number.
///
/// Transactions execute against this seam rather than a concrete repository.
pub trait AccountStore {
    fn account(&self, account_no: &AccountNo) -> BankResult<&Account>;

    fn account_mut(&mut self, account_no: &AccountNo) -> BankResult<&mut Account>;

    /// Borrow two distinct accounts mutably, in the order requested.
    fn account_pair_mut(
        &mut self,
        first: &AccountNo,
        second: &AccountNo,
    ) -> BankResult<(&mut Account, &mut Account)>;
}

/// In-memory account repository.
///
/// Owns its accounts: removing or clearing drops them. Ordered by account
/// number so listings are stable. Policy checks such as "only empty accounts
/// may be deleted" live in the facade, not here.
#[derive(Debug, Default, Clone)]
pub struct AccountRepository {
    accounts: BTreeMap<AccountNo, Account>,
}

impl AccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns `true` when the account number was new.
    pub fn save(&mut self, account: Account) -> bool {
        let key = account.id().clone();
        let inserted = self.accounts.insert(key.clone(), account).is_none();
        if inserted {
            tracing::debug!(account = %key, "added new account");
        } else {
            tracing::debug!(account = %key, "updated existing account");
        }
        inserted
    }

    pub fn remove(&mut self, account_no: &AccountNo) -> BankResult<Account> {
        let removed = self
            .accounts
            .remove(account_no)
            .ok_or_else(|| BankError::not_found(account_no.as_str()))?;
        tracing::debug!(account = %account_no, "removed account");
        Ok(removed)
    }

    pub fn get(&self, account_no: &AccountNo) -> Option<&Account> {
        self.accounts.get(account_no)
    }

    pub fn get_mut(&mut self, account_no: &AccountNo) -> Option<&mut Account> {
        self.accounts.get_mut(account_no)
    }

    pub fn exists(&self, account_no: &AccountNo) -> bool {
        self.accounts.contains_key(account_no)
    }

    /// Reverse lookup by owner (linear scan).
    pub fn find_by_owner(&self, owner_id: &OwnerId) -> Vec<AccountNo> {
        self.accounts
            .iter()
            .filter(|(_, acct)| acct.owner_id() == owner_id)
            .map(|(no, _)| no.clone())
            .collect()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn account_numbers(&self) -> impl Iterator<Item = &AccountNo> {
        self.accounts.keys()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn clear(&mut self) {
        self.accounts.clear();
    }

    pub fn balance(&self, account_no: &AccountNo) -> BankResult<Decimal> {
        Ok(self.account(account_no)?.balance())
    }

    /// Overdraft limit, or zero for account types without overdraft.
    pub fn overdraft_limit(&self, account_no: &AccountNo) -> BankResult<Decimal> {
        Ok(self
            .account(account_no)?
            .overdraft_limit()
            .unwrap_or(Decimal::ZERO))
    }

    /// Minimum balance requirement. No current account type has one.
    pub fn min_balance(&self, account_no: &AccountNo) -> BankResult<Decimal> {
        self.account(account_no)?;
        Ok(Decimal::ZERO)
    }
}

impl AccountStore for AccountRepository {
    fn account(&self, account_no: &AccountNo) -> BankResult<&Account> {
        self.accounts
            .get(account_no)
            .ok_or_else(|| BankError::not_found(account_no.as_str()))
    }

    fn account_mut(&mut self, account_no: &AccountNo) -> BankResult<&mut Account> {
        self.accounts
            .get_mut(account_no)
            .ok_or_else(|| BankError::not_found(account_no.as_str()))
    }

    fn account_pair_mut(
        &mut self,
        first: &AccountNo,
        second: &AccountNo,
    ) -> BankResult<(&mut Account, &mut Account)> {
        if first == second {
            return Err(BankError::SameAccountTransfer(first.to_string()));
        }
        let (low, high) = if first < second {
            (first, second)
        } else {
            (second, first)
        };

        // The inclusive range starts at `low` and ends at `high` exactly when
        // both keys exist.
        let mut range = self.accounts.range_mut::<AccountNo, _>(low..=high);
        let low_account = match range.next() {
            Some((key, acct)) if key == low => acct,
            _ => return Err(BankError::not_found(low.as_str())),
        };
        let high_account = match range.next_back() {
            Some((key, acct)) if key == high => acct,
            _ => return Err(BankError::not_found(high.as_str())),
        };

        if first == low {
            Ok((low_account, high_account))
        } else {
            Ok((high_account, low_account))
        }
    }
}
