use bankcore_accounts::{AccountDefaults, AccountFactory, AccountRepository, AccountType, EntryKind};
use bankcore_core::{AccountNo, BankError, FixedClock, OwnerId, Timestamp};
use bankcore_system::{AccountFile, BankSystem, PersistenceError};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn start() -> Timestamp {
    Timestamp::from_ymd_hms(2024, 6, 1, 10, 0, 0).unwrap()
}

fn bank_with_rate(rate: Decimal) -> BankSystem<FixedClock> {
    let defaults = AccountDefaults {
        savings_interest_rate: rate,
        ..AccountDefaults::default()
    };
    BankSystem::with_defaults(defaults, FixedClock::new(start())).unwrap()
}

#[test]
fn savings_and_chequing_walkthrough() {
    let mut bank = bank_with_rate(dec!(0.05));
    let sav = bank
        .create_account("alice", AccountType::Savings, dec!(1000), None)
        .unwrap();
    let chq = bank
        .create_account("alice", AccountType::Chequing, dec!(0), None)
        .unwrap();

    bank.deposit(&sav, dec!(500)).unwrap();
    assert_eq!(bank.balance(&sav).unwrap(), dec!(1500));

    bank.withdraw(&sav, dec!(200)).unwrap();
    assert_eq!(bank.balance(&sav).unwrap(), dec!(1300));

    let err = bank.withdraw(&sav, dec!(5000)).unwrap_err();
    assert!(matches!(err, BankError::InsufficientFunds { .. }));
    assert_eq!(bank.balance(&sav).unwrap(), dec!(1300));

    let mut transfer = bank.transfer(&sav, &chq, dec!(300)).unwrap();
    assert_eq!(transfer.balance_of(&sav), Some(dec!(1000)));
    assert_eq!(transfer.balance_of(&chq), Some(dec!(300)));

    let undone = bank.undo(&mut transfer.transaction).unwrap();
    assert_eq!(undone.balance_of(&sav), Some(dec!(1300)));
    assert_eq!(undone.balance_of(&chq), Some(dec!(0)));

    let kinds: Vec<(EntryKind, bool)> = bank
        .transaction_history(&sav)
        .unwrap()
        .iter()
        .map(|e| (e.kind, e.reversal))
        .collect();
    assert_eq!(
        kinds,
        vec![
            (EntryKind::Deposit, false),
            (EntryKind::Withdrawal, false),
            (EntryKind::TransferOut, false),
            (EntryKind::TransferOut, true),
        ]
    );
}

#[test]
fn chequing_overdraft_boundary() {
    let mut bank = bank_with_rate(dec!(0.02));
    let chq = bank
        .create_account("bob", AccountType::Chequing, dec!(100), None)
        .unwrap();

    bank.withdraw(&chq, dec!(600)).unwrap();
    assert_eq!(bank.balance(&chq).unwrap(), dec!(-500));

    let err = bank.withdraw(&chq, dec!(0.01)).unwrap_err();
    assert_eq!(
        err,
        BankError::InsufficientFunds {
            account: chq.to_string(),
            requested: dec!(0.01),
            available: dec!(0),
        }
    );
}

#[test]
fn delete_and_close_require_zero_balance() {
    let mut bank = bank_with_rate(dec!(0.02));
    let a = bank
        .create_account("carol", AccountType::Savings, dec!(40), None)
        .unwrap();
    let b = bank
        .create_account("carol", AccountType::Chequing, dec!(0), None)
        .unwrap();

    assert!(matches!(
        bank.delete_account(&a),
        Err(BankError::NonZeroBalance { .. })
    ));
    assert!(matches!(
        bank.close_account(&a),
        Err(BankError::NonZeroBalance { .. })
    ));

    bank.transfer(&a, &b, dec!(40)).unwrap();
    bank.close_account(&a).unwrap();
    bank.close_account(&a).unwrap();
    assert!(bank.account_summary(&a).unwrap().closed);
    assert!(matches!(
        bank.deposit(&a, dec!(1)),
        Err(BankError::AccountClosed(_))
    ));
    assert!(matches!(
        bank.transfer(&b, &a, dec!(1)),
        Err(BankError::AccountClosed(_))
    ));
    assert_eq!(bank.balance(&b).unwrap(), dec!(40));

    let removed = bank.delete_account(&a).unwrap();
    assert_eq!(removed.number(), &a);
    assert!(!bank.account_exists(&a));
    assert_eq!(bank.accounts_by_owner(&OwnerId::new("carol")), vec![b]);
}

#[test]
fn overflowing_deposit_is_rejected_and_leaves_balance() {
    let mut bank = bank_with_rate(dec!(0.02));
    let a = bank
        .create_account("frank", AccountType::Chequing, Decimal::MAX, None)
        .unwrap();

    let err = bank.deposit(&a, dec!(1)).unwrap_err();
    assert!(matches!(err, BankError::ArithmeticOverflow(_)));
    assert_eq!(bank.balance(&a).unwrap(), Decimal::MAX);
    assert!(bank.transaction_history(&a).unwrap().is_empty());
}

#[test]
fn double_execute_is_rejected_without_side_effects() {
    let mut bank = bank_with_rate(dec!(0.02));
    let a = bank
        .create_account("dave", AccountType::Savings, dec!(10), None)
        .unwrap();
    let mut receipt = bank.deposit(&a, dec!(5)).unwrap();

    let mut repo = bank.repository().clone();
    let err = receipt.transaction.execute(&mut repo).unwrap_err();
    assert!(matches!(err, BankError::AlreadyExecuted(_)));
    assert_eq!(repo.balance(&a).unwrap(), dec!(15));
}

#[test]
fn persistence_round_trip_reseeds_numbering() {
    let dir = tempfile::tempdir().unwrap();
    let file = AccountFile::new(dir.path().join("accounts.dat"));

    let mut bank = bank_with_rate(dec!(0.02));
    let sav = bank
        .create_account("alice", AccountType::Savings, dec!(2000), None)
        .unwrap();
    let chq = bank
        .create_account("bob", AccountType::Chequing, dec!(1500), None)
        .unwrap();
    bank.withdraw(&chq, dec!(1600)).unwrap();
    assert_eq!(bank.save_to(&file).unwrap(), 2);

    let mut restored = bank_with_rate(dec!(0.02));
    assert_eq!(restored.load_from(&file).unwrap(), 2);
    assert_eq!(restored.balance(&sav).unwrap(), dec!(2000));
    assert_eq!(restored.balance(&chq).unwrap(), dec!(-100));
    assert_eq!(restored.account_type(&chq).unwrap(), AccountType::Chequing);
    assert_eq!(restored.owner_id(&sav).unwrap().as_str(), "alice");
    assert!(restored.transaction_history(&sav).unwrap().is_empty());

    let next = restored
        .create_account("erin", AccountType::Savings, dec!(0), None)
        .unwrap();
    assert_eq!(next, AccountNo::new("SAV-001002"));
}

#[test]
fn loading_missing_file_leaves_bank_empty() {
    let dir = tempfile::tempdir().unwrap();
    let file = AccountFile::new(dir.path().join("absent.dat"));
    let mut bank = bank_with_rate(dec!(0.02));
    assert!(matches!(
        bank.load_from(&file),
        Err(PersistenceError::Missing(_))
    ));
    assert_eq!(bank.account_count(), 0);
}

#[test]
fn hand_edited_file_is_reseeded_past_highest_number() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accounts.dat");
    std::fs::write(
        &path,
        "ACCOUNTS_V1\n2\nSavings|SAV-004711|alice|10\nChequing|CHQ-000003|bob|0\n",
    )
    .unwrap();

    let mut repo = AccountRepository::new();
    let mut factory = AccountFactory::new();
    AccountFile::new(&path)
        .load_accounts(&mut repo, &mut factory, start())
        .unwrap();
    assert_eq!(factory.sequence().peek(), 4712);
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        ..ProptestConfig::default()
    })]

    /// Property: a random sequence of facade operations never leaves an
    /// account below its floor, and undoing every receipt in reverse order
    /// restores the opening balances.
    #[test]
    fn random_operations_respect_floor_and_undo_cleanly(
        ops in prop::collection::vec((0u8..3, 0usize..3, 0usize..3, 1i64..100_000i64), 1..40),
    ) {
        let mut bank = bank_with_rate(dec!(0.02));
        let accounts = [
            bank.create_account("p", AccountType::Savings, dec!(500), None).unwrap(),
            bank.create_account("p", AccountType::Chequing, dec!(200), None).unwrap(),
            bank.create_account("q", AccountType::Chequing, dec!(0), Some(dec!(100))).unwrap(),
        ];
        let opening: Vec<Decimal> = accounts.iter().map(|a| bank.balance(a).unwrap()).collect();

        let mut receipts = Vec::new();
        for (op, i, j, cents) in ops {
            let amount = Decimal::new(cents, 2);
            let result = match op {
                0 => bank.deposit(&accounts[i], amount),
                1 => bank.withdraw(&accounts[i], amount),
                _ => bank.transfer(&accounts[i], &accounts[j], amount),
            };
            if let Ok(receipt) = result {
                receipts.push(receipt);
            }
            for no in &accounts {
                let floor = -bank.repository().overdraft_limit(no).unwrap();
                prop_assert!(bank.balance(no).unwrap() >= floor);
            }
        }

        for receipt in receipts.iter_mut().rev() {
            prop_assert!(bank.undo(&mut receipt.transaction).is_ok());
        }
        let closing: Vec<Decimal> = accounts.iter().map(|a| bank.balance(a).unwrap()).collect();
        prop_assert_eq!(opening, closing);
    }
}
