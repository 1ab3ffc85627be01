use anyhow::Context;
use rust_decimal::Decimal;

use bankcore_accounts::AccountType;
use bankcore_core::{Clock, SystemClock};
use bankcore_system::{AccountFile, BankConfig, BankSystem, PersistenceError};

fn main() -> anyhow::Result<()> {
    let config = BankConfig::from_env();
    bankcore_observability::init(config.log_format);

    let mut bank = BankSystem::with_defaults(config.defaults.clone(), SystemClock)
        .context("invalid account defaults")?;
    let file = AccountFile::new(&config.data_file);

    match bank.load_from(&file) {
        Ok(loaded) => tracing::info!(loaded, "restored accounts"),
        Err(PersistenceError::Missing(path)) => {
            tracing::info!(path = %path.display(), "no accounts file yet; starting empty");
            if config.seed_demo {
                seed_demo(&mut bank)?;
            }
        }
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to load {}", file.path().display()));
        }
    }

    let report = bank
        .account_table()
        .render(config.report_format)
        .context("failed to render account report")?;
    println!("{report}");

    bank.save_to(&file)
        .with_context(|| format!("failed to save {}", file.path().display()))?;
    Ok(())
}

fn seed_demo<C: Clock>(bank: &mut BankSystem<C>) -> anyhow::Result<()> {
    let demo = [
        ("demo_user", AccountType::Savings, Decimal::new(1000, 0)),
        ("demo_user", AccountType::Chequing, Decimal::new(500, 0)),
        ("alice", AccountType::Savings, Decimal::new(2000, 0)),
        ("bob", AccountType::Chequing, Decimal::new(1500, 0)),
    ];
    for (owner, account_type, balance) in demo {
        bank.create_account(owner, account_type, balance, None)
            .with_context(|| format!("failed to seed {account_type} account for {owner}"))?;
    }
    tracing::info!(accounts = bank.account_count(), "seeded demo accounts");
    Ok(())
}
