//! Line-oriented account file (`ACCOUNTS_V1`).
//!
//! ```text
//! ACCOUNTS_V1
//! <count>
//! <Type>|<AccountNo>|<OwnerId>|<Balance>
//! ```
//!
//! Only the account snapshot is stored; history and transactions are not.

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use bankcore_accounts::{Account, AccountFactory, AccountRepository, AccountType};
use bankcore_core::{AccountNo, BankError, OwnerId, Timestamp};

pub const ACCOUNTS_HEADER: &str = "ACCOUNTS_V1";
const FIELD_SEPARATOR: char = '|';

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// No file at the configured path. Callers usually start empty.
    #[error("accounts file not found: {0}")]
    Missing(PathBuf),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed accounts file at line {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error(transparent)]
    Bank(#[from] BankError),
}

impl PersistenceError {
    fn format(line: usize, reason: impl Into<String>) -> Self {
        Self::Format {
            line,
            reason: reason.into(),
        }
    }
}

/// Replace characters that would break the record layout.
pub fn sanitize_field(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            FIELD_SEPARATOR | '\n' | '\r' => '_',
            other => other,
        })
        .collect()
}

/// Render accounts in file order.
pub fn encode_accounts<'a, I>(accounts: I) -> String
where
    I: IntoIterator<Item = &'a Account>,
{
    let records: Vec<String> = accounts
        .into_iter()
        .map(|account| {
            format!(
                "{}|{}|{}|{}",
                account.account_type(),
                sanitize_field(account.number().as_str()),
                sanitize_field(account.owner_id().as_str()),
                account.balance()
            )
        })
        .collect();

    let mut out = format!("{ACCOUNTS_HEADER}\n{}\n", records.len());
    for record in records {
        out.push_str(&record);
        out.push('\n');
    }
    out
}

/// Parse file contents into accounts built by `factory`.
///
/// Records of types the factory cannot build are skipped.
pub fn decode_accounts(
    input: &str,
    factory: &AccountFactory,
    now: Timestamp,
) -> Result<Vec<Account>, PersistenceError> {
    let mut lines = input.lines().enumerate().map(|(i, l)| (i + 1, l));

    match lines.next() {
        Some((_, header)) if header.trim() == ACCOUNTS_HEADER => {}
        Some((line, other)) => {
            return Err(PersistenceError::format(
                line,
                format!("expected header {ACCOUNTS_HEADER}, found {other:?}"),
            ));
        }
        None => return Err(PersistenceError::format(1, "empty file")),
    }

    let (count_line, raw_count) = lines
        .next()
        .ok_or_else(|| PersistenceError::format(2, "missing account count"))?;
    let count: usize = raw_count
        .trim()
        .parse()
        .map_err(|_| PersistenceError::format(count_line, format!("invalid count {raw_count:?}")))?;

    let mut accounts = Vec::new();
    for index in 0..count {
        let (line, record) = lines.next().ok_or_else(|| {
            PersistenceError::format(
                count_line + index + 1,
                format!("expected {count} records, found {index}"),
            )
        })?;
        if let Some(account) = decode_record(line, record, factory, now)? {
            accounts.push(account);
        }
    }
    Ok(accounts)
}

fn decode_record(
    line: usize,
    record: &str,
    factory: &AccountFactory,
    now: Timestamp,
) -> Result<Option<Account>, PersistenceError> {
    let fields: Vec<&str> = record.split(FIELD_SEPARATOR).collect();
    let [kind, number, owner, balance] = fields.as_slice() else {
        return Err(PersistenceError::format(
            line,
            format!("expected 4 fields, found {}", fields.len()),
        ));
    };

    let balance = Decimal::from_str(balance.trim())
        .map_err(|e| PersistenceError::format(line, format!("invalid balance {balance:?}: {e}")))?;
    let number = AccountNo::from_str(number)
        .map_err(|e| PersistenceError::format(line, e.to_string()))?;
    // Owners are stored verbatim, blank or padded ones included.
    let owner = OwnerId::new(*owner);

    let restored = AccountType::from_str(kind)
        .and_then(|account_type| factory.restore(account_type, number.clone(), owner, balance, now));
    match restored {
        Ok(account) => Ok(Some(account)),
        Err(BankError::UnsupportedAccountType(kind)) => {
            tracing::warn!(line, account = %number, kind = %kind, "skipping account of unsupported type");
            Ok(None)
        }
        Err(err) => Err(PersistenceError::format(line, err.to_string())),
    }
}

/// File-backed account snapshot.
#[derive(Debug, Clone)]
pub struct AccountFile {
    path: PathBuf,
}

impl AccountFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn io_error(&self, source: io::Error) -> PersistenceError {
        PersistenceError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Write every account in `repo`. Returns the number written.
    pub fn save_accounts(&self, repo: &AccountRepository) -> Result<usize, PersistenceError> {
        let contents = encode_accounts(repo.accounts());
        std::fs::write(&self.path, contents).map_err(|e| self.io_error(e))?;
        tracing::info!(path = %self.path.display(), accounts = repo.len(), "accounts saved");
        Ok(repo.len())
    }

    /// Load accounts into `repo` and move the factory counter past them.
    ///
    /// The file is parsed completely before `repo` is touched. Loaded accounts
    /// replace existing ones with the same number. Returns the number loaded.
    pub fn load_accounts(
        &self,
        repo: &mut AccountRepository,
        factory: &mut AccountFactory,
        now: Timestamp,
    ) -> Result<usize, PersistenceError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(PersistenceError::Missing(self.path.clone()));
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let accounts = decode_accounts(&contents, factory, now)?;
        let loaded = accounts.len();
        for account in accounts {
            repo.save(account);
        }
        let next = factory.update_counter_from_loaded_accounts(repo);
        tracing::info!(
            path = %self.path.display(),
            accounts = loaded,
            next_number = next,
            "accounts loaded"
        );
        Ok(loaded)
    }
}
