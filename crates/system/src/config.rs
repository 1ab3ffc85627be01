//! Environment-driven configuration.
//!
//! Every setting has a default; invalid values are logged and ignored.

use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;

use bankcore_accounts::AccountDefaults;
use bankcore_observability::LogFormat;

use crate::report::ReportFormat;

pub const DATA_FILE_VAR: &str = "BANKCORE_DATA_FILE";
pub const SAVINGS_RATE_VAR: &str = "BANKCORE_SAVINGS_RATE";
pub const OVERDRAFT_LIMIT_VAR: &str = "BANKCORE_OVERDRAFT_LIMIT";
pub const SEED_DEMO_VAR: &str = "BANKCORE_SEED_DEMO";
pub const LOG_FORMAT_VAR: &str = "BANKCORE_LOG_FORMAT";
pub const REPORT_FORMAT_VAR: &str = "BANKCORE_REPORT_FORMAT";

const DEFAULT_DATA_FILE: &str = "accounts.dat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankConfig {
    /// Where accounts are loaded from and saved to.
    pub data_file: PathBuf,
    pub defaults: AccountDefaults,
    /// Create demo accounts when no data file exists yet.
    pub seed_demo: bool,
    pub log_format: LogFormat,
    pub report_format: ReportFormat,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            defaults: AccountDefaults::default(),
            seed_demo: true,
            log_format: LogFormat::Pretty,
            report_format: ReportFormat::Text,
        }
    }
}

impl BankConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map instead of the
    /// process environment).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup(DATA_FILE_VAR).filter(|p| !p.trim().is_empty()) {
            config.data_file = PathBuf::from(path.trim());
        }

        if let Some(rate) = parse_non_negative(&lookup, SAVINGS_RATE_VAR) {
            config.defaults.savings_interest_rate = rate;
        }
        if let Some(limit) = parse_non_negative(&lookup, OVERDRAFT_LIMIT_VAR) {
            config.defaults.chequing_overdraft_limit = limit;
        }

        if let Some(raw) = lookup(SEED_DEMO_VAR) {
            match parse_flag(&raw) {
                Some(flag) => config.seed_demo = flag,
                None => tracing::warn!(
                    var = SEED_DEMO_VAR,
                    value = %raw,
                    "invalid boolean; keeping default"
                ),
            }
        }

        if let Some(raw) = lookup(LOG_FORMAT_VAR) {
            config.log_format = LogFormat::parse(&raw);
        }
        if let Some(raw) = lookup(REPORT_FORMAT_VAR) {
            config.report_format = ReportFormat::parse(&raw);
        }

        config
    }
}

fn parse_non_negative<F>(lookup: &F, var: &'static str) -> Option<Decimal>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(var)?;
    match Decimal::from_str(raw.trim()) {
        Ok(value) if value >= Decimal::ZERO => Some(value),
        Ok(value) => {
            tracing::warn!(var, %value, "negative value not allowed; keeping default");
            None
        }
        Err(err) => {
            tracing::warn!(var, value = %raw, error = %err, "invalid decimal; keeping default");
            None
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
