//! Strongly-typed identifiers used across the ledger.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::BankError;

/// Account number, e.g. `SAV-001000`.
///
/// Assigned by the account factory and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNo(String);

/// Identifier of the user owning an account.
///
/// Supplied by the auth layer; the ledger never checks it against a user store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl FromStr for $t {
            type Err = BankError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(BankError::invalid_config(format!("{}: empty value", $name)));
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

impl_string_newtype!(AccountNo, "AccountNo");
impl_string_newtype!(OwnerId, "OwnerId");

impl AccountNo {
    /// Numeric value of the trailing digit run (`"CHQ-001042"` → `1042`).
    ///
    /// Returns `None` when the number does not end in digits or the digits overflow.
    pub fn numeric_suffix(&self) -> Option<u64> {
        let digits_start = self
            .0
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(idx, _)| idx)?;
        self.0[digits_start..].parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_suffix_reads_trailing_digits() {
        assert_eq!(AccountNo::new("SAV-001042").numeric_suffix(), Some(1042));
        assert_eq!(AccountNo::new("TFSA-7").numeric_suffix(), Some(7));
        assert_eq!(AccountNo::new("12345").numeric_suffix(), Some(12345));
    }

    #[test]
    fn numeric_suffix_is_none_without_trailing_digits() {
        assert_eq!(AccountNo::new("SAV-").numeric_suffix(), None);
        assert_eq!(AccountNo::new("legacy").numeric_suffix(), None);
        assert_eq!(AccountNo::new("").numeric_suffix(), None);
    }

    #[test]
    fn parsing_rejects_blank_identifiers() {
        assert!("   ".parse::<OwnerId>().is_err());
        assert_eq!("alice".parse::<OwnerId>().unwrap().as_str(), "alice");
    }
}
