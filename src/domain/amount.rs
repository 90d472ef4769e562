use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Currency amounts carry two decimal places.
pub const CURRENCY_SCALE: u32 = 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("amount is not a valid number")]
    NotANumber,
    #[error("amount is below the minimum of {0}")]
    BelowMinimum(Decimal),
    #[error("amount is above the maximum of {0}")]
    AboveMaximum(Decimal),
    #[error("amount exceeds the available balance of {0}")]
    ExceedsBalance(Decimal),
}

/// Minimum and optional maximum accepted for one transaction kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountLimits {
    pub minimum: Decimal,
    #[serde(default)]
    pub maximum: Option<Decimal>,
}

impl AmountLimits {
    pub fn new(minimum: Decimal, maximum: Option<Decimal>) -> Self {
        Self { minimum, maximum }
    }

    /// Validates `text` against these limits and the given balance.
    pub fn check(&self, text: &str, balance: Decimal) -> Result<Decimal, AmountError> {
        AmountValidator::validate(text, balance, self.minimum, self.maximum)
    }
}

impl Default for AmountLimits {
    fn default() -> Self {
        Self {
            minimum: Decimal::ZERO,
            maximum: None,
        }
    }
}

/// Validates user-entered amounts before any network call is made.
///
/// The balance check is advisory: it keeps the user from submitting an amount
/// that will obviously fail, but the remote service re-checks during quoting
/// and authorization and its answer wins.
pub struct AmountValidator;

impl AmountValidator {
    /// Parses and range-checks an amount.
    ///
    /// Checks run in a fixed order: format, minimum, maximum, balance. A zero
    /// amount is always below the minimum.
    pub fn validate(
        text: &str,
        balance: Decimal,
        minimum: Decimal,
        maximum: Option<Decimal>,
    ) -> Result<Decimal, AmountError> {
        let amount = Self::parse(text)?;

        if amount <= Decimal::ZERO || amount < minimum {
            return Err(AmountError::BelowMinimum(minimum));
        }
        if let Some(maximum) = maximum
            && amount > maximum
        {
            return Err(AmountError::AboveMaximum(maximum));
        }
        if amount > balance {
            return Err(AmountError::ExceedsBalance(balance));
        }

        Ok(amount)
    }

    /// Parses a plain decimal string into a two-decimal amount.
    ///
    /// Accepts digits with an optional single decimal point and up to two
    /// fraction digits. The whole part may use commas as thousands
    /// separators (`1,250,000`). Signs, exponents, and named values such as
    /// `NaN` are rejected.
    pub fn parse(text: &str) -> Result<Decimal, AmountError> {
        let text = text.trim();
        let (grouped, fraction) = text.split_once('.').unwrap_or((text, ""));
        let whole = Self::ungroup(grouped)?;
        let whole = whole.as_str();

        if whole.is_empty() && fraction.is_empty() {
            return Err(AmountError::NotANumber);
        }
        if !whole.chars().all(|c| c.is_ascii_digit())
            || !fraction.chars().all(|c| c.is_ascii_digit())
            || fraction.len() > CURRENCY_SCALE as usize
        {
            return Err(AmountError::NotANumber);
        }

        let whole = if whole.is_empty() { "0" } else { whole };
        let normalized = format!("{whole}.{fraction:0<width$}", width = CURRENCY_SCALE as usize);
        let mut amount = Decimal::from_str(&normalized).map_err(|_| AmountError::NotANumber)?;
        amount.rescale(CURRENCY_SCALE);
        Ok(amount)
    }

    /// Strips thousands separators. Every group after the first must have
    /// exactly three digits.
    fn ungroup(whole: &str) -> Result<String, AmountError> {
        let mut groups = whole.split(',');
        let first = groups.next().unwrap_or_default();
        if whole.contains(',') && !(1..=3).contains(&first.len()) {
            return Err(AmountError::NotANumber);
        }

        let mut digits = first.to_string();
        for group in groups {
            if group.len() != 3 {
                return Err(AmountError::NotANumber);
            }
            digits.push_str(group);
        }
        Ok(digits)
    }
}
