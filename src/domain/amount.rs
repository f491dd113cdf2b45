use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// Largest amount accepted for a single payment, in XLM.
pub const MAX_SINGLE_PAYMENT: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);
/// Smallest amount accepted for a single payment: one stroop.
pub const MIN_SINGLE_PAYMENT: Decimal = Decimal::from_parts(1, 0, 0, false, 7);
/// Number of stroops in one XLM.
pub const STROOPS_PER_UNIT: i64 = 10_000_000;

static AMOUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:0|[1-9]\d*)(?:\.\d{1,7})?$").expect("amount pattern is a valid regex")
});

/// Returns true iff `s` is an acceptable payment amount.
///
/// Validity depends on the string alone: the pattern forbids signs, blanks,
/// separators, leading zeros and more than seven fractional digits, and the
/// parsed value must lie within `[MIN_SINGLE_PAYMENT, MAX_SINGLE_PAYMENT]`.
pub fn is_valid_amount(s: &str) -> bool {
    Amount::parse(s).is_some()
}

/// A validated payment amount.
///
/// Keeps the text the user typed so history and envelopes carry exactly
/// what was entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount {
    value: Decimal,
    text: String,
}

impl Amount {
    pub fn parse(s: &str) -> Option<Self> {
        if !AMOUNT_PATTERN.is_match(s) {
            return None;
        }
        let value = Decimal::from_str(s).ok()?;
        if value <= Decimal::ZERO || value < MIN_SINGLE_PAYMENT || value > MAX_SINGLE_PAYMENT {
            return None;
        }
        Some(Self {
            value,
            text: s.to_string(),
        })
    }

    pub fn value(&self) -> Decimal {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The amount in stroops, as carried by a payment operation.
    pub fn to_stroops(&self) -> i64 {
        (self.value * Decimal::from(STROOPS_PER_UNIT))
            .trunc()
            .to_i64()
            .unwrap_or_default()
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl TryFrom<String> for Amount {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Amount::parse(&value).ok_or_else(|| format!("invalid amount: {value}"))
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        amount.text
    }
}

/// A native-asset balance in XLM.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(pub Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
