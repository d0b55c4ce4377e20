use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::transaction::CandidateError;

/// A strictly positive transaction amount, kept at two decimal places.
///
/// Values at or below one cent are noise in OCR output (stray `0,01` fragments, checkbox
/// glyphs read as digits) and cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// The exclusive lower bound: an amount must be strictly greater than this.
    pub fn floor() -> Decimal {
        Decimal::new(1, 2)
    }

    pub fn new(value: Decimal) -> Result<Self, CandidateError> {
        let value = value.round_dp(2);
        if value <= Self::floor() {
            return Err(CandidateError::AmountTooSmall(value));
        }
        Ok(Amount(value))
    }

    /// Parse a bank-formatted numeral: `1 923,60`, `12,34`, `12.34`.
    ///
    /// Spaces (including non-breaking ones used as thousands separators) are dropped and a
    /// decimal comma becomes a point.
    pub fn parse(raw: &str) -> Result<Self, CandidateError> {
        let clean: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        let value = Decimal::from_str(&clean)
            .map_err(|_| CandidateError::InvalidAmount(raw.to_string()))?;
        Self::new(value)
    }

    pub fn from_cents(cents: i64) -> Result<Self, CandidateError> {
        Self::new(Decimal::new(cents, 2))
    }

    pub fn to_cents(self) -> Option<i64> {
        (self.0 * Decimal::from(100)).round().to_i64()
    }

    pub fn value(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = CandidateError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}
