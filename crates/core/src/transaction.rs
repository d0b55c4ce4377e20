use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::category::Category;
use super::money::Amount;

/// Shortest description a candidate may carry, in characters.
pub const MIN_DESCRIPTION_CHARS: usize = 3;

/// Number of leading description characters that take part in duplicate detection.
pub const DEDUP_PREFIX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CandidateError {
    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),
    #[error("Amount {0} is not above the 0.01 floor")]
    AmountTooSmall(Decimal),
    #[error("Description too short: '{0}'")]
    DescriptionTooShort(String),
}

/// Where a candidate was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Statement,
    Sms,
    Email,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Statement => write!(f, "statement"),
            Source::Sms => write!(f, "sms"),
            Source::Email => write!(f, "email"),
        }
    }
}

impl std::str::FromStr for Source {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "statement" => Ok(Source::Statement),
            "sms" => Ok(Source::Sms),
            "email" => Ok(Source::Email),
            other => Err(format!("Unknown source: '{other}'")),
        }
    }
}

/// Which notification pattern group produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Card,
    Transfer,
    Debit,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::Card => write!(f, "card"),
            NotificationKind::Transfer => write!(f, "transfer"),
            NotificationKind::Debit => write!(f, "debit"),
        }
    }
}

/// A parsed, not-yet-persisted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionCandidate {
    pub description: String,
    pub amount: Amount,
    /// Serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// `None` until the categorizer has run.
    pub category: Option<Category>,
    pub source: Source,
    /// Set for notification candidates only.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<NotificationKind>,
}

/// Composite identity used to drop OCR repeats.
pub type DedupKey = (String, Amount, NaiveDate);

impl TransactionCandidate {
    pub fn new(
        description: &str,
        amount: Amount,
        date: NaiveDate,
        source: Source,
    ) -> Result<Self, CandidateError> {
        let description = collapse_whitespace(description);
        if description.chars().count() < MIN_DESCRIPTION_CHARS {
            return Err(CandidateError::DescriptionTooShort(description));
        }
        Ok(TransactionCandidate {
            description,
            amount,
            date,
            category: None,
            source,
            kind: None,
        })
    }

    pub fn with_kind(mut self, kind: NotificationKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn dedup_key(&self) -> DedupKey {
        self.dedup_key_with_prefix(DEDUP_PREFIX_CHARS)
    }

    pub fn dedup_key_with_prefix(&self, prefix_chars: usize) -> DedupKey {
        (
            self.description.chars().take(prefix_chars).collect(),
            self.amount,
            self.date,
        )
    }

    /// The ISO `YYYY-MM-DD` rendering handed to persistence.
    pub fn date_string(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Trim and collapse every run of whitespace to a single space.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
