pub mod config;
pub mod notification;
pub mod rules;
pub mod statement;
pub mod table;
pub(crate) mod util;

pub use config::{ConfigError, ImportConfig, ParseOptions};
pub use notification::{NotificationParser, SmsMessage, PLACEHOLDER_DESCRIPTION};
pub use rules::{CategoryEngine, MatchKind, Resolution};
pub use statement::{infer_year, Candidates, StatementParser};
pub use table::{CategoryEntry, CategorySpec, CategoryTable, CategoryTableSpec, SpecialCaseSpec};

use chrono::NaiveDate;
use depenses_core::{Category, TransactionCandidate};

/// Categorize with the built-in table.
pub fn categorize(description: &str) -> Category {
    CategoryEngine::default().categorize(description)
}

/// Parse statement text with default options.
pub fn parse_statement(text: &str) -> Vec<TransactionCandidate> {
    StatementParser::default().parse(text)
}

pub fn parse_sms(text: &str, fallback: Option<NaiveDate>) -> Option<TransactionCandidate> {
    NotificationParser::default().parse_sms(text, fallback)
}

pub fn parse_email(subject: &str, body: &str, fallback: Option<NaiveDate>) -> Option<TransactionCandidate> {
    NotificationParser::default().parse_email(subject, body, fallback)
}
