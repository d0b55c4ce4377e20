use chrono::NaiveDate;
use depenses_core::{Amount, NotificationKind, Source, TransactionCandidate};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ParseOptions;
use crate::util::{parse_iso_date, parse_slash_date, re};

/// Used when a pattern's description group is absent or blank.
pub const PLACEHOLDER_DESCRIPTION: &str = "Transaction";

// ── Patterns ─────────────────────────────────────────────────────────────────
//
// Group 1 is always the amount, group 2 the description, group 3 the date.

re!(
    re_card_dashed,
    r"(?i)(?:CARTE|CARTE\s+\*{4})\s+(?:\d{4}|X{4})\s*[-–]\s*([\d,.]+)\s*(?:EUROS?|EUR|€)\s*[-–]\s*([^-–]+?)\s*[-–]\s*(\d{2}/\d{2}/(?:\d{4}|\d{2}))"
);
re!(
    re_card_payment,
    r"(?i)PAIEMENT\s+(?:CARTE|CB)\s+([\d,.]+)\s*(?:EUROS?|EUR|€)\s+([^-–]+?)\s+(?:LE\s+)?(\d{2}/\d{2}/(?:\d{4}|\d{2}))"
);
re!(
    re_transfer,
    r"(?i)VIREMENT\s+(?:REÇU|RECU|ENVOYÉ|ENVOYE)\s+(?:(?:DE|VERS)\s+)?([\d,.]+)\s*(?:EUROS?|EUR|€)(?:\s*[-–]\s*([^-–\d][^-–]*))?(?:\s*[-–]\s*(\d{2}/\d{2}/(?:\d{4}|\d{2})))?"
);
re!(
    re_direct_debit,
    r"(?i)PR[ÉE]L[ÈE]VEMENT\s+([\d,.]+)\s*(?:EUROS?|EUR|€)\s*[-–]\s*([^-–]+?)\s*[-–]\s*(\d{2}/\d{2}/(?:\d{4}|\d{2}))"
);

const PATTERNS: [(NotificationKind, fn() -> &'static Regex); 4] = [
    (NotificationKind::Card, re_card_dashed),
    (NotificationKind::Card, re_card_payment),
    (NotificationKind::Transfer, re_transfer),
    (NotificationKind::Debit, re_direct_debit),
];

/// One message of a batch, as handed over by a notification transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsMessage {
    pub text: String,
    /// `YYYY-MM-DD`; anything else is ignored.
    #[serde(default)]
    pub date: Option<String>,
}

/// Bank notifications (SMS, e-mail) to at most one transaction candidate.
///
/// Patterns are grouped by transaction kind and tried in a fixed order: card payments, then
/// transfers, then direct debits. The first pattern that matches *and* yields a usable amount
/// and description wins.
#[derive(Debug, Clone, Default)]
pub struct NotificationParser {
    options: ParseOptions,
}

impl NotificationParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Extract a transaction from an SMS. `None` means no transaction was recognized.
    pub fn parse_sms(&self, text: &str, fallback: Option<NaiveDate>) -> Option<TransactionCandidate> {
        self.parse(text, fallback, Source::Sms)
    }

    /// Subject and body are matched as one text.
    pub fn parse_email(
        &self,
        subject: &str,
        body: &str,
        fallback: Option<NaiveDate>,
    ) -> Option<TransactionCandidate> {
        self.parse(&format!("{subject} {body}"), fallback, Source::Email)
    }

    /// Parse every message, keeping detected transactions in input order.
    pub fn parse_batch(&self, messages: &[SmsMessage]) -> Vec<TransactionCandidate> {
        let out: Vec<_> = messages
            .iter()
            .filter_map(|m| {
                let fallback = m.date.as_deref().and_then(parse_iso_date);
                self.parse_sms(&m.text, fallback)
            })
            .collect();
        debug!(messages = messages.len(), detected = out.len(), "parsed notification batch");
        out
    }

    fn parse(&self, text: &str, fallback: Option<NaiveDate>, source: Source) -> Option<TransactionCandidate> {
        let text = text.trim().to_uppercase();
        if text.is_empty() {
            return None;
        }

        for (kind, pattern) in PATTERNS {
            let Some(caps) = pattern().captures(&text) else {
                continue;
            };
            match self.build(&caps, fallback, source) {
                Some(candidate) => return Some(candidate.with_kind(kind)),
                None => debug!(%kind, "pattern matched but capture rejected"),
            }
        }
        None
    }

    fn build(&self, caps: &Captures<'_>, fallback: Option<NaiveDate>, source: Source) -> Option<TransactionCandidate> {
        let amount = Amount::parse(&caps[1])
            .map_err(|e| debug!(error = %e, "notification amount rejected"))
            .ok()?;

        let description = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|d| !d.is_empty())
            .unwrap_or(PLACEHOLDER_DESCRIPTION);

        let date = caps
            .get(3)
            .and_then(|m| parse_slash_date(m.as_str()))
            .or(fallback)
            .unwrap_or_else(|| self.options.today());

        TransactionCandidate::new(description, amount, date, source)
            .map_err(|e| debug!(error = %e, "notification description rejected"))
            .ok()
    }
}
