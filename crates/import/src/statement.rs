use std::collections::HashSet;
use std::ops::Range;
use std::str::{FromStr, Lines};

use chrono::{Datelike, NaiveDate};
use depenses_core::{collapse_whitespace, Amount, DedupKey, Source, TransactionCandidate};
use rust_decimal::Decimal;
use tracing::debug;

use crate::config::ParseOptions;
use crate::util::{day_month_year, expand_year, re};

// ── Patterns ─────────────────────────────────────────────────────────────────

re!(re_year, r"\b(\d{4})\b");
re!(re_separator, r"^[|\s\-]+$");
re!(re_field_date, r"^(\d{1,2})\.(\d{1,2})(?:\.(\d{4}|\d{2}))?");
re!(re_date_token, r"\b(\d{1,2})[./-](\d{1,2})(?:[./-](\d{4}|\d{2}))?\b");
re!(re_amount_grouped, r"\d{1,3}(?:\s?\d{3})*[.,]\d{2}");
re!(re_amount_simple, r"[+-]?\d+[.,]\d{2}");
re!(re_amount_compact, r"\d+[.,]\d{2}");

/// A line containing any of these (case-insensitively) is a table header or a summary row.
const HEADER_TOKENS: [&str; 7] = [
    "date opé", "date valeur", "libellé", "débit", "crédit", "total", "solde",
];

/// A free-form description containing any of these is a label, not a transaction.
const LABEL_TOKENS: [&str; 5] = ["total", "solde", "montant", "débit", "crédit"];

const CHECKBOXES: [char; 2] = ['☐', '☑'];

// ── Parser ───────────────────────────────────────────────────────────────────

/// Bank statement text (OCR output) to transaction candidates.
///
/// Each line is tried first as a pipe-delimited table row
/// (`DD.MM | DD.MM | LIBELLÉ | DÉBIT | CRÉDIT`) and otherwise as free text carrying a date and an
/// amount somewhere. Lines that fit neither are dropped without error.
#[derive(Debug, Clone, Default)]
pub struct StatementParser {
    options: ParseOptions,
}

impl StatementParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Lazily parse `text`, yielding deduplicated candidates in order of first occurrence.
    pub fn candidates<'a>(&'a self, text: &'a str) -> Candidates<'a> {
        let today = self.options.today();
        let year = infer_year(text, self.options.year_window).unwrap_or_else(|| today.year());
        debug!(year, "statement year");
        Candidates {
            lines: text.lines(),
            prefix_chars: self.options.dedup_prefix_chars,
            year,
            today,
            carried: None,
            seen: HashSet::new(),
        }
    }

    pub fn parse(&self, text: &str) -> Vec<TransactionCandidate> {
        let out: Vec<_> = self.candidates(text).collect();
        debug!(count = out.len(), "parsed statement");
        out
    }
}

/// First 4-digit number inside `window` (inclusive) found anywhere in the text.
pub fn infer_year(text: &str, window: (i32, i32)) -> Option<i32> {
    let (lo, hi) = window;
    re_year()
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<i32>().ok())
        .find(|y| (lo..=hi).contains(y))
}

/// Iterator returned by [`StatementParser::candidates`].
///
/// Holds the only scan state: the carried-forward date of the last dated free-form line and
/// the keys already emitted.
pub struct Candidates<'a> {
    lines: Lines<'a>,
    prefix_chars: usize,
    year: i32,
    today: NaiveDate,
    carried: Option<NaiveDate>,
    seen: HashSet<DedupKey>,
}

impl Iterator for Candidates<'_> {
    type Item = TransactionCandidate;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(line) = self.lines.next() {
            let Some(candidate) = self.parse_line(line) else {
                continue;
            };
            if self.seen.insert(candidate.dedup_key_with_prefix(self.prefix_chars)) {
                return Some(candidate);
            }
            debug!(description = %candidate.description, "duplicate line dropped");
        }
        None
    }
}

impl Candidates<'_> {
    fn parse_line(&mut self, line: &str) -> Option<TransactionCandidate> {
        let line = line.trim();
        if line.is_empty() || is_header(line) || re_separator().is_match(line) {
            return None;
        }

        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if fields.len() >= 4 {
            if let Some(c) = self.parse_row(&fields) {
                return Some(c);
            }
        }

        self.parse_free(line)
    }

    // ── Tabular mode ─────────────────────────────────────────────────────────

    fn parse_row(&self, fields: &[&str]) -> Option<TransactionCandidate> {
        let mut dates: Vec<Option<NaiveDate>> = Vec::with_capacity(2);
        let mut description = None;

        for field in &fields[..3] {
            if let Some(c) = re_field_date().captures(field) {
                if dates.len() < 2 {
                    let year = c
                        .get(3)
                        .and_then(|y| y.as_str().parse().ok())
                        .map_or(self.year, expand_year);
                    dates.push(day_month_year(&c[1], &c[2], year));
                }
            } else if description.is_none() && field.chars().count() > 3 {
                description = Some(*field);
            }
        }

        let mut amounts = fields[3..].iter().filter_map(|f| row_amount(f));
        let debit = amounts.next();
        let credit = amounts.next();

        let description = description?;
        let raw = debit.or(credit)?;

        let date = dates
            .iter()
            .flatten()
            .next()
            .copied()
            .or(self.carried)
            .unwrap_or(self.today);

        let amount = Amount::new(raw)
            .map_err(|e| debug!(error = %e, "table row amount rejected"))
            .ok()?;
        TransactionCandidate::new(description, amount, date, Source::Statement)
            .map_err(|e| debug!(error = %e, "table row rejected"))
            .ok()
    }

    // ── Free-form mode ───────────────────────────────────────────────────────

    fn parse_free(&mut self, line: &str) -> Option<TransactionCandidate> {
        let date_span = find_date(line, self.year).map(|(span, date)| {
            self.carried = Some(date);
            span
        });

        let amount_span = find_amount(line, date_span.as_ref())?;
        let amount = Amount::parse(line[amount_span.clone()].trim_start_matches(['+', '-']))
            .map_err(|e| debug!(error = %e, "free-form amount rejected"))
            .ok()?;

        let spans: Vec<Range<usize>> = date_span.into_iter().chain([amount_span]).collect();
        let description = strip_spans(line, &spans);
        let description = collapse_whitespace(&description);
        let description = description
            .trim_matches(|c: char| c == '|' || CHECKBOXES.contains(&c) || c.is_whitespace());

        let lower = description.to_lowercase();
        if LABEL_TOKENS.iter().any(|t| lower.contains(t)) {
            return None;
        }

        let date = self.carried.unwrap_or(self.today);
        TransactionCandidate::new(description, amount, date, Source::Statement).ok()
    }
}

fn is_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    HEADER_TOKENS.iter().any(|t| lower.contains(t))
}

/// A positive amount in a debit/credit cell, ignoring spaces and checkbox glyphs.
fn row_amount(field: &str) -> Option<Decimal> {
    let clean: String = field
        .chars()
        .filter(|c| !c.is_whitespace() && !CHECKBOXES.contains(c))
        .collect();
    if clean.is_empty() {
        return None;
    }
    let m = re_amount_compact().find(&clean)?;
    let value = Decimal::from_str(&m.as_str().replace(',', ".")).ok()?;
    (value > Decimal::ZERO).then_some(value)
}

/// First date token in the line that names a real calendar day.
fn find_date(line: &str, year: i32) -> Option<(Range<usize>, NaiveDate)> {
    re_date_token().captures_iter(line).find_map(|c| {
        let year = c
            .get(3)
            .and_then(|y| y.as_str().parse().ok())
            .map_or(year, expand_year);
        let date = day_month_year(&c[1], &c[2], year)?;
        Some((c.get(0)?.range(), date))
    })
}

/// Span of the amount token, with a leading sign folded in.
///
/// The grouped form (`1 923,60`) is preferred over the simple one. A match overlapping the
/// date token is skipped: in `05.03 Loyer 850,00` the `05.03` is the date, and a line whose
/// only numeral is its date carries no amount.
fn find_amount(line: &str, date_span: Option<&Range<usize>>) -> Option<Range<usize>> {
    let overlaps = |r: &Range<usize>| date_span.is_some_and(|d| r.start < d.end && d.start < r.end);

    let mut span = re_amount_grouped()
        .find_iter(line)
        .chain(re_amount_simple().find_iter(line))
        .map(|m| m.range())
        .find(|r| !overlaps(r))?;

    if line[..span.start].ends_with(['+', '-']) {
        span.start -= 1;
    }
    Some(span)
}

/// Replace each span with a single space.
fn strip_spans(line: &str, spans: &[Range<usize>]) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_span = false;
    for (i, ch) in line.char_indices() {
        if spans.iter().any(|s| s.contains(&i)) {
            if !in_span {
                out.push(' ');
                in_span = true;
            }
        } else {
            out.push(ch);
            in_span = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn amount(cents: i64) -> Amount {
        Amount::from_cents(cents).unwrap()
    }

    fn parser() -> StatementParser {
        StatementParser::new(ParseOptions::default().with_today(date(2026, 10, 15)))
    }

    // ── Year inference ───────────────────────────────────────────────────────

    #[test]
    fn infer_year_takes_first_in_window() {
        assert_eq!(infer_year("Compte 1234 relevé 2019 puis 2024 et 2025", (2020, 2030)), Some(2024));
        assert_eq!(infer_year("nothing here", (2020, 2030)), None);
        assert_eq!(infer_year("ref 20245", (2020, 2030)), None);
    }

    // ── Tabular mode ─────────────────────────────────────────────────────────

    #[test]
    fn table_row_with_year_in_document() {
        let text = "RELEVE DE COMPTE 2024\n\
                    10.10 | 10.10 | Virement Vir Inst vers walid lcl | 79,00 | | ☐";
        let out = parser().parse(text);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].description, "Virement Vir Inst vers walid lcl");
        assert_eq!(out[0].amount, amount(7900));
        assert_eq!(out[0].date, date(2024, 10, 10));
        assert_eq!(out[0].source, Source::Statement);
        assert!(out[0].category.is_none());
    }

    #[test]
    fn table_row_debit_preferred_over_credit() {
        let out = parser().parse("2024\n03.01 | 04.01 | CB FNAC PARIS | 12,00 | 30,00");
        assert_eq!(out[0].amount, amount(1200));
        assert_eq!(out[0].date, date(2024, 1, 3));
    }

    #[test]
    fn table_row_credit_only() {
        let out = parser().parse("2024\n11.10 | 11.10 | Remboursement mutuelle | | 45,20");
        assert_eq!(out[0].amount, amount(4520));
    }

    #[test]
    fn table_row_falls_back_to_value_date() {
        let out = parser().parse("2024\n99.99 | 12.02 | Prime annuelle | 15,00 |");
        assert_eq!(out[0].date, date(2024, 2, 12));
    }

    #[test]
    fn table_row_grouped_thousands_in_cell() {
        let out = parser().parse("2024\n01.02 | 01.02 | Loyer fevrier | 1 923,60 |");
        assert_eq!(out[0].amount, amount(192360));
    }

    #[test]
    fn dot_decimal_amount_that_reads_like_a_date() {
        let out = parser().parse("2024\n05.03 CB SNCF 25.10\n06.03 CB RATP 3.05");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].description, "CB SNCF");
        assert_eq!(out[0].amount, amount(2510));
        assert_eq!(out[0].date, date(2024, 3, 5));
        assert_eq!(out[1].description, "CB RATP");
        assert_eq!(out[1].amount, amount(305));
    }

    #[test]
    fn table_row_without_dates_uses_carried_date() {
        let out = parser().parse("2024\n05.03 Carte\nPrelevement EDF | x | y | 30,00");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].description, "Prelevement EDF");
        assert_eq!(out[0].date, date(2024, 3, 5));
    }

    #[test]
    fn table_row_without_dates_uses_today() {
        let out = parser().parse("Prelevement EDF | x | y | 30,00");
        assert_eq!(out[0].description, "Prelevement EDF");
        assert_eq!(out[0].date, date(2026, 10, 15));
    }

    #[test]
    fn header_and_separator_lines_are_skipped() {
        let text = "Date opé | Date valeur | Libellé | Débit | Crédit\n\
                    |-------|-------|------|------|\n\
                    SOLDE AU 01.10 | | | 1 250,00 |\n\
                    2024";
        assert!(parser().parse(text).is_empty());
    }

    // ── Free-form mode ───────────────────────────────────────────────────────

    #[test]
    fn free_form_without_year_uses_current_year() {
        let out = parser().parse("05.03 Loyer appartement 850,00");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].description, "Loyer appartement");
        assert_eq!(out[0].amount, amount(85000));
        assert_eq!(out[0].date, date(2026, 3, 5));
    }

    #[test]
    fn free_form_default_options_use_local_year() {
        let out = StatementParser::default().parse("05.03 Loyer appartement 850,00");
        assert_eq!(out[0].date.year(), crate::util::today().year());
    }

    #[test]
    fn carried_forward_date() {
        let text = "2024\n12.03 Carte\nBOULANGERIE PAUL 4,50\nPHARMACIE 12,90";
        let out = parser().parse(text);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|c| c.date == date(2024, 3, 12)));
        assert_eq!(out[0].description, "BOULANGERIE PAUL");
    }

    #[test]
    fn explicit_year_in_slash_date() {
        let out = parser().parse("15/03/2023 Achat FNAC 120,50");
        assert_eq!(out[0].date, date(2023, 3, 15));
        assert_eq!(out[0].description, "Achat FNAC");
    }

    #[test]
    fn signed_amount_is_made_positive() {
        let out = parser().parse("05.03 Remboursement -12,50");
        assert_eq!(out[0].amount, amount(1250));
        assert_eq!(out[0].description, "Remboursement");
    }

    #[test]
    fn date_token_is_never_the_amount() {
        let out = parser().parse("Cafe 12.05\nBOULANGERIE 3,20");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].description, "BOULANGERIE");
        assert_eq!(out[0].date, date(2026, 5, 12));
    }

    #[test]
    fn impossible_date_is_not_a_date() {
        let out = parser().parse("Achat 45.99 magasin");
        assert_eq!(out[0].amount, amount(4599));
        assert_eq!(out[0].date, date(2026, 10, 15));
    }

    #[test]
    fn label_lines_are_rejected() {
        assert!(parser().parse("05.03 Montant HT 120,00").is_empty());
        assert!(parser().parse("05.03 ab 12,00").is_empty());
    }

    #[test]
    fn checkbox_glyphs_are_trimmed() {
        let out = parser().parse("☐ 05.03 Cotisation carte 45,00 ☐");
        assert_eq!(out[0].description, "Cotisation carte");
    }

    #[test]
    fn tiny_amounts_never_appear() {
        let text = "2024\n05.03 Arrondi epargne 0,01\n06.03 Frais 0,00\n07.03 Achat DARTY 299,99";
        let out = parser().parse(text);
        assert_eq!(out.len(), 1);
        assert!(out.iter().all(|c| c.amount.value() > Decimal::new(1, 2)));
    }

    // ── Deduplication and determinism ────────────────────────────────────────

    #[test]
    fn repeated_lines_collapse_to_first() {
        let text = "2024\n05.03 Loyer appartement 850,00\n05.03 Loyer appartement 850,00   \n\
                    06.03 SNCF 45,00\n05.03   Loyer appartement 850,00";
        let out = parser().parse(text);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].description, "Loyer appartement");
        assert_eq!(out[1].description, "SNCF");
    }

    #[test]
    fn same_description_different_amount_is_kept() {
        let out = parser().parse("2024\n05.03 SNCF 45,00\n05.03 SNCF 46,00");
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn parsing_is_idempotent() {
        let text = "RELEVE 2024\n10.10 | 10.10 | Virement | 79,00 | |\n\
                    12.10 CB AUCHAN 54,10\nCB TOTAL 60,00\nLIGNE SANS MONTANT";
        let p = parser();
        assert_eq!(p.parse(text), p.parse(text));
    }

    #[test]
    fn candidates_are_lazy() {
        let text = "2024\n05.03 SNCF 45,00\n06.03 UBER 12,00";
        let p = parser();
        let first: Vec<_> = p.candidates(text).take(1).collect();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].description, "SNCF");
    }

    #[test]
    fn no_panic_on_garbage() {
        let _ = parser().parse("||||\n\0\x01 | é | ☐ | ☑ |\n-- 12,\n,00 | | | |\n💳 12,34");
        assert!(parser().parse("").is_empty());
    }
}
