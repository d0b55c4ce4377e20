use depenses_core::{Category, TransactionCandidate};
use serde::Serialize;

use crate::table::CategoryTable;

/// How a description reached its category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MatchKind {
    /// A category regex matched; `index` is its position within that category's list.
    Pattern { index: usize },
    Keyword { keyword: String },
    SpecialCase { keyword: String },
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub category: Category,
    pub matched_by: MatchKind,
}

/// First-match-wins categorizer over a borrowed, read-only table.
///
/// Resolution runs in three passes: every category's regexes in priority order, then every
/// category's keywords in priority order, then the special-case overrides. The first hit in
/// that sequence decides; nothing is scored.
#[derive(Debug, Clone, Copy)]
pub struct CategoryEngine<'t> {
    table: &'t CategoryTable,
}

impl Default for CategoryEngine<'static> {
    fn default() -> Self {
        Self::new(CategoryTable::builtin())
    }
}

impl<'t> CategoryEngine<'t> {
    pub fn new(table: &'t CategoryTable) -> Self {
        Self { table }
    }

    pub fn categorize(&self, description: &str) -> Category {
        self.resolve(description).category
    }

    pub fn resolve(&self, description: &str) -> Resolution {
        let fallback = Resolution {
            category: self.table.default_category(),
            matched_by: MatchKind::Default,
        };
        if description.is_empty() {
            return fallback;
        }

        let text = description.to_lowercase();

        for entry in self.table.entries() {
            if let Some(index) = entry.patterns().iter().position(|re| re.is_match(&text)) {
                return Resolution {
                    category: entry.category,
                    matched_by: MatchKind::Pattern { index },
                };
            }
        }

        for entry in self.table.entries() {
            if let Some(keyword) = entry.keywords().iter().find(|k| text.contains(k.as_str())) {
                return Resolution {
                    category: entry.category,
                    matched_by: MatchKind::Keyword { keyword: keyword.clone() },
                };
            }
        }

        self.table
            .special_cases()
            .iter()
            .find(|(keyword, _)| text.contains(keyword.as_str()))
            .map(|(keyword, category)| Resolution {
                category: *category,
                matched_by: MatchKind::SpecialCase { keyword: keyword.clone() },
            })
            .unwrap_or(fallback)
    }

    /// Label every candidate, preserving order.
    pub fn categorize_all(&self, candidates: Vec<TransactionCandidate>) -> Vec<TransactionCandidate> {
        candidates
            .into_iter()
            .map(|c| {
                let category = self.categorize(&c.description);
                c.with_category(category)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{CategorySpec, CategoryTableSpec, SpecialCaseSpec};

    fn engine() -> CategoryEngine<'static> {
        CategoryEngine::default()
    }

    #[test]
    fn empty_description_is_autres() {
        let r = engine().resolve("");
        assert_eq!(r.category, Category::Autres);
        assert_eq!(r.matched_by, MatchKind::Default);
    }

    #[test]
    fn supermarket_chain() {
        assert_eq!(engine().categorize("CARREFOUR MARKET PARIS"), Category::Alimentation);
        assert_eq!(engine().categorize("E.LECLERC ST MALO"), Category::Alimentation);
    }

    #[test]
    fn regex_match_is_case_insensitive() {
        assert_eq!(engine().categorize("PHARMACIE DU CENTRE"), Category::Sante);
        assert_eq!(engine().categorize("Loyer appartement"), Category::Logement);
        assert_eq!(engine().categorize("SNCF INTERNET"), Category::Transport);
    }

    #[test]
    fn higher_priority_regex_wins() {
        // Matches Restaurant (`cafe`) and Alimentation (`carrefour`); Restaurant is earlier.
        let r = engine().resolve("CAFE CARREFOUR");
        assert_eq!(r.category, Category::Restaurant);
        assert_eq!(r.matched_by, MatchKind::Pattern { index: 0 });
    }

    #[test]
    fn any_regex_beats_an_earlier_keyword() {
        // `cafeteria` only hits the Restaurant keyword `cafe`; `pharmacie` is a Santé regex.
        let r = engine().resolve("PHARMACIE CAFETERIA");
        assert_eq!(r.category, Category::Sante);
    }

    #[test]
    fn keyword_pass_catches_partial_words() {
        let r = engine().resolve("BOULANGERIES PAUL");
        assert_eq!(r.category, Category::Boulangerie);
        assert_eq!(
            r.matched_by,
            MatchKind::Keyword { keyword: "boulangerie".to_string() }
        );
    }

    #[test]
    fn accented_text_matches() {
        assert_eq!(engine().categorize("PÂTISSERIE DUPONT"), Category::Boulangerie);
        assert_eq!(engine().categorize("Hôpital Necker"), Category::Sante);
    }

    #[test]
    fn unmatched_falls_back_to_autres() {
        assert_eq!(engine().categorize("Virement Vir Inst vers walid lcl"), Category::Autres);
        assert_eq!(engine().categorize("XYZ 123"), Category::Autres);
    }

    #[test]
    fn result_is_always_in_taxonomy() {
        for d in ["", "a", "???", "TOTAL", "random text", "netflix", "Crédit Agricole"] {
            assert!(Category::ALL.contains(&engine().categorize(d)));
        }
    }

    #[test]
    fn special_cases_apply_after_keywords() {
        let spec = CategoryTableSpec {
            categories: vec![CategorySpec {
                category: Category::Transport,
                patterns: vec![r"\btaxi\b".to_string()],
                keywords: vec!["uber".to_string()],
            }],
            special_cases: vec![SpecialCaseSpec {
                keyword: "relais".to_string(),
                category: Category::StationDeService,
            }],
        };
        let table = CategoryTable::from_spec(spec).unwrap();
        let engine = CategoryEngine::new(&table);

        assert_eq!(engine.categorize("TAXI G7"), Category::Transport);
        assert_eq!(engine.categorize("UBERX PARIS"), Category::Transport);
        let r = engine.resolve("RELAIS DES ALPES");
        assert_eq!(r.category, Category::StationDeService);
        assert_eq!(
            r.matched_by,
            MatchKind::SpecialCase { keyword: "relais".to_string() }
        );
        assert_eq!(engine.categorize("BOULANGERIE"), Category::Autres);
    }

    #[test]
    fn categorize_all_labels_in_order() {
        use chrono::NaiveDate;
        use depenses_core::{Amount, Source};

        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let make = |d: &str| {
            TransactionCandidate::new(d, Amount::from_cents(1000).unwrap(), date, Source::Statement)
                .unwrap()
        };
        let out = engine().categorize_all(vec![make("KFC ORLY"), make("Virement walid")]);
        assert_eq!(out[0].category, Some(Category::Restaurant));
        assert_eq!(out[1].category, Some(Category::Autres));
        assert_eq!(out[0].description, "KFC ORLY");
    }
}
