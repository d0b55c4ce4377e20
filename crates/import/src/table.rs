use std::collections::HashSet;
use std::sync::OnceLock;

use depenses_core::Category;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

// ── Specification (serde) ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub category: Category,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialCaseSpec {
    pub keyword: String,
    pub category: Category,
}

/// Uncompiled table. `categories` is in priority order: the first entry wins ties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryTableSpec {
    pub categories: Vec<CategorySpec>,
    #[serde(default)]
    pub special_cases: Vec<SpecialCaseSpec>,
}

// ── Built-in data ─────────────────────────────────────────────────────────────

struct Builtin {
    category: Category,
    patterns: &'static [&'static str],
    keywords: &'static [&'static str],
}

/// Ordered to match `Category::PRIORITY`.
const BUILTIN: [Builtin; 11] = [
    Builtin {
        category: Category::Restaurant,
        patterns: &[
            r"\b(cafe|café|coffee|restaurant|resto|brasserie|bistrot|bistro)\b",
            r"\b(mcdo|mcdonald|kfc|burger|pizza|pizzeria|fast food)\b",
            r"\b(saveurs|saveur|cuisine|gastronomie)\b",
            r"\b(deliveroo|ubereats|just eat|takeaway|livraison)\b",
        ],
        keywords: &[
            "cafe", "café", "restaurant", "resto", "brasserie", "bistrot", "bistro",
            "mcdo", "mcdonald", "kfc", "burger", "pizza", "pizzeria", "fast food",
            "saveurs", "saveur", "deliveroo", "ubereats", "just eat", "takeaway",
        ],
    },
    Builtin {
        category: Category::Boulangerie,
        patterns: &[
            r"\b(boulangerie|boulanger|boulang|patisserie|pâtisserie|tradition)\b",
            r"\b(bakery|pain|baguette)\b",
        ],
        keywords: &[
            "boulangerie", "boulanger", "boulang", "patisserie", "pâtisserie",
            "tradition", "bakery",
        ],
    },
    Builtin {
        category: Category::Shopping,
        patterns: &[
            r"\b(barber|barbier|coiffeur|coiffeuse|salon|hairdresser)\b",
            r"\b(amazon|fnac|darty|ikea|zara|decathlon|cultura)\b",
            r"\b(leroy merlin|castorama|bricorama|bricolage|brico)\b",
            r"\b(vêtement|vetement|habillement|mode|fashion|clothing)\b",
        ],
        keywords: &[
            "barber", "barbier", "coiffeur", "coiffeuse", "salon", "premium barber",
            "amazon", "fnac", "darty", "ikea", "zara", "decathlon", "cultura",
            "leroy merlin", "castorama", "bricorama", "bricolage", "brico",
            "vêtement", "vetement", "habillement", "mode", "fashion",
        ],
    },
    Builtin {
        category: Category::Alimentation,
        patterns: &[
            r"\b(carrefour|auchan|leclerc|intermarch[ée]|intermarche|super u|monoprix|casino|geant|e\.leclerc)\b",
            r"\b(supermarche|supermarché|hypermarch[ée]|grande surface)\b",
            r"\b(h market|h&m market|market)\b",
            r"\b(epicerie|épicerie|alimentation)\b",
        ],
        keywords: &[
            "carrefour", "auchan", "leclerc", "intermarché", "intermarche", "super u",
            "monoprix", "casino", "geant", "supermarche", "supermarché", "hypermarché",
            "h market", "epicerie", "épicerie", "alimentation", "food", "grocery",
            "auchan bretigny", "auchan brétigny",
        ],
    },
    Builtin {
        category: Category::StationDeService,
        patterns: &[
            r"\b(station.*service|station.*essence|station.*carburant)\b",
            r"\b(relais|relais.*drapeau|relais.*route)\b",
            r"\b(total|shell|bp|esso|mobil|avia|agip)\b",
            r"\b(essence|carburant|gasoil|gazole|diesel)\b",
        ],
        keywords: &[
            "station service", "station-service", "station essence", "station carburant",
            "relais", "relais drapeau", "relais route", "relais autoroute",
            "total", "shell", "bp", "esso", "mobil", "avia", "agip",
            "essence", "carburant", "gasoil", "gazole", "diesel",
        ],
    },
    Builtin {
        category: Category::Transport,
        patterns: &[
            r"\b(peage|péage|toll|autoroute)\b",
            r"\b(sncf|train|metro|métro|bus|tram|rer)\b",
            r"\b(taxi|uber|bolt|heetch|parking|park)\b",
            r"\b(garage|réparation|reparation|mecanique|mécanique)\b",
        ],
        keywords: &[
            "peage", "péage", "sncf", "train", "metro", "métro", "bus", "taxi",
            "uber", "parking", "park", "garage", "réparation", "reparation",
        ],
    },
    Builtin {
        category: Category::Logement,
        patterns: &[
            r"\b(loyer|charges|eau|électricité|electricite|gaz)\b",
            r"\b(edf|engie|enedis|grdf|syndic|copropriété)\b",
            r"\b(hotel|hôtel|airbnb|booking|logement)\b",
        ],
        keywords: &[
            "loyer", "charges", "eau", "électricité", "electricite", "gaz",
            "edf", "engie", "enedis", "grdf", "syndic", "copropriété",
            "hotel", "hôtel", "airbnb", "booking",
        ],
    },
    Builtin {
        category: Category::Sante,
        patterns: &[
            r"\b(pharmacie|pharma|médecin|medecin|dentiste|opticien)\b",
            r"\b(hopital|hôpital|clinique|mutuelle|assurance santé)\b",
            r"\b(laboratoire|analyse|medical|médical)\b",
        ],
        keywords: &[
            "pharmacie", "pharma", "médecin", "medecin", "dentiste", "opticien",
            "hopital", "hôpital", "clinique", "mutuelle", "laboratoire", "analyse",
        ],
    },
    Builtin {
        category: Category::Loisirs,
        patterns: &[
            r"\b(cinema|cinéma|netflix|spotify|disney|prime video)\b",
            r"\b(salle de sport|gym|fitness|sport|concert|spectacle)\b",
            r"\b(musée|musee|voyage|tourisme)\b",
        ],
        keywords: &[
            "cinema", "cinéma", "netflix", "spotify", "disney", "prime video",
            "salle de sport", "gym", "fitness", "sport", "concert", "spectacle",
            "musée", "musee", "voyage", "tourisme",
        ],
    },
    Builtin {
        category: Category::Abonnements,
        patterns: &[
            r"\b(abonnement|netflix|spotify|amazon prime|disney)\b",
            r"\b(youtube premium|apple music|deezer|canal\+)\b",
            r"\b(orange|sfr|bouygues|free|mobile|forfait)\b",
        ],
        keywords: &[
            "abonnement", "netflix", "spotify", "amazon prime", "disney",
            "youtube premium", "apple music", "deezer", "canal+", "orange",
            "sfr", "bouygues", "free", "mobile", "forfait",
        ],
    },
    Builtin {
        category: Category::Banque,
        patterns: &[
            r"\b(frais bancaire|agios|commission|assurance|banque)\b",
            r"\b(crédit|credit|prêt|pret|remboursement)\b",
        ],
        keywords: &[
            "frais bancaire", "agios", "commission", "assurance", "banque",
            "crédit", "credit", "prêt", "pret", "remboursement",
        ],
    },
];

const SPECIAL_CASES: [(&str, Category); 8] = [
    ("cafe", Category::Restaurant),
    ("café", Category::Restaurant),
    ("saveurs", Category::Restaurant),
    ("h market", Category::Alimentation),
    ("tradition", Category::Boulangerie),
    ("barber", Category::Shopping),
    ("barbier", Category::Shopping),
    ("relais", Category::StationDeService),
];

impl CategoryTableSpec {
    /// The shipped table as data, e.g. to write out a TOML template for editing.
    pub fn builtin() -> Self {
        let own = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        CategoryTableSpec {
            categories: BUILTIN
                .iter()
                .map(|b| CategorySpec {
                    category: b.category,
                    patterns: own(b.patterns),
                    keywords: own(b.keywords),
                })
                .collect(),
            special_cases: SPECIAL_CASES
                .iter()
                .map(|(keyword, category)| SpecialCaseSpec {
                    keyword: keyword.to_string(),
                    category: *category,
                })
                .collect(),
        }
    }
}

// ── Compiled table ────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct CategoryEntry {
    pub category: Category,
    patterns: Vec<Regex>,
    /// Lower-cased.
    keywords: Vec<String>,
}

impl CategoryEntry {
    pub fn patterns(&self) -> &[Regex] {
        &self.patterns
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// The category table: per-category regexes and keywords in resolution order, the
/// special-case overrides, and the fallback label.
///
/// A table is compiled once and then only read. The built-in one lives in a process-wide
/// `OnceLock` and is handed out as `&'static`.
#[derive(Debug)]
pub struct CategoryTable {
    entries: Vec<CategoryEntry>,
    special_cases: Vec<(String, Category)>,
    default: Category,
}

impl CategoryTable {
    /// The shipped table, compiled on first use.
    pub fn builtin() -> &'static CategoryTable {
        static TABLE: OnceLock<CategoryTable> = OnceLock::new();
        TABLE.get_or_init(|| {
            CategoryTable::from_spec(CategoryTableSpec::builtin())
                .expect("built-in category table is valid")
        })
    }

    pub fn from_spec(spec: CategoryTableSpec) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(spec.categories.len());

        for cat in spec.categories {
            if !seen.insert(cat.category) {
                return Err(ConfigError::DuplicateCategory(cat.category));
            }
            let patterns = cat
                .patterns
                .iter()
                .map(|p| {
                    RegexBuilder::new(p)
                        .case_insensitive(true)
                        .build()
                        .map_err(|source| ConfigError::Pattern {
                            category: cat.category,
                            source,
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            entries.push(CategoryEntry {
                category: cat.category,
                patterns,
                keywords: cat.keywords.iter().map(|k| k.to_lowercase()).collect(),
            });
        }

        let special_cases = spec
            .special_cases
            .into_iter()
            .map(|s| (s.keyword.to_lowercase(), s.category))
            .collect();

        Ok(Self {
            entries,
            special_cases,
            default: Category::Autres,
        })
    }

    /// Entries in resolution order.
    pub fn entries(&self) -> &[CategoryEntry] {
        &self.entries
    }

    pub fn special_cases(&self) -> &[(String, Category)] {
        &self.special_cases
    }

    pub fn default_category(&self) -> Category {
        self.default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_follows_priority_order() {
        let order: Vec<Category> = CategoryTable::builtin()
            .entries()
            .iter()
            .map(|e| e.category)
            .collect();
        assert_eq!(order, Category::PRIORITY.to_vec());
    }

    #[test]
    fn builtin_is_compiled_once() {
        assert!(std::ptr::eq(CategoryTable::builtin(), CategoryTable::builtin()));
    }

    #[test]
    fn builtin_every_category_has_rules() {
        for e in CategoryTable::builtin().entries() {
            assert!(!e.patterns().is_empty(), "{} has no patterns", e.category);
            assert!(!e.keywords().is_empty(), "{} has no keywords", e.category);
        }
        assert_eq!(CategoryTable::builtin().special_cases().len(), 8);
        assert_eq!(CategoryTable::builtin().default_category(), Category::Autres);
    }

    #[test]
    fn from_spec_rejects_bad_regex() {
        let spec = CategoryTableSpec {
            categories: vec![CategorySpec {
                category: Category::Transport,
                patterns: vec!["(unclosed".to_string()],
                keywords: vec![],
            }],
            special_cases: vec![],
        };
        assert!(matches!(
            CategoryTable::from_spec(spec),
            Err(ConfigError::Pattern { category: Category::Transport, .. })
        ));
    }

    #[test]
    fn from_spec_rejects_duplicate_category() {
        let entry = CategorySpec {
            category: Category::Banque,
            patterns: vec![],
            keywords: vec!["agios".to_string()],
        };
        let spec = CategoryTableSpec {
            categories: vec![entry.clone(), entry],
            special_cases: vec![],
        };
        assert!(matches!(
            CategoryTable::from_spec(spec),
            Err(ConfigError::DuplicateCategory(Category::Banque))
        ));
    }

    #[test]
    fn keywords_are_lowercased() {
        let spec = CategoryTableSpec {
            categories: vec![CategorySpec {
                category: Category::Loisirs,
                patterns: vec![],
                keywords: vec!["NETFLIX".to_string()],
            }],
            special_cases: vec![SpecialCaseSpec {
                keyword: "Gym".to_string(),
                category: Category::Loisirs,
            }],
        };
        let table = CategoryTable::from_spec(spec).unwrap();
        assert_eq!(table.entries()[0].keywords(), ["netflix".to_string()]);
        assert_eq!(table.special_cases()[0].0, "gym");
    }

    #[test]
    fn builtin_spec_roundtrips_through_toml() {
        let spec = CategoryTableSpec::builtin();
        let text = toml::to_string(&spec).unwrap();
        let back: CategoryTableSpec = toml::from_str(&text).unwrap();
        assert_eq!(back, spec);
    }
}
