use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The closed spending taxonomy. Every categorized transaction carries exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    Alimentation,
    Restaurant,
    Boulangerie,
    Shopping,
    #[serde(rename = "Station de service")]
    StationDeService,
    Transport,
    Logement,
    #[serde(rename = "Santé")]
    Sante,
    Loisirs,
    Abonnements,
    Banque,
    #[default]
    Autres,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown category: '{0}'")]
pub struct UnknownCategory(pub String);

impl Category {
    /// Resolution order of the categorizer, most specific first. `Autres` is the fallback and
    /// never appears here.
    pub const PRIORITY: [Category; 11] = [
        Category::Restaurant,
        Category::Boulangerie,
        Category::Shopping,
        Category::Alimentation,
        Category::StationDeService,
        Category::Transport,
        Category::Logement,
        Category::Sante,
        Category::Loisirs,
        Category::Abonnements,
        Category::Banque,
    ];

    pub const ALL: [Category; 12] = [
        Category::Alimentation,
        Category::Restaurant,
        Category::Boulangerie,
        Category::Shopping,
        Category::StationDeService,
        Category::Transport,
        Category::Logement,
        Category::Sante,
        Category::Loisirs,
        Category::Abonnements,
        Category::Banque,
        Category::Autres,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Alimentation => "Alimentation",
            Category::Restaurant => "Restaurant",
            Category::Boulangerie => "Boulangerie",
            Category::Shopping => "Shopping",
            Category::StationDeService => "Station de service",
            Category::Transport => "Transport",
            Category::Logement => "Logement",
            Category::Sante => "Santé",
            Category::Loisirs => "Loisirs",
            Category::Abonnements => "Abonnements",
            Category::Banque => "Banque",
            Category::Autres => "Autres",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
