use chrono::NaiveDate;
use depenses_core::{Category, DEDUP_PREFIX_CHARS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::{CategorySpec, CategoryTable, CategoryTableSpec, SpecialCaseSpec};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid pattern for {category}: {source}")]
    Pattern {
        category: Category,
        #[source]
        source: regex::Error,
    },
    #[error("Category listed twice: {0}")]
    DuplicateCategory(Category),
    #[error("Invalid year window: {0}..={1}")]
    YearWindow(i32, i32),
}

/// Knobs of the statement and notification parsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    /// Inclusive range a 4-digit number must fall in to be taken as the document year.
    pub year_window: (i32, i32),
    /// Leading description characters that take part in duplicate detection.
    pub dedup_prefix_chars: usize,
    /// Fixed "today"; the local date when unset.
    pub today: Option<NaiveDate>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            year_window: (2020, 2030),
            dedup_prefix_chars: DEDUP_PREFIX_CHARS,
            today: None,
        }
    }
}

impl ParseOptions {
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(crate::util::today)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let (lo, hi) = self.year_window;
        if lo > hi {
            return Err(ConfigError::YearWindow(lo, hi));
        }
        Ok(())
    }
}

/// Top-level import configuration, usually read from a TOML file:
///
/// ```toml
/// [parser]
/// year_window = [2020, 2030]
///
/// [[categories]]
/// category = "Restaurant"
/// patterns = ['\b(cafe|restaurant)\b']
/// keywords = ["cafe"]
/// ```
///
/// Without a `[[categories]]` section the built-in table is used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub parser: ParseOptions,
    #[serde(default)]
    pub categories: Vec<CategorySpec>,
    #[serde(default)]
    pub special_cases: Vec<SpecialCaseSpec>,
}

impl ImportConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: ImportConfig = toml::from_str(toml_content)?;
        config.parser.validate()?;
        Ok(config)
    }

    /// Compile the configured table. A config without one yields `None`; callers fall back to
    /// [`CategoryTable::builtin`].
    pub fn compile_table(&self) -> Result<Option<CategoryTable>, ConfigError> {
        if self.categories.is_empty() {
            return Ok(None);
        }
        CategoryTable::from_spec(CategoryTableSpec {
            categories: self.categories.clone(),
            special_cases: self.special_cases.clone(),
        })
        .map(Some)
    }
}
