use std::path::Path;

use depenses_core::TransactionCandidate;
use depenses_import::{CategoryEngine, CategoryTable, ConfigError, ImportConfig, StatementParser};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::recognizer::{DocumentKind, OcrBackend, OcrError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported file format: {0:?}")]
    UnsupportedFormat(String),
    #[error("OCR recognition failed: {0}")]
    Ocr(#[from] OcrError),
    #[error("OCR produced no text")]
    NoText,
}

/// The result of a single statement processing run.
#[derive(Debug, Clone, Serialize)]
pub struct StatementImport {
    /// Raw OCR text output.
    pub ocr_text: String,
    /// Deduplicated, categorized candidates in statement order. May be empty.
    pub transactions: Vec<TransactionCandidate>,
}

/// Orchestrates: OCR → statement parse → categorize.
pub struct StatementPipeline<R: OcrBackend> {
    recognizer: R,
    parser: StatementParser,
    /// Overrides the built-in category table when set.
    table: Option<CategoryTable>,
}

impl<R: OcrBackend> StatementPipeline<R> {
    pub fn new(recognizer: R) -> Self {
        Self { recognizer, parser: StatementParser::default(), table: None }
    }

    pub fn from_config(recognizer: R, config: &ImportConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            recognizer,
            parser: StatementParser::new(config.parser.clone()),
            table: config.compile_table()?,
        })
    }

    fn engine(&self) -> CategoryEngine<'_> {
        CategoryEngine::new(self.table.as_ref().unwrap_or_else(|| CategoryTable::builtin()))
    }

    /// Parse and categorize text that has already been through OCR.
    pub fn process_text(&self, text: &str) -> StatementImport {
        let transactions = self.engine().categorize_all(self.parser.parse(text));
        info!(lines = text.lines().count(), transactions = transactions.len(), "statement processed");
        StatementImport { ocr_text: text.to_string(), transactions }
    }

    /// Process raw bytes (from an upload or a file read).
    pub fn process_bytes(&self, data: &[u8], kind: DocumentKind) -> Result<StatementImport, PipelineError> {
        let ocr_text = self.recognizer.recognize(data, kind).map_err(|e| {
            warn!(%kind, error = %e, "OCR failed");
            e
        })?;
        if ocr_text.trim().is_empty() {
            warn!(%kind, bytes = data.len(), "OCR returned no text");
            return Err(PipelineError::NoText);
        }
        Ok(self.process_text(&ocr_text))
    }

    /// Process a file on disk; its extension decides the document kind.
    pub async fn process_file(&self, path: &Path) -> Result<StatementImport, PipelineError> {
        let kind = DocumentKind::from_path(path).ok_or_else(|| {
            PipelineError::UnsupportedFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default()
                    .to_string(),
            )
        })?;
        let bytes = tokio::fs::read(path).await?;
        self.process_bytes(&bytes, kind)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
