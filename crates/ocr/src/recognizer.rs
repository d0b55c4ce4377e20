use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("Image decode error: {0}")]
    ImageDecode(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("Backend cannot read {0} documents")]
    Unsupported(DocumentKind),
}

/// What the uploaded bytes are, as far as OCR is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Image,
    Pdf,
}

impl DocumentKind {
    const IMAGE_EXTENSIONS: [&'static str; 6] = ["jpg", "jpeg", "png", "gif", "bmp", "webp"];

    /// Case-insensitive; `None` for anything that is neither a PDF nor a common image format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        if ext == "pdf" {
            Some(Self::Pdf)
        } else if Self::IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else {
            None
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Image => f.write_str("image"),
            Self::Pdf => f.write_str("pdf"),
        }
    }
}

/// Abstraction over an OCR backend.
/// Implementations accept the raw bytes of a photographed or scanned statement and return the
/// recognized text, one statement line per text line.
pub trait OcrBackend: Send + Sync {
    fn recognize(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, OcrError>;
}

// ── Mock backend (always available, used for tests) ───────────────────────────

/// Returns a pre-set response, so the statement pipeline can be tested without Tesseract.
pub struct MockRecognizer {
    response: Result<String, String>,
}

impl MockRecognizer {
    pub fn new(text: impl Into<String>) -> Self {
        Self { response: Ok(text.into()) }
    }

    /// A backend whose every call fails with an engine error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self { response: Err(message.into()) }
    }
}

impl OcrBackend for MockRecognizer {
    fn recognize(&self, _bytes: &[u8], _kind: DocumentKind) -> Result<String, OcrError> {
        self.response.clone().map_err(OcrError::Engine)
    }
}

// ── Tesseract backend (optional, gated behind `tesseract` feature) ─────────────

#[cfg(feature = "tesseract")]
pub mod tesseract_backend {
    use super::{DocumentKind, OcrBackend, OcrError};
    use leptess::LepTess;

    /// French statements with English fallback.
    pub const DEFAULT_LANG: &str = "fra+eng";

    pub struct TesseractRecognizer {
        data_path: Option<String>,
        lang: String,
    }

    impl Default for TesseractRecognizer {
        fn default() -> Self {
            Self::new(None, DEFAULT_LANG)
        }
    }

    impl TesseractRecognizer {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl OcrBackend for TesseractRecognizer {
        fn recognize(&self, bytes: &[u8], kind: DocumentKind) -> Result<String, OcrError> {
            // Leptonica only decodes raster formats; PDFs must be rasterized upstream.
            if kind == DocumentKind::Pdf {
                return Err(OcrError::Unsupported(kind));
            }
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(bytes)
                .map_err(|e| OcrError::ImageDecode(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}
