pub mod pipeline;
pub mod recognizer;

pub use pipeline::{PipelineError, StatementImport, StatementPipeline};
pub use recognizer::{DocumentKind, MockRecognizer, OcrBackend, OcrError};

#[cfg(feature = "tesseract")]
pub use recognizer::tesseract_backend::TesseractRecognizer;
