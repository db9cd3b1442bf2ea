//! Resume text extraction.
//!
//! PDFs go through three stages in order, stopping at the first that yields
//! enough text: the structured pass (classifier-filtered fragments), the
//! aggressive pass (every fragment, repaired) and OCR on rasterized pages.
//! Plain-text uploads skip straight to cleanup. Every candidate is then
//! validated before it is handed back.

pub mod aggressive;
pub mod classifier;
pub mod document;
pub mod error;
pub mod ocr;
pub mod repair;
pub mod stats;
pub mod structured;
pub mod validation;

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ExtractionConfig;

pub use document::SourceDocument;
pub use error::{ExtractionError, ToolError};
pub use ocr::{OcrEngine, OcrFallback, Rasterizer};
pub use stats::{ExtractedText, ExtractionPath, ExtractionStats, PageStats};

/// Minimum characters a single stage must produce to count as a success.
pub(crate) const MIN_STAGE_CHARS: usize = 10;

/// Output of a fragment-based stage: the repaired text and the assembled
/// fragments it was repaired from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageText {
    pub raw: String,
    pub text: String,
}

const PREVIEW_CHARS: usize = 500;

#[derive(Clone)]
pub struct TextExtractor {
    config: ExtractionConfig,
    ocr: OcrFallback,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new(ExtractionConfig::default())
    }
}

impl TextExtractor {
    /// Extractor backed by the command-line rasterizer and tesseract.
    pub fn new(config: ExtractionConfig) -> Self {
        let ocr = OcrFallback::from_config(&config);
        Self { config, ocr }
    }

    pub fn with_capabilities(
        config: ExtractionConfig,
        rasterizer: Arc<dyn Rasterizer>,
        engine: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            config,
            ocr: OcrFallback::new(rasterizer, engine),
        }
    }

    pub async fn extract_text(&self, document: &SourceDocument) -> Result<String, ExtractionError> {
        self.extract_with_stats(document)
            .await
            .map(|extracted| extracted.text)
    }

    pub async fn extract_with_stats(
        &self,
        document: &SourceDocument,
    ) -> Result<ExtractedText, ExtractionError> {
        let start = Instant::now();
        let mut stats = ExtractionStats::default();

        let result = if document.is_pdf() {
            self.extract_pdf(document.bytes(), &mut stats).await
        } else {
            extract_plain_text(document, &mut stats)
        };
        stats.elapsed_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(text) => {
                stats.chars_extracted = text.chars().count();
                stats.word_count = text.split_whitespace().count();
                info!(
                    "Extraction succeeded via {}: {} pages, {} chars, {} words, \
                     {}/{} segments kept, {} OCR images, {}ms",
                    stats.path.map_or_else(|| "unknown".to_string(), |p| p.to_string()),
                    stats.page_count,
                    stats.chars_extracted,
                    stats.word_count,
                    stats.valid_segments(),
                    stats.total_segments(),
                    stats.ocr_images,
                    stats.elapsed_ms
                );
                debug!("Extracted text preview: {}", preview(&text));
                Ok(ExtractedText { text, stats })
            }
            Err(e) => {
                warn!(
                    "Extraction failed [{}] after {:?} in {}ms: {}",
                    e.error_code(),
                    stats.attempted,
                    stats.elapsed_ms,
                    e
                );
                Err(e)
            }
        }
    }

    async fn extract_pdf(
        &self,
        bytes: &[u8],
        stats: &mut ExtractionStats,
    ) -> Result<String, ExtractionError> {
        let pdf = document::parse_pdf(bytes)?;
        stats.page_count = pdf.page_count;
        info!("Parsed PDF with {} pages", pdf.page_count);

        stats.attempted.push(ExtractionPath::Structured);
        match structured::extract(&pdf, stats) {
            Ok(stage) => {
                return accept_pdf_text(
                    stage.text,
                    Some(&stage.raw),
                    ExtractionPath::Structured,
                    stats,
                )
            }
            Err(e) if e.is_recoverable() => {
                info!("Structured extraction insufficient ({}), trying aggressive pass", e)
            }
            Err(e) => return Err(e),
        }

        stats.attempted.push(ExtractionPath::Aggressive);
        let aggressive_error = match aggressive::extract(&pdf) {
            Ok(stage) => {
                return accept_pdf_text(
                    stage.text,
                    Some(&stage.raw),
                    ExtractionPath::Aggressive,
                    stats,
                )
            }
            Err(e) if e.is_recoverable() => e,
            Err(e) => return Err(e),
        };

        if !self.config.ocr_enabled {
            info!("Aggressive extraction insufficient and OCR is disabled");
            return Err(surface_insufficient(aggressive_error));
        }
        info!("Aggressive extraction insufficient ({}), falling back to OCR", aggressive_error);

        stats.attempted.push(ExtractionPath::Ocr);
        let text = self.ocr.extract(bytes, stats).await?;
        accept_pdf_text(text, None, ExtractionPath::Ocr, stats)
    }
}

/// When the chain ends without a usable stage, report the shortfall the way
/// content validation would: nothing at all is `NoContent`, anything else is
/// `TooShort`.
fn surface_insufficient(error: ExtractionError) -> ExtractionError {
    match error {
        ExtractionError::InsufficientText { chars: 0 } => ExtractionError::NoContent,
        ExtractionError::InsufficientText { chars } => ExtractionError::TooShort {
            chars,
            min: validation::MIN_CONTENT_CHARS,
        },
        other => other,
    }
}

/// Final gate for PDF-derived text: content validation, then artifact residue
/// in the repaired text and in the fragments it was assembled from, since
/// repair rewrites references like `[3 0 R]`.
fn accept_pdf_text(
    text: String,
    raw: Option<&str>,
    path: ExtractionPath,
    stats: &mut ExtractionStats,
) -> Result<String, ExtractionError> {
    stats.path = Some(path);
    validation::validate_content(&text)?;
    if validation::has_artifact_residue(&text)
        || raw.is_some_and(validation::source_has_artifact_residue)
    {
        return Err(ExtractionError::StillArtifacts);
    }
    Ok(text)
}

fn extract_plain_text(
    document: &SourceDocument,
    stats: &mut ExtractionStats,
) -> Result<String, ExtractionError> {
    let raw = match document.extension() {
        "txt" => String::from_utf8_lossy(document.bytes()).into_owned(),
        other => std::str::from_utf8(document.bytes())
            .map_err(|_| ExtractionError::UnsupportedFormat {
                extension: other.to_string(),
            })?
            .to_string(),
    };

    stats.attempted.push(ExtractionPath::PlainText);
    stats.path = Some(ExtractionPath::PlainText);

    let text = repair::clean_plain_text(&raw);
    validation::validate_content(&text)?;
    Ok(text)
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}
