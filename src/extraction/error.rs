use std::time::Duration;
use thiserror::Error;

/// Terminal failure of one extraction stage or of the whole pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Failed to open document: {reason}")]
    OpenFailed { reason: String },

    #[error("Insufficient text extracted ({chars} characters)")]
    InsufficientText { chars: usize },

    #[error("Failed to convert PDF pages to images: {details}")]
    RasterizationFailed { details: String },

    #[error("OCR found only {chars} characters. The PDF might be corrupted or contain no readable text")]
    OcrInsufficientText { chars: usize },

    #[error("No text content found in the file")]
    NoContent,

    #[error("File content is too short to be a valid resume ({chars} characters, minimum {min})")]
    TooShort { chars: usize, min: usize },

    #[error("File content is too large ({chars} characters, maximum {max})")]
    TooLarge { chars: usize, max: usize },

    #[error("Insufficient text content (only {words} words). This PDF might be image-based")]
    ImageBased { words: usize },

    #[error("Extracted content appears to be PDF structure rather than readable text")]
    StillArtifacts,
}

impl ExtractionError {
    /// Signals that the next, more permissive stage should run.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ExtractionError::InsufficientText { .. })
    }

    /// Failures caused by the uploaded document itself rather than the pipeline.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            ExtractionError::UnsupportedFormat { .. }
                | ExtractionError::NoContent
                | ExtractionError::TooShort { .. }
                | ExtractionError::TooLarge { .. }
                | ExtractionError::ImageBased { .. }
                | ExtractionError::StillArtifacts
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ExtractionError::UnsupportedFormat { .. } => "EXTRACT_UNSUPPORTED_FORMAT",
            ExtractionError::OpenFailed { .. } => "EXTRACT_OPEN_FAILED",
            ExtractionError::InsufficientText { .. } => "EXTRACT_INSUFFICIENT_TEXT",
            ExtractionError::RasterizationFailed { .. } => "EXTRACT_RASTERIZATION_FAILED",
            ExtractionError::OcrInsufficientText { .. } => "EXTRACT_OCR_INSUFFICIENT_TEXT",
            ExtractionError::NoContent => "EXTRACT_NO_CONTENT",
            ExtractionError::TooShort { .. } => "EXTRACT_TOO_SHORT",
            ExtractionError::TooLarge { .. } => "EXTRACT_TOO_LARGE",
            ExtractionError::ImageBased { .. } => "EXTRACT_IMAGE_BASED",
            ExtractionError::StillArtifacts => "EXTRACT_STILL_ARTIFACTS",
        }
    }
}

/// Failure of a single external tool invocation (rasterizer or OCR engine).
///
/// These never cross the pipeline boundary: the OCR stage absorbs them per
/// image and reports only `RasterizationFailed` / `OcrInsufficientText`.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} timed out after {} seconds", .timeout.as_secs())]
    Timeout { tool: String, timeout: Duration },

    #[error("{tool} exited with {status}: {stderr}")]
    NonZeroExit {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("{tool} produced no output images")]
    NoOutput { tool: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ToolError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ToolError::Timeout { .. })
    }
}
