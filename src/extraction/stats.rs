use serde::Serialize;
use std::fmt;

/// Which stage of the fallback chain produced the final text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionPath {
    Structured,
    Aggressive,
    Ocr,
    PlainText,
}

impl fmt::Display for ExtractionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractionPath::Structured => "structured",
            ExtractionPath::Aggressive => "aggressive",
            ExtractionPath::Ocr => "ocr",
            ExtractionPath::PlainText => "plain_text",
        };
        f.write_str(name)
    }
}

/// Segment classification counts for one page of the structured pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageStats {
    pub page_number: u32,
    pub total_segments: usize,
    pub valid_segments: usize,
    pub filtered_segments: usize,
    pub chars_extracted: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionStats {
    pub page_count: usize,
    pub pages: Vec<PageStats>,
    /// Stages attempted, in order, including the one that succeeded.
    pub attempted: Vec<ExtractionPath>,
    pub path: Option<ExtractionPath>,
    pub ocr_images: usize,
    pub ocr_images_recognized: usize,
    pub chars_extracted: usize,
    pub word_count: usize,
    pub elapsed_ms: u64,
}

impl ExtractionStats {
    pub fn total_segments(&self) -> usize {
        self.pages.iter().map(|p| p.total_segments).sum()
    }

    pub fn valid_segments(&self) -> usize {
        self.pages.iter().map(|p| p.valid_segments).sum()
    }

    pub fn filtered_segments(&self) -> usize {
        self.pages.iter().map(|p| p.filtered_segments).sum()
    }
}

/// Final text together with the diagnostics gathered while producing it.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedText {
    pub text: String,
    pub stats: ExtractionStats,
}
