use tracing::debug;

use crate::extraction::classifier::{clean_text_segment, is_valid_text_segment};
use crate::extraction::document::ParsedPdf;
use crate::extraction::error::ExtractionError;
use crate::extraction::repair::repair;
use crate::extraction::stats::{ExtractionStats, PageStats};
use crate::extraction::{StageText, MIN_STAGE_CHARS};

/// First stage: keep only fragments the classifier accepts.
pub fn extract(pdf: &ParsedPdf, stats: &mut ExtractionStats) -> Result<StageText, ExtractionError> {
    let mut assembled = String::new();

    for page in &pdf.pages {
        let mut page_stats = PageStats {
            page_number: page.page_number,
            ..Default::default()
        };
        let mut page_text = String::new();

        for fragment in page.non_empty_fragments() {
            page_stats.total_segments += 1;
            if is_valid_text_segment(&fragment.text) {
                page_stats.valid_segments += 1;
                page_text.push_str(&clean_text_segment(&fragment.text));
                page_text.push(' ');
            } else {
                page_stats.filtered_segments += 1;
            }
        }

        page_stats.chars_extracted = page_text.chars().count();
        debug!(
            "Page {}: {} segments, {} valid, {} filtered",
            page.page_number,
            page_stats.total_segments,
            page_stats.valid_segments,
            page_stats.filtered_segments
        );

        if !page_text.is_empty() {
            assembled.push_str(&page_text);
            assembled.push('\n');
        }
        stats.pages.push(page_stats);
    }

    let repaired = repair(&assembled);
    let chars = repaired.chars().count();
    if chars < MIN_STAGE_CHARS {
        return Err(ExtractionError::InsufficientText { chars });
    }
    Ok(StageText {
        raw: assembled,
        text: repaired,
    })
}
