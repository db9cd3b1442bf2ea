use tracing::debug;

use crate::extraction::classifier::{is_sigiled, strip_delimiters};
use crate::extraction::document::ParsedPdf;
use crate::extraction::error::ExtractionError;
use crate::extraction::repair::repair;
use crate::extraction::{StageText, MIN_STAGE_CHARS};

/// Smaller denylist than the classifier's: only tokens that are never prose.
const LIGHT_ARTIFACTS: &[&str] = &[
    "obj", "endobj", "stream", "endstream", "<<", ">>", "/Type", "/Page", "/Font", "BT", "ET",
    "Tf", "Td",
];

/// Second stage: take every fragment and let the repair engine sort it out.
pub fn extract(pdf: &ParsedPdf) -> Result<StageText, ExtractionError> {
    let mut assembled = String::new();
    let mut fragments = 0usize;

    for page in &pdf.pages {
        for fragment in page.non_empty_fragments() {
            fragments += 1;
            assembled.push_str(&fragment.text);
            assembled.push(' ');
        }
    }
    debug!("Aggressive pass collected {} fragments", fragments);

    let cleaned = strip_light_artifacts(&assembled);
    let repaired = repair(&cleaned);
    let chars = repaired.chars().count();
    if chars < MIN_STAGE_CHARS {
        return Err(ExtractionError::InsufficientText { chars });
    }
    Ok(StageText {
        raw: assembled,
        text: repaired,
    })
}

/// Blank out light artifacts and control characters, collapsing whitespace.
fn strip_light_artifacts(text: &str) -> String {
    let mut text: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    for artifact in LIGHT_ARTIFACTS.iter().filter(|a| is_sigiled(a)) {
        text = text.replace(artifact, " ");
    }

    text.split_whitespace()
        .filter(|token| {
            let bare = strip_delimiters(token);
            !LIGHT_ARTIFACTS
                .iter()
                .any(|artifact| !is_sigiled(artifact) && bare == *artifact)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::document::{PageContent, TextFragment};

    fn single_page(fragments: &[&str]) -> ParsedPdf {
        ParsedPdf {
            page_count: 1,
            pages: vec![PageContent {
                page_number: 1,
                fragments: fragments
                    .iter()
                    .map(|text| TextFragment {
                        text: text.to_string(),
                        page_number: 1,
                    })
                    .collect(),
            }],
        }
    }

    #[test]
    fn test_light_artifacts_become_spaces() {
        assert_eq!(
            strip_light_artifacts("BT Jiwoo\u{0}Lee ET << /Type /Page >> endobj"),
            "Jiwoo Lee"
        );
        assert_eq!(strip_light_artifacts("Objective: streamline"), "Objective: streamline");
    }

    #[test]
    fn test_keeps_fragments_the_classifier_would_drop() {
        let pdf = single_page(&["J", "i", "w", "o", "o", "Rust true believer", "BT"]);
        let stage = extract(&pdf).unwrap();
        assert_eq!(stage.text, "Jiwoo Rust true believer");
        assert!(stage.raw.ends_with("Rust true believer BT "));
    }

    #[test]
    fn test_raw_text_keeps_object_references() {
        let pdf = single_page(&["12 0 obj", "/Length 4410", "[3 0 R]", "endobj"]);
        let stage = extract(&pdf).unwrap();
        assert!(stage.raw.contains("[3 0 R]"));
        assert!(!stage.text.contains("[3 0 R]"));
    }

    #[test]
    fn test_nothing_left_is_insufficient() {
        let pdf = single_page(&["BT", "<<", "obj", ">>", "ET"]);
        assert_eq!(
            extract(&pdf),
            Err(ExtractionError::InsufficientText { chars: 0 })
        );
    }
}
