use regex::Regex;
use std::sync::LazyLock;

use crate::extraction::error::ExtractionError;

pub const MIN_CONTENT_CHARS: usize = 50;
pub const MAX_CONTENT_CHARS: usize = 300_000;
pub const MIN_WORDS: usize = 5;

/// Below this share of word characters a long text is treated as residue.
const MIN_WORD_CHAR_RATIO: f64 = 0.3;
const RATIO_CHECK_MIN_CHARS: usize = 100;
const MIN_RESIDUE_PATTERNS: usize = 2;

static RESIDUE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\d+\s+\d+\s+obj",
        r"<</[A-Za-z]+",
        r"\[\d+\s+\d+\s+R\]",
        r"/[A-Z][A-Za-z]+\s+\d+",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

/// Length, emptiness and word-count gate applied to every candidate text.
/// Lengths are counted in Unicode scalar values.
pub fn validate_content(text: &str) -> Result<(), ExtractionError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ExtractionError::NoContent);
    }

    let chars = trimmed.chars().count();
    if chars < MIN_CONTENT_CHARS {
        return Err(ExtractionError::TooShort {
            chars,
            min: MIN_CONTENT_CHARS,
        });
    }
    if chars > MAX_CONTENT_CHARS {
        return Err(ExtractionError::TooLarge {
            chars,
            max: MAX_CONTENT_CHARS,
        });
    }

    let words = trimmed.split_whitespace().count();
    if words < MIN_WORDS {
        return Err(ExtractionError::ImageBased { words });
    }

    Ok(())
}

/// Number of distinct residue patterns found in `text`.
pub fn residue_pattern_matches(text: &str) -> usize {
    RESIDUE_PATTERNS.iter().filter(|re| re.is_match(text)).count()
}

/// Share of characters that belong to words containing at least one letter.
pub fn word_char_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let word_chars: usize = text
        .split_whitespace()
        .filter(|word| word.chars().any(char::is_alphabetic))
        .map(|word| word.chars().count())
        .sum();
    word_chars as f64 / total as f64
}

/// True when a PDF-derived text still looks like PDF structure.
pub fn has_artifact_residue(text: &str) -> bool {
    if residue_pattern_matches(text) >= MIN_RESIDUE_PATTERNS {
        return true;
    }
    text.chars().count() > RATIO_CHECK_MIN_CHARS && word_char_ratio(text) < MIN_WORD_CHAR_RATIO
}

/// Residue check for assembled fragments before repair. Only the structural
/// patterns apply here.
pub fn source_has_artifact_residue(raw: &str) -> bool {
    residue_pattern_matches(raw) >= MIN_RESIDUE_PATTERNS
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "Jiwoo Lee\nBackend engineer with five years of Rust and Go experience.";

    #[test]
    fn test_accepts_reasonable_resume() {
        assert!(validate_content(RESUME).is_ok());
    }

    #[test]
    fn test_empty_and_whitespace_are_no_content() {
        assert_eq!(validate_content(""), Err(ExtractionError::NoContent));
        assert_eq!(validate_content(" \n\t "), Err(ExtractionError::NoContent));
    }

    #[test]
    fn test_too_short() {
        let err = validate_content("Jiwoo Lee, engineer").unwrap_err();
        assert_eq!(err.error_code(), "EXTRACT_TOO_SHORT");
    }

    #[test]
    fn test_length_counts_scalar_values() {
        // 49 two-byte characters: over 50 bytes but under 50 chars
        let text = "é".repeat(49);
        assert!(matches!(
            validate_content(&text),
            Err(ExtractionError::TooShort { chars: 49, .. })
        ));
    }

    #[test]
    fn test_too_large() {
        let text = "word ".repeat(60_001);
        assert!(matches!(
            validate_content(&text),
            Err(ExtractionError::TooLarge { max: MAX_CONTENT_CHARS, .. })
        ));
    }

    #[test]
    fn test_few_words_is_image_based() {
        let text = "Supercalifragilisticexpialidocious-engineering-lead-with-many-years";
        assert_eq!(
            validate_content(text),
            Err(ExtractionError::ImageBased { words: 1 })
        );
    }

    #[test]
    fn test_residue_patterns() {
        assert!(has_artifact_residue("12 0 obj /Length 4410 endobj"));
        assert!(has_artifact_residue("[12 0 R] <</Type /Catalog"));
        assert_eq!(residue_pattern_matches("see page 12 of the report"), 0);
        assert!(!has_artifact_residue(RESUME));
    }

    #[test]
    fn test_source_residue_ignores_word_ratio() {
        assert!(source_has_artifact_residue("12 0 obj /Length 4410 [3 0 R] endobj"));
        assert!(!source_has_artifact_residue("2 0 1 9 - 2 0 2 3 | 0 1 0 - 1 2 3 4"));
        assert!(!source_has_artifact_residue("[3 0 R]"));
    }

    #[test]
    fn test_low_word_ratio_is_residue() {
        let numbers = "0.5 12 700 1 0 0 1 72 720 ".repeat(6);
        assert!(numbers.chars().count() > 100);
        assert!(has_artifact_residue(&numbers));
        // same ratio but under the length floor
        assert!(!has_artifact_residue("0.5 12 700 1 0 0"));
    }
}
