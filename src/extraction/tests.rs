use super::*;
use crate::extraction::error::ToolError;
use std::time::Duration;

const RESUME_TXT: &str = "Jiwoo Lee\n\n\nSummary\n  Backend engineer   with five years of Rust.\r\nExperience\nAcme Corp, 2019 - 2023";

#[test]
fn test_extraction_error_types() {
    let err = ExtractionError::InsufficientText { chars: 3 };
    assert_eq!(err.error_code(), "EXTRACT_INSUFFICIENT_TEXT");
    assert!(err.is_recoverable());
    assert!(!err.is_user_facing());

    let err = ExtractionError::TooShort { chars: 12, min: 50 };
    assert_eq!(err.error_code(), "EXTRACT_TOO_SHORT");
    assert!(!err.is_recoverable());
    assert!(err.is_user_facing());
    assert!(err.to_string().contains("12 characters"));

    let err = ExtractionError::UnsupportedFormat {
        extension: "docx".to_string(),
    };
    assert!(err.is_user_facing());
    assert!(err.to_string().contains("docx"));

    let err = ExtractionError::RasterizationFailed {
        details: "pdfimages exited with 1".to_string(),
    };
    assert!(!err.is_recoverable());
    assert!(!err.is_user_facing());
    assert_eq!(ExtractionError::StillArtifacts.error_code(), "EXTRACT_STILL_ARTIFACTS");
}

#[test]
fn test_tool_error_display() {
    let err = ToolError::Timeout {
        tool: "tesseract".to_string(),
        timeout: Duration::from_secs(120),
    };
    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "tesseract timed out after 120 seconds");

    let err = ToolError::NonZeroExit {
        tool: "convert".to_string(),
        status: "exit status: 1".to_string(),
        stderr: "no images defined".to_string(),
    };
    assert!(!err.is_timeout());
    assert!(err.to_string().contains("no images defined"));
}

#[tokio::test]
async fn test_plain_text_is_cleaned_and_validated() {
    let extractor = TextExtractor::default();
    let document = SourceDocument::from_bytes(RESUME_TXT.as_bytes().to_vec(), "txt");

    let extracted = extractor.extract_with_stats(&document).await.unwrap();
    assert_eq!(extracted.text, repair::clean_plain_text(RESUME_TXT));
    assert_eq!(
        extracted.text,
        "Jiwoo Lee\n\nSummary\n\nBackend engineer with five years of Rust.\n\nExperience\n\nAcme Corp, 2019 - 2023"
    );
    assert_eq!(extracted.stats.path, Some(ExtractionPath::PlainText));
    assert_eq!(extracted.stats.word_count, 16);
}

#[tokio::test]
async fn test_plain_text_too_short() {
    let extractor = TextExtractor::default();
    let document = SourceDocument::from_bytes(b"Jiwoo Lee, engineer".to_vec(), "txt");
    let err = extractor.extract_text(&document).await.unwrap_err();
    assert!(matches!(err, ExtractionError::TooShort { chars: 19, min: 50 }));
}

#[tokio::test]
async fn test_txt_decodes_invalid_utf8_lossily() {
    let mut bytes = b"Backend engineer building payment systems in Rust and Go ".to_vec();
    bytes.push(0xFF);
    let document = SourceDocument::from_bytes(bytes, "TXT");

    let text = TextExtractor::default().extract_text(&document).await.unwrap();
    assert!(text.starts_with("Backend engineer building payment systems"));
    assert!(text.ends_with('\u{FFFD}'));
}

#[tokio::test]
async fn test_unknown_extension_requires_utf8() {
    let extractor = TextExtractor::default();

    let readable = SourceDocument::from_bytes(
        b"Backend engineer building payment systems in Rust and Go".to_vec(),
        "md",
    );
    assert!(extractor.extract_text(&readable).await.is_ok());

    let binary = SourceDocument::from_bytes(vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1], "doc");
    assert_eq!(
        extractor.extract_text(&binary).await,
        Err(ExtractionError::UnsupportedFormat {
            extension: "doc".to_string()
        })
    );
}

#[tokio::test]
async fn test_pdf_with_bad_header_fails_without_fallback() {
    let extractor = TextExtractor::default();
    let document = SourceDocument::from_bytes(b"<html>not a pdf</html>".to_vec(), "pdf");

    let err = extractor.extract_with_stats(&document).await.unwrap_err();
    assert_eq!(err.error_code(), "EXTRACT_OPEN_FAILED");
}

#[test]
fn test_extractor_is_shareable() {
    fn assert_send_sync<T: Send + Sync + Clone>() {}
    assert_send_sync::<TextExtractor>();
}
