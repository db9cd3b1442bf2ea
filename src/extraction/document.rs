use lopdf::content::Content;
use lopdf::{Document, Object};
use std::path::Path;
use tracing::{debug, warn};

use crate::extraction::error::ExtractionError;

/// Kerning adjustment (thousandths of an em) beyond which a `TJ` gap is
/// treated as a word break.
const TJ_WORD_GAP: i64 = -100;

/// Uploaded file contents plus the extension the uploader declared.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    bytes: Vec<u8>,
    extension: String,
}

impl SourceDocument {
    pub fn from_bytes(bytes: Vec<u8>, extension: &str) -> Self {
        Self {
            bytes,
            extension: normalize_extension(extension),
        }
    }

    /// Read a staged upload once. The extension is taken from the file name.
    pub async fn open(path: &Path) -> Result<Self, ExtractionError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ExtractionError::OpenFailed {
                reason: format!("{}: {}", path.display(), e),
            })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("");

        Ok(Self {
            bytes,
            extension: normalize_extension(extension),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lower-cased extension without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn is_pdf(&self) -> bool {
        self.extension == "pdf"
    }
}

fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_lowercase()
}

/// One text-showing unit from a content stream, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFragment {
    pub text: String,
    pub page_number: u32,
}

/// Fragments of one page in stream order.
#[derive(Debug, Clone, Default)]
pub struct PageContent {
    pub page_number: u32,
    pub fragments: Vec<TextFragment>,
}

impl PageContent {
    /// Fragments whose trimmed text is non-empty.
    pub fn non_empty_fragments(&self) -> impl Iterator<Item = &TextFragment> {
        self.fragments.iter().filter(|f| !f.text.trim().is_empty())
    }
}

/// Parsed PDF: one entry per page that had a readable content stream.
#[derive(Debug, Clone, Default)]
pub struct ParsedPdf {
    pub page_count: usize,
    pub pages: Vec<PageContent>,
}

fn is_valid_pdf(data: &[u8]) -> bool {
    let header_len = data.len().min(1024);
    data[..header_len].windows(5).any(|w| w == b"%PDF-")
}

/// Parse a PDF into per-page fragment sequences.
///
/// Pages whose content stream is missing or undecodable are skipped rather
/// than failing the whole document.
pub fn parse_pdf(bytes: &[u8]) -> Result<ParsedPdf, ExtractionError> {
    if !is_valid_pdf(bytes) {
        let header: String = bytes
            .iter()
            .take(20)
            .map(|&b| if (32..=126).contains(&b) { b as char } else { '.' })
            .collect();
        return Err(ExtractionError::OpenFailed {
            reason: format!(
                "missing or corrupted PDF header ({} bytes, header: {:?})",
                bytes.len(),
                header
            ),
        });
    }

    let document = Document::load_mem(bytes).map_err(|e| ExtractionError::OpenFailed {
        reason: format!("failed to parse PDF: {}", e),
    })?;

    let page_ids = document.get_pages();
    let mut parsed = ParsedPdf {
        page_count: page_ids.len(),
        pages: Vec::with_capacity(page_ids.len()),
    };

    for (&page_number, &page_id) in page_ids.iter() {
        let raw_content = match document.get_page_content(page_id) {
            Ok(content) => content,
            Err(e) => {
                debug!("Page {}: no readable content stream ({}), skipping", page_number, e);
                continue;
            }
        };

        let content = match Content::decode(&raw_content) {
            Ok(content) => content,
            Err(e) => {
                warn!("Page {}: invalid content stream ({}), skipping", page_number, e);
                continue;
            }
        };

        let mut page = PageContent {
            page_number,
            fragments: Vec::new(),
        };

        for operation in &content.operations {
            let text = match operation.operator.as_str() {
                "Tj" | "'" => operation.operands.last().map(decode_operand),
                // `"` carries word and char spacing before the string
                "\"" => operation.operands.get(2).map(decode_operand),
                "TJ" => operation.operands.first().map(decode_operand),
                _ => None,
            };

            if let Some(text) = text {
                page.fragments.push(TextFragment { text, page_number });
            }
        }

        debug!("Page {}: {} text fragments", page_number, page.fragments.len());
        parsed.pages.push(page);
    }

    Ok(parsed)
}

fn decode_operand(operand: &Object) -> String {
    match operand {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        Object::Array(items) => {
            let mut text = String::new();
            for item in items {
                match item {
                    Object::String(bytes, _) => text.push_str(&decode_pdf_string(bytes)),
                    Object::Integer(n) if *n < TJ_WORD_GAP => text.push(' '),
                    Object::Real(n) if (*n as f64) < TJ_WORD_GAP as f64 => text.push(' '),
                    _ => {}
                }
            }
            text
        }
        _ => String::new(),
    }
}

/// UTF-16BE when the string carries a BOM, UTF-8 when valid, Latin-1 otherwise.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{dictionary, Stream};

    fn build_pdf(pages: Vec<Vec<Operation>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn test_parse_collects_fragments_per_page() {
        let pdf = build_pdf(vec![
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Tj", vec![Object::string_literal("Jiwoo Lee")]),
                Operation::new("Tj", vec![Object::string_literal("Senior Software Engineer")]),
                Operation::new("ET", vec![]),
            ],
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tj", vec![Object::string_literal("Education")]),
                Operation::new("ET", vec![]),
            ],
        ]);

        let parsed = parse_pdf(&pdf).unwrap();
        assert_eq!(parsed.page_count, 2);
        assert_eq!(parsed.pages.len(), 2);
        assert_eq!(parsed.pages[0].page_number, 1);
        assert_eq!(parsed.pages[0].fragments[0].text, "Jiwoo Lee");
        assert_eq!(parsed.pages[0].fragments[1].text, "Senior Software Engineer");
        assert_eq!(parsed.pages[1].fragments[0].page_number, 2);
    }

    #[test]
    fn test_tj_array_kerning_gaps_become_spaces() {
        let pdf = build_pdf(vec![vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Data"),
                    Object::Integer(-250),
                    Object::string_literal("Engineer"),
                    Object::Integer(-20),
                    Object::string_literal("ing"),
                ])],
            ),
            Operation::new("ET", vec![]),
        ]]);

        let parsed = parse_pdf(&pdf).unwrap();
        assert_eq!(parsed.pages[0].fragments[0].text, "Data Engineering");
    }

    #[test]
    fn test_rejects_non_pdf_bytes() {
        let err = parse_pdf(b"just some text, not a pdf").unwrap_err();
        assert_eq!(err.error_code(), "EXTRACT_OPEN_FAILED");
    }

    #[test]
    fn test_decode_utf16_and_latin1() {
        let utf16 = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&utf16), "Hi");
        assert_eq!(decode_pdf_string(&[0x43, 0x61, 0x66, 0xE9]), "Café");
    }

    #[test]
    fn test_source_document_extension_normalized() {
        let doc = SourceDocument::from_bytes(b"abc".to_vec(), ".PDF");
        assert_eq!(doc.extension(), "pdf");
        assert!(doc.is_pdf());
    }
}
