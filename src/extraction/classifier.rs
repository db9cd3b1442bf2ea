use regex::Regex;
use std::sync::LazyLock;

/// Structure keywords and sigiled markers, rejected wherever they occur in a
/// fragment, including inside longer words.
const PDF_ARTIFACTS: &[&str] = &[
    "obj", "endobj", "stream", "endstream", "xref", "trailer", "null", "true", "false",
    "%%PDF", "/Type", "/Font", "/Page", "/Catalog", "/Length",
    "/Filter", "/FlateDecode", "/ASCIIHexDecode", "/ASCII85Decode",
    "<<", ">>",
];

/// Content-stream operators and the reference marker. These are one or two
/// letters long, so only a whole token counts.
const OPERATOR_TOKENS: &[&str] = &["BT", "ET", "Tf", "Td", "TJ", "Tj", "cm", "q", "Q", "R"];

/// Operators that occasionally survive inside otherwise valid segments.
const STRAY_OPERATORS: &[&str] = &["BT", "ET", "Tf", "Td", "TJ", "Tj"];

const MIN_PRINTABLE_RATIO: f64 = 0.7;

static HEX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-fA-F\s]+$").unwrap());
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\p{Alphabetic}{2,}").unwrap());

pub(crate) fn is_sigiled(token: &str) -> bool {
    token.starts_with(['/', '%', '<', '>'])
}

/// A token with surrounding PDF delimiters removed, so `[3 0 R]` yields `R`
/// while `R&D` stays intact.
pub(crate) fn strip_delimiters(token: &str) -> &str {
    token.trim_matches(|c: char| "[](){}<>".contains(c))
}

fn bare_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(strip_delimiters)
        .filter(|t| !t.is_empty())
}

fn contains_artifact(text: &str) -> bool {
    PDF_ARTIFACTS.iter().any(|artifact| text.contains(artifact))
        || bare_tokens(text).any(|token| OPERATOR_TOKENS.contains(&token))
}

fn is_printable(c: char) -> bool {
    c.is_whitespace() || !(c.is_control() || c == '\u{FFFD}')
}

/// Decide whether a raw content-stream fragment is readable text rather than
/// PDF structure, encoded data, or coordinates.
pub fn is_valid_text_segment(fragment: &str) -> bool {
    let trimmed = fragment.trim();
    let length = trimmed.chars().count();

    if length < 2 {
        return false;
    }

    if contains_artifact(fragment) {
        return false;
    }

    let total = fragment.chars().count();
    let printable = fragment.chars().filter(|&c| is_printable(c)).count();
    if (printable as f64) / (total as f64) < MIN_PRINTABLE_RATIO {
        return false;
    }

    if length > 10 && HEX_RE.is_match(&trimmed.replace(' ', "")) {
        return false;
    }

    if length > 5 && !WORD_RE.is_match(trimmed) {
        return false;
    }

    true
}

/// Strip operator tokens that slipped through and normalize whitespace.
pub fn clean_text_segment(segment: &str) -> String {
    segment
        .split_whitespace()
        .filter(|token| !STRAY_OPERATORS.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}
