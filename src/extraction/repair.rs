//! Text repair passes for degraded PDF output.
//!
//! PDF renderers frequently kern letter by letter, so a name like `Jiwoo Lee`
//! arrives as `J i w o o L e e`. No single rewrite fixes every layout, so the
//! passes run from most specific (emails, URLs) to most generic (bare letter
//! and digit runs). Every pass is a pure `&str -> String` function and the
//! full pipeline is idempotent on its own output.

use regex::{Captures, Regex};
use std::sync::LazyLock;

/// Symbols that PDF fonts and encodings leave behind, with their replacement.
const SYMBOL_ARTIFACTS: &[(char, &str)] = &[
    ('\u{FFFD}', " "),
    ('\u{00A0}', " "),
    ('\u{2002}', " "),
    ('\u{2003}', " "),
    ('\u{2009}', " "),
    ('\u{3000}', " "),
    ('\u{00AD}', ""),
    ('\u{200B}', ""),
    ('\u{200C}', ""),
    ('\u{200D}', ""),
    ('\u{FEFF}', ""),
    // Bullets from Symbol/Wingdings fonts and common glyph substitutes
    ('\u{F0B7}', "•"),
    ('\u{F0A7}', "•"),
    ('\u{F0D8}', "•"),
    ('●', "•"),
    ('▪', "•"),
    ('■', "•"),
    ('◆', "•"),
    ('♦', "•"),
    ('◦', "•"),
    ('○', "•"),
    ('‣', "•"),
    ('⁃', "•"),
    ('∙', "•"),
    ('·', "•"),
    ('➢', "•"),
    ('➤', "•"),
    ('►', "•"),
    ('❖', "•"),
    ('✓', "•"),
    ('✔', "•"),
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{2018}', "'"),
    ('\u{2019}', "'"),
    ('\u{201C}', "\""),
    ('\u{201D}', "\""),
    ('\u{2013}', "-"),
    ('\u{2014}', "-"),
    ('\u{2212}', "-"),
    ('\u{2026}', "..."),
];

/// Header vocabulary; a line containing any of these is treated as a section header.
const SECTION_HEADERS: &[&str] = &[
    "summary",
    "technical skills",
    "experience",
    "education",
    "certifications",
    "projects",
    "skills",
    "work experience",
    "professional experience",
    "leadership",
    "activity",
];

// A label is either a run of single characters separated by single spaces or
// an ordinary contiguous token.
const SPACED_OR_WORD: &str = r"(?:\w(?: \w)+\b|[\w\-]+)";

static INLINE_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").unwrap());

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?P<local>[\w.%+\-]+|\w(?: [\w.%+\-])+) ?@ ?(?P<domain>{label}(?:(?: \. |\.){label})+)",
        label = SPACED_OR_WORD
    ))
    .unwrap()
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:https?(?: ?: ?/ ?/ ?))?{label}(?:(?: \. |\.){label})+(?:(?: / |/){label})*",
        label = SPACED_OR_WORD
    ))
    .unwrap()
});

static LETTER_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\p{L}(?: \p{L})+\b").unwrap());

static DIGIT_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d(?: \d)+\b").unwrap());

static FOUR_CHAR_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\w) (\w) (\w) (\w)\b").unwrap());

static THREE_CHAR_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\w) (\w) (\w)\b").unwrap());

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Run all four passes over an assembled document string.
pub fn repair(raw: &str) -> String {
    let text = remove_artifacts(raw);
    let text = repair_spacing(&text);
    let text = normalize_structure(&text);
    final_cleanup(&text)
}

/// Cleanup-only subset for plain-text uploads, which are never glyph-spaced.
pub fn clean_plain_text(raw: &str) -> String {
    let text = strip_control_chars(raw);
    let text = normalize_structure(&text);
    final_cleanup(&text)
}

/// Pass 1: replace symbol artifacts, drop control characters, spell out `&`.
pub fn remove_artifacts(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match SYMBOL_ARTIFACTS.iter().find(|(symbol, _)| *symbol == c) {
            Some((_, replacement)) => out.push_str(replacement),
            None if is_stray_control(c) => {}
            None => out.push(c),
        }
    }
    replace_ampersands(&out)
}

/// `&` becomes `and`, except inside the literal `R&D`.
fn replace_ampersands(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(idx) = rest.find('&') {
        let (before, after) = rest.split_at(idx);
        let after = &after[1..];

        if before.ends_with('R') && after.starts_with('D') {
            out.push_str(before);
            out.push('&');
        } else {
            out.push_str(before.trim_end_matches([' ', '\t']));
            out.push_str(" and ");
            rest = after.trim_start_matches([' ', '\t']);
            continue;
        }
        rest = after;
    }

    out.push_str(rest);
    out
}

/// Pass 2: undo letter-by-letter kerning, most specific patterns first.
///
/// Runs only join across single spaces, so the wider gap a renderer leaves
/// between words survives the first sweep. Once gaps are normalized a second
/// sweep picks up lone characters that were only separated by wide gaps,
/// which keeps the pass stable on its own output.
pub fn repair_spacing(text: &str) -> String {
    let text = reconstruct_emails(text);
    let text = reconstruct_urls(&text);
    let text = collapse_runs(&text);
    let text = INLINE_WS_RE.replace_all(&text, " ");
    collapse_runs(&text)
}

fn collapse_runs(text: &str) -> String {
    let text = LETTER_RUN_RE.replace_all(text, |caps: &Captures| caps[0].replace(' ', ""));
    let text = DIGIT_RUN_RE.replace_all(&text, |caps: &Captures| caps[0].replace(' ', ""));
    let text = FOUR_CHAR_RUN_RE.replace_all(&text, "$1$2$3$4");
    let text = THREE_CHAR_RUN_RE.replace_all(&text, "$1$2$3");
    text.into_owned()
}

fn reconstruct_emails(text: &str) -> String {
    EMAIL_RE
        .replace_all(text, |caps: &Captures| {
            format!(
                "{}@{}",
                caps["local"].replace(' ', ""),
                caps["domain"].replace(' ', "")
            )
        })
        .into_owned()
}

fn reconstruct_urls(text: &str) -> String {
    URL_RE
        .replace_all(text, |caps: &Captures| {
            let matched = &caps[0];
            let spaced_dot = matched.contains(" . ");
            let has_scheme = matched.starts_with("http");
            if !matched.contains(' ') || !(spaced_dot || has_scheme) {
                return matched.to_string();
            }
            let joined = matched.replace(' ', "");
            if has_alphabetic_tld(&joined) {
                joined
            } else {
                matched.to_string()
            }
        })
        .into_owned()
}

/// Guards against joining things like `3.8 / 4` that only look like URLs.
fn has_alphabetic_tld(candidate: &str) -> bool {
    let without_scheme = candidate
        .split_once("://")
        .map_or(candidate, |(_, rest)| rest);
    let host = without_scheme.split('/').next().unwrap_or("");
    host.rsplit('.')
        .next()
        .is_some_and(|tld| tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic))
}

pub fn is_section_header(line: &str) -> bool {
    let lower = line.to_lowercase();
    SECTION_HEADERS.iter().any(|header| lower.contains(header))
}

/// Pass 3: one trimmed, non-blank line per row, headers set off by blank lines.
pub fn normalize_structure(text: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if is_section_header(line) {
            if lines.last().is_some_and(|last| !last.is_empty()) {
                lines.push("");
            }
            lines.push(line);
            lines.push("");
        } else {
            lines.push(line);
        }
    }

    lines.join("\n")
}

/// Pass 4: control characters out, single spaces within lines, at most one blank line.
pub fn final_cleanup(text: &str) -> String {
    let stripped = strip_control_chars(text);
    let lines: Vec<String> = stripped
        .lines()
        .map(|line| INLINE_WS_RE.replace_all(line, " ").trim().to_string())
        .collect();
    let joined = lines.join("\n");
    BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string()
}

fn is_stray_control(c: char) -> bool {
    c.is_control() && c != '\n' && c != '\t'
}

pub(crate) fn strip_control_chars(text: &str) -> String {
    text.chars().filter(|&c| !is_stray_control(c)).collect()
}
