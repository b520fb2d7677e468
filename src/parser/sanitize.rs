//! Text sanitization utilities for scraped listing fields
//!
//! Scraped text carries zero-width characters, stray control characters and
//! layout whitespace. Single-line fields (titles, company names, locations)
//! are collapsed to one line; long-form fields (descriptions, requirements)
//! keep their paragraph breaks.

use regex::Regex;
use std::sync::LazyLock;

// Pre-compiled regex patterns for performance
static WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+").unwrap());

static ANY_WHITESPACE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

static MULTI_NEWLINE_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Clean a single-line field
///
/// # Examples
///
/// ```
/// use jobpulse::parser::sanitize::clean_inline;
///
/// assert_eq!(clean_inline("  백엔드\u{200B} 개발자\n (Rust) "), "백엔드 개발자 (Rust)");
/// ```
pub fn clean_inline(text: &str) -> String {
    let result = remove_control_chars(&remove_zero_width(text));
    ANY_WHITESPACE_REGEX
        .replace_all(result.trim(), " ")
        .to_string()
}

/// Clean a long-form field while keeping paragraph breaks
///
/// # Examples
///
/// ```
/// use jobpulse::parser::sanitize::clean_multiline;
///
/// let clean = clean_multiline("  주요업무  \n\n\n\n - API 개발\t\t설계 ");
/// assert_eq!(clean, "주요업무\n\n- API 개발 설계");
/// ```
pub fn clean_multiline(text: &str) -> String {
    let mut result = remove_zero_width(text);
    result = remove_control_chars(&result);
    result = normalize_whitespace(&result);
    result = trim_lines(&result);
    result = collapse_newlines(&result);

    result.trim().to_string()
}

/// Remove zero-width spaces and similar invisible characters
///
/// Removes U+200B..U+200F, U+2028..U+202F and the byte order mark.
pub fn remove_zero_width(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(*c,
                '\u{200B}'..='\u{200F}' |
                '\u{2028}'..='\u{202F}' |
                '\u{FEFF}'
            )
        })
        .collect()
}

/// Remove control characters except newline and tab
pub fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Normalize multiple spaces/tabs to single space, leaving newlines alone
pub fn normalize_whitespace(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text, " ").to_string()
}

/// Trim whitespace from each line
pub fn trim_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse excessive newlines to maximum of 2
pub fn collapse_newlines(text: &str) -> String {
    MULTI_NEWLINE_REGEX.replace_all(text, "\n\n").to_string()
}
