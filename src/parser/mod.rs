//! HTML and text extraction shared by the source adapters
//!
//! Parsing is synchronous: `scraper::Html` is not `Send`, so adapters fetch the
//! body first and hand it to a plain function that returns owned postings.

pub mod extract;
pub mod sanitize;
pub mod selectors;

pub use extract::{absolute_url, extract_id, parse_relative_date, parse_timestamp, strip_query};
pub use sanitize::{clean_inline, clean_multiline};
pub use selectors::{element_text, SelectorChain};

use scraper::{ElementRef, Selector};
use std::collections::BTreeMap;

/// Collect label/value pairs from rows such as `<tr><th>경력</th><td>3년</td></tr>`
///
/// Rows missing either cell are skipped; a repeated label keeps its first value.
pub fn label_value_pairs(
    rows: &[ElementRef<'_>],
    label: &Selector,
    value: &Selector,
) -> BTreeMap<String, String> {
    let mut pairs = BTreeMap::new();
    for row in rows {
        let (Some(l), Some(v)) = (row.select(label).next(), row.select(value).next()) else {
            continue;
        };
        let key = element_text(l);
        if !key.is_empty() {
            pairs.entry(key).or_insert_with(|| element_text(v));
        }
    }
    pairs
}

/// Look up the first present label among aliases
pub fn lookup(pairs: &BTreeMap<String, String>, labels: &[&str]) -> Option<String> {
    labels
        .iter()
        .find_map(|label| pairs.get(*label))
        .filter(|v| !v.is_empty())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::selectors::parse_selector;
    use scraper::Html;

    #[test]
    fn test_label_value_pairs() {
        let doc = Html::parse_document(
            r#"<table class="tbList"><tbody>
                <tr><th>경력</th><td>3년 이상</td></tr>
                <tr><th>급여</th><td> 회사내규에 따름 </td></tr>
                <tr><th>빈칸</th></tr>
            </tbody></table>"#,
        );
        let rows: Vec<_> = doc.select(&parse_selector!(".tbList tbody tr")).collect();
        let pairs = label_value_pairs(&rows, &parse_selector!("th"), &parse_selector!("td"));

        assert_eq!(pairs.len(), 2);
        assert_eq!(lookup(&pairs, &["연봉", "급여"]).as_deref(), Some("회사내규에 따름"));
        assert_eq!(lookup(&pairs, &["고용형태"]), None);
    }
}
