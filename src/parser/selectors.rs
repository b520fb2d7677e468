//! Ordered fallback selectors
//!
//! Listing sites change their markup without notice, so every field is looked
//! up through a [`SelectorChain`]: the selectors are tried in order and the
//! first non-empty result wins. Adapters declare their chains once in
//! `lazy_static!` blocks with the [`selector_chain!`] macro.

use scraper::{ElementRef, Selector};

use crate::parser::sanitize::{clean_inline, clean_multiline};

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        ::scraper::Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

/// Build a [`SelectorChain`] from selector literals in fallback order
macro_rules! selector_chain {
    ($($s:expr),+ $(,)?) => {
        $crate::parser::selectors::SelectorChain::from_selectors(vec![
            $($crate::parser::selectors::parse_selector!($s)),+
        ])
    };
}

pub(crate) use parse_selector;
pub(crate) use selector_chain;

/// Selectors tried in order until one matches
#[derive(Debug, Clone)]
pub struct SelectorChain {
    selectors: Vec<Selector>,
}

impl SelectorChain {
    pub fn from_selectors(selectors: Vec<Selector>) -> Self {
        Self { selectors }
    }

    /// Number of selectors in the chain
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// First element matched by the first selector that matches anything
    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.selectors
            .iter()
            .find_map(|selector| scope.select(selector).next())
    }

    /// All elements of the first selector that matches anything
    ///
    /// Later selectors are never mixed in once an earlier one has matched.
    pub fn all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        for selector in &self.selectors {
            let found: Vec<ElementRef<'a>> = scope.select(selector).collect();
            if !found.is_empty() {
                return found;
            }
        }
        Vec::new()
    }

    /// First non-empty value produced from each selector's first match
    fn first_value<'a, F>(&self, scope: ElementRef<'a>, extract: F) -> Option<String>
    where
        F: Fn(ElementRef<'a>) -> Option<String>,
    {
        self.selectors.iter().find_map(|selector| {
            scope
                .select(selector)
                .next()
                .and_then(&extract)
                .filter(|v| !v.is_empty())
        })
    }

    /// Single-line text, skipping selectors whose match is blank
    pub fn text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.first_value(scope, |el| Some(element_text(el)))
    }

    /// Multi-line text keeping paragraph breaks, skipping blank matches
    pub fn block_text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.first_value(scope, |el| {
            Some(clean_multiline(&el.text().collect::<Vec<_>>().join("\n")))
        })
    }

    /// Attribute of the first match that carries a non-blank value
    pub fn attr(&self, scope: ElementRef<'_>, name: &str) -> Option<String> {
        self.first_value(scope, |el| el.value().attr(name).map(|v| v.trim().to_string()))
    }

    /// Non-blank texts of every element of the first matching selector
    pub fn texts(&self, scope: ElementRef<'_>) -> Vec<String> {
        self.all(scope)
            .into_iter()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Collapsed single-line text of an element
pub fn element_text(element: ElementRef<'_>) -> String {
    clean_inline(&element.text().collect::<Vec<_>>().join(" "))
}
