//! Requirement-tag classifier.
//!
//! Descriptions mark general-education requirements with parenthesized
//! codes such as `(HU)` or `(HU/SS)`.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use schedkit_shared::Tag;

use crate::reference::TagTable;

/// Classify a free-text description into requirement tags.
///
/// Every parenthesized run of ASCII letters and slashes is upper-cased and
/// split on `/`; each piece that exactly matches a table code contributes
/// that tag. The result is sorted by code with no repeated codes, so a
/// description reading `(HU) (HU)` yields a single `HU` tag.
pub fn classify(description: &str, table: &TagTable) -> Vec<Tag> {
    static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\(([A-Za-z/]+)\)").expect("valid regex")
    });

    let mut tags = BTreeSet::new();

    for caps in TOKEN_RE.captures_iter(description) {
        let token = caps[1].to_uppercase();
        for code in token.split('/') {
            if let Some(tag) = table.get(code) {
                tags.insert(tag.clone());
            }
        }
    }

    tags.into_iter().collect()
}
