//! Question normalization applied before retrieval.
//!
//! [`normalize`] never fails: any input, including markup fragments and stray
//! apostrophes, produces a (possibly empty) cleaned string.

mod contractions;


use std::sync::LazyLock;

use regex::Regex;

pub use contractions::expand_contractions;

// Non-greedy and line-bound, so `a < b` on one line and `>` on the next survives.
static HTML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<.*?>").expect("HTML tag pattern is valid"));

/// Lowercases, expands contractions, strips HTML tags and collapses whitespace.
pub fn normalize(text: &str) -> String {
    let expanded = expand_contractions(text);
    let stripped = HTML_TAG_RE.replace_all(&expanded, "");
    let lowered = stripped.to_lowercase();

    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}
