//! Reference scanning: split document text into literal segments and raw
//! image-reference tokens.
//!
//! The pattern is deliberately structural: the alt-text may not contain
//! brackets and the location span may not contain parentheses, so the first
//! `)` ends a match. `![a](f(1).png)` therefore does not match as a whole;
//! nested parentheses are a known limitation. Anything that does not match
//! stays literal text — malformed markup is never an error here.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_IMAGE_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\[\]]*\]\([^()]+\)").unwrap());

/// Result of scanning: `segments.len() == tokens.len() + 1`.
///
/// Interleaving `segments[0], tokens[0], segments[1], …, segments[n]`
/// reproduces the scanned text exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanned<'a> {
    pub segments: Vec<&'a str>,
    pub tokens: Vec<&'a str>,
}

impl Scanned<'_> {
    /// Rebuild the original text.
    pub fn reconstruct(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            out.push_str(segment);
            if let Some(token) = self.tokens.get(i) {
                out.push_str(token);
            }
        }
        out
    }
}

/// Scan `text` left to right for image references.
pub fn scan(text: &str) -> Scanned<'_> {
    let mut segments = Vec::new();
    let mut tokens = Vec::new();
    let mut idx = 0;

    for m in RE_IMAGE_REF.find_iter(text) {
        segments.push(&text[idx..m.start()]);
        tokens.push(m.as_str());
        idx = m.end();
    }
    segments.push(&text[idx..]);

    Scanned { segments, tokens }
}
