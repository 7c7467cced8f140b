//! Reference parsing: decompose a raw `![alt](location "title")` token.
//!
//! Grammar, applied to tokens produced by [`crate::pipeline::scan`]:
//!
//! - alt-text: between the first `[` and the first following `]`
//! - span: between the `(` after that `]` and the final `)`, trimmed
//! - if the span ends with `"` or `'` and the same quote occurs earlier in
//!   the span, the title is the text between the first such occurrence and
//!   the final quote, and the location is everything before it, trimmed
//! - otherwise the whole span is the location and there is no title
//!
//! A span ending in a quote with no opening partner breaks the scanner's
//! structural assumption and is reported as [`EmdError::MalformedReference`],
//! which aborts the document rather than just this reference.

use crate::error::EmdError;
use serde::{Deserialize, Serialize};

/// One image reference as written in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedReference {
    /// The full matched markup, emitted verbatim when resolution fails.
    pub raw: String,
    pub alt: String,
    pub location: String,
    pub title: Option<String>,
}

/// Parse a raw reference token.
pub fn parse_reference(token: &str) -> Result<ParsedReference, EmdError> {
    let malformed = |detail: &str| EmdError::MalformedReference {
        token: token.to_string(),
        detail: detail.to_string(),
    };

    if !token.starts_with("![") || !token.ends_with(')') {
        return Err(malformed("expected ![alt](location)"));
    }

    let alt_start = 2;
    let alt_end = token[alt_start..]
        .find(']')
        .map(|i| alt_start + i)
        .ok_or_else(|| malformed("missing ']' after alt-text"))?;

    let open = alt_end + 1;
    if token.as_bytes().get(open) != Some(&b'(') {
        return Err(malformed("missing '(' after alt-text"));
    }
    let close = token.len() - 1;
    if close <= open {
        return Err(malformed("empty location"));
    }

    let alt = &token[alt_start..alt_end];
    let span = token[open + 1..close].trim();

    let (location, title) = split_title(span).ok_or_else(|| malformed("unmatched closing quote"))?;

    Ok(ParsedReference {
        raw: token.to_string(),
        alt: alt.to_string(),
        location: location.to_string(),
        title: title.map(str::to_string),
    })
}

/// Split a trimmed span into location and optional title.
///
/// Returns `None` when the span ends with a quote that never opens.
fn split_title(span: &str) -> Option<(&str, Option<&str>)> {
    let Some(quote) = span.chars().last().filter(|c| *c == '"' || *c == '\'') else {
        return Some((span, None));
    };

    let body = &span[..span.len() - quote.len_utf8()];
    let open = body.find(quote)?;
    let title = &body[open + quote.len_utf8()..];
    let location = body[..open].trim();
    Some((location, Some(title)))
}
