//! Document assembly: rewritten body + hidden block of reference definitions.
//!
//! ```text
//! <body with ![alt][ID] rewrites>
//!
//! <div id="encoded_data" style="display: none;">
//!
//! [markdown]:data:text/plain;base64,<zlib+base64 source>
//!
//! [ID]:data:image/png;base64,<base64 png> "optional title"
//!
//! </div>
//! ```
//!
//! Every line break the assembler inserts is the document's own
//! [`LineEnding`]; the body segments are copied verbatim.

use crate::document::LineEnding;
use crate::pipeline::resolve::{Resolution, ResolvedReference};
use crate::pipeline::scan::Scanned;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Opening marker of the hidden block.
pub const BLOCK_OPEN: &str = r#"<div id="encoded_data" style="display: none;">"#;
/// Closing marker of the hidden block.
pub const BLOCK_CLOSE: &str = "</div>";
/// Reserved identifier of the embedded source. Lowercase, so it lies outside
/// the uppercase base-32 identifier space.
pub const SOURCE_ID: &str = "markdown";

/// What a definition payload holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    /// Raw PNG bytes.
    Png,
    /// zlib-compressed original document.
    CompressedSource,
}

impl MediaKind {
    pub fn mime(self) -> &'static str {
        match self {
            MediaKind::Png => "image/png",
            MediaKind::CompressedSource => "text/plain",
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "image/png" => Some(MediaKind::Png),
            "text/plain" => Some(MediaKind::CompressedSource),
            _ => None,
        }
    }
}

/// One `[id]:data:<mime>;base64,<payload>` line of the hidden block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceDefinition {
    pub id: String,
    pub media: MediaKind,
    pub payload: String,
    pub title: Option<String>,
}

impl ReferenceDefinition {
    /// The definition carrying the packed document source.
    pub fn source(packed: String) -> Self {
        Self {
            id: SOURCE_ID.to_string(),
            media: MediaKind::CompressedSource,
            payload: packed,
            title: None,
        }
    }

    pub fn render(&self) -> String {
        let mut line = format!(
            "[{}]:data:{};base64,{}",
            self.id,
            self.media.mime(),
            self.payload
        );
        if let Some(ref title) = self.title {
            line.push(' ');
            line.push_str(&quote_title(title));
        }
        line
    }
}

/// Wrap a title in the first delimiter it does not contain.
fn quote_title(title: &str) -> String {
    if !title.contains('"') {
        format!("\"{title}\"")
    } else if !title.contains('\'') {
        format!("'{title}'")
    } else {
        format!("({title})")
    }
}

/// One definition per distinct embedded identifier, in body order.
///
/// The first reference with a given identifier supplies the title.
pub fn image_definitions(references: &[ResolvedReference]) -> Vec<ReferenceDefinition> {
    let mut seen = HashSet::new();
    references
        .iter()
        .filter_map(|r| {
            let img = r.resolution.embedded()?;
            if !seen.insert(img.id.as_str()) {
                return None;
            }
            Some(ReferenceDefinition {
                id: img.id.to_string(),
                media: MediaKind::Png,
                payload: img.payload.clone(),
                title: r.reference.title.clone(),
            })
        })
        .collect()
}

/// Reassemble the document.
///
/// `references[i]` is the resolution of `scanned.tokens[i]`.
pub fn assemble(
    scanned: &Scanned<'_>,
    references: &[ResolvedReference],
    source: ReferenceDefinition,
    eol: LineEnding,
) -> String {
    debug_assert_eq!(scanned.segments.len(), references.len() + 1);
    let eol = eol.as_str();

    let mut out = String::new();
    for (segment, r) in scanned.segments.iter().zip(references) {
        out.push_str(segment);
        match &r.resolution {
            Resolution::Embedded(img) => {
                out.push_str(&format!("![{}][{}]", r.reference.alt, img.id));
            }
            Resolution::Failed(_) => out.push_str(&r.reference.raw),
        }
    }
    if let Some(last) = scanned.segments.last() {
        out.push_str(last);
    }
    out.push_str(eol);
    out.push_str(eol);

    let mut block = vec![BLOCK_OPEN.to_string(), source.render()];
    block.extend(image_definitions(references).iter().map(ReferenceDefinition::render));
    block.push(BLOCK_CLOSE.to_string());
    out.push_str(&block.join(eol.repeat(2).as_str()));

    out
}
