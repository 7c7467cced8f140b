//! Result types returned by the `embed*` entry points.
//!
//! Everything here is `Serialize` so the CLI can print it with `--json`.
//! Image payloads are deliberately absent from the reports; they live only
//! in [`EmbedOutput::markdown`].

use crate::document::LineEnding;
use crate::error::ResolveError;
use crate::pipeline::identify::ContentId;
use crate::pipeline::resolve::{Resolution, ResolvedReference};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The embedded document plus a per-reference report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedOutput {
    /// The assembled Markdown.
    pub markdown: String,
    /// One entry per image reference, in body order.
    pub references: Vec<ReferenceReport>,
    pub stats: EmbedStats,
    /// Path the output was written to, when it was written.
    pub output_path: Option<PathBuf>,
    /// Backup of the original, for in-place output.
    pub backup_path: Option<PathBuf>,
}

/// What happened to one image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceReport {
    pub alt: String,
    pub location: String,
    pub title: Option<String>,
    /// Set when the image was embedded.
    pub id: Option<ContentId>,
    /// Set when the reference was left untouched.
    pub error: Option<ResolveError>,
}

impl From<&ResolvedReference> for ReferenceReport {
    fn from(r: &ResolvedReference) -> Self {
        let (id, error) = match &r.resolution {
            Resolution::Embedded(img) => (Some(img.id.clone()), None),
            Resolution::Failed(e) => (None, Some(e.clone())),
        };
        Self {
            alt: r.reference.alt.clone(),
            location: r.reference.location.clone(),
            title: r.reference.title.clone(),
            id,
            error,
        }
    }
}

/// Aggregate statistics for one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedStats {
    /// Image references found in the body.
    pub total_references: usize,
    /// References rewritten to `![alt][ID]`.
    pub embedded_references: usize,
    /// References left as original markup.
    pub failed_references: usize,
    /// Image definitions emitted after deduplication.
    pub unique_images: usize,
    /// Size of the original document.
    pub source_bytes: usize,
    /// Size of the assembled document.
    pub output_bytes: usize,
    pub line_ending: LineEnding,
    pub duration_ms: u64,
}
