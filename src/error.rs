//! Error types for the embed-markdown library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`EmdError`] — **Fatal** for one document: the document cannot be
//!   loaded, one of its image references is structurally malformed, or the
//!   output cannot be written. Returned as `Err(EmdError)` from the `embed*`
//!   entry points.
//!
//! * [`ResolveError`] — **Non-fatal**: a single image reference could not be
//!   embedded (missing file, not a PNG, read error). Stored inside
//!   [`crate::pipeline::resolve::Resolution::Failed`]; the reference keeps its
//!   original markup and the rest of the document is still assembled.
//!
//! In a batch every document is independent, so an `EmdError` for one file
//! never stops the next one from being processed.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the embed-markdown library.
///
/// Reference-level failures use [`ResolveError`] and are stored with the
/// reference rather than propagated here.
#[derive(Debug, Error)]
pub enum EmdError {
    // ── Document load errors ──────────────────────────────────────────────
    /// Markdown document was not found at the given path.
    #[error("Markdown file not found: '{path}'\nCheck the path exists and is readable.")]
    DocumentNotFound { path: PathBuf },

    /// Process does not have read permission on the document.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The document bytes are not valid UTF-8.
    #[error("'{path}' is not valid UTF-8 (first invalid byte at offset {offset})")]
    DocumentNotUtf8 { path: PathBuf, offset: usize },

    /// Any other I/O error while reading the document.
    #[error("Failed to read '{path}': {source}")]
    DocumentReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Structural errors ─────────────────────────────────────────────────
    /// An image reference ends with a quote that has no opening partner,
    /// or does not have the `![alt](location)` shape at all.
    #[error("Malformed image reference {token:?}: {detail}")]
    MalformedReference { token: String, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The backup path is already taken; refusing to overwrite it.
    #[error("Backup '{path}' already exists\nRemove it or choose another --backup-suffix.")]
    BackupExists { path: PathBuf },

    /// Renaming the original document to its backup name failed.
    #[error("Failed to back up '{path}' to '{backup}': {source}")]
    BackupFailed {
        path: PathBuf,
        backup: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The compressor rejected the document source.
    #[error("Failed to compress document source: {0}")]
    CompressionFailed(#[source] std::io::Error),

    // ── Hidden block errors ───────────────────────────────────────────────
    /// The document carries no `encoded_data` block.
    #[error("No encoded data block found; the document was not produced by emd")]
    NoEncodedBlock,

    /// The encoded block exists but has no `markdown` definition.
    #[error("Encoded data block has no [markdown] source definition")]
    MissingSourceDefinition,

    /// A definition payload failed to decode or decompress.
    #[error("Corrupt payload for [{id}]: {detail}")]
    CorruptPayload { id: String, detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A non-fatal error for a single image reference.
///
/// The `Display` text of the two most common variants is the message the
/// user sees on stderr, e.g. `img/a.png not exists.`.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ResolveError {
    /// The resolved path does not name an existing file.
    #[error("{location} not exists.")]
    NotFound { location: String },

    /// The file does not start with the PNG signature.
    #[error("{location} is not in PNG format.")]
    NotPng { location: String },

    /// Reading the file failed.
    #[error("{location} could not be read: {detail}")]
    Io { location: String, detail: String },

    /// Remote location with no fetcher configured.
    #[error("{location} is a remote image; remote fetching is not available.")]
    RemoteUnavailable { location: String },

    /// The configured fetcher returned an error.
    #[error("{location} could not be fetched: {detail}")]
    FetchFailed { location: String, detail: String },

    /// The configured converter could not produce PNG bytes.
    #[error("{location} could not be converted to PNG: {detail}")]
    ConversionFailed { location: String, detail: String },
}

impl ResolveError {
    /// The reference location this failure is about.
    pub fn location(&self) -> &str {
        match self {
            ResolveError::NotFound { location }
            | ResolveError::NotPng { location }
            | ResolveError::Io { location, .. }
            | ResolveError::RemoteUnavailable { location }
            | ResolveError::FetchFailed { location, .. }
            | ResolveError::ConversionFailed { location, .. } => location,
        }
    }
}
