//! Progress-callback trait for per-document embedding events.
//!
//! Inject an [`Arc<dyn EmbedProgressCallback>`] via
//! [`crate::config::EmbedConfigBuilder::progress_callback`] to receive
//! events as [`crate::embed::embed_all`] walks a batch of documents. The CLI
//! uses it to drive a progress bar and to print every resolution failure the
//! moment it happens.
//!
//! # Example
//!
//! ```rust
//! use embed_markdown::{EmbedConfig, EmbedProgressCallback, ResolveError};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     failures: AtomicUsize,
//! }
//!
//! impl EmbedProgressCallback for CountingCallback {
//!     fn on_reference_failed(&self, path: &Path, error: &ResolveError) {
//!         self.failures.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}: {}", path.display(), error);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { failures: AtomicUsize::new(0) });
//!
//! let config = EmbedConfig::builder()
//!     .progress_callback(counter as Arc<dyn EmbedProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::{EmdError, ResolveError};
use crate::output::EmbedStats;
use std::path::Path;
use std::sync::Arc;

/// Called by the embedding pipeline as it processes documents.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Events arrive sequentially on the calling thread.
pub trait EmbedProgressCallback: Send + Sync {
    /// Called once before the first document of a batch.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called before a document is loaded.
    ///
    /// # Arguments
    /// * `path`  — document path as supplied by the caller
    /// * `index` — 1-indexed position in the batch
    /// * `total` — batch size
    fn on_document_start(&self, path: &Path, index: usize, total: usize) {
        let _ = (path, index, total);
    }

    /// Called when an image reference could not be embedded.
    fn on_reference_failed(&self, path: &Path, error: &ResolveError) {
        let _ = (path, error);
    }

    /// Called when a document was embedded and written.
    fn on_document_complete(&self, path: &Path, stats: &EmbedStats) {
        let _ = (path, stats);
    }

    /// Called when a document failed fatally and was skipped.
    fn on_document_error(&self, path: &Path, error: &EmdError) {
        let _ = (path, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        let _ = (total_documents, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl EmbedProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::EmbedConfig`].
pub type ProgressCallback = Arc<dyn EmbedProgressCallback>;
