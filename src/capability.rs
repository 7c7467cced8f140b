//! Optional collaborators the resolver may call through narrow interfaces.
//!
//! Remote fetching and image format conversion are not implemented by this
//! crate. Callers that have an implementation plug it into
//! [`crate::config::EmbedConfig`] as [`Capability::Available`]; everyone else
//! gets [`Capability::Unavailable`] and the resolver records a
//! [`crate::error::ResolveError`] for references that would need it.
//!
//! ```rust
//! use embed_markdown::{Capability, EmbedConfig, RemoteFetch};
//! use std::sync::Arc;
//!
//! struct Offline;
//!
//! impl RemoteFetch for Offline {
//!     fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
//!         Err(format!("offline, cannot fetch {url}"))
//!     }
//! }
//!
//! let config = EmbedConfig::builder()
//!     .fetcher(Arc::new(Offline))
//!     .build()
//!     .unwrap();
//! assert!(config.fetcher.is_available());
//! ```

use std::sync::Arc;

/// Whether an optional collaborator is present.
///
/// Checked once per reference instead of probing for ambient globals.
#[derive(Clone)]
pub enum Capability<T> {
    Unavailable,
    Available(T),
}

impl<T> Default for Capability<T> {
    fn default() -> Self {
        Capability::Unavailable
    }
}

impl<T> Capability<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }

    pub fn get(&self) -> Option<&T> {
        match self {
            Capability::Available(handle) => Some(handle),
            Capability::Unavailable => None,
        }
    }
}

impl<T> std::fmt::Debug for Capability<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Unavailable => f.write_str("Unavailable"),
            Capability::Available(_) => f.write_str("Available(..)"),
        }
    }
}

/// Fetch image bytes for a remote (`http://` / `https://`) location.
pub trait RemoteFetch: Send + Sync {
    /// Return the raw bytes at `url`, or a human-readable reason.
    fn fetch(&self, url: &str) -> Result<Vec<u8>, String>;
}

/// Convert arbitrary image bytes to PNG.
pub trait FormatConvert: Send + Sync {
    /// Return PNG-encoded bytes, or a human-readable reason.
    fn to_png(&self, bytes: &[u8]) -> Result<Vec<u8>, String>;
}

/// Shared handle to a fetcher.
pub type Fetcher = Capability<Arc<dyn RemoteFetch>>;

/// Shared handle to a converter.
pub type Converter = Capability<Arc<dyn FormatConvert>>;
