//! Payload resolution: location → PNG bytes → identifier + base64 payload.
//!
//! Rules, in order:
//!
//! 1. `http://` / `https://` locations go to the fetch capability; without
//!    one they fail immediately.
//! 2. Absolute paths are used as-is, relative ones are joined to the
//!    document's directory.
//! 3. A path that is not an existing file fails with `"<location> not exists."`.
//! 4. The file is read in full; I/O errors become failures naming the location.
//! 5. Bytes without the PNG signature go to the conversion capability when
//!    present, otherwise [`FormatPolicy`] decides.
//!
//! Nothing here returns `Err`: every failure is a [`ResolveError`] stored in
//! [`Resolution::Failed`], so one bad image never stops the document.

use crate::capability::{Converter, Fetcher};
use crate::config::{DigestAlgorithm, EmbedConfig, FormatPolicy};
use crate::error::ResolveError;
use crate::pipeline::identify::{content_id, ContentId};
use crate::pipeline::parse::ParsedReference;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Leading bytes every PNG file starts with.
pub const PNG_SIGNATURE: &[u8; 4] = b"\x89PNG";

/// A successfully encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub id: ContentId,
    /// Standard base64 of the raw PNG bytes.
    pub payload: String,
}

/// Outcome of resolving one reference. Exactly one of the two holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Embedded(EmbeddedImage),
    Failed(ResolveError),
}

impl Resolution {
    pub fn embedded(&self) -> Option<&EmbeddedImage> {
        match self {
            Resolution::Embedded(img) => Some(img),
            Resolution::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ResolveError> {
        match self {
            Resolution::Failed(e) => Some(e),
            Resolution::Embedded(_) => None,
        }
    }
}

/// A parsed reference together with its resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub reference: ParsedReference,
    pub resolution: Resolution,
}

/// Check if a location names a remote resource.
pub fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

/// Resolves references of one document.
pub struct Resolver<'a> {
    work_dir: &'a Path,
    digest: DigestAlgorithm,
    format_policy: FormatPolicy,
    fetcher: &'a Fetcher,
    converter: &'a Converter,
}

impl<'a> Resolver<'a> {
    pub fn new(work_dir: &'a Path, config: &'a EmbedConfig) -> Self {
        Self {
            work_dir,
            digest: config.digest,
            format_policy: config.format_policy,
            fetcher: &config.fetcher,
            converter: &config.converter,
        }
    }

    /// Resolve one reference. Failures are logged as they happen.
    pub fn resolve(&self, reference: ParsedReference) -> ResolvedReference {
        let resolution = match self.load_png(&reference.location) {
            Ok(bytes) => {
                let id = content_id(&bytes, self.digest);
                let payload = STANDARD.encode(&bytes);
                debug!(
                    "Embedded {} as [{}] ({} bytes)",
                    reference.location,
                    id,
                    bytes.len()
                );
                Resolution::Embedded(EmbeddedImage { id, payload })
            }
            Err(e) => {
                warn!("{e}");
                Resolution::Failed(e)
            }
        };
        ResolvedReference {
            reference,
            resolution,
        }
    }

    fn load_png(&self, location: &str) -> Result<Vec<u8>, ResolveError> {
        let bytes = if is_remote(location) {
            self.fetch(location)?
        } else {
            self.read_local(location)?
        };
        self.ensure_png(location, bytes)
    }

    fn fetch(&self, location: &str) -> Result<Vec<u8>, ResolveError> {
        let fetcher = self.fetcher.get().ok_or_else(|| ResolveError::RemoteUnavailable {
            location: location.to_string(),
        })?;
        fetcher.fetch(location).map_err(|detail| ResolveError::FetchFailed {
            location: location.to_string(),
            detail,
        })
    }

    fn read_local(&self, location: &str) -> Result<Vec<u8>, ResolveError> {
        let path = self.local_path(location);
        if !path.is_file() {
            return Err(ResolveError::NotFound {
                location: location.to_string(),
            });
        }
        std::fs::read(&path).map_err(|e| ResolveError::Io {
            location: location.to_string(),
            detail: e.to_string(),
        })
    }

    fn local_path(&self, location: &str) -> PathBuf {
        let p = Path::new(location);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.work_dir.join(p)
        }
    }

    fn ensure_png(&self, location: &str, bytes: Vec<u8>) -> Result<Vec<u8>, ResolveError> {
        if bytes.starts_with(PNG_SIGNATURE) {
            return Ok(bytes);
        }

        if let Some(converter) = self.converter.get() {
            let converted =
                converter
                    .to_png(&bytes)
                    .map_err(|detail| ResolveError::ConversionFailed {
                        location: location.to_string(),
                        detail,
                    })?;
            if !converted.starts_with(PNG_SIGNATURE) {
                return Err(ResolveError::ConversionFailed {
                    location: location.to_string(),
                    detail: "converter output lacks the PNG signature".to_string(),
                });
            }
            return Ok(converted);
        }

        let not_png = ResolveError::NotPng {
            location: location.to_string(),
        };
        match self.format_policy {
            FormatPolicy::Reject => Err(not_png),
            FormatPolicy::WarnAndEncode => {
                warn!("{not_png} Embedding anyway.");
                Ok(bytes)
            }
        }
    }
}
