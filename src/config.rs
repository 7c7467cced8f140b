//! Configuration types for embedding images into Markdown.
//!
//! All embedding behaviour is controlled through [`EmbedConfig`], built via
//! its [`EmbedConfigBuilder`]. The two policy choices that differ between
//! historic versions of the tool (digest algorithm, what to do with a
//! non-PNG file) are plain fields here rather than separate code paths.

use crate::capability::{Capability, Converter, Fetcher, FormatConvert, RemoteFetch};
use crate::error::EmdError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for embedding one or more Markdown documents.
///
/// Built via [`EmbedConfig::builder()`] or using [`EmbedConfig::default()`].
///
/// # Example
/// ```rust
/// use embed_markdown::{DigestAlgorithm, EmbedConfig, OutputMode};
///
/// let config = EmbedConfig::builder()
///     .digest(DigestAlgorithm::Sha512)
///     .output_mode(OutputMode::Sibling)
///     .build()
///     .unwrap();
/// assert_eq!(config.compression_level, 9);
/// ```
#[derive(Clone)]
pub struct EmbedConfig {
    /// Digest used to derive content identifiers. Default: SHA-256.
    pub digest: DigestAlgorithm,

    /// What to do with a file that lacks the PNG signature. Default: reject.
    ///
    /// Embedding a JPEG under an `image/png` data URI produces a mislabeled
    /// image that some editors refuse to render, so the reference is left
    /// untouched unless [`FormatPolicy::WarnAndEncode`] is chosen.
    pub format_policy: FormatPolicy,

    /// Where the assembled document is written. Default: in place.
    pub output_mode: OutputMode,

    /// Suffix appended to the original path for the in-place backup. Default: `.bak`.
    pub backup_suffix: String,

    /// Extension segment inserted for sibling output. Default: `emd`
    /// (`notes.md` → `notes.emd.md`).
    pub sibling_extension: String,

    /// zlib level for the embedded source, 0–9. Default: 9.
    pub compression_level: u32,

    /// Remote fetch collaborator. Default: unavailable.
    pub fetcher: Fetcher,

    /// PNG conversion collaborator. Default: unavailable.
    pub converter: Converter,

    /// Optional progress callback for per-document and per-reference events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            digest: DigestAlgorithm::default(),
            format_policy: FormatPolicy::default(),
            output_mode: OutputMode::default(),
            backup_suffix: ".bak".to_string(),
            sibling_extension: "emd".to_string(),
            compression_level: 9,
            fetcher: Capability::Unavailable,
            converter: Capability::Unavailable,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for EmbedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbedConfig")
            .field("digest", &self.digest)
            .field("format_policy", &self.format_policy)
            .field("output_mode", &self.output_mode)
            .field("backup_suffix", &self.backup_suffix)
            .field("sibling_extension", &self.sibling_extension)
            .field("compression_level", &self.compression_level)
            .field("fetcher", &self.fetcher)
            .field("converter", &self.converter)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn EmbedProgressCallback>"),
            )
            .finish()
    }
}

impl EmbedConfig {
    /// Create a new builder for `EmbedConfig`.
    pub fn builder() -> EmbedConfigBuilder {
        EmbedConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`EmbedConfig`].
#[derive(Debug)]
pub struct EmbedConfigBuilder {
    config: EmbedConfig,
}

impl EmbedConfigBuilder {
    pub fn digest(mut self, digest: DigestAlgorithm) -> Self {
        self.config.digest = digest;
        self
    }

    pub fn format_policy(mut self, policy: FormatPolicy) -> Self {
        self.config.format_policy = policy;
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.config.output_mode = mode;
        self
    }

    pub fn backup_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.backup_suffix = suffix.into();
        self
    }

    pub fn sibling_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.sibling_extension = ext.into();
        self
    }

    pub fn compression_level(mut self, level: u32) -> Self {
        self.config.compression_level = level;
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn RemoteFetch>) -> Self {
        self.config.fetcher = Capability::Available(fetcher);
        self
    }

    pub fn converter(mut self, converter: Arc<dyn FormatConvert>) -> Self {
        self.config.converter = Capability::Available(converter);
        self
    }

    /// Inject a progress callback.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<EmbedConfig, EmdError> {
        let c = &self.config;
        if c.compression_level > 9 {
            return Err(EmdError::InvalidConfig(format!(
                "Compression level must be 0–9, got {}",
                c.compression_level
            )));
        }
        if c.backup_suffix.is_empty() {
            return Err(EmdError::InvalidConfig(
                "Backup suffix must not be empty".into(),
            ));
        }
        if c.sibling_extension.is_empty() || c.sibling_extension.contains(['/', '\\']) {
            return Err(EmdError::InvalidConfig(format!(
                "Sibling extension must be a plain name, got {:?}",
                c.sibling_extension
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Digest algorithm behind [`crate::pipeline::identify::ContentId`].
///
/// Only the first 8 base-32 characters are kept, so both choices yield
/// identifiers of the same shape. Changing the algorithm changes every
/// identifier in newly embedded documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

/// Handling of files whose bytes do not start with the PNG signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatPolicy {
    /// Record a resolution failure and keep the original markup. (default)
    #[default]
    Reject,
    /// Log a warning and embed the bytes under `image/png` anyway.
    WarnAndEncode,
}

/// Where the embedded document goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Rename the original to `<path><backup_suffix>` and write the output
    /// to the original path. (default)
    #[default]
    InPlace,
    /// Leave the original alone and write `name.<sibling_extension>.ext`.
    Sibling,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = EmbedConfig::default();
        assert_eq!(c.digest, DigestAlgorithm::Sha256);
        assert_eq!(c.format_policy, FormatPolicy::Reject);
        assert_eq!(c.output_mode, OutputMode::InPlace);
        assert_eq!(c.backup_suffix, ".bak");
        assert_eq!(c.sibling_extension, "emd");
        assert!(!c.fetcher.is_available());
        assert!(!c.converter.is_available());
    }

    #[test]
    fn rejects_out_of_range_level() {
        let err = EmbedConfig::builder().compression_level(12).build().unwrap_err();
        assert!(err.to_string().contains("0–9"), "got: {err}");
    }

    #[test]
    fn rejects_empty_backup_suffix() {
        assert!(EmbedConfig::builder().backup_suffix("").build().is_err());
    }

    #[test]
    fn rejects_sibling_extension_with_separator() {
        assert!(EmbedConfig::builder()
            .sibling_extension("a/b")
            .build()
            .is_err());
    }

    #[test]
    fn policy_enums_serialise_lowercase() {
        assert_eq!(
            serde_json::to_string(&FormatPolicy::WarnAndEncode).unwrap(),
            "\"warn_and_encode\""
        );
        assert_eq!(
            serde_json::to_string(&DigestAlgorithm::Sha512).unwrap(),
            "\"sha512\""
        );
    }

    #[test]
    fn debug_hides_trait_objects() {
        let dbg = format!("{:?}", EmbedConfig::default());
        assert!(dbg.contains("fetcher: Unavailable"), "got: {dbg}");
    }
}
