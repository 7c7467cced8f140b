//! # embed-markdown
//!
//! Turn a Markdown document that references local PNG files into a single
//! self-contained document.
//!
//! Every `![alt](path.png)` is rewritten to reference-style `![alt][ID]`,
//! and a hidden block at the end of the document carries one
//! `[ID]:data:image/png;base64,…` definition per distinct image plus the
//! zlib-compressed original source, so the transformation can be reversed.
//! The result survives copying, emailing, and pasting into editors that
//! resolve relative image paths poorly.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Load      read fully, detect \r\n / \n / \r
//!  ├─ 2. Scan      split into literal segments and ![..](..) tokens
//!  ├─ 3. Parse     alt-text, location, optional title
//!  ├─ 4. Resolve   file bytes, PNG signature check (failures are non-fatal)
//!  ├─ 5. Identify  digest → base-32 → 8 characters
//!  ├─ 6. Pack      zlib + base64 of the original source
//!  └─ 7. Assemble  rewritten body + hidden definition block
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use embed_markdown::{embed_file, EmbedConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let output = embed_file("notes.md", &EmbedConfig::default())?;
//!     eprintln!(
//!         "embedded {}/{} images, backup at {:?}",
//!         output.stats.embedded_references,
//!         output.stats.total_references,
//!         output.backup_path,
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `emd` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod capability;
pub mod config;
pub mod document;
pub mod embed;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod recover;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use capability::{Capability, FormatConvert, RemoteFetch};
pub use config::{DigestAlgorithm, EmbedConfig, EmbedConfigBuilder, FormatPolicy, OutputMode};
pub use document::{Document, LineEnding};
pub use embed::{embed_all, embed_document, embed_file, embed_str, DocumentOutcome};
pub use error::{EmdError, ResolveError};
pub use output::{EmbedOutput, EmbedStats, ReferenceReport};
pub use pipeline::identify::ContentId;
pub use progress::{EmbedProgressCallback, NoopProgressCallback, ProgressCallback};
pub use recover::{extract_source, parse_definitions};
