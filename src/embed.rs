//! Embedding entry points.
//!
//! [`embed_document`] is the pure core: it takes a loaded [`Document`] and
//! returns the assembled Markdown without touching the file system beyond
//! reading image files. [`embed_file`] adds loading and writing, and
//! [`embed_all`] runs a batch sequentially, isolating each document's
//! outcome from the others.

use crate::config::{EmbedConfig, OutputMode};
use crate::document::Document;
use crate::error::EmdError;
use crate::output::{EmbedOutput, EmbedStats, ReferenceReport};
use crate::pipeline::assemble::{assemble, image_definitions, ReferenceDefinition};
use crate::pipeline::pack::pack_source;
use crate::pipeline::parse::{parse_reference, ParsedReference};
use crate::pipeline::resolve::{ResolvedReference, Resolver};
use crate::pipeline::scan::scan;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// Embed the images referenced by Markdown text held in memory.
///
/// Relative image locations resolve against `work_dir`. Nothing is written.
///
/// # Example
/// ```rust
/// use embed_markdown::{embed_str, EmbedConfig};
///
/// let out = embed_str("# No images\n", "/tmp", &EmbedConfig::default()).unwrap();
/// assert!(out.markdown.starts_with("# No images\n\n\n<div id=\"encoded_data\""));
/// ```
pub fn embed_str(
    source: &str,
    work_dir: impl AsRef<Path>,
    config: &EmbedConfig,
) -> Result<EmbedOutput, EmdError> {
    let doc = Document::from_text(source, work_dir.as_ref());
    embed_document(&doc, config)
}

/// Embed the images referenced by a loaded document.
///
/// # Errors
/// Returns `Err(EmdError)` only for fatal problems:
/// - an image reference with an unmatched closing quote
/// - compression failure
///
/// Missing or unreadable images are reported in
/// [`EmbedOutput::references`] and leave their markup untouched.
pub fn embed_document(doc: &Document, config: &EmbedConfig) -> Result<EmbedOutput, EmdError> {
    let start = Instant::now();

    // ── Step 1: Scan ─────────────────────────────────────────────────────
    let scanned = scan(doc.source());
    debug!("Found {} image references", scanned.tokens.len());

    // ── Step 2: Parse (fatal on structural errors) ───────────────────────
    let parsed = scanned
        .tokens
        .iter()
        .map(|token| parse_reference(token))
        .collect::<Result<Vec<ParsedReference>, EmdError>>()?;

    // ── Step 3: Resolve + identify ───────────────────────────────────────
    let resolver = Resolver::new(doc.work_dir(), config);
    let resolved: Vec<ResolvedReference> = parsed
        .into_iter()
        .map(|reference| {
            let r = resolver.resolve(reference);
            if let (Some(cb), Some(e)) = (&config.progress_callback, r.resolution.error()) {
                cb.on_reference_failed(doc.path(), e);
            }
            r
        })
        .collect();

    // ── Step 4: Pack source ──────────────────────────────────────────────
    let packed = pack_source(doc.bytes(), config.compression_level)?;

    // ── Step 5: Assemble ─────────────────────────────────────────────────
    let markdown = assemble(
        &scanned,
        &resolved,
        ReferenceDefinition::source(packed),
        doc.eol(),
    );

    let references: Vec<ReferenceReport> = resolved.iter().map(ReferenceReport::from).collect();
    let embedded = references.iter().filter(|r| r.id.is_some()).count();
    let stats = EmbedStats {
        total_references: references.len(),
        embedded_references: embedded,
        failed_references: references.len() - embedded,
        unique_images: image_definitions(&resolved).len(),
        source_bytes: doc.bytes().len(),
        output_bytes: markdown.len(),
        line_ending: doc.eol(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    Ok(EmbedOutput {
        markdown,
        references,
        stats,
        output_path: None,
        backup_path: None,
    })
}

/// Load, embed and write one document according to `config.output_mode`.
///
/// * [`OutputMode::InPlace`] — the original is renamed to
///   `<path><backup_suffix>` and the output takes its place. An existing
///   backup is never overwritten.
/// * [`OutputMode::Sibling`] — the output goes to `name.emd.md`.
///
/// The output is first written to a temporary sibling and then renamed, so
/// a failed write never leaves a truncated document behind.
pub fn embed_file(path: impl AsRef<Path>, config: &EmbedConfig) -> Result<EmbedOutput, EmdError> {
    let path = path.as_ref();
    info!("Embedding images into {}", path.display());

    let doc = Document::load(path)?;
    let mut output = embed_document(&doc, config)?;

    let (written, backup) = write_output(doc.path(), &output.markdown, config)?;
    info!(
        "Embedded {}/{} images → {}",
        output.stats.embedded_references,
        output.stats.total_references,
        written.display()
    );

    output.output_path = Some(written);
    output.backup_path = backup;
    Ok(output)
}

/// Outcome of one document in a batch.
#[derive(Debug)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    pub result: Result<EmbedOutput, EmdError>,
}

/// Embed every document in `paths`, strictly in order.
///
/// A fatal error for one document is logged, reported to the progress
/// callback, and stored in its [`DocumentOutcome`]; the remaining documents
/// are still processed.
pub fn embed_all<P: AsRef<Path>>(paths: &[P], config: &EmbedConfig) -> Vec<DocumentOutcome> {
    let total = paths.len();
    let cb = config.progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_batch_start(total);
    }

    let mut outcomes = Vec::with_capacity(total);
    for (i, path) in paths.iter().enumerate() {
        let path = path.as_ref();
        if let Some(cb) = cb {
            cb.on_document_start(path, i + 1, total);
        }

        let result = embed_file(path, config);
        match &result {
            Ok(output) => {
                if let Some(cb) = cb {
                    cb.on_document_complete(path, &output.stats);
                }
            }
            Err(e) => {
                error!("{}: {}", path.display(), e);
                if let Some(cb) = cb {
                    cb.on_document_error(path, e);
                }
            }
        }
        outcomes.push(DocumentOutcome {
            path: path.to_path_buf(),
            result,
        });
    }

    if let Some(cb) = cb {
        let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        cb.on_batch_complete(total, succeeded);
    }
    outcomes
}

/// `notes.md` + `.bak` → `notes.md.bak`.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    append_to_path(path, suffix)
}

/// `notes.md` + `emd` → `notes.emd.md`; `README` + `emd` → `README.emd`.
pub fn sibling_path(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::new();
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(original_ext)) => {
            name.push(stem);
            name.push(".");
            name.push(ext);
            name.push(".");
            name.push(original_ext);
        }
        _ => {
            if let Some(file_name) = path.file_name() {
                name.push(file_name);
            }
            name.push(".");
            name.push(ext);
        }
    }
    path.with_file_name(name)
}

fn append_to_path(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// Write `markdown` for the document at `path`; returns (output, backup).
fn write_output(
    path: &Path,
    markdown: &str,
    config: &EmbedConfig,
) -> Result<(PathBuf, Option<PathBuf>), EmdError> {
    let target = match config.output_mode {
        OutputMode::InPlace => path.to_path_buf(),
        OutputMode::Sibling => sibling_path(path, &config.sibling_extension),
    };
    let write_failed = |source| EmdError::OutputWriteFailed {
        path: target.clone(),
        source,
    };

    let backup = match config.output_mode {
        OutputMode::InPlace => {
            let backup = backup_path(path, &config.backup_suffix);
            if backup.exists() {
                return Err(EmdError::BackupExists { path: backup });
            }
            Some(backup)
        }
        OutputMode::Sibling => None,
    };

    let tmp_path = append_to_path(&target, ".emd-tmp");
    std::fs::write(&tmp_path, markdown).map_err(write_failed)?;

    if let Some(ref backup) = backup {
        if let Err(source) = std::fs::rename(path, backup) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(EmdError::BackupFailed {
                path: path.to_path_buf(),
                backup: backup.clone(),
                source,
            });
        }
        debug!("Backed up original to {}", backup.display());
    }

    std::fs::rename(&tmp_path, &target).map_err(write_failed)?;
    Ok((target, backup))
}
