//! CLI binary for embed-markdown.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `EmbedConfig` and prints results.

use anyhow::{bail, Context, Result};
use clap::Parser;
use embed_markdown::{
    embed_all, embed_document, extract_source, DigestAlgorithm, Document, EmbedConfig,
    EmbedOutput, EmbedProgressCallback, EmbedStats, EmdError, FormatPolicy, OutputMode,
    ProgressCallback, ResolveError,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a bar over documents plus one log line per
/// document and per failed image reference, printed as they happen.
struct CliProgressCallback {
    bar: ProgressBar,
    failed_references: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Embedding");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            failed_references: AtomicUsize::new(0),
        })
    }
}

impl EmbedProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_documents: usize) {
        self.bar.set_length(total_documents as u64);
    }

    fn on_document_start(&self, path: &Path, _index: usize, _total: usize) {
        self.bar.set_message(path.display().to_string());
    }

    fn on_reference_failed(&self, path: &Path, error: &ResolveError) {
        self.failed_references.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {}  {}",
            yellow("!"),
            dim(&path.display().to_string()),
            error
        ));
    }

    fn on_document_complete(&self, path: &Path, stats: &EmbedStats) {
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            path.display(),
            dim(&format!(
                "{}/{} images  {} → {} bytes",
                stats.embedded_references,
                stats.total_references,
                stats.source_bytes,
                stats.output_bytes
            )),
        ));
        self.bar.inc(1);
    }

    fn on_document_error(&self, path: &Path, error: &EmdError) {
        self.bar.println(format!(
            "  {} {}  {}",
            red("✗"),
            path.display(),
            red(&error.to_string())
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_documents: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_documents.saturating_sub(success_count);
        let skipped_refs = self.failed_references.load(Ordering::SeqCst);

        if failed == 0 {
            eprintln!(
                "{} {} files embedded{}",
                green("✔"),
                bold(&success_count.to_string()),
                if skipped_refs > 0 {
                    format!("  ({skipped_refs} images left as links)")
                } else {
                    String::new()
                }
            );
        } else {
            eprintln!(
                "{} {}/{} files embedded  ({} failed)",
                red("✘"),
                bold(&success_count.to_string()),
                total_documents,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Embed in place (original kept as notes.md.bak)
  emd notes.md

  # Write notes.emd.md next to the original instead
  emd --sibling notes.md

  # Several documents; each one succeeds or fails on its own
  emd docs/*.md

  # Preview without writing anything
  emd --dry-run notes.md | less

  # Get the original source back out of an embedded document
  emd --extract-source notes.md > notes.orig.md

OUTPUT FORMAT:
  Images become ![alt][ID] and a hidden block is appended:

    <div id="encoded_data" style="display: none;">

    [markdown]:data:text/plain;base64,<zlib-compressed source>

    [ID]:data:image/png;base64,<png bytes> "optional title"

    </div>

  ID is the first 8 base-32 characters of the image's digest, so identical
  files share one definition. Missing or non-PNG images keep their original
  markup and are reported on stderr.

ENVIRONMENT VARIABLES:
  RUST_LOG   Override the log filter (e.g. RUST_LOG=embed_markdown=debug)
"#;

/// Inline local PNG images into Markdown documents.
#[derive(Parser, Debug)]
#[command(
    name = "emd",
    version,
    about = "Inline local PNG images into Markdown documents as base64 data URIs",
    long_about = "Rewrite every local PNG image reference in a Markdown document to point at a \
base64 data URI stored in a hidden block at the end of the document, together with the \
compressed original source. The result is a single file with no external dependencies.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown documents to embed.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Write name.emd.md next to each input instead of embedding in place.
    #[arg(long, env = "EMD_SIBLING")]
    sibling: bool,

    /// Suffix for the backup of an in-place embedded document.
    #[arg(long, env = "EMD_BACKUP_SUFFIX", default_value = ".bak")]
    backup_suffix: String,

    /// Digest behind image identifiers: sha256, sha512.
    #[arg(long, env = "EMD_DIGEST", value_enum, default_value = "sha256")]
    digest: DigestArg,

    /// Non-PNG images: reject (keep the link) or warn (embed anyway).
    #[arg(long, env = "EMD_FORMAT_POLICY", value_enum, default_value = "reject")]
    format_policy: PolicyArg,

    /// zlib level for the embedded source (0–9).
    #[arg(long, env = "EMD_LEVEL", default_value_t = 9,
          value_parser = clap::value_parser!(u32).range(0..=9))]
    level: u32,

    /// Print the embedded Markdown to stdout; write nothing.
    #[arg(long)]
    dry_run: bool,

    /// Print the original source recovered from embedded documents.
    #[arg(long, conflicts_with = "dry_run")]
    extract_source: bool,

    /// Output structured JSON reports instead of Markdown / summaries.
    #[arg(long, env = "EMD_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "EMD_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "EMD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "EMD_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum DigestArg {
    Sha256,
    Sha512,
}

impl From<DigestArg> for DigestAlgorithm {
    fn from(v: DigestArg) -> Self {
        match v {
            DigestArg::Sha256 => DigestAlgorithm::Sha256,
            DigestArg::Sha512 => DigestAlgorithm::Sha512,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum PolicyArg {
    Reject,
    Warn,
}

impl From<PolicyArg> for FormatPolicy {
    fn from(v: PolicyArg) -> Self {
        match v {
            PolicyArg::Reject => FormatPolicy::Reject,
            PolicyArg::Warn => FormatPolicy::WarnAndEncode,
        }
    }
}

/// One line of `--json` output.
#[derive(Serialize)]
struct JsonOutcome<'a> {
    path: &'a Path,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a EmbedOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar prints every failure itself; library logs would
    // only duplicate them.
    let show_progress = !cli.quiet
        && !cli.no_progress
        && !cli.json
        && !cli.dry_run
        && !cli.extract_source;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Extract-source mode ──────────────────────────────────────────────
    if cli.extract_source {
        return run_extract(&cli.inputs);
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn EmbedProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    if cli.dry_run {
        return run_dry(&cli, &config);
    }

    // ── Run embedding ────────────────────────────────────────────────────
    let outcomes = embed_all(&cli.inputs, &config);
    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();

    if cli.json {
        let lines: Vec<JsonOutcome<'_>> = outcomes
            .iter()
            .map(|o| JsonOutcome {
                path: &o.path,
                output: o.result.as_ref().ok(),
                error: o.result.as_ref().err().map(|e| e.to_string()),
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&lines).context("Failed to serialise reports")?
        );
    } else if !cli.quiet && !show_progress {
        for o in &outcomes {
            match &o.result {
                Ok(out) => eprintln!(
                    "{} → {}  ({}/{} images embedded)",
                    o.path.display(),
                    out.output_path
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    out.stats.embedded_references,
                    out.stats.total_references,
                ),
                Err(e) => eprintln!("{}: {}", o.path.display(), e),
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} documents failed", outcomes.len());
    }
    Ok(())
}

/// Map CLI args to `EmbedConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<EmbedConfig> {
    let mut builder = EmbedConfig::builder()
        .digest(cli.digest.clone().into())
        .format_policy(cli.format_policy.clone().into())
        .output_mode(if cli.sibling {
            OutputMode::Sibling
        } else {
            OutputMode::InPlace
        })
        .backup_suffix(cli.backup_suffix.clone())
        .compression_level(cli.level);

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// `--dry-run`: embed in memory and print to stdout.
fn run_dry(cli: &Cli, config: &EmbedConfig) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let mut failed = 0usize;

    for path in &cli.inputs {
        let result = Document::load(path).and_then(|doc| embed_document(&doc, config));
        match result {
            Ok(out) if cli.json => {
                let line = JsonOutcome {
                    path,
                    output: Some(&out),
                    error: None,
                };
                let json =
                    serde_json::to_string_pretty(&line).context("Failed to serialise report")?;
                writeln!(handle, "{json}").context("Failed to write to stdout")?;
            }
            Ok(out) => {
                handle
                    .write_all(out.markdown.as_bytes())
                    .context("Failed to write to stdout")?;
                if !out.markdown.ends_with('\n') {
                    handle.write_all(b"\n").ok();
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: {}", path.display(), e);
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} documents failed", cli.inputs.len());
    }
    Ok(())
}

/// `--extract-source`: print the original Markdown of embedded documents.
fn run_extract(inputs: &[PathBuf]) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    for path in inputs {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let source = extract_source(&text)
            .with_context(|| format!("Failed to recover source from {}", path.display()))?;
        handle
            .write_all(&source)
            .context("Failed to write to stdout")?;
    }
    Ok(())
}
