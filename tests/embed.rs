//! Integration tests for embed-markdown.
//!
//! Every test builds its own temporary directory with real Markdown and PNG
//! files, runs the public API, and inspects what lands on disk.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use embed_markdown::pipeline::assemble::{MediaKind, BLOCK_CLOSE, BLOCK_OPEN};
use embed_markdown::pipeline::identify::content_id;
use embed_markdown::{
    embed_all, embed_file, embed_str, extract_source, parse_definitions, DigestAlgorithm,
    EmbedConfig, EmbedProgressCallback, EmdError, FormatPolicy, OutputMode, ResolveError,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Route library logs through the test harness; `RUST_LOG` selects the level.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

const RED_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDRred-pixel";
const BLUE_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDRblue-pixel";

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        let dir = TempDir::new().expect("tempdir");
        std::fs::create_dir(dir.path().join("img")).unwrap();
        std::fs::write(dir.path().join("img/red.png"), RED_PNG).unwrap();
        std::fs::write(dir.path().join("img/red-copy.png"), RED_PNG).unwrap();
        std::fs::write(dir.path().join("img/blue.png"), BLUE_PNG).unwrap();
        std::fs::write(dir.path().join("img/photo.jpg"), b"\xff\xd8\xff\xe0JFIF").unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn write_doc(&self, name: &str, text: &str) -> PathBuf {
        let p = self.dir.path().join(name);
        std::fs::write(&p, text).unwrap();
        p
    }
}

fn id_of(bytes: &[u8]) -> String {
    content_id(bytes, DigestAlgorithm::Sha256).to_string()
}

/// Split assembled output into (body, hidden block).
fn split_output(markdown: &str) -> (&str, &str) {
    let at = markdown.rfind(BLOCK_OPEN).expect("hidden block present");
    (&markdown[..at], &markdown[at..])
}

#[derive(Default)]
struct RecordingCallback {
    failures: Mutex<Vec<String>>,
    errors: Mutex<Vec<PathBuf>>,
}

impl EmbedProgressCallback for RecordingCallback {
    fn on_reference_failed(&self, _path: &Path, error: &ResolveError) {
        self.failures.lock().unwrap().push(error.to_string());
    }

    fn on_document_error(&self, path: &Path, _error: &EmdError) {
        self.errors.lock().unwrap().push(path.to_path_buf());
    }
}

// ── Wrapping and round trips ─────────────────────────────────────────────────

#[test]
fn document_without_images_is_wrapped_unchanged() {
    let fx = Fixture::new();
    let text = "# Title\n\nNo pictures here, just [a link](https://example.org).\n";
    let out = embed_str(text, fx.path(), &EmbedConfig::default()).unwrap();

    let (body, block) = split_output(&out.markdown);
    assert_eq!(body, format!("{text}\n\n"));
    assert!(block.starts_with(&format!("{BLOCK_OPEN}\n\n[markdown]:data:text/plain;base64,")));
    assert!(block.ends_with(BLOCK_CLOSE));
    assert_eq!(out.stats.total_references, 0);
}

#[test]
fn image_payload_round_trips() {
    let fx = Fixture::new();
    let doc = fx.write_doc("doc.md", "Look: ![red](img/red.png)\n");
    let out = embed_file(&doc, &EmbedConfig::default()).unwrap();

    let written = std::fs::read_to_string(&doc).unwrap();
    assert_eq!(written, out.markdown);

    let defs = parse_definitions(&written).unwrap();
    let image = defs.iter().find(|d| d.media == MediaKind::Png).unwrap();
    assert_eq!(image.id, id_of(RED_PNG));
    assert_eq!(STANDARD.decode(&image.payload).unwrap(), RED_PNG);
}

#[test]
fn source_round_trips_exactly() {
    let fx = Fixture::new();
    let original = "# Café ☕\r\n\r\n![red](img/red.png \"Red\")\r\n![gone](nope.png)\r\n\ttrailing  ";
    let doc = fx.write_doc("doc.md", original);
    let out = embed_file(&doc, &EmbedConfig::default()).unwrap();

    assert_eq!(extract_source(&out.markdown).unwrap(), original.as_bytes());
}

#[test]
fn bzip2_packed_source_from_older_release_is_recovered() {
    use bzip2::write::BzEncoder;
    use std::io::Write;

    init_tracing();
    let original = "# Legacy\n\n![red](img/red.png)\n";
    let mut enc = BzEncoder::new(Vec::new(), bzip2::Compression::best());
    enc.write_all(original.as_bytes()).unwrap();
    let packed = STANDARD.encode(enc.finish().unwrap());
    let embedded = format!(
        "# Legacy\n\n![red][ABCDEFGH]\n\n\n{BLOCK_OPEN}\n\n\
         [markdown]:data:text/plain;base64,{packed}\n\n{BLOCK_CLOSE}"
    );

    assert_eq!(extract_source(&embedded).unwrap(), original.as_bytes());
}

#[test]
fn single_reference_rewrites_to_reference_style() {
    let fx = Fixture::new();
    std::fs::write(fx.path().join("x.png"), RED_PNG).unwrap();
    let out = embed_str("![a](x.png)", fx.path(), &EmbedConfig::default()).unwrap();

    let id = id_of(RED_PNG);
    let (body, block) = split_output(&out.markdown);
    assert_eq!(body, format!("![a][{id}]\n\n"));
    assert!(block.contains(&format!(
        "[{id}]:data:image/png;base64,{}",
        STANDARD.encode(RED_PNG)
    )));
}

// ── Deduplication and ordering ───────────────────────────────────────────────

#[test]
fn identical_files_share_one_definition() {
    let fx = Fixture::new();
    let text = "![one](img/red.png) and ![two](img/red-copy.png)";
    let out = embed_str(text, fx.path(), &EmbedConfig::default()).unwrap();

    let id = id_of(RED_PNG);
    assert!(out.markdown.starts_with(&format!("![one][{id}] and ![two][{id}]")));
    assert_eq!(out.markdown.matches(&format!("[{id}]:data:")).count(), 1);
    assert_eq!(out.stats.embedded_references, 2);
    assert_eq!(out.stats.unique_images, 1);
}

#[test]
fn definitions_follow_body_order_after_source() {
    let fx = Fixture::new();
    let text = "![b](img/blue.png) ![r](img/red.png)";
    let out = embed_str(text, fx.path(), &EmbedConfig::default()).unwrap();

    let ids: Vec<String> = parse_definitions(&out.markdown)
        .unwrap()
        .into_iter()
        .map(|d| d.id)
        .collect();
    assert_eq!(ids, vec!["markdown".to_string(), id_of(BLUE_PNG), id_of(RED_PNG)]);
}

// ── Failures ─────────────────────────────────────────────────────────────────

#[test]
fn missing_image_keeps_markup_and_reports_path() {
    let fx = Fixture::new();
    let recorder = Arc::new(RecordingCallback::default());
    let config = EmbedConfig::builder()
        .progress_callback(recorder.clone() as Arc<dyn EmbedProgressCallback>)
        .build()
        .unwrap();

    let text = "before ![lost](img/missing.png) after ![red](img/red.png)";
    let out = embed_str(text, fx.path(), &config).unwrap();

    let (body, _) = split_output(&out.markdown);
    assert!(body.starts_with("before ![lost](img/missing.png) after ![red]["));
    assert_eq!(
        recorder.failures.lock().unwrap().as_slice(),
        ["img/missing.png not exists.".to_string()]
    );
    assert_eq!(out.stats.failed_references, 1);
    assert_eq!(
        out.references[0].error,
        Some(ResolveError::NotFound {
            location: "img/missing.png".into()
        })
    );
}

#[test]
fn non_png_is_rejected_by_default_and_embedded_on_request() {
    let fx = Fixture::new();
    let text = "![p](img/photo.jpg)";

    let out = embed_str(text, fx.path(), &EmbedConfig::default()).unwrap();
    assert!(out.markdown.starts_with("![p](img/photo.jpg)"));
    assert_eq!(
        out.references[0].error.as_ref().unwrap().to_string(),
        "img/photo.jpg is not in PNG format."
    );

    let warn = EmbedConfig::builder()
        .format_policy(FormatPolicy::WarnAndEncode)
        .build()
        .unwrap();
    let out = embed_str(text, fx.path(), &warn).unwrap();
    assert!(out.markdown.starts_with("![p]["));
    assert!(out.references[0].error.is_none());
}

#[test]
fn remote_image_is_left_alone() {
    let fx = Fixture::new();
    let text = "![r](https://example.org/r.png)";
    let out = embed_str(text, fx.path(), &EmbedConfig::default()).unwrap();
    assert!(out.markdown.starts_with(text));
    assert!(matches!(
        out.references[0].error,
        Some(ResolveError::RemoteUnavailable { .. })
    ));
}

#[test]
fn malformed_reference_aborts_document_without_writing() {
    let fx = Fixture::new();
    let original = "![ok](img/red.png) ![bad](img/red.png\")";
    let doc = fx.write_doc("bad.md", original);

    let err = embed_file(&doc, &EmbedConfig::default()).unwrap_err();
    assert!(matches!(err, EmdError::MalformedReference { .. }), "got: {err:?}");
    assert_eq!(std::fs::read_to_string(&doc).unwrap(), original);
    assert!(!fx.path().join("bad.md.bak").exists());
}

// ── Line endings and titles ──────────────────────────────────────────────────

#[test]
fn crlf_documents_get_crlf_separators() {
    let fx = Fixture::new();
    let text = "# T\r\n\r\n![a](img/red.png \"Red\")\r\n![b](img/blue.png)\r\n";
    let out = embed_str(text, fx.path(), &EmbedConfig::default()).unwrap();

    let md = out.markdown.as_bytes();
    for (i, b) in md.iter().enumerate() {
        if *b == b'\n' {
            assert!(i > 0 && md[i - 1] == b'\r', "bare LF at byte {i}");
        }
    }
    assert!(out.markdown.contains(&format!("\r\n\r\n{BLOCK_OPEN}\r\n\r\n")));
}

#[test]
fn title_is_carried_to_definition() {
    let fx = Fixture::new();
    let out = embed_str(
        "![a](img/red.png 'Figure \"1\"')",
        fx.path(),
        &EmbedConfig::default(),
    )
    .unwrap();

    let defs = parse_definitions(&out.markdown).unwrap();
    let image = defs.iter().find(|d| d.media == MediaKind::Png).unwrap();
    assert_eq!(image.title.as_deref(), Some("Figure \"1\""));
}

#[test]
fn digest_choice_changes_identifiers() {
    let fx = Fixture::new();
    let config = EmbedConfig::builder()
        .digest(DigestAlgorithm::Sha512)
        .build()
        .unwrap();
    let out = embed_str("![a](img/red.png)", fx.path(), &config).unwrap();

    let sha512_id = content_id(RED_PNG, DigestAlgorithm::Sha512);
    assert_eq!(out.references[0].id.as_ref(), Some(&sha512_id));
    assert_ne!(sha512_id.to_string(), id_of(RED_PNG));
}

// ── Output modes ─────────────────────────────────────────────────────────────

#[test]
fn in_place_keeps_backup_and_refuses_to_clobber_it() {
    let fx = Fixture::new();
    let original = "![a](img/red.png)\n";
    let doc = fx.write_doc("notes.md", original);

    let out = embed_file(&doc, &EmbedConfig::default()).unwrap();
    let backup = fx.path().join("notes.md.bak");
    assert_eq!(out.backup_path.as_deref(), Some(backup.as_path()));
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), original);
    assert!(std::fs::read_to_string(&doc).unwrap().contains(BLOCK_OPEN));

    let err = embed_file(&doc, &EmbedConfig::default()).unwrap_err();
    assert!(matches!(err, EmdError::BackupExists { .. }), "got: {err:?}");
    assert_eq!(std::fs::read_to_string(&backup).unwrap(), original);
}

#[test]
fn sibling_mode_leaves_original_untouched() {
    let fx = Fixture::new();
    let original = "![a](img/red.png)\n";
    let doc = fx.write_doc("notes.md", original);
    let config = EmbedConfig::builder()
        .output_mode(OutputMode::Sibling)
        .build()
        .unwrap();

    let out = embed_file(&doc, &config).unwrap();
    let sibling = fx.path().join("notes.emd.md");
    assert_eq!(out.output_path.as_deref(), Some(sibling.as_path()));
    assert!(out.backup_path.is_none());
    assert_eq!(std::fs::read_to_string(&doc).unwrap(), original);
    assert_eq!(std::fs::read_to_string(&sibling).unwrap(), out.markdown);
}

// ── Batches ──────────────────────────────────────────────────────────────────

#[test]
fn batch_failures_are_independent() {
    let fx = Fixture::new();
    let missing = fx.path().join("missing.md");
    let good = fx.write_doc("good.md", "![a](img/red.png)\n");
    let recorder = Arc::new(RecordingCallback::default());
    let config = EmbedConfig::builder()
        .output_mode(OutputMode::Sibling)
        .progress_callback(recorder.clone() as Arc<dyn EmbedProgressCallback>)
        .build()
        .unwrap();

    let outcomes = embed_all(&[missing.clone(), good], &config);
    assert_eq!(outcomes.len(), 2);
    assert!(matches!(
        outcomes[0].result,
        Err(EmdError::DocumentNotFound { .. })
    ));
    assert!(outcomes[1].result.is_ok());
    assert!(fx.path().join("good.emd.md").exists());
    assert_eq!(recorder.errors.lock().unwrap().as_slice(), [missing]);
}

#[test]
fn relative_images_resolve_against_document_directory() {
    let fx = Fixture::new();
    std::fs::create_dir(fx.path().join("chapter")).unwrap();
    let doc = fx.write_doc("chapter/one.md", "![a](../img/blue.png)\n");

    let out = embed_file(&doc, &EmbedConfig::default()).unwrap();
    assert_eq!(out.references[0].id.as_ref().map(|i| i.to_string()), Some(id_of(BLUE_PNG)));
}
