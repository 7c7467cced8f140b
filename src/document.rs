//! Document loading and line-ending detection.
//!
//! A [`Document`] is read once, fully, into memory. Its source text is never
//! mutated afterwards; every stage works on borrowed views and the assembler
//! writes into a fresh buffer.

use crate::error::EmdError;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// End-of-line convention of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineEnding {
    /// `\r\n`
    CrLf,
    /// `\n` (default when the document has no line break)
    #[default]
    Lf,
    /// `\r`
    Cr,
}

impl LineEnding {
    /// Detect the convention by first match in priority order `\r\n`, `\n`, `\r`.
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            LineEnding::CrLf
        } else if text.contains('\n') {
            LineEnding::Lf
        } else if text.contains('\r') {
            LineEnding::Cr
        } else {
            LineEnding::default()
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::CrLf => "\r\n",
            LineEnding::Lf => "\n",
            LineEnding::Cr => "\r",
        }
    }
}

/// A Markdown document loaded into memory.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    source: String,
    eol: LineEnding,
    work_dir: PathBuf,
}

impl Document {
    /// Read and decode the document at `path`.
    ///
    /// The path is made absolute (without resolving symlinks) so that
    /// relative image locations resolve against the document's own directory
    /// regardless of the process working directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, EmdError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => EmdError::DocumentNotFound {
                path: path.to_path_buf(),
            },
            ErrorKind::PermissionDenied => EmdError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => EmdError::DocumentReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let source = String::from_utf8(bytes).map_err(|e| EmdError::DocumentNotUtf8 {
            path: path.to_path_buf(),
            offset: e.utf8_error().valid_up_to(),
        })?;

        let abs = std::path::absolute(path).map_err(|e| EmdError::DocumentReadFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        let work_dir = abs
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));

        let doc = Self::from_parts(abs, source, work_dir);
        debug!(
            "Loaded {} ({} bytes, {:?} line endings)",
            doc.path.display(),
            doc.source.len(),
            doc.eol
        );
        Ok(doc)
    }

    /// Build a document from text already in memory.
    ///
    /// `work_dir` is the directory relative image locations resolve against.
    pub fn from_text(source: impl Into<String>, work_dir: impl Into<PathBuf>) -> Self {
        let work_dir = work_dir.into();
        Self::from_parts(work_dir.join("<memory>"), source.into(), work_dir)
    }

    fn from_parts(path: PathBuf, source: String, work_dir: PathBuf) -> Self {
        let eol = LineEnding::detect(&source);
        Self {
            path,
            source,
            eol,
            work_dir,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The raw bytes exactly as loaded.
    pub fn bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn eol(&self) -> LineEnding {
        self.eol
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn detect_priority() {
        assert_eq!(LineEnding::detect("a\r\nb\nc"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("a\nb\rc"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\rb"), LineEnding::Cr);
        assert_eq!(LineEnding::detect("no breaks"), LineEnding::Lf);
        assert_eq!(LineEnding::detect(""), LineEnding::Lf);
    }

    #[test]
    fn load_sets_work_dir_to_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "# Title\r\n").unwrap();

        let doc = Document::load(&path).unwrap();
        assert_eq!(doc.work_dir(), dir.path());
        assert_eq!(doc.eol(), LineEnding::CrLf);
        assert_eq!(doc.bytes(), b"# Title\r\n");
        assert!(doc.path().is_absolute());
    }

    #[test]
    fn load_missing_file() {
        let err = Document::load("/definitely/not/here.md").unwrap_err();
        assert!(matches!(err, EmdError::DocumentNotFound { .. }), "got: {err:?}");
    }

    #[test]
    fn load_rejects_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.md");
        std::fs::write(&path, b"ok \xff\xfe").unwrap();

        match Document::load(&path).unwrap_err() {
            EmdError::DocumentNotUtf8 { offset, .. } => assert_eq!(offset, 3),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
