//! Source directory loader.
//!
//! Walks the configured source directory, classifies each file by
//! extension, and parses supported files into [`SourceDocument`]s.
//!
//! | Pattern | Handling |
//! |---------|----------|
//! | `**/*.txt` | plain text, one document |
//! | `**/*.pdf` | PDF, one document per page |
//! | `**/*.md` | recognised but not yet supported; reported, never parsed |
//! | anything else | ignored |

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{RagError, Result};
use crate::extract;
use crate::models::{SourceDocument, CONTENT_TYPE_PDF, CONTENT_TYPE_TEXT};

/// A file found under the source directory.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the source root, with `/` separators.
    pub relative: String,
    pub kind: FileKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileKind {
    Supported { content_type: &'static str },
    Unsupported,
}

/// Enumerate recognised files under `root`, sorted by relative path.
///
/// A missing root is a configuration error; an empty root yields an empty list.
pub fn scan_directory(root: &Path) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        return Err(RagError::config(format!(
            "source directory does not exist: {}",
            root.display()
        )));
    }

    let text_set = build_globset(&["**/*.txt"])?;
    let pdf_set = build_globset(&["**/*.pdf"])?;
    let unsupported_set = build_globset(&["**/*.md", "**/*.markdown"])?;

    let mut files = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| RagError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let kind = if text_set.is_match(&rel_str) {
            FileKind::Supported {
                content_type: CONTENT_TYPE_TEXT,
            }
        } else if pdf_set.is_match(&rel_str) {
            FileKind::Supported {
                content_type: CONTENT_TYPE_PDF,
            }
        } else if unsupported_set.is_match(&rel_str) {
            FileKind::Unsupported
        } else {
            continue;
        };

        files.push(SourceFile {
            path: path.to_path_buf(),
            relative: rel_str,
            kind,
        });
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.relative.cmp(&b.relative));

    Ok(files)
}

/// Parse one supported file into documents.
///
/// Extraction failures are reported as [`RagError::Parse`] naming the file.
pub fn load_file(file: &SourceFile) -> Result<Vec<SourceDocument>> {
    let content_type = match file.kind {
        FileKind::Supported { content_type } => content_type,
        FileKind::Unsupported => {
            return Err(RagError::Parse {
                path: file.path.clone(),
                message: "file type is not supported".to_string(),
            })
        }
    };

    let bytes = std::fs::read(&file.path)?;
    let pages = extract::extract_pages(&bytes, content_type).map_err(|e| RagError::Parse {
        path: file.path.clone(),
        message: e.to_string(),
    })?;

    let title = file
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string());

    Ok(pages
        .into_iter()
        .map(|p| SourceDocument {
            source: file.relative.clone(),
            title: title.clone(),
            page: p.page,
            content_type: content_type.to_string(),
            body: p.text,
        })
        .collect())
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(false)
            .build()
            .map_err(|e| RagError::config(e.to_string()))?;
        builder.add(glob);
    }
    builder.build().map_err(|e| RagError::config(e.to_string()))
}
