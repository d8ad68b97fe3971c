//! Snippet hashing and re-verification
//!
//! This module computes content hashes for cited line ranges and re-checks
//! them against the files on disk.
//!
//! # Design Decisions (v1)
//!
//! - **Per-line trim**: every cited line is trimmed before hashing, both when
//!   a hash is first computed and when it is re-verified.
//! - **Truncated digest**: SHA-256, hex encoded, first 12 characters.
//! - **Honest failure**: unreadable files, out-of-range lines and paths that
//!   escape the repository root simply fail verification; they never error.

use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};

use super::types::{EvidenceAnchor, FileExistsAnchor, SnippetAnchor};

/// Number of hex characters kept from the SHA-256 digest
pub const HASH_LEN: usize = 12;

/// Outcome of checking one anchor against a repository checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorCheck {
    /// Content reproduces the stored hash (or the file exists)
    Valid,
    /// File exists but the cited lines hash differently
    Stale,
    /// Cited line range lies beyond the end of the file
    OutOfRange,
    /// File is absent, unreadable, or outside the repository root
    Missing,
}

impl AnchorCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorCheck::Valid => "valid",
            AnchorCheck::Stale => "stale",
            AnchorCheck::OutOfRange => "out_of_range",
            AnchorCheck::Missing => "missing",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, AnchorCheck::Valid)
    }
}

/// Compute the truncated SHA-256 of arbitrary text
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..HASH_LEN].to_string()
}

/// Normalize a cited snippet: trim every line, join with `\n`
pub fn normalize_lines<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(|line| line.as_ref().trim())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Hash a snippet after per-line normalization
pub fn compute_snippet_hash<S: AsRef<str>>(lines: &[S]) -> String {
    hash_text(&normalize_lines(lines))
}

/// Extract the inclusive, 1-indexed line range from file content.
///
/// Returns `None` when the range is empty or extends past the last line.
pub fn slice_lines(content: &str, line_start: usize, line_end: usize) -> Option<Vec<&str>> {
    if line_start < 1 || line_end < line_start {
        return None;
    }
    let lines: Vec<&str> = content.lines().collect();
    if line_end > lines.len() {
        return None;
    }
    Some(lines[line_start - 1..line_end].to_vec())
}

/// Display label for a snippet: `path:N` or `path:N-M`
pub fn display_label(path: &str, line_start: usize, line_end: usize) -> String {
    if line_start == line_end {
        format!("{}:{}", path, line_start)
    } else {
        format!("{}:{}-{}", path, line_start, line_end)
    }
}

/// Display label for a file-existence assertion
pub fn file_exists_label(path: &str) -> String {
    format!("{} (file exists)", path)
}

/// Build a snippet anchor from a single, already-read line.
///
/// The anchor starts unverified; call [`reverify_anchor`] to confirm it.
pub fn make_line_anchor(path: &str, line_num: usize, line_text: &str) -> Option<SnippetAnchor> {
    if line_num < 1 || path.is_empty() {
        return None;
    }
    Some(SnippetAnchor {
        path: path.to_string(),
        line_start: line_num,
        line_end: line_num,
        content_hash: compute_snippet_hash(&[line_text]),
        display_label: display_label(path, line_num, line_num),
        hash_verified: false,
    })
}

/// Build a snippet anchor by reading a line range from a file under `root`.
///
/// Returns `None` if the file cannot be read or the range is out of bounds.
/// The anchor starts unverified.
pub fn make_snippet_anchor(
    root: &Path,
    path: &str,
    line_start: usize,
    line_end: usize,
) -> Option<SnippetAnchor> {
    let content = read_repo_file(root, path)?;
    let lines = slice_lines(&content, line_start, line_end)?;
    Some(SnippetAnchor {
        path: path.to_string(),
        line_start,
        line_end,
        content_hash: compute_snippet_hash(&lines),
        display_label: display_label(path, line_start, line_end),
        hash_verified: false,
    })
}

/// Build a file-existence anchor. The hash identifies the path string.
pub fn make_file_exists_anchor(path: &str) -> FileExistsAnchor {
    FileExistsAnchor {
        path: path.to_string(),
        content_hash: hash_text(path),
        display_label: file_exists_label(path),
        exists_verified: false,
    }
}

/// Check a snippet anchor against already-loaded file content
pub fn check_snippet(content: &str, anchor: &SnippetAnchor) -> AnchorCheck {
    match slice_lines(content, anchor.line_start, anchor.line_end) {
        Some(lines) if compute_snippet_hash(&lines) == anchor.content_hash => AnchorCheck::Valid,
        Some(_) => AnchorCheck::Stale,
        None => AnchorCheck::OutOfRange,
    }
}

/// Check any anchor against the repository checkout at `root`
pub fn check_anchor(root: &Path, anchor: &EvidenceAnchor) -> AnchorCheck {
    match anchor {
        EvidenceAnchor::Snippet(snippet) => {
            if snippet.content_hash.is_empty() {
                return AnchorCheck::Stale;
            }
            match read_repo_file(root, &snippet.path) {
                Some(content) => check_snippet(&content, snippet),
                None => AnchorCheck::Missing,
            }
        }
        EvidenceAnchor::FileExists(file) => match resolve_in_root(root, &file.path) {
            Some(full) if full.is_file() => AnchorCheck::Valid,
            _ => AnchorCheck::Missing,
        },
    }
}

/// Re-verify an anchor against disk, returning a new anchor whose
/// verification flag reflects the current content.
///
/// Read-only and independent per anchor, so callers may run it concurrently.
pub fn reverify_anchor(root: &Path, anchor: &EvidenceAnchor) -> EvidenceAnchor {
    let ok = check_anchor(root, anchor).is_valid();
    match anchor {
        EvidenceAnchor::Snippet(snippet) => EvidenceAnchor::Snippet(SnippetAnchor {
            hash_verified: ok,
            ..snippet.clone()
        }),
        EvidenceAnchor::FileExists(file) => EvidenceAnchor::FileExists(FileExistsAnchor {
            exists_verified: ok,
            ..file.clone()
        }),
    }
}

/// Join a relative anchor path onto the root, refusing absolute paths and
/// parent-directory components.
fn resolve_in_root(root: &Path, path: &str) -> Option<PathBuf> {
    let relative = Path::new(path);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return None;
    }
    Some(root.join(relative))
}

/// Read a repository file lossily (invalid UTF-8 is replaced, not fatal).
///
/// Returns `None` for unreadable files and paths that escape `root`.
pub fn read_repo_file(root: &Path, path: &str) -> Option<String> {
    let full = resolve_in_root(root, path)?;
    let bytes = std::fs::read(full).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
