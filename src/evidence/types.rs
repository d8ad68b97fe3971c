//! Evidence anchor data types
//!
//! These types represent the anchors carried by claims, how-to steps and
//! known-unknown entries. The wire form is a flat object with a `kind`
//! discriminator; in memory it is a sum type so that snippet-only fields
//! never have to be guarded against on file-existence anchors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discriminator for the two anchor shapes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKind {
    /// Citation into a line range of a source file
    #[default]
    Snippet,
    /// Assertion that a file exists
    FileExists,
}

impl AnchorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnchorKind::Snippet => "snippet",
            AnchorKind::FileExists => "file_exists",
        }
    }
}

/// A citation into a specific line range of a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetAnchor {
    /// File path, relative to the analyzed repository root
    pub path: String,
    /// First cited line (1-indexed)
    pub line_start: usize,
    /// Last cited line (1-indexed, inclusive)
    pub line_end: usize,
    /// Truncated SHA-256 of the normalized line range
    pub content_hash: String,
    /// Human-readable location, e.g. `src/main.rs:10-12`
    pub display_label: String,
    /// Whether re-reading the cited lines reproduced `content_hash`
    pub hash_verified: bool,
}

/// An assertion that a file is present in the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExistsAnchor {
    pub path: String,
    /// Hash of the path string (identifies the assertion, not the content)
    pub content_hash: String,
    pub display_label: String,
    /// Whether the file was confirmed present on disk
    pub exists_verified: bool,
}

/// An evidence anchor attached to a claim or known-unknown entry.
///
/// Immutable once attached: re-verification produces a new anchor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAnchor", into = "RawAnchor")]
pub enum EvidenceAnchor {
    Snippet(SnippetAnchor),
    FileExists(FileExistsAnchor),
}

impl EvidenceAnchor {
    pub fn kind(&self) -> AnchorKind {
        match self {
            EvidenceAnchor::Snippet(_) => AnchorKind::Snippet,
            EvidenceAnchor::FileExists(_) => AnchorKind::FileExists,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            EvidenceAnchor::Snippet(s) => &s.path,
            EvidenceAnchor::FileExists(f) => &f.path,
        }
    }

    pub fn content_hash(&self) -> &str {
        match self {
            EvidenceAnchor::Snippet(s) => &s.content_hash,
            EvidenceAnchor::FileExists(f) => &f.content_hash,
        }
    }

    pub fn display_label(&self) -> &str {
        match self {
            EvidenceAnchor::Snippet(s) => &s.display_label,
            EvidenceAnchor::FileExists(f) => &f.display_label,
        }
    }

    /// True only for snippet anchors whose hash was re-verified
    pub fn hash_verified(&self) -> bool {
        matches!(self, EvidenceAnchor::Snippet(s) if s.hash_verified)
    }

    /// True only for file-existence anchors confirmed on disk
    pub fn exists_verified(&self) -> bool {
        matches!(self, EvidenceAnchor::FileExists(f) if f.exists_verified)
    }
}

impl From<SnippetAnchor> for EvidenceAnchor {
    fn from(anchor: SnippetAnchor) -> Self {
        EvidenceAnchor::Snippet(anchor)
    }
}

impl From<FileExistsAnchor> for EvidenceAnchor {
    fn from(anchor: FileExistsAnchor) -> Self {
        EvidenceAnchor::FileExists(anchor)
    }
}

/// Reasons an anchor is rejected at the input boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    #[error("evidence anchor has an empty path")]
    EmptyPath,

    #[error("snippet anchor for {path} is missing line_start/line_end")]
    MissingLines { path: String },

    #[error("snippet anchor for {path} has invalid line range {start}-{end}")]
    InvalidLineRange {
        path: String,
        start: usize,
        end: usize,
    },
}

/// Flat wire shape shared by both anchor kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawAnchor {
    #[serde(default)]
    kind: AnchorKind,
    #[serde(default)]
    path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    line_start: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    line_end: Option<usize>,
    #[serde(default, rename = "snippet_hash", alias = "content_hash")]
    content_hash: String,
    #[serde(default, rename = "display", alias = "display_label")]
    display_label: String,
    #[serde(
        default,
        rename = "snippet_hash_verified",
        alias = "hash_verified",
        skip_serializing_if = "Option::is_none"
    )]
    hash_verified: Option<bool>,
    #[serde(
        default,
        rename = "verified",
        alias = "exists_verified",
        skip_serializing_if = "Option::is_none"
    )]
    exists_verified: Option<bool>,
}

impl TryFrom<RawAnchor> for EvidenceAnchor {
    type Error = AnchorError;

    fn try_from(raw: RawAnchor) -> Result<Self, Self::Error> {
        if raw.path.trim().is_empty() {
            return Err(AnchorError::EmptyPath);
        }

        match raw.kind {
            AnchorKind::FileExists => {
                let display_label = if raw.display_label.is_empty() {
                    super::hashing::file_exists_label(&raw.path)
                } else {
                    raw.display_label
                };
                Ok(EvidenceAnchor::FileExists(FileExistsAnchor {
                    path: raw.path,
                    content_hash: raw.content_hash,
                    display_label,
                    exists_verified: raw.exists_verified.unwrap_or(false),
                }))
            }
            AnchorKind::Snippet => {
                let (start, end) = match (raw.line_start, raw.line_end) {
                    (Some(start), Some(end)) => (start, end),
                    (Some(start), None) => (start, start),
                    _ => return Err(AnchorError::MissingLines { path: raw.path }),
                };
                if start < 1 || end < start {
                    return Err(AnchorError::InvalidLineRange {
                        path: raw.path,
                        start,
                        end,
                    });
                }
                let display_label = if raw.display_label.is_empty() {
                    super::hashing::display_label(&raw.path, start, end)
                } else {
                    raw.display_label
                };
                Ok(EvidenceAnchor::Snippet(SnippetAnchor {
                    path: raw.path,
                    line_start: start,
                    line_end: end,
                    content_hash: raw.content_hash,
                    display_label,
                    hash_verified: raw.hash_verified.unwrap_or(false),
                }))
            }
        }
    }
}

impl From<EvidenceAnchor> for RawAnchor {
    fn from(anchor: EvidenceAnchor) -> Self {
        match anchor {
            EvidenceAnchor::Snippet(s) => RawAnchor {
                kind: AnchorKind::Snippet,
                path: s.path,
                line_start: Some(s.line_start),
                line_end: Some(s.line_end),
                content_hash: s.content_hash,
                display_label: s.display_label,
                hash_verified: Some(s.hash_verified),
                exists_verified: None,
            },
            EvidenceAnchor::FileExists(f) => RawAnchor {
                kind: AnchorKind::FileExists,
                path: f.path,
                line_start: None,
                line_end: None,
                content_hash: f.content_hash,
                display_label: f.display_label,
                hash_verified: None,
                exists_verified: Some(f.exists_verified),
            },
        }
    }
}
