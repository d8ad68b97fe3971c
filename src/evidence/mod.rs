//! Evidence model for grounding repository claims
//!
//! An evidence anchor is a citation into a specific file and line range
//! (or a file-existence assertion) carrying a content hash for drift
//! detection.
//!
//! # Design Principles
//!
//! - **Hash verification**: a snippet is trusted only when re-reading the
//!   cited lines reproduces its stored hash.
//! - **Same normalization both ways**: lines are trimmed before hashing at
//!   creation and at re-verification, so a mismatch means content drift.
//! - **Validated at the boundary**: malformed anchors are rejected when the
//!   input document is parsed, never patched up downstream.
//!
//! # Example
//!
//! ```ignore
//! use repo_recon::evidence::{make_snippet_anchor, reverify_anchor};
//!
//! let anchor = make_snippet_anchor(root, "src/main.rs", 10, 12).unwrap();
//! let checked = reverify_anchor(root, &anchor.into());
//! assert!(checked.hash_verified());
//! ```

pub mod hashing;
pub mod types;

pub use hashing::{
    check_anchor, check_snippet, compute_snippet_hash, display_label, file_exists_label,
    hash_text, make_file_exists_anchor, make_line_anchor, make_snippet_anchor, normalize_lines,
    read_repo_file, reverify_anchor, slice_lines, AnchorCheck, HASH_LEN,
};

pub use types::{AnchorError, AnchorKind, EvidenceAnchor, FileExistsAnchor, SnippetAnchor};
