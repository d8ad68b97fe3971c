//! repo-recon - Evidence-governed repository reconnaissance
//!
//! The governance layer that sits between claim extraction and reporting.
//! Every claim that reaches a report is backed by a re-verifiable hash of
//! the analyzed repository's own source lines, or it is not reported as
//! verified.
//!
//! # Architecture
//!
//! The system is built around one persisted snapshot:
//! - Extraction outputs are re-validated, never re-generated
//! - The EvidencePack is schema-checked before it is written, and written
//!   before anything is rendered
//! - Reports and diffs are pure functions of persisted packs
//!
//! # Modules
//!
//! - `evidence`: Evidence anchors, hashing and re-verification
//! - `core`: Policy, Known-Unknowns, Metrics, Assembler, Render, Diff
//! - `domain`: Data structures (Claim, EvidencePack, DiffResult)
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Assemble a pack and render the engineer report
//! recon analyze --claims claims.json --howto howto.json \
//!     --coverage coverage.json --index files.txt --root ./checkout
//!
//! # Re-render for another audience
//! recon render out/evidence_pack.v1.json --mode executive
//!
//! # Compare two runs
//! recon diff old/evidence_pack.v1.json out/evidence_pack.v1.json
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod evidence;

// Re-export main types at crate root for convenience
pub use config::ToolConfig;
pub use crate::core::{diff_packs, render, Assembler, PackError, PackInputs, RenderMode};
pub use domain::{Claim, ClaimsDocument, DiffResult, EvidencePack, KnownUnknownEntry};
pub use evidence::{EvidenceAnchor, FileExistsAnchor, SnippetAnchor};
