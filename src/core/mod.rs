//! Governance core.
//!
//! This module contains:
//! - Policy: which evidence counts as verified
//! - Unknowns: the known-unknowns registry and artifact detector
//! - Metrics: visibility and completeness scores
//! - Assembler: pack construction, validation and persistence
//! - Render: per-audience markdown reports
//! - Diff: comparison of two persisted packs

pub mod assembler;
pub mod diff;
pub mod metrics;
pub mod policy;
pub mod render;
pub mod unknowns;

// Re-export commonly used types
pub use assembler::{
    assert_pack_exists, validate_evidence_pack, Assembler, PackError, PackInputs,
};
pub use diff::{diff_packs, render_diff_report, save_diff, DIFF_FILE, DIFF_REPORT_FILE};
pub use metrics::build_metrics;
pub use policy::{
    evidence_tier, get_verified_evidence, is_evidence_verified, is_generated_artifact,
    is_verified_claim, project_verified, revalidate_claim, VerificationTier,
};
pub use render::{assert_pack_written, render, save_report, RenderMode};
pub use unknowns::{ArtifactDetector, UnknownsRegistry, UpgradeRule};
