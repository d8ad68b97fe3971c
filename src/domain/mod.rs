//! Domain types for repository reconnaissance.
//!
//! This module contains the core data structures:
//! - Claim: statements from the extraction layer
//! - Inputs: how-to, coverage and workspace profile documents
//! - Unknown: the fixed known-unknown categories
//! - Pack: the persisted EvidencePack
//! - Diff: comparison of two packs

pub mod claim;
pub mod diff;
pub mod inputs;
pub mod pack;
pub mod unknown;

// Re-export commonly used types
pub use claim::{Claim, ClaimStatus, ClaimsDocument, VerifiedClaim};
pub use diff::{
    CategoryState, ChangedClaim, DiffResult, Direction, HashSetDelta, PackRef, SectionDiff,
    StatusChange, UnknownsDiff, VisibilityDelta, DIFF_VERSION,
};
pub use inputs::{
    CoverageInput, HowTo, HowToCompleteness, HowToStep, InventoryEntry, PortBinding,
    ReplitProfile, StepEvidence,
};
pub use pack::{
    CompletenessComponents, CompletenessMetric, EvidencePack, PackCoverage, PackHashes,
    PackMetrics, PackSummary, ReplitSummary, StructuralItem, StructuralVisibilityMetric,
    VerifiedStructural, VisibilityMetric, EVIDENCE_PACK_FILE,
};
pub use unknown::{Category, KnownUnknownEntry, UnknownStatus};
