//! Result of comparing two EvidencePacks.
//!
//! Derived on demand from two persisted packs; never a source of truth.
//! Holds only set differences and numeric deltas.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::claim::VerifiedClaim;
use super::unknown::Category;

/// Version of the diff document layout
pub const DIFF_VERSION: &str = "1.0";

/// Identifies one side of a comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackRef {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
}

/// A claim present on both sides whose evidence hashes differ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangedClaim {
    pub statement: String,
    pub old_hashes: Vec<String>,
    pub new_hashes: Vec<String>,
    pub confidence_delta: f64,
}

/// Per-section delta, keyed by statement text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionDiff {
    pub added: Vec<VerifiedClaim>,
    pub removed: Vec<VerifiedClaim>,
    pub changed: Vec<ChangedClaim>,
    /// `+A -R ~C`
    pub summary: String,
}

impl SectionDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

/// Status of a category on one side; `MISSING` when the pack lacks it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryState {
    Unknown,
    Verified,
    Missing,
}

impl CategoryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryState::Unknown => "UNKNOWN",
            CategoryState::Verified => "VERIFIED",
            CategoryState::Missing => "MISSING",
        }
    }
}

impl fmt::Display for CategoryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub category: Category,
    pub old_status: CategoryState,
    pub new_status: CategoryState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownsDiff {
    pub status_changes: Vec<StatusChange>,
    pub summary: String,
}

/// Delta over the full snippet-hash universe
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashSetDelta {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: usize,
    /// `+A -R =U`
    pub summary: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Improved,
    Declined,
    Unchanged,
}

impl Direction {
    /// Derived purely from the sign of the delta
    pub fn from_delta(delta: f64) -> Self {
        if delta > 0.0 {
            Direction::Improved
        } else if delta < 0.0 {
            Direction::Declined
        } else {
            Direction::Unchanged
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Improved => "improved",
            Direction::Declined => "declined",
            Direction::Unchanged => "unchanged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityDelta {
    pub old_score: f64,
    pub new_score: f64,
    pub delta: f64,
    pub direction: Direction,
    pub component_deltas: BTreeMap<String, f64>,
}

/// Full comparison of pack A (old) against pack B (new)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffResult {
    pub diff_version: String,
    pub pack_a_ref: PackRef,
    pub pack_b_ref: PackRef,
    pub per_section: BTreeMap<String, SectionDiff>,
    pub unknown_status_changes: UnknownsDiff,
    pub hash_set_delta: HashSetDelta,
    pub visibility_delta: VisibilityDelta,
}

impl DiffResult {
    /// True when no section, category, hash or score changed
    pub fn is_identity(&self) -> bool {
        self.per_section.values().all(SectionDiff::is_empty)
            && self.unknown_status_changes.status_changes.is_empty()
            && self.hash_set_delta.added.is_empty()
            && self.hash_set_delta.removed.is_empty()
            && self.visibility_delta.delta == 0.0
    }
}
