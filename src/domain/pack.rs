//! The EvidencePack: the versioned snapshot every report and diff reads.
//!
//! A pack is built once per run by the assembler, validated against the
//! required-field contract, persisted once, and treated as read-only
//! afterwards.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::claim::VerifiedClaim;
use super::unknown::{KnownUnknownEntry, UnknownStatus};
use crate::evidence::EvidenceAnchor;

/// File name of the persisted pack
pub const EVIDENCE_PACK_FILE: &str = "evidence_pack.v1.json";

/// Top-level persisted snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePack {
    pub schema_version: String,
    pub tool_version: String,
    pub generated_at: DateTime<Utc>,
    /// Acquisition mode of the analyzed repository (local, github, replit)
    pub mode: String,
    pub run_id: String,

    /// Verified claims grouped by their extractor-assigned section
    pub verified: BTreeMap<String, Vec<VerifiedClaim>>,
    pub verified_structural: VerifiedStructural,
    pub unknowns: Vec<KnownUnknownEntry>,
    pub metrics: PackMetrics,
    pub hashes: PackHashes,
    pub summary: PackSummary,
    pub coverage: PackCoverage,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replit_profile: Option<ReplitSummary>,
}

impl EvidencePack {
    /// Number of verified claims across all sections
    pub fn verified_claim_count(&self) -> usize {
        self.verified.values().map(Vec::len).sum()
    }

    /// Verified claims in section order, then input order
    pub fn verified_claims(&self) -> impl Iterator<Item = &VerifiedClaim> {
        self.verified.values().flatten()
    }

    pub fn find_claim(&self, id: &str) -> Option<&VerifiedClaim> {
        self.verified_claims().find(|c| c.id == id)
    }

    pub fn unknown_entries(&self) -> impl Iterator<Item = &KnownUnknownEntry> {
        self.unknowns
            .iter()
            .filter(|u| u.status == UnknownStatus::Unknown)
    }

    pub fn verified_entries(&self) -> impl Iterator<Item = &KnownUnknownEntry> {
        self.unknowns
            .iter()
            .filter(|u| u.status == UnknownStatus::Verified)
    }

    /// Every anchor carried by the pack (verified claims, structural items,
    /// known-unknown evidence)
    pub fn anchors(&self) -> impl Iterator<Item = &EvidenceAnchor> {
        self.verified_claims()
            .flat_map(|c| c.evidence.iter())
            .chain(self.verified_structural.items().flat_map(|i| i.evidence.iter()))
            .chain(self.unknowns.iter().flat_map(|u| u.evidence.iter()))
    }
}

/// One item produced by a deterministic structural extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralItem {
    pub id: String,
    pub statement: String,
    pub section: String,
    pub evidence: Vec<EvidenceAnchor>,
    pub confidence: f64,
    pub source: String,
}

/// Structural namespace: routes, dependencies, schemas, enforcement.
///
/// An empty bucket always has a matching `_notes` entry explaining why.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerifiedStructural {
    #[serde(default)]
    pub routes: Vec<StructuralItem>,
    #[serde(default)]
    pub dependencies: Vec<StructuralItem>,
    #[serde(default)]
    pub schemas: Vec<StructuralItem>,
    #[serde(default)]
    pub enforcement: Vec<StructuralItem>,
    #[serde(rename = "_notes", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub notes: BTreeMap<String, String>,
}

impl VerifiedStructural {
    /// Buckets in reporting order
    pub fn buckets(&self) -> [(&'static str, &[StructuralItem]); 4] {
        [
            ("routes", &self.routes),
            ("dependencies", &self.dependencies),
            ("schemas", &self.schemas),
            ("enforcement", &self.enforcement),
        ]
    }

    pub fn items(&self) -> impl Iterator<Item = &StructuralItem> {
        self.routes
            .iter()
            .chain(&self.dependencies)
            .chain(&self.schemas)
            .chain(&self.enforcement)
    }

    pub fn total(&self) -> usize {
        self.items().count()
    }
}

/// Claim visibility: verified / total claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityMetric {
    pub score: f64,
    pub label: String,
    pub formula: String,
    pub verified_claims: usize,
    pub total_claims: usize,
    pub interpretation: String,
}

/// The three completeness ratios, each in [0, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletenessComponents {
    pub claims_coverage: f64,
    pub unknowns_coverage: f64,
    pub howto_completeness: f64,
}

impl CompletenessComponents {
    /// Named components in reporting order
    pub fn named(&self) -> [(&'static str, f64); 3] {
        [
            ("claims_coverage", self.claims_coverage),
            ("unknowns_coverage", self.unknowns_coverage),
            ("howto_completeness", self.howto_completeness),
        ]
    }
}

/// Composite completeness: mean of the three components
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletenessMetric {
    pub score: f64,
    pub label: String,
    pub formula: String,
    pub components: CompletenessComponents,
    pub interpretation: String,
}

/// Reserved structural visibility; `score` stays null until extractors exist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuralVisibilityMetric {
    pub score: Option<f64>,
    pub label: String,
    pub formula: String,
    pub status: String,
    pub interpretation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackMetrics {
    pub visibility: VisibilityMetric,
    pub completeness: CompletenessMetric,
    pub structural_visibility: StructuralVisibilityMetric,
}

/// Distinct snippet hashes referenced anywhere in the inputs, sorted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackHashes {
    pub snippets: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackSummary {
    pub total_files: usize,
    pub total_claims: usize,
    pub verified_claims: usize,
    pub unknown_categories: usize,
    pub verified_categories: usize,
}

/// Coverage as persisted in the pack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackCoverage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    pub analyzed_files: usize,
    pub total_files_seen: usize,
    pub skipped_files: usize,
    pub partial: bool,
    #[serde(default)]
    pub skipped_types: BTreeMap<String, usize>,
    #[serde(default)]
    pub timeouts: Vec<String>,
}

/// Condensed Replit workspace profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplitSummary {
    pub is_replit: bool,
    pub run_command: Option<String>,
    pub language: Option<String>,
    pub port: Option<u16>,
}
