//! Claims produced by the extraction layer.
//!
//! Claims are re-validated by the core, never re-generated.

use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceAnchor;

/// Verification status of a claim as seen by the core
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Not yet checked against the verification policy
    #[default]
    Unvalidated,
    /// At least one anchor reached the hash tier
    Verified,
    /// No anchor reached the hash tier
    Unverified,
}

/// A statement about the analyzed repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(default)]
    pub id: String,

    /// Section assigned by the extractor (open set, must be non-empty)
    #[serde(default)]
    pub section: String,

    #[serde(default)]
    pub statement: String,

    /// Confidence in [0, 1]
    #[serde(default)]
    pub confidence: f64,

    #[serde(default)]
    pub evidence: Vec<EvidenceAnchor>,

    #[serde(default)]
    pub status: ClaimStatus,
}

/// The claims document: `{"claims": [...]}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClaimsDocument {
    #[serde(default)]
    pub claims: Vec<Claim>,
}

impl ClaimsDocument {
    /// Check boundary invariants, returning every violation found
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for (idx, claim) in self.claims.iter().enumerate() {
            let label = if claim.id.is_empty() {
                format!("claims[{}]", idx)
            } else {
                format!("claims[{}] ({})", idx, claim.id)
            };

            if claim.section.trim().is_empty() {
                violations.push(format!("{}: section must be non-empty", label));
            }
            if !(0.0..=1.0).contains(&claim.confidence) {
                violations.push(format!(
                    "{}: confidence {} outside [0, 1]",
                    label, claim.confidence
                ));
            }
        }

        violations
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}

/// Projection of a claim that entered the verified section of a pack.
///
/// Carries only its hash-verified, non-circular anchors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedClaim {
    pub id: String,
    pub statement: String,
    pub section: String,
    pub evidence: Vec<EvidenceAnchor>,
    pub confidence: f64,
}
