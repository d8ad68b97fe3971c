//! Evidence verification policy.
//!
//! The single place that decides whether evidence is trustworthy. The
//! assembler, renderer and diff engine all go through these predicates and
//! never implement their own notion of "verified".
//!
//! A claim is verified iff at least one anchor reaches the HASH tier:
//! - the anchor is a snippet with a non-empty path and content hash
//! - re-reading the cited lines reproduced the hash (`hash_verified`)
//! - the path is not one of this tool's own generated outputs
//!
//! The EXISTENCE tier (file confirmed on disk) is tracked but never enough
//! to verify a claim.

use std::fmt;

use glob::Pattern;

use crate::domain::{Claim, ClaimStatus, VerifiedClaim};
use crate::evidence::EvidenceAnchor;

/// Output files written by this tool; citing them is circular
pub const GENERATED_ARTIFACTS: &[&str] = &[
    "evidence_pack.v1.json",
    "claims.json",
    "target_howto.json",
    "coverage.json",
    "replit_profile.json",
    "index.json",
    "DOSSIER.md",
    "REPORT_ENGINEER.md",
    "REPORT_AUDITOR.md",
    "REPORT_EXECUTIVE.md",
    "REPORT_PLAIN.md",
    "diff.json",
    "DIFF_REPORT.md",
];

/// Basename patterns for reports of any mode
const GENERATED_NAME_PATTERNS: &[&str] = &["REPORT_*.md"];

/// Directory holding generated packs; everything below it is output
const PACKS_DIR: &str = "packs";

/// Output directory; only known artifact names below it are generated
const OUTPUT_DIR: &str = "out";

/// Trust tier an anchor reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VerificationTier {
    /// Not trustworthy (unverified, circular, or malformed)
    None,
    /// File confirmed present on disk; reserved, never verifies a claim
    Existence,
    /// Cited lines re-hashed to the stored hash
    Hash,
}

impl VerificationTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationTier::None => "NONE",
            VerificationTier::Existence => "EVIDENCE_VERIFIED_EXISTENCE",
            VerificationTier::Hash => "EVIDENCE_VERIFIED_HASH",
        }
    }
}

impl fmt::Display for VerificationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Check whether a path points at one of this tool's own outputs
pub fn is_generated_artifact(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }

    let normalized = path.replace('\\', "/");
    let mut segments: Vec<&str> = normalized
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    let Some(basename) = segments.pop() else {
        return false;
    };

    if GENERATED_ARTIFACTS.contains(&basename) {
        return true;
    }
    let name_match = GENERATED_NAME_PATTERNS
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .any(|p| p.matches(basename));
    if name_match {
        return true;
    }

    // Directory segments only; the basename was handled above
    if segments.contains(&PACKS_DIR) {
        return true;
    }
    segments.contains(&OUTPUT_DIR) && GENERATED_ARTIFACTS.contains(&basename)
}

/// Classify a single anchor
pub fn evidence_tier(anchor: &EvidenceAnchor) -> VerificationTier {
    if anchor.path().is_empty() || is_generated_artifact(anchor.path()) {
        return VerificationTier::None;
    }

    match anchor {
        EvidenceAnchor::Snippet(snippet) => {
            if snippet.hash_verified && !snippet.content_hash.is_empty() {
                VerificationTier::Hash
            } else {
                VerificationTier::None
            }
        }
        EvidenceAnchor::FileExists(file) => {
            if file.exists_verified {
                VerificationTier::Existence
            } else {
                VerificationTier::None
            }
        }
    }
}

/// True iff the anchor reaches the HASH tier
pub fn is_evidence_verified(anchor: &EvidenceAnchor) -> bool {
    evidence_tier(anchor) == VerificationTier::Hash
}

/// True iff at least one anchor reaches the HASH tier and is not circular
pub fn is_verified_claim(claim: &Claim) -> bool {
    claim.evidence.iter().any(is_evidence_verified)
}

/// The claim's HASH-tier anchors, in input order
pub fn get_verified_evidence(claim: &Claim) -> Vec<EvidenceAnchor> {
    claim
        .evidence
        .iter()
        .filter(|a| is_evidence_verified(a))
        .cloned()
        .collect()
}

/// Re-validate a claim: set its status and cap its confidence at `cap`
/// when no anchor reaches the HASH tier. The input is left untouched.
pub fn revalidate_claim(claim: &Claim, cap: f64) -> Claim {
    let verified = is_verified_claim(claim);
    let confidence = if verified {
        claim.confidence
    } else {
        claim.confidence.min(cap)
    };

    Claim {
        confidence,
        status: if verified {
            ClaimStatus::Verified
        } else {
            ClaimStatus::Unverified
        },
        ..claim.clone()
    }
}

/// Project a verified claim onto the pack shape, or `None` if it fails policy
pub fn project_verified(claim: &Claim) -> Option<VerifiedClaim> {
    let evidence = get_verified_evidence(claim);
    if evidence.is_empty() {
        return None;
    }
    Some(VerifiedClaim {
        id: claim.id.clone(),
        statement: claim.statement.clone(),
        section: claim.section.clone(),
        evidence,
        confidence: claim.confidence,
    })
}
