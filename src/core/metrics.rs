//! Metrics engine.
//!
//! Pure scores computed only from verified evidence. Each metric carries
//! its own formula and interpretation text so every report renders the
//! same disclaimer for the same run.

use crate::domain::{
    Claim, CompletenessComponents, CompletenessMetric, KnownUnknownEntry, PackMetrics,
    StructuralVisibilityMetric, UnknownStatus, VisibilityMetric,
};

use super::policy::is_verified_claim;

pub const VISIBILITY_LABEL: &str = "Claim Visibility";
pub const VISIBILITY_FORMULA: &str = "verified_claims / total_claims";
pub const VISIBILITY_INTERPRETATION: &str = "Share of claims backed by deterministic hash-verified evidence. This is claim-evidence visibility, NOT system surface visibility.";

pub const COMPLETENESS_LABEL: &str = "Reporting Completeness";
pub const COMPLETENESS_FORMULA: &str =
    "average(claims_coverage, unknowns_coverage, howto_completeness)";
pub const COMPLETENESS_INTERPRETATION: &str =
    "Composite completeness of the reconnaissance report. NOT a security or structural visibility score.";

pub const STRUCTURAL_LABEL: &str = "Structural Visibility (not implemented)";
pub const STRUCTURAL_FORMULA: &str = "verified_structural_items / total_structural_surface";
pub const STRUCTURAL_STATUS: &str = "not_implemented";
pub const STRUCTURAL_INTERPRETATION: &str = "Structural surface visibility (routes, dependencies, schemas, enforcement). Not yet measured: requires dedicated structural extractors.";

/// Round to four decimal places, the precision persisted in packs
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Safe ratio in [0, 1]; zero when the denominator is zero
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        (numerator as f64 / denominator as f64).clamp(0.0, 1.0)
    }
}

pub fn claim_visibility(claims: &[Claim]) -> VisibilityMetric {
    let verified = claims.iter().filter(|c| is_verified_claim(c)).count();
    VisibilityMetric {
        score: round4(ratio(verified, claims.len())),
        label: VISIBILITY_LABEL.to_string(),
        formula: VISIBILITY_FORMULA.to_string(),
        verified_claims: verified,
        total_claims: claims.len(),
        interpretation: VISIBILITY_INTERPRETATION.to_string(),
    }
}

/// Composite completeness. `howto_completeness` is clamped to [0, 1] so
/// the composite stays bounded whatever the caller passes.
pub fn completeness(
    claims: &[Claim],
    unknowns: &[KnownUnknownEntry],
    howto_completeness: f64,
) -> CompletenessMetric {
    let verified_claims = claims.iter().filter(|c| is_verified_claim(c)).count();
    let verified_categories = unknowns
        .iter()
        .filter(|u| u.status == UnknownStatus::Verified)
        .count();

    let claims_coverage = ratio(verified_claims, claims.len());
    let unknowns_coverage = ratio(verified_categories, unknowns.len());
    let howto = if howto_completeness.is_finite() {
        howto_completeness.clamp(0.0, 1.0)
    } else {
        0.0
    };

    CompletenessMetric {
        score: round4((claims_coverage + unknowns_coverage + howto) / 3.0),
        label: COMPLETENESS_LABEL.to_string(),
        formula: COMPLETENESS_FORMULA.to_string(),
        components: CompletenessComponents {
            claims_coverage: round4(claims_coverage),
            unknowns_coverage: round4(unknowns_coverage),
            howto_completeness: round4(howto),
        },
        interpretation: COMPLETENESS_INTERPRETATION.to_string(),
    }
}

/// Reserved metric: always null until structural extractors exist
pub fn structural_visibility() -> StructuralVisibilityMetric {
    StructuralVisibilityMetric {
        score: None,
        label: STRUCTURAL_LABEL.to_string(),
        formula: STRUCTURAL_FORMULA.to_string(),
        status: STRUCTURAL_STATUS.to_string(),
        interpretation: STRUCTURAL_INTERPRETATION.to_string(),
    }
}

pub fn build_metrics(
    claims: &[Claim],
    unknowns: &[KnownUnknownEntry],
    howto_completeness: f64,
) -> PackMetrics {
    PackMetrics {
        visibility: claim_visibility(claims),
        completeness: completeness(claims, unknowns, howto_completeness),
        structural_visibility: structural_visibility(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, ClaimStatus};
    use crate::evidence::{EvidenceAnchor, SnippetAnchor};

    fn claim(n: usize, verified: bool) -> Claim {
        Claim {
            id: format!("c{}", n),
            section: "Runtime".to_string(),
            statement: format!("statement {}", n),
            confidence: 0.8,
            evidence: vec![EvidenceAnchor::Snippet(SnippetAnchor {
                path: "src/app.py".to_string(),
                line_start: n + 1,
                line_end: n + 1,
                content_hash: format!("{:012x}", n),
                display_label: format!("src/app.py:{}", n + 1),
                hash_verified: verified,
            })],
            status: ClaimStatus::Unvalidated,
        }
    }

    fn unknowns(verified: usize) -> Vec<KnownUnknownEntry> {
        Category::ALL
            .iter()
            .enumerate()
            .map(|(i, &c)| KnownUnknownEntry {
                status: if i < verified {
                    UnknownStatus::Verified
                } else {
                    UnknownStatus::Unknown
                },
                ..KnownUnknownEntry::unknown(c, "")
            })
            .collect()
    }

    #[test]
    fn test_visibility_fifteen_of_seventeen() {
        let claims: Vec<Claim> = (0..17).map(|n| claim(n, n < 15)).collect();
        let metric = claim_visibility(&claims);
        assert_eq!(metric.score, 0.8824);
        assert_eq!(metric.verified_claims, 15);
        assert_eq!(metric.total_claims, 17);
    }

    #[test]
    fn test_visibility_without_claims_is_zero() {
        assert_eq!(claim_visibility(&[]).score, 0.0);
    }

    #[test]
    fn test_completeness_is_mean_of_components() {
        let claims: Vec<Claim> = (0..4).map(|n| claim(n, n < 2)).collect();
        let metric = completeness(&claims, &unknowns(0), 0.7);

        assert_eq!(metric.components.claims_coverage, 0.5);
        assert_eq!(metric.components.unknowns_coverage, 0.0);
        assert_eq!(metric.components.howto_completeness, 0.7);
        assert_eq!(metric.score, 0.4);
    }

    #[test]
    fn test_completeness_bounded() {
        let claims: Vec<Claim> = (0..3).map(|n| claim(n, true)).collect();
        let high = completeness(&claims, &unknowns(9), 5.0);
        assert_eq!(high.score, 1.0);

        let low = completeness(&[], &[], -1.0);
        assert_eq!(low.score, 0.0);

        let nan = completeness(&[], &[], f64::NAN);
        assert_eq!(nan.components.howto_completeness, 0.0);
    }

    #[test]
    fn test_structural_visibility_is_null() {
        let metric = structural_visibility();
        assert!(metric.score.is_none());
        assert_eq!(metric.status, "not_implemented");
    }

    #[test]
    fn test_round4() {
        assert_eq!(round4(15.0 / 17.0), 0.8824);
        assert_eq!(round4(1.0 / 3.0), 0.3333);
    }
}
