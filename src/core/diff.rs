//! Diff engine.
//!
//! Compares two persisted packs. The result holds only set differences
//! and numeric deltas; it never carries a risk or security judgment.
//!
//! # Design Principles
//!
//! - Claims are keyed by statement text, not id (ids are not stable
//!   across runs)
//! - Category changes are reported only when the status differs
//! - Both packs are read-only inputs; nothing is recomputed from source

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::info;

use super::assembler::{write_atomic, PackError};
use super::metrics::round4;
use super::render::format_percent;
use crate::domain::{
    Category, CategoryState, ChangedClaim, DiffResult, Direction, EvidencePack, HashSetDelta,
    PackRef, SectionDiff, StatusChange, UnknownStatus, UnknownsDiff, VerifiedClaim,
    VisibilityDelta, DIFF_VERSION,
};

/// Machine-readable diff document
pub const DIFF_FILE: &str = "diff.json";

/// Human-readable diff report
pub const DIFF_REPORT_FILE: &str = "DIFF_REPORT.md";

/// Compare pack A (old) against pack B (new)
pub fn diff_packs(a: &EvidencePack, b: &EvidencePack) -> DiffResult {
    DiffResult {
        diff_version: DIFF_VERSION.to_string(),
        pack_a_ref: pack_ref(a),
        pack_b_ref: pack_ref(b),
        per_section: diff_sections(a, b),
        unknown_status_changes: diff_unknowns(a, b),
        hash_set_delta: diff_hashes(a, b),
        visibility_delta: diff_visibility(a, b),
    }
}

fn pack_ref(pack: &EvidencePack) -> PackRef {
    PackRef {
        run_id: pack.run_id.clone(),
        generated_at: pack.generated_at,
    }
}

fn evidence_hashes(claim: &VerifiedClaim) -> BTreeSet<&str> {
    claim
        .evidence
        .iter()
        .map(|a| a.content_hash())
        .filter(|h| !h.is_empty())
        .collect()
}

/// Claims of one section keyed by statement; first occurrence wins
fn by_statement(claims: &[VerifiedClaim]) -> BTreeMap<&str, &VerifiedClaim> {
    let mut keyed = BTreeMap::new();
    for claim in claims {
        keyed.entry(claim.statement.as_str()).or_insert(claim);
    }
    keyed
}

fn diff_sections(a: &EvidencePack, b: &EvidencePack) -> BTreeMap<String, SectionDiff> {
    let sections: BTreeSet<&String> = a.verified.keys().chain(b.verified.keys()).collect();
    let empty: Vec<VerifiedClaim> = Vec::new();

    sections
        .into_iter()
        .map(|section| {
            let old_claims = a.verified.get(section).unwrap_or(&empty);
            let new_claims = b.verified.get(section).unwrap_or(&empty);
            (section.clone(), diff_section(old_claims, new_claims))
        })
        .collect()
}

fn diff_section(old_claims: &[VerifiedClaim], new_claims: &[VerifiedClaim]) -> SectionDiff {
    let old = by_statement(old_claims);
    let new = by_statement(new_claims);

    let added: Vec<VerifiedClaim> = new_claims
        .iter()
        .filter(|c| !old.contains_key(c.statement.as_str()))
        .filter(|c| new.get(c.statement.as_str()).is_some_and(|first| std::ptr::eq(*first, *c)))
        .cloned()
        .collect();

    let removed: Vec<VerifiedClaim> = old_claims
        .iter()
        .filter(|c| !new.contains_key(c.statement.as_str()))
        .filter(|c| old.get(c.statement.as_str()).is_some_and(|first| std::ptr::eq(*first, *c)))
        .cloned()
        .collect();

    let changed: Vec<ChangedClaim> = old
        .iter()
        .filter_map(|(statement, before)| {
            let after = new.get(statement)?;
            let old_hashes = evidence_hashes(before);
            let new_hashes = evidence_hashes(after);
            (old_hashes != new_hashes).then(|| ChangedClaim {
                statement: statement.to_string(),
                old_hashes: old_hashes.into_iter().map(str::to_string).collect(),
                new_hashes: new_hashes.into_iter().map(str::to_string).collect(),
                confidence_delta: round4(after.confidence - before.confidence),
            })
        })
        .collect();

    SectionDiff {
        summary: format!("+{} -{} ~{}", added.len(), removed.len(), changed.len()),
        added,
        removed,
        changed,
    }
}

fn category_states(pack: &EvidencePack) -> BTreeMap<Category, CategoryState> {
    pack.unknowns
        .iter()
        .map(|u| {
            let state = match u.status {
                UnknownStatus::Unknown => CategoryState::Unknown,
                UnknownStatus::Verified => CategoryState::Verified,
            };
            (u.category, state)
        })
        .collect()
}

fn diff_unknowns(a: &EvidencePack, b: &EvidencePack) -> UnknownsDiff {
    let old = category_states(a);
    let new = category_states(b);

    let status_changes: Vec<StatusChange> = Category::ALL
        .iter()
        .filter_map(|category| {
            let old_status = old.get(category).copied().unwrap_or(CategoryState::Missing);
            let new_status = new.get(category).copied().unwrap_or(CategoryState::Missing);
            (old_status != new_status).then_some(StatusChange {
                category: *category,
                old_status,
                new_status,
            })
        })
        .collect();

    UnknownsDiff {
        summary: format!("{} status change(s)", status_changes.len()),
        status_changes,
    }
}

fn diff_hashes(a: &EvidencePack, b: &EvidencePack) -> HashSetDelta {
    let old: BTreeSet<&String> = a.hashes.snippets.iter().collect();
    let new: BTreeSet<&String> = b.hashes.snippets.iter().collect();

    let added: Vec<String> = new.difference(&old).map(|h| h.to_string()).collect();
    let removed: Vec<String> = old.difference(&new).map(|h| h.to_string()).collect();
    let unchanged = old.intersection(&new).count();

    HashSetDelta {
        summary: format!("+{} -{} ={}", added.len(), removed.len(), unchanged),
        added,
        removed,
        unchanged,
    }
}

fn diff_visibility(a: &EvidencePack, b: &EvidencePack) -> VisibilityDelta {
    let old_score = a.metrics.visibility.score;
    let new_score = b.metrics.visibility.score;
    let delta = round4(new_score - old_score);

    let mut component_deltas: BTreeMap<String, f64> = a
        .metrics
        .completeness
        .components
        .named()
        .iter()
        .zip(b.metrics.completeness.components.named())
        .map(|((name, old), (_, new))| (name.to_string(), round4(new - old)))
        .collect();
    component_deltas.insert(
        "completeness".to_string(),
        round4(b.metrics.completeness.score - a.metrics.completeness.score),
    );

    VisibilityDelta {
        old_score,
        new_score,
        delta,
        direction: Direction::from_delta(delta),
        component_deltas,
    }
}

fn signed_points(delta: f64) -> String {
    format!("{:+.2} pts", delta * 100.0)
}

/// Markdown report for a diff; hash listings capped at `hash_cap`
pub fn render_diff_report(diff: &DiffResult, hash_cap: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let vis = &diff.visibility_delta;

    lines.push("# Evidence Pack Diff".to_string());
    lines.push(String::new());
    lines.push(format!(
        "**Pack A:** `{}` ({})",
        diff.pack_a_ref.run_id,
        diff.pack_a_ref.generated_at.to_rfc3339()
    ));
    lines.push(format!(
        "**Pack B:** `{}` ({})",
        diff.pack_b_ref.run_id,
        diff.pack_b_ref.generated_at.to_rfc3339()
    ));
    lines.push(format!("**Diff Version:** {}", diff.diff_version));
    lines.push(String::new());

    lines.push("## Claim Visibility".to_string());
    lines.push(String::new());
    lines.push(format!("- Old: {}", format_percent(vis.old_score)));
    lines.push(format!("- New: {}", format_percent(vis.new_score)));
    lines.push(format!(
        "- Delta: {} ({})",
        signed_points(vis.delta),
        vis.direction.as_str()
    ));
    if !vis.component_deltas.is_empty() {
        lines.push(String::new());
        lines.push("| Component | Delta |".to_string());
        lines.push("|-----------|-------|".to_string());
        for (name, delta) in &vis.component_deltas {
            lines.push(format!("| {} | {} |", name, signed_points(*delta)));
        }
    }
    lines.push(String::new());

    for (section, section_diff) in &diff.per_section {
        lines.push(format!("## {} ({})", section, section_diff.summary));
        lines.push(String::new());
        if section_diff.is_empty() {
            lines.push("No changes detected.".to_string());
            lines.push(String::new());
            continue;
        }
        if !section_diff.added.is_empty() {
            lines.push("**Added:**".to_string());
            for claim in &section_diff.added {
                lines.push(format!("- {}", claim.statement));
            }
            lines.push(String::new());
        }
        if !section_diff.removed.is_empty() {
            lines.push("**Removed:**".to_string());
            for claim in &section_diff.removed {
                lines.push(format!("- {}", claim.statement));
            }
            lines.push(String::new());
        }
        if !section_diff.changed.is_empty() {
            lines.push("**Changed:**".to_string());
            for change in &section_diff.changed {
                lines.push(format!("- {}", change.statement));
                lines.push(format!(
                    "  - hashes: [{}] -> [{}]",
                    change.old_hashes.join(", "),
                    change.new_hashes.join(", ")
                ));
                lines.push(format!("  - confidence delta: {:+.4}", change.confidence_delta));
            }
            lines.push(String::new());
        }
    }

    let unknowns = &diff.unknown_status_changes;
    lines.push(format!("## Unknown Category Changes ({})", unknowns.summary));
    lines.push(String::new());
    if unknowns.status_changes.is_empty() {
        lines.push("No category status changes.".to_string());
    } else {
        for change in &unknowns.status_changes {
            lines.push(format!(
                "- **{}**: {} -> {}",
                change.category, change.old_status, change.new_status
            ));
        }
    }
    lines.push(String::new());

    let hashes = &diff.hash_set_delta;
    lines.push(format!("## Snippet Hash Changes ({})", hashes.summary));
    lines.push(String::new());
    push_capped(&mut lines, "New", &hashes.added, hash_cap);
    push_capped(&mut lines, "Removed", &hashes.removed, hash_cap);
    lines.push(format!("Unchanged: {}", hashes.unchanged));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn push_capped(lines: &mut Vec<String>, label: &str, hashes: &[String], cap: usize) {
    if hashes.is_empty() {
        return;
    }
    lines.push(format!("**{} ({}):**", label, hashes.len()));
    for hash in hashes.iter().take(cap) {
        lines.push(format!("- `{}`", hash));
    }
    if hashes.len() > cap {
        lines.push(format!("- ... and {} more", hashes.len() - cap));
    }
    lines.push(String::new());
}

/// Write `diff.json` and `DIFF_REPORT.md` under `output_dir`
pub fn save_diff(
    diff: &DiffResult,
    output_dir: &Path,
    hash_cap: usize,
) -> Result<(PathBuf, PathBuf), PackError> {
    let json_path = output_dir.join(DIFF_FILE);
    let json = serde_json::to_string_pretty(diff).map_err(|source| PackError::Json {
        path: json_path.clone(),
        source,
    })?;
    write_atomic(&json_path, &json)?;

    let report_path = output_dir.join(DIFF_REPORT_FILE);
    write_atomic(&report_path, &render_diff_report(diff, hash_cap))?;

    info!(
        sections = diff.per_section.len(),
        status_changes = diff.unknown_status_changes.status_changes.len(),
        hashes = %diff.hash_set_delta.summary,
        "Diff written"
    );
    Ok((json_path, report_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CompletenessComponents, CompletenessMetric, KnownUnknownEntry, PackCoverage, PackHashes,
        PackMetrics, PackSummary, StructuralVisibilityMetric, VerifiedStructural,
        VisibilityMetric,
    };
    use crate::evidence::{EvidenceAnchor, SnippetAnchor};
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn claim(statement: &str, hash: &str, confidence: f64) -> VerifiedClaim {
        VerifiedClaim {
            id: format!("id-{}", statement),
            statement: statement.to_string(),
            section: "Runtime".to_string(),
            evidence: vec![EvidenceAnchor::Snippet(SnippetAnchor {
                path: "main.py".to_string(),
                line_start: 1,
                line_end: 1,
                content_hash: hash.to_string(),
                display_label: "main.py:1".to_string(),
                hash_verified: true,
            })],
            confidence,
        }
    }

    fn pack(run_id: &str, claims: Vec<VerifiedClaim>, visibility: f64) -> EvidencePack {
        let snippets = claims
            .iter()
            .flat_map(|c| c.evidence.iter().map(|a| a.content_hash().to_string()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let mut verified = BTreeMap::new();
        verified.insert("Runtime".to_string(), claims);

        EvidencePack {
            schema_version: "1.0".to_string(),
            tool_version: "0.1.0".to_string(),
            generated_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            mode: "local".to_string(),
            run_id: run_id.to_string(),
            verified,
            verified_structural: VerifiedStructural::default(),
            unknowns: Category::ALL
                .iter()
                .map(|&c| KnownUnknownEntry::unknown(c, ""))
                .collect(),
            metrics: PackMetrics {
                visibility: VisibilityMetric {
                    score: visibility,
                    label: "Claim Visibility".to_string(),
                    formula: "f".to_string(),
                    verified_claims: 0,
                    total_claims: 0,
                    interpretation: "i".to_string(),
                },
                completeness: CompletenessMetric {
                    score: 0.3,
                    label: "Reporting Completeness".to_string(),
                    formula: "f".to_string(),
                    components: CompletenessComponents::default(),
                    interpretation: "i".to_string(),
                },
                structural_visibility: StructuralVisibilityMetric {
                    score: None,
                    label: "s".to_string(),
                    formula: "f".to_string(),
                    status: "not_implemented".to_string(),
                    interpretation: "i".to_string(),
                },
            },
            hashes: PackHashes { snippets },
            summary: PackSummary::default(),
            coverage: PackCoverage::default(),
            replit_profile: None,
        }
    }

    #[test]
    fn test_identity_diff_is_empty() {
        let a = pack("a", vec![claim("Uses Flask", "aaaaaaaaaaaa", 0.9)], 0.5);
        let diff = diff_packs(&a, &a);

        assert!(diff.is_identity());
        assert_eq!(diff.per_section["Runtime"].summary, "+0 -0 ~0");
        assert_eq!(diff.visibility_delta.delta, 0.0);
        assert_eq!(diff.visibility_delta.direction, Direction::Unchanged);
        assert_eq!(diff.hash_set_delta.unchanged, 1);
    }

    #[test]
    fn test_claims_keyed_by_statement() {
        let a = pack(
            "a",
            vec![
                claim("Uses Flask", "aaaaaaaaaaaa", 0.9),
                claim("Listens on 8080", "bbbbbbbbbbbb", 0.8),
            ],
            0.5,
        );
        let mut renamed = claim("Uses Flask", "aaaaaaaaaaaa", 0.9);
        renamed.id = "a-different-id".to_string();
        let b = pack(
            "b",
            vec![
                renamed,
                claim("Listens on 8080", "cccccccccccc", 0.6),
                claim("Runs gunicorn", "dddddddddddd", 0.7),
            ],
            0.75,
        );

        let diff = diff_packs(&a, &b);
        let runtime = &diff.per_section["Runtime"];
        assert_eq!(runtime.summary, "+1 -0 ~1");
        assert_eq!(runtime.added[0].statement, "Runs gunicorn");
        assert_eq!(runtime.changed[0].statement, "Listens on 8080");
        assert_eq!(runtime.changed[0].old_hashes, vec!["bbbbbbbbbbbb"]);
        assert_eq!(runtime.changed[0].new_hashes, vec!["cccccccccccc"]);
        assert_eq!(runtime.changed[0].confidence_delta, -0.2);

        assert_eq!(diff.visibility_delta.delta, 0.25);
        assert_eq!(diff.visibility_delta.direction, Direction::Improved);
        assert_eq!(diff.hash_set_delta.summary, "+2 -1 =1");
    }

    #[test]
    fn test_single_category_transition() {
        let a = pack("a", vec![], 0.0);
        let mut b = pack("b", vec![], 0.0);
        b.unknowns[0].status = UnknownStatus::Verified;

        let diff = diff_packs(&a, &b);
        let changes = &diff.unknown_status_changes.status_changes;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].category, Category::TlsTermination);
        assert_eq!(changes[0].old_status, CategoryState::Unknown);
        assert_eq!(changes[0].new_status, CategoryState::Verified);
    }

    #[test]
    fn test_missing_category_reported() {
        let a = pack("a", vec![], 0.0);
        let mut b = pack("b", vec![], 0.0);
        b.unknowns.retain(|u| u.category != Category::DataResidency);

        let diff = diff_packs(&a, &b);
        let changes = &diff.unknown_status_changes.status_changes;
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new_status, CategoryState::Missing);
    }

    #[test]
    fn test_report_caps_hash_listing() {
        let a = pack("a", vec![], 0.0);
        let claims = (0..12)
            .map(|n| claim(&format!("claim {}", n), &format!("{:012x}", n), 0.5))
            .collect();
        let b = pack("b", claims, 0.4);

        let report = render_diff_report(&diff_packs(&a, &b), 10);
        assert!(report.contains("**New (12):**"));
        assert!(report.contains("- ... and 2 more"));
        assert!(report.contains("No category status changes."));
        assert!(report.contains("- Delta: +40.00 pts (improved)"));
    }

    #[test]
    fn test_save_diff_writes_both_files() {
        let temp = TempDir::new().unwrap();
        let a = pack("a", vec![], 0.0);
        let (json_path, report_path) = save_diff(&diff_packs(&a, &a), temp.path(), 10).unwrap();

        let parsed: DiffResult =
            serde_json::from_str(&std::fs::read_to_string(json_path).unwrap()).unwrap();
        assert!(parsed.is_identity());
        assert!(report_path.exists());

        let mut names: Vec<String> = std::fs::read_dir(temp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec![DIFF_REPORT_FILE, DIFF_FILE]);
    }
}
