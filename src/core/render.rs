//! Render engine.
//!
//! Maps an EvidencePack to markdown for one audience. Rendering reads only
//! fields already present in the pack: it never touches the analyzed
//! repository and never recomputes scores.
//!
//! Modes:
//! - engineer: numbered audit sections, every verified claim with anchors,
//!   the known-unknown table, a capped hash listing
//! - auditor: VERIFIED and UNKNOWN content only, no narrative
//! - executive: metrics first, no file/line detail, blind spots
//! - plain: a non-technical one-pager with at most five items per list

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::assembler::{assert_pack_exists, write_atomic, PackError};
use crate::config::ToolConfig;
use crate::domain::{
    Category, EvidencePack, KnownUnknownEntry, UnknownStatus, VerifiedClaim, EVIDENCE_PACK_FILE,
};
use crate::evidence::EvidenceAnchor;

/// Width of executive-mode progress bars
const BAR_WIDTH: usize = 20;

/// Items per list in plain mode
const PLAIN_LIMIT: usize = 5;

/// Sections surfaced first in plain mode, in order
const PLAIN_SECTION_PRIORITY: &[&str] = &[
    "Identity of Target System",
    "Purpose & Jobs-to-be-done",
    "How to Use the Target System",
    "Capability Map",
    "Architecture Snapshot",
    "Integration Surface",
    "Data & Security Posture",
    "Operational Reality",
];

/// Unknown categories surfaced first in plain mode, in order
const PLAIN_UNKNOWN_PRIORITY: &[Category] = &[
    Category::SecretManagement,
    Category::DeploymentTopology,
    Category::TlsTermination,
    Category::RuntimeIam,
    Category::MonitoringAlerting,
    Category::EncryptionAtRest,
    Category::LoggingSink,
    Category::BackupRetention,
    Category::DataResidency,
];

/// Report audience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    Engineer,
    Auditor,
    Executive,
    Plain,
}

impl RenderMode {
    pub const ALL: [RenderMode; 4] = [
        RenderMode::Engineer,
        RenderMode::Auditor,
        RenderMode::Executive,
        RenderMode::Plain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Engineer => "engineer",
            RenderMode::Auditor => "auditor",
            RenderMode::Executive => "executive",
            RenderMode::Plain => "plain",
        }
    }

    /// `REPORT_<MODE>.md`
    pub fn report_file_name(&self) -> String {
        format!("REPORT_{}.md", self.as_str().to_uppercase())
    }
}

impl std::fmt::Display for RenderMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Render a pack for one audience
pub fn render(pack: &EvidencePack, mode: RenderMode, config: &ToolConfig) -> String {
    let mut out = Report::default();
    match mode {
        RenderMode::Engineer => render_engineer(&mut out, pack, config.hash_listing_cap),
        RenderMode::Auditor => render_auditor(&mut out, pack),
        RenderMode::Executive => render_executive(&mut out, pack),
        RenderMode::Plain => render_plain(&mut out, pack),
    }
    out.finish()
}

/// Fail loudly unless the pack was durably written.
///
/// Accepts the pack file itself or the directory that should contain it.
pub fn assert_pack_written(path: &Path) -> Result<PathBuf, PackError> {
    let expected = if path.is_dir() {
        path.join(EVIDENCE_PACK_FILE)
    } else {
        path.to_path_buf()
    };
    assert_pack_exists(&expected)?;
    Ok(expected)
}

/// Write a rendered report as `REPORT_<MODE>.md` under `output_dir`
pub fn save_report(content: &str, output_dir: &Path, mode: RenderMode) -> Result<PathBuf, PackError> {
    let path = output_dir.join(mode.report_file_name());
    write_atomic(&path, content)?;
    Ok(path)
}

/// Percentage with two decimals, shared by every mode
pub fn format_percent(score: f64) -> String {
    format!("{:.2}%", score * 100.0)
}

/// `[#####---------------]` for a ratio in [0, 1]
pub fn progress_bar(score: f64) -> String {
    let filled = ((score.clamp(0.0, 1.0)) * BAR_WIDTH as f64).floor() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Line buffer for report text
#[derive(Default)]
struct Report {
    text: String,
}

impl Report {
    fn line(&mut self, line: impl AsRef<str>) {
        self.text.push_str(line.as_ref());
        self.text.push('\n');
    }

    fn blank(&mut self) {
        self.text.push('\n');
    }

    fn finish(self) -> String {
        self.text
    }
}

/// Escape a value for a markdown table cell
fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn anchor_label(anchor: &EvidenceAnchor) -> String {
    let display = if anchor.display_label().is_empty() {
        anchor.path()
    } else {
        anchor.display_label()
    };
    if anchor.content_hash().is_empty() {
        format!("`{}`", display)
    } else {
        format!("`{}` (hash: `{}`)", display, anchor.content_hash())
    }
}

fn header(out: &mut Report, pack: &EvidencePack, title: &str) {
    out.line(format!("# Repository Reconnaissance: {}", title));
    out.blank();
    out.line(format!("**Schema Version:** {}", pack.schema_version));
    out.line(format!("**Tool Version:** {}", pack.tool_version));
    out.line(format!("**Generated:** {}", pack.generated_at.to_rfc3339()));
    out.line(format!("**Mode:** {}", pack.mode));
    out.line(format!("**Run ID:** {}", pack.run_id));
    out.blank();
    out.line("---");
    out.blank();
}

fn render_engineer(out: &mut Report, pack: &EvidencePack, hash_cap: usize) {
    header(out, pack, "Engineer View");

    let summary = &pack.summary;
    let coverage = &pack.coverage;
    let visibility = &pack.metrics.visibility;
    let completeness = &pack.metrics.completeness;
    let structural = &pack.metrics.structural_visibility;

    out.line(format!("## Contract Audit: Run {}", pack.run_id));
    out.blank();

    out.line("### 1. System Snapshot");
    out.blank();
    out.line("| Measure | Value |");
    out.line("|---------|-------|");
    out.line(format!("| Files Analyzed | {} |", coverage.analyzed_files));
    out.line(format!("| Files Seen (incl. skipped) | {} |", coverage.total_files_seen));
    out.line(format!("| Files Skipped | {} |", coverage.skipped_files));
    out.line(format!("| Claims Extracted | {} |", summary.total_claims));
    out.line(format!("| Claims with Deterministic Evidence | {} |", summary.verified_claims));
    out.line(format!("| Unknown Categories | {} |", summary.unknown_categories));
    out.line(format!("| Verified Categories | {} |", summary.verified_categories));
    out.line(format!(
        "| Partial Coverage | {} |",
        if coverage.partial { "Yes" } else { "No" }
    ));
    out.blank();
    if !coverage.skipped_types.is_empty() {
        let types = coverage
            .skipped_types
            .iter()
            .map(|(ext, n)| format!("{} ({})", ext, n))
            .collect::<Vec<_>>()
            .join(", ");
        out.line(format!("Skipped types: {}", types));
        out.blank();
    }
    if !coverage.timeouts.is_empty() {
        out.line(format!("Timed out: {}", coverage.timeouts.join(", ")));
        out.blank();
    }
    if let Some(profile) = &pack.replit_profile {
        out.line(format!(
            "Replit workspace: {} | run: {} | language: {} | port: {}",
            if profile.is_replit { "yes" } else { "no" },
            profile.run_command.as_deref().unwrap_or("unknown"),
            profile.language.as_deref().unwrap_or("unknown"),
            profile
                .port
                .map(|p| p.to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        ));
        out.blank();
    }

    out.line(format!("### 2. {}", visibility.label));
    out.blank();
    out.line(format!("**Score:** {}", format_percent(visibility.score)));
    out.line(format!("**Formula:** `{}`", visibility.formula));
    out.blank();
    out.line(format!(
        "{} of {} extracted claims contain hash-verified evidence.",
        visibility.verified_claims, visibility.total_claims
    ));
    out.blank();
    out.line(format!("*{}*", visibility.interpretation));
    out.blank();

    out.line(format!("### 3. {}", completeness.label));
    out.blank();
    out.line(format!("**Score:** {}", format_percent(completeness.score)));
    out.line(format!("**Formula:** `{}`", completeness.formula));
    out.blank();
    out.line("| Component | Score |");
    out.line("|-----------|-------|");
    for (name, value) in completeness.components.named() {
        out.line(format!("| {} | {} |", name, format_percent(value)));
    }
    out.blank();
    out.line(format!("*{}*", completeness.interpretation));
    out.blank();

    out.line("### 4. Structural Visibility");
    out.blank();
    out.line(format!("**Status:** {}", structural.status));
    out.line(format!(
        "**Score:** {}",
        structural
            .score
            .map(format_percent)
            .unwrap_or_else(|| "null".to_string())
    ));
    out.line(format!("**Formula (reserved):** `{}`", structural.formula));
    out.blank();
    out.line(format!("*{}*", structural.interpretation));
    out.blank();

    out.line("### 5. Epistemic Posture");
    out.blank();
    out.line(format!(
        "- Verified: {} claim(s) with hash-verified evidence, {} categor{} proven by artifact content.",
        summary.verified_claims,
        summary.verified_categories,
        if summary.verified_categories == 1 { "y" } else { "ies" }
    ));
    out.line(format!(
        "- Unknown: {} operational categor{} without deterministic evidence.",
        summary.unknown_categories,
        if summary.unknown_categories == 1 { "y" } else { "ies" }
    ));
    let unmeasured: Vec<&str> = pack.verified_structural.notes.keys().map(String::as_str).collect();
    if unmeasured.is_empty() {
        out.line(format!("- Not implemented: {}.", structural.label));
    } else {
        out.line(format!(
            "- Not implemented: {}; unmeasured structural buckets: {}.",
            structural.label,
            unmeasured.join(", ")
        ));
    }
    out.line("- No category moves from UNKNOWN to VERIFIED by inference.");
    out.blank();
    out.line("---");
    out.blank();

    for (section, claims) in &pack.verified {
        out.line(format!("## Verified: {}", section));
        out.blank();
        if claims.is_empty() {
            out.line("No verified claims in this section.");
            out.blank();
            continue;
        }
        for claim in claims {
            out.line(format!("### {}", claim.statement));
            out.line(format!("Claim ID: `{}`", claim.id));
            out.line(format!("Confidence: {:.0}%", claim.confidence * 100.0));
            for anchor in &claim.evidence {
                out.line(format!("- Evidence: {}", anchor_label(anchor)));
            }
            out.blank();
        }
    }

    out.line("## Verified Structural (deterministic extractors only)");
    out.blank();
    for (bucket, items) in pack.verified_structural.buckets() {
        if items.is_empty() {
            continue;
        }
        out.line(format!("### {}", bucket));
        out.blank();
        for item in items {
            out.line(format!("- {}", item.statement));
            out.line(format!("  Source: `{}`", item.source));
            for anchor in &item.evidence {
                out.line(format!("  Evidence: {}", anchor_label(anchor)));
            }
        }
        out.blank();
    }
    for (bucket, note) in &pack.verified_structural.notes {
        out.line(format!("- **{}**: {}", bucket, note));
    }
    if !pack.verified_structural.notes.is_empty() {
        out.blank();
    }

    out.line("## Known Unknown Surface");
    out.blank();
    out.line("| Category | Status | Notes | Resolve With |");
    out.line("|----------|--------|-------|--------------|");
    for entry in &pack.unknowns {
        out.line(format!(
            "| {} | {} | {} | {} |",
            entry.category,
            entry.status,
            cell(&entry.notes),
            cell(&entry.resolve_with)
        ));
    }
    out.blank();

    let hashes = &pack.hashes.snippets;
    out.line(format!("## Snippet Hashes ({} total)", hashes.len()));
    out.blank();
    for hash in hashes.iter().take(hash_cap) {
        out.line(format!("- `{}`", hash));
    }
    if hashes.len() > hash_cap {
        out.line(format!("- ... and {} more", hashes.len() - hash_cap));
    }
}

fn render_auditor(out: &mut Report, pack: &EvidencePack) {
    header(out, pack, "Auditor View");
    out.line("This report shows only VERIFIED and UNKNOWN findings.");
    out.line("No inferred narrative is included.");
    out.blank();

    out.line("## Known Unknown Surface");
    out.blank();
    out.line("| Category | Status | Description | Evidence Anchors |");
    out.line("|----------|--------|-------------|------------------|");
    for entry in &pack.unknowns {
        let anchors = entry
            .evidence
            .iter()
            .map(anchor_label)
            .collect::<Vec<_>>()
            .join(", ");
        out.line(format!(
            "| {} | **{}** | {} | {} |",
            entry.category,
            entry.status,
            cell(&entry.description),
            if anchors.is_empty() { "none".to_string() } else { cell(&anchors) }
        ));
    }
    out.blank();

    for (section, claims) in &pack.verified {
        // `verified` already holds only verified evidence
        let rendered: Vec<&VerifiedClaim> =
            claims.iter().filter(|c| !c.evidence.is_empty()).collect();
        if rendered.is_empty() {
            continue;
        }

        out.line(format!("## Verified: {}", section));
        out.blank();
        for claim in rendered {
            out.line(format!("- **{}**", claim.statement));
            out.line(format!("  Confidence: {:.0}%", claim.confidence * 100.0));
            for anchor in &claim.evidence {
                out.line(format!("  - Evidence anchor: {}", anchor_label(anchor)));
            }
            out.blank();
        }
    }

    let metrics = &pack.metrics;
    out.line(format!("## {}", metrics.visibility.label));
    out.blank();
    out.line(format!(
        "**{}**: {}",
        format_percent(metrics.visibility.score),
        metrics.visibility.interpretation
    ));
    out.blank();
    out.line(format!("## {}", metrics.structural_visibility.label));
    out.blank();
    out.line(format!(
        "**Status:** {}: {}",
        metrics.structural_visibility.status, metrics.structural_visibility.interpretation
    ));
    out.blank();
    out.line(format!("## {}", metrics.completeness.label));
    out.blank();
    out.line(format!(
        "**{}**: {}",
        format_percent(metrics.completeness.score),
        metrics.completeness.interpretation
    ));
}

fn render_executive(out: &mut Report, pack: &EvidencePack) {
    let metrics = &pack.metrics;
    let summary = &pack.summary;
    let total_categories = pack.unknowns.len();

    out.line("# Repository Reconnaissance: Executive Summary");
    out.blank();
    out.line(format!("**Generated:** {}", pack.generated_at.to_rfc3339()));
    out.blank();
    out.line("---");
    out.blank();

    out.line("## Key Metrics");
    out.blank();
    out.line("| Metric | Value |");
    out.line("|--------|-------|");
    out.line(format!(
        "| {} | {} |",
        metrics.visibility.label,
        format_percent(metrics.visibility.score)
    ));
    out.line(format!(
        "| {} | {} |",
        metrics.structural_visibility.label, metrics.structural_visibility.status
    ));
    out.line(format!(
        "| {} | {} |",
        metrics.completeness.label,
        format_percent(metrics.completeness.score)
    ));
    out.line(format!("| Files Scanned | {} |", summary.total_files));
    out.line(format!("| Total Claims | {} |", summary.total_claims));
    out.line(format!("| Verified Claims | {} |", summary.verified_claims));
    out.line(format!(
        "| Unknown Categories | {} / {} |",
        summary.unknown_categories, total_categories
    ));
    out.line(format!(
        "| Verified Categories | {} / {} |",
        summary.verified_categories, total_categories
    ));
    out.blank();
    out.line(format!("*{}: {}*", metrics.visibility.label, metrics.visibility.interpretation));
    out.line(format!(
        "*{}: {}*",
        metrics.structural_visibility.label, metrics.structural_visibility.interpretation
    ));
    out.line(format!(
        "*{}: {}*",
        metrics.completeness.label, metrics.completeness.interpretation
    ));
    out.blank();

    out.line("## Completeness Breakdown");
    out.blank();
    for (name, value) in metrics.completeness.components.named() {
        out.line(format!(
            "- **{}**: {} {:.0}%",
            name,
            progress_bar(value),
            value * 100.0
        ));
    }
    out.blank();

    out.line("## Verified Surface Area");
    out.blank();
    if pack.verified.is_empty() {
        out.line("- No verified claims with deterministic evidence.");
    } else {
        for (section, claims) in &pack.verified {
            out.line(format!("- {}: {} verified claim(s)", section, claims.len()));
        }
    }
    out.blank();

    out.line("## Operational Blind Spots");
    out.blank();
    let blind_spots: Vec<&KnownUnknownEntry> = pack.unknown_entries().collect();
    if blind_spots.is_empty() {
        out.line("No categories remain UNKNOWN.");
    } else {
        out.line("*The following categories lack deterministic evidence.*");
        out.blank();
        for entry in blind_spots {
            out.line(format!("- **{}**: {}", entry.category, entry.description));
        }
    }
}

/// Priority claims for plain mode: priority sections first, then padding
/// from any remaining section. The bool marks padded picks.
fn plain_claims(pack: &EvidencePack) -> Vec<(&VerifiedClaim, bool)> {
    let mut picked: Vec<(&VerifiedClaim, bool)> = Vec::new();

    for wanted in PLAIN_SECTION_PRIORITY {
        let matching = pack
            .verified
            .iter()
            .filter(|(section, _)| section.trim().eq_ignore_ascii_case(wanted))
            .flat_map(|(_, claims)| claims);
        for claim in matching {
            if picked.len() == PLAIN_LIMIT {
                return picked;
            }
            picked.push((claim, false));
        }
    }

    for claim in pack.verified_claims() {
        if picked.len() == PLAIN_LIMIT {
            break;
        }
        if !picked.iter().any(|(c, _)| std::ptr::eq(*c, claim)) {
            picked.push((claim, true));
        }
    }
    picked
}

/// Priority unknowns for plain mode, in the fixed category order
fn plain_unknowns(pack: &EvidencePack) -> Vec<&KnownUnknownEntry> {
    let mut picked: Vec<&KnownUnknownEntry> = PLAIN_UNKNOWN_PRIORITY
        .iter()
        .filter_map(|category| {
            pack.unknowns
                .iter()
                .find(|u| u.category == *category && u.status == UnknownStatus::Unknown)
        })
        .take(PLAIN_LIMIT)
        .collect();

    for entry in pack.unknown_entries() {
        if picked.len() == PLAIN_LIMIT {
            break;
        }
        if !picked.iter().any(|u| u.category == entry.category) {
            picked.push(entry);
        }
    }
    picked
}

fn render_plain(out: &mut Report, pack: &EvidencePack) {
    let metrics = &pack.metrics;

    out.line("# Repository Reconnaissance: At a Glance");
    out.blank();
    out.line(format!(
        "Generated {} for run {}.",
        pack.generated_at.format("%Y-%m-%d %H:%M UTC"),
        pack.run_id
    ));
    out.blank();

    out.line(format!(
        "We checked {} file(s) and {} statement(s) about this project. {} of them are backed by source lines we re-read and confirmed ({}).",
        pack.summary.total_files,
        pack.summary.total_claims,
        pack.summary.verified_claims,
        format_percent(metrics.visibility.score)
    ));
    out.blank();
    out.line(format!("*{}*", metrics.visibility.interpretation));
    out.blank();

    out.line("## What we can confirm");
    out.blank();
    let claims = plain_claims(pack);
    if claims.is_empty() {
        out.line("Nothing yet: no statement is backed by confirmed source lines.");
    } else {
        for (claim, padded) in claims {
            if padded {
                out.line(format!(
                    "- {} (additional, outside the priority topics)",
                    claim.statement
                ));
            } else {
                out.line(format!("- {}", claim.statement));
            }
        }
    }
    out.blank();

    out.line("## What we could not confirm");
    out.blank();
    let unknowns = plain_unknowns(pack);
    if unknowns.is_empty() {
        out.line("Every operational topic we track has direct evidence.");
    } else {
        for entry in unknowns {
            out.line(format!("- **{}**: {}", plain_category_name(entry.category), entry.description));
            out.line(format!("  How to close the gap: {}", entry.resolve_with));
        }
    }
    out.blank();

    if pack.coverage.partial {
        out.line("Note: some files were skipped or timed out, so this picture is incomplete.");
        out.blank();
    }
}

fn plain_category_name(category: Category) -> &'static str {
    match category {
        Category::TlsTermination => "Encrypted connections (TLS)",
        Category::EncryptionAtRest => "Encryption of stored data",
        Category::SecretManagement => "Handling of passwords and keys",
        Category::DeploymentTopology => "Where and how it runs in production",
        Category::RuntimeIam => "Who and what is allowed access",
        Category::LoggingSink => "Where logs go",
        Category::MonitoringAlerting => "Monitoring and alerts",
        Category::BackupRetention => "Backups",
        Category::DataResidency => "Where data is stored geographically",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CompletenessComponents, CompletenessMetric, PackCoverage, PackHashes, PackMetrics,
        PackSummary, StructuralVisibilityMetric, VerifiedStructural, VisibilityMetric,
    };
    use crate::evidence::SnippetAnchor;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn verified_claim(id: &str, section: &str) -> VerifiedClaim {
        VerifiedClaim {
            id: id.to_string(),
            statement: format!("Statement {}", id),
            section: section.to_string(),
            evidence: vec![EvidenceAnchor::Snippet(SnippetAnchor {
                path: "src/app.ts".to_string(),
                line_start: 3,
                line_end: 4,
                content_hash: format!("hash{}", id),
                display_label: "src/app.ts:3-4".to_string(),
                hash_verified: true,
            })],
            confidence: 0.8,
        }
    }

    fn pack(sections: &[(&str, Vec<VerifiedClaim>)], hashes: usize) -> EvidencePack {
        let verified: BTreeMap<String, Vec<VerifiedClaim>> = sections
            .iter()
            .map(|(s, c)| (s.to_string(), c.clone()))
            .collect();
        let verified_count = verified.values().map(Vec::len).sum();

        EvidencePack {
            schema_version: "1.0".to_string(),
            tool_version: "0.1.0".to_string(),
            generated_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            mode: "local".to_string(),
            run_id: "run-42".to_string(),
            verified,
            verified_structural: VerifiedStructural::default(),
            unknowns: Category::ALL
                .iter()
                .map(|&c| KnownUnknownEntry::unknown(c, "none"))
                .collect(),
            metrics: PackMetrics {
                visibility: VisibilityMetric {
                    score: 0.8824,
                    label: "Claim Visibility".to_string(),
                    formula: "verified_claims / total_claims".to_string(),
                    verified_claims: 15,
                    total_claims: 17,
                    interpretation: "claims only".to_string(),
                },
                completeness: CompletenessMetric {
                    score: 0.5008,
                    label: "Reporting Completeness".to_string(),
                    formula: "average".to_string(),
                    components: CompletenessComponents {
                        claims_coverage: 0.8824,
                        unknowns_coverage: 0.0,
                        howto_completeness: 0.62,
                    },
                    interpretation: "not security".to_string(),
                },
                structural_visibility: StructuralVisibilityMetric {
                    score: None,
                    label: "Structural Visibility".to_string(),
                    formula: "reserved".to_string(),
                    status: "not_implemented".to_string(),
                    interpretation: "unmeasured".to_string(),
                },
            },
            hashes: PackHashes {
                snippets: (0..hashes).map(|n| format!("{:012x}", n)).collect(),
            },
            summary: PackSummary {
                total_files: 40,
                total_claims: 17,
                verified_claims: verified_count,
                unknown_categories: 9,
                verified_categories: 0,
            },
            coverage: PackCoverage {
                analyzed_files: 40,
                total_files_seen: 40,
                ..Default::default()
            },
            replit_profile: None,
        }
    }

    #[test]
    fn test_report_file_names() {
        assert_eq!(RenderMode::Engineer.report_file_name(), "REPORT_ENGINEER.md");
        assert_eq!(RenderMode::Plain.report_file_name(), "REPORT_PLAIN.md");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0), "[--------------------]");
        assert_eq!(progress_bar(0.5), "[##########----------]");
        assert_eq!(progress_bar(1.0), "[####################]");
        assert_eq!(progress_bar(2.0), "[####################]");
    }

    #[test]
    fn test_engineer_hash_listing_capped() {
        let config = ToolConfig::default();
        let text = render(&pack(&[], 25), RenderMode::Engineer, &config);
        assert!(text.contains("## Snippet Hashes (25 total)"));
        assert!(text.contains("- ... and 5 more"));
        assert!(text.contains("### 5. Epistemic Posture"));
    }

    #[test]
    fn test_visibility_identical_across_modes() {
        let config = ToolConfig::default();
        let p = pack(&[("Runtime", vec![verified_claim("1", "Runtime")])], 1);
        let engineer = render(&p, RenderMode::Engineer, &config);
        let executive = render(&p, RenderMode::Executive, &config);
        assert!(engineer.contains("88.24%"));
        assert!(executive.contains("88.24%"));
    }

    #[test]
    fn test_executive_has_no_file_detail() {
        let config = ToolConfig::default();
        let p = pack(&[("Runtime", vec![verified_claim("1", "Runtime")])], 1);
        let text = render(&p, RenderMode::Executive, &config);
        assert!(!text.contains("src/app.ts"));
        assert!(text.contains("## Operational Blind Spots"));
        assert!(text.contains("- Runtime: 1 verified claim(s)"));
    }

    #[test]
    fn test_auditor_renders_persisted_evidence_as_is() {
        let config = ToolConfig::default();
        // A stored anchor whose flag reads false is still printed: the pack
        // is the verdict, rendering does not re-run the policy.
        let mut flagged_off = verified_claim("2", "Data");
        if let EvidenceAnchor::Snippet(s) = &mut flagged_off.evidence[0] {
            s.hash_verified = false;
        }
        let mut bare = verified_claim("3", "Secrets");
        bare.evidence.clear();

        let p = pack(
            &[
                ("Runtime", vec![verified_claim("1", "Runtime")]),
                ("Data", vec![flagged_off]),
                ("Secrets", vec![bare]),
            ],
            1,
        );
        let text = render(&p, RenderMode::Auditor, &config);
        assert!(text.contains("## Verified: Runtime"));
        assert!(text.contains("## Verified: Data"));
        assert!(text.contains("Statement 2"));
        assert!(!text.contains("## Verified: Secrets"));
    }

    #[test]
    fn test_plain_prefers_priority_sections() {
        let config = ToolConfig::default();
        let p = pack(
            &[
                ("Architecture Snapshot", vec![verified_claim("a", "Architecture Snapshot")]),
                (
                    "Maintainability & Change Risk",
                    (0..6).map(|n| verified_claim(&format!("m{}", n), "Maintainability & Change Risk")).collect(),
                ),
            ],
            1,
        );
        let picked = plain_claims(&p);
        assert_eq!(picked.len(), 5);
        assert_eq!(picked[0].0.id, "a");
        assert!(!picked[0].1);
        assert!(picked[1..].iter().all(|(_, padded)| *padded));

        let text = render(&p, RenderMode::Plain, &config);
        assert!(text.contains("(additional, outside the priority topics)"));
    }

    #[test]
    fn test_plain_unknowns_priority_order() {
        let p = pack(&[], 0);
        let picked: Vec<Category> = plain_unknowns(&p).iter().map(|u| u.category).collect();
        assert_eq!(
            picked,
            vec![
                Category::SecretManagement,
                Category::DeploymentTopology,
                Category::TlsTermination,
                Category::RuntimeIam,
                Category::MonitoringAlerting,
            ]
        );
    }

    #[test]
    fn test_assert_pack_written() {
        let temp = TempDir::new().unwrap();
        let err = assert_pack_written(temp.path()).unwrap_err();
        assert!(matches!(err, PackError::MissingArtifact { .. }));

        std::fs::write(temp.path().join(EVIDENCE_PACK_FILE), "{}").unwrap();
        let found = assert_pack_written(temp.path()).unwrap();
        assert!(found.ends_with(EVIDENCE_PACK_FILE));
    }

    #[test]
    fn test_save_report_leaves_no_temp_file() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("reports");
        let path = save_report("# Report\n", &out, RenderMode::Plain).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Report\n");
        let names: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["REPORT_PLAIN.md"]);
    }

    #[test]
    fn test_table_cells_escaped() {
        assert_eq!(cell("a | b\nc"), "a \\| b c");
    }
}
