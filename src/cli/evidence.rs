//! Evidence CLI subcommands for inspecting and validating anchors.
//!
//! Provides commands to:
//! - `validate`: re-hash every anchor in a pack against a checkout (drift check)
//! - `show`: display one verified claim with its anchors and cited lines

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use tracing::info;

use crate::config::ToolConfig;
use crate::core::{assert_pack_written, evidence_tier, Assembler};
use crate::domain::{EvidencePack, VerifiedClaim};
use crate::evidence::{check_anchor, read_repo_file, slice_lines, AnchorCheck, EvidenceAnchor};

/// Evidence-related subcommands
#[derive(Subcommand, Debug)]
pub enum EvidenceCommands {
    /// Re-hash every anchor in a pack against a repository checkout
    Validate {
        /// Pack file, or the directory containing it
        pack: PathBuf,

        /// Repository checkout to validate against
        #[arg(long)]
        root: PathBuf,

        /// Exit non-zero when any anchor has drifted
        #[arg(long)]
        strict: bool,
    },

    /// Show one verified claim with its evidence
    Show {
        /// Pack file, or the directory containing it
        pack: PathBuf,

        /// Claim ID (unique prefixes accepted)
        claim_id: String,

        /// Repository checkout for printing cited lines
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

/// Anchor counts by drift outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriftReport {
    pub valid: usize,
    pub stale: usize,
    pub out_of_range: usize,
    pub missing: usize,
}

impl DriftReport {
    pub fn total(&self) -> usize {
        self.valid + self.stale + self.out_of_range + self.missing
    }

    pub fn has_drift(&self) -> bool {
        self.total() != self.valid
    }

    fn record(&mut self, check: AnchorCheck) {
        match check {
            AnchorCheck::Valid => self.valid += 1,
            AnchorCheck::Stale => self.stale += 1,
            AnchorCheck::OutOfRange => self.out_of_range += 1,
            AnchorCheck::Missing => self.missing += 1,
        }
    }
}

fn load_pack(config: &ToolConfig, pack: &Path) -> Result<EvidencePack> {
    let pack_path = assert_pack_written(pack)?;
    Ok(Assembler::new(config).load(&pack_path)?)
}

/// Check every anchor the pack carries, in pack order
pub fn check_pack_anchors(pack: &EvidencePack, root: &Path) -> Vec<(EvidenceAnchor, AnchorCheck)> {
    pack.anchors()
        .map(|anchor| (anchor.clone(), check_anchor(root, anchor)))
        .collect()
}

/// Execute the `evidence validate` command
pub async fn execute_validate(
    config: &ToolConfig,
    pack: &Path,
    root: &Path,
    strict: bool,
) -> Result<()> {
    let loaded = load_pack(config, pack)?;
    if !root.is_dir() {
        anyhow::bail!("Repository root is not a directory: {}", root.display());
    }

    println!("Validating evidence for run {} against {}", loaded.run_id, root.display());
    println!();

    let root_owned = root.to_path_buf();
    let results = tokio::task::spawn_blocking(move || check_pack_anchors(&loaded, &root_owned))
        .await
        .context("Evidence validation task failed")?;

    let mut report = DriftReport::default();
    for (anchor, check) in &results {
        report.record(*check);
        if !check.is_valid() {
            println!(
                "  {}: {} (hash {})",
                check.as_str().to_uppercase(),
                anchor.display_label(),
                anchor.content_hash()
            );
        }
    }

    println!();
    println!("Summary:");
    println!("  Total anchors: {}", report.total());
    println!("  Valid:         {}", report.valid);
    println!("  Stale:         {}", report.stale);
    println!("  Out of range:  {}", report.out_of_range);
    println!("  Missing:       {}", report.missing);

    info!(
        total = report.total(),
        valid = report.valid,
        stale = report.stale,
        missing = report.missing,
        "Evidence drift check complete"
    );

    if report.has_drift() {
        println!();
        println!("Some evidence no longer matches the checkout; re-run analysis to refresh it.");
        if strict {
            anyhow::bail!(
                "{} of {} anchors drifted",
                report.total() - report.valid,
                report.total()
            );
        }
    }

    Ok(())
}

/// Find a claim by exact id, falling back to a unique prefix
pub fn find_claim<'a>(pack: &'a EvidencePack, claim_id: &str) -> Result<&'a VerifiedClaim> {
    if let Some(claim) = pack.find_claim(claim_id) {
        return Ok(claim);
    }

    let matches: Vec<&VerifiedClaim> = pack
        .verified_claims()
        .filter(|c| c.id.starts_with(claim_id))
        .collect();
    match matches.as_slice() {
        [claim] => Ok(claim),
        [] => anyhow::bail!("Verified claim not found: {}", claim_id),
        many => anyhow::bail!(
            "Claim ID prefix '{}' is ambiguous ({} matches)",
            claim_id,
            many.len()
        ),
    }
}

/// Execute the `evidence show` command
pub fn execute_show(
    config: &ToolConfig,
    pack: &Path,
    claim_id: &str,
    root: Option<&Path>,
) -> Result<()> {
    let loaded = load_pack(config, pack)?;
    let claim = find_claim(&loaded, claim_id)?;

    println!("Claim ID:   {}", claim.id);
    println!("Section:    {}", claim.section);
    println!("Confidence: {:.2}", claim.confidence);
    println!();
    println!("Statement:");
    println!("  {}", claim.statement);

    for anchor in &claim.evidence {
        println!();
        println!("Evidence: {} [{}]", anchor.display_label(), evidence_tier(anchor));
        if !anchor.content_hash().is_empty() {
            println!("  Hash: {}", anchor.content_hash());
        }

        let Some(root) = root else {
            continue;
        };
        println!("  Current: {}", check_anchor(root, anchor).as_str());

        if let EvidenceAnchor::Snippet(snippet) = anchor {
            match read_repo_file(root, &snippet.path) {
                Some(content) => match slice_lines(&content, snippet.line_start, snippet.line_end) {
                    Some(lines) => {
                        println!("  ---");
                        for (offset, line) in lines.iter().enumerate() {
                            println!("  {:>5} | {}", snippet.line_start + offset, line);
                        }
                        println!("  ---");
                    }
                    None => println!("  (cited lines are beyond the end of the file)"),
                },
                None => println!("  (file not found under {})", root.display()),
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, KnownUnknownEntry};
    use crate::evidence::{make_file_exists_anchor, make_snippet_anchor, SnippetAnchor};
    use tempfile::TempDir;

    fn pack_with(evidence: Vec<EvidenceAnchor>) -> EvidencePack {
        let claim = VerifiedClaim {
            id: "claim-abc123".to_string(),
            statement: "Serves HTTP with Flask".to_string(),
            section: "Runtime".to_string(),
            evidence,
            confidence: 0.9,
        };
        let mut pack: EvidencePack = serde_json::from_value(serde_json::json!({
            "schema_version": "1.0",
            "tool_version": "0.1.0",
            "generated_at": "2026-03-01T12:00:00Z",
            "mode": "local",
            "run_id": "run-1",
            "verified": {},
            "verified_structural": {},
            "unknowns": [],
            "metrics": {
                "visibility": {"score": 1.0, "label": "l", "formula": "f",
                    "verified_claims": 1, "total_claims": 1, "interpretation": "i"},
                "completeness": {"score": 0.5, "label": "l", "formula": "f",
                    "components": {"claims_coverage": 1.0, "unknowns_coverage": 0.0,
                        "howto_completeness": 0.5}, "interpretation": "i"},
                "structural_visibility": {"score": null, "label": "l", "formula": "f",
                    "status": "not_implemented", "interpretation": "i"}
            },
            "hashes": {"snippets": []},
            "summary": {"total_files": 1, "total_claims": 1, "verified_claims": 1,
                "unknown_categories": 0, "verified_categories": 0},
            "coverage": {"analyzed_files": 1, "total_files_seen": 1,
                "skipped_files": 0, "partial": false}
        }))
        .unwrap();
        pack.verified.insert("Runtime".to_string(), vec![claim]);
        pack.unknowns
            .push(KnownUnknownEntry::unknown(Category::LoggingSink, ""));
        pack
    }

    #[test]
    fn test_drift_counts() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("app.py"), "from flask import Flask\n").unwrap();

        let valid = make_snippet_anchor(temp.path(), "app.py", 1, 1).unwrap();
        let stale = SnippetAnchor {
            content_hash: "ffffffffffff".to_string(),
            ..valid.clone()
        };
        let out_of_range = SnippetAnchor {
            line_start: 40,
            line_end: 41,
            ..valid.clone()
        };
        let missing = make_file_exists_anchor("Dockerfile");

        let pack = pack_with(vec![
            EvidenceAnchor::Snippet(valid),
            EvidenceAnchor::Snippet(stale),
            EvidenceAnchor::Snippet(out_of_range),
            EvidenceAnchor::FileExists(missing),
        ]);

        let mut report = DriftReport::default();
        for (_, check) in check_pack_anchors(&pack, temp.path()) {
            report.record(check);
        }
        assert_eq!(
            report,
            DriftReport {
                valid: 1,
                stale: 1,
                out_of_range: 1,
                missing: 1
            }
        );
        assert!(report.has_drift());
    }

    #[test]
    fn test_find_claim_by_prefix() {
        let pack = pack_with(Vec::new());
        assert_eq!(find_claim(&pack, "claim-abc123").unwrap().id, "claim-abc123");
        assert_eq!(find_claim(&pack, "claim-a").unwrap().id, "claim-abc123");
        assert!(find_claim(&pack, "nope").is_err());
    }
}
