//! EvidencePack assembler.
//!
//! Composes the verification policy, the known-unknowns entries and the
//! metrics engine into one versioned snapshot, validates it against the
//! required-field contract and persists it. This is the only write path to
//! the pack file.
//!
//! # Design Principles
//!
//! - **Pure build**: `build` reads its inputs and returns a new pack. The
//!   timestamp and run id are supplied by the caller.
//! - **No reclassification**: verified claims keep the section the
//!   extractor assigned.
//! - **Unmeasured is not zero**: an empty structural bucket carries a
//!   `not_implemented: <reason>` note instead of a score.
//! - **All-or-nothing persistence**: the pack is validated before it is
//!   written, and written through a temporary file that is renamed into
//!   place, so no partial pack is ever left on disk.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use super::metrics::build_metrics;
use super::policy::{is_evidence_verified, project_verified, revalidate_claim};
use crate::config::ToolConfig;
use crate::domain::{
    Claim, ClaimStatus, ClaimsDocument, CoverageInput, EvidencePack, HowTo, InventoryEntry,
    KnownUnknownEntry, PackCoverage, PackHashes, PackSummary, ReplitProfile, ReplitSummary,
    StructuralItem, UnknownStatus, VerifiedClaim, VerifiedStructural, EVIDENCE_PACK_FILE,
};

/// Top-level fields every persisted pack must carry
pub const REQUIRED_PACK_FIELDS: &[&str] = &[
    "schema_version",
    "tool_version",
    "generated_at",
    "mode",
    "run_id",
    "verified",
    "verified_structural",
    "unknowns",
    "metrics",
    "hashes",
    "summary",
    "coverage",
];

/// Fields every `coverage` object must carry
pub const REQUIRED_COVERAGE_FIELDS: &[&str] =
    &["analyzed_files", "total_files_seen", "skipped_files", "partial"];

/// Fields every `metrics` object must carry
pub const REQUIRED_METRIC_FIELDS: &[&str] = &["visibility", "completeness", "structural_visibility"];

/// Confidence given to structural items taken from deterministic extractors
const STRUCTURAL_CONFIDENCE: f64 = 0.5;

const STRUCTURAL_SOURCE: &str = "deterministic_extractor:howto";

/// Errors raised while persisting or loading packs
#[derive(Debug, Error)]
pub enum PackError {
    #[error(
        "EvidencePack schema validation failed for {} ({} violation(s)):\n{}",
        .path.display(),
        .violations.len(),
        bullet_list(.violations)
    )]
    SchemaViolation {
        path: PathBuf,
        violations: Vec<String>,
    },

    #[error(
        "invalid claims document {} ({} violation(s)):\n{}",
        .path.display(),
        .violations.len(),
        bullet_list(.violations)
    )]
    InvalidClaims {
        path: PathBuf,
        violations: Vec<String>,
    },

    #[error("durable artifact missing: {} (refusing to report on data that was never persisted)", .path.display())]
    MissingArtifact { path: PathBuf },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PackError {
    /// Every violated rule, for schema and input failures
    pub fn violations(&self) -> &[String] {
        match self {
            PackError::SchemaViolation { violations, .. }
            | PackError::InvalidClaims { violations, .. } => violations,
            _ => &[],
        }
    }
}

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|v| format!("  - {}", v))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Everything the assembler consumes for one run
#[derive(Debug, Clone)]
pub struct PackInputs<'a> {
    pub howto: &'a HowTo,
    pub claims: &'a ClaimsDocument,
    pub coverage: &'a CoverageInput,
    pub file_index: &'a [String],
    pub known_unknowns: &'a [KnownUnknownEntry],
    pub replit_profile: Option<&'a ReplitProfile>,
    /// Acquisition mode of the analyzed repository
    pub mode: &'a str,
    pub run_id: &'a str,
    /// Overrides `coverage.skipped_files` when set
    pub skipped_files: Option<usize>,
    /// Overrides `coverage.skipped_types` when set
    pub skipped_types: Option<&'a BTreeMap<String, usize>>,
    /// Overrides `coverage.timeouts` when set
    pub timeouts: Option<&'a [String]>,
    pub generated_at: DateTime<Utc>,
}

/// Builds, validates and persists EvidencePacks for one tool configuration
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'a> {
    config: &'a ToolConfig,
}

impl<'a> Assembler<'a> {
    pub fn new(config: &'a ToolConfig) -> Self {
        Self { config }
    }

    /// Build a pack from the run's inputs. Never mutates inputs, never
    /// performs I/O.
    pub fn build(&self, inputs: &PackInputs<'_>) -> EvidencePack {
        let claims: Vec<Claim> = inputs
            .claims
            .claims
            .iter()
            .map(|c| revalidate_claim(c, self.config.confidence_cap))
            .collect();

        let capped = inputs
            .claims
            .claims
            .iter()
            .zip(&claims)
            .filter(|(before, after)| after.confidence < before.confidence)
            .count();
        let verified_count = claims
            .iter()
            .filter(|c| c.status == ClaimStatus::Verified)
            .count();
        info!(
            total = claims.len(),
            verified = verified_count,
            capped,
            "Re-validated claims"
        );

        let verified = group_by_section(claims.iter().filter_map(project_verified));
        let verified_structural = build_verified_structural(inputs.howto);
        let metrics = build_metrics(
            &claims,
            inputs.known_unknowns,
            inputs.howto.completeness_ratio(),
        );

        let summary = PackSummary {
            total_files: inputs.file_index.len(),
            total_claims: claims.len(),
            verified_claims: verified_count,
            unknown_categories: inputs
                .known_unknowns
                .iter()
                .filter(|u| u.status == UnknownStatus::Unknown)
                .count(),
            verified_categories: inputs
                .known_unknowns
                .iter()
                .filter(|u| u.status == UnknownStatus::Verified)
                .count(),
        };

        EvidencePack {
            schema_version: self.config.schema_version.clone(),
            tool_version: self.config.tool_version.clone(),
            generated_at: inputs.generated_at,
            mode: inputs.mode.to_string(),
            run_id: inputs.run_id.to_string(),
            verified,
            verified_structural,
            unknowns: inputs.known_unknowns.to_vec(),
            metrics,
            hashes: PackHashes {
                snippets: collect_snippet_hashes(&claims, inputs.howto),
            },
            summary,
            coverage: build_coverage(inputs),
            replit_profile: inputs.replit_profile.map(summarize_replit_profile),
        }
    }

    /// Validate a pack document against the required-field contract,
    /// returning every violation found
    pub fn validate(&self, document: &Value) -> Vec<String> {
        validate_evidence_pack(document, &self.config.schema_version)
    }

    /// Validate and persist a built pack into `output_dir`
    pub fn save(&self, pack: &EvidencePack, output_dir: &Path) -> Result<PathBuf, PackError> {
        let path = output_dir.join(EVIDENCE_PACK_FILE);
        let document = serde_json::to_value(pack).map_err(|source| PackError::Json {
            path: path.clone(),
            source,
        })?;
        self.save_document(&document, output_dir)
    }

    /// Validate and persist a raw pack document. Nothing is written unless
    /// every invariant holds.
    pub fn save_document(&self, document: &Value, output_dir: &Path) -> Result<PathBuf, PackError> {
        let path = output_dir.join(EVIDENCE_PACK_FILE);

        let violations = self.validate(document);
        if !violations.is_empty() {
            return Err(PackError::SchemaViolation { path, violations });
        }

        let content = serde_json::to_string_pretty(document).map_err(|source| PackError::Json {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, &content)?;

        info!(path = %path.display(), "Wrote evidence pack");
        Ok(path)
    }

    /// Load a persisted pack, rejecting it unless it satisfies the contract
    pub fn load(&self, path: &Path) -> Result<EvidencePack, PackError> {
        assert_pack_exists(path)?;

        let content = std::fs::read_to_string(path).map_err(|source| PackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Value = serde_json::from_str(&content).map_err(|source| PackError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        let violations = self.validate(&document);
        if !violations.is_empty() {
            return Err(PackError::SchemaViolation {
                path: path.to_path_buf(),
                violations,
            });
        }

        let pack = serde_json::from_value(document).map_err(|source| PackError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded evidence pack");
        Ok(pack)
    }
}

/// Fail unless the pack file exists on disk
pub fn assert_pack_exists(path: &Path) -> Result<(), PackError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PackError::MissingArtifact {
            path: path.to_path_buf(),
        })
    }
}

/// Check a pack document against the required-field contract.
///
/// Returns every violated rule, not just the first.
pub fn validate_evidence_pack(document: &Value, expected_schema: &str) -> Vec<String> {
    let Some(pack) = document.as_object() else {
        return vec!["pack must be a JSON object".to_string()];
    };

    let mut violations = Vec::new();

    for field in REQUIRED_PACK_FIELDS {
        if !pack.contains_key(*field) {
            violations.push(format!("missing required field: {}", field));
        }
    }

    for field in ["tool_version", "run_id", "mode"] {
        if let Some(value) = pack.get(field) {
            if value.as_str().map_or(true, |s| s.trim().is_empty()) {
                violations.push(format!("{} must be a non-empty string", field));
            }
        }
    }

    if let Some(version) = pack.get("schema_version") {
        match version.as_str() {
            Some(v) if v == expected_schema => {}
            _ => violations.push(format!(
                "unsupported schema version: {} (expected {})",
                version, expected_schema
            )),
        }
    }

    if let Some(generated_at) = pack.get("generated_at") {
        let parses = generated_at
            .as_str()
            .is_some_and(|s| DateTime::parse_from_rfc3339(s).is_ok());
        if !parses {
            violations.push("generated_at must be an RFC 3339 timestamp".to_string());
        }
    }

    if let Some(verified) = pack.get("verified") {
        match verified.as_object() {
            Some(sections) => {
                if sections.keys().any(|k| k.trim().is_empty()) {
                    violations.push("verified section names must be non-empty".to_string());
                }
                for (name, claims) in sections {
                    if !claims.is_array() {
                        violations.push(format!("verified.{} must be a list of claims", name));
                    }
                }
            }
            None => violations.push("verified must be an object keyed by section".to_string()),
        }
    }

    if let Some(unknowns) = pack.get("unknowns") {
        if !unknowns.is_array() {
            violations.push("unknowns must be a list".to_string());
        }
    }

    if let Some(metrics) = pack.get("metrics") {
        match metrics.as_object() {
            Some(metrics) => {
                for field in REQUIRED_METRIC_FIELDS {
                    if !metrics.contains_key(*field) {
                        violations.push(format!("metrics missing required field: {}", field));
                    }
                }
            }
            None => violations.push("metrics must be an object".to_string()),
        }
    }

    if let Some(hashes) = pack.get("hashes") {
        if !hashes.get("snippets").is_some_and(Value::is_array) {
            violations.push("hashes.snippets must be a list".to_string());
        }
    }

    if let Some(coverage) = pack.get("coverage") {
        match coverage.as_object() {
            Some(coverage) => {
                for field in REQUIRED_COVERAGE_FIELDS {
                    if !coverage.contains_key(*field) {
                        violations.push(format!("coverage missing required field: {}", field));
                    }
                }
            }
            None => violations.push("coverage must be an object".to_string()),
        }
    }

    violations
}

/// Group projected claims by their original section, preserving input order
fn group_by_section(
    claims: impl IntoIterator<Item = VerifiedClaim>,
) -> BTreeMap<String, Vec<VerifiedClaim>> {
    let mut groups: BTreeMap<String, Vec<VerifiedClaim>> = BTreeMap::new();
    for claim in claims {
        groups.entry(claim.section.clone()).or_default().push(claim);
    }
    groups
}

/// Fill structural buckets from deterministic inventories only.
///
/// An entry enters a bucket only when its anchor reaches the HASH tier.
fn build_verified_structural(howto: &HowTo) -> VerifiedStructural {
    let mut structural = VerifiedStructural {
        routes: structural_items(&howto.route_inventory, "route", "route_inventory"),
        dependencies: structural_items(&howto.dependency_inventory, "dep", "dependency_inventory"),
        schemas: structural_items(&howto.schema_inventory, "schema", "schema_inventory"),
        enforcement: structural_items(&howto.enforcement_inventory, "enforce", "enforcement_inventory"),
        notes: BTreeMap::new(),
    };

    let inputs = [
        ("routes", "route", howto.route_inventory.len()),
        ("dependencies", "dependency", howto.dependency_inventory.len()),
        ("schemas", "schema", howto.schema_inventory.len()),
        ("enforcement", "enforcement", howto.enforcement_inventory.len()),
    ];
    let filled: Vec<(&str, usize)> = structural
        .buckets()
        .iter()
        .map(|(name, items)| (*name, items.len()))
        .collect();

    for ((bucket, noun, input_len), (_, filled_len)) in inputs.into_iter().zip(filled) {
        if filled_len > 0 {
            continue;
        }
        let note = if input_len == 0 {
            format!("not_implemented: {} inventory extractor not implemented", noun)
        } else {
            format!(
                "not_implemented: {} {} inventory entries carried no hash-verified evidence",
                input_len, noun
            )
        };
        structural.notes.insert(bucket.to_string(), note);
    }

    structural
}

fn structural_items(entries: &[InventoryEntry], prefix: &str, section: &str) -> Vec<StructuralItem> {
    entries
        .iter()
        .filter_map(|entry| {
            let anchor = entry.evidence.as_ref().filter(|a| is_evidence_verified(a))?;
            Some((entry, anchor))
        })
        .enumerate()
        .map(|(n, (entry, anchor))| StructuralItem {
            id: format!("howto_{}_{}", prefix, n),
            statement: entry.statement(),
            section: format!("howto:{}", section),
            evidence: vec![anchor.clone()],
            confidence: STRUCTURAL_CONFIDENCE,
            source: STRUCTURAL_SOURCE.to_string(),
        })
        .collect()
}

/// Distinct, sorted content hashes from every claim and how-to anchor
fn collect_snippet_hashes(claims: &[Claim], howto: &HowTo) -> Vec<String> {
    let claim_anchors = claims.iter().flat_map(|c| c.evidence.iter());
    let step_anchors = howto
        .step_lists()
        .into_iter()
        .flatten()
        .flat_map(|step| step.anchors());
    let inventory_anchors = [
        &howto.route_inventory,
        &howto.dependency_inventory,
        &howto.schema_inventory,
        &howto.enforcement_inventory,
    ]
    .into_iter()
    .flatten()
    .filter_map(|entry| entry.evidence.as_ref());

    claim_anchors
        .chain(step_anchors)
        .chain(inventory_anchors)
        .filter(|a| a.kind() == crate::evidence::AnchorKind::Snippet)
        .map(|a| a.content_hash())
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn build_coverage(inputs: &PackInputs<'_>) -> PackCoverage {
    let analyzed = inputs.file_index.len();
    let skipped = inputs
        .skipped_files
        .or(inputs.coverage.skipped_files)
        .unwrap_or(0);
    let skipped_types = inputs
        .skipped_types
        .cloned()
        .unwrap_or_else(|| inputs.coverage.skipped_types.clone());
    let timeouts = inputs
        .timeouts
        .map(<[String]>::to_vec)
        .unwrap_or_else(|| inputs.coverage.timeouts.clone());

    PackCoverage {
        mode: inputs.coverage.mode.clone(),
        analyzed_files: analyzed,
        total_files_seen: analyzed + skipped,
        skipped_files: skipped,
        partial: skipped > 0 || !timeouts.is_empty(),
        skipped_types,
        timeouts,
    }
}

fn summarize_replit_profile(profile: &ReplitProfile) -> ReplitSummary {
    ReplitSummary {
        is_replit: profile.is_replit,
        run_command: profile.run_command.clone(),
        language: profile.language.clone(),
        port: profile.port_binding.as_ref().and_then(|b| b.port),
    }
}

/// Write through a sibling temporary file and rename it into place
/// Write through a sibling `.tmp` file and rename, so readers never see a
/// partial file
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<(), PackError> {
    let io_err = |source| PackError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    std::fs::write(&tmp, content).map_err(io_err)?;
    std::fs::rename(&tmp, path).map_err(|source| {
        let _ = std::fs::remove_file(&tmp);
        PackError::Io {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use crate::evidence::{EvidenceAnchor, SnippetAnchor};
    use serde_json::json;
    use tempfile::TempDir;

    fn anchor(path: &str, hash: &str, verified: bool) -> EvidenceAnchor {
        EvidenceAnchor::Snippet(SnippetAnchor {
            path: path.to_string(),
            line_start: 1,
            line_end: 1,
            content_hash: hash.to_string(),
            display_label: format!("{}:1", path),
            hash_verified: verified,
        })
    }

    fn claim(id: &str, section: &str, evidence: Vec<EvidenceAnchor>) -> Claim {
        Claim {
            id: id.to_string(),
            section: section.to_string(),
            statement: format!("statement {}", id),
            confidence: 0.9,
            evidence,
            status: ClaimStatus::Unvalidated,
        }
    }

    struct Fixture {
        howto: HowTo,
        claims: ClaimsDocument,
        coverage: CoverageInput,
        file_index: Vec<String>,
        unknowns: Vec<KnownUnknownEntry>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                howto: serde_json::from_value(json!({"completeness": {"score": 62, "max": 100}}))
                    .unwrap(),
                claims: ClaimsDocument {
                    claims: vec![
                        claim("c1", "Runtime", vec![anchor("server.js", "aaaaaaaaaaaa", true)]),
                        claim("c2", "Runtime", vec![anchor("server.js", "bbbbbbbbbbbb", false)]),
                        claim("c3", "Data", vec![anchor("DOSSIER.md", "cccccccccccc", true)]),
                        claim("c4", "Data", vec![anchor("db.js", "dddddddddddd", true)]),
                    ],
                },
                coverage: CoverageInput::default(),
                file_index: vec!["server.js".to_string(), "db.js".to_string()],
                unknowns: Category::ALL
                    .iter()
                    .map(|&c| KnownUnknownEntry::unknown(c, ""))
                    .collect(),
            }
        }

        fn inputs(&self) -> PackInputs<'_> {
            PackInputs {
                howto: &self.howto,
                claims: &self.claims,
                coverage: &self.coverage,
                file_index: &self.file_index,
                known_unknowns: &self.unknowns,
                replit_profile: None,
                mode: "local",
                run_id: "run-1",
                skipped_files: None,
                skipped_types: None,
                timeouts: None,
                generated_at: DateTime::parse_from_rfc3339("2026-01-02T03:04:05Z")
                    .unwrap()
                    .with_timezone(&Utc),
            }
        }
    }

    #[test]
    fn test_build_groups_verified_by_original_section() {
        let config = ToolConfig::default();
        let fixture = Fixture::new();
        let pack = Assembler::new(&config).build(&fixture.inputs());

        assert_eq!(pack.verified.len(), 2);
        assert_eq!(pack.verified["Runtime"].len(), 1);
        assert_eq!(pack.verified["Runtime"][0].id, "c1");
        assert_eq!(pack.verified["Data"][0].id, "c4");
        assert_eq!(pack.summary.total_claims, 4);
        assert_eq!(pack.summary.verified_claims, 2);
        assert_eq!(pack.summary.unknown_categories, 9);
        assert_eq!(pack.metrics.visibility.score, 0.5);
    }

    #[test]
    fn test_build_does_not_mutate_inputs() {
        let config = ToolConfig::default();
        let fixture = Fixture::new();
        let before = fixture.claims.claims.clone();
        let _ = Assembler::new(&config).build(&fixture.inputs());
        assert_eq!(fixture.claims.claims, before);
    }

    #[test]
    fn test_hashes_collected_and_sorted() {
        let config = ToolConfig::default();
        let fixture = Fixture::new();
        let pack = Assembler::new(&config).build(&fixture.inputs());
        assert_eq!(
            pack.hashes.snippets,
            vec!["aaaaaaaaaaaa", "bbbbbbbbbbbb", "cccccccccccc", "dddddddddddd"]
        );
    }

    #[test]
    fn test_structural_buckets_carry_notes() {
        let config = ToolConfig::default();
        let mut fixture = Fixture::new();
        fixture.howto = serde_json::from_value(json!({
            "route_inventory": [{
                "route": "GET /health",
                "evidence": {"path": "server.js", "line_start": 4, "snippet_hash": "eeeeeeeeeeee",
                             "snippet_hash_verified": true}
            }],
            "schema_inventory": [{"schema": "users", "evidence": null}]
        }))
        .unwrap();

        let pack = Assembler::new(&config).build(&fixture.inputs());
        let structural = &pack.verified_structural;
        assert_eq!(structural.routes.len(), 1);
        assert_eq!(structural.routes[0].id, "howto_route_0");
        assert!(!structural.notes.contains_key("routes"));
        assert!(structural.notes["schemas"].starts_with("not_implemented: 1 schema"));
        assert_eq!(
            structural.notes["enforcement"],
            "not_implemented: enforcement inventory extractor not implemented"
        );
    }

    #[test]
    fn test_coverage_reflects_skipped() {
        let config = ToolConfig::default();
        let fixture = Fixture::new();
        let mut inputs = fixture.inputs();
        inputs.skipped_files = Some(5);
        let pack = Assembler::new(&config).build(&inputs);

        assert_eq!(pack.coverage.analyzed_files, 2);
        assert_eq!(pack.coverage.total_files_seen, 7);
        assert!(pack.coverage.partial);

        let pack = Assembler::new(&config).build(&fixture.inputs());
        assert!(!pack.coverage.partial);
    }

    #[test]
    fn test_coverage_counts_come_from_file_index() {
        let config = ToolConfig::default();
        let mut fixture = Fixture::new();
        fixture.coverage = serde_json::from_value(json!({
            "analyzed_files": 999,
            "total_files_seen": 1200,
            "scanned": 999,
            "skipped_files": 1
        }))
        .unwrap();
        let pack = Assembler::new(&config).build(&fixture.inputs());

        assert_eq!(pack.coverage.analyzed_files, 2);
        assert_eq!(pack.coverage.total_files_seen, 3);
        assert_eq!(pack.coverage.skipped_files, 1);
    }

    #[test]
    fn test_timeouts_mark_partial() {
        let config = ToolConfig::default();
        let fixture = Fixture::new();
        let timeouts = vec!["howto".to_string()];
        let mut inputs = fixture.inputs();
        inputs.timeouts = Some(&timeouts);
        let pack = Assembler::new(&config).build(&inputs);
        assert!(pack.coverage.partial);
        assert_eq!(pack.coverage.skipped_files, 0);
    }

    #[test]
    fn test_validation_enumerates_every_violation() {
        let violations = validate_evidence_pack(
            &json!({"schema_version": "99.0", "tool_version": "", "run_id": "", "coverage": {}}),
            "1.0",
        );

        assert!(violations.iter().any(|v| v.contains("unsupported schema version")));
        assert!(violations.iter().any(|v| v.starts_with("tool_version")));
        assert!(violations.iter().any(|v| v.starts_with("run_id")));
        assert!(violations.iter().any(|v| v.contains("analyzed_files")));
        assert!(violations.iter().any(|v| v.contains("total_files_seen")));
        assert!(violations.iter().any(|v| v == "missing required field: metrics"));
    }

    #[test]
    fn test_built_pack_passes_validation() {
        let config = ToolConfig::default();
        let fixture = Fixture::new();
        let assembler = Assembler::new(&config);
        let pack = assembler.build(&fixture.inputs());
        let document = serde_json::to_value(&pack).unwrap();
        assert_eq!(assembler.validate(&document), Vec::<String>::new());
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let config = ToolConfig::default();
        let fixture = Fixture::new();
        let assembler = Assembler::new(&config);
        let pack = assembler.build(&fixture.inputs());

        let path = assembler.save(&pack, temp.path()).unwrap();
        assert!(path.ends_with(EVIDENCE_PACK_FILE));
        assert!(!temp.path().join("evidence_pack.v1.json.tmp").exists());

        let loaded = assembler.load(&path).unwrap();
        assert_eq!(loaded, pack);
    }

    #[test]
    fn test_load_missing_pack() {
        let temp = TempDir::new().unwrap();
        let config = ToolConfig::default();
        let err = Assembler::new(&config)
            .load(&temp.path().join(EVIDENCE_PACK_FILE))
            .unwrap_err();
        assert!(matches!(err, PackError::MissingArtifact { .. }));
    }

    #[test]
    fn test_schema_violation_display_lists_all() {
        let err = PackError::SchemaViolation {
            path: PathBuf::from("out/evidence_pack.v1.json"),
            violations: vec!["first".to_string(), "second".to_string()],
        };
        let text = err.to_string();
        assert!(text.contains("2 violation(s)"));
        assert!(text.contains("  - first\n  - second"));
    }
}
