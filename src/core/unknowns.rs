//! Known-unknowns registry.
//!
//! Every run reports on the same fixed set of operational categories. Each
//! category starts UNKNOWN and can only move to VERIFIED through direct
//! artifact-content inspection:
//!
//! 1. a file in the index matches an upgrade rule's file pattern
//! 2. the file is read and the rule's content probe is located
//! 3. the probe line is hashed, re-read and re-verified
//!
//! A filename match alone only produces an advisory note. Claims are never
//! consulted here.
//!
//! The content detector is opt-in (`ArtifactDetector`); without it every
//! category stays UNKNOWN.

use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::policy::is_evidence_verified;
use crate::domain::{Category, KnownUnknownEntry, UnknownStatus};
use crate::evidence::{make_snippet_anchor, read_repo_file, reverify_anchor, EvidenceAnchor};

/// Number of candidate files named in an advisory note
const NOTE_CANDIDATE_LIMIT: usize = 3;

/// Static form of an upgrade rule
struct RuleSpec {
    artifact: &'static str,
    file_pattern: &'static str,
    case_insensitive: bool,
    content_probe: Option<&'static str>,
}

const fn rule(
    artifact: &'static str,
    file_pattern: &'static str,
    case_insensitive: bool,
    content_probe: Option<&'static str>,
) -> RuleSpec {
    RuleSpec {
        artifact,
        file_pattern,
        case_insensitive,
        content_probe,
    }
}

const TLS_TERMINATION: &[RuleSpec] = &[
    rule("k8s Ingress with TLS", r"(^|/)ingress\.(ya?ml|json)$", true, Some("tls")),
    rule("Terraform ACM certificate", r"\.tf$", false, Some("aws_acm_certificate")),
    rule("Caddyfile with TLS", r"(^|/)Caddyfile$", false, None),
    rule("nginx SSL config", r"(^|/)nginx\.conf$", true, Some("ssl_certificate")),
];

const ENCRYPTION_AT_REST: &[RuleSpec] = &[
    rule("Terraform aws_db_instance with storage_encrypted", r"\.tf$", false, Some("storage_encrypted")),
    rule("Terraform aws_rds_cluster with storage_encrypted", r"\.tf$", false, Some("storage_encrypted")),
    rule("k8s StorageClass with encryption", r"(^|/)storageclass\.(ya?ml|json)$", true, Some("encrypted")),
];

const SECRET_MANAGEMENT: &[RuleSpec] = &[
    rule("k8s ExternalSecret manifest", r"(^|/)externalsecrets?\.(ya?ml|json)$", true, None),
    rule("k8s SealedSecret manifest", r"(^|/)sealedsecrets?\.(ya?ml|json)$", true, None),
    rule("Terraform vault_generic_secret", r"\.tf$", false, Some("vault_generic_secret")),
    rule("Vault agent config", r"(^|/)vault-agent\.(hcl|json)$", true, None),
];

const DEPLOYMENT_TOPOLOGY: &[RuleSpec] = &[
    rule("Dockerfile", r"(^|/)Dockerfile$", false, None),
    rule("docker-compose.yml", r"(^|/)docker-compose\.ya?ml$", true, None),
    rule("k8s Deployment manifest", r"(^|/)deployment\.(ya?ml|json)$", true, None),
    rule("Terraform main.tf", r"(^|/)main\.tf$", false, None),
    rule("Helm Chart.yaml", r"(^|/)Chart\.yaml$", false, None),
    rule("fly.toml", r"(^|/)fly\.toml$", false, None),
    rule("Procfile", r"(^|/)Procfile$", false, None),
];

const RUNTIME_IAM: &[RuleSpec] = &[
    rule("k8s ServiceAccount manifest", r"(^|/)serviceaccount\.(ya?ml|json)$", true, None),
    rule("k8s RBAC manifest", r"(^|/)(cluster)?role(binding)?\.(ya?ml|json)$", true, None),
    rule("Terraform IAM role", r"\.tf$", false, Some("aws_iam_role")),
    rule("OPA policy", r"\.rego$", false, None),
];

const LOGGING_SINK: &[RuleSpec] = &[
    rule("Fluentd config", r"(^|/)fluent(d|bit)\.(conf|ya?ml)$", true, None),
    rule("Logstash config", r"(^|/)logstash\.(conf|ya?ml)$", true, None),
    rule("Terraform CloudWatch log group", r"\.tf$", false, Some("aws_cloudwatch_log_group")),
];

const MONITORING_ALERTING: &[RuleSpec] = &[
    rule("Prometheus rules", r"(^|/)prometheus\.(ya?ml|rules)$", true, None),
    rule("k8s ServiceMonitor", r"(^|/)servicemonitor\.(ya?ml|json)$", true, None),
    rule("Grafana dashboard", r"(^|/).*grafana.*\.json$", true, None),
    rule("Terraform CloudWatch alarm", r"\.tf$", false, Some("aws_cloudwatch_metric_alarm")),
    rule("Sentry config", r"(^|/)\.sentryclirc$|sentry\.(ya?ml|json|properties)$", true, None),
];

const BACKUP_RETENTION: &[RuleSpec] = &[
    rule("Terraform backup plan", r"\.tf$", false, Some("aws_backup_plan")),
    rule("k8s CronJob backup", r"(^|/)cronjob\.(ya?ml|json)$", true, Some("backup")),
];

const DATA_RESIDENCY: &[RuleSpec] = &[
    rule("Terraform provider region constraint", r"\.tf$", false, Some("region")),
];

fn rule_specs(category: Category) -> &'static [RuleSpec] {
    match category {
        Category::TlsTermination => TLS_TERMINATION,
        Category::EncryptionAtRest => ENCRYPTION_AT_REST,
        Category::SecretManagement => SECRET_MANAGEMENT,
        Category::DeploymentTopology => DEPLOYMENT_TOPOLOGY,
        Category::RuntimeIam => RUNTIME_IAM,
        Category::LoggingSink => LOGGING_SINK,
        Category::MonitoringAlerting => MONITORING_ALERTING,
        Category::BackupRetention => BACKUP_RETENTION,
        Category::DataResidency => DATA_RESIDENCY,
    }
}

/// A compiled upgrade rule: which artifact file, and which content proves it
#[derive(Debug, Clone)]
pub struct UpgradeRule {
    pub artifact: &'static str,
    pub file_pattern: Regex,
    /// Substring that must appear in the file; `None` means filename-only,
    /// which is advisory and can never verify
    pub content_probe: Option<&'static str>,
}

impl UpgradeRule {
    pub fn matches_file(&self, path: &str) -> bool {
        self.file_pattern.is_match(path)
    }
}

/// The fixed category catalog with compiled upgrade rules
#[derive(Debug, Clone)]
pub struct UnknownsRegistry {
    rules: Vec<(Category, Vec<UpgradeRule>)>,
}

impl UnknownsRegistry {
    /// Compile every category's upgrade rules
    pub fn new() -> Result<Self, regex::Error> {
        let mut rules = Vec::with_capacity(Category::ALL.len());
        for category in Category::ALL {
            let compiled = rule_specs(category)
                .iter()
                .map(|spec| {
                    Ok(UpgradeRule {
                        artifact: spec.artifact,
                        file_pattern: RegexBuilder::new(spec.file_pattern)
                            .case_insensitive(spec.case_insensitive)
                            .build()?,
                        content_probe: spec.content_probe,
                    })
                })
                .collect::<Result<Vec<_>, regex::Error>>()?;
            rules.push((category, compiled));
        }
        Ok(Self { rules })
    }

    pub fn rules(&self, category: Category) -> &[UpgradeRule] {
        self.rules
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, r)| r.as_slice())
            .unwrap_or(&[])
    }

    /// Index files matching any of the category's rules, deduplicated, in
    /// rule order then index order. Advisory only.
    pub fn candidate_files<'a>(&self, category: Category, file_index: &'a [String]) -> Vec<&'a str> {
        let mut matched: Vec<&'a str> = Vec::new();
        for rule in self.rules(category) {
            for path in file_index {
                if !matched.contains(&path.as_str()) && rule.matches_file(path) {
                    matched.push(path.as_str());
                }
            }
        }
        matched
    }

    /// Compute one fresh entry per category.
    ///
    /// Without a detector every entry is UNKNOWN with an advisory note.
    pub fn compute(
        &self,
        file_index: &[String],
        detector: Option<&ArtifactDetector>,
    ) -> Vec<KnownUnknownEntry> {
        Category::ALL
            .iter()
            .map(|&category| self.evaluate(category, file_index, detector))
            .collect()
    }

    fn evaluate(
        &self,
        category: Category,
        file_index: &[String],
        detector: Option<&ArtifactDetector>,
    ) -> KnownUnknownEntry {
        let candidates = self.candidate_files(category, file_index);

        if let Some(detector) = detector {
            for rule in self.rules(category) {
                if let Some(anchor) = detector.detect(rule, file_index) {
                    debug!(
                        category = category.as_str(),
                        artifact = rule.artifact,
                        "Known-unknown verified by artifact content"
                    );
                    let notes = format!(
                        "Verified by artifact detector: {} ({})",
                        rule.artifact,
                        anchor.display_label()
                    );
                    return KnownUnknownEntry {
                        status: UnknownStatus::Verified,
                        evidence: vec![anchor],
                        ..KnownUnknownEntry::unknown(category, notes)
                    };
                }
            }
        }

        KnownUnknownEntry::unknown(category, advisory_note(&candidates, detector.is_some()))
    }
}

fn advisory_note(candidates: &[&str], detector_ran: bool) -> String {
    if candidates.is_empty() {
        return "No matching infrastructure/config artifacts found in file index".to_string();
    }

    let shown = candidates
        .iter()
        .take(NOTE_CANDIDATE_LIMIT)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    if detector_ran {
        format!(
            "Candidate artifact files found ({}) but no content probe could be hashed and re-verified; filename match alone is not proof",
            shown
        )
    } else {
        format!(
            "Candidate artifact files found ({}) but artifact detector not enabled; cannot read/hash/verify file content",
            shown
        )
    }
}

/// Reads candidate artifacts under a repository root to prove a rule
#[derive(Debug, Clone)]
pub struct ArtifactDetector {
    root: PathBuf,
}

impl ArtifactDetector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find the first index file where the rule's probe is located, hashed
    /// and re-verified. Rules without a content probe never verify.
    pub fn detect(&self, rule: &UpgradeRule, file_index: &[String]) -> Option<EvidenceAnchor> {
        let probe = rule.content_probe?.to_lowercase();

        file_index
            .iter()
            .filter(|path| rule.matches_file(path))
            .find_map(|path| self.probe_file(path, &probe))
    }

    fn probe_file(&self, path: &str, probe: &str) -> Option<EvidenceAnchor> {
        let content = read_repo_file(&self.root, path)?;
        let line = content
            .lines()
            .position(|l| l.to_lowercase().contains(probe))?
            + 1;

        let anchor = make_snippet_anchor(&self.root, path, line, line)?;
        let checked = reverify_anchor(&self.root, &anchor.into());
        is_evidence_verified(&checked).then_some(checked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn index(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn test_every_category_has_rules() {
        let registry = UnknownsRegistry::new().unwrap();
        for category in Category::ALL {
            assert!(!registry.rules(category).is_empty(), "{}", category);
        }
    }

    #[test]
    fn test_default_run_keeps_everything_unknown() {
        let registry = UnknownsRegistry::new().unwrap();
        let files = index(&["Dockerfile", "k8s/ingress.yaml", "src/main.rs"]);
        let entries = registry.compute(&files, None);

        assert_eq!(entries.len(), 9);
        assert!(entries.iter().all(|e| e.is_unknown()));
        assert!(entries.iter().all(|e| e.evidence.is_empty()));
    }

    #[test]
    fn test_advisory_notes() {
        let registry = UnknownsRegistry::new().unwrap();
        let files = index(&["Dockerfile", "docker-compose.yml", "fly.toml", "Procfile"]);
        let entries = registry.compute(&files, None);

        let deploy = entries
            .iter()
            .find(|e| e.category == Category::DeploymentTopology)
            .unwrap();
        assert!(deploy
            .notes
            .starts_with("Candidate artifact files found (Dockerfile, docker-compose.yml, fly.toml)"));
        assert!(!deploy.notes.contains("Procfile"));

        let tls = entries
            .iter()
            .find(|e| e.category == Category::TlsTermination)
            .unwrap();
        assert_eq!(
            tls.notes,
            "No matching infrastructure/config artifacts found in file index"
        );
    }

    #[test]
    fn test_candidate_files_deduplicated() {
        let registry = UnknownsRegistry::new().unwrap();
        let files = index(&["infra/main.tf"]);
        let candidates = registry.candidate_files(Category::EncryptionAtRest, &files);
        assert_eq!(candidates, vec!["infra/main.tf"]);
    }

    #[test]
    fn test_case_insensitive_patterns() {
        let registry = UnknownsRegistry::new().unwrap();
        let files = index(&["deploy/Ingress.YAML", "dockerfile"]);
        assert_eq!(
            registry.candidate_files(Category::TlsTermination, &files),
            vec!["deploy/Ingress.YAML"]
        );
        assert!(registry
            .candidate_files(Category::DeploymentTopology, &files)
            .is_empty());
    }

    #[test]
    fn test_detector_verifies_content_probe() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("k8s")).unwrap();
        std::fs::write(
            temp.path().join("k8s/ingress.yaml"),
            "kind: Ingress\nspec:\n  tls:\n    - hosts: [example.com]\n",
        )
        .unwrap();

        let registry = UnknownsRegistry::new().unwrap();
        let detector = ArtifactDetector::new(temp.path());
        let files = index(&["k8s/ingress.yaml"]);
        let entries = registry.compute(&files, Some(&detector));

        let tls = entries
            .iter()
            .find(|e| e.category == Category::TlsTermination)
            .unwrap();
        assert_eq!(tls.status, UnknownStatus::Verified);
        assert_eq!(tls.evidence.len(), 1);
        assert_eq!(tls.evidence[0].display_label(), "k8s/ingress.yaml:3");
        assert!(tls.evidence[0].hash_verified());
    }

    #[test]
    fn test_filename_only_rules_never_verify() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("Dockerfile"), "FROM node:20\n").unwrap();

        let registry = UnknownsRegistry::new().unwrap();
        let detector = ArtifactDetector::new(temp.path());
        let entries = registry.compute(&index(&["Dockerfile"]), Some(&detector));

        let deploy = entries
            .iter()
            .find(|e| e.category == Category::DeploymentTopology)
            .unwrap();
        assert!(deploy.is_unknown());
        assert!(deploy.notes.contains("filename match alone is not proof"));
    }

    #[test]
    fn test_detector_ignores_missing_files() {
        let temp = TempDir::new().unwrap();
        let registry = UnknownsRegistry::new().unwrap();
        let detector = ArtifactDetector::new(temp.path());
        let entries = registry.compute(&index(&["nginx.conf"]), Some(&detector));
        assert!(entries.iter().all(|e| e.is_unknown()));
    }
}
