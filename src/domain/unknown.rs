//! Known-unknown categories and entries.
//!
//! The category set is closed: every run reports on all of them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::evidence::EvidenceAnchor;

/// Operational facts that static artifacts rarely prove
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    TlsTermination,
    EncryptionAtRest,
    SecretManagement,
    DeploymentTopology,
    RuntimeIam,
    LoggingSink,
    MonitoringAlerting,
    BackupRetention,
    DataResidency,
}

impl Category {
    /// All categories in reporting order
    pub const ALL: [Category; 9] = [
        Category::TlsTermination,
        Category::EncryptionAtRest,
        Category::SecretManagement,
        Category::DeploymentTopology,
        Category::RuntimeIam,
        Category::LoggingSink,
        Category::MonitoringAlerting,
        Category::BackupRetention,
        Category::DataResidency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::TlsTermination => "tls_termination",
            Category::EncryptionAtRest => "encryption_at_rest",
            Category::SecretManagement => "secret_management",
            Category::DeploymentTopology => "deployment_topology",
            Category::RuntimeIam => "runtime_iam",
            Category::LoggingSink => "logging_sink",
            Category::MonitoringAlerting => "monitoring_alerting",
            Category::BackupRetention => "backup_retention",
            Category::DataResidency => "data_residency",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Category::TlsTermination => "Whether TLS/SSL is terminated and how (reverse proxy, load balancer, application-level)",
            Category::EncryptionAtRest => "Whether data at rest is encrypted (database, file storage, backups)",
            Category::SecretManagement => "How secrets/credentials are stored, rotated, and accessed at runtime",
            Category::DeploymentTopology => "Production deployment architecture (containers, VMs, serverless, regions)",
            Category::RuntimeIam => "Identity and access management at runtime (service accounts, role-based access)",
            Category::LoggingSink => "Where application and infrastructure logs are collected and retained",
            Category::MonitoringAlerting => "Whether monitoring/alerting is configured (health checks, uptime, error rates)",
            Category::BackupRetention => "Backup strategy, frequency, and retention policy for data stores",
            Category::DataResidency => "Where data is physically stored and whether data residency requirements are met",
        }
    }

    /// What evidence would resolve this category
    pub fn resolve_with(&self) -> &'static str {
        match self {
            Category::TlsTermination => "Add TLS config: k8s Ingress with tls section, nginx.conf with ssl_certificate, Caddyfile with tls directive, or Terraform aws_acm_certificate resource",
            Category::EncryptionAtRest => "Add encryption config: Terraform aws_db_instance with storage_encrypted=true, k8s StorageClass with encrypted parameters, or pgcrypto extension usage",
            Category::SecretManagement => "Add secret management: k8s ExternalSecret/SealedSecret manifests, Vault agent config, or Terraform vault_generic_secret resources",
            Category::DeploymentTopology => "Add deployment artifacts: Dockerfile, docker-compose.yml, k8s Deployment manifests, Terraform main.tf, Helm Chart.yaml, or fly.toml",
            Category::RuntimeIam => "Add IAM config: k8s ServiceAccount/RBAC manifests, Terraform aws_iam_role resources, or OPA policy files",
            Category::LoggingSink => "Add logging config: Fluentd/Logstash config files, k8s logging sidecar manifests, or Terraform CloudWatch log group resources",
            Category::MonitoringAlerting => "Add monitoring config: Prometheus rules YAML, Grafana dashboard JSON, k8s ServiceMonitor manifests, Terraform CloudWatch alarm resources, or Sentry config",
            Category::BackupRetention => "Add backup config: Terraform aws_backup_plan resources, k8s CronJob backup manifests, or pg_dump/mongodump cron scripts with retention",
            Category::DataResidency => "Add residency config: Terraform provider region constraints, k8s node affinity with topology labels, or documented data residency policy",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolution status of a category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnknownStatus {
    #[default]
    Unknown,
    Verified,
}

impl UnknownStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnknownStatus::Unknown => "UNKNOWN",
            UnknownStatus::Verified => "VERIFIED",
        }
    }
}

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of the known-unknowns surface. Created fresh every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownUnknownEntry {
    pub category: Category,
    pub description: String,
    pub status: UnknownStatus,
    #[serde(default)]
    pub evidence: Vec<EvidenceAnchor>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub resolve_with: String,
}

impl KnownUnknownEntry {
    /// An UNKNOWN entry with the category's static texts
    pub fn unknown(category: Category, notes: impl Into<String>) -> Self {
        Self {
            category,
            description: category.description().to_string(),
            status: UnknownStatus::Unknown,
            evidence: Vec::new(),
            notes: notes.into(),
            resolve_with: category.resolve_with().to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.status == UnknownStatus::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_serialization_matches_as_str() {
        for category in Category::ALL {
            let json = serde_json::to_string(&category).unwrap();
            assert_eq!(json, format!("\"{}\"", category.as_str()));
        }
    }

    #[test]
    fn test_status_wire_form() {
        assert_eq!(serde_json::to_string(&UnknownStatus::Unknown).unwrap(), "\"UNKNOWN\"");
        let parsed: UnknownStatus = serde_json::from_str("\"VERIFIED\"").unwrap();
        assert_eq!(parsed, UnknownStatus::Verified);
    }

    #[test]
    fn test_unknown_entry_carries_static_texts() {
        let entry = KnownUnknownEntry::unknown(Category::LoggingSink, "none found");
        assert!(entry.is_unknown());
        assert!(entry.description.contains("logs"));
        assert!(entry.resolve_with.contains("Fluentd"));
    }
}
