//! Input documents handed to the core by the extraction layer.
//!
//! The how-to document is model-generated and loosely shaped, so list fields
//! accept either a single object or an array, and step evidence may be an
//! anchor, a list of anchors, or a bare citation string.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::evidence::EvidenceAnchor;

/// `completeness: {score, max}` from the external how-to rubric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HowToCompleteness {
    #[serde(default)]
    pub score: f64,
    #[serde(default = "default_completeness_max")]
    pub max: f64,
}

fn default_completeness_max() -> f64 {
    100.0
}

impl HowToCompleteness {
    /// score / max, bounded to [0, 1]; 0 when max is not positive
    pub fn ratio(&self) -> f64 {
        if self.max > 0.0 {
            (self.score / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Evidence attached to a how-to step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StepEvidence {
    Anchor(EvidenceAnchor),
    Anchors(Vec<EvidenceAnchor>),
    /// `file:line` text without a hash; carries no verifiable content
    Citation(String),
    Citations(Vec<String>),
}

impl StepEvidence {
    pub fn anchors(&self) -> &[EvidenceAnchor] {
        match self {
            StepEvidence::Anchor(anchor) => std::slice::from_ref(anchor),
            StepEvidence::Anchors(anchors) => anchors,
            StepEvidence::Citation(_) | StepEvidence::Citations(_) => &[],
        }
    }

    pub fn anchors_mut(&mut self) -> &mut [EvidenceAnchor] {
        match self {
            StepEvidence::Anchor(anchor) => std::slice::from_mut(anchor),
            StepEvidence::Anchors(anchors) => anchors,
            StepEvidence::Citation(_) | StepEvidence::Citations(_) => Default::default(),
        }
    }
}

/// One step of an operator how-to (install, run, verify, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HowToStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<StepEvidence>,
}

impl HowToStep {
    pub fn anchors(&self) -> &[EvidenceAnchor] {
        self.evidence.as_ref().map(|e| e.anchors()).unwrap_or(&[])
    }
}

/// Entry emitted by a deterministic structural extractor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<EvidenceAnchor>,
}

impl InventoryEntry {
    /// Best available statement text for the entry
    pub fn statement(&self) -> String {
        self.description
            .as_ref()
            .or(self.route.as_ref())
            .or(self.schema.as_ref())
            .or(self.name.as_ref())
            .cloned()
            .unwrap_or_default()
    }
}

/// The how-to document (`target_howto.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HowTo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completeness: Option<HowToCompleteness>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub install_steps: Vec<HowToStep>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub config: Vec<HowToStep>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub run_dev: Vec<HowToStep>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub run_prod: Vec<HowToStep>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub verification_steps: Vec<HowToStep>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub common_failures: Vec<HowToStep>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub route_inventory: Vec<InventoryEntry>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub dependency_inventory: Vec<InventoryEntry>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub schema_inventory: Vec<InventoryEntry>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub enforcement_inventory: Vec<InventoryEntry>,
}

impl HowTo {
    /// How-to completeness ratio in [0, 1] (0 if the rubric is absent)
    pub fn completeness_ratio(&self) -> f64 {
        self.completeness.map(|c| c.ratio()).unwrap_or(0.0)
    }

    /// Every step list that can carry evidence, in a fixed order
    pub fn step_lists(&self) -> [&[HowToStep]; 6] {
        [
            &self.install_steps,
            &self.config,
            &self.run_dev,
            &self.run_prod,
            &self.verification_steps,
            &self.common_failures,
        ]
    }

    /// Every anchor in the step lists and structural inventories
    pub fn anchors_mut(&mut self) -> impl Iterator<Item = &mut EvidenceAnchor> + '_ {
        let steps = [
            &mut self.install_steps,
            &mut self.config,
            &mut self.run_dev,
            &mut self.run_prod,
            &mut self.verification_steps,
            &mut self.common_failures,
        ]
        .into_iter()
        .flatten()
        .filter_map(|step| step.evidence.as_mut())
        .flat_map(|evidence| evidence.anchors_mut().iter_mut());

        let inventories = [
            &mut self.route_inventory,
            &mut self.dependency_inventory,
            &mut self.schema_inventory,
            &mut self.enforcement_inventory,
        ]
        .into_iter()
        .flatten()
        .filter_map(|entry| entry.evidence.as_mut());

        steps.chain(inventories)
    }
}

/// Coverage record from the indexer.
///
/// File counts are not read from here: the pack derives `analyzed_files`
/// from the file index and `total_files_seen` from index plus skipped, so
/// counts the indexer reports (including legacy `scanned`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageInput {
    #[serde(default, alias = "skipped", skip_serializing_if = "Option::is_none")]
    pub skipped_files: Option<usize>,
    #[serde(default)]
    pub skipped_types: BTreeMap<String, usize>,
    #[serde(default)]
    pub timeouts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

/// Port binding detected in a Replit workspace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortBinding {
    #[serde(default)]
    pub port: Option<u16>,
}

/// Replit workspace profile (`replit_profile.json`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplitProfile {
    #[serde(default)]
    pub is_replit: bool,
    #[serde(default)]
    pub run_command: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub port_binding: Option<PortBinding>,
}

/// Accept `null`, a single object, or an array of objects
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        Some(OneOrMany::Many(items)) => items,
        Some(OneOrMany::One(item)) => vec![item],
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_completeness_ratio() {
        let c = HowToCompleteness { score: 62.0, max: 100.0 };
        assert!((c.ratio() - 0.62).abs() < 1e-9);

        let over = HowToCompleteness { score: 150.0, max: 100.0 };
        assert_eq!(over.ratio(), 1.0);

        let zero_max = HowToCompleteness { score: 5.0, max: 0.0 };
        assert_eq!(zero_max.ratio(), 0.0);
    }

    #[test]
    fn test_howto_accepts_loose_shapes() {
        let howto: HowTo = serde_json::from_value(json!({
            "completeness": {"score": 40},
            "install_steps": [
                {"step": "Install deps", "command": "npm ci", "evidence": "package.json:1"},
                {"step": "Build", "evidence": {
                    "path": "package.json", "line_start": 5, "line_end": 5,
                    "snippet_hash": "aaaaaaaaaaaa"
                }}
            ],
            "run_prod": {"step": "Start", "command": "npm start", "evidence": null},
            "verification_steps": null
        }))
        .unwrap();

        assert_eq!(howto.completeness.unwrap().max, 100.0);
        assert_eq!(howto.install_steps.len(), 2);
        assert!(howto.install_steps[0].anchors().is_empty());
        assert_eq!(howto.install_steps[1].anchors().len(), 1);
        assert_eq!(howto.run_prod.len(), 1);
        assert!(howto.verification_steps.is_empty());
    }

    #[test]
    fn test_coverage_legacy_aliases() {
        let cov: CoverageInput =
            serde_json::from_value(json!({"mode": "local", "scanned": 12, "skipped": 3})).unwrap();
        assert_eq!(cov.skipped_files, Some(3));
        assert_eq!(cov.mode.as_deref(), Some("local"));
    }

    #[test]
    fn test_howto_anchors_mut_visits_steps_and_inventories() {
        let anchor = json!({
            "path": "app.py", "line_start": 1, "line_end": 1,
            "snippet_hash": "aaaaaaaaaaaa", "snippet_hash_verified": true
        });
        let mut howto: HowTo = serde_json::from_value(json!({
            "install_steps": [{"step": "Install", "evidence": [anchor, anchor]}],
            "run_dev": {"step": "Run", "evidence": "app.py:1"},
            "route_inventory": [{"route": "GET /", "evidence": anchor}],
            "enforcement_inventory": [{"name": "auth", "evidence": anchor}],
            "schema_inventory": [{"schema": "users"}]
        }))
        .unwrap();

        assert_eq!(howto.anchors_mut().count(), 4);
    }

    #[test]
    fn test_inventory_statement_fallbacks() {
        let entry = InventoryEntry {
            route: Some("GET /health".to_string()),
            ..Default::default()
        };
        assert_eq!(entry.statement(), "GET /health");
        assert_eq!(InventoryEntry::default().statement(), "");
    }
}
