//! Tool configuration.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (RECON_OUTPUT_DIR, RECON_ARTIFACT_DETECTORS)
//! 2. Config file (.recon/config.yaml, then ~/.recon/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .recon/config.yaml
//! - Falls back to ~/.recon/config.yaml
//! - A relative output_dir is resolved against the project root (the
//!   parent of .recon/)
//!
//! The resolved `ToolConfig` is built once in `main` and passed by
//! reference; nothing reads configuration through a global.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// EvidencePack schema version this build reads and writes
pub const SCHEMA_VERSION: &str = "1.0";

/// Version stamped into every pack
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

const CONFIG_DIR: &str = ".recon";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub output_dir: Option<String>,
    #[serde(default)]
    pub render: Option<RenderConfig>,
    #[serde(default)]
    pub verification: Option<VerificationConfig>,
    #[serde(default)]
    pub unknowns: Option<UnknownsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderConfig {
    /// Engineer-mode hash listing cap
    pub hash_listing_cap: Option<usize>,
    /// Diff report hash listing cap
    pub diff_hash_listing_cap: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerificationConfig {
    /// Confidence ceiling for claims without HASH-tier evidence
    pub confidence_cap: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnknownsConfig {
    /// Run content probes against candidate artifacts
    pub artifact_detectors: Option<bool>,
}

/// Resolved, immutable configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolConfig {
    pub tool_version: String,
    pub schema_version: String,
    /// Directory for packs, reports and diffs
    pub output_dir: PathBuf,
    pub hash_listing_cap: usize,
    pub diff_hash_listing_cap: usize,
    pub confidence_cap: f64,
    pub artifact_detectors: bool,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            tool_version: TOOL_VERSION.to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            output_dir: PathBuf::from("out"),
            hash_listing_cap: 20,
            diff_hash_listing_cap: 10,
            confidence_cap: 0.20,
            artifact_detectors: false,
            config_file: None,
        }
    }
}

impl ToolConfig {
    /// Load configuration from all sources
    pub fn load() -> Result<Self> {
        let config_file = find_config_file().or_else(home_config_file);
        let mut config = match config_file {
            Some(ref path) => {
                let parsed = load_config_file(path)?;
                let base_dir = path
                    .parent() // .recon/
                    .and_then(|p| p.parent()) // project root
                    .unwrap_or(Path::new("."));
                Self::from_file(parsed, base_dir, Some(path.clone()))?
            }
            None => Self::default(),
        };

        config.apply_env(
            std::env::var("RECON_OUTPUT_DIR").ok(),
            std::env::var("RECON_ARTIFACT_DETECTORS").ok(),
        );
        Ok(config)
    }

    /// Merge a parsed config file over the defaults
    fn from_file(file: ConfigFile, base_dir: &Path, source: Option<PathBuf>) -> Result<Self> {
        let defaults = Self::default();

        let confidence_cap = file
            .verification
            .as_ref()
            .and_then(|v| v.confidence_cap)
            .unwrap_or(defaults.confidence_cap);
        if !(0.0..=1.0).contains(&confidence_cap) {
            anyhow::bail!(
                "verification.confidence_cap must be within [0, 1], got {}",
                confidence_cap
            );
        }

        Ok(Self {
            output_dir: file
                .output_dir
                .as_deref()
                .map(|p| resolve_path(base_dir, p))
                .unwrap_or(defaults.output_dir),
            hash_listing_cap: file
                .render
                .as_ref()
                .and_then(|r| r.hash_listing_cap)
                .unwrap_or(defaults.hash_listing_cap),
            diff_hash_listing_cap: file
                .render
                .as_ref()
                .and_then(|r| r.diff_hash_listing_cap)
                .unwrap_or(defaults.diff_hash_listing_cap),
            confidence_cap,
            artifact_detectors: file
                .unknowns
                .as_ref()
                .and_then(|u| u.artifact_detectors)
                .unwrap_or(defaults.artifact_detectors),
            config_file: source,
            ..defaults
        })
    }

    fn apply_env(&mut self, output_dir: Option<String>, detectors: Option<String>) {
        if let Some(dir) = output_dir.filter(|d| !d.trim().is_empty()) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(flag) = detectors {
            self.artifact_detectors = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

fn home_config_file() -> Option<PathBuf> {
    let path = dirs::home_dir()?.join(CONFIG_DIR).join(CONFIG_FILE);
    path.exists().then_some(path)
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the project root
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}
