//! Command-line interface for recon.
//!
//! Thin surface over the governance core:
//! - `analyze`: assemble one pack from extraction outputs and render one report
//! - `render`: re-render a persisted pack without recomputation
//! - `diff`: compare two persisted packs
//! - `evidence`: drift checks and claim inspection against a checkout
//! - `config`: show the resolved configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ToolConfig;
use crate::core::{
    assert_pack_written, diff_packs, render, save_diff, save_report, ArtifactDetector,
    Assembler, PackError, PackInputs, RenderMode, UnknownsRegistry,
};
use crate::domain::{Claim, ClaimsDocument, CoverageInput, HowTo, ReplitProfile};
use crate::evidence::{reverify_anchor, EvidenceAnchor};

pub mod evidence;

/// recon - Evidence-governed repository reconnaissance
#[derive(Parser, Debug)]
#[command(name = "recon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Assemble an EvidencePack from extraction outputs and render a report
    Analyze {
        /// Claims document ({"claims": [...]})
        #[arg(long)]
        claims: PathBuf,

        /// How-to document with a completeness block
        #[arg(long)]
        howto: PathBuf,

        /// Coverage record
        #[arg(long)]
        coverage: PathBuf,

        /// File index: JSON array of relative paths, or one path per line
        #[arg(long)]
        index: PathBuf,

        /// Optional Replit workspace profile
        #[arg(long)]
        replit_profile: Option<PathBuf>,

        /// Repository checkout used to re-verify anchors and run detectors
        #[arg(long)]
        root: Option<PathBuf>,

        /// Acquisition mode of the analyzed repository
        #[arg(long, default_value = "local")]
        mode: String,

        /// Run identifier (a UUID is generated when omitted)
        #[arg(long)]
        run_id: Option<String>,

        /// Output directory (defaults to the configured one)
        #[arg(short, long, env = "RECON_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,

        /// Report audience
        #[arg(long, value_enum, default_value = "engineer")]
        render: RenderMode,
    },

    /// Re-render a persisted pack
    Render {
        /// Pack file, or the directory containing it
        pack: PathBuf,

        /// Report audience
        #[arg(short, long, value_enum, default_value = "engineer")]
        mode: RenderMode,

        /// Where to write the report (defaults to the pack's directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Print the report instead of writing it
        #[arg(long)]
        stdout: bool,
    },

    /// Compare two persisted packs (A is the older run)
    Diff {
        pack_a: PathBuf,
        pack_b: PathBuf,

        /// Where to write diff.json and DIFF_REPORT.md
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Inspect and validate evidence anchors
    Evidence {
        #[command(subcommand)]
        command: evidence::EvidenceCommands,
    },

    /// Show resolved configuration
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self, config: &ToolConfig) -> Result<()> {
        match self.command {
            Commands::Analyze {
                claims,
                howto,
                coverage,
                index,
                replit_profile,
                root,
                mode,
                run_id,
                output_dir,
                render,
            } => {
                let args = AnalyzeArgs {
                    claims,
                    howto,
                    coverage,
                    index,
                    replit_profile,
                    root,
                    mode,
                    run_id,
                    output_dir,
                    render,
                };
                analyze(config, args).await.map(|_| ())
            }
            Commands::Render {
                pack,
                mode,
                output_dir,
                stdout,
            } => render_pack(config, &pack, mode, output_dir, stdout),
            Commands::Diff {
                pack_a,
                pack_b,
                output_dir,
            } => diff_command(config, &pack_a, &pack_b, output_dir),
            Commands::Evidence { command } => execute_evidence(config, command).await,
            Commands::Config => show_config(config),
        }
    }
}

/// Execute evidence subcommands
async fn execute_evidence(config: &ToolConfig, command: evidence::EvidenceCommands) -> Result<()> {
    match command {
        evidence::EvidenceCommands::Validate { pack, root, strict } => {
            evidence::execute_validate(config, &pack, &root, strict).await
        }
        evidence::EvidenceCommands::Show {
            pack,
            claim_id,
            root,
        } => evidence::execute_show(config, &pack, &claim_id, root.as_deref()),
    }
}

/// Arguments of `recon analyze`
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    pub claims: PathBuf,
    pub howto: PathBuf,
    pub coverage: PathBuf,
    pub index: PathBuf,
    pub replit_profile: Option<PathBuf>,
    pub root: Option<PathBuf>,
    pub mode: String,
    pub run_id: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub render: RenderMode,
}

/// Paths written by one analyze run
#[derive(Debug, Clone)]
pub struct AnalyzeOutput {
    pub pack_path: PathBuf,
    pub report_path: PathBuf,
}

/// Assemble, persist, guard and render one run
pub async fn analyze(config: &ToolConfig, args: AnalyzeArgs) -> Result<AnalyzeOutput> {
    let mut claims: ClaimsDocument = read_json(&args.claims, "claims document")?;
    let violations = claims.validate();
    if !violations.is_empty() {
        return Err(PackError::InvalidClaims {
            path: args.claims.clone(),
            violations,
        }
        .into());
    }

    let howto: HowTo = read_json(&args.howto, "how-to document")?;
    let coverage: CoverageInput = read_json(&args.coverage, "coverage record")?;
    let file_index = read_file_index(&args.index)?;
    let replit_profile: Option<ReplitProfile> = args
        .replit_profile
        .as_deref()
        .map(|p| read_json(p, "Replit profile"))
        .transpose()?;

    let howto = match &args.root {
        Some(root) => {
            claims.claims = reverify_claims(root, claims.claims).await?;
            reverify_howto(root, howto).await?
        }
        None => howto,
    };

    let registry = UnknownsRegistry::new().context("Failed to compile upgrade rules")?;
    let detector = match (config.artifact_detectors, &args.root) {
        (true, Some(root)) => Some(ArtifactDetector::new(root.clone())),
        (true, None) => {
            warn!("Artifact detectors enabled but no --root given; categories stay advisory");
            None
        }
        _ => None,
    };
    let known_unknowns = registry.compute(&file_index, detector.as_ref());

    let run_id = args
        .run_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let inputs = PackInputs {
        howto: &howto,
        claims: &claims,
        coverage: &coverage,
        file_index: &file_index,
        known_unknowns: &known_unknowns,
        replit_profile: replit_profile.as_ref(),
        mode: &args.mode,
        run_id: &run_id,
        skipped_files: None,
        skipped_types: None,
        timeouts: None,
        generated_at: Utc::now(),
    };

    let assembler = Assembler::new(config);
    let pack = assembler.build(&inputs);
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());
    assembler.save(&pack, &output_dir)?;

    // Reports are only produced from a pack that is on disk.
    let pack_path = assert_pack_written(&output_dir)?;
    let report = render(&pack, args.render, config);
    let report_path = save_report(&report, &output_dir, args.render)?;

    info!(
        run_id = %run_id,
        pack = %pack_path.display(),
        report = %report_path.display(),
        visibility = pack.metrics.visibility.score,
        "Analysis complete"
    );
    println!("Evidence pack: {}", pack_path.display());
    println!("Report:        {}", report_path.display());

    Ok(AnalyzeOutput {
        pack_path,
        report_path,
    })
}

/// Re-verify every claim's anchors against `root`, one blocking task per claim
async fn reverify_claims(root: &Path, claims: Vec<Claim>) -> Result<Vec<Claim>> {
    let root = Arc::new(root.to_path_buf());
    let total = claims.len();
    let mut tasks = JoinSet::new();

    for (idx, claim) in claims.into_iter().enumerate() {
        let root = Arc::clone(&root);
        tasks.spawn_blocking(move || {
            let evidence = claim
                .evidence
                .iter()
                .map(|anchor| reverify_anchor(&root, anchor))
                .collect();
            (idx, Claim { evidence, ..claim })
        });
    }

    let mut slots: Vec<Option<Claim>> = vec![None; total];
    while let Some(joined) = tasks.join_next().await {
        let (idx, claim) = joined.context("Anchor re-verification task failed")?;
        slots[idx] = Some(claim);
    }

    debug!(claims = total, root = %root.display(), "Re-verified claim anchors");
    Ok(slots.into_iter().flatten().collect())
}

/// Re-verify every step and inventory anchor of the how-to against `root`
async fn reverify_howto(root: &Path, mut howto: HowTo) -> Result<HowTo> {
    let root = root.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let flagged = |a: &EvidenceAnchor| a.hash_verified() || a.exists_verified();
        let mut total = 0usize;
        let mut drifted = 0usize;
        for anchor in howto.anchors_mut() {
            let checked = reverify_anchor(&root, anchor);
            if flagged(&*anchor) && !flagged(&checked) {
                drifted += 1;
            }
            *anchor = checked;
            total += 1;
        }
        debug!(anchors = total, drifted, root = %root.display(), "Re-verified how-to anchors");
        howto
    })
    .await
    .context("How-to re-verification task failed")
}

/// Read and deserialize one JSON input document
pub fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}: {}", what, path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}: {}", what, path.display()))
}

/// Load the flat file index: a JSON array of paths, or one path per line
pub fn read_file_index(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file index: {}", path.display()))?;

    if content.trim_start().starts_with('[') {
        return serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse file index: {}", path.display()));
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Re-render a persisted pack
fn render_pack(
    config: &ToolConfig,
    pack: &Path,
    mode: RenderMode,
    output_dir: Option<PathBuf>,
    stdout: bool,
) -> Result<()> {
    let pack_path = assert_pack_written(pack)?;
    let loaded = Assembler::new(config).load(&pack_path)?;
    let report = render(&loaded, mode, config);

    if stdout {
        print!("{}", report);
        return Ok(());
    }

    let output_dir = output_dir
        .or_else(|| pack_path.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| config.output_dir.clone());
    let report_path = save_report(&report, &output_dir, mode)?;
    info!(mode = %mode, report = %report_path.display(), "Rendered report");
    println!("Report: {}", report_path.display());
    Ok(())
}

/// Compare two persisted packs
fn diff_command(
    config: &ToolConfig,
    pack_a: &Path,
    pack_b: &Path,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let assembler = Assembler::new(config);
    let a = assembler.load(&assert_pack_written(pack_a)?)?;
    let b = assembler.load(&assert_pack_written(pack_b)?)?;

    let diff = diff_packs(&a, &b);
    let output_dir = output_dir.unwrap_or_else(|| config.output_dir.clone());
    let (json_path, report_path) = save_diff(&diff, &output_dir, config.diff_hash_listing_cap)?;

    println!(
        "Visibility: {:.4} -> {:.4} ({})",
        diff.visibility_delta.old_score,
        diff.visibility_delta.new_score,
        diff.visibility_delta.direction.as_str()
    );
    println!("Categories: {}", diff.unknown_status_changes.summary);
    println!("Hashes:     {}", diff.hash_set_delta.summary);
    println!();
    println!("Diff:   {}", json_path.display());
    println!("Report: {}", report_path.display());
    Ok(())
}

/// Show resolved configuration
fn show_config(config: &ToolConfig) -> Result<()> {
    println!("recon configuration");
    println!();
    println!(
        "Config file: {}",
        config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    print!("{}", yaml);
    Ok(())
}
