//! Kiln - reproducible analysis environments and the gate in front of them
//!
//! The `kiln` command drives both halves of the system:
//!
//! ## Commands
//!
//! - `build`: Build an environment artifact from an image spec
//! - `plan`: Render the lowered build plan without executing it
//! - `validate`: Run the check pipeline against a source tree
//! - `trigger`: Evaluate whether a repository event triggers validation
//! - `spec`: Inspect image specifications (digest/show)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use kiln_build::{EnvironmentBuilder, HttpFetcher, ShellExecutor};
use kiln_ci::{
    BuiltinCheck, CacheHit, CheckConfig, DependencyCache, DepsInstaller, Gate, PipInstaller,
    TriggerEvent, ValidationPipeline, ValidationSpec, WorkflowDef,
};
use kiln_core::{FsArtifactStore, ImageSpec};

/// Directory name inside the tree holding restorable dependencies.
const DEPS_DIR: &str = ".pip-deps";

#[derive(Parser)]
#[command(name = "kiln")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reproducible environment provisioning and validation gate", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an environment artifact from an image spec
    Build {
        /// Path to the image spec JSON (default: builtin genomics spec)
        #[arg(short, long)]
        spec: Option<PathBuf>,

        /// Artifact store directory
        #[arg(long, default_value = ".kiln/store")]
        store_dir: PathBuf,

        /// Print the plan without executing any step
        #[arg(long)]
        dry_run: bool,
    },

    /// Render the lowered build plan for an image spec
    Plan {
        /// Path to the image spec JSON (default: builtin genomics spec)
        #[arg(short, long)]
        spec: Option<PathBuf>,
    },

    /// Run the validation pipeline against a source tree
    Validate {
        /// Source tree to validate
        #[arg(short, long, default_value = ".")]
        tree: PathBuf,

        /// Checks to run (comma-separated: format,docstyle,lint)
        #[arg(short, long, default_value = "format,docstyle,lint")]
        checks: String,

        /// Dependency cache directory
        #[arg(long, default_value = ".kiln/cache")]
        cache_dir: PathBuf,

        /// Skip the dependency cache
        #[arg(long)]
        no_cache: bool,

        /// Write a JSON run report into this directory
        #[arg(long)]
        reports_dir: Option<PathBuf>,
    },

    /// Evaluate whether a repository event triggers validation
    Trigger {
        /// Event kind: push or pull_request
        #[arg(short, long)]
        event: String,

        /// Branch the push landed on (push events only)
        #[arg(short, long)]
        branch: Option<String>,

        /// Branch whose pushes trigger validation
        #[arg(long, default_value = "main")]
        primary_branch: String,
    },

    /// Image spec operations
    Spec {
        #[command(subcommand)]
        action: SpecAction,
    },
}

#[derive(Subcommand)]
enum SpecAction {
    /// Print the canonical digest of a spec
    Digest {
        /// Path to the image spec JSON (default: builtin genomics spec)
        #[arg(short, long)]
        spec: Option<PathBuf>,
    },

    /// Print a spec as pretty JSON
    Show {
        /// Path to the image spec JSON (default: builtin genomics spec)
        #[arg(short, long)]
        spec: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    kiln_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Build {
            spec,
            store_dir,
            dry_run,
        } => cmd_build(spec.as_deref(), &store_dir, dry_run).await,
        Commands::Plan { spec } => cmd_plan(spec.as_deref()),
        Commands::Validate {
            tree,
            checks,
            cache_dir,
            no_cache,
            reports_dir,
        } => cmd_validate(&tree, &checks, &cache_dir, no_cache, reports_dir.as_deref()).await,
        Commands::Trigger {
            event,
            branch,
            primary_branch,
        } => cmd_trigger(&event, branch.as_deref(), &primary_branch),
        Commands::Spec { action } => match action {
            SpecAction::Digest { spec } => cmd_spec_digest(spec.as_deref()),
            SpecAction::Show { spec } => cmd_spec_show(spec.as_deref()),
        },
    }
}

/// Load a spec from disk, or fall back to the builtin genomics recipe.
fn load_spec(path: Option<&Path>) -> Result<ImageSpec> {
    let spec = match path {
        Some(p) => ImageSpec::from_json_file(p)
            .with_context(|| format!("failed to load image spec: {:?}", p))?,
        None => ImageSpec::genomics_default(),
    };
    spec.validate().context("image spec is invalid")?;
    Ok(spec)
}

/// Resolve the HEAD ref of the repository containing `dir`.
fn capture_head_ref(dir: &Path) -> String {
    let output = std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .current_dir(dir)
        .output();

    match output {
        Ok(out) if out.status.success() => {
            String::from_utf8_lossy(&out.stdout).trim().to_string()
        }
        _ => "unknown".to_string(),
    }
}

/// Parse a comma-separated check list into configurations.
fn parse_checks(checks_str: &str) -> Result<Vec<CheckConfig>> {
    let mut configs = Vec::new();
    for name in checks_str.split(',').map(|s| s.trim().to_lowercase()) {
        let config = match name.as_str() {
            "format" => CheckConfig::from_builtin(BuiltinCheck::Format, 300),
            "docstyle" => CheckConfig::from_builtin(BuiltinCheck::Docstyle, 300),
            "lint" => CheckConfig::from_builtin(BuiltinCheck::Lint, 300),
            _ => anyhow::bail!("unknown check: {}", name),
        };
        configs.push(config);
    }
    Ok(configs)
}

/// Requirements manifests present in the tree, in stable order.
fn requirements_manifests(tree: &Path) -> Vec<PathBuf> {
    ["requirements.txt", "dev-requirements.txt"]
        .iter()
        .map(|name| tree.join(name))
        .filter(|p| p.exists())
        .collect()
}

/// Materialize the tree's dependency directory from the cache or the
/// manifests, returning the cache key for the current manifests.
///
/// An exact hit restores the installed set as-is. A fallback hit is a
/// warm starting point whose packages may lag the manifests, and a
/// cold cache has nothing at all; both install from the manifests so
/// the directory matches them and can be stored under the exact key.
async fn prepare_deps(
    cache: &DependencyCache,
    tree: &Path,
    manifests: &[PathBuf],
    installer: &dyn DepsInstaller,
) -> Result<String> {
    let key = cache.key_for(manifests)?;
    let deps = tree.join(DEPS_DIR);

    match cache.restore(&key, &deps)? {
        Some(CacheHit::Exact(hit)) => {
            info!(key = %hit, "restored dependency cache");
        }
        Some(CacheHit::Fallback(hit)) => {
            info!(key = %hit, "restored stale cache entry, installing on top");
            installer
                .install(manifests, &deps)
                .await
                .context("dependency install failed")?;
        }
        None => {
            info!("dependency cache miss, installing from manifests");
            installer
                .install(manifests, &deps)
                .await
                .context("dependency install failed")?;
        }
    }

    Ok(key)
}

/// Build an environment artifact
async fn cmd_build(spec_path: Option<&Path>, store_dir: &Path, dry_run: bool) -> Result<()> {
    let spec = load_spec(spec_path)?;

    if dry_run {
        for line in EnvironmentBuilder::plan(&spec)? {
            println!("{}", line);
        }
        return Ok(());
    }

    let store = FsArtifactStore::open(store_dir).context("failed to open artifact store")?;
    let builder = EnvironmentBuilder::new(Arc::new(ShellExecutor), Arc::new(HttpFetcher::new()));

    println!("Building environment from {}", spec.base);

    let artifact = builder
        .build(&spec, &store)
        .await
        .context("environment build failed")?;

    println!("Artifact: {}", artifact.digest);
    println!("Layers:   {}", artifact.manifest.layers.len());
    for (key, value) in &artifact.manifest.env {
        println!("  ENV {}={}", key, value);
    }

    Ok(())
}

/// Render the lowered plan
fn cmd_plan(spec_path: Option<&Path>) -> Result<()> {
    let spec = load_spec(spec_path)?;
    for line in EnvironmentBuilder::plan(&spec)? {
        println!("{}", line);
    }
    Ok(())
}

/// Run the validation pipeline and evaluate the gate
async fn cmd_validate(
    tree: &Path,
    checks_str: &str,
    cache_dir: &Path,
    no_cache: bool,
    reports_dir: Option<&Path>,
) -> Result<()> {
    let configs = parse_checks(checks_str)?;
    let check_names: Vec<String> = configs.iter().map(|c| c.name.clone()).collect();
    let head_ref = capture_head_ref(tree);

    println!("Validating tree: {:?}", tree);
    println!("Checks: {}", checks_str);
    println!("Head: {}", head_ref);
    println!();

    // Materialize dependencies before the checks run.
    let cache = if no_cache {
        None
    } else {
        Some(DependencyCache::open(cache_dir).context("failed to open dependency cache")?)
    };

    let manifests = requirements_manifests(tree);
    let cache_key = match (&cache, manifests.is_empty()) {
        (Some(cache), false) => Some(prepare_deps(cache, tree, &manifests, &PipInstaller).await?),
        _ => None,
    };

    let spec = ValidationSpec::new(tree.to_path_buf(), &check_names, head_ref);
    let result = ValidationPipeline::run(&spec, configs)
        .await
        .context("validation pipeline failed to run")?;

    println!("Run ID: {}", result.run_id);
    println!(
        "Status: {}",
        if result.success { "✓ PASSED" } else { "✗ FAILED" }
    );
    println!("Duration: {}ms", result.duration_ms);
    println!();

    for check in &result.checks {
        let status = if check.passed() { "✓" } else { "✗" };
        println!(
            "  {} {} ({}ms, exit code: {})",
            status, check.check_name, check.duration_ms, check.exit_code
        );
    }

    println!();
    println!(
        "Summary: {}/{} checks passed",
        result.passed_count(),
        result.checks.len()
    );

    let verdict = Gate::evaluate(&result.checks);
    kiln_core::emit_gate_evaluated(&result.run_id, verdict.passed, verdict.violations.len());
    println!(
        "Gate: {}",
        if verdict.passed { "✓ PASSED" } else { "✗ FAILED" }
    );
    if !verdict.violations.is_empty() {
        println!("Violations:");
        for violation in &verdict.violations {
            println!("  - {}", violation);
        }
    }

    if let Some(dir) = reports_dir {
        let path = write_report(dir, &result, &verdict)?;
        println!("Report: {:?}", path);
    }

    // A passing run refreshes the cache entry for the current manifests.
    if let (Some(cache), Some(key)) = (&cache, &cache_key) {
        let deps = tree.join(DEPS_DIR);
        if verdict.passed && deps.is_dir() {
            cache.store(key, &deps)?;
        }
    }

    if verdict.passed {
        println!("\n✓ All checks passed!");
        Ok(())
    } else {
        anyhow::bail!("validation failed")
    }
}

/// Write a JSON run report, returning its path.
fn write_report(
    dir: &Path,
    result: &kiln_ci::PipelineResult,
    verdict: &kiln_ci::GateVerdict,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create reports dir: {:?}", dir))?;

    let report = serde_json::json!({
        "run_id": result.run_id,
        "spec_digest": result.spec_digest,
        "success": result.success,
        "duration_ms": result.duration_ms,
        "checks": result.checks,
        "gate": verdict,
    });

    let path = dir.join(format!("{}.json", result.run_id));
    std::fs::write(&path, serde_json::to_vec_pretty(&report)?)
        .with_context(|| format!("failed to write report: {:?}", path))?;
    Ok(path)
}

/// Evaluate a trigger event against the workflow
fn cmd_trigger(event: &str, branch: Option<&str>, primary_branch: &str) -> Result<()> {
    let workflow = WorkflowDef::new(primary_branch, WorkflowDef::default().checks);

    let trigger = match event {
        "push" => {
            let branch = branch.context("push events require --branch")?;
            TriggerEvent::Push {
                branch: branch.to_string(),
            }
        }
        "pull_request" => TriggerEvent::PullRequest,
        other => anyhow::bail!("unknown event: {} (expected push or pull_request)", other),
    };

    if workflow.should_run(&trigger) {
        println!("triggered");
        println!("Checks: {}", workflow.checks.join(", "));
    } else {
        println!("skipped");
    }

    Ok(())
}

/// Print the canonical digest of a spec
fn cmd_spec_digest(spec_path: Option<&Path>) -> Result<()> {
    let spec = load_spec(spec_path)?;
    println!("{}", spec.digest()?);
    Ok(())
}

/// Print a spec as pretty JSON
fn cmd_spec_show(spec_path: Option<&Path>) -> Result<()> {
    let spec = load_spec(spec_path)?;
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}
