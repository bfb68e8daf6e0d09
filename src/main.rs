//! Longshore CLI - static asset deployment tool
//!
//! Usage: longshore <COMMAND>
//!
//! Commands:
//!   sync    Upload changed tracked files to a branch environment
//!   deploy  Publish a build directory under a fresh version prefix

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use is_terminal::IsTerminal;

use longshore::config::Config;
use longshore::engine::{DeployEngine, DeployEvent, DeployOptions, DeployOutcome};
use longshore::enumerate::EnumerationPolicy;
use longshore::error::LongshoreResult;
use longshore::plan::KeyLayout;
use longshore::store::HttpStore;
use longshore::vcs::GitProbe;

/// Longshore - static asset deployment and synchronization tool
#[derive(Parser, Debug)]
#[command(name = "longshore")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format for CI
    #[arg(long, default_value = "false")]
    json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload changed tracked files to a branch environment
    Sync {
        /// Directory to upload
        #[arg(short, long, default_value = ".")]
        source: PathBuf,

        /// Target environment (defaults to one derived from the current branch)
        #[arg(short, long)]
        env: Option<String>,

        /// Destination bucket (overrides configuration)
        #[arg(short, long)]
        bucket: Option<String>,

        /// Remove remote files that no longer exist locally
        #[arg(long)]
        prune: bool,

        /// Upload everything, ignoring remote fingerprints
        #[arg(short, long)]
        force: bool,

        /// Cache-Control max-age for uploaded files, in seconds
        #[arg(long)]
        cache_time: Option<u64>,

        /// Dry run - show what would be done
        #[arg(long)]
        dry_run: bool,
    },

    /// Publish a build directory under a fresh version prefix
    Deploy {
        /// Build output directory
        #[arg(short, long, default_value = "build")]
        source: PathBuf,

        /// Version to publish (defaults to the manifest version)
        #[arg(long)]
        version: Option<String>,

        /// Manifest file to read the version from
        #[arg(long)]
        manifest: Option<PathBuf>,

        /// Destination bucket (overrides configuration)
        #[arg(short, long)]
        bucket: Option<String>,

        /// Alias to point at the deployed version afterwards
        #[arg(short, long)]
        link: Option<String>,

        /// Only update the alias; skip the upload
        #[arg(long, requires = "link")]
        link_only: bool,

        /// Cache-Control max-age for uploaded files, in seconds
        #[arg(long)]
        cache_time: Option<u64>,

        /// Dry run - show what would be done
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sync {
            source,
            env,
            bucket,
            prune,
            force,
            cache_time,
            dry_run,
        } => cmd_sync(
            &source, env, bucket, prune, force, cache_time, dry_run, cli.json, cli.verbose,
        ),
        Commands::Deploy {
            source,
            version,
            manifest,
            bucket,
            link,
            link_only,
            cache_time,
            dry_run,
        } => cmd_deploy(
            &source, version, manifest, bucket, link, link_only, cache_time, dry_run, cli.json,
            cli.verbose,
        ),
    };

    if let Err(error) = result {
        eprintln!("✗ {}", error);
        std::process::exit(error.exit_code());
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_sync(
    source: &Path,
    env: Option<String>,
    bucket: Option<String>,
    prune: bool,
    force: bool,
    cache_time: Option<u64>,
    dry_run: bool,
    json: bool,
    verbose: u8,
) -> LongshoreResult<()> {
    let config = load_config()?;

    let environment = match env {
        Some(name) => config.resolve_environment(&name)?,
        None => {
            let branch = longshore::vcs::current_branch(Path::new("."))?;
            config.resolve_environment(&branch)?
        }
    };

    if !json {
        println!("📦 Longshore Sync");
        println!("Source: {}", source.display());
        println!("Environment: {}", environment);
        if force {
            println!("Mode: Force upload");
        }
        if dry_run {
            println!("Mode: Dry run");
        }
    }

    let store = build_store(&config, bucket)?;
    let options = DeployOptions {
        policy: EnumerationPolicy::RequireTracked,
        layout: KeyLayout::IncludeSourceDir,
        force,
        prune,
        cache_seconds: cache_time.unwrap_or(config.deploy.cache_seconds),
        require_fresh: false,
        listing_fallback: config.store.on_listing_failure,
        content_types: config.content_types.clone(),
        progress: !json && std::io::stderr().is_terminal(),
        dry_run,
    };
    let engine = DeployEngine::new(source, environment.clone(), store, GitProbe::new(source), options);

    let outcome = run_engine(&engine, json, verbose)?;

    if json {
        let output = serde_json::json!({
            "event": "sync",
            "environment": environment,
            "uploaded": outcome.uploaded.len(),
            "unchanged": outcome.skipped.len(),
            "excluded": outcome.excluded.len(),
            "pruned": outcome.prune.as_ref().map(|p| p.removed.len()).unwrap_or(0),
            "prune_errors": outcome.prune.as_ref().map(|p| p.failures.len()).unwrap_or(0),
            "dry_run": outcome.dry_run,
            "finished_at": chrono::Utc::now().to_rfc3339(),
        });
        println!("{}", output);
    } else {
        print_results("Sync", &outcome);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_deploy(
    source: &Path,
    version: Option<String>,
    manifest: Option<PathBuf>,
    bucket: Option<String>,
    link: Option<String>,
    link_only: bool,
    cache_time: Option<u64>,
    dry_run: bool,
    json: bool,
    verbose: u8,
) -> LongshoreResult<()> {
    let config = load_config()?;

    // Resolve the alias up front: a typo should fail before anything uploads.
    let alias = match link {
        Some(requested) => Some(config.resolve_link(&requested)?),
        None => None,
    };

    let manifest_path = manifest.unwrap_or_else(|| PathBuf::from(&config.deploy.manifest));
    let version = match version {
        Some(v) => v,
        None => longshore::manifest::version_from_manifest(&manifest_path)?,
    };

    if !json {
        println!("🚀 Longshore Deploy");
        println!("Source: {}", source.display());
        println!("Version: {}", version);
        if let Some(alias) = &alias {
            println!("Link: {}", alias);
        }
        if dry_run {
            println!("Mode: Dry run");
        }
    }

    let store = build_store(&config, bucket)?;
    let options = DeployOptions {
        policy: EnumerationPolicy::AllFiles,
        layout: KeyLayout::SourceRelative,
        force: false,
        prune: false,
        cache_seconds: cache_time.unwrap_or(config.deploy.cache_seconds),
        require_fresh: true,
        listing_fallback: config.store.on_listing_failure,
        content_types: config.content_types.clone(),
        progress: !json && std::io::stderr().is_terminal(),
        dry_run,
    };
    let engine = DeployEngine::new(source, version.clone(), store, GitProbe::new(source), options);

    let outcome = if link_only {
        None
    } else {
        Some(run_engine(&engine, json, verbose)?)
    };

    let linked = match (&alias, dry_run) {
        (Some(alias), false) => Some(engine.link_to(alias)?),
        _ => None,
    };

    if json {
        let output = serde_json::json!({
            "event": "deploy",
            "version": version,
            "uploaded": outcome.as_ref().map(|o| o.uploaded.len()).unwrap_or(0),
            "unchanged": outcome.as_ref().map(|o| o.skipped.len()).unwrap_or(0),
            "linked": alias,
            "copied": linked.as_ref().map(|l| l.copied.len()).unwrap_or(0),
            "dry_run": dry_run,
            "finished_at": chrono::Utc::now().to_rfc3339(),
        });
        println!("{}", output);
    } else {
        if let Some(outcome) = &outcome {
            print_results("Deploy", outcome);
        }
        match (&alias, &linked) {
            (Some(alias), Some(link_outcome)) => {
                println!("  🔗 Linked {} to {} ({} files copied)", alias, version, link_outcome.copied.len());
            }
            (Some(alias), None) => {
                println!("  🔗 Would link {} to {}", alias, version);
            }
            _ => {}
        }
        println!();
    }

    Ok(())
}

/// Load configuration (environment overrides included) and report
/// unknown-key warnings.
fn load_config() -> LongshoreResult<Config> {
    let (config, warnings) = Config::load_or_default_with_warnings(Path::new("."))?;
    for warning in &warnings {
        let location = match warning.line {
            Some(line) => format!("{}:{}", warning.file.display(), line),
            None => warning.file.display().to_string(),
        };
        match &warning.suggestion {
            Some(suggestion) => eprintln!(
                "⚠ Unknown configuration key '{}' in {} (did you mean '{}'?)",
                warning.key, location, suggestion
            ),
            None => eprintln!("⚠ Unknown configuration key '{}' in {}", warning.key, location),
        }
    }
    Ok(config)
}

fn build_store(config: &Config, bucket_flag: Option<String>) -> LongshoreResult<HttpStore> {
    let bucket = bucket_flag
        .or_else(|| config.store.bucket.clone())
        .ok_or(longshore::LongshoreError::MissingBucket)?;
    let endpoint = config
        .store
        .endpoint
        .clone()
        .ok_or(longshore::LongshoreError::MissingEndpoint)?;
    HttpStore::new(endpoint, bucket, config.store.token.clone())
}

/// Plan, print the warnings the plan surfaced, then execute.
fn run_engine(
    engine: &DeployEngine,
    json: bool,
    verbose: u8,
) -> LongshoreResult<DeployOutcome> {
    let plan = engine.plan()?;

    if let Some(reason) = &plan.listing_warning {
        eprintln!("⚠ Remote listing failed, assuming an empty prefix: {}", reason);
    }
    for path in &plan.excluded {
        eprintln!("⚠ Not under version control, skipped: {}", path.display());
    }

    let verbose_items = !json && verbose > 0;
    engine.execute_with_callback(
        plan,
        Some(move |event: DeployEvent| {
            if !verbose_items {
                return;
            }
            if let DeployEvent::Uploaded { index, total, key } = event {
                println!("  ✓ [{}/{}] {}", index + 1, total, key);
            }
        }),
    )
}

fn print_results(label: &str, outcome: &DeployOutcome) {
    println!("\n📊 {} Results:", label);
    if !outcome.uploaded.is_empty() {
        println!("  ✓ Uploaded: {} files", outcome.uploaded.len());
        for key in &outcome.uploaded {
            println!("    - {}", key);
        }
    }
    if !outcome.skipped.is_empty() {
        println!("  = Unchanged: {} files", outcome.skipped.len());
    }
    if !outcome.excluded.is_empty() {
        println!("  ⚠ Excluded: {} files (not under version control)", outcome.excluded.len());
    }
    if let Some(prune) = &outcome.prune {
        if !prune.removed.is_empty() {
            println!("  🗑 Pruned: {} files", prune.removed.len());
            for key in &prune.removed {
                println!("    - {}", key);
            }
        }
        if !prune.failures.is_empty() {
            println!("  ✗ Prune failures: {}", prune.failures.len());
            for failure in &prune.failures {
                println!("    - {}: {}", failure.key, failure.message);
            }
        }
    }
    if outcome.uploaded.is_empty() && outcome.skipped.is_empty() {
        println!("  Nothing to upload.");
    }
    if outcome.dry_run {
        println!("\nDry run - nothing was transferred.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_sync() {
        let cli = Cli::try_parse_from(["longshore", "sync"]).unwrap();
        assert!(matches!(cli.command, Commands::Sync { .. }));
    }

    #[test]
    fn test_cli_parse_sync_defaults() {
        let cli = Cli::try_parse_from(["longshore", "sync"]).unwrap();
        if let Commands::Sync {
            source,
            env,
            prune,
            force,
            cache_time,
            ..
        } = cli.command
        {
            assert_eq!(source, PathBuf::from("."));
            assert_eq!(env, None);
            assert!(!prune);
            assert!(!force);
            assert_eq!(cache_time, None);
        } else {
            panic!("Expected Sync command");
        }
    }

    #[test]
    fn test_cli_parse_sync_with_args() {
        let cli = Cli::try_parse_from([
            "longshore",
            "sync",
            "--source",
            "webroot",
            "--env",
            "rc",
            "--prune",
            "--force",
            "--cache-time",
            "600",
        ])
        .unwrap();

        if let Commands::Sync {
            source,
            env,
            prune,
            force,
            cache_time,
            ..
        } = cli.command
        {
            assert_eq!(source, PathBuf::from("webroot"));
            assert_eq!(env, Some("rc".to_string()));
            assert!(prune);
            assert!(force);
            assert_eq!(cache_time, Some(600));
        } else {
            panic!("Expected Sync command");
        }
    }

    #[test]
    fn test_cli_parse_deploy_defaults() {
        let cli = Cli::try_parse_from(["longshore", "deploy"]).unwrap();
        if let Commands::Deploy {
            source,
            version,
            link,
            link_only,
            ..
        } = cli.command
        {
            assert_eq!(source, PathBuf::from("build"));
            assert_eq!(version, None);
            assert_eq!(link, None);
            assert!(!link_only);
        } else {
            panic!("Expected Deploy command");
        }
    }

    #[test]
    fn test_cli_parse_deploy_with_args() {
        let cli = Cli::try_parse_from([
            "longshore",
            "deploy",
            "--source",
            "dist",
            "--version",
            "2.4.0",
            "--link",
            "production",
        ])
        .unwrap();

        if let Commands::Deploy {
            source,
            version,
            link,
            ..
        } = cli.command
        {
            assert_eq!(source, PathBuf::from("dist"));
            assert_eq!(version, Some("2.4.0".to_string()));
            assert_eq!(link, Some("production".to_string()));
        } else {
            panic!("Expected Deploy command");
        }
    }

    #[test]
    fn test_cli_link_only_requires_link() {
        let result = Cli::try_parse_from(["longshore", "deploy", "--link-only"]);
        assert!(result.is_err());

        let cli =
            Cli::try_parse_from(["longshore", "deploy", "--link-only", "--link", "qa"]).unwrap();
        if let Commands::Deploy { link_only, link, .. } = cli.command {
            assert!(link_only);
            assert_eq!(link, Some("qa".to_string()));
        } else {
            panic!("Expected Deploy command");
        }
    }

    #[test]
    fn test_cli_json_flag() {
        let cli = Cli::try_parse_from(["longshore", "--json", "sync"]).unwrap();
        assert!(cli.json);
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["longshore", "-vvv", "sync"]).unwrap();
        assert_eq!(cli.verbose, 3);
    }

    #[test]
    fn test_cli_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["longshore", "provision"]).is_err());
    }
}
