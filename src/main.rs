use anchor_patcher::{
    check_plan, load_from_path, plan_base_dir, run_plan, Miss, PlanConfig, Policy, RunError,
    RunOptions, RunReport, RunStatus,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use similar::{ChangeTag, TextDiff};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

mod logging;

#[derive(Parser)]
#[command(name = "anchor-patcher")]
#[command(about = "Exact-match literal text patching", long_about = None)]
#[command(version)]
struct Cli {
    /// Log engine and I/O activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply plan files to their target documents
    Apply {
        /// Plan files, or directories containing *.toml plans
        #[arg(required = true)]
        plans: Vec<PathBuf>,

        /// Patch this file instead of the one named in each plan
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Write partial results when a literal is missing instead of aborting
        #[arg(long)]
        best_effort: bool,
    },

    /// Report which operations would apply, without writing
    Check {
        /// Plan files, or directories containing *.toml plans
        #[arg(required = true)]
        plans: Vec<PathBuf>,

        /// Check this file instead of the one named in each plan
        #[arg(short, long)]
        target: Option<PathBuf>,

        /// Emit a JSON report on stdout
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }
    logging::set_up(&logging::Options {
        verbose: cli.verbose,
        color: !cli.no_color,
    })?;

    match cli.command {
        Commands::Apply {
            plans,
            target,
            dry_run,
            diff,
            best_effort,
        } => cmd_apply(plans, target, dry_run, diff, best_effort),

        Commands::Check {
            plans,
            target,
            json,
        } => cmd_check(plans, target, json),
    }
}

/// Helper: Expand plan arguments into plan files.
///
/// Files are taken as given. Directories contribute their `*.toml` files
/// (not recursive), sorted by name so runs are reproducible.
fn discover_plan_files(args: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for arg in args {
        if !arg.is_dir() {
            files.push(arg.clone());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(arg).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
            {
                found.push(entry.path().to_path_buf());
            }
        }
        if found.is_empty() {
            anyhow::bail!("No .toml plan files found in {}", arg.display());
        }
        found.sort();
        files.extend(found);
    }

    Ok(files)
}

fn resolve_target(cli_target: Option<&Path>, plan_file: &Path, config: &PlanConfig) -> PathBuf {
    match cli_target {
        Some(path) => path.to_path_buf(),
        None => config.target_path(&plan_base_dir(plan_file)),
    }
}

/// Helper: Show unified diff between original and modified content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
        if change.missing_newline() {
            println!();
        }
    }
}

fn print_misses(misses: &[Miss]) {
    for miss in misses {
        eprintln!("  {} {}", "MISSING:".red(), miss);
        if let Some(hint) = &miss.hint {
            eprintln!("    {}", hint.to_string().dimmed());
        }
    }
}

fn print_operations(report: &RunReport) {
    for op in &report.operations {
        if op.outcome.is_applied() {
            println!("  {} #{} {}", "✓".green(), op.index, op.kind);
        } else {
            println!("  {} #{} {} (not found)", "✗".red(), op.index, op.kind);
        }
    }
}

fn cmd_apply(
    plans: Vec<PathBuf>,
    target: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
    best_effort: bool,
) -> Result<()> {
    let plan_files = discover_plan_files(&plans)?;

    let mut total_written = 0;
    let mut total_unchanged = 0;
    let mut total_would_write = 0;
    let mut total_incomplete = 0;
    let mut total_failed = 0;

    for plan_file in plan_files {
        let config = load_from_path(&plan_file)?;
        let name = config.display_name().to_string();
        let target_path = resolve_target(target.as_deref(), &plan_file, &config);

        let policy = if best_effort {
            Policy::BestEffort
        } else {
            config.meta.policy.unwrap_or_default()
        };
        let options = RunOptions { policy, dry_run };

        println!("Plan {} -> {}", name.bold(), target_path.display());
        if dry_run {
            println!("{}", "  [DRY RUN - nothing will be written]".cyan());
        }

        match run_plan(&target_path, &config.plan(), &options) {
            Ok(report) => {
                print_operations(&report);
                if !report.is_complete() {
                    print_misses(&report.misses);
                    total_incomplete += 1;
                }

                match report.status {
                    RunStatus::Written => {
                        println!(
                            "{} {}: Updated {}",
                            "✓".green(),
                            name,
                            report.target.display()
                        );
                        total_written += 1;
                    }
                    RunStatus::WouldWrite => {
                        println!(
                            "{} {}: Would update {}",
                            "✓".green(),
                            name,
                            report.target.display()
                        );
                        total_would_write += 1;
                    }
                    RunStatus::Unchanged => {
                        println!(
                            "{} {}: No changes to {}",
                            "⊙".yellow(),
                            name,
                            report.target.display()
                        );
                        total_unchanged += 1;
                    }
                }

                if show_diff && report.changed() {
                    display_diff(&report.target, &report.original, &report.patched);
                }
            }
            Err(e) => {
                eprintln!("{} {}: Error - {}", "✗".red(), name, e);
                total_failed += 1;

                match &e {
                    RunError::MatchNotFound { misses, .. } => {
                        print_misses(misses);
                        eprintln!("  Possible causes:");
                        eprintln!("    - Target file changed shape since the plan was written");
                        eprintln!("    - Plan already applied (needle replaced earlier)");
                        eprintln!("  Action: rerun with --best-effort to keep partial results");
                    }
                    RunError::Persist { document, .. } => {
                        eprintln!(
                            "  Patched text ({} bytes) was computed but not written",
                            document.len()
                        );
                    }
                    RunError::Source(_) => {}
                }
            }
        }

        println!();
    }

    println!("{}", "Summary:".bold());
    println!("  {} written", format!("{}", total_written).green());
    if dry_run {
        println!("  {} would write", format!("{}", total_would_write).green());
    }
    println!("  {} unchanged", format!("{}", total_unchanged).yellow());
    println!("  {} incomplete", format!("{}", total_incomplete).yellow());
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 || total_incomplete > 0 {
        std::process::exit(1);
    }

    Ok(())
}

#[derive(Serialize)]
struct PlanCheck {
    plan: PathBuf,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<RunReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn cmd_check(plans: Vec<PathBuf>, target: Option<PathBuf>, json: bool) -> Result<()> {
    let plan_files = discover_plan_files(&plans)?;

    let mut checks = Vec::new();
    for plan_file in plan_files {
        let config = load_from_path(&plan_file)?;
        let target_path = resolve_target(target.as_deref(), &plan_file, &config);

        let (report, error) = match check_plan(&target_path, &config.plan()) {
            Ok(report) => (Some(report), None),
            Err(e) => (None, Some(e.to_string())),
        };
        checks.push(PlanCheck {
            plan: plan_file,
            name: config.display_name().to_string(),
            report,
            error,
        });
    }

    let clean = checks
        .iter()
        .all(|c| c.report.as_ref().is_some_and(RunReport::is_complete));

    if json {
        let out = serde_json::to_string_pretty(&checks).context("failed to encode report")?;
        println!("{out}");
    } else {
        for check in &checks {
            println!("Plan {} ({})", check.name.bold(), check.plan.display());
            if let Some(report) = &check.report {
                println!("  Target: {}", report.target.display());
                print_operations(report);
                print_misses(&report.misses);
                let state = match report.status {
                    RunStatus::Unchanged => "no changes".yellow(),
                    _ => "would update".green(),
                };
                println!("  Result: {}", state);
            }
            if let Some(error) = &check.error {
                eprintln!("  {} {}", "✗".red(), error);
            }
            println!();
        }
    }

    if !clean {
        std::process::exit(1);
    }

    Ok(())
}
