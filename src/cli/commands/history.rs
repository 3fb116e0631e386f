//! Replay the scan across successive commits of a git repository.
//!
//! Each commit's tree is force-checked-out into the working directory, the
//! scanner runs fresh against it, and the original HEAD is restored at the
//! end. The working tree must be clean; uncommitted changes would be lost.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use git2::build::CheckoutBuilder;
use git2::{Oid, Repository};
use std::path::PathBuf;

use crate::cli::report;
use crate::config::Config;
use crate::scanner::Scanner;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Git repository to replay
    #[arg(value_name = "REPO")]
    pub path: PathBuf,

    /// YAML configuration merged over the built-in defaults
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum number of commits to replay, newest first (0 = all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

pub fn execute(args: HistoryArgs, verbose: bool) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;
    crate::cli::init_logging(verbose || config.verbose);

    if args.no_color || config.disable_output_colors {
        console::set_colors_enabled(false);
    }

    let scanner = Scanner::new(&config)?;
    let repo = Repository::open(&args.path)
        .with_context(|| format!("Failed to open git repository at {}", args.path.display()))?;

    let head = repo.head().context("Failed to resolve HEAD")?;
    let head_oid = head
        .target()
        .context("HEAD does not point at a commit")?;
    let head_ref = head.name().map(str::to_string);

    let mut revwalk = repo.revwalk().context("Failed to walk commit history")?;
    revwalk.push_head()?;
    let mut commits: Vec<Oid> = Vec::new();
    for oid in revwalk {
        commits.push(oid?);
        if args.limit > 0 && commits.len() == args.limit {
            break;
        }
    }

    let outcome = replay(&repo, &scanner, &args, &commits);

    // put the repository back where it was, whatever happened above
    if let Err(err) = restore_head(&repo, head_ref.as_deref(), head_oid) {
        eprintln!(
            "{} failed to restore original HEAD {head_oid}: {err}",
            style("warning:").yellow().bold()
        );
    }

    outcome
}

fn replay(repo: &Repository, scanner: &Scanner, args: &HistoryArgs, commits: &[Oid]) -> Result<()> {
    for oid in commits {
        let commit = repo.find_commit(*oid)?;
        println!(
            "{} {}",
            style("Checking out commit:").bold(),
            style(oid.to_string()).cyan()
        );

        let tree = commit.tree()?;
        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        repo.checkout_tree(tree.as_object(), Some(&mut checkout))
            .with_context(|| format!("Failed to check out {oid}"))?;
        repo.set_head_detached(*oid)?;

        let mut report = scanner.scan(&args.path)?;
        if report.findings.is_empty() {
            println!("No results found in commit {oid}\n");
        } else {
            println!(
                "Found {} results in commit {oid}:",
                report.statistics.results_found
            );
            report::print_findings(&mut report.findings);
            println!("\n");
        }
    }

    Ok(())
}

fn restore_head(repo: &Repository, head_ref: Option<&str>, head_oid: Oid) -> Result<()> {
    match head_ref {
        Some(name) if name != "HEAD" => repo.set_head(name)?,
        _ => repo.set_head_detached(head_oid)?,
    }

    let mut checkout = CheckoutBuilder::new();
    checkout.force();
    repo.checkout_head(Some(&mut checkout))?;
    Ok(())
}
