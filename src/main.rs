//! treepaths - list every file path in a git tree.
//!
//! Usage:
//!   treepaths [REPO]                 Print every file path at HEAD
//!   treepaths [REPO] -r <REV>        Print paths of another revision
//!   treepaths stats [REPO]           Show walk statistics
//!   treepaths --help                 Show help

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context as _, Result};

use treepaths_core::WalkConfig;
use treepaths_task::{Context, get_all_filepaths};
use treepaths_walk::{GitSource, TreeWalker};

#[derive(Parser)]
#[command(
    name = "treepaths",
    version,
    about = "List every file path in a git tree",
    long_about = "treepaths walks the tree of a git revision depth-first and prints \
                  the full path of every file in it, in tree order."
)]
struct Cli {
    /// Repository to read (defaults to current directory)
    #[arg(default_value = ".")]
    repo: PathBuf,

    /// Revision whose tree to walk
    #[arg(short, long, default_value = "HEAD")]
    rev: String,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Only print the number of files
    #[arg(short, long)]
    count: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Walk a tree and show statistics
    Stats {
        /// Repository to read
        #[arg(default_value = ".")]
        repo: PathBuf,

        /// Revision whose tree to walk
        #[arg(short, long, default_value = "HEAD")]
        rev: String,

        /// Maximum tree depth to accept
        #[arg(short = 'd', long)]
        max_depth: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Stats {
            repo,
            rev,
            max_depth,
        }) => {
            run_stats(&repo, &rev, max_depth).await?;
        }
        None => {
            run_list(&cli.repo, &cli.rev, cli.format, cli.count).await?;
        }
    }

    Ok(())
}

/// Print every file path of a revision.
async fn run_list(repo: &Path, rev: &str, format: OutputFormat, count: bool) -> Result<()> {
    let source = Arc::new(GitSource::discover(repo).wrap_err("Failed to open repository")?);
    let tree = source
        .resolve_tree(rev)
        .wrap_err_with(|| format!("Failed to resolve '{rev}' to a tree"))?;

    let mut ctx = Context::current();
    let paths = get_all_filepaths(&mut ctx, source, tree)
        .await
        .wrap_err("Failed to list file paths")?;

    if count {
        println!("{}", paths.len());
        return Ok(());
    }

    match format {
        OutputFormat::Text => {
            for path in &paths {
                println!("{path}");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&paths)?);
        }
    }

    Ok(())
}

/// Walk a revision on the blocking pool and print summary statistics.
async fn run_stats(repo: &Path, rev: &str, max_depth: Option<usize>) -> Result<()> {
    let source = GitSource::discover(repo).wrap_err("Failed to open repository")?;
    let tree = source
        .resolve_tree(rev)
        .wrap_err_with(|| format!("Failed to resolve '{rev}' to a tree"))?;

    let mut config = WalkConfig::default();
    if let Some(depth) = max_depth {
        config.max_depth = depth;
    }

    let walker = TreeWalker::new(config);
    let start = std::time::Instant::now();
    let output = tokio::task::spawn_blocking(move || walker.collect_paths(&source, &tree))
        .await
        .wrap_err("Walk worker failed")?
        .wrap_err("Walk failed")?;

    println!();
    println!("{}", "─".repeat(60));
    println!(" {} @ {} ({})", repo.display(), rev, tree);
    println!("{}", "─".repeat(60));
    println!(" Files:     {}", output.stats.files);
    println!(" Trees:     {}", output.stats.trees);
    println!(" Skipped:   {}", output.stats.skipped);
    println!(" Max depth: {}", output.stats.max_depth);
    println!(" Walked in {:.2}s", start.elapsed().as_secs_f64());
    println!();

    Ok(())
}
