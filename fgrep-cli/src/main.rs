use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use colored::Colorize;
use fgrep::{config::DEFAULT_MAX_FILE_SIZE_KB, config::DEFAULT_WORKER_COUNT};
use fgrep::{search, SearchConfig, SearchReport};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Search a directory tree for files by name and content
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory to search (defaults to the directory of this executable)
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Substring the file name must contain (case-sensitive)
    #[arg(short = 'f', long = "file", default_value = "")]
    file: String,

    /// Substring the file content must contain (case-insensitive)
    #[arg(short = 'c', long = "content", default_value = "")]
    content: String,

    /// Number of workers, 0 searches on the main thread only
    #[arg(short = 'w', long = "workers", default_value_t = DEFAULT_WORKER_COUNT)]
    workers: usize,

    /// Files larger than this many KB are not content searched
    #[arg(long = "max-size", visible_alias = "fs", default_value_t = DEFAULT_MAX_FILE_SIZE_KB)]
    max_size: u64,

    /// Log search decisions to stderr, at the configured `log_level`
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Print matching lines or XML nodes instead of file paths
    #[arg(long = "show-content", visible_alias = "content-only")]
    show_content: bool,

    /// Paths to skip, relative to the search root (glob syntax)
    #[arg(long)]
    ignore: Vec<String>,

    /// YAML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only print the summary line
    #[arg(short = 's', long)]
    stats: bool,
}

impl Cli {
    fn to_config(&self) -> SearchConfig {
        SearchConfig {
            root_path: self.input.clone(),
            file_pattern: self.file.clone(),
            content_pattern: self.content.clone(),
            worker_count: self.workers,
            max_file_size_kb: self.max_size,
            ignore_patterns: self.ignore.clone(),
            show_content: self.show_content,
            stats_only: self.stats,
            ..SearchConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_config = SearchConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let mut config = file_config.merge_with_cli(cli.to_config());

    setup_logging(&config.log_level, cli.verbose);

    if !config.has_criteria() {
        Cli::command().print_help()?;
        return Ok(());
    }

    if config.root_path.is_none() {
        config.root_path = Some(executable_dir()?);
    }
    debug!("Effective configuration: {:?}", config);

    let report = search(&config)?;
    print_report(&report, &config);
    Ok(())
}

/// Diagnostics are only written in verbose mode
fn setup_logging(level: &str, verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_new(format!("fgrep={}", level))
            .unwrap_or_else(|_| EnvFilter::new("fgrep=debug"))
    } else {
        EnvFilter::new("off")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Failed to locate the running executable")?;
    exe.parent()
        .map(|dir| dir.to_path_buf())
        .context("Executable has no parent directory")
}

fn print_report(report: &SearchReport, config: &SearchConfig) {
    if !config.stats_only {
        for file_match in &report.file_matches {
            if config.show_content && !file_match.fragments.is_empty() {
                for fragment in &file_match.fragments {
                    println!("{}", fragment);
                }
            } else {
                println!("{}", file_match.path.display().to_string().blue());
            }
        }
    }
    println!("{}", report.summary());
}
