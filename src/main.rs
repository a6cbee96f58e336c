//! dirbundle - Bundle a directory tree into a single document.
//!
//! Usage:
//!   dirbundle <INPUT> <OUTPUT>                 Text bundle of INPUT
//!   dirbundle src out.json --format json       JSON bundle
//!   dirbundle . out.txt -e target -e '*.lock'  Leave entries out
//!   dirbundle --help                           Show help

mod settings;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::thread;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};

use dirbundle_core::{BinaryMode, BundleReport, Policy, RunOutcome, SymlinkMode};
use dirbundle_format::{OutputFormat, RenderOptions, renderer_for};
use dirbundle_scan::Bundler;
use tokio::sync::broadcast::error::RecvError;

use settings::FileConfig;

#[derive(Parser)]
#[command(
    name = "dirbundle",
    version,
    about = "Bundle a directory tree into a single text or JSON document",
    long_about = "dirbundle writes the structure of INPUT followed by the content of \
                  every file it contains to OUTPUT.\n\n\
                  Defaults come from $XDG_CONFIG_HOME/dirbundle/config.toml when it \
                  exists; flags override the config file."
)]
struct Cli {
    /// Directory to bundle
    input: PathBuf,

    /// File to write the bundle to
    output: PathBuf,

    /// Leave out entries matching this pattern (repeatable)
    #[arg(short, long, value_name = "PATTERN")]
    exclude: Vec<String>,

    /// Only bundle entries matching this pattern (repeatable)
    #[arg(short, long, value_name = "PATTERN")]
    include: Vec<String>,

    /// Show file sizes in the structure listing
    #[arg(short, long)]
    show_size: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Log level (overrides --verbose)
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    /// How to treat binary files
    #[arg(long, value_enum)]
    binary: Option<BinaryArg>,

    /// How to treat symbolic links
    #[arg(long, value_enum)]
    symlinks: Option<SymlinkArg>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// Deepest level to descend to (root children are level 0)
    #[arg(long)]
    max_depth: Option<u32>,

    /// Skip files larger than this (e.g., "512KB", "10MB", "1GB")
    #[arg(long, value_parser = parse_size)]
    max_file_size: Option<u64>,

    /// Config file to use instead of the default location
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BinaryArg {
    Skip,
    Include,
    Placeholder,
}

impl From<BinaryArg> for BinaryMode {
    fn from(arg: BinaryArg) -> Self {
        match arg {
            BinaryArg::Skip => BinaryMode::Skip,
            BinaryArg::Include => BinaryMode::Include,
            BinaryArg::Placeholder => BinaryMode::Placeholder,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SymlinkArg {
    Skip,
    Follow,
    Include,
    Placeholder,
}

impl From<SymlinkArg> for SymlinkMode {
    fn from(arg: SymlinkArg) -> Self {
        match arg {
            SymlinkArg::Skip => SymlinkMode::Skip,
            SymlinkArg::Follow => SymlinkMode::Follow,
            SymlinkArg::Include => SymlinkMode::Include,
            SymlinkArg::Placeholder => SymlinkMode::Placeholder,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    settings::init_tracing(cli.verbose, cli.log_level.map(LogLevel::as_str));

    let config = FileConfig::load(cli.config.as_deref())?;
    let policy = build_policy(&cli, &config)?;
    let format = cli.format.map(OutputFormat::from).or(config.format).unwrap_or_default();
    let options = RenderOptions {
        show_size: cli.show_size || config.show_size.unwrap_or(false),
    };

    let report = run_bundle(policy, &cli.output, format, options, cli.verbose)?;
    print_summary(&report, &cli.output);

    if let RunOutcome::Aborted(code) = report.outcome {
        std::process::exit(code);
    }
    Ok(())
}

/// Layer defaults, the config file and the command line into a policy.
fn build_policy(cli: &Cli, config: &FileConfig) -> Result<Policy> {
    let mut builder = Policy::builder();
    builder.root(cli.input.clone()).output_file(Some(cli.output.clone()));
    config.apply(&mut builder);

    if let Some(mode) = cli.binary {
        builder.binary_mode(BinaryMode::from(mode));
    }
    if let Some(mode) = cli.symlinks {
        builder.symlink_mode(SymlinkMode::from(mode));
    }
    if !cli.include.is_empty() {
        builder.include_patterns(cli.include.clone());
    }
    if !cli.exclude.is_empty() {
        builder.exclude_patterns(cli.exclude.clone());
    }
    if let Some(depth) = cli.max_depth {
        builder.max_depth(depth);
    }
    if let Some(size) = cli.max_file_size {
        builder.max_file_size(size);
    }

    builder.build().context("Invalid settings")
}

/// Run both passes into `output`.
fn run_bundle(
    policy: Policy,
    output: &Path,
    format: OutputFormat,
    options: RenderOptions,
    verbose: bool,
) -> Result<BundleReport> {
    let input = policy.root.clone();
    let bundler = Bundler::new(policy).context("Failed to prepare bundle")?;

    // Progress is only interesting when it is being logged.
    let progress = verbose.then(|| {
        let mut rx = bundler.subscribe();
        thread::spawn(move || {
            loop {
                match rx.blocking_recv() {
                    Ok(update) => tracing::debug!(
                        phase = ?update.phase,
                        entries = update.entries_seen,
                        files = update.files_streamed,
                        bytes = update.bytes_read,
                        "progress"
                    ),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        })
    });

    let file = File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut sink = renderer_for(format, BufWriter::new(file), options);

    tracing::info!(input = %input.display(), output = %output.display(), %format, "writing bundle");
    let report = bundler
        .run(sink.as_mut())
        .with_context(|| format!("Failed to bundle {}", input.display()))?;

    drop(sink);
    drop(bundler);
    if let Some(handle) = progress {
        let _ = handle.join();
    }
    Ok(report)
}

fn print_summary(report: &BundleReport, output: &Path) {
    let stats = &report.stats;

    eprintln!();
    eprintln!("{}", "─".repeat(60));
    eprintln!(" {} - {}", output.display(), format_size(stats.bytes_written));
    eprintln!(
        " {} files, {} directories listed",
        stats.files_listed, stats.dirs_listed
    );
    eprintln!(
        " {} streamed, {} skipped, {} truncated",
        stats.files_streamed, stats.files_skipped, stats.files_truncated
    );
    eprintln!(
        " {} read, peak buffer {}",
        format_size(stats.bytes_read),
        format_size(stats.peak_buffer_size as u64)
    );
    eprintln!(" Bundled in {:.2}s", report.duration.as_secs_f64());
    eprintln!("{}", "─".repeat(60));

    if report.has_warnings() {
        eprintln!("{} warning(s) during bundling", report.warning_count);
    }
    if let RunOutcome::Aborted(code) = report.outcome {
        eprintln!("Bundling aborted (code {code}); output is incomplete");
    }
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

/// Parse a size string (e.g., "512", "64KB", "10MB", "1.5GB").
fn parse_size(s: &str) -> Result<u64, String> {
    let upper = s.trim().to_uppercase();
    let digits = upper.trim_end_matches(|c: char| !c.is_ascii_digit() && c != '.');
    let multiplier: u64 = match upper[digits.len()..].trim() {
        "" | "B" => 1,
        "K" | "KB" => 1024,
        "M" | "MB" => 1024 * 1024,
        "G" | "GB" => 1024 * 1024 * 1024,
        other => return Err(format!("unknown size unit '{other}'")),
    };
    let num: f64 = digits
        .parse()
        .map_err(|_| format!("invalid size '{s}'"))?;
    Ok((num * multiplier as f64) as u64)
}
