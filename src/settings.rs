//! Configuration file layering and logging setup for the binary.
//!
//! Settings are resolved in three layers, lowest first: built-in defaults,
//! the TOML config file, command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use dirbundle_core::{BinaryMode, PolicyBuilder, SymlinkMode};
use dirbundle_format::OutputFormat;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Environment variable holding log directives for dirbundle.
pub const LOG_ENV: &str = "DIRBUNDLE_LOG";

/// Contents of `config.toml`. Every key is optional.
///
/// ```toml
/// binary = "placeholder"
/// symlinks = "skip"
/// format = "text"
/// show_size = true
/// exclude = ["target", ".git", "*.lock"]
/// max_depth = 64
/// max_file_size = 10485760
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub binary: Option<BinaryMode>,
    pub symlinks: Option<SymlinkMode>,
    pub format: Option<OutputFormat>,
    pub show_size: Option<bool>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub max_depth: Option<u32>,
    pub max_file_size: Option<u64>,
    pub max_path_len: Option<usize>,
    pub max_tracked_identities: Option<usize>,
    pub max_buffer_size: Option<usize>,
}

impl FileConfig {
    /// Parse a config file's contents.
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).wrap_err("Invalid config file")
    }

    /// Load the config file.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// tried and a missing file yields the empty config.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.is_file() => path,
                _ => return Ok(Self::default()),
            },
        };

        let text = fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::parse(&text).wrap_err_with(|| format!("In {}", path.display()))
    }

    /// Copy the policy keys that are set onto `builder`.
    ///
    /// A non-empty pattern list replaces the builder's list.
    pub fn apply(&self, builder: &mut PolicyBuilder) {
        if let Some(mode) = self.binary {
            builder.binary_mode(mode);
        }
        if let Some(mode) = self.symlinks {
            builder.symlink_mode(mode);
        }
        if !self.include.is_empty() {
            builder.include_patterns(self.include.clone());
        }
        if !self.exclude.is_empty() {
            builder.exclude_patterns(self.exclude.clone());
        }
        if let Some(depth) = self.max_depth {
            builder.max_depth(depth);
        }
        if let Some(size) = self.max_file_size {
            builder.max_file_size(size);
        }
        if let Some(len) = self.max_path_len {
            builder.max_path_len(len);
        }
        if let Some(capacity) = self.max_tracked_identities {
            builder.max_tracked_identities(capacity);
        }
        if let Some(size) = self.max_buffer_size {
            builder.max_buffer_size(size);
        }
    }
}

/// `$XDG_CONFIG_HOME/dirbundle/config.toml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dirbundle").join("config.toml"))
}

/// Install the global tracing subscriber, logging to stderr.
///
/// Filter priority: `DIRBUNDLE_LOG`, `RUST_LOG`, `--log-level`,
/// `--verbose` (debug), then `info`.
pub fn init_tracing(verbose: bool, log_level: Option<&str>) {
    let filter = build_env_filter(verbose, log_level);
    let stderr_is_tty = std::io::IsTerminal::is_terminal(&std::io::stderr());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(stderr_is_tty)
        .with_target(verbose);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer.without_time().compact())
        .init();
}

fn build_env_filter(verbose: bool, log_level: Option<&str>) -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV)
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }

    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::new(fallback_directive(verbose, log_level))
}

fn fallback_directive(verbose: bool, log_level: Option<&str>) -> &str {
    match log_level {
        Some(level) => level,
        None if verbose => "debug",
        None => "info",
    }
}
