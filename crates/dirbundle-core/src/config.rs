//! Resolved policy consulted by the walk and the rule chain.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How files detected as binary are treated.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BinaryMode {
    /// Drop the content of binary files.
    #[default]
    Skip,
    /// Treat binary files like any other file.
    Include,
    /// Replace binary content with a fixed marker.
    Placeholder,
}

/// How symbolic links are treated.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SymlinkMode {
    /// Leave symlinks out of both passes.
    #[default]
    Skip,
    /// Resolve symlinks and walk/read their targets.
    Follow,
    /// List symlinks without reading through them.
    Include,
    /// List symlinks and emit a marker naming the target as their content.
    Placeholder,
}

/// Read-only configuration snapshot for one bundling run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct Policy {
    /// Directory to bundle.
    pub root: PathBuf,

    /// File the rendered document is written to, if any. Used to keep the
    /// output out of its own input.
    #[builder(default)]
    #[serde(default)]
    pub output_file: Option<PathBuf>,

    /// Binary file handling.
    #[builder(default)]
    #[serde(default)]
    pub binary_mode: BinaryMode,

    /// Symbolic link handling.
    #[builder(default)]
    #[serde(default)]
    pub symlink_mode: SymlinkMode,

    /// Only entries matching one of these patterns are bundled.
    #[builder(default)]
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Entries matching any of these patterns are left out.
    #[builder(default)]
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Files larger than this are skipped before being opened.
    #[builder(default = "DEFAULT_MAX_FILE_SIZE")]
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Deepest entry level reported; root children are level 0.
    #[builder(default = "DEFAULT_MAX_DEPTH")]
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Capacity of the directory identity tracker.
    #[builder(default = "DEFAULT_MAX_TRACKED_IDENTITIES")]
    #[serde(default = "default_max_tracked_identities")]
    pub max_tracked_identities: usize,

    /// Longest absolute entry path, in bytes, the walk accepts.
    #[builder(default = "DEFAULT_MAX_PATH_LEN")]
    #[serde(default = "default_max_path_len")]
    pub max_path_len: usize,

    /// Largest chunk buffer the content pipeline may request.
    #[builder(default = "DEFAULT_MAX_BUFFER_SIZE")]
    #[serde(default = "default_max_buffer_size")]
    pub max_buffer_size: usize,
}

/// 1 GiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024 * 1024;
pub const DEFAULT_MAX_DEPTH: u32 = 256;
pub const DEFAULT_MAX_TRACKED_IDENTITIES: usize = 4096;
pub const DEFAULT_MAX_PATH_LEN: usize = 4096;
/// 1 MiB.
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}

fn default_max_tracked_identities() -> usize {
    DEFAULT_MAX_TRACKED_IDENTITIES
}

fn default_max_path_len() -> usize {
    DEFAULT_MAX_PATH_LEN
}

fn default_max_buffer_size() -> usize {
    DEFAULT_MAX_BUFFER_SIZE
}

impl PolicyBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }
        if self.max_tracked_identities == Some(0) {
            return Err("Identity tracker capacity must be at least 1".to_string());
        }
        if self.max_path_len == Some(0) {
            return Err("Maximum path length must be at least 1".to_string());
        }
        if let Some(size) = self.max_buffer_size {
            if size < MIN_BUFFER_SIZE {
                return Err(format!(
                    "Maximum buffer size must be at least {MIN_BUFFER_SIZE} bytes"
                ));
            }
        }
        Ok(())
    }
}

/// Smallest `max_buffer_size` accepted; the pipeline's largest chunk class.
pub const MIN_BUFFER_SIZE: usize = 16 * 1024;

impl Policy {
    /// Create a new policy builder.
    pub fn builder() -> PolicyBuilder {
        PolicyBuilder::default()
    }

    /// Create a policy with defaults for bundling `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            output_file: None,
            binary_mode: BinaryMode::default(),
            symlink_mode: SymlinkMode::default(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            max_tracked_identities: DEFAULT_MAX_TRACKED_IDENTITIES,
            max_path_len: DEFAULT_MAX_PATH_LEN,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
        }
    }

    /// Whether symlinks are resolved and walked through.
    pub fn follows_symlinks(&self) -> bool {
        self.symlink_mode == SymlinkMode::Follow
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new(".")
    }
}
