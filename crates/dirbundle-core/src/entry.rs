//! Walk entries and directory identities.

use std::cell::OnceCell;
use std::fs::{File, Metadata};
use std::io::Read;
use std::path::Path;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Number of leading bytes inspected by binary detection.
pub const BINARY_CHECK_SIZE: usize = 8192;

/// Device + inode pair naming a filesystem object regardless of the path
/// used to reach it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Device ID.
    pub device: u64,
    /// Inode number.
    pub inode: u64,
}

impl Identity {
    /// Create a new identity.
    pub fn new(device: u64, inode: u64) -> Self {
        Self { device, inode }
    }

    /// Identity of the object `metadata` describes.
    #[cfg(unix)]
    pub fn of(_path: &Path, metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;
        Self::new(metadata.dev(), metadata.ino())
    }

    /// Identity of the object at `path`.
    ///
    /// Without inode numbers the canonical path stands in for the inode.
    #[cfg(not(unix))]
    pub fn of(path: &Path, _metadata: &Metadata) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let mut hasher = DefaultHasher::new();
        canonical.hash(&mut hasher);
        Self::new(0, hasher.finish())
    }
}

/// Type of filesystem object behind an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link that is not being followed.
    Symlink,
    /// Sockets, FIFOs, devices.
    Other,
}

impl EntryKind {
    fn from_file_type(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// One filesystem object met during a walk.
///
/// An entry borrows its path buffers from the walk and is only valid for
/// the duration of the callback it is handed to.
#[derive(Debug)]
pub struct Entry<'a> {
    rel_path: &'a str,
    abs_path: &'a Path,
    link_target: Option<&'a Path>,
    kind: EntryKind,
    size: u64,
    modified: SystemTime,
    permissions: u32,
    identity: Identity,
    binary: OnceCell<bool>,
}

impl<'a> Entry<'a> {
    /// Create an entry with no metadata attached.
    pub fn new(rel_path: &'a str, abs_path: &'a Path, kind: EntryKind) -> Self {
        Self {
            rel_path,
            abs_path,
            link_target: None,
            kind,
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
            permissions: 0,
            identity: Identity::default(),
            binary: OnceCell::new(),
        }
    }

    /// Create an entry from metadata read without following symlinks.
    pub fn from_metadata(rel_path: &'a str, abs_path: &'a Path, metadata: &Metadata) -> Self {
        Self {
            rel_path,
            abs_path,
            link_target: None,
            kind: EntryKind::from_file_type(metadata.file_type()),
            size: metadata.len(),
            modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            permissions: permission_bits(metadata),
            identity: Identity::of(abs_path, metadata),
            binary: OnceCell::new(),
        }
    }

    /// Turn a symlink entry into the followed view of its resolved target.
    pub fn with_link_target(mut self, target: &'a Path, target_metadata: &Metadata) -> Self {
        let kind = EntryKind::from_file_type(target_metadata.file_type());
        self.kind = if kind == EntryKind::Symlink {
            EntryKind::Other
        } else {
            kind
        };
        self.link_target = Some(target);
        self.size = target_metadata.len();
        self.identity = Identity::of(target, target_metadata);
        self
    }

    /// Override the recorded size.
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Override the recorded identity.
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    /// Record an already known binary flag instead of detecting it.
    pub fn with_binary(self, binary: bool) -> Self {
        let _ = self.binary.set(binary);
        self
    }

    /// Walk-root-relative path, `/` separated.
    pub fn path(&self) -> &'a str {
        self.rel_path
    }

    /// Final path component.
    pub fn name(&self) -> &'a str {
        self.rel_path.rsplit('/').next().unwrap_or(self.rel_path)
    }

    /// Absolute path of the entry as reached by the walk.
    pub fn abs_path(&self) -> &'a Path {
        self.abs_path
    }

    /// Canonical target when the entry is a followed symlink.
    pub fn link_target(&self) -> Option<&'a Path> {
        self.link_target
    }

    /// Path to read content from.
    pub fn content_path(&self) -> &'a Path {
        self.link_target.unwrap_or(self.abs_path)
    }

    /// Entry kind; followed symlinks report their target's kind.
    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Last modification time.
    pub fn modified(&self) -> SystemTime {
        self.modified
    }

    /// Raw permission bits.
    pub fn permissions(&self) -> u32 {
        self.permissions
    }

    /// Device/inode identity.
    pub fn identity(&self) -> Identity {
        self.identity
    }

    /// Check if this is a directory (or a followed link to one).
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Check if this is a regular file (or a followed link to one).
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Check if this entry is or was reached through a symlink.
    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink || self.link_target.is_some()
    }

    /// Whether the file looks binary: a zero byte within the first
    /// [`BINARY_CHECK_SIZE`] bytes.
    ///
    /// Resolved on first call and cached; always `false` for anything but
    /// regular files. Unreadable files count as text.
    pub fn is_binary(&self) -> bool {
        if !self.is_file() {
            return false;
        }
        *self
            .binary
            .get_or_init(|| detect_binary(self.content_path()).unwrap_or(false))
    }
}

/// Check a file's leading bytes for a zero byte.
pub fn detect_binary(path: &Path) -> std::io::Result<bool> {
    let mut file = File::open(path)?;
    let mut buffer = [0u8; BINARY_CHECK_SIZE];
    let mut filled = 0;
    while filled < buffer.len() {
        match file.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(buffer[..filled].contains(&0))
}

#[cfg(unix)]
fn permission_bits(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode()
}

#[cfg(not(unix))]
fn permission_bits(metadata: &Metadata) -> u32 {
    if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
