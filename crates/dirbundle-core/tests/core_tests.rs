use dirbundle_core::{
    BinaryMode, BundleReport, BundleStats, Entry, EntryKind, Identity, Policy, RunOutcome,
    SymlinkMode, WalkWarning, WarningKind,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[test]
fn test_identity_operations() {
    let a = Identity::new(7, 12345);
    let b = Identity::new(7, 12345);

    assert_eq!(a, b);
    assert_eq!(a.device, 7);
    assert_eq!(a.inode, 12345);
    assert_ne!(a, Identity::new(8, 12345));
}

#[test]
fn test_entry_kind_discrimination() {
    let file = Entry::new("a.txt", Path::new("/r/a.txt"), EntryKind::File);
    assert!(file.is_file());
    assert!(!file.is_dir());
    assert!(!file.is_symlink());

    let dir = Entry::new("sub", Path::new("/r/sub"), EntryKind::Directory);
    assert!(dir.is_dir());
    assert!(!dir.is_file());

    let link = Entry::new("link", Path::new("/r/link"), EntryKind::Symlink);
    assert!(link.is_symlink());
    assert!(!link.is_file());
    assert!(!link.is_binary());
}

#[test]
fn test_entry_overrides() {
    let entry = Entry::new("x/y.bin", Path::new("/r/x/y.bin"), EntryKind::File)
        .with_size(2048)
        .with_identity(Identity::new(1, 2))
        .with_binary(true);

    assert_eq!(entry.size(), 2048);
    assert_eq!(entry.identity(), Identity::new(1, 2));
    assert!(entry.is_binary());
    assert_eq!(entry.content_path(), Path::new("/r/x/y.bin"));
}

#[test]
fn test_policy_keeps_defaults_for_untouched_fields() {
    let mut policy = Policy::new("/data");
    policy.binary_mode = BinaryMode::Placeholder;

    assert_eq!(policy.root, PathBuf::from("/data"));
    assert_eq!(policy.binary_mode, BinaryMode::Placeholder);
    assert_eq!(policy.symlink_mode, SymlinkMode::Skip);
    assert_eq!(policy.max_depth, dirbundle_core::DEFAULT_MAX_DEPTH);
}

#[test]
fn test_report_warning_flags() {
    let report = BundleReport {
        outcome: RunOutcome::Completed,
        stats: BundleStats::new(),
        warnings: vec![WalkWarning::new("/x", "too deep", WarningKind::DepthLimit)],
        warning_count: 1,
        duration: Duration::from_millis(5),
    };

    assert!(report.has_warnings());
    assert!(report.outcome.is_completed());
    assert_eq!(report.warnings[0].kind, WarningKind::DepthLimit);
}
