use crate::monitor::{AccessErrorKind, MonitoredTarget, ScanBudget, SizeResult, UnreadableEntry};
use std::collections::HashSet;
use std::fs::{self, Metadata};
use std::path::Path;
use walkdir::WalkDir;

/// Sums the sizes of every non-directory entry below the target's root.
///
/// Symlinks are never followed; a link contributes its own `lstat` size, and
/// a link whose target is gone is also recorded as unreadable. Entries that
/// fail to stat or directories that fail to open are recorded and the walk
/// carries on with the rest of the tree.
pub fn measure(target: &MonitoredTarget, budget: &ScanBudget) -> SizeResult {
    let root = target.path.as_path();

    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return SizeResult::unreadable_root(
                target.clone(),
                UnreadableEntry::new(root, AccessErrorKind::Other, "not a directory"),
            )
        }
        Err(e) => {
            return SizeResult::unreadable_root(target.clone(), UnreadableEntry::from_io(root, &e))
        }
    }

    // A directory we can stat but not list counts as wholly unreadable.
    if let Err(e) = fs::read_dir(root) {
        return SizeResult::unreadable_root(target.clone(), UnreadableEntry::from_io(root, &e));
    }

    let mut total: u64 = 0;
    let mut unreadable = Vec::new();
    let mut seen = HashSet::new();
    let mut complete = true;

    for entry in WalkDir::new(root).follow_links(false) {
        if budget.is_exhausted() {
            complete = false;
            unreadable.push(UnreadableEntry::new(
                root,
                AccessErrorKind::Other,
                "scan budget exhausted before the walk finished",
            ));
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 => {
                return SizeResult::unreadable_root(target.clone(), walk_failure(root, &err));
            }
            Err(err) => {
                unreadable.push(walk_failure(root, &err));
                continue;
            }
        };

        if entry.file_type().is_dir() {
            continue;
        }

        match entry.metadata() {
            Ok(meta) => {
                if first_sighting(&meta, &mut seen) {
                    total = total.saturating_add(meta.len());
                }
                if entry.path_is_symlink() {
                    if let Err(e) = fs::metadata(entry.path()) {
                        unreadable.push(UnreadableEntry::from_io(entry.path(), &e));
                    }
                }
            }
            Err(err) => unreadable.push(walk_failure(entry.path(), &err)),
        }
    }

    SizeResult {
        target: target.clone(),
        actual_bytes: total,
        unreadable_entries: unreadable,
        complete,
        root_unreadable: false,
    }
}

fn walk_failure(fallback: &Path, err: &walkdir::Error) -> UnreadableEntry {
    let path = err.path().unwrap_or(fallback);
    match err.io_error() {
        Some(io) => UnreadableEntry::from_io(path, io),
        None => UnreadableEntry::new(path, AccessErrorKind::Other, err.to_string()),
    }
}

/// Hard-linked files count once per tree.
#[cfg(unix)]
fn first_sighting(meta: &Metadata, seen: &mut HashSet<(u64, u64)>) -> bool {
    use std::os::unix::fs::MetadataExt;

    if !meta.is_file() || meta.nlink() <= 1 {
        return true;
    }
    seen.insert((meta.dev(), meta.ino()))
}

#[cfg(not(unix))]
fn first_sighting(_meta: &Metadata, _seen: &mut HashSet<(u64, u64)>) -> bool {
    true
}
