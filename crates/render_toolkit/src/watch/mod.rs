//! File modification watching
//!
//! A polling watcher over modification timestamps. The updater owns one
//! instance and polls it exactly once per tick, so change detection has
//! tick granularity: everything that changed between two polls is reported
//! by the later one, regardless of how many events or updatees care.
//!
//! A file that appears or disappears between polls counts as changed, which
//! makes editor save strategies (write-temp-then-rename, delete-then-write)
//! register reliably.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Polling watcher over file modification timestamps
#[derive(Debug, Default)]
pub struct FileWatcher {
    /// Watched paths and the timestamp seen at the previous poll.
    /// `None` means the file was absent.
    entries: HashMap<PathBuf, Option<SystemTime>>,
    /// Paths whose timestamp differed at the most recent poll
    changed: HashSet<PathBuf>,
}

impl FileWatcher {
    /// Create a watcher with no watched paths
    pub fn new() -> Self {
        Self::default()
    }

    /// Start watching a path.
    ///
    /// The current modification time becomes the baseline, so a pre-existing
    /// file does not register as changed on the next poll.
    pub fn watch(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        let stamp = Self::modification_time(&path);
        self.entries.entry(path).or_insert(stamp);
    }

    /// Start watching several paths
    pub fn watch_all<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        for path in paths {
            self.watch(path);
        }
    }

    /// Number of watched paths
    pub fn watched_count(&self) -> usize {
        self.entries.len()
    }

    /// Re-stat every watched path and record which ones changed.
    ///
    /// Called once per updater tick. The changed set is valid until the
    /// next poll.
    pub fn poll(&mut self) {
        self.changed.clear();
        for (path, cached) in &mut self.entries {
            let current = Self::modification_time(path);
            if current != *cached {
                log::debug!("file changed on disk: {}", path.display());
                self.changed.insert(path.clone());
                *cached = current;
            }
        }
    }

    /// Whether the given path changed at the most recent poll
    pub fn changed_since_last_poll(&self, path: &Path) -> bool {
        self.changed.contains(path)
    }

    /// Whether any of the given paths changed at the most recent poll
    pub fn any_changed<'a, I>(&self, paths: I) -> bool
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        paths.into_iter().any(|p| self.changed.contains(p))
    }

    fn modification_time(path: &Path) -> Option<SystemTime> {
        std::fs::metadata(path).and_then(|m| m.modified()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "render_toolkit_watch_{}_{}.tmp",
            tag,
            std::process::id()
        ))
    }

    #[test]
    fn test_missing_file_fires_when_created() {
        let path = scratch_path("created");
        let _ = std::fs::remove_file(&path);

        let mut watcher = FileWatcher::new();
        watcher.watch(&path);

        watcher.poll();
        assert!(!watcher.changed_since_last_poll(&path));

        std::fs::write(&path, b"#version 450").unwrap();
        watcher.poll();
        assert!(watcher.changed_since_last_poll(&path));

        // No further change, no further fire
        watcher.poll();
        assert!(!watcher.changed_since_last_poll(&path));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_removed_file_fires_once() {
        let path = scratch_path("removed");
        std::fs::write(&path, b"void main() {}").unwrap();

        let mut watcher = FileWatcher::new();
        watcher.watch(&path);
        watcher.poll();
        assert!(!watcher.changed_since_last_poll(&path));

        std::fs::remove_file(&path).unwrap();
        watcher.poll();
        assert!(watcher.changed_since_last_poll(&path));

        watcher.poll();
        assert!(!watcher.changed_since_last_poll(&path));
    }

    #[test]
    fn test_watch_is_idempotent() {
        let path = scratch_path("idempotent");
        let _ = std::fs::remove_file(&path);

        let mut watcher = FileWatcher::new();
        watcher.watch(&path);
        watcher.watch(&path);
        assert_eq!(watcher.watched_count(), 1);
    }

    #[test]
    fn test_any_changed_over_a_set() {
        let a = scratch_path("set_a");
        let b = scratch_path("set_b");
        let _ = std::fs::remove_file(&a);
        let _ = std::fs::remove_file(&b);

        let mut watcher = FileWatcher::new();
        watcher.watch_all([&a, &b]);
        watcher.poll();

        std::fs::write(&b, b"x").unwrap();
        watcher.poll();

        let watched: Vec<PathBuf> = vec![a.clone(), b.clone()];
        assert!(watcher.any_changed(watched.iter()));

        let only_a = vec![a.clone()];
        assert!(!watcher.any_changed(only_a.iter()));

        let _ = std::fs::remove_file(&b);
    }
}
