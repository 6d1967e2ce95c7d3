//! Output sinks: where batch files end up.
//!
//! The splitter never touches the filesystem directly. It asks an
//! [`OutputSink`] to create directories and write files, which lets an upload
//! service keep results in memory and lets tests assert on produced paths
//! without a real disk.
//!
//! [`FsSink`] writes each file to a temporary file in the destination
//! directory and renames it into place, so a crash mid-write never leaves a
//! truncated PDF at its final path.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Directory-creation and file-writing capability.
///
/// Implementations must be `Send + Sync`: batches are written concurrently
/// from blocking worker threads.
pub trait OutputSink: Send + Sync {
    /// Create `dir` and any missing parents. Succeeds if it already exists.
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;

    /// Write `bytes` to `path` so that readers see either nothing or the
    /// complete file.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// Writes to the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSink;

impl OutputSink for FsSink {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        // Same directory as the target so the rename never crosses devices.
        let mut tmp = tempfile::Builder::new()
            .prefix(".awb-")
            .suffix(".pdf.tmp")
            .tempfile_in(parent)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Keeps everything in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    dirs: Mutex<BTreeSet<PathBuf>>,
    files: Mutex<BTreeMap<PathBuf, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directories created so far, sorted.
    pub fn dirs(&self) -> Vec<PathBuf> {
        lock(&self.dirs).iter().cloned().collect()
    }

    /// Files written so far with their contents, sorted by path.
    pub fn files(&self) -> BTreeMap<PathBuf, Vec<u8>> {
        lock(&self.files).clone()
    }

    pub fn file(&self, path: &Path) -> Option<Vec<u8>> {
        lock(&self.files).get(path).cloned()
    }
}

impl OutputSink for MemorySink {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        let mut dirs = lock(&self.dirs);
        for ancestor in dir.ancestors().filter(|a| !a.as_os_str().is_empty()) {
            dirs.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !lock(&self.dirs).contains(parent) {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("directory {} does not exist", parent.display()),
                ));
            }
        }
        lock(&self.files).insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }
}

// A poisoned lock only means another writer panicked; the map itself is intact.
fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
