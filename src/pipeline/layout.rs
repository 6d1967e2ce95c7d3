//! Output layout: `root/<courier>/<date>/AWB_<label>_<date>_<timestamp>_<n>.pdf`.

use crate::pipeline::classify::Courier;
use crate::sink::OutputSink;
use std::io;
use std::path::{Path, PathBuf};

/// Directory holding one courier's batches for one date.
pub fn batch_dir(root: &Path, courier: Courier, date: &str) -> PathBuf {
    root.join(courier.dir_name()).join(date)
}

/// File name for one batch.
///
/// The publisher, when one was detected for the run, replaces the courier's
/// display name.
pub fn batch_filename(
    courier: Courier,
    date: &str,
    publisher: Option<&str>,
    timestamp: &str,
    batch_number: usize,
) -> String {
    let label = publisher.unwrap_or(courier.display_name());
    format!("AWB_{label}_{date}_{timestamp}_{batch_number}.pdf")
}

/// Resolve the full output path for a batch, creating its directory.
///
/// Safe to call repeatedly for the same courier and date. On error the
/// returned value carries the directory that could not be created.
pub fn resolve(
    sink: &dyn OutputSink,
    root: &Path,
    courier: Courier,
    date: &str,
    publisher: Option<&str>,
    timestamp: &str,
    batch_number: usize,
) -> Result<PathBuf, (PathBuf, io::Error)> {
    let dir = batch_dir(root, courier, date);
    sink.create_dir_all(&dir).map_err(|e| (dir.clone(), e))?;
    Ok(dir.join(batch_filename(
        courier,
        date,
        publisher,
        timestamp,
        batch_number,
    )))
}
