//! Error types for the awbsplit library.
//!
//! Three error types reflect three failure scopes:
//!
//! * [`AwbError`] — **Fatal**: the run cannot proceed at all (file missing,
//!   not a PDF, wrong password, pdfium unavailable, run timed out). Returned
//!   as `Err(AwbError)` from the top-level `split*` functions before any
//!   batch is written.
//!
//! * [`PageError`] — **Non-fatal**: text could not be read from one page.
//!   The page is routed to `OTHERS` and the error is kept in the report.
//!
//! * [`BatchError`] — **Non-fatal**: one batch could not be assembled or
//!   written. Sibling batches and other couriers are unaffected; the error
//!   is listed in [`crate::output::SplitReport::failed_batches`].

use crate::pipeline::classify::Courier;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the awbsplit library.
#[derive(Debug, Error)]
pub enum AwbError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The PDF opened but has no pages to split.
    #[error("PDF '{path}' has no pages")]
    EmptyDocument { path: PathBuf },

    // ── Run errors ────────────────────────────────────────────────────────
    /// The whole run exceeded `timeout_secs`.
    #[error("Splitting '{filename}' timed out after {secs}s")]
    Timeout { filename: String, secs: u64 },

    /// At least one batch failed to write.
    ///
    /// Returned by [`crate::output::SplitReport::into_result`] when the
    /// caller wants to treat any batch failure as an error.
    #[error("{failed}/{total} batches failed to write")]
    PartialFailure { written: usize, failed: usize, total: usize },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium, place the library next to the\n\
executable, or install it on the system library path.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AwbError {
    /// True when the failure is the caller's input (unreadable document),
    /// as opposed to a fault in this process or its environment.
    ///
    /// Upload layers map this to a "bad request" style response.
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            AwbError::FileNotFound { .. }
                | AwbError::PermissionDenied { .. }
                | AwbError::InvalidInput { .. }
                | AwbError::DownloadFailed { .. }
                | AwbError::DownloadTimeout { .. }
                | AwbError::NotAPdf { .. }
                | AwbError::CorruptPdf { .. }
                | AwbError::PasswordRequired { .. }
                | AwbError::WrongPassword { .. }
                | AwbError::EmptyDocument { .. }
        )
    }
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PageError {
    /// The page's text layer could not be read.
    #[error("Page {page}: text extraction failed: {detail}")]
    TextExtractionFailed { page: usize, detail: String },
}

/// A non-fatal error for a single batch.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BatchError {
    /// Copying the selected pages into a new document failed.
    #[error("{courier} batch {batch}: could not assemble pages: {detail}")]
    AssembleFailed {
        courier: Courier,
        batch: usize,
        detail: String,
    },

    /// The destination directory could not be created.
    #[error("{courier} batch {batch}: could not create '{dir}': {detail}")]
    DirectoryFailed {
        courier: Courier,
        batch: usize,
        dir: PathBuf,
        detail: String,
    },

    /// The batch file could not be written.
    #[error("{courier} batch {batch}: could not write '{path}': {detail}")]
    WriteFailed {
        courier: Courier,
        batch: usize,
        path: PathBuf,
        detail: String,
    },
}

impl BatchError {
    pub fn courier(&self) -> Courier {
        match self {
            BatchError::AssembleFailed { courier, .. }
            | BatchError::DirectoryFailed { courier, .. }
            | BatchError::WriteFailed { courier, .. } => *courier,
        }
    }

    pub fn batch(&self) -> usize {
        match self {
            BatchError::AssembleFailed { batch, .. }
            | BatchError::DirectoryFailed { batch, .. }
            | BatchError::WriteFailed { batch, .. } => *batch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_display() {
        let e = AwbError::PartialFailure {
            written: 4,
            failed: 1,
            total: 5,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/5"), "got: {msg}");
    }

    #[test]
    fn unreadable_documents_are_bad_input() {
        let corrupt = AwbError::CorruptPdf {
            path: "x.pdf".into(),
            detail: "xref".into(),
        };
        assert!(corrupt.is_bad_input());
        assert!(AwbError::NotAPdf {
            path: "x.pdf".into(),
            magic: *b"PK\x03\x04",
        }
        .is_bad_input());
    }

    #[test]
    fn system_faults_are_not_bad_input() {
        assert!(!AwbError::PdfiumBindingFailed("missing".into()).is_bad_input());
        assert!(!AwbError::Timeout {
            filename: "a.pdf".into(),
            secs: 5
        }
        .is_bad_input());
        assert!(!AwbError::Internal("boom".into()).is_bad_input());
    }

    #[test]
    fn timeout_display() {
        let e = AwbError::Timeout {
            filename: "AWB 29 SEPT.pdf".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
        assert!(e.to_string().contains("AWB 29 SEPT.pdf"));
    }

    #[test]
    fn batch_error_accessors() {
        let e = BatchError::DirectoryFailed {
            courier: Courier::Gdex,
            batch: 2,
            dir: "/ro/gdex/29_Sept".into(),
            detail: "read-only file system".into(),
        };
        assert_eq!(e.courier(), Courier::Gdex);
        assert_eq!(e.batch(), 2);
        assert!(e.to_string().contains("GDEX batch 2"), "got: {e}");
    }
}
