//! Input resolution: normalise a user-supplied path or URL to a local file.
//!
//! Besides a path pdfium can open, resolution yields the document's
//! *original filename*. Routing ("pos laju") and the date token are read
//! from that name, so a downloaded file keeps the last URL path segment
//! rather than the temp file's name.
//!
//! URL inputs are downloaded into a `TempDir` that lives as long as the
//! [`ResolvedInput`]. Magic bytes (`%PDF`) are checked up front so callers
//! get a meaningful error rather than a pdfium failure.

use crate::error::AwbError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The resolved input: either a local path or a downloaded temp file.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; PDF downloaded to a temp directory.
    /// The `TempDir` is kept alive to prevent cleanup until splitting completes.
    Downloaded {
        path: PathBuf,
        filename: String,
        _temp_dir: TempDir,
    },
}

impl ResolvedInput {
    /// Get the path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }

    /// The document's original filename (no directories).
    pub fn filename(&self) -> String {
        match self {
            ResolvedInput::Local(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.to_string_lossy().into_owned()),
            ResolvedInput::Downloaded { filename, .. } => filename.clone(),
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local PDF file path.
///
/// If the input is a URL, download it to a temporary directory.
/// If the input is a local file, validate it exists and is readable.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, AwbError> {
    if input.trim().is_empty() {
        return Err(AwbError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Resolve a local file path, validating existence and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, AwbError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(AwbError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(AwbError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(AwbError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(AwbError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, AwbError> {
    info!("Downloading PDF from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AwbError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AwbError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            AwbError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(AwbError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let filename = filename_from_url(url);

    let temp_dir = TempDir::new().map_err(|e| AwbError::Internal(e.to_string()))?;
    // The original name may hold characters a filesystem rejects; pdfium only
    // needs a path, the name travels separately.
    let file_path = temp_dir.path().join("input.pdf");

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AwbError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(AwbError::NotAPdf {
            path: PathBuf::from(filename),
            magic,
        });
    }

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| AwbError::Internal(format!("Failed to write temp file: {}", e)))?;

    info!("Downloaded '{}' to: {}", filename, file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        filename,
        _temp_dir: temp_dir,
    })
}

/// Last non-empty URL path segment, with `%20` and `+` read as spaces.
///
/// Only spaces are decoded: they are the one character the routing and date
/// rules depend on. Pass an explicit filename to preserve anything else.
pub fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty())
        .map(|last| last.replace("%20", " ").replace('+', " "))
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn url_filename_keeps_spaces() {
        assert_eq!(
            filename_from_url("https://files.example.com/up/AWB%20Pos%20%20Laju%2029%20SEPT.pdf"),
            "AWB Pos  Laju 29 SEPT.pdf"
        );
        assert_eq!(
            filename_from_url("https://example.com/a/AWB+mixed.pdf?x=1"),
            "AWB mixed.pdf"
        );
    }

    #[test]
    fn url_without_file_segment_gets_default_name() {
        assert_eq!(filename_from_url("https://example.com/"), "downloaded.pdf");
        assert_eq!(filename_from_url("not a url"), "downloaded.pdf");
    }

    #[test]
    fn local_filename_drops_directories() {
        let input = ResolvedInput::Local(PathBuf::from("/uploads/2026/AWB 29 SEPT.pdf"));
        assert_eq!(input.filename(), "AWB 29 SEPT.pdf");
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.err().unwrap();
        assert!(matches!(err, AwbError::FileNotFound { .. }), "got {err:?}");
        assert!(err.is_bad_input());
    }

    #[tokio::test]
    async fn non_pdf_is_rejected_by_magic_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.xlsx");
        std::fs::write(&path, b"PK\x03\x04rest").unwrap();
        let err = resolve_input(path.to_str().unwrap(), 5).await.err().unwrap();
        match err {
            AwbError::NotAPdf { magic, .. } => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_input_is_invalid() {
        let err = resolve_input("  ", 5).await.err().unwrap();
        assert!(matches!(err, AwbError::InvalidInput { .. }));
    }
}
