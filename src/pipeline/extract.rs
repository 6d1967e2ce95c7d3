//! Page access: text extraction and batch assembly via pdfium.
//!
//! [`PageSource`] is the seam between the splitting logic and the PDF
//! engine. [`PdfiumDocument`] implements it on top of `pdfium-render`; tests
//! implement it with in-memory pages.
//!
//! ## Why blocking?
//!
//! pdfium keeps library-wide state and its document handles borrow the
//! `Pdfium` instance, so every pdfium call for a run happens on a single
//! blocking thread (see [`crate::split`]). The OS caches the `dlopen`, so
//! binding once per run costs next to nothing.

use crate::error::{AwbError, PageError};
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// A loaded, page-addressable document.
pub trait PageSource {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Raw text layer of page `index` (0-based).
    ///
    /// `Ok(None)` means the page has no text layer.
    fn page_text(&self, index: usize) -> Result<Option<String>, PageError>;

    /// Build a new PDF holding `pages` (0-based, in the given order).
    fn assemble(&self, pages: &[usize]) -> Result<Vec<u8>, String>;
}

/// Extract usable text for one page.
///
/// Whitespace-only text counts as absent. A failed extraction is returned
/// alongside `None` so the caller can record it and keep going.
pub fn extract_text<S>(source: &S, index: usize) -> (Option<String>, Option<PageError>)
where
    S: PageSource + ?Sized,
{
    match source.page_text(index) {
        Ok(Some(text)) if !text.trim().is_empty() => (Some(text), None),
        Ok(_) => (None, None),
        Err(e) => (None, Some(e)),
    }
}

/// Bind to the pdfium shared library.
///
/// Discovery order:
/// 1. `PDFIUM_LIB_PATH` (explicit path to the library file)
/// 2. Alongside the running executable
/// 3. The current working directory
/// 4. System library search paths
pub fn bind_pdfium() -> Result<Pdfium, AwbError> {
    if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
        if !path.is_empty() {
            debug!("Binding pdfium from PDFIUM_LIB_PATH={}", path);
            let bindings = Pdfium::bind_to_library(&path)
                .map_err(|e| AwbError::PdfiumBindingFailed(format!("{path}: {e:?}")))?;
            return Ok(Pdfium::new(bindings));
        }
    }

    let mut candidates = Vec::new();
    if let Some(dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        candidates.push(dir);
    }
    candidates.push(std::path::PathBuf::from("./"));

    for dir in &candidates {
        let lib = Pdfium::pdfium_platform_library_name_at_path(dir.to_string_lossy().as_ref());
        if let Ok(bindings) = Pdfium::bind_to_library(&lib) {
            debug!("Bound pdfium from {}", dir.display());
            return Ok(Pdfium::new(bindings));
        }
    }

    let bindings = Pdfium::bind_to_system_library()
        .map_err(|e| AwbError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// A PDF opened with pdfium.
pub struct PdfiumDocument<'a> {
    pdfium: &'a Pdfium,
    document: PdfDocument<'a>,
    page_count: usize,
}

impl<'a> PdfiumDocument<'a> {
    /// Open `pdf_path`, mapping pdfium failures to unreadable-document errors.
    pub fn open(
        pdfium: &'a Pdfium,
        pdf_path: &Path,
        password: Option<&'a str>,
    ) -> Result<Self, AwbError> {
        let document = pdfium
            .load_pdf_from_file(pdf_path, password)
            .map_err(|e| map_load_error(pdf_path, password.is_some(), format!("{e:?}")))?;

        let page_count = document.pages().len() as usize;
        if page_count == 0 {
            return Err(AwbError::EmptyDocument {
                path: pdf_path.to_path_buf(),
            });
        }
        info!("PDF loaded: {} pages", page_count);

        Ok(Self {
            pdfium,
            document,
            page_count,
        })
    }
}

impl PageSource for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn page_text(&self, index: usize) -> Result<Option<String>, PageError> {
        let failed = |detail: String| PageError::TextExtractionFailed {
            page: index + 1,
            detail,
        };
        let page = self
            .document
            .pages()
            .get(index as PdfPageIndex)
            .map_err(|e| failed(format!("{e:?}")))?;
        let text = page.text().map_err(|e| failed(format!("{e:?}")))?;
        let all = text.all();
        Ok((!all.is_empty()).then_some(all))
    }

    fn assemble(&self, pages: &[usize]) -> Result<Vec<u8>, String> {
        let mut batch = self
            .pdfium
            .create_new_pdf()
            .map_err(|e| format!("create document: {e:?}"))?;

        // One page at a time so the output order is exactly `pages`.
        for (dest, &src) in pages.iter().enumerate() {
            batch
                .pages_mut()
                .copy_page_from_document(&self.document, src as PdfPageIndex, dest as PdfPageIndex)
                .map_err(|e| format!("copy page {}: {e:?}", src + 1))?;
        }

        batch
            .save_to_bytes()
            .map_err(|e| format!("serialise: {e:?}"))
    }
}

fn map_load_error(path: &Path, had_password: bool, detail: String) -> AwbError {
    if detail.to_lowercase().contains("password") {
        if had_password {
            AwbError::WrongPassword {
                path: path.to_path_buf(),
            }
        } else {
            AwbError::PasswordRequired {
                path: path.to_path_buf(),
            }
        }
    } else {
        AwbError::CorruptPdf {
            path: path.to_path_buf(),
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pages(Vec<Result<Option<String>, PageError>>);

    impl PageSource for Pages {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn page_text(&self, index: usize) -> Result<Option<String>, PageError> {
            self.0[index].clone()
        }

        fn assemble(&self, _pages: &[usize]) -> Result<Vec<u8>, String> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn text_is_passed_through() {
        let src = Pages(vec![Ok(Some("DHL ID 42".into()))]);
        assert_eq!(extract_text(&src, 0), (Some("DHL ID 42".to_string()), None));
    }

    #[test]
    fn blank_text_is_absent() {
        let src = Pages(vec![Ok(Some(" \r\n\t".into())), Ok(None)]);
        assert_eq!(extract_text(&src, 0), (None, None));
        assert_eq!(extract_text(&src, 1), (None, None));
    }

    #[test]
    fn failures_become_absent_text_plus_error() {
        let err = PageError::TextExtractionFailed {
            page: 1,
            detail: "bad content stream".into(),
        };
        let src = Pages(vec![Err(err.clone())]);
        assert_eq!(extract_text(&src, 0), (None, Some(err)));
    }

    #[test]
    fn password_errors_are_distinguished() {
        let path = Path::new("locked.pdf");
        let e = map_load_error(path, false, "PdfiumLibraryInternalError(PasswordError)".into());
        assert!(matches!(e, AwbError::PasswordRequired { .. }), "got {e:?}");

        let e = map_load_error(path, true, "PdfiumLibraryInternalError(PasswordError)".into());
        assert!(matches!(e, AwbError::WrongPassword { .. }), "got {e:?}");

        let e = map_load_error(path, false, "PdfiumLibraryInternalError(FormatError)".into());
        assert!(matches!(e, AwbError::CorruptPdf { .. }), "got {e:?}");
        assert!(e.is_bad_input());
    }
}
