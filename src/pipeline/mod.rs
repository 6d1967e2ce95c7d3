//! Pipeline stages for splitting an AWB document.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ classify ──▶ batch ──▶ layout
//! (URL/path)  (pdfium)    (rules)    (≤ N pages) (root/courier/date/…)
//!                 │
//!                 └──▶ metadata (date, publisher, timestamp)
//! ```
//!
//! 1. [`input`]    — canonicalise the user-supplied path or URL to a local
//!    file and remember the document's original filename
//! 2. [`extract`]  — page text and batch assembly via pdfium; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`classify`] — whole-document routing from the filename, or the
//!    ordered per-page courier rules
//! 4. [`metadata`] — date token, publisher and run timestamp
//! 5. [`batch`]    — order-preserving buckets cut into bounded batches
//! 6. [`layout`]   — output directory and file name for each batch

pub mod batch;
pub mod classify;
pub mod extract;
pub mod input;
pub mod layout;
pub mod metadata;
