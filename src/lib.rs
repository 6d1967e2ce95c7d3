//! # awbsplit
//!
//! Split merged courier air-waybill (AWB) PDFs into per-courier batches.
//!
//! Marketplaces and publishers export shipping labels for many couriers as
//! one long PDF. Each courier wants only its own labels, and printers and
//! drop-off portals choke on long files. This crate routes every page to a
//! courier, keeps pages in their original order, and writes each courier's
//! pages as files of at most 20 pages under
//! `<root>/<courier>/<date>/AWB_<label>_<date>_<timestamp>_<n>.pdf`.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL, keep original name
//!  ├─ 2. Route     "pos laju" in the name → whole document to POSLAJU,
//!  │               otherwise per-page text rules (DHL → NINJA_VAN → GDEX → OTHERS)
//!  ├─ 3. Metadata  date token from the name, publisher from page text
//!  ├─ 4. Batch     order-preserving buckets cut into ≤ max_batch_size pages
//!  └─ 5. Write     concurrent atomic writes through an OutputSink
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use awbsplit::{split, SplitConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SplitConfig::builder().output_root("output/awb").build()?;
//!     let report = split("AWB 29 SEPT.pdf", &config).await?;
//!     for batch in &report.batches {
//!         println!("{} #{}: {}", batch.courier, batch.number, batch.path.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `awbsplit` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! awbsplit = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod sink;
pub mod split;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{SplitConfig, SplitConfigBuilder};
pub use error::{AwbError, BatchError, PageError};
pub use output::{BatchOutcome, PlannedBatch, SplitPlan, SplitReport, SplitStats};
pub use pipeline::batch::{Batch, Buckets};
pub use pipeline::classify::{Courier, RoutingMode};
pub use pipeline::extract::PageSource;
pub use pipeline::metadata::RunMetadata;
pub use progress::{NoopProgressCallback, ProgressCallback, SplitProgressCallback};
pub use sink::{FsSink, MemorySink, OutputSink};
pub use split::{inspect, inspect_source, split, split_as, split_from_bytes, split_source, split_sync};
