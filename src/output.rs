//! Run results: what was written, what failed, and the dry-run plan.

use crate::error::{AwbError, BatchError, PageError};
use crate::pipeline::classify::{Courier, RoutingMode};
use crate::pipeline::metadata::RunMetadata;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Result of splitting one document.
///
/// Returned even when some batches failed; check
/// [`failed_batches`](Self::failed_batches) or call
/// [`into_result`](Self::into_result).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitReport {
    /// Original filename the run was keyed on.
    pub source_filename: String,
    pub mode: RoutingMode,
    pub metadata: RunMetadata,
    /// Pages routed to each courier. Couriers with no pages are absent.
    pub pages_by_courier: BTreeMap<Courier, usize>,
    /// Batches in place, ordered by courier then batch number.
    pub batches: Vec<BatchOutcome>,
    pub failed_batches: Vec<BatchError>,
    /// Pages whose text could not be read (routed to OTHERS).
    pub page_errors: Vec<PageError>,
    pub stats: SplitStats,
}

/// One batch file that was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub courier: Courier,
    /// 1-based, contiguous per courier.
    pub number: usize,
    /// Number of pages in the file.
    pub pages: usize,
    pub path: PathBuf,
}

/// Aggregate numbers for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitStats {
    pub total_pages: usize,
    pub batches_written: usize,
    pub batches_failed: usize,
    /// Wall-clock time from start to the last batch attempt.
    pub duration_ms: u64,
}

impl SplitReport {
    /// True when every planned batch was written.
    pub fn is_complete(&self) -> bool {
        self.failed_batches.is_empty()
    }

    /// Paths of all written batch files.
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.batches.iter().map(|b| &b.path)
    }

    /// Treat any failed batch as an error.
    pub fn into_result(self) -> Result<SplitReport, AwbError> {
        if self.is_complete() {
            return Ok(self);
        }
        let written = self.batches.len();
        let failed = self.failed_batches.len();
        Err(AwbError::PartialFailure {
            written,
            failed,
            total: written + failed,
        })
    }
}

/// What a run would produce, computed without writing anything.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitPlan {
    pub source_filename: String,
    pub mode: RoutingMode,
    pub metadata: RunMetadata,
    pub total_pages: usize,
    pub pages_by_courier: BTreeMap<Courier, usize>,
    pub batches: Vec<PlannedBatch>,
    pub page_errors: Vec<PageError>,
}

/// One batch a run would write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedBatch {
    pub courier: Courier,
    pub number: usize,
    /// 1-based page numbers in output order.
    pub pages: Vec<usize>,
    pub path: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(failed: Vec<BatchError>) -> SplitReport {
        SplitReport {
            source_filename: "AWB 29 SEPT.pdf".into(),
            mode: RoutingMode::PerPage,
            metadata: RunMetadata {
                date: "29_Sept".into(),
                date_defaulted: false,
                publisher: None,
                timestamp: "20260929_101500".into(),
            },
            pages_by_courier: BTreeMap::from([(Courier::Dhl, 3)]),
            batches: vec![BatchOutcome {
                courier: Courier::Dhl,
                number: 1,
                pages: 3,
                path: PathBuf::from("output/awb/dhl/29_Sept/AWB_DHL_29_Sept_20260929_101500_1.pdf"),
            }],
            stats: SplitStats {
                total_pages: 3,
                batches_written: 1,
                batches_failed: failed.len(),
                duration_ms: 12,
            },
            failed_batches: failed,
            page_errors: Vec::new(),
        }
    }

    #[test]
    fn complete_report_passes_through() {
        let r = report(Vec::new()).into_result().unwrap();
        assert_eq!(r.paths().count(), 1);
    }

    #[test]
    fn any_failed_batch_is_partial_failure() {
        let failed = vec![BatchError::WriteFailed {
            courier: Courier::Gdex,
            batch: 1,
            path: PathBuf::from("x.pdf"),
            detail: "disk full".into(),
        }];
        match report(failed).into_result() {
            Err(AwbError::PartialFailure {
                written,
                failed,
                total,
            }) => assert_eq!((written, failed, total), (1, 1, 2)),
            other => panic!("expected PartialFailure, got {other:?}"),
        }
    }

    #[test]
    fn report_serialises_courier_keys_as_labels() {
        let json = serde_json::to_value(report(Vec::new())).unwrap();
        assert_eq!(json["pages_by_courier"]["DHL"], 3);
        assert_eq!(json["mode"], "per_page");
        assert_eq!(json["batches"][0]["courier"], "DHL");
    }
}
