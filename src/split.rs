//! Splitting entry points.
//!
//! A run has two halves that overlap:
//!
//! * **read** (blocking): route every page, compute run metadata, cut the
//!   buckets into batches and assemble each batch into PDF bytes. Everything
//!   that touches pdfium happens here, on one `spawn_blocking` thread, and
//!   each assembled batch is handed over through a bounded channel.
//! * **write** (async): hand each batch to the configured
//!   [`OutputSink`](crate::sink::OutputSink) as soon as it arrives, up to
//!   `config.concurrency` at a time. Batches target disjoint paths, and a
//!   failed batch never stops the others.
//!
//! `timeout_secs` is one deadline for both halves. The reader checks it
//! before every page and batch, and no write starts after it passes. A sink
//! write already running at the deadline cannot be interrupted; it finishes
//! in the background (atomically, so no partial file appears) while the run
//! returns [`AwbError::Timeout`].

use crate::config::SplitConfig;
use crate::error::{AwbError, BatchError, PageError};
use crate::output::{BatchOutcome, PlannedBatch, SplitPlan, SplitReport, SplitStats};
use crate::pipeline::batch::{self, Batch, Buckets};
use crate::pipeline::classify::{self, Courier, RoutingMode};
use crate::pipeline::extract::{self, PageSource, PdfiumDocument};
use crate::pipeline::input;
use crate::pipeline::layout;
use crate::pipeline::metadata::{PublisherScan, RunMetadata};
use crate::sink::OutputSink;
use chrono::NaiveDateTime;
use futures::stream::{self, Stream, StreamExt};
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Split a PDF file or URL into courier batches.
///
/// The routing trigger and the date token are read from the input's file
/// name (the last URL path segment for URLs). Use [`split_as`] when the
/// document was uploaded under a different name.
///
/// # Returns
/// `Ok(SplitReport)` once every batch has been attempted, even if some
/// failed to write (see [`SplitReport::into_result`]).
///
/// # Errors
/// Only for document-level failures: the input cannot be found, downloaded,
/// opened or parsed, pdfium is unavailable, or the run timed out.
pub async fn split(
    input_str: impl AsRef<str>,
    config: &SplitConfig,
) -> Result<SplitReport, AwbError> {
    run_input(input_str.as_ref(), None, config).await
}

/// Like [`split`], with an explicit original filename.
pub async fn split_as(
    input_str: impl AsRef<str>,
    filename: &str,
    config: &SplitConfig,
) -> Result<SplitReport, AwbError> {
    run_input(input_str.as_ref(), Some(filename), config).await
}

/// Split PDF bytes held in memory.
///
/// The bytes go to a managed temp file that is removed when this returns.
///
/// # Example
/// ```rust,no_run
/// use awbsplit::{split_from_bytes, SplitConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("upload.bin")?;
/// let report = split_from_bytes(&bytes, "AWB 29 SEPT.pdf", &SplitConfig::default()).await?;
/// for path in report.paths() {
///     println!("{}", path.display());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn split_from_bytes(
    bytes: &[u8],
    filename: &str,
    config: &SplitConfig,
) -> Result<SplitReport, AwbError> {
    let mut tmp = tempfile::Builder::new()
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| AwbError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| AwbError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `split_as` returns
    split_as(&path, filename, config).await
}

/// Synchronous wrapper around [`split`].
///
/// Creates a temporary tokio runtime internally.
pub fn split_sync(
    input_str: impl AsRef<str>,
    config: &SplitConfig,
) -> Result<SplitReport, AwbError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| AwbError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(split(input_str, config))
}

/// Split an already-open document.
///
/// Routing and assembly run on the calling task, so a custom [`PageSource`]
/// does not have to be `Send`. The run deadline is checked between pages and
/// between batches; once it passes no further batch is written.
pub async fn split_source<S>(
    source: &S,
    filename: &str,
    config: &SplitConfig,
) -> Result<SplitReport, AwbError>
where
    S: PageSource + ?Sized,
{
    config.validate()?;
    let deadline = Deadline::after_secs(config.timeout_secs);
    with_deadline(
        filename,
        deadline,
        run_source(source, filename, config, run_clock(), deadline),
    )
    .await
}

/// Dry run: route every page and plan the batches without writing.
pub async fn inspect(
    input_str: impl AsRef<str>,
    filename: Option<&str>,
    config: &SplitConfig,
) -> Result<SplitPlan, AwbError> {
    config.validate()?;
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    let filename = filename
        .map(str::to_string)
        .unwrap_or_else(|| resolved.filename());
    let pdf_path = resolved.path().to_path_buf();
    let password = config.password.clone();
    let config = config.clone();
    let now = run_clock();
    let deadline = Deadline::after_secs(config.timeout_secs);
    let label = filename.clone();

    with_deadline(&label, deadline, async move {
        tokio::task::spawn_blocking(move || {
            let pdfium = extract::bind_pdfium()?;
            let doc = PdfiumDocument::open(&pdfium, &pdf_path, password.as_deref())?;
            plan_source(&doc, &filename, &config, now, deadline)
        })
        .await
        .map_err(task_failed)?
    })
    .await
}

/// Dry run against an already-open document.
pub fn inspect_source<S>(
    source: &S,
    filename: &str,
    config: &SplitConfig,
) -> Result<SplitPlan, AwbError>
where
    S: PageSource + ?Sized,
{
    config.validate()?;
    let deadline = Deadline::after_secs(config.timeout_secs);
    plan_source(source, filename, config, run_clock(), deadline)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Routed pages and run metadata for one document.
struct Routed {
    mode: RoutingMode,
    metadata: RunMetadata,
    buckets: Buckets,
    page_errors: Vec<PageError>,
    total_pages: usize,
}

/// One batch as it comes off the reading half.
enum Assembled {
    Ready(Batch, Vec<u8>),
    Failed(BatchError),
    /// The run deadline passed before the batch was assembled.
    Skipped,
}

/// The instant a run must be done by, shared by the reading and writing
/// halves. `secs == 0` never expires.
#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Option<Instant>,
    secs: u64,
}

impl Deadline {
    fn after_secs(secs: u64) -> Self {
        Self {
            at: (secs > 0).then(|| Instant::now() + Duration::from_secs(secs)),
            secs,
        }
    }

    fn expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    fn timeout(&self, filename: &str) -> AwbError {
        AwbError::Timeout {
            filename: filename.to_string(),
            secs: self.secs,
        }
    }

    fn check(&self, filename: &str) -> Result<(), AwbError> {
        if self.expired() {
            Err(self.timeout(filename))
        } else {
            Ok(())
        }
    }
}

fn run_clock() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn task_failed(e: tokio::task::JoinError) -> AwbError {
    AwbError::Internal(format!("pdfium task failed: {e}"))
}

async fn run_input(
    input_str: &str,
    filename: Option<&str>,
    config: &SplitConfig,
) -> Result<SplitReport, AwbError> {
    config.validate()?;
    info!("Starting split: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let filename = filename
        .map(str::to_string)
        .unwrap_or_else(|| resolved.filename());
    let pdf_path = resolved.path().to_path_buf();

    // `resolved` outlives the run so a downloaded temp file stays on disk.
    let start = Instant::now();
    let deadline = Deadline::after_secs(config.timeout_secs);
    let report = with_deadline(
        &filename,
        deadline,
        run_pdf(pdf_path, &filename, config, deadline, start),
    )
    .await;
    drop(resolved);
    report
}

/// Open the PDF on a blocking thread and stream its batches to the writers.
///
/// pdfium's document handle borrows the bound library, so both live and die
/// on that thread; only the routing result and owned batch bytes cross back.
/// The channel holds at most `concurrency` assembled batches, so assembly
/// waits for the writers instead of buffering the whole document. When the
/// writing half goes away (deadline, dropped future) the thread stops at the
/// next page or batch.
async fn run_pdf(
    pdf_path: PathBuf,
    filename: &str,
    config: &SplitConfig,
    deadline: Deadline,
    start: Instant,
) -> Result<SplitReport, AwbError> {
    let (routed_tx, routed_rx) = oneshot::channel::<Routed>();
    let (batch_tx, batch_rx) = mpsc::channel::<Assembled>(config.concurrency.max(1));

    let reader = {
        let password = config.password.clone();
        let config = config.clone();
        let filename = filename.to_string();
        let now = run_clock();
        tokio::task::spawn_blocking(move || {
            let pdfium = extract::bind_pdfium()?;
            let doc = PdfiumDocument::open(&pdfium, &pdf_path, password.as_deref())?;
            let routed = route(&doc, &filename, &config, now, deadline)?;
            let planned = plan_batches(&routed, &config);
            if routed_tx.send(routed).is_err() {
                return Ok(());
            }
            for b in planned {
                if batch_tx.blocking_send(assemble(&doc, b, deadline)).is_err() {
                    debug!("Writers gone; stopping assembly of '{}'", filename);
                    break;
                }
            }
            Ok::<_, AwbError>(())
        })
    };

    let routed = match routed_rx.await {
        Ok(routed) => routed,
        Err(_) => {
            reader.await.map_err(task_failed)??;
            return Err(AwbError::Internal("pdfium task ended before routing".into()));
        }
    };

    let items = stream::unfold(batch_rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    });
    let results = write_stream(items, &routed.metadata, config, deadline).await;
    reader.await.map_err(task_failed)??;
    finish(filename, routed, results, config, deadline, start)
}

/// Route, assemble and write an in-process document on the calling task.
///
/// Batches are assembled lazily as the writers pull them.
async fn run_source<S>(
    source: &S,
    filename: &str,
    config: &SplitConfig,
    now: NaiveDateTime,
    deadline: Deadline,
) -> Result<SplitReport, AwbError>
where
    S: PageSource + ?Sized,
{
    let start = Instant::now();
    let routed = route(source, filename, config, now, deadline)?;
    let planned = plan_batches(&routed, config);
    let items = stream::iter(planned).map(|b| assemble(source, b, deadline));
    let results = write_stream(items, &routed.metadata, config, deadline).await;
    finish(filename, routed, results, config, deadline, start)
}

fn plan_batches(routed: &Routed, config: &SplitConfig) -> Vec<Batch> {
    let planned = batch::split_buckets(&routed.buckets, config.max_batch_size);
    if let Some(ref cb) = config.progress_callback {
        cb.on_batches_planned(planned.len());
    }
    debug!("Planned {} batches", planned.len());
    planned
}

fn assemble<S>(source: &S, b: Batch, deadline: Deadline) -> Assembled
where
    S: PageSource + ?Sized,
{
    if deadline.expired() {
        return Assembled::Skipped;
    }
    match batch::materialize(source, &b) {
        Ok(bytes) => Assembled::Ready(b, bytes),
        Err(e) => {
            warn!("{}", e);
            Assembled::Failed(e)
        }
    }
}

fn plan_source<S>(
    source: &S,
    filename: &str,
    config: &SplitConfig,
    now: NaiveDateTime,
    deadline: Deadline,
) -> Result<SplitPlan, AwbError>
where
    S: PageSource + ?Sized,
{
    let routed = route(source, filename, config, now, deadline)?;
    let batches = batch::split_buckets(&routed.buckets, config.max_batch_size)
        .into_iter()
        .map(|b| {
            let meta = &routed.metadata;
            let path = layout::batch_dir(&config.output_root, b.courier, &meta.date).join(
                layout::batch_filename(
                    b.courier,
                    &meta.date,
                    meta.publisher.as_deref(),
                    &meta.timestamp,
                    b.number,
                ),
            );
            PlannedBatch {
                courier: b.courier,
                number: b.number,
                pages: b.pages.iter().map(|idx| idx + 1).collect(),
                path,
            }
        })
        .collect();

    Ok(SplitPlan {
        source_filename: filename.to_string(),
        mode: routed.mode,
        pages_by_courier: routed.buckets.counts(),
        total_pages: routed.total_pages,
        metadata: routed.metadata,
        batches,
        page_errors: routed.page_errors,
    })
}

/// Route every page to a courier and derive the run metadata.
///
/// The deadline is checked before each page read.
fn route<S>(
    source: &S,
    filename: &str,
    config: &SplitConfig,
    now: NaiveDateTime,
    deadline: Deadline,
) -> Result<Routed, AwbError>
where
    S: PageSource + ?Sized,
{
    let cb = config.progress_callback.as_ref();
    let total_pages = source.page_count();
    if let Some(cb) = cb {
        cb.on_split_start(total_pages);
    }

    let mode = classify::routing_mode(filename);
    let mut page_errors = Vec::new();

    let (buckets, publisher) = match mode {
        RoutingMode::WholeDocument => {
            info!(
                "'{}' routed whole to {} ({} pages)",
                filename,
                Courier::PosLaju,
                total_pages
            );
            if let Some(cb) = cb {
                for page_num in 1..=total_pages {
                    cb.on_page_classified(page_num, total_pages, Courier::PosLaju);
                }
            }
            (Buckets::whole_document(Courier::PosLaju, total_pages), None)
        }
        RoutingMode::PerPage => {
            let mut scan = PublisherScan::default();
            let mut classified = Vec::with_capacity(total_pages);
            for idx in 0..total_pages {
                deadline.check(filename)?;
                let (text, error) = extract::extract_text(source, idx);
                if let Some(e) = error {
                    warn!("{}; routing to {}", e, Courier::Others);
                    page_errors.push(e);
                }
                if let Some(ref t) = text {
                    scan.observe(t);
                }
                let courier = classify::classify_page(text.as_deref());
                debug!("Page {}/{} → {}", idx + 1, total_pages, courier);
                if let Some(cb) = cb {
                    cb.on_page_classified(idx + 1, total_pages, courier);
                }
                classified.push((idx, courier));
            }
            (Buckets::from_classified(classified), scan.finish())
        }
    };

    let metadata = RunMetadata::new(filename, publisher, now);
    if metadata.date_defaulted {
        debug!("No date in '{}'; using {}", filename, metadata.date);
    }
    info!(
        "Routed {} pages: {:?} (date {}, publisher {:?})",
        total_pages,
        buckets.counts(),
        metadata.date,
        metadata.publisher
    );

    Ok(Routed {
        mode,
        metadata,
        buckets,
        page_errors,
        total_pages,
    })
}

/// Write batches as they arrive, up to `config.concurrency` at a time.
///
/// `None` marks a batch dropped because the deadline passed before its
/// write started.
async fn write_stream<St>(
    items: St,
    metadata: &RunMetadata,
    config: &SplitConfig,
    deadline: Deadline,
) -> Vec<Option<Result<BatchOutcome, BatchError>>>
where
    St: Stream<Item = Assembled>,
{
    let metadata = Arc::new(metadata.clone());

    items
        .map(|item| {
            let sink = Arc::clone(&config.sink);
            let root = config.output_root.clone();
            let metadata = Arc::clone(&metadata);
            let cb = config.progress_callback.clone();
            async move {
                let result = match item {
                    Assembled::Skipped => return None,
                    Assembled::Failed(e) => Err(e),
                    Assembled::Ready(b, bytes) => {
                        let (courier, number) = (b.courier, b.number);
                        let written = tokio::task::spawn_blocking(move || {
                            if deadline.expired() {
                                return None;
                            }
                            Some(write_batch(sink.as_ref(), &root, &metadata, &b, &bytes))
                        })
                        .await
                        .unwrap_or_else(|e| {
                            Some(Err(BatchError::WriteFailed {
                                courier,
                                batch: number,
                                path: PathBuf::new(),
                                detail: format!("writer task failed: {e}"),
                            }))
                        });
                        let Some(result) = written else {
                            return None;
                        };
                        result
                    }
                };
                if let Some(ref cb) = cb {
                    match &result {
                        Ok(outcome) => {
                            cb.on_batch_written(outcome.courier, outcome.number, outcome.pages)
                        }
                        Err(e) => cb.on_batch_error(e.courier(), e.batch(), &e.to_string()),
                    }
                }
                Some(result)
            }
        })
        .buffer_unordered(config.concurrency.max(1))
        .collect()
        .await
}

/// Turn per-batch results into the run report.
fn finish(
    filename: &str,
    routed: Routed,
    results: Vec<Option<Result<BatchOutcome, BatchError>>>,
    config: &SplitConfig,
    deadline: Deadline,
    start: Instant,
) -> Result<SplitReport, AwbError> {
    let mut written = Vec::new();
    let mut failed = Vec::new();
    let mut skipped = 0;
    for result in results {
        match result {
            Some(Ok(outcome)) => written.push(outcome),
            Some(Err(e)) => {
                warn!("{}", e);
                failed.push(e);
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(
            "'{}' hit its {}s deadline; {} batches not written",
            filename, deadline.secs, skipped
        );
        return Err(deadline.timeout(filename));
    }

    // Completion order is arbitrary; report in courier/batch order.
    written.sort_by_key(|o: &BatchOutcome| (o.courier, o.number));
    failed.sort_by_key(|e: &BatchError| (e.courier(), e.batch()));

    let stats = SplitStats {
        total_pages: routed.total_pages,
        batches_written: written.len(),
        batches_failed: failed.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Split complete: {} batches written, {} failed, {}ms",
        stats.batches_written, stats.batches_failed, stats.duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_split_complete(stats.batches_written, stats.batches_failed);
    }

    Ok(SplitReport {
        source_filename: filename.to_string(),
        mode: routed.mode,
        pages_by_courier: routed.buckets.counts(),
        metadata: routed.metadata,
        batches: written,
        failed_batches: failed,
        page_errors: routed.page_errors,
        stats,
    })
}

fn write_batch(
    sink: &dyn OutputSink,
    root: &Path,
    metadata: &RunMetadata,
    b: &Batch,
    bytes: &[u8],
) -> Result<BatchOutcome, BatchError> {
    let path = layout::resolve(
        sink,
        root,
        b.courier,
        &metadata.date,
        metadata.publisher.as_deref(),
        &metadata.timestamp,
        b.number,
    )
    .map_err(|(dir, e)| BatchError::DirectoryFailed {
        courier: b.courier,
        batch: b.number,
        dir,
        detail: e.to_string(),
    })?;

    sink.write_atomic(&path, bytes)
        .map_err(|e| BatchError::WriteFailed {
            courier: b.courier,
            batch: b.number,
            path: path.clone(),
            detail: e.to_string(),
        })?;

    debug!("Wrote {} ({} pages)", path.display(), b.pages.len());
    Ok(BatchOutcome {
        courier: b.courier,
        number: b.number,
        pages: b.pages.len(),
        path,
    })
}

/// Bound `fut` by `deadline`.
///
/// This only preempts at await points; synchronous stages check the
/// deadline themselves between pages and batches.
async fn with_deadline<T, F>(filename: &str, deadline: Deadline, fut: F) -> Result<T, AwbError>
where
    F: Future<Output = Result<T, AwbError>>,
{
    let Some(at) = deadline.at else {
        return fut.await;
    };
    tokio::time::timeout_at(tokio::time::Instant::from_std(at), fut)
        .await
        .map_err(|_| deadline.timeout(filename))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use chrono::NaiveDate;

    /// Text per page; `assemble` encodes the selected page numbers.
    struct FakeDoc(Vec<Option<&'static str>>);

    impl PageSource for FakeDoc {
        fn page_count(&self) -> usize {
            self.0.len()
        }

        fn page_text(&self, index: usize) -> Result<Option<String>, PageError> {
            Ok(self.0[index].map(str::to_string))
        }

        fn assemble(&self, pages: &[usize]) -> Result<Vec<u8>, String> {
            Ok(format!("{pages:?}").into_bytes())
        }
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn config(sink: Arc<MemorySink>) -> SplitConfig {
        SplitConfig::builder()
            .output_root("/out")
            .max_batch_size(2)
            .sink(sink)
            .build()
            .unwrap()
    }

    fn unbounded() -> Deadline {
        Deadline::after_secs(0)
    }

    #[test]
    fn whole_document_mode_reads_no_text() {
        struct Untouchable(usize);
        impl PageSource for Untouchable {
            fn page_count(&self) -> usize {
                self.0
            }
            fn page_text(&self, _index: usize) -> Result<Option<String>, PageError> {
                panic!("text must not be read in whole-document mode");
            }
            fn assemble(&self, _pages: &[usize]) -> Result<Vec<u8>, String> {
                Ok(Vec::new())
            }
        }

        let cfg = config(Arc::new(MemorySink::new()));
        let routed = route(&Untouchable(5), "AWB pos LAJU.pdf", &cfg, at(9, 0, 0), unbounded())
            .unwrap();
        assert_eq!(routed.mode, RoutingMode::WholeDocument);
        assert_eq!(routed.buckets.get(Courier::PosLaju), &[0, 1, 2, 3, 4]);
        assert_eq!(routed.metadata.publisher, None);

        let sizes: Vec<usize> = plan_batches(&routed, &cfg).iter().map(|b| b.pages.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }

    #[test]
    fn publisher_comes_from_first_page_that_names_one() {
        let cfg = config(Arc::new(MemorySink::new()));
        let doc = FakeDoc(vec![
            Some("gdex"),
            Some("DHL ID 1 PTS BOOKCAFE"),
            Some("IMAN PUBLICATION"),
        ]);
        let routed = route(&doc, "AWB.pdf", &cfg, at(9, 0, 0), unbounded()).unwrap();
        assert_eq!(routed.metadata.publisher.as_deref(), Some("PTSBOOKCAFE"));
        assert_eq!(routed.metadata.date, "20261018");
        assert!(routed.metadata.date_defaulted);
    }

    #[test]
    fn batches_land_under_courier_and_date() {
        let sink = Arc::new(MemorySink::new());
        let cfg = config(Arc::clone(&sink));
        let doc = FakeDoc(vec![Some("DHL ID 1"), None, Some("DHL ID 2"), Some("DHL ID 3")]);

        let report = tokio_test::block_on(run_source(
            &doc,
            "AWB 29 SEPT.pdf",
            &cfg,
            at(10, 15, 0),
            unbounded(),
        ))
        .unwrap();

        let paths: Vec<PathBuf> = report.paths().cloned().collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/out/dhl/29_Sept/AWB_DHL_29_Sept_20261018_101500_1.pdf"),
                PathBuf::from("/out/dhl/29_Sept/AWB_DHL_29_Sept_20261018_101500_2.pdf"),
                PathBuf::from("/out/others/29_Sept/AWB_Others_29_Sept_20261018_101500_1.pdf"),
            ]
        );
        assert_eq!(sink.file(&paths[1]).unwrap(), b"[3]");
        assert_eq!(report.stats.total_pages, 4);
        assert!(report.is_complete());
    }

    #[test]
    fn deadline_zero_never_expires() {
        let d = unbounded();
        assert!(!d.expired());
        assert!(d.check("a.pdf").is_ok());
    }

    #[test]
    fn passed_deadline_stops_routing_before_the_next_page() {
        let cfg = config(Arc::new(MemorySink::new()));
        let passed = Deadline {
            at: Some(Instant::now()),
            secs: 3,
        };
        let doc = FakeDoc(vec![Some("gdex"); 4]);

        let err = route(&doc, "AWB.pdf", &cfg, at(9, 0, 0), passed).err().unwrap();
        assert!(matches!(err, AwbError::Timeout { secs: 3, .. }), "got {err:?}");
    }

    #[test]
    fn no_batch_is_written_once_the_deadline_has_passed() {
        let sink = Arc::new(MemorySink::new());
        let cfg = config(Arc::clone(&sink));
        let doc = FakeDoc(vec![Some("gdex"); 3]);
        let routed = route(&doc, "AWB.pdf", &cfg, at(9, 0, 0), unbounded()).unwrap();
        let passed = Deadline {
            at: Some(Instant::now()),
            secs: 1,
        };

        let items = stream::iter(plan_batches(&routed, &cfg)).map(|b| assemble(&doc, b, passed));
        let results = tokio_test::block_on(write_stream(items, &routed.metadata, &cfg, passed));
        assert!(results.iter().all(Option::is_none));
        assert!(sink.files().is_empty());

        let err = finish("AWB.pdf", routed, results, &cfg, passed, Instant::now()).unwrap_err();
        assert!(matches!(err, AwbError::Timeout { secs: 1, .. }), "got {err:?}");
    }

    #[test]
    fn unbounded_timeout_just_awaits() {
        let v = tokio_test::block_on(with_deadline("a.pdf", unbounded(), async {
            Ok::<_, AwbError>(7)
        }));
        assert_eq!(v.unwrap(), 7);
    }

    #[tokio::test]
    async fn slow_runs_time_out() {
        let err = with_deadline(
            "slow.pdf",
            Deadline::after_secs(1),
            std::future::pending::<Result<(), AwbError>>(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AwbError::Timeout { secs: 1, .. }), "got {err:?}");
        assert!(!err.is_bad_input());
    }
}
