//! CLI binary for awbsplit.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `SplitConfig` and prints the report.

use anyhow::{Context, Result};
use awbsplit::{
    inspect, split_as, Courier, ProgressCallback, SplitConfig, SplitPlan, SplitProgressCallback,
    SplitReport,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner while the PDF opens, a page bar while pages
/// are routed, then a batch bar while files are written.
struct CliProgressCallback {
    bar: ProgressBar,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, prefix: &'static str, unit: &str, total: usize) {
        let template = format!(
            "{{spinner:.cyan}} {{prefix:.bold}}  \
             [{{bar:42.green/238}}] {{pos:>3}}/{{len}} {unit}  ⏱ {{elapsed_precise}}"
        );
        let style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_style(style);
        self.bar.set_prefix(prefix);
        self.bar.reset_eta();
    }
}

impl SplitProgressCallback for CliProgressCallback {
    fn on_split_start(&self, total_pages: usize) {
        self.activate_bar("Routing", "pages", total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Splitting {total_pages} pages…"))
        ));
    }

    fn on_page_classified(&self, _page_num: usize, _total: usize, _courier: Courier) {
        self.bar.inc(1);
    }

    fn on_batches_planned(&self, total_batches: usize) {
        self.activate_bar("Writing", "batches", total_batches);
    }

    fn on_batch_written(&self, courier: Courier, batch: usize, pages: usize) {
        self.bar.println(format!(
            "  {} {:<10} #{:<3} {}",
            green("✓"),
            courier.label(),
            batch,
            dim(&format!("{pages:>2} pages")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_error(&self, courier: Courier, batch: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<10} #{:<3} {}",
            red("✗"),
            courier.label(),
            batch,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_split_complete(&self, batches_written: usize, batches_failed: usize) {
        self.bar.finish_and_clear();
        if batches_failed == 0 {
            eprintln!(
                "{} {} batches written",
                green("✔"),
                bold(&batches_written.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} batches written  ({} failed)",
                if batches_written == 0 { red("✘") } else { cyan("⚠") },
                bold(&batches_written.to_string()),
                batches_written + batches_failed,
                red(&batches_failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Split a merged AWB export into output/awb/<courier>/<date>/
  awbsplit "AWB 29 SEPT.pdf"

  # Everything in one Pos Laju export goes to poslaju/, no text is read
  awbsplit "AWB Pos Laju 29 SEPT.pdf"

  # Uploaded file stored under a generated name
  awbsplit /var/uploads/7f3a.pdf --filename "AWB 29 SEPT.pdf"

  # Preview the routing without writing anything
  awbsplit --dry-run "AWB 29 SEPT.pdf"

  # Machine-readable report
  awbsplit --json "AWB 29 SEPT.pdf" > report.json

COURIERS:
  Label      Folder    Page text contains
  ─────────  ────────  ─────────────────────────────
  DHL        dhl       "dhl" (any case) or "DHL ID"
  NINJA_VAN  ninja     "ninja" or "d3lyv1"
  GDEX       gdex      "gdex"
  POSLAJU    poslaju   (file name contains "pos laju")
  OTHERS     others    anything else

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium (otherwise next to the binary,
                          the working directory, then the system path)
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Split merged courier AWB PDFs into per-courier batches.
#[derive(Parser, Debug)]
#[command(
    name = "awbsplit",
    version,
    about = "Split merged courier AWB PDFs into per-courier batches",
    long_about = "Route every page of a merged air-waybill PDF to its courier (DHL, Ninja Van, \
GDEX, Pos Laju, others) and write each courier's pages, in their original order, as batch files \
of at most 20 pages under <root>/<courier>/<date>/.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Root directory of the output tree.
    #[arg(short, long, env = "AWBSPLIT_OUTPUT_ROOT", default_value = "output/awb")]
    output_root: PathBuf,

    /// Original filename, when the input path does not carry it.
    #[arg(long, env = "AWBSPLIT_FILENAME")]
    filename: Option<String>,

    /// Maximum pages per batch file.
    #[arg(long, env = "AWBSPLIT_MAX_BATCH", default_value_t = 20,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_batch: u64,

    /// Number of batch files written concurrently.
    #[arg(short, long, env = "AWBSPLIT_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "AWBSPLIT_PASSWORD")]
    password: Option<String>,

    /// Upper bound on the whole run in seconds (0 = none).
    #[arg(long, env = "AWBSPLIT_TIMEOUT", default_value_t = 300)]
    timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "AWBSPLIT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print the routing and batch plan; write nothing.
    #[arg(long)]
    dry_run: bool,

    /// Output the report as JSON.
    #[arg(long, env = "AWBSPLIT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "AWBSPLIT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "AWBSPLIT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "AWBSPLIT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO-level library logs would tear the progress bar.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.dry_run;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn SplitProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Dry run ──────────────────────────────────────────────────────────
    if cli.dry_run {
        let plan = inspect(&cli.input, cli.filename.as_deref(), &config)
            .await
            .context("Failed to inspect PDF")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&plan).context("Failed to serialise plan")?
            );
        } else {
            print_plan(&plan);
        }
        return Ok(());
    }

    // ── Run split ────────────────────────────────────────────────────────
    let filename = cli.filename.clone().unwrap_or_else(|| default_filename(&cli.input));
    let report = split_as(&cli.input, &filename, &config)
        .await
        .context("Split failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        print_report(&report);
    }

    for failure in &report.failed_batches {
        eprintln!("{} {}", red("error:"), failure);
    }
    report
        .into_result()
        .context("Some batches were not written")?;
    Ok(())
}

/// Map CLI args to `SplitConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<SplitConfig> {
    let mut builder = SplitConfig::builder()
        .output_root(&cli.output_root)
        .max_batch_size(usize::try_from(cli.max_batch).context("--max-batch is too large")?)
        .concurrency(cli.concurrency)
        .timeout_secs(cli.timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// The name the library would derive itself; computed here so the report
/// header and the run agree for URL inputs too.
fn default_filename(input: &str) -> String {
    if awbsplit::pipeline::input::is_url(input) {
        awbsplit::pipeline::input::filename_from_url(input)
    } else {
        PathBuf::from(input)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| input.to_string())
    }
}

fn print_counts(counts: &std::collections::BTreeMap<Courier, usize>) {
    for (courier, pages) in counts {
        println!("  {:<10} {:>4} pages", courier.label(), pages);
    }
}

fn print_plan(plan: &SplitPlan) {
    println!("File:       {}", plan.source_filename);
    println!("Pages:      {}", plan.total_pages);
    println!("Routing:    {:?}", plan.mode);
    println!(
        "Date:       {}{}",
        plan.metadata.date,
        if plan.metadata.date_defaulted { " (run date)" } else { "" }
    );
    if let Some(ref p) = plan.metadata.publisher {
        println!("Publisher:  {}", p);
    }
    print_counts(&plan.pages_by_courier);
    for b in &plan.batches {
        let first = b.pages.first().copied().unwrap_or_default();
        let last = b.pages.last().copied().unwrap_or_default();
        println!(
            "  {} {}",
            dim(&format!("{:>3} pages (p{first}…p{last})", b.pages.len())),
            b.path.display()
        );
    }
    for e in &plan.page_errors {
        println!("  {} {}", cyan("⚠"), e);
    }
}

fn print_report(report: &SplitReport) {
    println!(
        "{}  {} pages  →  {} batches  {}ms",
        if report.is_complete() { green("✔") } else { cyan("⚠") },
        report.stats.total_pages,
        report.stats.batches_written,
        report.stats.duration_ms
    );
    print_counts(&report.pages_by_courier);
    for path in report.paths() {
        println!("  {}", path.display());
    }
    for e in &report.page_errors {
        eprintln!("  {} {}", cyan("⚠"), e);
    }
}
