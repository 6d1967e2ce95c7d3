//! Configuration for a splitting run.
//!
//! Every knob lives in [`SplitConfig`], built via [`SplitConfigBuilder`].
//! The output root is part of the config rather than a process-wide
//! constant, so two services (or two tests) can split into different trees
//! side by side.

use crate::error::AwbError;
use crate::pipeline::batch::DEFAULT_MAX_BATCH_SIZE;
use crate::progress::ProgressCallback;
use crate::sink::{FsSink, OutputSink};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for splitting one AWB document.
///
/// # Example
/// ```rust
/// use awbsplit::SplitConfig;
///
/// let config = SplitConfig::builder()
///     .output_root("/srv/awb")
///     .max_batch_size(20)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_batch_size, 20);
/// ```
#[derive(Clone)]
pub struct SplitConfig {
    /// Root of the output tree (`root/<courier>/<date>/…`). Default: `output/awb`.
    pub output_root: PathBuf,

    /// Maximum pages per batch file. Default: 20.
    ///
    /// Label printers and courier drop-off portals choke on long files; 20
    /// labels is what one printer tray run handles.
    pub max_batch_size: usize,

    /// Number of batch files written concurrently. Default: 4.
    pub concurrency: usize,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Upper bound on a whole run in seconds; `0` disables it. Default: 300.
    ///
    /// A run that exceeds it fails as a whole with [`AwbError::Timeout`].
    pub timeout_secs: u64,

    /// Where batch files are written. Default: [`FsSink`].
    pub sink: Arc<dyn OutputSink>,

    /// Optional per-run / per-page / per-batch progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("output/awb"),
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            concurrency: 4,
            password: None,
            download_timeout_secs: 120,
            timeout_secs: 300,
            sink: Arc::new(FsSink),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SplitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitConfig")
            .field("output_root", &self.output_root)
            .field("max_batch_size", &self.max_batch_size)
            .field("concurrency", &self.concurrency)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("timeout_secs", &self.timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn SplitProgressCallback>"),
            )
            .finish()
    }
}

impl SplitConfig {
    /// Create a new builder for `SplitConfig`.
    pub fn builder() -> SplitConfigBuilder {
        SplitConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check the constraints [`SplitConfigBuilder::build`] enforces.
    ///
    /// Fields are public, so every entry point re-checks a config before
    /// using it.
    pub fn validate(&self) -> Result<(), AwbError> {
        if self.max_batch_size == 0 {
            return Err(AwbError::InvalidConfig(
                "max batch size must be ≥ 1".into(),
            ));
        }
        if self.concurrency == 0 {
            return Err(AwbError::InvalidConfig("concurrency must be ≥ 1".into()));
        }
        if self.output_root.as_os_str().is_empty() {
            return Err(AwbError::InvalidConfig("output root must not be empty".into()));
        }
        Ok(())
    }
}

/// Builder for [`SplitConfig`].
#[derive(Debug)]
pub struct SplitConfigBuilder {
    config: SplitConfig,
}

impl SplitConfigBuilder {
    pub fn output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.output_root = root.into();
        self
    }

    pub fn max_batch_size(mut self, n: usize) -> Self {
        self.config.max_batch_size = n;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.config.sink = sink;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SplitConfig, AwbError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = SplitConfig::default();
        assert_eq!(c.max_batch_size, 20);
        assert_eq!(c.output_root, PathBuf::from("output/awb"));
        assert_eq!(c.concurrency, 4);
        assert_eq!(c.timeout_secs, 300);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = SplitConfig::builder().max_batch_size(0).build().unwrap_err();
        assert!(matches!(err, AwbError::InvalidConfig(_)));
    }

    #[test]
    fn empty_root_is_rejected() {
        assert!(SplitConfig::builder().output_root("").build().is_err());
    }

    #[test]
    fn concurrency_is_at_least_one() {
        let c = SplitConfig::builder().concurrency(0).build().unwrap();
        assert_eq!(c.concurrency, 1);
    }

    #[test]
    fn fields_changed_after_build_are_rechecked() {
        let mut c = SplitConfig::builder().build().unwrap();
        assert!(c.validate().is_ok());

        c.max_batch_size = 0;
        assert!(matches!(c.validate(), Err(AwbError::InvalidConfig(_))));

        c.max_batch_size = 20;
        c.concurrency = 0;
        assert!(matches!(c.validate(), Err(AwbError::InvalidConfig(_))));
    }

    #[test]
    fn debug_redacts_password() {
        let c = SplitConfig::builder().password("hunter2").build().unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("hunter2"), "got {dbg}");
        assert!(dbg.contains("<redacted>"));
    }
}
