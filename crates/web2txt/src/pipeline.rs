//! Fetch → extract → normalize → write orchestration
//!
//! Stages run strictly in order and the first failure ends the run. Nothing
//! touches the output path before the write stage.

use crate::client::FetchOptions;
use crate::error::Web2TxtError;
use crate::extract::extract;
use crate::fetchers::{Fetcher, HttpFetcher};
use crate::normalize::normalize;
use crate::output::OutputTarget;
use crate::progress::{NoProgress, ProgressSink};
use crate::source::{normalize_url, SourceUrl};
use crate::types::{ConversionReport, FetchResult};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Text written when a page has no readable content
pub const EMPTY_CONTENT_PLACEHOLDER: &str = "No readable text content found.";

/// Pipeline stage, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    UrlValidated,
    Fetched,
    Extracted,
    Normalized,
    Written,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::UrlValidated => "url_validated",
            Stage::Fetched => "fetched",
            Stage::Extracted => "extracted",
            Stage::Normalized => "normalized",
            Stage::Written => "written",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Validated input, ready to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prepared {
    /// Normalized source URL
    pub source: SourceUrl,
    /// Resolved output file
    pub target: OutputTarget,
}

impl Prepared {
    /// Validate the URL and resolve the output target
    pub fn new(url: &str, output: Option<&str>) -> Result<Self, Web2TxtError> {
        let source = normalize_url(url)?;
        let target = OutputTarget::resolve(&source, output);
        debug!(stage = %Stage::UrlValidated, url = %source, output = %target, "Input validated");
        Ok(Self { source, target })
    }
}

/// Builder for configuring a [`Pipeline`]
#[derive(Default)]
pub struct PipelineBuilder {
    user_agent: Option<String>,
    timeout: Option<Duration>,
    fetcher: Option<Box<dyn Fetcher>>,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl PipelineBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set custom User-Agent
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Set the fetch deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Replace the HTTP fetcher
    ///
    /// User agent and timeout settings only apply to the built-in fetcher.
    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Box::new(fetcher));
        self
    }

    /// Receive download progress
    pub fn progress(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.progress = Some(Arc::new(sink));
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        let fetcher = self.fetcher.unwrap_or_else(|| {
            let mut options = FetchOptions {
                user_agent: self.user_agent,
                ..Default::default()
            };
            if let Some(timeout) = self.timeout {
                options.timeout = timeout;
            }
            Box::new(HttpFetcher::with_options(options))
        });

        Pipeline {
            fetcher,
            progress: self.progress.unwrap_or_else(|| Arc::new(NoProgress)),
        }
    }
}

/// Configured webpage-to-text pipeline
pub struct Pipeline {
    fetcher: Box<dyn Fetcher>,
    progress: Arc<dyn ProgressSink>,
}

impl Default for Pipeline {
    fn default() -> Self {
        PipelineBuilder::new().build()
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("fetcher", &self.fetcher.name())
            .finish()
    }
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Validate the URL and resolve the output target
    pub fn prepare(&self, url: &str, output: Option<&str>) -> Result<Prepared, Web2TxtError> {
        let prepared = Prepared::new(url, output)?;
        self.progress.stage(Stage::UrlValidated);
        Ok(prepared)
    }

    /// Run every stage: validate, fetch, extract, normalize, write
    pub async fn run(
        &self,
        url: &str,
        output: Option<&str>,
    ) -> Result<ConversionReport, Web2TxtError> {
        let prepared = match self.prepare(url, output) {
            Ok(prepared) => prepared,
            Err(e) => {
                debug!(stage = %Stage::Failed, last_stage = %Stage::Start, error = %e, "Pipeline failed");
                return Err(e);
            }
        };
        self.execute(&prepared).await
    }

    /// Run the fetch, extract, normalize and write stages for prepared input
    pub async fn execute(&self, prepared: &Prepared) -> Result<ConversionReport, Web2TxtError> {
        let mut stage = Stage::UrlValidated;
        let result = self.execute_stages(prepared, &mut stage).await;
        if let Err(ref e) = result {
            debug!(stage = %Stage::Failed, last_stage = %stage, error = %e, "Pipeline failed");
        }
        result
    }

    /// Fetch, extract and normalize without writing anything
    pub async fn convert(&self, url: &str) -> Result<String, Web2TxtError> {
        let source = normalize_url(url)?;
        let fetched = self.fetch(&source).await?;
        Ok(normalize(&extract(fetched.text())))
    }

    async fn execute_stages(
        &self,
        prepared: &Prepared,
        stage: &mut Stage,
    ) -> Result<ConversionReport, Web2TxtError> {
        let fetched = self.fetch(&prepared.source).await?;
        self.advance(stage, Stage::Fetched);

        let extracted = extract(fetched.text());
        self.advance(stage, Stage::Extracted);

        let mut text = normalize(&extracted);
        self.advance(stage, Stage::Normalized);

        let empty_content = text.is_empty();
        if empty_content {
            warn!(url = %prepared.source, "No readable text content found on the page");
            text = EMPTY_CONTENT_PLACEHOLDER.to_string();
        }

        let bytes_written = prepared.target.write(&text).await?;
        self.advance(stage, Stage::Written);
        info!(output = %prepared.target, bytes = bytes_written, "Saved text");

        Ok(ConversionReport {
            url: fetched.url,
            output: prepared.target.to_string(),
            bytes_written,
            status_code: fetched.status_code,
            content_type: fetched.content_type,
            bytes_fetched: fetched.bytes_read,
            encoding: fetched.encoding,
            lossy_decode: fetched.body.is_lossy(),
            empty_content,
        })
    }

    async fn fetch(&self, source: &SourceUrl) -> Result<FetchResult, Web2TxtError> {
        debug!(fetcher = self.fetcher.name(), url = %source, "Using fetcher");
        Ok(self.fetcher.fetch(source, self.progress.as_ref()).await?)
    }

    fn advance(&self, stage: &mut Stage, next: Stage) {
        debug!(from = %stage, to = %next, "Stage complete");
        *stage = next;
        self.progress.stage(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodedBody;
    use crate::error::{FetchError, UrlError, WriteError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fetcher that returns a canned response without touching the network
    struct StaticFetcher {
        status: u16,
        body: &'static str,
        calls: Arc<AtomicUsize>,
    }

    impl StaticFetcher {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        fn name(&self) -> &'static str {
            "static"
        }

        async fn fetch(
            &self,
            url: &SourceUrl,
            progress: &dyn ProgressSink,
        ) -> Result<FetchResult, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = FetchError::from_status(url.as_str(), self.status) {
                return Err(err);
            }
            progress.advanced(crate::FetchProgress::new(self.body.len() as u64, None));
            Ok(FetchResult {
                url: url.to_string(),
                status_code: self.status,
                content_type: Some("text/html".to_string()),
                encoding: "UTF-8".to_string(),
                body: DecodedBody::Decoded(self.body.to_string()),
                bytes_read: self.body.len() as u64,
            })
        }
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::UrlValidated.to_string(), "url_validated");
        assert_eq!(Stage::Failed.to_string(), "failed");
    }

    #[test]
    fn test_prepare() {
        let pipeline = Pipeline::default();
        let prepared = pipeline.prepare("example.com/a", None).unwrap();
        assert_eq!(prepared.source.as_str(), "https://example.com/a");
        assert!(prepared.target.is_derived());
        assert_eq!(prepared.target.to_string(), "example_com_a_content.txt");

        let prepared = pipeline.prepare("example.com", Some("out.txt")).unwrap();
        assert!(!prepared.target.is_derived());
    }

    #[tokio::test]
    async fn test_run_writes_normalized_text() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("page.txt");
        let pipeline = Pipeline::builder()
            .fetcher(StaticFetcher::new(
                200,
                "<html><body><h1>Title</h1><p>Hello &amp; welcome.</p></body></html>",
            ))
            .build();

        let report = pipeline
            .run("example.com", Some(out.to_str().unwrap()))
            .await
            .unwrap();

        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written.trim(), "Title\nHello & welcome.");
        assert_eq!(report.bytes_written, written.len() as u64);
        assert_eq!(report.status_code, 200);
        assert!(!report.empty_content);
        assert!(!report.lossy_decode);
    }

    #[tokio::test]
    async fn test_not_found_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("missing.txt");
        let pipeline = Pipeline::builder()
            .fetcher(StaticFetcher::new(404, ""))
            .build();

        let err = pipeline
            .run("example.com/missing", Some(out.to_str().unwrap()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Web2TxtError::Fetch(FetchError::NotFound { .. })
        ));
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_existing_file_untouched_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("keep.txt");
        std::fs::write(&out, "previous").unwrap();
        let pipeline = Pipeline::builder()
            .fetcher(StaticFetcher::new(503, ""))
            .build();

        let err = pipeline
            .run("example.com", Some(out.to_str().unwrap()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Web2TxtError::Fetch(FetchError::ServerError { code: 503, .. })
        ));
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "previous");
    }

    #[tokio::test]
    async fn test_invalid_url_skips_fetch() {
        let fetcher = StaticFetcher::new(200, "<p>x</p>");
        let calls = fetcher.calls.clone();
        let pipeline = Pipeline::builder().fetcher(fetcher).build();

        let err = pipeline.run("   ", None).await.unwrap_err();
        assert!(matches!(err, Web2TxtError::Url(UrlError::Empty)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_page_writes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.txt");
        let pipeline = Pipeline::builder()
            .fetcher(StaticFetcher::new(
                200,
                "<html><head><script>x()</script></head><body>  </body></html>",
            ))
            .build();

        let report = pipeline
            .run("example.com", Some(out.to_str().unwrap()))
            .await
            .unwrap();

        assert!(report.empty_content);
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            EMPTY_CONTENT_PLACEHOLDER
        );
    }

    #[tokio::test]
    async fn test_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("no-such-dir").join("out.txt");
        let pipeline = Pipeline::builder()
            .fetcher(StaticFetcher::new(200, "<p>text</p>"))
            .build();

        let err = pipeline
            .run("example.com", Some(out.to_str().unwrap()))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Web2TxtError::Write(WriteError::FileSystemError { .. })
        ));
        assert!(err.user_message().starts_with("Error: Could not write to file"));
    }

    #[tokio::test]
    async fn test_convert_does_not_write() {
        let pipeline = Pipeline::builder()
            .fetcher(StaticFetcher::new(200, "<p>Alpha</p><p>Beta</p>"))
            .build();
        let text = pipeline.convert("example.com").await.unwrap();
        assert_eq!(text, "Alpha\nBeta");
    }

    #[tokio::test]
    async fn test_progress_sink_receives_updates() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let pipeline = Pipeline::builder()
            .fetcher(StaticFetcher::new(200, "<p>Alpha</p>"))
            .progress(move |p: crate::FetchProgress| {
                counter.store(p.bytes_read as usize, Ordering::SeqCst);
            })
            .build();

        pipeline.convert("example.com").await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), "<p>Alpha</p>".len());
    }

    #[derive(Clone, Default)]
    struct StageLog(Arc<std::sync::Mutex<Vec<Stage>>>);

    impl ProgressSink for StageLog {
        fn advanced(&self, _progress: crate::FetchProgress) {}

        fn stage(&self, stage: Stage) {
            self.0.lock().unwrap().push(stage);
        }
    }

    #[tokio::test]
    async fn test_stages_reported_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("stages.txt");
        let log = StageLog::default();
        let pipeline = Pipeline::builder()
            .fetcher(StaticFetcher::new(200, "<p>text</p>"))
            .progress(log.clone())
            .build();

        pipeline
            .run("example.com", Some(out.to_str().unwrap()))
            .await
            .unwrap();

        assert_eq!(
            *log.0.lock().unwrap(),
            vec![
                Stage::UrlValidated,
                Stage::Fetched,
                Stage::Extracted,
                Stage::Normalized,
                Stage::Written,
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_reports_no_later_stage() {
        let log = StageLog::default();
        let pipeline = Pipeline::builder()
            .fetcher(StaticFetcher::new(404, ""))
            .progress(log.clone())
            .build();

        assert!(pipeline.run("example.com", None).await.is_err());
        assert_eq!(*log.0.lock().unwrap(), vec![Stage::UrlValidated]);
    }

    #[test]
    fn test_builder_debug() {
        let pipeline = Pipeline::builder()
            .user_agent("Agent/1.0")
            .timeout(Duration::from_secs(5))
            .build();
        assert!(format!("{:?}", pipeline).contains("http"));
    }
}
