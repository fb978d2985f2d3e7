//! Download progress reporting
//!
//! The fetcher reports a [`FetchProgress`] after every body chunk to an
//! injected [`ProgressSink`]. Closures implement the trait, so callers can
//! pass `&|p: FetchProgress| ...` or drive a progress bar.

use crate::pipeline::Stage;
use serde::{Deserialize, Serialize};

/// Progress update emitted while the response body streams in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchProgress {
    /// Body bytes read so far (monotonic within one fetch)
    pub bytes_read: u64,
    /// Expected body size from `Content-Length`, if the server sent one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl FetchProgress {
    /// Create a new progress value
    pub fn new(bytes_read: u64, total: Option<u64>) -> Self {
        Self { bytes_read, total }
    }

    /// Completion percentage, when the total is known
    pub fn percent(&self) -> Option<f32> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some((self.bytes_read as f32 / total as f32 * 100.0).min(100.0)),
            None => None,
        }
    }
}

/// Receiver of progress updates
pub trait ProgressSink: Send + Sync {
    /// Called once response headers have arrived, before any body chunk
    fn started(&self, _total: Option<u64>) {}

    /// Called after each body chunk
    fn advanced(&self, progress: FetchProgress);

    /// Called once the body has been fully read
    fn finished(&self, _progress: FetchProgress) {}

    /// Called each time the pipeline completes a stage
    fn stage(&self, _stage: Stage) {}
}

impl<F> ProgressSink for F
where
    F: Fn(FetchProgress) + Send + Sync,
{
    fn advanced(&self, progress: FetchProgress) {
        self(progress)
    }
}

/// Sink that discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn advanced(&self, _progress: FetchProgress) {}
}
