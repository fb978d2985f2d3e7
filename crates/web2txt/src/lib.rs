//! web2txt - webpage to clean plain text
//!
//! This crate fetches a single webpage, strips markup and non-content
//! elements, normalizes whitespace and entities, and writes the result as a
//! UTF-8 text file.
//!
//! ## Pipeline
//!
//! [`Pipeline`] runs the stages in order and stops at the first failure:
//!
//! 1. [`normalize_url`] - validate input, default the scheme to `https`
//! 2. [`Fetcher`] - GET with a 15 second deadline, streamed with progress
//! 3. [`extract`] - lenient HTML parse, drop script/style/comments
//! 4. [`normalize`] - decode entities, collapse whitespace
//! 5. [`OutputTarget`] - write the text, to a derived filename by default
//!
//! ```no_run
//! # async fn run() -> Result<(), web2txt::Web2TxtError> {
//! let report = web2txt::Pipeline::default().run("example.com", None).await?;
//! println!("saved {} bytes to {}", report.bytes_written, report.output);
//! # Ok(())
//! # }
//! ```

pub mod client;
mod decode;
mod error;
pub mod extract;
pub mod fetchers;
mod normalize;
mod output;
mod pipeline;
mod progress;
mod source;
mod types;

pub use client::{fetch, fetch_with_options, FetchOptions};
pub use decode::{decode_body, parse_charset, DecodedBody};
pub use error::{FetchError, UrlError, Web2TxtError, WriteError};
pub use extract::{extract, ExtractedText, Fragment};
pub use fetchers::{Fetcher, HttpFetcher};
pub use normalize::{normalize, normalize_text};
pub use output::{write_text, OutputTarget};
pub use pipeline::{Pipeline, PipelineBuilder, Prepared, Stage, EMPTY_CONTENT_PLACEHOLDER};
pub use progress::{FetchProgress, NoProgress, ProgressSink};
pub use source::{default_filename, normalize_url, SourceUrl, FILENAME_SUFFIX};
pub use types::{ConversionReport, FetchResult};

use std::time::Duration;

/// Default User-Agent string
pub const DEFAULT_USER_AGENT: &str = concat!("web2txt/", env!("CARGO_PKG_VERSION"));

/// Default deadline for connecting and reading a page
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
