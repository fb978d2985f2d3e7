//! Output target resolution and writing

use crate::error::WriteError;
use crate::source::{default_filename, SourceUrl};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the text ends up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    path: PathBuf,
    derived: bool,
}

impl OutputTarget {
    /// Use `requested` if given and non-blank, otherwise derive from `source`
    pub fn resolve(source: &SourceUrl, requested: Option<&str>) -> Self {
        match requested.map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => Self {
                path: PathBuf::from(name),
                derived: false,
            },
            None => Self {
                path: PathBuf::from(default_filename(source)),
                derived: true,
            },
        }
    }

    /// Target path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True if the name was derived from the URL
    pub fn is_derived(&self) -> bool {
        self.derived
    }

    /// Write `text` to the target, replacing any existing file
    ///
    /// Returns the number of bytes written.
    pub async fn write(&self, text: &str) -> Result<u64, WriteError> {
        write_text(&self.path, text).await
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

/// Write `text` as UTF-8 to `path`
pub async fn write_text(path: &Path, text: &str) -> Result<u64, WriteError> {
    debug!(path = %path.display(), bytes = text.len(), "Writing output");
    tokio::fs::write(path, text.as_bytes())
        .await
        .map_err(|e| WriteError::from_io(path, e))?;
    Ok(text.len() as u64)
}
