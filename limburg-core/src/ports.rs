//! Error type and the I/O port through which feeds are fetched.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Error as ReqwestError;
use url::Url;

#[derive(thiserror::Error, Debug)]
/// Errors that end a refresh cycle.
pub enum FeedError {
    /// No URL, path or inline text was configured.
    #[error("No CSV source configured")]
    NoSource,
    /// Source kind other than `url` or `upload`.
    #[error("Unsupported source type: {0}")]
    UnsupportedSourceKind(String),
    /// Local path escapes the base directory.
    #[error("Path is outside the base directory: {}", .0.display())]
    OutsideBaseDir(PathBuf),
    /// A setting failed validation.
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
    /// Network layer failed.
    #[error("Network error: {0}")]
    Network(#[from] ReqwestError),
    /// Server answered with a non-success status.
    #[error("Failed to download CSV (status {0})")]
    Status(u16),
    /// Fetch did not complete in time.
    #[error("Timed out after {}s while fetching CSV", .0.as_secs())]
    Timeout(Duration),
    /// Local feed file does not exist.
    #[error("CSV file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Local feed file could not be read.
    #[error("Failed to read CSV file {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },
}

impl FeedError {
    /// Whether the error stems from configuration rather than from the feed itself.
    ///
    /// Configuration errors are not retried on the next scheduled tick.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            FeedError::NoSource
                | FeedError::UnsupportedSourceKind(_)
                | FeedError::OutsideBaseDir(_)
                | FeedError::InvalidSetting(_)
        )
    }

    /// Map an I/O error for `path`, keeping not-found distinguishable.
    #[must_use]
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            FeedError::NotFound(path.to_path_buf())
        } else {
            FeedError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

#[async_trait]
/// Transport used by the source loader to obtain feed text.
pub trait FeedPort: Send + Sync {
    /// Download the feed from an `http`/`https` URL.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Status`] for non-success responses and
    /// [`FeedError::Network`] or [`FeedError::Timeout`] when the request fails.
    async fn fetch_url(&self, url: &Url) -> Result<String, FeedError>;

    /// Read the feed from an already resolved local path.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::NotFound`] for missing files and [`FeedError::Io`] otherwise.
    async fn read_file(&self, path: &Path) -> Result<String, FeedError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_flagged() {
        assert!(FeedError::NoSource.is_configuration());
        assert!(FeedError::UnsupportedSourceKind("ftp".to_owned()).is_configuration());
        assert!(!FeedError::Status(500).is_configuration());
        assert!(!FeedError::Timeout(Duration::from_secs(1)).is_configuration());
    }

    #[test]
    fn io_errors_keep_not_found_distinct() {
        let path = Path::new("missing.csv");
        let missing = FeedError::from_io(path, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(missing, FeedError::NotFound(ref found) if found == path));

        let denied = FeedError::from_io(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(denied, FeedError::Io { .. }));
    }

    #[test]
    fn status_message_names_the_code() {
        assert_eq!(
            FeedError::Status(500).to_string(),
            "Failed to download CSV (status 500)"
        );
    }
}
